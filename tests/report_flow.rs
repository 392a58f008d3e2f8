use crux_core::testing::AppTester;
use lostfound_core::capabilities::{HttpHeaders, HttpResponse};
use lostfound_core::model::{ReportForm, ReportStatus, SubmitReportRequest, ToastKind};
use lostfound_core::view::SearchView;
use lostfound_core::{App, Effect, Event, Model};

fn json_response(value: &serde_json::Value) -> HttpResponse {
    HttpResponse::new(
        200,
        HttpHeaders::new(),
        serde_json::to_vec(value).unwrap(),
        "req-test".into(),
        5,
    )
}

fn take_http(update: &mut crux_core::testing::Update<Effect, Event>) -> crux_core::Request<lostfound_core::capabilities::HttpRequest> {
    let pos = update
        .effects
        .iter()
        .position(|e| matches!(e, Effect::Http(_)))
        .expect("expected an http effect");
    let Effect::Http(request) = update.effects.remove(pos) else {
        unreachable!()
    };
    request
}

fn form() -> ReportForm {
    ReportForm {
        name: "Bob".into(),
        contact: "bob@example.com".into(),
        description: "black backpack".into(),
        secret: String::new(),
    }
}

#[test]
fn submission_with_no_matches_renders_explicit_note() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    app.update(
        Event::ReportTypeSelected {
            status: ReportStatus::Lost,
        },
        &mut model,
    );

    let mut update = app.update(Event::ReportSubmitted { form: form() }, &mut model);
    let mut request = take_http(&mut update);

    let body: SubmitReportRequest = serde_json::from_slice(request.operation.body().unwrap()).unwrap();
    assert_eq!(body.status, "Lost");
    assert_eq!(body.description, "black backpack");

    let response = json_response(&serde_json::json!({
        "success": true,
        "message": "Report submitted successfully",
        "category": "bag",
        "status": "Lost",
        "matches": 0,
        "match_details": [],
        "email_sent": false
    }));
    let update = app.resolve(&mut request, Ok(response)).unwrap();
    for event in update.events {
        app.update(event, &mut model);
    }

    let view = app.view(&model);
    let outcome = view.submission_outcome.expect("results panel rendered");
    assert!(outcome.match_cards.is_empty(), "no match cards");
    assert!(outcome
        .no_match_note
        .as_deref()
        .unwrap()
        .starts_with("No matches found at this time"));
    assert!(outcome.email_note.is_none());
}

#[test]
fn submission_with_two_matches_renders_two_cards_and_email_line() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    app.update(
        Event::ReportTypeSelected {
            status: ReportStatus::Lost,
        },
        &mut model,
    );

    let mut update = app.update(Event::ReportSubmitted { form: form() }, &mut model);
    let mut request = take_http(&mut update);

    let response = json_response(&serde_json::json!({
        "success": true,
        "message": "Report submitted successfully",
        "category": "bag",
        "status": "Lost",
        "matches": 2,
        "match_details": [
            {"description": "black backpack with red zipper", "contact": "a@x.com", "name": "Bob"},
            {"description": "dark rucksack", "contact": "b@x.com", "name": "Ann"}
        ],
        "email_sent": true
    }));
    let update = app.resolve(&mut request, Ok(response)).unwrap();
    for event in update.events {
        app.update(event, &mut model);
    }

    let view = app.view(&model);
    let outcome = view.submission_outcome.expect("results panel rendered");
    assert_eq!(outcome.match_cards.len(), 2, "exactly two match cards");
    assert_eq!(outcome.match_headline.as_deref(), Some("Found 2 Match(es)!"));
    assert_eq!(
        outcome.email_note.as_deref(),
        Some("Email notifications have been sent to all parties!")
    );
    assert_eq!(outcome.match_cards[0].reporter, "Bob");
    assert_eq!(outcome.match_cards[1].position, 2);
}

#[test]
fn failed_submission_retries_with_the_same_image() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    app.update(
        Event::ReportTypeSelected {
            status: ReportStatus::Found,
        },
        &mut model,
    );
    app.update(
        Event::ImageAttached {
            data: vec![0xFF, 0xD8, 0xFF, 0xE0],
        },
        &mut model,
    );

    // First attempt fails at the transport level.
    let mut update = app.update(Event::ReportSubmitted { form: form() }, &mut model);
    let mut request = take_http(&mut update);
    let first_body: SubmitReportRequest =
        serde_json::from_slice(request.operation.body().unwrap()).unwrap();
    let first_image = first_body.image.expect("image encoded into payload");

    let update = app
        .resolve(
            &mut request,
            Err(lostfound_core::capabilities::HttpError::ConnectionError {
                message: "offline".into(),
            }),
        )
        .unwrap();
    for event in update.events {
        app.update(event, &mut model);
    }

    assert_eq!(model.active_toast.as_ref().unwrap().kind, ToastKind::Error);
    assert!(model.pending_image.is_some(), "form left intact for retry");

    // Retry: the same pending image is encoded again.
    let mut update = app.update(Event::ReportSubmitted { form: form() }, &mut model);
    let mut request = take_http(&mut update);
    let second_body: SubmitReportRequest =
        serde_json::from_slice(request.operation.body().unwrap()).unwrap();
    assert_eq!(second_body.image.as_deref(), Some(first_image.as_str()));

    // This time the server accepts; the image is consumed.
    let response = json_response(&serde_json::json!({
        "success": true,
        "message": "Report submitted successfully",
        "matches": 0
    }));
    let update = app.resolve(&mut request, Ok(response)).unwrap();
    for event in update.events {
        app.update(event, &mut model);
    }
    assert!(model.pending_image.is_none());
}

#[test]
fn form_reset_clears_type_image_and_results_panel() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    app.update(
        Event::ReportTypeSelected {
            status: ReportStatus::Lost,
        },
        &mut model,
    );
    app.update(
        Event::ImageAttached {
            data: vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
        },
        &mut model,
    );
    assert!(app.view(&model).report_form.form_visible);

    app.update(Event::ReportFormReset, &mut model);

    let view = app.view(&model);
    assert!(!view.report_form.form_visible);
    assert!(view.report_form.selected_type.is_none());
    assert!(!view.report_form.has_pending_image);
    assert!(view.submission_outcome.is_none());
    assert!(matches!(view.search, SearchView::NotSearched));
}

#[test]
fn application_level_failure_keeps_form_and_shows_server_message() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    app.update(
        Event::ReportTypeSelected {
            status: ReportStatus::Lost,
        },
        &mut model,
    );

    let mut update = app.update(Event::ReportSubmitted { form: form() }, &mut model);
    let mut request = take_http(&mut update);

    let response = json_response(&serde_json::json!({
        "success": false,
        "message": "Please fill in all required fields"
    }));
    let update = app.resolve(&mut request, Ok(response)).unwrap();
    for event in update.events {
        app.update(event, &mut model);
    }

    let toast = model.active_toast.as_ref().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(toast.message, "Please fill in all required fields");
    assert_eq!(
        model.current_report_type,
        Some(ReportStatus::Lost),
        "selection survives for retry"
    );
    assert!(model.last_submission.is_none());
}
