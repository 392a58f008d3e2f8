//! The app core: one `update` loop over every controller surface.
//!
//! Each user action follows the same shape: validate local state, open the
//! loading gate, hand one request to the HTTP capability, and on the
//! completion event update the model, re-render, close the gate and toast.
//! Completions of overlapping operations interleave in arrival order; each
//! one only ever replaces its own slice of the model.

use serde::de::DeserializeOwned;

use crate::capabilities::{Capabilities, HttpError, HttpRequest, HttpResult};
use crate::event::Event;
use crate::image::PendingImage;
use crate::model::{
    AdminReportsResponse, AdminView, ChatSession, ConfirmAction, ContactMessageRequest, Model,
    NotifyRequest, PendingConfirmation, SearchRequest, SearchResponse, StatsResponse,
    SubmitReportRequest, SubmitReportResponse, ToastKind,
};
use crate::view::{
    AdminPanelView, AdminReportsView, ChatModalView, ConfirmationView, HeroStatsView,
    ReportFormView, SearchView, StatsView, SubmissionOutcomeView, ToastView, ViewModel,
};
use crate::{
    get_current_time_ms, AppError, AppResult, ErrorKind, SUBMIT_TIMEOUT_MS, TOAST_DURATION_MS,
};

#[derive(Default)]
pub struct App;

impl App {
    /// Replaces the visible toast and arms its dismissal timer. The timer
    /// carries the toast's sequence number so a firing for a superseded
    /// toast is ignored.
    fn show_toast(model: &mut Model, caps: &Capabilities, message: impl Into<String>, kind: ToastKind) {
        let seq = model.push_toast(message, kind);
        caps.timer
            .start(seq, TOAST_DURATION_MS, move |_| Event::ToastExpired { seq });
    }

    /// Transport errors and unreadable bodies come back as `Err`; a
    /// well-formed body is parsed regardless of HTTP status so
    /// server-supplied failure messages survive.
    fn parse<T: DeserializeOwned>(result: HttpResult) -> AppResult<T> {
        match result {
            Err(e) => {
                let kind = match &e {
                    HttpError::Timeout { .. } => ErrorKind::Timeout,
                    _ => ErrorKind::Network,
                };
                Err(AppError::new(kind, e.to_string()))
            }
            Ok(response) => match response.json::<T>() {
                Ok(value) => Ok(value),
                Err(_) if !response.is_success() => Err(AppError::from_http_status(
                    response.status(),
                    Some(response.body()),
                )),
                Err(e) => Err(AppError::new(ErrorKind::Deserialization, e.to_string())),
            },
        }
    }

    fn send_submit(caps: &Capabilities, payload: &SubmitReportRequest) {
        let request = HttpRequest::post("/api/report")
            .and_then(|r| r.with_json(payload))
            .and_then(|r| r.with_timeout_ms(SUBMIT_TIMEOUT_MS));
        match request {
            Ok(request) => caps
                .http
                .send(request, |result| Event::SubmitReportCompleted(Box::new(result))),
            Err(e) => tracing::error!(error = %e, "failed to build submit request"),
        }
    }

    fn send_search(caps: &Capabilities, query: &str) {
        let request = HttpRequest::post("/api/search")
            .and_then(|r| r.with_no_cache())
            .and_then(|r| r.with_json(&SearchRequest { query: query.to_string() }))
            .map(|r| r.with_cache_bust(get_current_time_ms()));
        match request {
            Ok(request) => caps
                .http
                .send(request, |result| Event::SearchCompleted(Box::new(result))),
            Err(e) => tracing::error!(error = %e, "failed to build search request"),
        }
    }

    fn send_search_refresh(caps: &Capabilities) {
        let request = HttpRequest::post("/api/search/refresh").and_then(HttpRequest::with_no_cache);
        match request {
            Ok(request) => caps
                .http
                .send(request, |result| Event::SearchRefreshCompleted(Box::new(result))),
            Err(e) => tracing::error!(error = %e, "failed to build search refresh request"),
        }
    }

    fn send_public_stats(caps: &Capabilities) {
        match HttpRequest::get("/api/stats") {
            Ok(request) => caps
                .http
                .send(request, |result| Event::PublicStatsLoaded(Box::new(result))),
            Err(e) => tracing::error!(error = %e, "failed to build stats request"),
        }
    }

    fn send_admin_stats(caps: &Capabilities) {
        match HttpRequest::get("/api/admin/stats") {
            Ok(request) => caps
                .http
                .send(request, |result| Event::AdminStatsLoaded(Box::new(result))),
            Err(e) => tracing::error!(error = %e, "failed to build admin stats request"),
        }
    }

    fn send_admin_reports(caps: &Capabilities) {
        match HttpRequest::get("/api/admin/reports") {
            Ok(request) => caps
                .http
                .send(request, |result| Event::AdminReportsLoaded(Box::new(result))),
            Err(e) => tracing::error!(error = %e, "failed to build admin reports request"),
        }
    }

    fn send_resolve(caps: &Capabilities, report_id: u64) {
        match HttpRequest::put(format!("/api/admin/resolve/{report_id}")) {
            Ok(request) => caps.http.send(request, move |result| Event::ResolveCompleted {
                report_id,
                result: Box::new(result),
            }),
            Err(e) => tracing::error!(error = %e, "failed to build resolve request"),
        }
    }

    fn send_delete(caps: &Capabilities, report_id: u64) {
        match HttpRequest::delete(format!("/api/admin/delete/{report_id}")) {
            Ok(request) => caps.http.send(request, move |result| Event::DeleteCompleted {
                report_id,
                result: Box::new(result),
            }),
            Err(e) => tracing::error!(error = %e, "failed to build delete request"),
        }
    }

    fn send_notify(caps: &Capabilities, payload: &NotifyRequest) {
        let request = HttpRequest::post("/api/admin/notify").and_then(|r| r.with_json(payload));
        match request {
            Ok(request) => caps
                .http
                .send(request, |result| Event::ChatCompleted(Box::new(result))),
            Err(e) => tracing::error!(error = %e, "failed to build notify request"),
        }
    }

    fn send_contact_message(caps: &Capabilities, payload: &ContactMessageRequest) {
        let request = HttpRequest::post("/api/chat").and_then(|r| r.with_json(payload));
        match request {
            Ok(request) => caps
                .http
                .send(request, |result| Event::ContactMessageCompleted(Box::new(result))),
            Err(e) => tracing::error!(error = %e, "failed to build chat request"),
        }
    }

    fn send_logout(caps: &Capabilities) {
        match HttpRequest::post("/api/admin/logout") {
            Ok(request) => caps
                .http
                .send(request, |result| Event::AdminLogoutCompleted(Box::new(result))),
            Err(e) => tracing::error!(error = %e, "failed to build logout request"),
        }
    }

    /// Invalidate the admin cache and fetch a fresh listing; the rendered
    /// list is never patched in place after a mutation.
    fn refetch_admin_reports(model: &mut Model, caps: &Capabilities) {
        model.invalidate_admin_reports();
        model.loading.begin();
        Self::send_admin_reports(caps);
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        tracing::debug!(event = event.name(), user = event.is_user_initiated(), "event");

        match event {
            Event::Noop => {}

            // --- Public statistics ---
            Event::PublicStatsRequested => {
                Self::send_public_stats(caps);
            }

            Event::PublicStatsLoaded(result) => {
                match Self::parse::<StatsResponse>(*result) {
                    Ok(resp) if resp.success => {
                        model.public_stats = Some(resp.stats);
                        caps.render.render();
                    }
                    Ok(resp) => {
                        tracing::warn!(message = %resp.message, "stats request rejected");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "stats request failed");
                    }
                }
            }

            // --- Report submission ---
            Event::ReportTypeSelected { status } => {
                model.current_report_type = Some(status);
                caps.render.render();
            }

            Event::ReportFormReset => {
                model.reset_report_form();
                caps.render.render();
            }

            Event::ImageAttached { data } => {
                match PendingImage::new(data) {
                    Ok(image) => model.pending_image = Some(image),
                    Err(e) => {
                        let error = AppError::from(e);
                        Self::show_toast(model, caps, error.user_facing_message(), ToastKind::Warning);
                    }
                }
                caps.render.render();
            }

            Event::ImageCleared => {
                model.pending_image = None;
                caps.render.render();
            }

            Event::ReportSubmitted { form } => {
                let Some(status) = model.current_report_type else {
                    Self::show_toast(
                        model,
                        caps,
                        "Please select Lost or Found first",
                        ToastKind::Warning,
                    );
                    caps.render.render();
                    return;
                };

                // Encode the pending image now; the bytes stay attached so
                // a failed submission can retry with the same image.
                let image = model.pending_image.as_ref().map(PendingImage::to_data_uri);

                let payload = SubmitReportRequest {
                    name: form.name,
                    contact: form.contact,
                    description: form.description,
                    status: status.as_str().to_string(),
                    secret: form.secret,
                    image,
                };

                model.loading.begin();
                Self::send_submit(caps, &payload);
                caps.render.render();
            }

            Event::SubmitReportCompleted(result) => {
                model.loading.end();
                match Self::parse::<SubmitReportResponse>(*result) {
                    Ok(resp) if resp.success => {
                        Self::show_toast(model, caps, resp.message.clone(), ToastKind::Success);
                        model.pending_image = None;
                        model.last_submission = Some(resp.into());
                        self.update(Event::PublicStatsRequested, model, caps);
                    }
                    Ok(resp) => {
                        Self::show_toast(model, caps, resp.message, ToastKind::Error);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "report submission failed");
                        Self::show_toast(
                            model,
                            caps,
                            "Failed to submit report. Please try again.",
                            ToastKind::Error,
                        );
                    }
                }
                caps.render.render();
            }

            // --- Search ---
            Event::SearchRequested { query } => {
                let query = query.trim().to_string();
                if query.is_empty() {
                    Self::show_toast(model, caps, "Please enter a search term", ToastKind::Warning);
                    caps.render.render();
                    return;
                }

                model.loading.begin();
                Self::send_search(caps, &query);
                caps.render.render();
            }

            Event::SearchCompleted(result) => {
                model.loading.end();
                match Self::parse::<SearchResponse>(*result) {
                    Ok(resp) if resp.success => {
                        model.search_results = Some(resp.results);
                    }
                    Ok(resp) => {
                        Self::show_toast(model, caps, resp.message, ToastKind::Error);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "search failed");
                        Self::show_toast(
                            model,
                            caps,
                            "Search failed. Please try again.",
                            ToastKind::Error,
                        );
                    }
                }
                caps.render.render();
            }

            Event::SearchRefreshRequested => {
                Self::send_search_refresh(caps);
            }

            Event::SearchRefreshCompleted(result) => match Self::parse::<crate::model::ActionResponse>(*result) {
                Ok(resp) if resp.success => {
                    tracing::debug!(message = %resp.message, "search cache refreshed");
                }
                Ok(resp) => {
                    tracing::warn!(message = %resp.message, "search refresh rejected");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "search refresh failed");
                }
            },

            // --- Public contact form ---
            Event::ContactMessageSubmitted { form } => {
                if form.message.trim().is_empty() {
                    Self::show_toast(model, caps, "Please enter a message", ToastKind::Warning);
                    caps.render.render();
                    return;
                }

                let payload = ContactMessageRequest {
                    sender_name: form.sender_name,
                    sender_email: form.sender_email,
                    receiver_email: form.receiver_email,
                    message: form.message,
                };

                model.loading.begin();
                Self::send_contact_message(caps, &payload);
                caps.render.render();
            }

            Event::ContactMessageCompleted(result) => {
                model.loading.end();
                match Self::parse::<crate::model::ActionResponse>(*result) {
                    Ok(resp) if resp.success => {
                        Self::show_toast(model, caps, resp.message, ToastKind::Success);
                    }
                    Ok(resp) => {
                        Self::show_toast(model, caps, resp.message, ToastKind::Error);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "contact message failed");
                        Self::show_toast(
                            model,
                            caps,
                            "Failed to send message. Please try again.",
                            ToastKind::Error,
                        );
                    }
                }
                caps.render.render();
            }

            // --- Admin moderation ---
            Event::AdminViewSelected { view } => {
                model.admin_view = view;
                if view == AdminView::Statistics {
                    model.loading.begin();
                    Self::send_admin_stats(caps);
                } else if model.admin_reports.is_none() {
                    model.loading.begin();
                    Self::send_admin_reports(caps);
                }
                caps.render.render();
            }

            Event::AdminReportsRefreshRequested => {
                Self::refetch_admin_reports(model, caps);
                caps.render.render();
            }

            Event::AdminReportsLoaded(result) => {
                model.loading.end();
                match Self::parse::<AdminReportsResponse>(*result) {
                    Ok(resp) if resp.success => {
                        model.admin_reports = Some(crate::model::CachedReports::new(resp.reports));
                    }
                    Ok(resp) => {
                        Self::show_toast(model, caps, resp.message, ToastKind::Error);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "admin reports fetch failed");
                        Self::show_toast(model, caps, "Failed to load reports.", ToastKind::Error);
                    }
                }
                caps.render.render();
            }

            Event::AdminStatsLoaded(result) => {
                model.loading.end();
                match Self::parse::<StatsResponse>(*result) {
                    Ok(resp) if resp.success => {
                        model.admin_stats = Some(resp.stats);
                    }
                    Ok(resp) => {
                        Self::show_toast(model, caps, resp.message, ToastKind::Error);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "admin stats fetch failed");
                        Self::show_toast(model, caps, "Failed to load statistics.", ToastKind::Error);
                    }
                }
                caps.render.render();
            }

            Event::ResolveRequested {
                report_id,
                description,
            } => {
                model.pending_resolve = Some(PendingConfirmation::new(report_id, &description));
                caps.render.render();
            }

            Event::ResolveConfirmed => {
                match model.pending_resolve.take() {
                    Some(pending) => {
                        model.loading.begin();
                        Self::send_resolve(caps, pending.report_id);
                    }
                    None => {
                        Self::show_toast(
                            model,
                            caps,
                            ConfirmAction::Resolve.missing_target_message(),
                            ToastKind::Error,
                        );
                    }
                }
                caps.render.render();
            }

            Event::ResolveCancelled => {
                model.pending_resolve = None;
                caps.render.render();
            }

            Event::ResolveCompleted { report_id, result } => {
                model.loading.end();
                match Self::parse::<crate::model::ActionResponse>(*result) {
                    Ok(resp) if resp.success => {
                        Self::show_toast(model, caps, resp.message, ToastKind::Success);
                        Self::refetch_admin_reports(model, caps);
                        self.update(Event::SearchRefreshRequested, model, caps);
                    }
                    Ok(resp) => {
                        Self::show_toast(model, caps, resp.message, ToastKind::Error);
                    }
                    Err(e) => {
                        tracing::warn!(report_id, error = %e, "resolve failed");
                        Self::show_toast(model, caps, "Failed to resolve report.", ToastKind::Error);
                    }
                }
                caps.render.render();
            }

            Event::DeleteRequested {
                report_id,
                description,
            } => {
                model.pending_delete = Some(PendingConfirmation::new(report_id, &description));
                caps.render.render();
            }

            Event::DeleteConfirmed => {
                match model.pending_delete.take() {
                    Some(pending) => {
                        model.loading.begin();
                        Self::send_delete(caps, pending.report_id);
                    }
                    None => {
                        Self::show_toast(
                            model,
                            caps,
                            ConfirmAction::Delete.missing_target_message(),
                            ToastKind::Error,
                        );
                    }
                }
                caps.render.render();
            }

            Event::DeleteCancelled => {
                model.pending_delete = None;
                caps.render.render();
            }

            Event::DeleteCompleted { report_id, result } => {
                model.loading.end();
                match Self::parse::<crate::model::ActionResponse>(*result) {
                    Ok(resp) if resp.success => {
                        Self::show_toast(model, caps, resp.message, ToastKind::Success);
                        Self::refetch_admin_reports(model, caps);
                        self.update(Event::SearchRefreshRequested, model, caps);
                    }
                    Ok(resp) => {
                        Self::show_toast(model, caps, resp.message, ToastKind::Error);
                    }
                    Err(e) => {
                        tracing::warn!(report_id, error = %e, "delete failed");
                        Self::show_toast(model, caps, "Failed to delete report.", ToastKind::Error);
                    }
                }
                caps.render.render();
            }

            // --- Notification chat ---
            Event::ChatOpened { contact, name } => {
                model.chat = Some(ChatSession::new(contact, name));
                caps.render.render();
            }

            Event::ChatClosed => {
                model.chat = None;
                caps.render.render();
            }

            Event::ChatSubmitted { message } => {
                let Some(contact) = model.chat.as_ref().map(|c| c.contact.clone()) else {
                    Self::show_toast(model, caps, "Invalid contact information", ToastKind::Error);
                    caps.render.render();
                    return;
                };

                let trimmed = message.trim().to_string();
                if let Some(chat) = model.chat.as_mut() {
                    chat.draft = message;
                }

                if trimmed.is_empty() {
                    Self::show_toast(model, caps, "Please enter a message", ToastKind::Warning);
                    caps.render.render();
                    return;
                }

                model.loading.begin();
                Self::send_notify(
                    caps,
                    &NotifyRequest {
                        contact,
                        message: trimmed,
                    },
                );
                caps.render.render();
            }

            Event::ChatCompleted(result) => {
                model.loading.end();
                match Self::parse::<crate::model::ActionResponse>(*result) {
                    Ok(resp) if resp.success => {
                        Self::show_toast(model, caps, "Message sent successfully!", ToastKind::Success);
                        model.chat = None;
                    }
                    Ok(resp) => {
                        // Modal stays open, draft intact, so the admin can
                        // edit and retry.
                        Self::show_toast(model, caps, resp.message, ToastKind::Error);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "notify failed");
                        Self::show_toast(model, caps, "Failed to send message", ToastKind::Error);
                    }
                }
                caps.render.render();
            }

            // --- Admin session ---
            Event::AdminLogoutRequested => {
                model.loading.begin();
                Self::send_logout(caps);
                caps.render.render();
            }

            Event::AdminLogoutCompleted(result) => {
                model.loading.end();
                match Self::parse::<crate::model::ActionResponse>(*result) {
                    Ok(resp) if resp.success => {
                        Self::show_toast(model, caps, "Logged out successfully!", ToastKind::Success);
                        model.session_ended = true;
                    }
                    Ok(resp) => {
                        let message = if resp.message.is_empty() {
                            "Logout failed".to_string()
                        } else {
                            resp.message
                        };
                        Self::show_toast(model, caps, message, ToastKind::Error);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "logout failed");
                        Self::show_toast(
                            model,
                            caps,
                            "Logout failed. Please try again.",
                            ToastKind::Error,
                        );
                    }
                }
                caps.render.render();
            }

            // --- Toast surface ---
            Event::ToastDismissed => {
                model.dismiss_toast();
                caps.render.render();
            }

            Event::ToastExpired { seq } => {
                if model.expire_toast(seq) {
                    caps.render.render();
                }
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        let reports = if model.admin_view == AdminView::Statistics {
            None
        } else {
            model.admin_reports.as_ref().map(|cache| {
                let filtered = match model.admin_view {
                    AdminView::Matched => cache.matched(),
                    AdminView::Resolved => cache.resolved(),
                    _ => cache.all(),
                };
                AdminReportsView::new(model.admin_view, &filtered)
            })
        };

        let stats = if model.admin_view == AdminView::Statistics {
            model.admin_stats.as_ref().map(StatsView::new)
        } else {
            None
        };

        ViewModel {
            report_form: ReportFormView::new(model.current_report_type, model.pending_image.is_some()),
            submission_outcome: model.last_submission.as_ref().map(SubmissionOutcomeView::new),
            search: SearchView::new(model.search_results.as_deref()),
            admin: AdminPanelView {
                view: model.admin_view,
                reports,
                stats,
            },
            delete_confirmation: model.pending_delete.as_ref().map(ConfirmationView::new),
            resolve_confirmation: model.pending_resolve.as_ref().map(ConfirmationView::new),
            chat_modal: model.chat.as_ref().map(ChatModalView::new),
            toast: model.active_toast.as_ref().map(ToastView::new),
            hero_stats: model.public_stats.as_ref().map(HeroStatsView::new),
            is_loading: model.loading.is_loading(),
            session_ended: model.session_ended,
        }
    }
}
