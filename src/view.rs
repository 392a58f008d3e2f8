//! View model projected for shells.
//!
//! Every user-supplied string (descriptions, names, contacts, secrets,
//! categories, server messages) passes through [`escape_html`] before it
//! lands in a view type, so shells may interpolate fields into markup
//! without further treatment. Rendering is always a full replace of the
//! affected region from the latest view model.

use serde::{Deserialize, Serialize};

use crate::model::{
    AdminView, ChatSession, MatchDetail, PendingConfirmation, Report, ReportStatus, SearchResult,
    StatsSnapshot, SubmissionOutcome, ToastMessage,
};

/// Minimal HTML entity escaping, applied to text and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[must_use]
pub fn format_match_score(score: f64) -> String {
    format!("{score:.1}% match")
}

fn image_data_uri(base64_payload: &str) -> String {
    format!("data:image/jpeg;base64,{base64_payload}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub report_form: ReportFormView,
    pub submission_outcome: Option<SubmissionOutcomeView>,
    pub search: SearchView,
    pub admin: AdminPanelView,
    pub delete_confirmation: Option<ConfirmationView>,
    pub resolve_confirmation: Option<ConfirmationView>,
    pub chat_modal: Option<ChatModalView>,
    pub toast: Option<ToastView>,
    pub hero_stats: Option<HeroStatsView>,
    pub is_loading: bool,
    pub session_ended: bool,
}

// --- Report form ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFormView {
    pub selected_type: Option<ReportStatus>,
    pub form_visible: bool,
    pub title: String,
    pub subtitle: String,
    pub has_pending_image: bool,
}

impl ReportFormView {
    #[must_use]
    pub fn new(selected_type: Option<ReportStatus>, has_pending_image: bool) -> Self {
        let (title, subtitle) = match selected_type {
            Some(ReportStatus::Lost) => (
                "Report Lost Item",
                "Please provide detailed information about the item you lost",
            ),
            Some(ReportStatus::Found) => (
                "Report Found Item",
                "Please provide detailed information about the item you found",
            ),
            None => ("", ""),
        };

        Self {
            selected_type,
            form_visible: selected_type.is_some(),
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            has_pending_image,
        }
    }
}

// --- Submission results panel ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCardView {
    pub position: usize,
    pub description: String,
    pub contact: String,
    pub reporter: String,
}

impl MatchCardView {
    #[must_use]
    pub fn new(position: usize, detail: &MatchDetail) -> Self {
        Self {
            position,
            description: escape_html(&detail.description),
            contact: escape_html(&detail.contact),
            reporter: escape_html(&detail.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcomeView {
    pub heading: String,
    pub category: String,
    pub status: String,
    pub match_headline: Option<String>,
    pub match_cards: Vec<MatchCardView>,
    pub email_note: Option<String>,
    pub no_match_note: Option<String>,
}

impl SubmissionOutcomeView {
    #[must_use]
    pub fn new(outcome: &SubmissionOutcome) -> Self {
        let match_cards: Vec<MatchCardView> = outcome
            .matches
            .iter()
            .enumerate()
            .map(|(i, detail)| MatchCardView::new(i + 1, detail))
            .collect();

        let (match_headline, email_note, no_match_note) = if match_cards.is_empty() {
            (
                None,
                None,
                Some(
                    "No matches found at this time. Your report has been saved and \
                     we'll notify you if a match is found."
                        .to_string(),
                ),
            )
        } else {
            let note = if outcome.email_sent {
                "Email notifications have been sent to all parties!"
            } else {
                "Notifications will be sent if email is configured."
            };
            (
                Some(format!("Found {} Match(es)!", match_cards.len())),
                Some(note.to_string()),
                None,
            )
        };

        Self {
            heading: "Report Submitted Successfully!".to_string(),
            category: escape_html(outcome.category.as_deref().unwrap_or("Not categorized")),
            status: escape_html(outcome.status.as_deref().unwrap_or_default()),
            match_headline,
            match_cards,
            email_note,
            no_match_note,
        }
    }
}

// --- Search results ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultCard {
    pub status_label: String,
    pub status_class: String,
    pub score_text: String,
    pub resolved: bool,
    pub resolved_badge: Option<String>,
    pub description: String,
    pub contact: String,
    pub reporter: String,
    pub timestamp: String,
    pub category: Option<String>,
    pub secret: Option<String>,
    pub image_data_uri: Option<String>,
}

impl SearchResultCard {
    #[must_use]
    pub fn new(result: &SearchResult) -> Self {
        Self {
            status_label: result.status.as_str().to_string(),
            status_class: result.status.css_class().to_string(),
            score_text: format_match_score(result.score),
            resolved: result.resolved,
            resolved_badge: result.resolved.then(|| "Resolved by Admin".to_string()),
            description: escape_html(&result.description),
            contact: escape_html(&result.contact),
            reporter: escape_html(&result.name),
            timestamp: escape_html(&result.timestamp),
            category: result.category.as_deref().map(escape_html),
            secret: result.secret.as_deref().map(escape_html),
            image_data_uri: result.image.as_deref().map(image_data_uri),
        }
    }
}

/// `NotSearched` keeps the container untouched; `Empty` is an explicit
/// empty state, never a blank region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SearchView {
    NotSearched,
    Empty {
        message: String,
    },
    Results {
        headline: String,
        cards: Vec<SearchResultCard>,
    },
}

impl SearchView {
    #[must_use]
    pub fn new(results: Option<&[SearchResult]>) -> Self {
        match results {
            None => Self::NotSearched,
            Some([]) => Self::Empty {
                message: "No matches found. Try different search terms.".to_string(),
            },
            Some(results) => Self::Results {
                headline: format!("Found {} match(es):", results.len()),
                cards: results.iter().map(SearchResultCard::new).collect(),
            },
        }
    }
}

// --- Admin panel ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminReportCard {
    pub id: u64,
    pub status_label: String,
    pub status_class: String,
    pub reporter: String,
    pub contact: String,
    pub description: String,
    pub category: String,
    pub timestamp: String,
    pub secret: Option<String>,
    pub image_data_uri: Option<String>,
    pub resolved: bool,
    pub matched: bool,
    pub resolved_label: String,
    pub matched_label: String,
    /// Resolve is only offered while the report is unresolved; delete and
    /// notify are always offered.
    pub can_resolve: bool,
}

impl AdminReportCard {
    #[must_use]
    pub fn new(report: &Report) -> Self {
        Self {
            id: report.id,
            status_label: report.status.as_str().to_string(),
            status_class: report.status.css_class().to_string(),
            reporter: escape_html(&report.name),
            contact: escape_html(&report.contact),
            description: escape_html(&report.description),
            category: escape_html(report.category.as_deref().unwrap_or("Not categorized")),
            timestamp: escape_html(&report.timestamp),
            secret: report
                .secret
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(escape_html),
            image_data_uri: report
                .image
                .as_deref()
                .filter(|i| !i.trim().is_empty())
                .map(image_data_uri),
            resolved: report.resolved,
            matched: report.matched,
            resolved_label: if report.resolved { "Resolved" } else { "Pending" }.to_string(),
            matched_label: if report.matched { "Matched" } else { "Not Matched" }.to_string(),
            can_resolve: !report.resolved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminReportsView {
    pub heading: String,
    pub cards: Vec<AdminReportCard>,
    pub empty_message: Option<String>,
}

impl AdminReportsView {
    #[must_use]
    pub fn new(view: AdminView, reports: &[&Report]) -> Self {
        let empty_message = if reports.is_empty() {
            Some(
                match view {
                    AdminView::Matched => "No matched reports found.",
                    AdminView::Resolved => "No resolved reports found.",
                    _ => "No reports found.",
                }
                .to_string(),
            )
        } else {
            None
        };

        Self {
            heading: format!("{} ({})", view.title(), reports.len()),
            cards: reports.iter().map(|r| AdminReportCard::new(r)).collect(),
            empty_message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsView {
    pub total_reports: u64,
    pub lost_count: u64,
    pub found_count: u64,
    pub resolved_count: u64,
    pub matched_count: u64,
    pub active_reports: u64,
    pub resolution_rate_text: String,
    pub match_rate_text: String,
    pub health_label: String,
}

impl StatsView {
    #[must_use]
    pub fn new(stats: &StatsSnapshot) -> Self {
        Self {
            total_reports: stats.total_reports,
            lost_count: stats.lost_count,
            found_count: stats.found_count,
            resolved_count: stats.resolved_count,
            matched_count: stats.matched_count,
            active_reports: stats.active_reports(),
            resolution_rate_text: format!("{:.1}%", stats.resolution_rate()),
            match_rate_text: format!("{:.1}%", stats.match_rate()),
            health_label: stats.health().label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminPanelView {
    pub view: AdminView,
    pub reports: Option<AdminReportsView>,
    pub stats: Option<StatsView>,
}

// --- Confirmation, chat, toast, hero stats ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationView {
    pub report_id: u64,
    pub description_preview: String,
}

impl ConfirmationView {
    #[must_use]
    pub fn new(pending: &PendingConfirmation) -> Self {
        Self {
            report_id: pending.report_id,
            description_preview: escape_html(&pending.description_preview),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatModalView {
    pub recipient_name: String,
    pub recipient_contact: String,
    pub draft: String,
}

impl ChatModalView {
    #[must_use]
    pub fn new(session: &ChatSession) -> Self {
        Self {
            recipient_name: escape_html(&session.name),
            recipient_contact: escape_html(&session.contact),
            draft: session.draft.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastView {
    pub message: String,
    pub kind_class: String,
}

impl ToastView {
    #[must_use]
    pub fn new(toast: &ToastMessage) -> Self {
        Self {
            message: escape_html(&toast.message),
            kind_class: toast.kind.css_class().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroStatsView {
    pub total_reports: u64,
    pub lost_count: u64,
    pub found_count: u64,
    pub resolved_count: u64,
    pub matched_count: u64,
    /// Whole-percent form shown in the hero counters.
    pub resolution_rate_text: String,
}

impl HeroStatsView {
    #[must_use]
    pub fn new(stats: &StatsSnapshot) -> Self {
        Self {
            total_reports: stats.total_reports,
            lost_count: stats.lost_count,
            found_count: stats.found_count,
            resolved_count: stats.resolved_count,
            matched_count: stats.matched_count,
            resolution_rate_text: format!("{:.0}%", stats.resolution_rate()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod escape_tests {
        use super::*;
        use proptest::prelude::*;

        #[test]
        fn test_escapes_markup_characters() {
            assert_eq!(
                escape_html(r#"<img src=x onerror="pwn()">"#),
                "&lt;img src=x onerror=&quot;pwn()&quot;&gt;"
            );
        }

        #[test]
        fn test_escapes_quotes_for_attributes() {
            assert_eq!(escape_html("it's \"mine\""), "it&#39;s &quot;mine&quot;");
        }

        #[test]
        fn test_plain_text_unchanged() {
            assert_eq!(escape_html("black backpack"), "black backpack");
        }

        proptest! {
            #[test]
            fn escaped_output_never_contains_raw_markup(s in ".*") {
                let escaped = escape_html(&s);
                prop_assert!(!escaped.contains('<'));
                prop_assert!(!escaped.contains('>'));
                prop_assert!(!escaped.contains('"'));
            }
        }
    }

    mod score_tests {
        use super::*;

        #[test]
        fn test_score_formatted_to_one_decimal() {
            assert_eq!(format_match_score(87.3), "87.3% match");
            assert_eq!(format_match_score(100.0), "100.0% match");
            assert_eq!(format_match_score(87.34), "87.3% match");
        }
    }

    mod form_tests {
        use super::*;

        #[test]
        fn test_titles_follow_selected_type() {
            let lost = ReportFormView::new(Some(ReportStatus::Lost), false);
            assert_eq!(lost.title, "Report Lost Item");
            assert!(lost.form_visible);

            let found = ReportFormView::new(Some(ReportStatus::Found), true);
            assert_eq!(found.title, "Report Found Item");
            assert!(found.has_pending_image);

            let none = ReportFormView::new(None, false);
            assert!(!none.form_visible);
            assert!(none.title.is_empty());
        }
    }

    mod outcome_tests {
        use super::*;
        use crate::model::MatchDetail;

        fn outcome(matches: Vec<MatchDetail>, email_sent: bool) -> SubmissionOutcome {
            SubmissionOutcome {
                message: "saved".into(),
                category: Some("bag".into()),
                status: Some("Lost".into()),
                matches,
                email_sent,
            }
        }

        #[test]
        fn test_no_matches_renders_explicit_note() {
            let view = SubmissionOutcomeView::new(&outcome(vec![], false));
            assert!(view.match_cards.is_empty());
            assert!(view.match_headline.is_none());
            assert!(view
                .no_match_note
                .as_deref()
                .unwrap()
                .starts_with("No matches found at this time"));
        }

        #[test]
        fn test_two_matches_render_two_cards_and_email_note() {
            let details = vec![
                MatchDetail {
                    description: "backpack".into(),
                    contact: "a@x.com".into(),
                    name: "Bob".into(),
                },
                MatchDetail {
                    description: "rucksack".into(),
                    contact: "b@x.com".into(),
                    name: "Ann".into(),
                },
            ];
            let view = SubmissionOutcomeView::new(&outcome(details, true));
            assert_eq!(view.match_cards.len(), 2);
            assert_eq!(view.match_headline.as_deref(), Some("Found 2 Match(es)!"));
            assert_eq!(
                view.email_note.as_deref(),
                Some("Email notifications have been sent to all parties!")
            );
            assert!(view.no_match_note.is_none());
        }

        #[test]
        fn test_match_cards_are_escaped_and_positioned() {
            let details = vec![MatchDetail {
                description: "<b>bag</b>".into(),
                contact: "a@x.com".into(),
                name: "Bob".into(),
            }];
            let view = SubmissionOutcomeView::new(&outcome(details, false));
            assert_eq!(view.match_cards[0].position, 1);
            assert_eq!(view.match_cards[0].description, "&lt;b&gt;bag&lt;/b&gt;");
        }
    }

    mod search_view_tests {
        use super::*;
        use crate::model::SearchResult;

        fn result(score: f64, resolved: bool) -> SearchResult {
            SearchResult {
                status: ReportStatus::Found,
                score,
                description: "backpack".into(),
                contact: "a@x.com".into(),
                name: "Ann".into(),
                timestamp: "2025-01-02 09:30:00".into(),
                category: None,
                secret: None,
                image: None,
                resolved,
            }
        }

        #[test]
        fn test_not_searched_keeps_container() {
            assert_eq!(SearchView::new(None), SearchView::NotSearched);
        }

        #[test]
        fn test_empty_results_render_explicit_state() {
            let view = SearchView::new(Some(&[]));
            assert!(matches!(view, SearchView::Empty { .. }));
        }

        #[test]
        fn test_score_text_on_card() {
            let results = [result(87.3, false)];
            let SearchView::Results { cards, headline } = SearchView::new(Some(&results)) else {
                panic!("expected results");
            };
            assert_eq!(headline, "Found 1 match(es):");
            assert_eq!(cards[0].score_text, "87.3% match");
            assert!(cards[0].resolved_badge.is_none());
        }

        #[test]
        fn test_resolved_badge_present() {
            let results = [result(50.0, true)];
            let SearchView::Results { cards, .. } = SearchView::new(Some(&results)) else {
                panic!("expected results");
            };
            assert_eq!(cards[0].resolved_badge.as_deref(), Some("Resolved by Admin"));
        }
    }

    mod admin_card_tests {
        use super::*;

        fn report(resolved: bool) -> Report {
            Report {
                id: 9,
                status: ReportStatus::Lost,
                name: "Bob".into(),
                contact: "bob@example.com".into(),
                description: "black backpack".into(),
                category: None,
                timestamp: "2025-01-01 10:00:00".into(),
                secret: Some("  ".into()),
                image: Some(String::new()),
                resolved,
                matched: false,
            }
        }

        #[test]
        fn test_resolve_gated_on_unresolved() {
            assert!(AdminReportCard::new(&report(false)).can_resolve);
            assert!(!AdminReportCard::new(&report(true)).can_resolve);
        }

        #[test]
        fn test_blank_secret_and_image_hidden() {
            let card = AdminReportCard::new(&report(false));
            assert!(card.secret.is_none());
            assert!(card.image_data_uri.is_none());
        }

        #[test]
        fn test_category_fallback() {
            let card = AdminReportCard::new(&report(false));
            assert_eq!(card.category, "Not categorized");
        }

        #[test]
        fn test_empty_message_per_view() {
            let view = AdminReportsView::new(AdminView::Matched, &[]);
            assert_eq!(view.empty_message.as_deref(), Some("No matched reports found."));
            assert_eq!(view.heading, "Matched Reports (0)");
        }
    }

    mod stats_view_tests {
        use super::*;

        #[test]
        fn test_rates_and_health_label() {
            let stats = StatsSnapshot {
                total_reports: 10,
                lost_count: 4,
                found_count: 6,
                resolved_count: 7,
                matched_count: 5,
            };
            let view = StatsView::new(&stats);
            assert_eq!(view.resolution_rate_text, "70.0%");
            assert_eq!(view.match_rate_text, "50.0%");
            assert_eq!(view.health_label, "Excellent");
            assert_eq!(view.active_reports, 3);
        }

        #[test]
        fn test_zero_reports_guard() {
            let view = StatsView::new(&StatsSnapshot::default());
            assert_eq!(view.resolution_rate_text, "0.0%");
            assert_eq!(view.health_label, "Needs Improvement");
        }
    }
}
