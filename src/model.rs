//! Session state and wire types.
//!
//! Everything the client remembers between events lives in [`Model`]; none
//! of it survives a page reload. The wire types mirror the JSON API: the
//! backend emits `resolved`/`matched` as SQLite 0/1 integers, so flag
//! fields accept either booleans or integers.

use serde::{Deserialize, Deserializer, Serialize};

use crate::image::PendingImage;
use crate::{get_current_time_ms, round_to_tenth, truncate_preview, CONFIRMATION_PREVIEW_LENGTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    Lost,
    Found,
}

impl ReportStatus {
    /// Title-cased form used in payloads and badges.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lost => "Lost",
            Self::Found => "Found",
        }
    }

    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Found => "found",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `true`/`false`, `0`/`1` or null for flag columns.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Null(Option<()>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Int(n) => n != 0,
        Raw::Null(_) => false,
    })
}

/// Server-owned report projection returned by the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: u64,
    pub status: ReportStatus,
    pub name: String,
    pub contact: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub resolved: bool,
    #[serde(default, deserialize_with = "flag")]
    pub matched: bool,
}

// --- Request payloads ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReportRequest {
    pub name: String,
    pub contact: String,
    pub description: String,
    pub status: String,
    pub secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub contact: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessageRequest {
    pub sender_name: String,
    pub sender_email: String,
    pub receiver_email: String,
    pub message: String,
}

// --- Response payloads ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetail {
    pub description: String,
    pub contact: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReportResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub matches: u32,
    #[serde(default)]
    pub match_details: Vec<MatchDetail>,
    #[serde(default, deserialize_with = "flag")]
    pub email_sent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub status: ReportStatus,
    pub score: f64,
    pub description: String,
    pub contact: String,
    pub name: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminReportsResponse {
    pub success: bool,
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub message: String,
}

/// Generic `{success, message}` shape shared by resolve, delete, notify,
/// logout, chat and search-refresh responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default)]
    pub total_reports: u64,
    #[serde(default)]
    pub lost_count: u64,
    #[serde(default)]
    pub found_count: u64,
    #[serde(default)]
    pub resolved_count: u64,
    #[serde(default)]
    pub matched_count: u64,
}

impl StatsSnapshot {
    /// Percentage of reports resolved, rounded to one decimal; 0 when
    /// there are no reports.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn resolution_rate(&self) -> f64 {
        if self.total_reports == 0 {
            return 0.0;
        }
        round_to_tenth(self.resolved_count as f64 / self.total_reports as f64 * 100.0)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn match_rate(&self) -> f64 {
        if self.total_reports == 0 {
            return 0.0;
        }
        round_to_tenth(self.matched_count as f64 / self.total_reports as f64 * 100.0)
    }

    #[must_use]
    pub fn active_reports(&self) -> u64 {
        self.total_reports.saturating_sub(self.resolved_count)
    }

    #[must_use]
    pub fn health(&self) -> SystemHealth {
        SystemHealth::from_resolution_rate(self.resolution_rate())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemHealth {
    Excellent,
    Good,
    NeedsImprovement,
}

impl SystemHealth {
    #[must_use]
    pub fn from_resolution_rate(rate: f64) -> Self {
        if rate >= 70.0 {
            Self::Excellent
        } else if rate >= 50.0 {
            Self::Good
        } else {
            Self::NeedsImprovement
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    #[serde(default)]
    pub stats: StatsSnapshot,
    #[serde(default)]
    pub message: String,
}

// --- Form input carried by events ---

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportForm {
    pub name: String,
    pub contact: String,
    pub description: String,
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactForm {
    pub sender_name: String,
    pub sender_email: String,
    pub receiver_email: String,
    pub message: String,
}

/// Outcome of a successful submission, rendered as the results panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub message: String,
    pub category: Option<String>,
    pub status: Option<String>,
    pub matches: Vec<MatchDetail>,
    pub email_sent: bool,
}

impl From<SubmitReportResponse> for SubmissionOutcome {
    fn from(resp: SubmitReportResponse) -> Self {
        Self {
            message: resp.message,
            category: resp.category,
            status: resp.status,
            matches: resp.match_details,
            email_sent: resp.email_sent,
        }
    }
}

// --- Toast surface ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastKind {
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// At most one toast is visible; `seq` ties a dismissal timer to the
/// toast it was armed for, so an expired timer never clears a successor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub seq: u64,
    pub created_at_ms: u64,
}

// --- Loading gate ---

/// Counting gate over the shared loading indicator: visible while any
/// operation is in flight, regardless of completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadingGate {
    active: u32,
}

impl LoadingGate {
    pub fn begin(&mut self) {
        self.active = self.active.saturating_add(1);
    }

    pub fn end(&mut self) {
        self.active = self.active.saturating_sub(1);
    }

    #[must_use]
    pub const fn is_loading(self) -> bool {
        self.active > 0
    }

    #[must_use]
    pub const fn depth(self) -> u32 {
        self.active
    }
}

// --- Confirmation flow ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmAction {
    Delete,
    Resolve,
}

impl ConfirmAction {
    #[must_use]
    pub const fn missing_target_message(self) -> &'static str {
        match self {
            Self::Delete => "No report selected for deletion",
            Self::Resolve => "No report selected for resolution",
        }
    }
}

/// One outstanding confirmation target; opening another of the same kind
/// replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub report_id: u64,
    pub description_preview: String,
}

impl PendingConfirmation {
    #[must_use]
    pub fn new(report_id: u64, description: &str) -> Self {
        Self {
            report_id,
            description_preview: truncate_preview(description, CONFIRMATION_PREVIEW_LENGTH),
        }
    }
}

// --- Notification chat ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub contact: String,
    pub name: String,
    pub draft: String,
}

impl ChatSession {
    #[must_use]
    pub fn new(contact: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            contact: contact.into(),
            name: name.into(),
            draft: String::new(),
        }
    }
}

// --- Admin view selection and report cache ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdminView {
    #[default]
    AllReports,
    Matched,
    Resolved,
    Statistics,
}

impl AdminView {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::AllReports => "All Reports",
            Self::Matched => "Matched Reports",
            Self::Resolved => "Resolved Reports",
            Self::Statistics => "System Statistics",
        }
    }
}

/// One admin fetch feeds every filtered view; mutations invalidate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedReports {
    pub reports: Vec<Report>,
    pub fetched_at_ms: u64,
}

impl CachedReports {
    #[must_use]
    pub fn new(reports: Vec<Report>) -> Self {
        Self {
            reports,
            fetched_at_ms: get_current_time_ms(),
        }
    }

    #[must_use]
    pub fn all(&self) -> Vec<&Report> {
        self.reports.iter().collect()
    }

    #[must_use]
    pub fn matched(&self) -> Vec<&Report> {
        self.reports.iter().filter(|r| r.matched).collect()
    }

    #[must_use]
    pub fn resolved(&self) -> Vec<&Report> {
        self.reports.iter().filter(|r| r.resolved).collect()
    }
}

// --- The model ---

#[derive(Debug, Default)]
pub struct Model {
    pub current_report_type: Option<ReportStatus>,
    pub pending_image: Option<PendingImage>,
    pub last_submission: Option<SubmissionOutcome>,

    /// `None` until the first search; `Some(vec![])` is the explicit
    /// empty state.
    pub search_results: Option<Vec<SearchResult>>,

    pub public_stats: Option<StatsSnapshot>,
    pub admin_stats: Option<StatsSnapshot>,

    pub admin_view: AdminView,
    pub admin_reports: Option<CachedReports>,

    pub pending_delete: Option<PendingConfirmation>,
    pub pending_resolve: Option<PendingConfirmation>,

    pub chat: Option<ChatSession>,

    pub active_toast: Option<ToastMessage>,
    pub toast_seq: u64,
    pub loading: LoadingGate,

    pub session_ended: bool,
}

impl Model {
    /// Replaces any visible toast and returns the sequence number the
    /// dismissal timer should be armed with.
    pub fn push_toast(&mut self, message: impl Into<String>, kind: ToastKind) -> u64 {
        self.toast_seq = self.toast_seq.wrapping_add(1);
        let seq = self.toast_seq;
        self.active_toast = Some(ToastMessage {
            message: message.into(),
            kind,
            seq,
            created_at_ms: get_current_time_ms(),
        });
        seq
    }

    /// Clears the toast only if it is still the one the timer was armed
    /// for.
    pub fn expire_toast(&mut self, seq: u64) -> bool {
        if self.active_toast.as_ref().is_some_and(|t| t.seq == seq) {
            self.active_toast = None;
            return true;
        }
        false
    }

    pub fn dismiss_toast(&mut self) {
        self.active_toast = None;
    }

    pub fn invalidate_admin_reports(&mut self) {
        self.admin_reports = None;
    }

    pub fn reset_report_form(&mut self) {
        self.current_report_type = None;
        self.pending_image = None;
        self.last_submission = None;
    }
}
