//! The single event stream every shell feeds into the core.
//!
//! User intents and capability completions share one enum; HTTP results
//! are boxed to keep the variant size down.

use crate::capabilities::HttpResult;
use crate::model::{AdminView, ContactForm, ReportForm, ReportStatus};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Event {
    #[default]
    Noop,

    // Public statistics
    PublicStatsRequested,
    PublicStatsLoaded(Box<HttpResult>),

    // Report submission
    ReportTypeSelected {
        status: ReportStatus,
    },
    ReportFormReset,
    ImageAttached {
        data: Vec<u8>,
    },
    ImageCleared,
    ReportSubmitted {
        form: ReportForm,
    },
    SubmitReportCompleted(Box<HttpResult>),

    // Search
    SearchRequested {
        query: String,
    },
    SearchCompleted(Box<HttpResult>),
    SearchRefreshRequested,
    SearchRefreshCompleted(Box<HttpResult>),

    // Public contact form
    ContactMessageSubmitted {
        form: ContactForm,
    },
    ContactMessageCompleted(Box<HttpResult>),

    // Admin moderation
    AdminViewSelected {
        view: AdminView,
    },
    AdminReportsRefreshRequested,
    AdminReportsLoaded(Box<HttpResult>),
    AdminStatsLoaded(Box<HttpResult>),

    ResolveRequested {
        report_id: u64,
        description: String,
    },
    ResolveConfirmed,
    ResolveCancelled,
    ResolveCompleted {
        report_id: u64,
        result: Box<HttpResult>,
    },

    DeleteRequested {
        report_id: u64,
        description: String,
    },
    DeleteConfirmed,
    DeleteCancelled,
    DeleteCompleted {
        report_id: u64,
        result: Box<HttpResult>,
    },

    // Notification chat
    ChatOpened {
        contact: String,
        name: String,
    },
    ChatClosed,
    ChatSubmitted {
        message: String,
    },
    ChatCompleted(Box<HttpResult>),

    // Admin session
    AdminLogoutRequested,
    AdminLogoutCompleted(Box<HttpResult>),

    // Toast surface
    ToastDismissed,
    ToastExpired {
        seq: u64,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::PublicStatsRequested => "public_stats_requested",
            Self::PublicStatsLoaded(_) => "public_stats_loaded",
            Self::ReportTypeSelected { .. } => "report_type_selected",
            Self::ReportFormReset => "report_form_reset",
            Self::ImageAttached { .. } => "image_attached",
            Self::ImageCleared => "image_cleared",
            Self::ReportSubmitted { .. } => "report_submitted",
            Self::SubmitReportCompleted(_) => "submit_report_completed",
            Self::SearchRequested { .. } => "search_requested",
            Self::SearchCompleted(_) => "search_completed",
            Self::SearchRefreshRequested => "search_refresh_requested",
            Self::SearchRefreshCompleted(_) => "search_refresh_completed",
            Self::ContactMessageSubmitted { .. } => "contact_message_submitted",
            Self::ContactMessageCompleted(_) => "contact_message_completed",
            Self::AdminViewSelected { .. } => "admin_view_selected",
            Self::AdminReportsRefreshRequested => "admin_reports_refresh_requested",
            Self::AdminReportsLoaded(_) => "admin_reports_loaded",
            Self::AdminStatsLoaded(_) => "admin_stats_loaded",
            Self::ResolveRequested { .. } => "resolve_requested",
            Self::ResolveConfirmed => "resolve_confirmed",
            Self::ResolveCancelled => "resolve_cancelled",
            Self::ResolveCompleted { .. } => "resolve_completed",
            Self::DeleteRequested { .. } => "delete_requested",
            Self::DeleteConfirmed => "delete_confirmed",
            Self::DeleteCancelled => "delete_cancelled",
            Self::DeleteCompleted { .. } => "delete_completed",
            Self::ChatOpened { .. } => "chat_opened",
            Self::ChatClosed => "chat_closed",
            Self::ChatSubmitted { .. } => "chat_submitted",
            Self::ChatCompleted(_) => "chat_completed",
            Self::AdminLogoutRequested => "admin_logout_requested",
            Self::AdminLogoutCompleted(_) => "admin_logout_completed",
            Self::ToastDismissed => "toast_dismissed",
            Self::ToastExpired { .. } => "toast_expired",
        }
    }

    /// True for events that originate from a direct user action, as
    /// opposed to capability completions and internal chaining.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::ReportTypeSelected { .. }
                | Self::ReportFormReset
                | Self::ImageAttached { .. }
                | Self::ImageCleared
                | Self::ReportSubmitted { .. }
                | Self::SearchRequested { .. }
                | Self::ContactMessageSubmitted { .. }
                | Self::AdminViewSelected { .. }
                | Self::AdminReportsRefreshRequested
                | Self::ResolveRequested { .. }
                | Self::ResolveConfirmed
                | Self::ResolveCancelled
                | Self::DeleteRequested { .. }
                | Self::DeleteConfirmed
                | Self::DeleteCancelled
                | Self::ChatOpened { .. }
                | Self::ChatClosed
                | Self::ChatSubmitted { .. }
                | Self::AdminLogoutRequested
                | Self::ToastDismissed
        )
    }
}
