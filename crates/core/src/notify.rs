//! Presentation collaborators: rendering, notices and confirmation.

use grievance_shared::types::NoticeLevel;

use crate::complaint::Complaint;

/// Short user-facing message sink. Fire-and-forget.
pub trait Notifier: Send + Sync {
    /// Shows `message` at `level`.
    fn notify(&self, message: &str, level: NoticeLevel);
}

/// Draws the complaint list. Must be idempotent.
pub trait Renderer: Send + Sync {
    /// Renders the full list, newest first.
    fn render(&self, complaints: &[Complaint]);
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    /// Returns true when the user agrees.
    fn confirm(&self, prompt: &str) -> bool;
}

impl Confirm for bool {
    fn confirm(&self, _prompt: &str) -> bool {
        *self
    }
}

/// Notifier that writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, level: NoticeLevel) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => {
                tracing::info!(level = %level, "{message}");
            }
            NoticeLevel::Warning => tracing::warn!("{message}"),
            NoticeLevel::Error => tracing::error!("{message}"),
        }
    }
}
