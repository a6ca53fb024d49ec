//! Events the host feeds into the controller.

use serde::{Deserialize, Serialize};

use emailflow_protocol::{ProgressFrame, ProgressSnapshot, UploadReceipt};

use crate::intake::FileRef;
use crate::notify::NotificationId;

/// How the upload endpoint answered an in-flight submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Upload stored; `receipt` names the progress record when the endpoint
    /// returned one.
    Accepted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receipt: Option<UploadReceipt>,
    },
    /// Endpoint refused the upload; `message` is shown as-is.
    Rejected { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A file picked through the file input.
    Select { file: FileRef },
    DragEnter,
    DragOver,
    DragLeave,
    Drop {
        #[serde(default)]
        files: Vec<FileRef>,
    },
    Submit,
    SubmitCompleted { outcome: SubmitOutcome },
    /// Fire every timer due at `now`.
    Tick,
    /// User closed a notification.
    Dismiss { id: NotificationId },
    ModalOpened,
    ModalClosed,
    FocusChanged { focused: bool },
    /// Answer to a `FetchStatus` effect.
    StatusReported { snapshot: ProgressSnapshot },
    /// Frame from the server-sent progress stream.
    Pushed { frame: ProgressFrame },
    /// Text typed into a hinted field.
    Input { value: String },
    Copy { text: String },
    /// Leave this view for `route`.
    Navigate { route: String },
}

impl Event {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Select { .. } => "select",
            Event::DragEnter => "drag_enter",
            Event::DragOver => "drag_over",
            Event::DragLeave => "drag_leave",
            Event::Drop { .. } => "drop",
            Event::Submit => "submit",
            Event::SubmitCompleted { .. } => "submit_completed",
            Event::Tick => "tick",
            Event::Dismiss { .. } => "dismiss",
            Event::ModalOpened => "modal_opened",
            Event::ModalClosed => "modal_closed",
            Event::FocusChanged { .. } => "focus_changed",
            Event::StatusReported { .. } => "status_reported",
            Event::Pushed { .. } => "pushed",
            Event::Input { .. } => "input",
            Event::Copy { .. } => "copy",
            Event::Navigate { .. } => "navigate",
        }
    }
}
