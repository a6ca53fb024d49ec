//! Effects the host applies to the page.

use serde::{Deserialize, Serialize};

use emailflow_protocol::ProgressSnapshot;

use crate::intake::StagedFile;
use crate::notify::{ChannelChange, NotificationId, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    SetSubmitEnabled { enabled: bool },
    /// Reset the file input.
    ClearSelection,
    SetHighlight { on: bool },
    /// Disable (or re-enable) the submit control and show `label` on it.
    SetBusy { busy: bool, label: String },
    /// Post the staged file to the upload endpoint.
    SendUpload { file: StagedFile },
    ShowNotification {
        id: NotificationId,
        text: String,
        severity: Severity,
    },
    FadeOutNotification { id: NotificationId },
    DetachNotification { id: NotificationId },
    /// Partial refresh: ask the status endpoint for a new snapshot.
    FetchStatus { route: String },
    /// Full refresh of the current view.
    ReloadView { route: String },
    RenderProgress { snapshot: ProgressSnapshot },
    ShowHint { text: String },
    ClearHint,
    WriteClipboard { text: String },
}

impl From<ChannelChange> for Effect {
    fn from(change: ChannelChange) -> Self {
        match change {
            ChannelChange::Shown { id, text, severity } => {
                Effect::ShowNotification { id, text, severity }
            }
            ChannelChange::FadingOut(id) => Effect::FadeOutNotification { id },
            ChannelChange::Detached(id) => Effect::DetachNotification { id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_wire_format() {
        let json = serde_json::to_value(Effect::SetHighlight { on: true }).unwrap();
        assert_eq!(json, serde_json::json!({"effect": "set_highlight", "on": true}));

        let json = serde_json::to_value(Effect::ClearHint).unwrap();
        assert_eq!(json, serde_json::json!({"effect": "clear_hint"}));
    }
}
