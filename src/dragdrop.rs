//! Drag-and-drop adapter for the upload region.
//!
//! Normalizes drag events into the same intake path as manual selection.
//! Only the first dropped file is considered; extra files are ignored
//! without an error.

use serde::{Deserialize, Serialize};

use crate::intake::FileRef;

/// Drag events delivered by the upload region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "files", rename_all = "snake_case")]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
    Drop(Vec<FileRef>),
}

/// What the host must do with a drag event.
///
/// The host always suppresses the browser default for these events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragOutcome {
    /// Highlight state changed to this value.
    pub highlight: Option<bool>,
    /// File to forward through the intake gate.
    pub forward: Option<FileRef>,
}

#[derive(Debug, Default)]
pub struct DragAdapter {
    highlighted: bool,
}

impl DragAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Handle one drag event. Highlighting does not depend on validation.
    pub fn handle(&mut self, event: DragEvent) -> DragOutcome {
        match event {
            DragEvent::Enter | DragEvent::Over => DragOutcome {
                highlight: self.set_highlight(true),
                forward: None,
            },
            DragEvent::Leave => DragOutcome {
                highlight: self.set_highlight(false),
                forward: None,
            },
            DragEvent::Drop(files) => {
                let ignored = files.len().saturating_sub(1);
                if ignored > 0 {
                    tracing::debug!(ignored, "extra dropped files ignored");
                }
                DragOutcome {
                    highlight: self.set_highlight(false),
                    forward: files.into_iter().next(),
                }
            }
        }
    }

    fn set_highlight(&mut self, on: bool) -> Option<bool> {
        if self.highlighted == on {
            None
        } else {
            self.highlighted = on;
            Some(on)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_over_leave_highlight() {
        let mut adapter = DragAdapter::new();

        let out = adapter.handle(DragEvent::Enter);
        assert_eq!(out.highlight, Some(true));

        // Repeated dragover does not re-toggle.
        let out = adapter.handle(DragEvent::Over);
        assert_eq!(out.highlight, None);
        assert!(adapter.is_highlighted());

        let out = adapter.handle(DragEvent::Leave);
        assert_eq!(out.highlight, Some(false));
        assert!(!adapter.is_highlighted());
    }

    #[test]
    fn test_drop_forwards_first_file_only() {
        let mut adapter = DragAdapter::new();
        adapter.handle(DragEvent::Enter);

        let out = adapter.handle(DragEvent::Drop(vec![
            FileRef::new("first.csv", 10),
            FileRef::new("second.csv", 20),
            FileRef::new("third.txt", 30),
        ]));
        assert_eq!(out.highlight, Some(false));
        assert_eq!(out.forward, Some(FileRef::new("first.csv", 10)));
    }

    #[test]
    fn test_empty_drop_forwards_nothing() {
        let mut adapter = DragAdapter::new();
        let out = adapter.handle(DragEvent::Drop(Vec::new()));
        assert!(out.forward.is_none());
        assert_eq!(out.highlight, None);
    }

    #[test]
    fn test_event_wire_format() {
        let event: DragEvent = serde_json::from_str(
            r#"{"kind":"drop","files":[{"name":"a.csv","size_bytes":1}]}"#,
        )
        .unwrap();
        assert_eq!(event, DragEvent::Drop(vec![FileRef::new("a.csv", 1)]));
        let event: DragEvent = serde_json::from_str(r#"{"kind":"enter"}"#).unwrap();
        assert_eq!(event, DragEvent::Enter);
    }
}
