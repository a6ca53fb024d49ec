//! EmailFlow upload intake
//!
//! Client-side logic of the CSV upload page and the pages that track a
//! running import: file validation, drag and drop, the submission lock,
//! progress polling and transient notifications. Everything is driven by
//! explicit events and an explicit clock, so the whole page can be run and
//! tested without a browser.

pub mod clock;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod dragdrop;
pub mod error;
pub mod intake;
pub mod lock;
pub mod notify;
pub mod poller;
pub mod replay;
pub mod timer;

pub use clock::ViewTime;
pub use config::{ConfigError, EffectiveConfig, IntakePolicy};
pub use controller::{Effect, Event, PageController, SubmitOutcome, ViewState};
pub use error::{IntakeError, IntakeErrorCode};
pub use intake::{
    validate, FileRef, IntakeGate, ReasonCode, Rejection, StagedFile, UploadPolicy, ValidationResult,
};
pub use notify::{NotificationChannel, NotificationId, Severity};
pub use poller::{PollerState, ProgressPoller};
pub use replay::{ReplayError, ReplayRecord, ReplayScript};
