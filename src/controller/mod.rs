//! Page controller
//!
//! All per-view state lives in one [`ViewState`] owned by the
//! [`PageController`]. The host turns DOM events into [`Event`]s, calls
//! [`PageController::dispatch`] and applies the returned [`Effect`]s. Time
//! only moves when the host says so: every call carries the current
//! [`ViewTime`], and timers fire on [`Event::Tick`].
//!
//! Navigating away is the only cancellation. It drops the whole view state,
//! tracked timers included, so nothing scheduled for the old view can fire
//! against the new one.

mod effect;
mod event;

pub use effect::Effect;
pub use event::{Event, SubmitOutcome};

use emailflow_protocol::{ProgressFrame, ProgressSnapshot, ProgressStatus, UploadReceipt};

use crate::clock::ViewTime;
use crate::config::IntakePolicy;
use crate::debounce::{DebounceFired, Debouncer};
use crate::dragdrop::{DragAdapter, DragEvent};
use crate::error::IntakeError;
use crate::intake::{FileRef, IntakeGate, StagedFile};
use crate::lock::{Acquire, BusyControl, SubmissionLock};
use crate::notify::{ChannelTimer, NotificationChannel, Severity};
use crate::poller::{
    Interaction, PollerState, ProgressPoller, RefreshStrategy, TerminalState, TickDecision,
};
use crate::timer::{TimerId, TimerQueue};

const PROCESSING_DONE: &str = "Processing complete.";
const PROCESSING_FAILED: &str = "Error processing file.";

/// Payload of every timer a view schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Channel(ChannelTimer),
    Hint,
    PollTick,
    SubmitTimeout,
}

impl From<ChannelTimer> for TimerKind {
    fn from(timer: ChannelTimer) -> Self {
        TimerKind::Channel(timer)
    }
}

impl From<DebounceFired> for TimerKind {
    fn from(_: DebounceFired) -> Self {
        TimerKind::Hint
    }
}

/// State of one mounted view.
#[derive(Debug)]
pub struct ViewState {
    route: String,
    gate: IntakeGate,
    drag: DragAdapter,
    lock: SubmissionLock,
    busy: BusyControl,
    poller: ProgressPoller,
    channel: NotificationChannel,
    hints: Debouncer,
    timers: TimerQueue<TimerKind>,
    interaction: Interaction,
    /// File handed to the endpoint by the current submission.
    in_flight: Option<StagedFile>,
    submit_timer: Option<TimerId>,
    poll_timer: Option<TimerId>,
    /// Where partial refreshes fetch status from.
    status_route: Option<String>,
}

impl ViewState {
    /// Mount a fresh view on `route`, starting the poller if it qualifies.
    pub fn mount(policy: &IntakePolicy, route: impl Into<String>, now: ViewTime) -> Self {
        let route = route.into();
        let mut view = Self {
            gate: IntakeGate::new(policy.upload_policy()),
            drag: DragAdapter::new(),
            lock: SubmissionLock::new(policy.submit_mode()),
            busy: BusyControl::new(&policy.submit.label, &policy.submit.busy_label),
            poller: ProgressPoller::new(policy.poller_config()),
            channel: NotificationChannel::new(policy.notify_duration(), policy.notify_fade()),
            hints: Debouncer::new(policy.hint_delay()),
            timers: TimerQueue::new(),
            interaction: Interaction::default(),
            in_flight: None,
            submit_timer: None,
            poll_timer: None,
            status_route: None,
            route,
        };
        let route = view.route.clone();
        view.start_polling(&route, now);
        view
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn gate(&self) -> &IntakeGate {
        &self.gate
    }

    pub fn lock(&self) -> &SubmissionLock {
        &self.lock
    }

    pub fn busy(&self) -> &BusyControl {
        &self.busy
    }

    pub fn poller(&self) -> &ProgressPoller {
        &self.poller
    }

    pub fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn is_highlighted(&self) -> bool {
        self.drag.is_highlighted()
    }

    /// Number of timers still scheduled for this view.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_timer_due(&self) -> Option<ViewTime> {
        self.timers.next_due()
    }

    fn start_polling(&mut self, status_route: &str, now: ViewTime) {
        if self.poller.state() != PollerState::Idle {
            tracing::debug!(state = ?self.poller.state(), status_route, "poller already started");
            return;
        }
        match self.poller.activate(status_route, now) {
            Ok(Some(first_tick)) => {
                self.status_route = Some(status_route.to_string());
                self.poll_timer = Some(self.timers.schedule(first_tick, TimerKind::PollTick));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "poller activation failed"),
        }
    }

    fn notify(&mut self, text: impl Into<String>, severity: Severity, now: ViewTime, effects: &mut Vec<Effect>) {
        let (_, changes) = self.channel.notify(text, severity, now, &mut self.timers);
        effects.extend(changes.into_iter().map(Effect::from));
    }

    fn report(&mut self, error: &IntakeError, now: ViewTime, effects: &mut Vec<Effect>) {
        tracing::info!(code = ?error.code(), %error, "intake error reported");
        self.notify(error.to_string(), error.severity(), now, effects);
    }

    fn on_file(&mut self, file: &FileRef, now: ViewTime, effects: &mut Vec<Effect>) {
        let result = self.gate.intake(file);
        if !result.accepted {
            effects.push(Effect::ClearSelection);
        }
        self.push_submit_state(effects);
        let severity = result.severity();
        self.notify(result.message, severity, now, effects);
    }

    fn on_drag(&mut self, event: DragEvent, now: ViewTime, effects: &mut Vec<Effect>) {
        let outcome = self.drag.handle(event);
        if let Some(on) = outcome.highlight {
            effects.push(Effect::SetHighlight { on });
        }
        if let Some(file) = outcome.forward {
            self.on_file(&file, now, effects);
        }
    }

    fn on_submit(&mut self, now: ViewTime, effects: &mut Vec<Effect>) {
        if self.lock.is_held() {
            tracing::debug!(route = %self.route, "submit suppressed: already in flight");
            return;
        }
        if self.gate.staged().is_none() {
            self.report(&IntakeError::NoFileSelected, now, effects);
            return;
        }

        let deadline = match self.lock.try_acquire(now) {
            Acquire::Acquired { deadline } => deadline,
            Acquire::Suppressed => return,
        };
        let Some(file) = self.gate.take_staged() else {
            self.lock.release();
            return;
        };

        tracing::info!(file = %file.name, size_bytes = file.size_bytes, mode = ?self.lock.mode(), "submitting upload");
        effects.push(Effect::SetBusy {
            busy: true,
            label: self.busy.set_busy().to_string(),
        });
        effects.push(Effect::SendUpload { file: file.clone() });
        self.in_flight = Some(file);
        if let Some(deadline) = deadline {
            self.submit_timer = Some(self.timers.schedule(deadline, TimerKind::SubmitTimeout));
        }
    }

    /// Release the lock and restore the control. False if nothing was in flight.
    fn finish_submission(&mut self, effects: &mut Vec<Effect>) -> bool {
        if !self.lock.release() {
            return false;
        }
        if let Some(timer) = self.submit_timer.take() {
            self.timers.cancel(timer);
        }
        effects.push(Effect::SetBusy {
            busy: false,
            label: self.busy.restore().to_string(),
        });
        true
    }

    /// The control is enabled only with a file staged and nothing in flight.
    fn push_submit_state(&self, effects: &mut Vec<Effect>) {
        effects.push(Effect::SetSubmitEnabled {
            enabled: self.gate.submit_enabled() && !self.lock.is_held(),
        });
    }

    /// Give the in-flight file back to the gate so the user can retry.
    /// A file picked while the upload was in flight takes precedence.
    fn restage_in_flight(&mut self, effects: &mut Vec<Effect>) {
        if let Some(file) = self.in_flight.take() {
            match self.gate.staged() {
                None => self.gate.restage(file),
                Some(newer) => {
                    tracing::debug!(dropped = %file.name, kept = %newer.name, "newer selection kept over failed upload");
                }
            }
        }
        self.push_submit_state(effects);
    }

    fn on_submit_completed(&mut self, outcome: SubmitOutcome, now: ViewTime, effects: &mut Vec<Effect>) {
        if !self.finish_submission(effects) {
            tracing::debug!(?outcome, "completion for a submission no longer in flight");
            return;
        }
        match outcome {
            SubmitOutcome::Accepted { receipt } => {
                self.in_flight = None;
                if self.gate.staged().is_none() {
                    effects.push(Effect::ClearSelection);
                }
                self.push_submit_state(effects);
                self.on_accepted(receipt, now, effects);
            }
            SubmitOutcome::Rejected { message } => {
                tracing::info!(%message, "upload rejected by endpoint");
                self.restage_in_flight(effects);
                self.notify(message, Severity::Danger, now, effects);
            }
        }
    }

    fn on_accepted(&mut self, receipt: Option<UploadReceipt>, now: ViewTime, effects: &mut Vec<Effect>) {
        match receipt {
            Some(receipt) => {
                let text = format!("Uploaded {}. Processing has started.", receipt.filename);
                self.notify(text, Severity::Success, now, effects);
                self.start_polling(&receipt.progress_route(), now);
            }
            None => self.notify("Upload complete.", Severity::Success, now, effects),
        }
    }

    fn on_submit_timeout(&mut self, now: ViewTime, effects: &mut Vec<Effect>) {
        self.submit_timer = None;
        if !self.lock.is_expired(now) {
            return;
        }
        let Some(after) = self.lock.mode().timeout() else {
            return;
        };
        self.finish_submission(effects);
        self.restage_in_flight(effects);
        self.report(&IntakeError::SubmitTimeout { after }, now, effects);
    }

    fn on_poll_tick(&mut self, now: ViewTime, effects: &mut Vec<Effect>) {
        self.poll_timer = None;
        match self.poller.on_tick(self.interaction) {
            TickDecision::Refresh(RefreshStrategy::Partial) => {
                let route = self
                    .status_route
                    .clone()
                    .unwrap_or_else(|| self.route.clone());
                effects.push(Effect::FetchStatus { route });
            }
            TickDecision::Refresh(RefreshStrategy::Reload) => {
                effects.push(Effect::ReloadView {
                    route: self.route.clone(),
                });
            }
            TickDecision::Skipped(_) => {}
            TickDecision::Inactive => return,
        }
        let due = now + self.poller.next_delay();
        self.poll_timer = Some(self.timers.schedule(due, TimerKind::PollTick));
    }

    fn on_snapshot(
        &mut self,
        snapshot: ProgressSnapshot,
        failure: Option<String>,
        now: ViewTime,
        effects: &mut Vec<Effect>,
    ) {
        effects.push(Effect::RenderProgress { snapshot });
        match self.poller.observe(snapshot) {
            Ok(Some(state)) => {
                if let Some(timer) = self.poll_timer.take() {
                    self.timers.cancel(timer);
                }
                debug_assert!(state.is_terminal());
                if state == PollerState::TerminalDone {
                    self.notify(PROCESSING_DONE, Severity::Success, now, effects);
                } else {
                    let text = failure
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| PROCESSING_FAILED.to_string());
                    self.notify(text, Severity::Danger, now, effects);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "progress snapshot rejected"),
        }
    }

    fn on_frame(&mut self, frame: ProgressFrame, now: ViewTime, effects: &mut Vec<Effect>) {
        match frame {
            ProgressFrame::Update(update) => {
                let failure = (!update.error_message.is_empty()).then(|| update.error_message.clone());
                self.on_snapshot(update.snapshot(), failure, now, effects);
            }
            ProgressFrame::Error { error } => {
                let percent = self.poller.latest().map_or(0, |s| s.percent);
                let snapshot = ProgressSnapshot::new(ProgressStatus::Failed, percent);
                self.on_snapshot(snapshot, Some(error), now, effects);
            }
        }
    }

    fn on_tick(&mut self, now: ViewTime, effects: &mut Vec<Effect>) {
        while let Some((id, timer)) = self.timers.pop_due(now) {
            match timer {
                TimerKind::Channel(timer) => {
                    let changes = self.channel.on_timer(timer, now, &mut self.timers);
                    effects.extend(changes.into_iter().map(Effect::from));
                }
                TimerKind::Hint => {
                    if let Some(value) = self.hints.fire(id) {
                        let text = value.trim();
                        effects.push(if text.is_empty() {
                            Effect::ClearHint
                        } else {
                            Effect::ShowHint {
                                text: text.to_string(),
                            }
                        });
                    }
                }
                TimerKind::PollTick => self.on_poll_tick(now, effects),
                TimerKind::SubmitTimeout => self.on_submit_timeout(now, effects),
            }
        }
    }

    fn on_copy(&mut self, text: String, clipboard: bool, now: ViewTime, effects: &mut Vec<Effect>) {
        if clipboard {
            effects.push(Effect::WriteClipboard { text });
            self.notify("Copied to clipboard.", Severity::Info, now, effects);
        } else {
            self.report(&IntakeError::ClipboardUnavailable, now, effects);
        }
    }

    /// Abandon this view. Returns the number of timers dropped.
    fn unmount(&mut self) -> usize {
        self.hints.cancel(&mut self.timers);
        let dropped = self.timers.len();
        self.timers.clear();
        dropped
    }
}

/// Drives one browser tab's upload page.
#[derive(Debug)]
pub struct PageController {
    policy: IntakePolicy,
    clipboard_available: bool,
    view: ViewState,
}

impl PageController {
    pub fn new(policy: IntakePolicy, route: impl Into<String>, now: ViewTime) -> Self {
        let view = ViewState::mount(&policy, route, now);
        Self {
            policy,
            clipboard_available: true,
            view,
        }
    }

    /// Record whether the host has a clipboard API.
    pub fn with_clipboard(mut self, available: bool) -> Self {
        self.clipboard_available = available;
        self
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    /// Handle one event at time `now`.
    pub fn dispatch(&mut self, now: ViewTime, event: Event) -> Vec<Effect> {
        let span = tracing::debug_span!("dispatch", event = event.name(), now_ms = now.as_millis());
        let _guard = span.enter();

        let mut effects = Vec::new();
        let view = &mut self.view;
        match event {
            Event::Select { file } => view.on_file(&file, now, &mut effects),
            Event::DragEnter => view.on_drag(DragEvent::Enter, now, &mut effects),
            Event::DragOver => view.on_drag(DragEvent::Over, now, &mut effects),
            Event::DragLeave => view.on_drag(DragEvent::Leave, now, &mut effects),
            Event::Drop { files } => view.on_drag(DragEvent::Drop(files), now, &mut effects),
            Event::Submit => view.on_submit(now, &mut effects),
            Event::SubmitCompleted { outcome } => view.on_submit_completed(outcome, now, &mut effects),
            Event::Tick => view.on_tick(now, &mut effects),
            Event::Dismiss { id } => {
                let changes = view.channel.dismiss(id, now, &mut view.timers);
                effects.extend(changes.into_iter().map(Effect::from));
            }
            Event::ModalOpened => view.interaction.modal_open = true,
            Event::ModalClosed => view.interaction.modal_open = false,
            Event::FocusChanged { focused } => view.interaction.focus_held = focused,
            Event::StatusReported { snapshot } => view.on_snapshot(snapshot, None, now, &mut effects),
            Event::Pushed { frame } => view.on_frame(frame, now, &mut effects),
            Event::Input { value } => view.hints.input(value, now, &mut view.timers),
            Event::Copy { text } => view.on_copy(text, self.clipboard_available, now, &mut effects),
            Event::Navigate { route } => {
                let dropped = view.unmount();
                tracing::debug!(from = %view.route, to = %route, dropped_timers = dropped, "view replaced");
                self.view = ViewState::mount(&self.policy, route, now);
            }
        }
        effects
    }
}
