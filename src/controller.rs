//! Form controller: request composition, button state and preference sync.
//!
//! The controller never performs I/O on the network itself. `generate_video`
//! returns the request body and `cancel_generation` only applies the button
//! transition; the caller dispatches the request and hands the settled outcome
//! back through `finish_generation` and `finish_cancel`. Every transition stays
//! on one thread, in the order the user caused it.

use crate::api::{ApiError, ApiReply};
use crate::form::{
    ControlId, ControlKind, FormState, GenerationRequest, LABEL_SHOW_LESS, LABEL_SHOW_MORE,
};
use crate::settings::TransitionPolicy;
use crate::storage::PreferenceStore;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

pub const GENERIC_FAILURE: &str = "An error occurred. Please try again later.";

const DOWN_ARROW: char = '▼';

/// Which controls are mirrored to storage and how they are restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Checkboxes stored as `"true"` / `"false"`.
    pub toggles: Vec<ControlId>,
    /// Text and select controls stored verbatim.
    pub fields: Vec<ControlId>,
    /// Checkbox whose stored value must be `"true"` before gated controls are restored.
    pub reuse_gate: ControlId,
    /// Restored on load whatever the gate says.
    pub ungated: Vec<ControlId>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            toggles: vec![
                ControlId::YoutubeUploadToggle,
                ControlId::UseMusicToggle,
                ControlId::ReuseChoicesToggle,
                ControlId::OnlyVertical,
                ControlId::MetadataGeneration,
            ],
            fields: vec![
                ControlId::AiModel,
                ControlId::Voice,
                ControlId::WordCount,
                ControlId::VideoSubject,
                ControlId::ZipUrl,
                ControlId::WatermarkPath,
                ControlId::WatermarkPosition,
                ControlId::WatermarkSize,
                ControlId::CustomPrompt,
                ControlId::Threads,
                ControlId::SubtitlesPosition,
                ControlId::SubtitlesColor,
            ],
            reuse_gate: ControlId::ReuseChoicesToggle,
            ungated: vec![ControlId::Voice],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMode {
    Idle,
    Generating,
    /// A request settled with a transport or parse failure. Only entered
    /// under [`TransitionPolicy::Settled`].
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    pub generate_visible: bool,
    pub generate_enabled: bool,
    pub cancel_visible: bool,
}

impl UiMode {
    #[must_use]
    pub const fn buttons(&self) -> ButtonState {
        match self {
            Self::Generating => ButtonState {
                generate_visible: false,
                generate_enabled: false,
                cancel_visible: true,
            },
            Self::Idle | Self::Error(_) => ButtonState {
                generate_visible: true,
                generate_enabled: true,
                cancel_visible: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Message,
    Failure,
}

/// A blocking notification waiting to be acknowledged by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    fn message(text: String) -> Self {
        Self {
            kind: NoticeKind::Message,
            text,
        }
    }

    fn failure() -> Self {
        Self {
            kind: NoticeKind::Failure,
            text: GENERIC_FAILURE.to_owned(),
        }
    }
}

pub struct FormController<S> {
    config: WatchConfig,
    policy: TransitionPolicy,
    store: S,
    form: FormState,
    mode: UiMode,
    advanced_visible: bool,
    notices: VecDeque<Notice>,
}

impl<S: PreferenceStore> FormController<S> {
    /// Builds the controller and restores stored preferences into `form`.
    pub fn load(config: WatchConfig, policy: TransitionPolicy, store: S, form: FormState) -> Self {
        let mut controller = Self {
            config,
            policy,
            store,
            form,
            mode: UiMode::Idle,
            advanced_visible: false,
            notices: VecDeque::new(),
        };
        controller.restore_preferences();
        controller
    }

    #[must_use]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn mode(&self) -> &UiMode {
        &self.mode
    }

    #[must_use]
    pub fn buttons(&self) -> ButtonState {
        self.mode.buttons()
    }

    #[must_use]
    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    #[must_use]
    pub fn advanced_label(&self) -> &str {
        self.form.advanced_label()
    }

    #[must_use]
    pub fn advanced_visible(&self) -> bool {
        self.advanced_visible
    }

    /// Oldest notification not yet acknowledged.
    #[must_use]
    pub fn current_notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Replaces the label and flips panel visibility. The next label is picked
    /// from whether the current one contains the down arrow, so the
    /// alternation starts from whatever label the form was built with.
    pub fn toggle_advanced_options(&mut self) {
        let next = if self.form.advanced_label().contains(DOWN_ARROW) {
            LABEL_SHOW_LESS
        } else {
            LABEL_SHOW_MORE
        };
        self.form.set_advanced_label(next);
        self.advanced_visible = !self.advanced_visible;
    }

    /// Switches to Generating and snapshots the form for `POST /api/generate`.
    ///
    /// Nothing is validated, and nothing prevents a second submission while
    /// one is already in flight.
    pub fn generate_video(&mut self) -> GenerationRequest {
        info!("generating video");
        self.mode = UiMode::Generating;
        GenerationRequest::from_form(&self.form)
    }

    /// Enter in the subject field submits exactly like the generate button.
    pub fn on_keyup(&mut self, id: ControlId, key: &str) -> Option<GenerationRequest> {
        (id == ControlId::VideoSubject && key == "Enter").then(|| self.generate_video())
    }

    /// Applies the settled outcome of a generate request.
    ///
    /// Any parsed reply returns the form to Idle, even when the message
    /// reports a backend failure.
    pub fn finish_generation(&mut self, outcome: Result<ApiReply, ApiError>) {
        match outcome {
            Ok(reply) => {
                info!(data = %reply.data, "generate request settled");
                self.notices.push_back(Notice::message(reply.notice_text()));
                self.mode = UiMode::Idle;
            }
            Err(err) => {
                warn!(error = %err, "generate request failed");
                self.notices.push_back(Notice::failure());
                match self.policy {
                    // Buttons keep showing Generating even though no job may exist.
                    TransitionPolicy::Legacy => {}
                    TransitionPolicy::Settled => self.mode = UiMode::Error(err.to_string()),
                }
            }
        }
    }

    /// Requests cancellation of the backend job.
    ///
    /// This never aborts an in-flight generate request. Under the legacy
    /// policy the buttons return to Idle right away, before the cancel
    /// request is even sent.
    pub fn cancel_generation(&mut self) {
        info!("canceling generation");
        if self.policy == TransitionPolicy::Legacy {
            self.mode = UiMode::Idle;
        }
    }

    pub fn finish_cancel(&mut self, outcome: Result<ApiReply, ApiError>) {
        match outcome {
            Ok(reply) => {
                info!(data = %reply.data, "cancel request settled");
                self.notices.push_back(Notice::message(reply.notice_text()));
                if self.policy == TransitionPolicy::Settled {
                    self.mode = UiMode::Idle;
                }
            }
            Err(err) => {
                warn!(error = %err, "cancel request failed");
                self.notices.push_back(Notice::failure());
                if self.policy == TransitionPolicy::Settled {
                    self.mode = UiMode::Error(err.to_string());
                }
            }
        }
    }

    /// Mutable access for in-progress typing; no change event fires.
    pub fn value_mut(&mut self, id: ControlId) -> Option<&mut String> {
        self.form.value_mut(id)
    }

    pub fn set_value(&mut self, id: ControlId, value: impl Into<String>) -> bool {
        self.form.set_value(id, value)
    }

    /// Sets a checkbox and fires its change event. Returns whether the value
    /// reached storage.
    pub fn change_checked(&mut self, id: ControlId, checked: bool) -> bool {
        self.form.set_checked(id, checked) && self.commit_change(id)
    }

    pub fn toggle_checked(&mut self, id: ControlId) -> bool {
        let checked = !self.form.checked(id);
        self.change_checked(id, checked)
    }

    pub fn cycle_option(&mut self, id: ControlId, forward: bool) -> bool {
        self.form.cycle_option(id, forward) && self.commit_change(id)
    }

    /// The change event: mirrors a watched control into storage with exactly
    /// one write. Returns whether anything was written.
    pub fn commit_change(&mut self, id: ControlId) -> bool {
        let watched = match id.kind() {
            ControlKind::Checkbox => self.config.toggles.contains(&id),
            ControlKind::Text | ControlKind::Select => self.config.fields.contains(&id),
            ControlKind::Button | ControlKind::Panel => false,
        };
        if !watched {
            return false;
        }
        let Some(value) = self.form.stored_form(id) else {
            return false;
        };

        let key = id.storage_key();
        debug!(%key, %value, "storing preference");
        if let Err(err) = self.store.set(&key, &value) {
            warn!(%key, "failed storing preference: {err:#}");
            return false;
        }
        true
    }

    /// Applies stored preferences on load.
    ///
    /// Ungated controls (the voice) are restored from any non-empty stored
    /// value. Everything else only comes back when the reuse gate is stored as
    /// exactly `"true"`: toggles from any stored value, fields from non-empty
    /// ones.
    fn restore_preferences(&mut self) {
        for id in self.config.ungated.clone() {
            if let Some(stored) = self.store.get(&id.storage_key())
                && !stored.is_empty()
            {
                self.form.set_value(id, stored);
            }
        }

        let reuse = self
            .store
            .get(&self.config.reuse_gate.storage_key())
            .is_some_and(|value| value == "true");
        if !reuse {
            return;
        }

        let mut restored = 0_usize;
        for id in self.config.toggles.clone() {
            if let Some(stored) = self.store.get(&id.storage_key()) {
                self.form.set_checked(id, stored == "true");
                restored += 1;
            }
        }
        for id in self.config.fields.clone() {
            if let Some(stored) = self.store.get(&id.storage_key())
                && !stored.is_empty()
            {
                if !id.options().is_empty()
                    && !id.options().iter().any(|option| option.value == stored)
                {
                    warn!(control = %id, value = %stored, "restoring value outside option list");
                }
                self.form.set_value(id, stored);
                restored += 1;
            }
        }
        info!(restored, "reused stored choices");
    }
}

#[cfg(test)]
mod tests {
    use super::{ButtonState, FormController, GENERIC_FAILURE, NoticeKind, UiMode, WatchConfig};
    use crate::api::{ApiError, ApiReply};
    use crate::form::{ControlId, FormState, LABEL_SHOW_LESS, LABEL_SHOW_MORE};
    use crate::settings::TransitionPolicy;
    use crate::storage::{FailingPreferenceStore, MemoryPreferenceStore, PreferenceStore};
    use serde_json::json;

    const GENERATING: ButtonState = ButtonState {
        generate_visible: false,
        generate_enabled: false,
        cancel_visible: true,
    };
    const IDLE: ButtonState = ButtonState {
        generate_visible: true,
        generate_enabled: true,
        cancel_visible: false,
    };

    fn controller_with(
        entries: &[(&str, &str)],
        policy: TransitionPolicy,
    ) -> FormController<MemoryPreferenceStore> {
        FormController::load(
            WatchConfig::default(),
            policy,
            MemoryPreferenceStore::with_entries(entries.iter().copied()),
            FormState::default(),
        )
    }

    fn legacy() -> FormController<MemoryPreferenceStore> {
        controller_with(&[], TransitionPolicy::Legacy)
    }

    fn reply(data: serde_json::Value) -> Result<ApiReply, ApiError> {
        Ok(ApiReply { data })
    }

    fn transport_failure() -> Result<ApiReply, ApiError> {
        Err(ApiError::Task("connection reset".to_owned()))
    }

    #[test]
    fn advanced_label_alternates_on_every_click() {
        let mut controller = legacy();
        assert_eq!(controller.advanced_label(), LABEL_SHOW_MORE);
        assert!(!controller.advanced_visible());

        for click in 1..=7 {
            controller.toggle_advanced_options();
            let expanded = click % 2 == 1;
            let expected = if expanded { LABEL_SHOW_LESS } else { LABEL_SHOW_MORE };
            assert_eq!(controller.advanced_label(), expected);
            assert_eq!(controller.advanced_visible(), expanded);
        }
    }

    #[test]
    fn advanced_label_alternation_starts_from_initial_label() {
        let mut form = FormState::default();
        form.set_advanced_label(LABEL_SHOW_LESS);
        let mut controller = FormController::load(
            WatchConfig::default(),
            TransitionPolicy::Legacy,
            MemoryPreferenceStore::default(),
            form,
        );
        assert_eq!(controller.advanced_label(), LABEL_SHOW_LESS);

        controller.toggle_advanced_options();
        assert_eq!(controller.advanced_label(), LABEL_SHOW_MORE);
        assert!(controller.advanced_visible());

        controller.toggle_advanced_options();
        assert_eq!(controller.advanced_label(), LABEL_SHOW_LESS);
        assert!(!controller.advanced_visible());
    }

    #[test]
    fn generate_switches_to_generating_before_any_reply() {
        let mut controller = legacy();
        assert_eq!(controller.buttons(), IDLE);

        let request = controller.generate_video();

        assert_eq!(controller.mode(), &UiMode::Generating);
        assert_eq!(controller.buttons(), GENERATING);
        assert_eq!(request.word_count, "500");
        assert!(controller.current_notice().is_none());
    }

    #[test]
    fn generate_reply_returns_to_idle_with_one_alert() {
        let mut controller = legacy();
        controller.generate_video();

        controller.finish_generation(reply(json!({"message": "done"})));

        assert_eq!(controller.buttons(), IDLE);
        let notices = controller.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Message);
        assert_eq!(notices[0].text, "done");
    }

    #[test]
    fn backend_reported_failure_still_returns_to_idle() {
        let mut controller = legacy();
        controller.generate_video();

        controller.finish_generation(reply(
            json!({"status": "error", "message": "Could not find any stock videos."}),
        ));

        assert_eq!(controller.mode(), &UiMode::Idle);
        assert_eq!(
            controller.dismiss_notice().map(|notice| notice.text).as_deref(),
            Some("Could not find any stock videos.")
        );
    }

    #[test]
    fn legacy_generate_failure_leaves_buttons_generating() {
        let mut controller = legacy();
        controller.generate_video();

        controller.finish_generation(transport_failure());

        assert_eq!(controller.buttons(), GENERATING);
        let notices = controller.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Failure);
        assert_eq!(notices[0].text, GENERIC_FAILURE);
    }

    #[test]
    fn legacy_cancel_resets_buttons_before_request_settles() {
        let mut controller = legacy();
        controller.generate_video();

        controller.cancel_generation();
        assert_eq!(controller.buttons(), IDLE);

        controller.finish_cancel(transport_failure());
        assert_eq!(controller.buttons(), IDLE);
        assert_eq!(
            controller.dismiss_notice().map(|notice| notice.text).as_deref(),
            Some(GENERIC_FAILURE)
        );
    }

    #[test]
    fn legacy_cancel_reply_is_surfaced() {
        let mut controller = legacy();
        controller.generate_video();
        controller.cancel_generation();

        controller.finish_cancel(reply(json!({"message": "Canceled video generation."})));

        assert_eq!(controller.buttons(), IDLE);
        assert_eq!(controller.drain_notices().len(), 1);
    }

    #[test]
    fn settled_generate_failure_enters_error() {
        let mut controller = controller_with(&[], TransitionPolicy::Settled);
        controller.generate_video();

        controller.finish_generation(transport_failure());

        assert!(matches!(controller.mode(), UiMode::Error(reason) if reason.contains("connection reset")));
        assert_eq!(controller.buttons(), IDLE);
        assert_eq!(controller.drain_notices().len(), 1);

        controller.generate_video();
        controller.finish_generation(reply(json!({"message": "ok"})));
        assert_eq!(controller.mode(), &UiMode::Idle);
    }

    #[test]
    fn settled_cancel_waits_for_its_outcome() {
        let mut controller = controller_with(&[], TransitionPolicy::Settled);
        controller.generate_video();

        controller.cancel_generation();
        assert_eq!(controller.buttons(), GENERATING);

        controller.finish_cancel(reply(json!({"message": "Canceled video generation."})));
        assert_eq!(controller.mode(), &UiMode::Idle);

        controller.generate_video();
        controller.cancel_generation();
        controller.finish_cancel(transport_failure());
        assert!(matches!(controller.mode(), UiMode::Error(_)));
        assert_eq!(controller.buttons(), IDLE);
    }

    #[test]
    fn exactly_one_action_button_is_live_in_every_mode() {
        for mode in [UiMode::Idle, UiMode::Generating, UiMode::Error("x".to_owned())] {
            let buttons = mode.buttons();
            let generate_live = buttons.generate_visible && buttons.generate_enabled;
            assert!(generate_live ^ buttons.cancel_visible, "{mode:?}");
        }
    }

    #[test]
    fn enter_in_subject_submits() {
        let mut controller = legacy();
        controller.set_value(ControlId::VideoSubject, "honey bees");

        assert!(controller.on_keyup(ControlId::VideoSubject, "a").is_none());
        assert!(controller.on_keyup(ControlId::CustomPrompt, "Enter").is_none());
        assert_eq!(controller.mode(), &UiMode::Idle);

        let request = controller.on_keyup(ControlId::VideoSubject, "Enter").unwrap();
        assert_eq!(request.video_subject, "honey bees");
        assert_eq!(controller.buttons(), GENERATING);
    }

    #[test]
    fn overlapping_submissions_are_not_blocked() {
        let mut controller = legacy();
        controller.generate_video();
        controller.generate_video();

        controller.finish_generation(reply(json!({"message": "first"})));
        controller.finish_generation(reply(json!({"message": "second"})));

        let texts: Vec<_> = controller
            .drain_notices()
            .into_iter()
            .map(|notice| notice.text)
            .collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[test]
    fn reuse_gate_restores_stored_fields() {
        let controller = controller_with(
            &[("reuseChoicesToggleValue", "true"), ("wordCountValue", "600")],
            TransitionPolicy::Legacy,
        );
        assert_eq!(controller.form().value(ControlId::WordCount), "600");
        assert!(controller.form().checked(ControlId::ReuseChoicesToggle));
    }

    #[test]
    fn without_reuse_gate_markup_defaults_stay() {
        for gate in [None, Some("false"), Some("TRUE")] {
            let mut entries = vec![("wordCountValue", "600"), ("useMusicToggleValue", "true")];
            if let Some(gate) = gate {
                entries.push(("reuseChoicesToggleValue", gate));
            }
            let controller = controller_with(&entries, TransitionPolicy::Legacy);

            assert_eq!(controller.form().value(ControlId::WordCount), "500", "{gate:?}");
            assert!(!controller.form().checked(ControlId::UseMusicToggle), "{gate:?}");
        }
    }

    #[test]
    fn voice_is_restored_without_reuse_gate() {
        let controller = controller_with(&[("voiceValue", "en_us_006")], TransitionPolicy::Legacy);
        assert_eq!(controller.form().value(ControlId::Voice), "en_us_006");

        let controller = controller_with(&[("voiceValue", "")], TransitionPolicy::Legacy);
        assert_eq!(controller.form().value(ControlId::Voice), "en_us_001");
    }

    #[test]
    fn gated_restore_distinguishes_toggles_and_fields() {
        let controller = controller_with(
            &[
                ("reuseChoicesToggleValue", "true"),
                ("useMusicToggleValue", "true"),
                ("onlyVerticalValue", "yes"),
                ("threadsValue", ""),
                ("subtitlesColorValue", "#FFFFFF"),
            ],
            TransitionPolicy::Legacy,
        );
        let form = controller.form();

        assert!(form.checked(ControlId::UseMusicToggle));
        assert!(!form.checked(ControlId::OnlyVertical));
        assert_eq!(form.value(ControlId::Threads), "2");
        assert_eq!(form.value(ControlId::SubtitlesColor), "#FFFFFF");
    }

    #[test]
    fn each_change_writes_exactly_one_string_entry() {
        let mut controller = legacy();

        assert!(controller.change_checked(ControlId::YoutubeUploadToggle, true));
        controller.set_value(ControlId::WordCount, "750");
        assert!(controller.commit_change(ControlId::WordCount));
        assert!(controller.cycle_option(ControlId::AiModel, true));
        assert!(controller.toggle_checked(ControlId::YoutubeUploadToggle));

        let writes = controller.store().writes();
        assert_eq!(
            writes,
            &[
                ("youtubeUploadToggleValue".to_owned(), "true".to_owned()),
                ("wordCountValue".to_owned(), "750".to_owned()),
                ("aiModelValue".to_owned(), "gpt3.5-turbo".to_owned()),
                ("youtubeUploadToggleValue".to_owned(), "false".to_owned()),
            ]
        );
    }

    #[test]
    fn every_watched_control_writes_under_its_own_key() {
        let config = WatchConfig::default();
        let mut controller = legacy();
        for id in config.toggles.iter().chain(&config.fields) {
            assert!(controller.commit_change(*id), "{id}");
        }
        let keys: Vec<_> = controller
            .store()
            .writes()
            .iter()
            .map(|(key, _)| key.clone())
            .collect();
        assert_eq!(keys.len(), 17);
        assert!(keys.contains(&"reuseChoicesToggleValue".to_owned()));
        assert!(keys.contains(&"videoSubjectValue".to_owned()));
        assert!(keys.contains(&"subtitlesColorValue".to_owned()));
    }

    #[test]
    fn failed_write_is_reported_to_the_caller() {
        let mut controller = FormController::load(
            WatchConfig::default(),
            TransitionPolicy::Legacy,
            FailingPreferenceStore,
            FormState::default(),
        );

        assert!(!controller.toggle_checked(ControlId::UseMusicToggle));
        assert!(controller.form().checked(ControlId::UseMusicToggle));
        assert!(!controller.cycle_option(ControlId::Voice, true));
    }

    #[test]
    fn typing_alone_does_not_store() {
        let mut controller = legacy();
        controller.value_mut(ControlId::CustomPrompt).unwrap().push_str("be brief");
        assert!(controller.store().writes().is_empty());

        assert!(!controller.commit_change(ControlId::GenerateButton));
        assert!(controller.commit_change(ControlId::CustomPrompt));
        assert_eq!(
            controller.store().get("customPromptValue").as_deref(),
            Some("be brief")
        );
    }
}
