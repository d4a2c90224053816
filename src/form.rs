use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Control ids shared with the markup layer. The string forms are a contract
/// with the backend's front end and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControlId {
    GenerateButton,
    CancelButton,
    AdvancedOptionsToggle,
    AdvancedOptions,
    VideoSubject,
    AiModel,
    Voice,
    WordCount,
    YoutubeUploadToggle,
    UseMusicToggle,
    ZipUrl,
    WatermarkPath,
    WatermarkPosition,
    WatermarkSize,
    Threads,
    OnlyVertical,
    SubtitlesPosition,
    CustomPrompt,
    SubtitlesColor,
    MetadataGeneration,
    ReuseChoicesToggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Button,
    Panel,
    Text,
    Select,
    Checkbox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

const fn opt(value: &'static str, label: &'static str) -> SelectOption {
    SelectOption { value, label }
}

const AI_MODELS: &[SelectOption] = &[
    opt("g4f", "g4f (no API key)"),
    opt("gpt3.5-turbo", "OpenAI GPT-3.5"),
    opt("gpt4", "OpenAI GPT-4"),
    opt("gemmini", "Google Gemini Pro"),
    opt("mistral-small-latest", "Mistral Small"),
    opt("mistral-medium-latest", "Mistral Medium"),
    opt("mistral-large-latest", "Mistral Large"),
    opt("groq-llama3-70b-8192", "Groq Llama 3 70B"),
    opt("groq-mixtral-8x7b-32768", "Groq Mixtral 8x7B"),
];

const VOICES: &[SelectOption] = &[
    opt("en_us_001", "English US - Female"),
    opt("en_us_006", "English US - Male 1"),
    opt("en_us_007", "English US - Male 2"),
    opt("en_us_009", "English US - Male 3"),
    opt("en_us_010", "English US - Male 4"),
    opt("en_uk_001", "English UK - Male 1"),
    opt("en_uk_003", "English UK - Male 2"),
    opt("en_au_001", "English AU - Female"),
    opt("en_au_002", "English AU - Male"),
    opt("en_us_ghostface", "Ghost Face"),
    opt("en_us_c3po", "C3PO"),
    opt("en_us_stormtrooper", "Stormtrooper"),
    opt("fr_001", "French - Male 1"),
    opt("de_001", "German - Female"),
    opt("es_002", "Spanish - Male"),
];

const WATERMARK_POSITIONS: &[SelectOption] = &[
    opt("bottom_right", "Bottom right"),
    opt("bottom_left", "Bottom left"),
    opt("top_right", "Top right"),
    opt("top_left", "Top left"),
    opt("center", "Center"),
];

const SUBTITLE_POSITIONS: &[SelectOption] = &[
    opt("center,center", "Center"),
    opt("center,bottom", "Bottom"),
    opt("center,top", "Top"),
    opt("left,bottom", "Bottom left"),
    opt("right,bottom", "Bottom right"),
];

impl ControlId {
    pub const ALL: [ControlId; 21] = [
        Self::GenerateButton,
        Self::CancelButton,
        Self::AdvancedOptionsToggle,
        Self::AdvancedOptions,
        Self::VideoSubject,
        Self::AiModel,
        Self::Voice,
        Self::WordCount,
        Self::YoutubeUploadToggle,
        Self::UseMusicToggle,
        Self::ZipUrl,
        Self::WatermarkPath,
        Self::WatermarkPosition,
        Self::WatermarkSize,
        Self::Threads,
        Self::OnlyVertical,
        Self::SubtitlesPosition,
        Self::CustomPrompt,
        Self::SubtitlesColor,
        Self::MetadataGeneration,
        Self::ReuseChoicesToggle,
    ];

    /// Controls rendered inside the advanced-options panel, in display order.
    pub const ADVANCED: [ControlId; 16] = [
        Self::AiModel,
        Self::Voice,
        Self::WordCount,
        Self::CustomPrompt,
        Self::ZipUrl,
        Self::Threads,
        Self::SubtitlesPosition,
        Self::SubtitlesColor,
        Self::WatermarkPath,
        Self::WatermarkPosition,
        Self::WatermarkSize,
        Self::YoutubeUploadToggle,
        Self::UseMusicToggle,
        Self::OnlyVertical,
        Self::MetadataGeneration,
        Self::ReuseChoicesToggle,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GenerateButton => "generateButton",
            Self::CancelButton => "cancelButton",
            Self::AdvancedOptionsToggle => "advancedOptionsToggle",
            Self::AdvancedOptions => "advancedOptions",
            Self::VideoSubject => "videoSubject",
            Self::AiModel => "aiModel",
            Self::Voice => "voice",
            Self::WordCount => "wordCount",
            Self::YoutubeUploadToggle => "youtubeUploadToggle",
            Self::UseMusicToggle => "useMusicToggle",
            Self::ZipUrl => "zipUrl",
            Self::WatermarkPath => "watermarkPath",
            Self::WatermarkPosition => "watermarkPosition",
            Self::WatermarkSize => "watermarkSize",
            Self::Threads => "threads",
            Self::OnlyVertical => "onlyVertical",
            Self::SubtitlesPosition => "subtitlesPosition",
            Self::CustomPrompt => "customPrompt",
            Self::SubtitlesColor => "subtitlesColor",
            Self::MetadataGeneration => "metadataGeneration",
            Self::ReuseChoicesToggle => "reuseChoicesToggle",
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|control| control.as_str() == id)
    }

    /// Key under which this control's preference is stored: `${id}Value`.
    #[must_use]
    pub fn storage_key(self) -> String {
        format!("{}Value", self.as_str())
    }

    #[must_use]
    pub const fn kind(self) -> ControlKind {
        match self {
            Self::GenerateButton | Self::CancelButton | Self::AdvancedOptionsToggle => {
                ControlKind::Button
            }
            Self::AdvancedOptions => ControlKind::Panel,
            Self::AiModel | Self::Voice | Self::WatermarkPosition | Self::SubtitlesPosition => {
                ControlKind::Select
            }
            Self::YoutubeUploadToggle
            | Self::UseMusicToggle
            | Self::OnlyVertical
            | Self::MetadataGeneration
            | Self::ReuseChoicesToggle => ControlKind::Checkbox,
            Self::VideoSubject
            | Self::WordCount
            | Self::ZipUrl
            | Self::WatermarkPath
            | Self::WatermarkSize
            | Self::Threads
            | Self::CustomPrompt
            | Self::SubtitlesColor => ControlKind::Text,
        }
    }

    #[must_use]
    pub const fn options(self) -> &'static [SelectOption] {
        match self {
            Self::AiModel => AI_MODELS,
            Self::Voice => VOICES,
            Self::WatermarkPosition => WATERMARK_POSITIONS,
            Self::SubtitlesPosition => SUBTITLE_POSITIONS,
            _ => &[],
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GenerateButton => "Generate",
            Self::CancelButton => "Cancel",
            Self::AdvancedOptionsToggle => "Advanced Options",
            Self::AdvancedOptions => "Options",
            Self::VideoSubject => "Subject",
            Self::AiModel => "AI Model",
            Self::Voice => "Voice",
            Self::WordCount => "Word Count",
            Self::YoutubeUploadToggle => "Upload to YouTube",
            Self::UseMusicToggle => "Use Music",
            Self::ZipUrl => "Songs ZIP URL",
            Self::WatermarkPath => "Watermark Path",
            Self::WatermarkPosition => "Watermark Position",
            Self::WatermarkSize => "Watermark Size",
            Self::Threads => "Threads",
            Self::OnlyVertical => "Only Vertical Clips",
            Self::SubtitlesPosition => "Subtitles Position",
            Self::CustomPrompt => "Custom Prompt",
            Self::SubtitlesColor => "Subtitles Color",
            Self::MetadataGeneration => "Generate Metadata",
            Self::ReuseChoicesToggle => "Reuse Choices",
        }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const LABEL_SHOW_MORE: &str = "Show Advanced Options ▼";
pub const LABEL_SHOW_LESS: &str = "Show less Options ▲";

/// Current values of every input control, seeded with the markup defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    values: BTreeMap<ControlId, String>,
    checked: BTreeMap<ControlId, bool>,
    advanced_label: String,
}

impl Default for FormState {
    fn default() -> Self {
        let mut values = BTreeMap::new();
        let mut checked = BTreeMap::new();
        for id in ControlId::ALL {
            match id.kind() {
                ControlKind::Checkbox => {
                    checked.insert(id, false);
                }
                ControlKind::Text | ControlKind::Select => {
                    values.insert(id, markup_default(id).to_owned());
                }
                ControlKind::Button | ControlKind::Panel => {}
            }
        }
        Self {
            values,
            checked,
            advanced_label: LABEL_SHOW_MORE.to_owned(),
        }
    }
}

fn markup_default(id: ControlId) -> &'static str {
    match id {
        ControlId::WordCount => "500",
        ControlId::Threads => "2",
        ControlId::SubtitlesColor => "#FFFF00",
        ControlId::WatermarkSize => "0.1",
        _ => id.options().first().map_or("", |option| option.value),
    }
}

impl FormState {
    /// Value of a text or select control; empty for anything else.
    #[must_use]
    pub fn value(&self, id: ControlId) -> &str {
        self.values.get(&id).map_or("", String::as_str)
    }

    #[must_use]
    pub fn checked(&self, id: ControlId) -> bool {
        self.checked.get(&id).copied().unwrap_or(false)
    }

    /// Returns false when `id` does not hold a value.
    pub fn set_value(&mut self, id: ControlId, value: impl Into<String>) -> bool {
        match self.values.get_mut(&id) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn value_mut(&mut self, id: ControlId) -> Option<&mut String> {
        self.values.get_mut(&id)
    }

    pub fn set_checked(&mut self, id: ControlId, checked: bool) -> bool {
        match self.checked.get_mut(&id) {
            Some(slot) => {
                *slot = checked;
                true
            }
            None => false,
        }
    }

    /// Text of the advanced-options toggle button.
    #[must_use]
    pub fn advanced_label(&self) -> &str {
        &self.advanced_label
    }

    pub fn set_advanced_label(&mut self, label: impl Into<String>) {
        self.advanced_label = label.into();
    }

    /// Stringified value as it is mirrored to storage.
    #[must_use]
    pub fn stored_form(&self, id: ControlId) -> Option<String> {
        match id.kind() {
            ControlKind::Checkbox => Some(self.checked(id).to_string()),
            ControlKind::Text | ControlKind::Select => Some(self.value(id).to_owned()),
            ControlKind::Button | ControlKind::Panel => None,
        }
    }

    /// Moves a select control to the neighbouring option, wrapping around.
    /// A value outside the option list restarts from the first option.
    pub fn cycle_option(&mut self, id: ControlId, forward: bool) -> bool {
        let options = id.options();
        if options.is_empty() {
            return false;
        }
        let current = options
            .iter()
            .position(|option| option.value == self.value(id));
        let next = match (current, forward) {
            (None, _) => 0,
            (Some(idx), true) => (idx + 1) % options.len(),
            (Some(idx), false) => (idx + options.len() - 1) % options.len(),
        };
        self.set_value(id, options[next].value)
    }
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub video_subject: String,
    pub ai_model: String,
    pub voice: String,
    pub word_count: String,
    pub automate_youtube_upload: bool,
    pub use_music: bool,
    pub zip_url: String,
    pub watermark_path: String,
    pub watermark_position: String,
    pub watermark_size: String,
    pub threads: String,
    pub only_vertical: bool,
    pub subtitles_position: String,
    pub custom_prompt: String,
    pub color: String,
    pub metadata_generation: bool,
}

impl GenerationRequest {
    /// Reads every field verbatim; nothing is validated client-side.
    #[must_use]
    pub fn from_form(form: &FormState) -> Self {
        let text = |id| form.value(id).to_owned();
        Self {
            video_subject: text(ControlId::VideoSubject),
            ai_model: text(ControlId::AiModel),
            voice: text(ControlId::Voice),
            word_count: text(ControlId::WordCount),
            automate_youtube_upload: form.checked(ControlId::YoutubeUploadToggle),
            use_music: form.checked(ControlId::UseMusicToggle),
            zip_url: text(ControlId::ZipUrl),
            watermark_path: text(ControlId::WatermarkPath),
            watermark_position: text(ControlId::WatermarkPosition),
            watermark_size: text(ControlId::WatermarkSize),
            threads: text(ControlId::Threads),
            only_vertical: form.checked(ControlId::OnlyVertical),
            subtitles_position: text(ControlId::SubtitlesPosition),
            custom_prompt: text(ControlId::CustomPrompt),
            color: text(ControlId::SubtitlesColor),
            metadata_generation: form.checked(ControlId::MetadataGeneration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ControlId, ControlKind, FormState, GenerationRequest};

    #[test]
    fn control_ids_round_trip_through_their_markup_names() {
        for id in ControlId::ALL {
            assert_eq!(ControlId::from_id(id.as_str()), Some(id));
        }
        assert_eq!(ControlId::from_id("nope"), None);
        assert_eq!(
            ControlId::ReuseChoicesToggle.storage_key(),
            "reuseChoicesToggleValue"
        );
    }

    #[test]
    fn request_uses_backend_field_names() {
        let mut form = FormState::default();
        form.set_value(ControlId::VideoSubject, "deep sea fish");
        form.set_value(ControlId::SubtitlesColor, "#00FF00");
        form.set_checked(ControlId::YoutubeUploadToggle, true);

        let payload = serde_json::to_value(GenerationRequest::from_form(&form)).unwrap();
        let object = payload.as_object().unwrap();

        assert_eq!(object.len(), 16);
        assert_eq!(payload["videoSubject"], "deep sea fish");
        assert_eq!(payload["color"], "#00FF00");
        assert_eq!(payload["automateYoutubeUpload"], true);
        assert_eq!(payload["useMusic"], false);
        assert_eq!(payload["wordCount"], "500");
        assert_eq!(payload["aiModel"], "g4f");
        for key in [
            "voice",
            "zipUrl",
            "watermarkPath",
            "watermarkPosition",
            "watermarkSize",
            "threads",
            "onlyVertical",
            "subtitlesPosition",
            "customPrompt",
            "metadataGeneration",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn request_keeps_invalid_values_verbatim() {
        let mut form = FormState::default();
        form.set_value(ControlId::WordCount, "lots");
        form.set_value(ControlId::Threads, "");

        let request = GenerationRequest::from_form(&form);
        assert_eq!(request.word_count, "lots");
        assert_eq!(request.threads, "");
    }

    #[test]
    fn cycle_option_wraps_in_both_directions() {
        let mut form = FormState::default();
        let options = ControlId::WatermarkPosition.options();

        form.cycle_option(ControlId::WatermarkPosition, false);
        assert_eq!(
            form.value(ControlId::WatermarkPosition),
            options[options.len() - 1].value
        );
        form.cycle_option(ControlId::WatermarkPosition, true);
        assert_eq!(form.value(ControlId::WatermarkPosition), options[0].value);

        form.set_value(ControlId::WatermarkPosition, "somewhere");
        form.cycle_option(ControlId::WatermarkPosition, true);
        assert_eq!(form.value(ControlId::WatermarkPosition), options[0].value);
        assert!(!form.cycle_option(ControlId::WordCount, true));
    }

    #[test]
    fn buttons_and_panels_hold_no_value() {
        let mut form = FormState::default();
        assert!(!form.set_value(ControlId::GenerateButton, "x"));
        assert!(!form.set_checked(ControlId::VideoSubject, true));
        assert_eq!(form.stored_form(ControlId::AdvancedOptions), None);
        assert_eq!(ControlId::OnlyVertical.kind(), ControlKind::Checkbox);
        assert_eq!(
            form.stored_form(ControlId::OnlyVertical).as_deref(),
            Some("false")
        );
    }
}
