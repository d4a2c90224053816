use crate::paths;
use anyhow::{Result, anyhow};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const THEME_FILE: &str = "theme.json";

#[derive(Debug, Clone, Copy)]
pub struct ThemePalette {
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub border_active: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for ThemePalette {
    fn default() -> Self {
        // Infallible: the default config only holds valid hex strings.
        Self::from_config(&ThemeConfig::default()).unwrap_or(Self {
            text: Color::White,
            muted: Color::Gray,
            border: Color::DarkGray,
            border_active: Color::Blue,
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
        })
    }
}

/// On-disk form of the palette, one `#RRGGBB` string per role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct ThemeConfig {
    text: String,
    muted: String,
    border: String,
    border_active: String,
    accent: String,
    success: String,
    warning: String,
    error: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            text: "#ECEFF4".to_owned(),
            muted: "#8F98AB".to_owned(),
            border: "#4C566A".to_owned(),
            border_active: "#F28C38".to_owned(),
            accent: "#FFB454".to_owned(),
            success: "#7FD49B".to_owned(),
            warning: "#EBCB8B".to_owned(),
            error: "#FF6F7D".to_owned(),
        }
    }
}

impl ThemePalette {
    fn from_config(config: &ThemeConfig) -> Result<Self> {
        let role = |name: &str, value: &str| {
            parse_hex_color(value)
                .ok_or_else(|| anyhow!("theme field '{name}' must be a hex color like #RRGGBB, got '{value}'"))
        };
        Ok(Self {
            text: role("text", &config.text)?,
            muted: role("muted", &config.muted)?,
            border: role("border", &config.border)?,
            border_active: role("border_active", &config.border_active)?,
            accent: role("accent", &config.accent)?,
            success: role("success", &config.success)?,
            warning: role("warning", &config.warning)?,
            error: role("error", &config.error)?,
        })
    }
}

pub fn theme_path() -> Result<PathBuf> {
    paths::scoped_path(THEME_FILE)
}

pub fn load_or_create_theme() -> Result<ThemePalette> {
    load_or_create_at(&theme_path()?)
}

fn load_or_create_at(path: &Path) -> Result<ThemePalette> {
    if !path.exists() {
        let config = ThemeConfig::default();
        paths::write_json(path, &config, "theme config")?;
        return ThemePalette::from_config(&config);
    }
    let config: ThemeConfig = paths::read_json(path, "theme config")?;
    ThemePalette::from_config(&config)
}

/// Parses `#RRGGBB` (the leading `#` is optional). Also used to preview the
/// subtitles color typed into the form.
#[must_use]
pub fn parse_hex_color(value: &str) -> Option<Color> {
    let input = value.trim();
    let hex = input.strip_prefix('#').unwrap_or(input);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
