use super::active_theme;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders};

pub(crate) const GLYPH_ACTIVE: &str = "▸";
pub(crate) const GLYPH_CHECKED: &str = "◉";
pub(crate) const GLYPH_UNCHECKED: &str = "○";
pub(crate) const GLYPH_BULLET: &str = "•";
pub(crate) const GLYPH_SWATCH: &str = "██";

pub(crate) fn color_text() -> Color {
    active_theme().text
}

pub(crate) fn color_muted() -> Color {
    active_theme().muted
}

pub(crate) fn color_border() -> Color {
    active_theme().border
}

pub(crate) fn color_accent() -> Color {
    active_theme().accent
}

pub(crate) fn color_success() -> Color {
    active_theme().success
}

pub(crate) fn color_warning() -> Color {
    active_theme().warning
}

pub(crate) fn color_error() -> Color {
    active_theme().error
}

pub(crate) fn panel_block<'a>(glyph: &'a str, title: &'a str, focused: bool) -> Block<'a> {
    let border_color = if focused {
        active_theme().border_active
    } else {
        color_border()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Line::from(vec![
            Span::styled(
                format!(" {glyph} "),
                Style::default()
                    .fg(color_accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                title,
                Style::default()
                    .fg(color_text())
                    .add_modifier(Modifier::BOLD),
            ),
        ]))
}

pub(crate) fn action_hint_spans(hints: &[(&'static str, &'static str)]) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (idx, (key, label)) in hints.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled("  |  ", Style::default().fg(color_border())));
        }
        spans.push(Span::styled(
            format!("[{key}]"),
            Style::default()
                .fg(color_accent())
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {label}"),
            Style::default().fg(color_muted()),
        ));
    }
    spans
}

pub(crate) fn status_message_style(status: &str) -> Style {
    let lower = status.to_ascii_lowercase();
    if lower.contains("fail") || lower.contains("error") {
        Style::default().fg(color_error())
    } else if lower.contains("generating") || lower.contains("cancel") {
        Style::default().fg(color_accent())
    } else if lower.contains("saved") || lower.contains("restored") || lower.contains("done") {
        Style::default().fg(color_success())
    } else {
        Style::default().fg(color_muted())
    }
}

pub(crate) fn checkbox(checked: bool) -> &'static str {
    if checked {
        GLYPH_CHECKED
    } else {
        GLYPH_UNCHECKED
    }
}

pub(crate) fn focus_marker(focused: bool) -> &'static str {
    if focused { GLYPH_ACTIVE } else { " " }
}

/// Fixed-size rectangle centered in `area`, clamped to fit.
pub(crate) fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

/// Applies a typing key to `target`. Returns whether the text changed.
pub(crate) fn edit_text_field(target: &mut String, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Backspace => target.pop().is_some(),
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL)
                || key.modifiers.contains(KeyModifiers::ALT)
            {
                return false;
            }
            target.push(c);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{centered_rect, edit_text_field};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::layout::Rect;

    #[test]
    fn typing_edits_and_control_chords_are_ignored() {
        let mut value = "ca".to_owned();
        assert!(edit_text_field(&mut value, KeyEvent::new(KeyCode::Char('t'), KeyModifiers::NONE)));
        assert!(edit_text_field(&mut value, KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT)));
        assert!(!edit_text_field(&mut value, KeyEvent::new(KeyCode::Char('g'), KeyModifiers::CONTROL)));
        assert_eq!(value, "catS");

        assert!(edit_text_field(&mut value, KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE)));
        assert_eq!(value, "cat");

        let mut empty = String::new();
        assert!(!edit_text_field(&mut empty, KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE)));
    }

    #[test]
    fn centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered_rect(area, 20, 4), Rect::new(10, 3, 20, 4));
        assert_eq!(centered_rect(area, 80, 30), area);
    }
}
