#![allow(clippy::too_many_lines)]

#[path = "tui_widgets.rs"]
mod widgets;

use self::widgets::{
    GLYPH_BULLET, GLYPH_SWATCH, action_hint_spans, centered_rect, checkbox, color_accent,
    color_error, color_muted, color_success, color_text, color_warning, edit_text_field,
    focus_marker, panel_block, status_message_style,
};
use crate::api::{ApiError, ApiReply, BackendClient};
use crate::controller::{FormController, NoticeKind, UiMode, WatchConfig};
use crate::form::{ControlId, ControlKind, FormState, GenerationRequest};
use crate::settings::{Settings, TransitionPolicy};
use crate::storage::{FilePreferenceStore, PreferenceStore};
use crate::theme::{self, ThemePalette};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph, Wrap};
use std::io;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const UI_IDLE_SLEEP: Duration = Duration::from_millis(16);
const LABEL_WIDTH: usize = 20;

static THEME: OnceLock<ThemePalette> = OnceLock::new();

pub async fn run_tui(settings: &Settings) -> Result<()> {
    let loaded_theme = match theme::load_or_create_theme() {
        Ok(palette) => palette,
        Err(err) => {
            eprintln!("Warning: failed to load theme config ({err:#}). Using defaults.");
            ThemePalette::default()
        }
    };
    let _ = THEME.set(loaded_theme);

    let store = FilePreferenceStore::open_default_or_empty()?;
    let client = BackendClient::new(&settings.server_url)?;
    let controller = FormController::load(
        WatchConfig::default(),
        settings.transition_policy,
        store,
        FormState::default(),
    );
    let mut app = App::new(controller, client, settings.server_url.clone());
    info!(server = %settings.server_url, policy = ?settings.transition_policy, "form opened");

    let mut terminal = init_terminal()?;
    let run_result = run_loop(&mut terminal, &mut app).await;
    let restore_result = restore_terminal(&mut terminal);

    run_result?;
    restore_result?;
    Ok(())
}

async fn run_loop<S: PreferenceStore>(terminal: &mut AppTerminal, app: &mut App<S>) -> Result<()> {
    let mut running = true;
    let mut force_ui_draw = true;

    while running {
        if app.poll_requests().await {
            force_ui_draw = true;
        }

        if force_ui_draw {
            terminal
                .draw(|frame| app.draw(frame))
                .context("failed drawing TUI frame")?;
            force_ui_draw = false;
        }

        while event::poll(Duration::ZERO).context("failed to poll input")? {
            match event::read().context("failed reading input")? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match app.handle_key(key) {
                        AppCommand::None => {}
                        AppCommand::Quit => {
                            running = false;
                            break;
                        }
                    }
                    force_ui_draw = true;
                }
                Event::Resize(_, _) => {
                    force_ui_draw = true;
                }
                _ => {}
            }
        }

        if !running {
            break;
        }
        tokio::time::sleep(UI_IDLE_SLEEP).await;
    }

    app.abort_pending();
    Ok(())
}

type AppTerminal = Terminal<CrosstermBackend<io::Stdout>>;

fn active_theme() -> &'static ThemePalette {
    THEME.get_or_init(ThemePalette::default)
}

fn init_terminal() -> Result<AppTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("failed creating terminal")
}

fn restore_terminal(terminal: &mut AppTerminal) -> Result<()> {
    disable_raw_mode().context("failed disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed leaving alternate screen")?;
    terminal.show_cursor().context("failed showing cursor")?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Generate,
    Cancel,
}

/// In-flight backend request, kept in dispatch order.
struct PendingRequest {
    kind: RequestKind,
    handle: JoinHandle<Result<ApiReply, ApiError>>,
}

struct App<S> {
    controller: FormController<S>,
    client: BackendClient,
    server_url: String,
    focus: ControlId,
    /// Value of the focused text control when it gained focus; a change event
    /// fires on blur only if the value differs.
    focus_snapshot: Option<String>,
    pending: Vec<PendingRequest>,
    status: String,
}

impl<S: PreferenceStore> App<S> {
    fn new(controller: FormController<S>, client: BackendClient, server_url: String) -> Self {
        let status = if controller.form().checked(ControlId::ReuseChoicesToggle) {
            "Restored saved choices.".to_owned()
        } else {
            String::new()
        };
        let mut app = Self {
            controller,
            client,
            server_url,
            focus: ControlId::VideoSubject,
            focus_snapshot: None,
            pending: Vec::new(),
            status,
        };
        app.focus_snapshot = app.text_snapshot(app.focus);
        app
    }

    /// Focus order; hidden controls are skipped.
    fn focusable(&self) -> Vec<ControlId> {
        let mut order = vec![ControlId::VideoSubject, ControlId::AdvancedOptionsToggle];
        if self.controller.advanced_visible() {
            order.extend(ControlId::ADVANCED);
        }
        let buttons = self.controller.buttons();
        if buttons.generate_visible {
            order.push(ControlId::GenerateButton);
        }
        if buttons.cancel_visible {
            order.push(ControlId::CancelButton);
        }
        order
    }

    fn text_snapshot(&self, id: ControlId) -> Option<String> {
        (id.kind() == ControlKind::Text).then(|| self.controller.form().value(id).to_owned())
    }

    /// Fires the change event for the focused text control if it was edited.
    fn flush_text_change(&mut self) {
        let Some(snapshot) = self.focus_snapshot.take() else {
            return;
        };
        if self.controller.form().value(self.focus) != snapshot {
            self.controller.commit_change(self.focus);
        }
        self.focus_snapshot = self.text_snapshot(self.focus);
    }

    fn set_focus(&mut self, id: ControlId) {
        if id == self.focus {
            return;
        }
        self.flush_text_change();
        self.focus = id;
        self.focus_snapshot = self.text_snapshot(id);
    }

    fn move_focus(&mut self, forward: bool) {
        let order = self.focusable();
        let current = order.iter().position(|id| *id == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % order.len()
        } else {
            (current + order.len() - 1) % order.len()
        };
        self.set_focus(order[next]);
    }

    /// Keeps focus on a visible control after buttons or panels change.
    fn normalize_focus(&mut self) {
        let order = self.focusable();
        if order.contains(&self.focus) {
            return;
        }
        let fallback = match self.focus {
            ControlId::GenerateButton | ControlId::CancelButton => order
                .iter()
                .copied()
                .find(|id| matches!(id, ControlId::GenerateButton | ControlId::CancelButton))
                .unwrap_or(ControlId::VideoSubject),
            _ => ControlId::AdvancedOptionsToggle,
        };
        self.set_focus(fallback);
    }

    fn handle_key(&mut self, key: KeyEvent) -> AppCommand {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('q')) {
            return AppCommand::Quit;
        }

        if self.controller.current_notice().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.controller.dismiss_notice();
            }
            return AppCommand::None;
        }

        match key.code {
            KeyCode::Char('g') if ctrl => {
                if self.controller.buttons().generate_enabled {
                    self.flush_text_change();
                    let request = self.controller.generate_video();
                    self.dispatch_generate(request);
                }
            }
            KeyCode::Char('x') if ctrl => {
                if self.controller.buttons().cancel_visible {
                    self.flush_text_change();
                    self.dispatch_cancel();
                }
            }
            KeyCode::Char('a') if ctrl => {
                self.controller.toggle_advanced_options();
            }
            KeyCode::Tab | KeyCode::Down => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            _ => self.handle_focused_key(key),
        }

        self.normalize_focus();
        AppCommand::None
    }

    fn handle_focused_key(&mut self, key: KeyEvent) {
        let id = self.focus;
        match id.kind() {
            ControlKind::Text => {
                if key.code == KeyCode::Enter {
                    self.flush_text_change();
                    if let Some(request) = self.controller.on_keyup(id, "Enter") {
                        self.dispatch_generate(request);
                    }
                    return;
                }
                if let Some(value) = self.controller.value_mut(id) {
                    edit_text_field(value, key);
                }
            }
            ControlKind::Select => {
                let forward = match key.code {
                    KeyCode::Left => false,
                    KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') => true,
                    _ => return,
                };
                let stored = self.controller.cycle_option(id, forward);
                self.report_preference(id, stored);
            }
            ControlKind::Checkbox => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    let stored = self.controller.toggle_checked(id);
                    self.report_preference(id, stored);
                }
            }
            ControlKind::Button => {
                if !matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    return;
                }
                match id {
                    ControlId::AdvancedOptionsToggle => self.controller.toggle_advanced_options(),
                    ControlId::GenerateButton if self.controller.buttons().generate_enabled => {
                        let request = self.controller.generate_video();
                        self.dispatch_generate(request);
                    }
                    ControlId::CancelButton => self.dispatch_cancel(),
                    _ => {}
                }
            }
            ControlKind::Panel => {}
        }
    }

    fn report_preference(&mut self, id: ControlId, stored: bool) {
        self.status = if stored {
            "Preference saved.".to_owned()
        } else {
            format!("Failed saving {}; see log.", id.label())
        };
    }

    fn dispatch_generate(&mut self, request: GenerationRequest) {
        debug!(subject = %request.video_subject, "dispatching generate request");
        let client = self.client.clone();
        self.pending.push(PendingRequest {
            kind: RequestKind::Generate,
            handle: tokio::spawn(async move { client.generate(&request).await }),
        });
        self.status = "Generating video...".to_owned();
    }

    fn dispatch_cancel(&mut self) {
        self.controller.cancel_generation();
        let client = self.client.clone();
        self.pending.push(PendingRequest {
            kind: RequestKind::Cancel,
            handle: tokio::spawn(async move { client.cancel().await }),
        });
        self.status = "Cancel requested.".to_owned();
    }

    fn pending_count(&self, kind: RequestKind) -> usize {
        self.pending.iter().filter(|request| request.kind == kind).count()
    }

    /// Feeds finished requests back into the controller in dispatch order.
    /// Returns whether any settled.
    async fn poll_requests(&mut self) -> bool {
        let finished = take_finished(&mut self.pending);
        let settled = !finished.is_empty();

        for request in finished {
            let outcome = settle(request.handle).await;
            match request.kind {
                RequestKind::Generate => {
                    self.status = match &outcome {
                        Ok(_) => "Generation request done.".to_owned(),
                        Err(err) => format!("Generation request failed: {err}"),
                    };
                    self.controller.finish_generation(outcome);
                }
                RequestKind::Cancel => {
                    self.status = match &outcome {
                        Ok(_) => "Cancel request done.".to_owned(),
                        Err(err) => format!("Cancel request failed: {err}"),
                    };
                    self.controller.finish_cancel(outcome);
                }
            }
        }

        if settled {
            self.normalize_focus();
        }
        settled
    }

    fn abort_pending(&mut self) {
        for request in self.pending.drain(..) {
            request.handle.abort();
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(5),
                Constraint::Length(5),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let subject_focused = self.focus == ControlId::VideoSubject;
        let subject_lines = vec![
            Line::from(vec![
                Span::styled(
                    format!("{} ", focus_marker(subject_focused)),
                    Style::default()
                        .fg(color_accent())
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    self.controller.form().value(ControlId::VideoSubject),
                    Style::default().fg(color_text()),
                ),
                Span::styled(
                    if subject_focused { "▏" } else { "" },
                    Style::default().fg(color_accent()),
                ),
            ]),
            Line::from(Span::styled(
                "Enter generates a video about this subject.",
                Style::default().fg(color_muted()),
            )),
        ];
        let subject_panel = Paragraph::new(subject_lines)
            .style(Style::default().fg(color_text()))
            .block(panel_block("✎", "1) Video Subject", subject_focused));
        frame.render_widget(subject_panel, layout[0]);

        let mut option_lines = Vec::new();
        let toggle_focused = self.focus == ControlId::AdvancedOptionsToggle;
        option_lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", focus_marker(toggle_focused)),
                Style::default()
                    .fg(color_accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.controller.advanced_label(),
                Style::default()
                    .fg(if toggle_focused {
                        color_accent()
                    } else {
                        color_text()
                    })
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        let mut focused_line = 0;
        if self.controller.advanced_visible() {
            for id in ControlId::ADVANCED {
                if id == self.focus {
                    focused_line = option_lines.len();
                }
                option_lines.push(self.control_line(id));
            }
        }
        let options_focused = toggle_focused || ControlId::ADVANCED.contains(&self.focus);
        let visible_rows = usize::from(layout[1].height.saturating_sub(2)).max(1);
        let scroll = u16::try_from(focused_line.saturating_sub(visible_rows - 1)).unwrap_or(0);
        let options_panel = Paragraph::new(option_lines)
            .style(Style::default().fg(color_text()))
            .block(panel_block("◈", "2) Options", options_focused))
            .scroll((scroll, 0));
        frame.render_widget(options_panel, layout[1]);

        frame.render_widget(self.actions_panel(), layout[2]);

        let footer = Paragraph::new(Line::from(action_hint_spans(&[
            ("Tab/↑↓", "Move"),
            ("←→", "Change"),
            ("Ctrl+G", "Generate"),
            ("Ctrl+X", "Cancel"),
            ("Ctrl+A", "Advanced"),
            ("Ctrl+Q", "Quit"),
        ])))
        .style(Style::default().fg(color_text()))
        .block(panel_block("⌘", "Actions", false));
        frame.render_widget(footer, layout[3]);

        if let Some(notice) = self.controller.current_notice() {
            let (glyph, title, color) = match notice.kind {
                NoticeKind::Message => ("✉", "Notice", color_accent()),
                NoticeKind::Failure => ("✖", "Error", color_error()),
            };
            let area = centered_rect(frame.area(), 60, 8);
            let popup = Paragraph::new(vec![
                Line::from(Span::styled(
                    notice.text.as_str(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
                Line::default(),
                Line::from(action_hint_spans(&[("Enter", "OK")])),
            ])
            .block(panel_block(glyph, title, true))
            .wrap(Wrap { trim: false });
            frame.render_widget(Clear, area);
            frame.render_widget(popup, area);
        }
    }

    fn control_line(&self, id: ControlId) -> Line<'_> {
        let form = self.controller.form();
        let focused = id == self.focus;
        let mut spans = vec![
            Span::styled(
                format!("{} ", focus_marker(focused)),
                Style::default()
                    .fg(color_accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{:<LABEL_WIDTH$}", id.label()),
                Style::default().fg(color_muted()),
            ),
        ];
        match id.kind() {
            ControlKind::Checkbox => {
                let checked = form.checked(id);
                spans.push(Span::styled(
                    checkbox(checked),
                    Style::default()
                        .fg(if checked { color_success() } else { color_muted() })
                        .add_modifier(Modifier::BOLD),
                ));
            }
            ControlKind::Select => {
                let value = form.value(id);
                let label = id
                    .options()
                    .iter()
                    .find(|option| option.value == value)
                    .map_or(value, |option| option.label);
                spans.push(Span::styled(
                    format!("◂ {label} ▸"),
                    Style::default().fg(color_text()),
                ));
            }
            ControlKind::Text => {
                spans.push(Span::styled(
                    form.value(id),
                    Style::default().fg(color_text()),
                ));
                if focused {
                    spans.push(Span::styled("▏", Style::default().fg(color_accent())));
                }
                if id == ControlId::SubtitlesColor
                    && let Some(color) = theme::parse_hex_color(form.value(id))
                {
                    spans.push(Span::raw(" "));
                    spans.push(Span::styled(GLYPH_SWATCH, Style::default().fg(color)));
                }
            }
            ControlKind::Button | ControlKind::Panel => {}
        }
        Line::from(spans)
    }

    fn actions_panel(&self) -> Paragraph<'_> {
        let buttons = self.controller.buttons();
        let mut button_spans = Vec::new();
        if buttons.generate_visible {
            let focused = self.focus == ControlId::GenerateButton;
            button_spans.push(Span::styled(
                format!("{} [ Generate ]", focus_marker(focused)),
                Style::default()
                    .fg(if buttons.generate_enabled {
                        color_success()
                    } else {
                        color_muted()
                    })
                    .add_modifier(Modifier::BOLD),
            ));
        }
        if buttons.cancel_visible {
            let focused = self.focus == ControlId::CancelButton;
            button_spans.push(Span::styled(
                format!("{} [ Cancel ]", focus_marker(focused)),
                Style::default()
                    .fg(color_warning())
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let (mode_text, mode_color) = match self.controller.mode() {
            UiMode::Idle => ("idle".to_owned(), color_muted()),
            UiMode::Generating => ("generating".to_owned(), color_accent()),
            UiMode::Error(reason) => (format!("error: {reason}"), color_error()),
        };
        let generating = self.pending_count(RequestKind::Generate);
        let canceling = self.pending_count(RequestKind::Cancel);
        let mut lines = vec![
            Line::from(button_spans),
            Line::from(vec![
                Span::styled(format!("{GLYPH_BULLET} "), Style::default().fg(color_accent())),
                Span::styled("Mode: ", Style::default().fg(color_muted())),
                Span::styled(mode_text, Style::default().fg(mode_color)),
                Span::styled(
                    format!(
                        "  ({generating} generate / {canceling} cancel in flight, {} transitions, {})",
                        policy_name(self.controller.policy()),
                        self.server_url
                    ),
                    Style::default().fg(color_muted()),
                ),
            ]),
        ];
        if !self.status.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("status ", Style::default().fg(color_muted())),
                Span::styled(
                    self.status.as_str(),
                    status_message_style(&self.status).add_modifier(Modifier::BOLD),
                ),
            ]));
        }

        let focused = matches!(
            self.focus,
            ControlId::GenerateButton | ControlId::CancelButton
        );
        Paragraph::new(lines)
            .style(Style::default().fg(color_text()))
            .block(panel_block("▶", "3) Generate", focused))
            .wrap(Wrap { trim: false })
    }
}

fn policy_name(policy: TransitionPolicy) -> &'static str {
    match policy {
        TransitionPolicy::Legacy => "legacy",
        TransitionPolicy::Settled => "settled",
    }
}

fn take_finished(requests: &mut Vec<PendingRequest>) -> Vec<PendingRequest> {
    let (finished, pending): (Vec<_>, Vec<_>) = std::mem::take(requests)
        .into_iter()
        .partition(|request| request.handle.is_finished());
    *requests = pending;
    finished
}

async fn settle(handle: JoinHandle<Result<ApiReply, ApiError>>) -> Result<ApiReply, ApiError> {
    match handle.await {
        Ok(outcome) => outcome,
        Err(err) => Err(ApiError::Task(err.to_string())),
    }
}

#[derive(Debug)]
enum AppCommand {
    None,
    Quit,
}
