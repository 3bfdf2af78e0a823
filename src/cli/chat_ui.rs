use crate::chat::{self, ChatSession, ChatSettings};
use crate::cli::commands::{Command, HELP_TEXT, is_command_line, parse_command};
use crate::cli::theme::Theme;
use crate::cli::timeline::{ChatTurnState, OutputKind, Timeline, char_width, wrap_lines};
use crate::config::{ThemeConfig, ThemeToken};
use crate::context::ContextFiles;
use crate::llm::gemini::GeminiProvider;
use crate::trace::SessionTrace;
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;

pub(crate) const MISSING_KEY_MESSAGE: &str = "Assistant unavailable: missing GEMINI_API_KEY. Configure it in your shell or .env file (example: GEMINI_API_KEY=your_key).";

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const INPUT_HEIGHT: u16 = 3;
const DIRECTORY_WIDTH: u16 = 32;
const DIRECTORY_MIN_TOTAL_WIDTH: u16 = 72;
const MOUSE_SCROLL_LINES: usize = 3;

/// Everything a chat session needs that outlives a single frame.
pub struct AppState {
    pub session_id: String,
    pub llm: Option<GeminiProvider>,
    pub model_name: String,
    pub context: ContextFiles,
    pub settings: ChatSettings,
    pub welcome_message: String,
    pub theme_config: ThemeConfig,
    pub color_enabled: bool,
    pub startup_messages: Vec<String>,
    pub trace: SessionTrace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Chat,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiRegions {
    pub directory: Rect,
    pub timeline: Rect,
    pub input: Rect,
    pub status: Rect,
}

/// The directory panel is dropped on narrow terminals.
pub fn layout_regions(area: Rect) -> UiRegions {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(1),
        ])
        .split(area);
    let directory_width = if area.width >= DIRECTORY_MIN_TOTAL_WIDTH {
        DIRECTORY_WIDTH
    } else {
        0
    };
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(directory_width), Constraint::Min(1)])
        .split(rows[0]);

    UiRegions {
        directory: columns[0],
        timeline: columns[1],
        input: rows[1],
        status: rows[2],
    }
}

pub(crate) fn prompt_for(input: &str) -> &'static str {
    if is_command_line(input) {
        "cmd> "
    } else {
        "you> "
    }
}

struct PendingTurn {
    turn_index: usize,
    question: String,
}

pub(crate) struct ChatUi {
    app: AppState,
    session: ChatSession,
    timeline: Timeline,
    theme: Theme,
    input: String,
    focus: Focus,
    search_query: String,
    selected: usize,
    input_history: Vec<String>,
    history_cursor: Option<usize>,
    history_draft: String,
    scroll_from_bottom: usize,
    timeline_area: Rect,
    pending: Option<PendingTurn>,
    should_quit: bool,
}

impl ChatUi {
    pub(crate) fn new(app: AppState) -> Self {
        let theme = Theme::from_config(app.color_enabled, &app.theme_config);
        let timeline = Timeline::new(app.welcome_message.clone());
        let startup_messages = app.startup_messages.clone();

        let mut ui = Self {
            app,
            session: ChatSession::new(),
            timeline,
            theme,
            input: String::new(),
            focus: Focus::Chat,
            search_query: String::new(),
            selected: 0,
            input_history: Vec::new(),
            history_cursor: None,
            history_draft: String::new(),
            scroll_from_bottom: 0,
            timeline_area: Rect::default(),
            pending: None,
            should_quit: false,
        };

        ui.app.trace.log_system(&format!(
            "session {} started (model {})",
            ui.app.session_id, ui.app.model_name
        ));
        if !startup_messages.is_empty() {
            let welcome = ui.app.welcome_message.clone();
            ui.timeline.push_output(OutputKind::SystemInfo, &welcome);
            for message in &startup_messages {
                ui.push_output(OutputKind::SystemError, message);
            }
        }
        ui
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn app(&self) -> &AppState {
        &self.app
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn session(&self) -> &ChatSession {
        &self.session
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn focus(&self) -> Focus {
        self.focus
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn search_query(&self) -> &str {
        &self.search_query
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn selected(&self) -> usize {
        self.selected
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn scroll_from_bottom(&self) -> usize {
        self.scroll_from_bottom
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;

            if self.pending.is_some() {
                self.resolve_pending().await;
                continue;
            }

            if !event::poll(EVENT_POLL_INTERVAL)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) => self.handle_key(key),
                Event::Mouse(mouse) => self.handle_mouse(mouse),
                _ => {}
            }
        }

        Ok(())
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => self.quit(),
                KeyCode::Char('u') => match self.focus {
                    Focus::Chat => self.reset_input(),
                    Focus::Directory => {
                        self.search_query.clear();
                        self.selected = 0;
                    }
                },
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Tab | KeyCode::BackTab => self.toggle_focus(),
            KeyCode::PageUp => self.scroll_up(self.page_size()),
            KeyCode::PageDown => self.scroll_down(self.page_size()),
            _ => match self.focus {
                Focus::Chat => self.handle_chat_key(key),
                Focus::Directory => self.handle_directory_key(key),
            },
        }
    }

    /// Wheel events scroll the timeline only while the pointer is over it.
    pub(crate) fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !contains(self.timeline_area, mouse.column, mouse.row) {
            return;
        }

        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_up(MOUSE_SCROLL_LINES),
            MouseEventKind::ScrollDown => self.scroll_down(MOUSE_SCROLL_LINES),
            _ => {}
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Char(ch) => {
                self.input.push(ch);
                self.history_cursor = None;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Esc => self.reset_input(),
            KeyCode::Up => self.history_prev(),
            KeyCode::Down => self.history_next(),
            _ => {}
        }
    }

    fn handle_directory_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(ch) => {
                self.search_query.push(ch);
                self.selected = 0;
            }
            KeyCode::Backspace => {
                self.search_query.pop();
                self.selected = 0;
            }
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.match_count() {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(question) = self.question_for_match(self.selected) {
                    self.fill_input(question);
                }
            }
            KeyCode::Esc => self.focus = Focus::Chat,
            _ => {}
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Chat => Focus::Directory,
            Focus::Directory => Focus::Chat,
        };
    }

    fn quit(&mut self) {
        self.should_quit = true;
    }

    fn reset_input(&mut self) {
        self.input.clear();
        self.history_cursor = None;
        self.history_draft.clear();
    }

    fn fill_input(&mut self, text: String) {
        self.input = text;
        self.history_cursor = None;
        self.focus = Focus::Chat;
    }

    fn match_count(&self) -> usize {
        self.app.context.directory().search(&self.search_query).len()
    }

    fn question_for_match(&self, index: usize) -> Option<String> {
        self.app
            .context
            .directory()
            .search(&self.search_query)
            .get(index)
            .map(|entry| entry.question())
    }

    fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }

        let index = match self.history_cursor {
            None => {
                self.history_draft = self.input.clone();
                self.input_history.len() - 1
            }
            Some(index) => index.saturating_sub(1),
        };
        self.history_cursor = Some(index);
        self.input = self.input_history[index].clone();
    }

    fn history_next(&mut self) {
        let Some(index) = self.history_cursor else {
            return;
        };

        if index + 1 < self.input_history.len() {
            self.history_cursor = Some(index + 1);
            self.input = self.input_history[index + 1].clone();
        } else {
            self.history_cursor = None;
            self.input = std::mem::take(&mut self.history_draft);
        }
    }

    fn scroll_up(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    fn page_size(&self) -> usize {
        usize::from(self.timeline_area.height)
            .saturating_sub(3)
            .max(1)
    }

    fn submit(&mut self) {
        let line = self.input.trim().to_string();
        self.reset_input();
        if line.is_empty() {
            return;
        }

        if self.input_history.last() != Some(&line) {
            self.input_history.push(line.clone());
        }
        self.scroll_from_bottom = 0;

        if is_command_line(&line) {
            self.run_command_line(&line);
        } else {
            self.start_turn(&line);
        }
    }

    fn push_output(&mut self, kind: OutputKind, text: &str) {
        self.app.trace.log_system(text);
        self.timeline.push_output(kind, text);
    }

    fn run_command_line(&mut self, line: &str) {
        self.app.trace.log_command(line);
        self.timeline.push_command_input(line);

        match parse_command(line) {
            Ok(command) => self.execute(command),
            Err(err) => {
                self.push_output(OutputKind::SystemError, &format!("error: {}", err.message()))
            }
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Help => self.push_output(OutputKind::SystemInfo, HELP_TEXT),
            Command::Clear => {
                self.session.clear();
                self.timeline.clear();
                self.scroll_from_bottom = 0;
                self.app.trace.log_system("conversation cleared");
            }
            Command::History(limit) => {
                let text = self.history_text(limit);
                self.push_output(OutputKind::SystemInfo, &text);
            }
            Command::Trace => {
                let text = format!("Trace file: {}", self.app.trace.file_path().display());
                self.push_output(OutputKind::SystemInfo, &text);
            }
            Command::Find { query } => {
                self.search_query = query;
                self.selected = 0;
                let text = self.find_text();
                self.push_output(OutputKind::SystemInfo, &text);
            }
            Command::Pick(number) => match self.question_for_match(number - 1) {
                Some(question) => {
                    self.push_output(
                        OutputKind::SystemInfo,
                        &format!("Input filled with: {question}"),
                    );
                    self.fill_input(question);
                }
                None => {
                    let shown = self.match_count();
                    self.push_output(
                        OutputKind::SystemError,
                        &format!("error: no directory entry #{number} ({shown} shown)"),
                    );
                }
            },
            Command::Reload => match self.app.context.reload() {
                Ok(()) => {
                    self.selected = 0;
                    let mut lines = vec!["Context files reloaded.".to_string()];
                    lines.extend(self.app.context.summary_lines());
                    lines.extend(self.app.context.warnings());
                    self.push_output(OutputKind::SystemInfo, &lines.join("\n"));
                }
                Err(err) => self.push_output(OutputKind::SystemError, &format!("error: {err}")),
            },
            Command::Files => {
                let text = self.app.context.summary_lines().join("\n");
                self.push_output(OutputKind::SystemInfo, &text);
            }
            Command::Model => {
                let text = self.model_text();
                self.push_output(OutputKind::SystemInfo, &text);
            }
            Command::Quit => self.quit(),
        }
    }

    fn history_text(&self, limit: Option<usize>) -> String {
        let messages = match limit {
            Some(count) => self.session.recent(count),
            None => self.session.messages(),
        };
        if messages.is_empty() {
            return "No messages yet.".to_string();
        }

        messages
            .iter()
            .map(|message| {
                format!(
                    "[{}] {}: {}",
                    message.time_label(),
                    message.role.label(),
                    message.content.lines().next().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn find_text(&self) -> String {
        let matches = self.app.context.directory().search(&self.search_query);
        if matches.is_empty() {
            return format!("No directory entries match '{}'.", self.search_query);
        }

        let mut lines = vec![format!(
            "{} directory entries match '{}':",
            matches.len(),
            self.search_query
        )];
        lines.extend(
            matches
                .iter()
                .enumerate()
                .map(|(index, entry)| format!("  {}. {}", index + 1, entry.name)),
        );
        lines.join("\n")
    }

    fn model_text(&self) -> String {
        let settings = &self.app.settings;
        let temperature = settings
            .temperature
            .map_or_else(|| "default".to_string(), |value| value.to_string());
        let availability = if self.app.llm.is_some() {
            ""
        } else {
            " (no API key)"
        };
        format!(
            "model: {}{availability} | temperature: {temperature} | prompt style: {} | history: {}",
            self.app.model_name,
            settings.prompt_style,
            if settings.send_history { "on" } else { "off" }
        )
    }

    fn start_turn(&mut self, question: &str) {
        self.app.trace.log_chat_input(question);
        let turn_index = self.timeline.push_chat_turn(question);

        if self.app.llm.is_none() {
            self.fail_turn(turn_index, MISSING_KEY_MESSAGE);
            return;
        }

        self.pending = Some(PendingTurn {
            turn_index,
            question: question.to_string(),
        });
    }

    /// Sends the queued question and settles its timeline turn.
    pub(crate) async fn resolve_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let Some(provider) = self.app.llm.as_ref() else {
            self.fail_turn(pending.turn_index, MISSING_KEY_MESSAGE);
            return;
        };

        let result = chat::ask(
            provider,
            &self.app.context,
            &self.app.settings,
            &mut self.session,
            &pending.question,
        )
        .await;

        match result {
            Ok(output) => {
                self.app.trace.log_chat_output(&output.text);
                let answered_at = self.session.messages().last().map(|m| m.time_label());
                if let Some(turn) = self.timeline.chat_turn_mut(pending.turn_index) {
                    turn.state = ChatTurnState::Answered(output.text);
                    turn.token_usage = output.usage;
                    turn.answered_at = answered_at;
                }
            }
            Err(err) => {
                self.fail_turn(
                    pending.turn_index,
                    &format!("Assistant request failed: {err}"),
                );
            }
        }
    }

    /// The trace keeps the full message; the timeline gets it on one line.
    fn fail_turn(&mut self, turn_index: usize, message: &str) {
        self.app.trace.log_chat_error(message);
        if let Some(turn) = self.timeline.chat_turn_mut(turn_index) {
            turn.state = ChatTurnState::Failed(single_line(message));
        }
    }

    pub(crate) fn draw(&mut self, frame: &mut Frame) {
        let regions = layout_regions(frame.area());
        self.draw_timeline(frame, regions.timeline);
        self.draw_input(frame, regions.input);
        self.draw_directory(frame, regions.directory);
        self.draw_status(frame, regions.status);
    }

    fn draw_timeline(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(" Chat ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let height = usize::from(inner.height);
        let lines = wrap_lines(
            self.timeline.render_lines(&self.theme),
            usize::from(inner.width),
        );
        let max_scroll = lines.len().saturating_sub(height);
        self.scroll_from_bottom = self.scroll_from_bottom.min(max_scroll);
        self.timeline_area = area;

        let end = lines.len() - self.scroll_from_bottom;
        let start = end.saturating_sub(height);
        let visible: Vec<Line<'static>> = lines.into_iter().take(end).skip(start).collect();
        frame.render_widget(Paragraph::new(visible), inner);
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Message ")
            .style(self.theme.style(ThemeToken::InputBlock));
        let inner = block.inner(area);

        let prompt = prompt_for(&self.input);
        let prompt_token = if is_command_line(&self.input) {
            ThemeToken::CommandPrompt
        } else {
            ThemeToken::UserPrompt
        };
        let available = usize::from(inner.width).saturating_sub(prompt.len() + 1);
        let visible = tail_fitting(&self.input, available);
        let cursor_offset = prompt.len() + text_width(&visible);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(prompt, self.theme.style(prompt_token)),
                Span::styled(visible, self.theme.style(ThemeToken::UserInput)),
            ]))
            .block(block),
            area,
        );

        if self.focus == Focus::Chat && inner.width > 0 && inner.height > 0 {
            frame.set_cursor_position((offset_x(inner, cursor_offset), inner.y));
        }
    }

    fn draw_directory(&mut self, frame: &mut Frame, area: Rect) {
        if area.width == 0 {
            return;
        }

        let focused = self.focus == Focus::Directory;
        let title_token = if focused {
            ThemeToken::DirectoryTitle
        } else {
            ThemeToken::Status
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" Directory ", self.theme.style(title_token)));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        let search_prefix = "find: ";
        let available = usize::from(inner.width).saturating_sub(search_prefix.len() + 1);
        let query = tail_fitting(&self.search_query, available);
        let cursor_offset = search_prefix.len() + text_width(&query);
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(search_prefix, self.theme.style(title_token)),
                Span::styled(query, self.theme.style(ThemeToken::UserInput)),
            ])),
            rows[0],
        );
        if focused {
            frame.set_cursor_position((offset_x(inner, cursor_offset), inner.y));
        }

        let directory = self.app.context.directory();
        let matches = directory.search(&self.search_query);
        if self.selected >= matches.len() {
            self.selected = matches.len().saturating_sub(1);
        }

        let mut lines = Vec::new();
        let mut selected_line = 0;
        if matches.is_empty() {
            let text = if directory.is_empty() {
                "No directory entries loaded."
            } else {
                "No matches."
            };
            lines.push(Line::from(Span::styled(
                text,
                self.theme.style(ThemeToken::DirectoryDetail),
            )));
        }
        for (index, entry) in matches.iter().enumerate() {
            let is_selected = index == self.selected;
            if is_selected {
                selected_line = lines.len();
            }
            let (marker, token) = match (is_selected, focused) {
                (true, true) => ("> ", ThemeToken::DirectorySelected),
                (true, false) => ("> ", ThemeToken::DirectoryEntry),
                (false, _) => ("  ", ThemeToken::DirectoryEntry),
            };
            lines.push(Line::from(Span::styled(
                format!("{marker}{}. {}", index + 1, entry.name),
                self.theme.style(token),
            )));
            for detail in &entry.details {
                lines.push(Line::from(Span::styled(
                    format!("     {detail}"),
                    self.theme.style(ThemeToken::DirectoryDetail),
                )));
            }
        }

        let list_height = usize::from(rows[1].height);
        let offset = (selected_line + 1).saturating_sub(list_height);
        frame.render_widget(
            Paragraph::new(lines).scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0)),
            rows[1],
        );
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let focus = match self.focus {
            Focus::Chat => "chat",
            Focus::Directory => "directory",
        };
        let mut text = format!(
            "GroundChat | Session: {} | Model: {} | Focus: {focus} (TAB)",
            self.app.session_id, self.app.model_name
        );
        if self.pending.is_some() {
            text.push_str(" | waiting for answer");
        }

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                text,
                self.theme.style(ThemeToken::Status),
            ))),
            area,
        );
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// The longest suffix of `text` that fits in `width` cells.
fn tail_fitting(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut start = text.len();
    for (index, ch) in text.char_indices().rev() {
        let ch_width = char_width(ch);
        if used + ch_width > width {
            break;
        }
        used += ch_width;
        start = index;
    }
    text[start..].to_string()
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
}

fn offset_x(area: Rect, offset: usize) -> u16 {
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);
    area.x
        .saturating_add(offset)
        .min(area.right().saturating_sub(1))
}

/// Raw mode, alternate screen and mouse capture for as long as the guard lives.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }

        match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(err) => {
                restore_terminal();
                Err(err.into())
            }
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
        let _ = self.terminal.show_cursor();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

pub async fn run_chat_ui(app: AppState) -> Result<()> {
    let mut ui = ChatUi::new(app);
    let result = {
        let mut guard = TerminalGuard::enter()?;
        ui.run(&mut guard.terminal).await
    };

    match &result {
        Ok(()) => ui.app.trace.log_system("session ended"),
        Err(err) => ui.app.trace.log_system(&format!("session ended with error: {err}")),
    }
    result
}
