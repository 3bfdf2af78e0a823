//! Drives the chat screen against ratatui's `TestBackend` so integration tests
//! can assert on rendered text without a real terminal.

use super::chat_ui::{AppState, ChatUi, Focus, UiRegions, layout_regions, prompt_for};
use crate::chat::ChatSettings;
use crate::config::{DEFAULT_WELCOME_MESSAGE, ThemeConfig};
use crate::context::ContextFiles;
use crate::http::{DebugSink, HttpClient, HttpDebugConfig};
use crate::llm::gemini::GeminiProvider;
use crate::trace::SessionTrace;
use anyhow::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use std::path::PathBuf;

pub const SAMPLE_INSTRUCTIONS: &str =
    "You are the campus reception desk. Answer briefly and politely.";

pub const SAMPLE_KNOWLEDGE: &str = "# Campus facilities

Central Library
Building 6, floors 2 to 11
Open 8:30 to 22:00 on weekdays

Student Lounge
Building 3, 1F
Microwaves and vending machines

Career Center
Building 1, 2F
Internship and job-hunting advice
";

pub const TEST_MODEL: &str = "gemini-test";

pub struct UiHarness {
    ui: ChatUi,
    terminal: Terminal<TestBackend>,
}

/// Snapshot of the interactive state that is not visible in the rendered buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiStateView {
    pub prompt: &'static str,
    pub input: String,
    pub focus: Focus,
    pub search_query: String,
    pub selected: usize,
    pub session_messages: usize,
    pub scroll_from_bottom: usize,
    pub should_quit: bool,
}

impl UiHarness {
    pub fn new(width: u16, height: u16, state: AppState) -> Result<Self> {
        let terminal = Terminal::new(TestBackend::new(width, height))?;
        Ok(Self {
            ui: ChatUi::new(state),
            terminal,
        })
    }

    pub fn render(&mut self) -> Result<()> {
        self.terminal.draw(|frame| self.ui.draw(frame))?;
        Ok(())
    }

    /// Handles `key` and, if it queued a question, waits for the answer before rendering.
    pub async fn send_key(&mut self, key: KeyEvent) -> Result<()> {
        self.press_key(key)?;
        if self.ui.has_pending() {
            self.resolve_pending().await?;
        }
        Ok(())
    }

    /// Handles `key` and renders, leaving any queued question unanswered.
    pub fn press_key(&mut self, key: KeyEvent) -> Result<()> {
        self.ui.handle_key(key);
        self.render()
    }

    pub async fn resolve_pending(&mut self) -> Result<()> {
        self.ui.resolve_pending().await;
        self.render()
    }

    pub fn send_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        self.ui.handle_mouse(mouse);
        self.render()
    }

    pub fn buffer_lines(&self) -> Vec<String> {
        let buffer = self.terminal.backend().buffer();
        let width = usize::from(buffer.area.width).max(1);
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    pub fn regions(&self) -> Result<UiRegions> {
        Ok(layout_regions(self.terminal.backend().buffer().area))
    }

    pub fn ui_state_view(&self) -> UiStateView {
        UiStateView {
            prompt: prompt_for(self.ui.input()),
            input: self.ui.input().to_string(),
            focus: self.ui.focus(),
            search_query: self.ui.search_query().to_string(),
            selected: self.ui.selected(),
            session_messages: self.ui.session().len(),
            scroll_from_bottom: self.ui.scroll_from_bottom(),
            should_quit: self.ui.should_quit(),
        }
    }

    pub fn trace_path(&self) -> PathBuf {
        self.ui.app().trace.file_path().to_path_buf()
    }
}

/// App state with inline context, no provider, colors off, and a trace under the temp dir.
pub fn deterministic_app_state(session_id: &str) -> Result<AppState> {
    let trace_dir = std::env::temp_dir().join("groundchat-ui-tests");
    let trace = SessionTrace::create_in_dir(session_id, &trace_dir)?;

    Ok(AppState {
        session_id: session_id.to_string(),
        llm: None,
        model_name: TEST_MODEL.to_string(),
        context: ContextFiles::from_text(SAMPLE_INSTRUCTIONS, SAMPLE_KNOWLEDGE),
        settings: ChatSettings::default(),
        welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
        theme_config: ThemeConfig::default(),
        color_enabled: false,
        startup_messages: Vec::new(),
        trace,
    })
}

/// Like [`deterministic_app_state`], with a Gemini provider pointed at `base_url`.
pub fn app_state_with_gemini(session_id: &str, base_url: &str) -> Result<AppState> {
    let mut state = deterministic_app_state(session_id)?;
    let http = HttpClient::new(reqwest::Client::new(), HttpDebugConfig::disabled())
        .with_trace(state.trace.clone())
        .with_debug_sink(DebugSink::Trace);
    state.llm = Some(GeminiProvider::new(
        http,
        Some("test-key".to_string()),
        TEST_MODEL.to_string(),
        base_url.to_string(),
    )?);
    Ok(state)
}
