use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use groundchat::cli::test_support::{UiHarness, app_state_with_gemini, deterministic_app_state};
use ratatui::layout::Rect;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

pub fn new_harness(session_id: &str, width: u16, height: u16) -> Result<UiHarness> {
    let state = deterministic_app_state(session_id)?;
    let mut harness = UiHarness::new(width, height, state)?;
    harness.render()?;
    Ok(harness)
}

pub fn new_harness_with_server(
    session_id: &str,
    server: &MockServer,
    width: u16,
    height: u16,
) -> Result<UiHarness> {
    let state = app_state_with_gemini(session_id, &server.uri())?;
    let mut harness = UiHarness::new(width, height, state)?;
    harness.render()?;
    Ok(harness)
}

pub async fn mount_answer(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}],
            "usageMetadata": {
                "promptTokenCount": 40,
                "candidatesTokenCount": 2,
                "totalTokenCount": 42
            }
        })))
        .mount(server)
        .await;
}

pub async fn type_text(harness: &mut UiHarness, text: &str) -> Result<()> {
    for ch in text.chars() {
        harness
            .send_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE))
            .await?;
    }
    Ok(())
}

pub async fn submit_line(harness: &mut UiHarness, line: &str) -> Result<()> {
    type_text(harness, line).await?;
    press_enter(harness).await
}

pub async fn press(harness: &mut UiHarness, code: KeyCode) -> Result<()> {
    harness
        .send_key(KeyEvent::new(code, KeyModifiers::NONE))
        .await
}

pub async fn press_tab(harness: &mut UiHarness) -> Result<()> {
    press(harness, KeyCode::Tab).await
}

pub async fn press_enter(harness: &mut UiHarness) -> Result<()> {
    press(harness, KeyCode::Enter).await
}

pub async fn press_up(harness: &mut UiHarness) -> Result<()> {
    press(harness, KeyCode::Up).await
}

pub async fn press_down(harness: &mut UiHarness) -> Result<()> {
    press(harness, KeyCode::Down).await
}

pub async fn press_ctrl(harness: &mut UiHarness, ch: char) -> Result<()> {
    harness
        .send_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
        .await
}

pub fn scroll_up(harness: &mut UiHarness, column: u16, row: u16) -> Result<()> {
    harness.send_mouse(MouseEvent {
        kind: MouseEventKind::ScrollUp,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    })
}

pub fn scroll_down(harness: &mut UiHarness, column: u16, row: u16) -> Result<()> {
    harness.send_mouse(MouseEvent {
        kind: MouseEventKind::ScrollDown,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    })
}

pub fn normalized_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn region_text(harness: &UiHarness, area: Rect) -> String {
    let lines = harness.buffer_lines();
    let start_row = usize::from(area.y);
    let end_row = start_row.saturating_add(usize::from(area.height));

    let mut rendered = Vec::new();
    for line in lines.iter().take(end_row.min(lines.len())).skip(start_row) {
        let clipped = line
            .chars()
            .skip(usize::from(area.x))
            .take(usize::from(area.width))
            .collect::<String>();
        rendered.push(clipped);
    }

    normalized_text(&rendered.join("\n"))
}

pub fn timeline_snapshot(harness: &UiHarness) -> Result<String> {
    let regions = harness.regions()?;
    Ok(region_text(harness, regions.timeline))
}

pub fn directory_snapshot(harness: &UiHarness) -> Result<String> {
    let regions = harness.regions()?;
    Ok(region_text(harness, regions.directory))
}

pub fn input_snapshot(harness: &UiHarness) -> Result<String> {
    let regions = harness.regions()?;
    Ok(region_text(harness, regions.input))
}

pub fn status_snapshot(harness: &UiHarness) -> Result<String> {
    let regions = harness.regions()?;
    Ok(region_text(harness, regions.status))
}

pub fn read_trace(harness: &UiHarness) -> Result<String> {
    Ok(std::fs::read_to_string(harness.trace_path())?)
}
