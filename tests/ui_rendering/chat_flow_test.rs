use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use groundchat::cli::UiRegions;
use groundchat::cli::test_support::{
    SAMPLE_INSTRUCTIONS, UiHarness, app_state_with_gemini,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    GENERATE_PATH, input_snapshot, mount_answer, new_harness, new_harness_with_server,
    press_ctrl, press_down, press_up, read_trace, status_snapshot, submit_line,
    timeline_snapshot, type_text,
};

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("recorded requests")
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("json body"))
        .collect()
}

#[tokio::test]
async fn startup_renders_welcome_status_and_prompt() -> Result<()> {
    let harness = new_harness("ui-welcome", 100, 24)?;

    let timeline = timeline_snapshot(&harness)?;
    let first_row = timeline.lines().nth(1).unwrap_or_default();
    assert!(first_row.contains("Welcome to GroundChat."), "{timeline}");

    let status = status_snapshot(&harness)?;
    assert!(
        status.contains("GroundChat | Session: ui-welcome | Model: gemini-test | Focus: chat (TAB)"),
        "{status}"
    );
    assert!(input_snapshot(&harness)?.contains("you>"));

    Ok(())
}

#[tokio::test]
async fn question_without_api_key_shows_unavailable_and_keeps_session_empty() -> Result<()> {
    let mut harness = new_harness("ui-no-key", 100, 24)?;

    submit_line(&mut harness, "Where is the library?").await?;

    let timeline = timeline_snapshot(&harness)?;
    assert!(timeline.contains("you> Where is the library?"), "{timeline}");
    assert!(
        timeline.contains("Assistant unavailable: missing GEMINI_API_KEY"),
        "{timeline}"
    );
    assert_eq!(harness.ui_state_view().session_messages, 0);
    assert_eq!(harness.ui_state_view().input, "");

    let trace = read_trace(&harness)?;
    assert!(trace.contains("[chat.in    ] Where is the library?"));
    assert!(trace.contains("[chat.err   ] Assistant unavailable: missing GEMINI_API_KEY"));

    Ok(())
}

#[tokio::test]
async fn answered_question_shows_thinking_then_answer_and_usage() -> Result<()> {
    let server = MockServer::start().await;
    mount_answer(&server, "The library is in Building 6.").await;
    let mut harness = new_harness_with_server("ui-answer", &server, 100, 24)?;

    type_text(&mut harness, "Where is the library?").await?;
    harness.press_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))?;

    let waiting = timeline_snapshot(&harness)?;
    assert!(waiting.contains("you> Where is the library?"), "{waiting}");
    assert!(waiting.contains("Thinking..."), "{waiting}");
    assert!(status_snapshot(&harness)?.contains("waiting for answer"));

    harness.resolve_pending().await?;

    let answered = timeline_snapshot(&harness)?;
    assert!(answered.contains("The library is in Building 6."), "{answered}");
    assert!(answered.contains("UTC] tokens: 42"), "{answered}");
    assert!(!answered.contains("Thinking..."), "{answered}");
    assert!(!status_snapshot(&harness)?.contains("waiting for answer"));
    assert_eq!(harness.ui_state_view().session_messages, 2);

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    let prompt = bodies[0]["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert!(prompt.contains("# Material"));
    assert!(prompt.contains("Central Library"));
    assert!(prompt.ends_with("Where is the library?\n"));
    assert_eq!(
        bodies[0]["systemInstruction"]["parts"][0]["text"],
        json!(SAMPLE_INSTRUCTIONS)
    );
    assert_eq!(bodies[0]["generationConfig"]["temperature"], json!(0.0));

    let trace = read_trace(&harness)?;
    assert!(trace.contains("[chat.out   ] The library is in Building 6."));
    assert!(trace.contains("[http.req   ] POST "));
    assert!(trace.contains("[http.res   ] HTTP 200"));

    Ok(())
}

#[tokio::test]
async fn failed_request_reports_error_and_next_question_still_works() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("first question"))
        .respond_with(ResponseTemplate::new(500).set_body_string("provider down"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("second question"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Recovered answer"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let mut harness = new_harness_with_server("ui-recovery", &server, 100, 24)?;

    submit_line(&mut harness, "first question").await?;
    let timeline = timeline_snapshot(&harness)?;
    assert!(
        timeline.contains("Assistant request failed: provider request failed"),
        "{timeline}"
    );
    assert_eq!(harness.ui_state_view().session_messages, 1);

    submit_line(&mut harness, "second question").await?;
    let timeline = timeline_snapshot(&harness)?;
    assert!(timeline.contains("Recovered answer"), "{timeline}");
    assert_eq!(harness.ui_state_view().session_messages, 3);

    let trace = read_trace(&harness)?;
    assert!(trace.contains("[chat.err   ] Assistant request failed: provider request failed with status 500: provider down"));

    Ok(())
}

#[tokio::test]
async fn multi_line_error_body_renders_as_one_timeline_row() -> Result<()> {
    let server = MockServer::start().await;
    let body = serde_json::to_string_pretty(&json!({
        "error": {
            "code": 400,
            "message": "API key not valid.",
            "status": "INVALID_ARGUMENT"
        }
    }))?;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string(body))
        .mount(&server)
        .await;
    let mut harness = new_harness_with_server("ui-multiline-error", &server, 220, 24)?;

    submit_line(&mut harness, "hello").await?;

    let timeline = timeline_snapshot(&harness)?;
    let rows: Vec<&str> = timeline.lines().collect();
    let question_row = rows
        .iter()
        .position(|row| row.contains("you> hello"))
        .expect("question row");
    assert!(
        rows[question_row + 1].contains(
            "Assistant request failed: provider request failed with status 400: { \"error\": { \"code\": 400,"
        ),
        "{timeline}"
    );
    let after_error = rows[question_row + 2].trim_matches(|ch: char| ch == '│' || ch.is_whitespace());
    assert!(after_error.is_empty(), "{timeline}");
    assert!(!timeline.contains("\"code\": 400,\n"), "{timeline}");

    let trace = read_trace(&harness)?;
    let error_lines = trace
        .lines()
        .filter(|line| line.contains("[chat.err   ]"))
        .count();
    assert!(error_lines > 1, "{trace}");
    assert!(trace.contains("\"message\": \"API key not valid.\","), "{trace}");

    Ok(())
}

#[tokio::test]
async fn history_setting_replays_earlier_turns_as_raw_text() -> Result<()> {
    let server = MockServer::start().await;
    mount_answer(&server, "Building 6.").await;
    let mut state = app_state_with_gemini("ui-history-on", &server.uri())?;
    state.settings.send_history = true;
    let mut harness = UiHarness::new(100, 24, state)?;

    submit_line(&mut harness, "Where is the library?").await?;
    submit_line(&mut harness, "Which floors?").await?;

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    let contents = bodies[1]["contents"].as_array().expect("contents");
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], json!("user"));
    assert_eq!(
        contents[0]["parts"][0]["text"],
        json!("Where is the library?")
    );
    assert_eq!(contents[1]["role"], json!("model"));
    assert_eq!(contents[1]["parts"][0]["text"], json!("Building 6."));
    let latest = contents[2]["parts"][0]["text"].as_str().expect("latest");
    assert!(latest.contains("# Material"));
    assert!(latest.ends_with("Which floors?\n"));

    Ok(())
}

#[tokio::test]
async fn up_down_recall_input_history_and_restore_draft() -> Result<()> {
    let mut harness = new_harness("ui-input-history", 100, 24)?;

    submit_line(&mut harness, "/help").await?;
    submit_line(&mut harness, "/files").await?;
    type_text(&mut harness, "dra").await?;

    press_up(&mut harness).await?;
    assert_eq!(harness.ui_state_view().input, "/files");
    assert_eq!(harness.ui_state_view().prompt, "cmd> ");
    press_up(&mut harness).await?;
    assert_eq!(harness.ui_state_view().input, "/help");
    press_up(&mut harness).await?;
    assert_eq!(harness.ui_state_view().input, "/help");
    press_down(&mut harness).await?;
    assert_eq!(harness.ui_state_view().input, "/files");
    press_down(&mut harness).await?;
    assert_eq!(harness.ui_state_view().input, "dra");
    assert_eq!(harness.ui_state_view().prompt, "you> ");

    Ok(())
}

#[tokio::test]
async fn ctrl_u_clears_input_and_ctrl_c_quits() -> Result<()> {
    let mut harness = new_harness("ui-ctrl-keys", 100, 24)?;

    type_text(&mut harness, "half a question").await?;
    assert!(input_snapshot(&harness)?.contains("you> half a question"));
    press_ctrl(&mut harness, 'u').await?;
    assert_eq!(harness.ui_state_view().input, "");
    assert!(!harness.ui_state_view().should_quit);

    press_ctrl(&mut harness, 'c').await?;
    assert!(harness.ui_state_view().should_quit);

    Ok(())
}

#[tokio::test]
async fn narrow_terminal_drops_directory_panel() -> Result<()> {
    let harness = new_harness("ui-narrow", 60, 20)?;

    let regions: UiRegions = harness.regions()?;
    assert_eq!(regions.directory.width, 0);
    assert_eq!(regions.timeline.width, 60);
    assert!(timeline_snapshot(&harness)?.contains("Welcome to GroundChat."));

    Ok(())
}
