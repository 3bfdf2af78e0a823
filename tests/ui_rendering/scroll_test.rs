use anyhow::Result;
use crossterm::event::KeyCode;
use groundchat::cli::test_support::UiHarness;

use crate::common::{new_harness, press, scroll_down, scroll_up, submit_line, timeline_snapshot};

async fn filled_harness(session_id: &str) -> Result<UiHarness> {
    let mut harness = new_harness(session_id, 100, 24)?;
    for _ in 0..3 {
        submit_line(&mut harness, "/help").await?;
    }
    Ok(harness)
}

fn first_timeline_row(harness: &UiHarness) -> Result<String> {
    let timeline = timeline_snapshot(harness)?;
    Ok(timeline.lines().nth(1).unwrap_or_default().to_string())
}

#[tokio::test]
async fn timeline_follows_the_newest_output() -> Result<()> {
    let harness = filled_harness("scroll-bottom").await?;

    assert_eq!(harness.ui_state_view().scroll_from_bottom, 0);
    let timeline = timeline_snapshot(&harness)?;
    let last_row = timeline.lines().rev().nth(1).unwrap_or_default();
    assert!(last_row.contains("Exit GroundChat"), "{timeline}");

    Ok(())
}

#[tokio::test]
async fn mouse_wheel_scroll_only_applies_inside_timeline_region() -> Result<()> {
    let mut harness = filled_harness("scroll-mouse").await?;
    let regions = harness.regions()?;

    scroll_up(&mut harness, regions.input.x + 1, regions.input.y + 1)?;
    assert_eq!(harness.ui_state_view().scroll_from_bottom, 0);

    scroll_up(&mut harness, regions.timeline.x + 1, regions.timeline.y + 1)?;
    let after_up = harness.ui_state_view().scroll_from_bottom;
    assert_eq!(after_up, 3);

    scroll_down(&mut harness, regions.status.x + 1, regions.status.y)?;
    assert_eq!(harness.ui_state_view().scroll_from_bottom, after_up);

    scroll_down(&mut harness, regions.timeline.x + 1, regions.timeline.y + 1)?;
    assert_eq!(harness.ui_state_view().scroll_from_bottom, 0);

    Ok(())
}

#[tokio::test]
async fn scroll_clamps_at_the_top_and_new_input_jumps_back_down() -> Result<()> {
    let mut harness = filled_harness("scroll-clamp").await?;
    let regions = harness.regions()?;

    for _ in 0..40 {
        scroll_up(&mut harness, regions.timeline.x + 1, regions.timeline.y + 1)?;
    }
    let at_top = harness.ui_state_view().scroll_from_bottom;
    assert!(at_top > 0);
    assert!(first_timeline_row(&harness)?.contains("cmd> /help"));

    scroll_up(&mut harness, regions.timeline.x + 1, regions.timeline.y + 1)?;
    assert_eq!(harness.ui_state_view().scroll_from_bottom, at_top);

    submit_line(&mut harness, "/trace").await?;
    assert_eq!(harness.ui_state_view().scroll_from_bottom, 0);
    assert!(timeline_snapshot(&harness)?.contains("Trace file:"));

    Ok(())
}

#[tokio::test]
async fn page_keys_scroll_by_a_screen() -> Result<()> {
    let mut harness = filled_harness("scroll-page").await?;

    press(&mut harness, KeyCode::PageUp).await?;
    let after_page_up = harness.ui_state_view().scroll_from_bottom;
    assert!(after_page_up > 3, "scrolled {after_page_up}");

    press(&mut harness, KeyCode::PageDown).await?;
    assert_eq!(harness.ui_state_view().scroll_from_bottom, 0);

    Ok(())
}
