use anyhow::Result;
use crossterm::event::KeyCode;
use groundchat::cli::Focus;

use crate::common::{
    directory_snapshot, new_harness, press, press_down, press_enter, press_tab, press_up,
    status_snapshot, submit_line, timeline_snapshot, type_text,
};

#[tokio::test]
async fn directory_panel_lists_entries_from_knowledge() -> Result<()> {
    let harness = new_harness("dir-list", 100, 24)?;

    let panel = directory_snapshot(&harness)?;
    assert!(panel.contains("Directory"), "{panel}");
    assert!(panel.contains("find:"), "{panel}");
    assert!(panel.contains("> 1. Central Library"), "{panel}");
    assert!(panel.contains("Building 6, floors 2 to"), "{panel}");
    assert!(panel.contains("  2. Student Lounge"), "{panel}");
    assert!(panel.contains("  3. Career Center"), "{panel}");
    assert!(!panel.contains("Campus facilities"), "{panel}");

    Ok(())
}

#[tokio::test]
async fn tab_moves_typing_into_the_search_box() -> Result<()> {
    let mut harness = new_harness("dir-search", 100, 24)?;

    press_tab(&mut harness).await?;
    assert_eq!(harness.ui_state_view().focus, Focus::Directory);
    assert!(status_snapshot(&harness)?.contains("Focus: directory (TAB)"));

    type_text(&mut harness, "vending").await?;
    let view = harness.ui_state_view();
    assert_eq!(view.search_query, "vending");
    assert_eq!(view.input, "");

    let panel = directory_snapshot(&harness)?;
    assert!(panel.contains("find: vending"), "{panel}");
    assert!(panel.contains("1. Student Lounge"), "{panel}");
    assert!(!panel.contains("Central Library"), "{panel}");

    type_text(&mut harness, "zzz").await?;
    assert!(directory_snapshot(&harness)?.contains("No matches."));

    for _ in 0.."zzz".len() {
        press(&mut harness, KeyCode::Backspace).await?;
    }
    assert_eq!(harness.ui_state_view().search_query, "vending");

    press_tab(&mut harness).await?;
    assert_eq!(harness.ui_state_view().focus, Focus::Chat);

    Ok(())
}

#[tokio::test]
async fn enter_on_selected_entry_prefills_the_question() -> Result<()> {
    let mut harness = new_harness("dir-pick-key", 100, 24)?;

    press_tab(&mut harness).await?;
    press_down(&mut harness).await?;
    press_down(&mut harness).await?;
    press_down(&mut harness).await?;
    assert_eq!(harness.ui_state_view().selected, 2);
    press_up(&mut harness).await?;
    assert_eq!(harness.ui_state_view().selected, 1);
    assert!(directory_snapshot(&harness)?.contains("> 2. Student Lounge"));

    press_enter(&mut harness).await?;

    let view = harness.ui_state_view();
    assert_eq!(view.focus, Focus::Chat);
    assert_eq!(view.input, "Tell me about \"Student Lounge\".");
    assert_eq!(view.session_messages, 0);

    Ok(())
}

#[tokio::test]
async fn find_and_pick_commands_drive_the_directory() -> Result<()> {
    let mut harness = new_harness("dir-find-pick", 100, 24)?;

    submit_line(&mut harness, "/find career").await?;

    assert_eq!(harness.ui_state_view().search_query, "career");
    let timeline = timeline_snapshot(&harness)?;
    assert!(
        timeline.contains("1 directory entries match 'career':"),
        "{timeline}"
    );
    assert!(timeline.contains("  1. Career Center"), "{timeline}");
    let panel = directory_snapshot(&harness)?;
    assert!(panel.contains("1. Career Center"), "{panel}");
    assert!(!panel.contains("Student Lounge"), "{panel}");

    submit_line(&mut harness, "/pick 5").await?;
    assert!(
        timeline_snapshot(&harness)?.contains("error: no directory entry #5 (1 shown)")
    );

    submit_line(&mut harness, "/pick 1").await?;
    assert_eq!(
        harness.ui_state_view().input,
        "Tell me about \"Career Center\"."
    );

    submit_line(&mut harness, "/find pool").await?;
    assert!(
        timeline_snapshot(&harness)?.contains("No directory entries match 'pool'.")
    );

    Ok(())
}
