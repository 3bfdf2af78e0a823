mod args;
mod chat_ui;
mod commands;
pub(crate) mod theme;
mod timeline;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use args::CliArgs;
pub(crate) use chat_ui::MISSING_KEY_MESSAGE;
pub use chat_ui::{AppState, Focus, UiRegions, layout_regions, run_chat_ui};
