use crate::config::validate_temperature;
use crate::prompt::PromptStyle;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone, PartialEq)]
#[command(name = "groundchat")]
#[command(
    about = "Terminal chat that answers from a local knowledge file",
    long_about = "Terminal chat that answers from a local knowledge file\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default probe path when --config is not provided:\n    1. $XDG_CONFIG_HOME/groundchat/config.toml\n    2. ~/.config/groundchat/config.toml\n\nFlags override environment variables, which override the config file."
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// System instruction file.
    #[arg(long, value_name = "PATH")]
    pub instructions: Option<PathBuf>,

    /// Knowledge file inserted into every prompt.
    #[arg(long, value_name = "PATH")]
    pub knowledge: Option<PathBuf>,

    /// Gemini model name.
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Sampling temperature (0.0 to 2.0).
    #[arg(long, value_name = "T", value_parser = parse_temperature)]
    pub temperature: Option<f32>,

    /// How the knowledge reaches the model: structured, reference or system.
    #[arg(long, value_name = "STYLE")]
    pub prompt_style: Option<PromptStyle>,

    /// Replay the whole conversation to the model on every turn.
    #[arg(long)]
    pub history: bool,

    /// Log redacted HTTP request/response details.
    #[arg(long, short)]
    pub verbose: bool,

    /// Ask one question, print the answer and exit.
    #[arg(long, value_name = "QUESTION")]
    pub ask: Option<String>,

    /// Disable colors in the terminal UI.
    #[arg(long)]
    pub no_color: bool,
}

fn parse_temperature(raw: &str) -> Result<f32, String> {
    let value = raw
        .trim()
        .parse::<f32>()
        .map_err(|err| format!("invalid temperature '{raw}': {err}"))?;
    validate_temperature(value)
}
