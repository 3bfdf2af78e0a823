use crate::prompt::PromptStyle;
use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_INSTRUCTIONS_FILE: &str = "instructions.txt";
pub const DEFAULT_KNOWLEDGE_FILE: &str = "campus_data.txt";
pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to GroundChat. Ask a question about the loaded knowledge. TAB switches to the directory search.";

const CONFIG_DIR_NAME: &str = "groundchat";
const CONFIG_FILE_NAME: &str = "config.toml";
const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub context: ContextConfig,
    pub theme: ThemeConfig,
}

/// Where the instruction and knowledge documents live and how they reach the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    pub instructions_file: PathBuf,
    pub knowledge_file: PathBuf,
    pub prompt_style: PromptStyle,
    pub send_history: bool,
    pub welcome_message: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            instructions_file: PathBuf::from(DEFAULT_INSTRUCTIONS_FILE),
            knowledge_file: PathBuf::from(DEFAULT_KNOWLEDGE_FILE),
            prompt_style: PromptStyle::default(),
            send_history: false,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeConfig {
    pub preset: ThemePreset,
    pub styles: HashMap<ThemeToken, StyleOverride>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            preset: ThemePreset::Default,
            styles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemePreset {
    Default,
    Light,
    HighContrast,
}

impl FromStr for ThemePreset {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "default" => Ok(Self::Default),
            "light" => Ok(Self::Light),
            "high-contrast" => Ok(Self::HighContrast),
            _ => Err(format!("unknown preset '{value}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeToken {
    UserPrompt,
    UserInput,
    CommandPrompt,
    AssistantText,
    AssistantWaiting,
    AssistantMeta,
    SystemInfo,
    SystemError,
    Status,
    InputBlock,
    DirectoryTitle,
    DirectoryEntry,
    DirectoryDetail,
    DirectorySelected,
}

impl ThemeToken {
    pub fn all() -> &'static [ThemeToken] {
        &[
            Self::UserPrompt,
            Self::UserInput,
            Self::CommandPrompt,
            Self::AssistantText,
            Self::AssistantWaiting,
            Self::AssistantMeta,
            Self::SystemInfo,
            Self::SystemError,
            Self::Status,
            Self::InputBlock,
            Self::DirectoryTitle,
            Self::DirectoryEntry,
            Self::DirectoryDetail,
            Self::DirectorySelected,
        ]
    }
}

impl FromStr for ThemeToken {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "user_prompt" => Ok(Self::UserPrompt),
            "user_input" => Ok(Self::UserInput),
            "command_prompt" => Ok(Self::CommandPrompt),
            "assistant_text" => Ok(Self::AssistantText),
            "assistant_waiting" => Ok(Self::AssistantWaiting),
            "assistant_meta" => Ok(Self::AssistantMeta),
            "system_info" => Ok(Self::SystemInfo),
            "system_error" => Ok(Self::SystemError),
            "status" => Ok(Self::Status),
            "input_block" => Ok(Self::InputBlock),
            "directory_title" => Ok(Self::DirectoryTitle),
            "directory_entry" => Ok(Self::DirectoryEntry),
            "directory_detail" => Ok(Self::DirectoryDetail),
            "directory_selected" => Ok(Self::DirectorySelected),
            _ => Err(format!("unknown token '{value}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOverride {
    pub fg: Option<HexColor>,
    pub bg: Option<HexColor>,
    pub modifiers: Option<Vec<ThemeModifier>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FromStr for HexColor {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        const EXPECTED: &str = "invalid hex color, expected #RRGGBB";
        let digits = value
            .strip_prefix('#')
            .filter(|rest| rest.len() == 6 && rest.is_ascii())
            .ok_or_else(|| EXPECTED.to_string())?;

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| EXPECTED.to_string())
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeModifier {
    Bold,
    Dim,
    Italic,
    Underlined,
    Reversed,
    CrossedOut,
}

impl FromStr for ThemeModifier {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "bold" => Ok(Self::Bold),
            "dim" => Ok(Self::Dim),
            "italic" => Ok(Self::Italic),
            "underlined" => Ok(Self::Underlined),
            "reversed" => Ok(Self::Reversed),
            "crossed_out" => Ok(Self::CrossedOut),
            _ => Err(format!("unknown modifier '{value}'")),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    gemini_base_url: Option<String>,
    temperature: Option<f32>,
    request_timeout_secs: Option<u64>,
    context: Option<RawContextConfig>,
    theme: Option<RawThemeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawContextConfig {
    instructions_file: Option<PathBuf>,
    knowledge_file: Option<PathBuf>,
    prompt_style: Option<String>,
    send_history: Option<bool>,
    welcome_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThemeConfig {
    name: Option<String>,
    styles: Option<HashMap<String, RawStyleOverride>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStyleOverride {
    fg: Option<String>,
    bg: Option<String>,
    modifiers: Option<Vec<String>>,
}

impl AppConfig {
    /// Resolution order per key: environment (after `.env`), then config file, then default.
    pub fn load_with_path(explicit_path: Option<&Path>) -> Result<Self> {
        let (config_path, config_is_explicit) = match explicit_path {
            Some(path) => (path.to_path_buf(), true),
            None => (discover_config_path()?, false),
        };

        if config_is_explicit && !config_path.is_file() {
            bail!(
                "Failed to load config {}: file not found",
                config_path.display()
            );
        }

        let file_config = load_file_config(&config_path)?;
        dotenvy::dotenv().ok();

        let file_api_key = file_config
            .as_ref()
            .and_then(|cfg| cfg.gemini_api_key.as_deref())
            .and_then(non_empty);
        let file_model = file_config
            .as_ref()
            .and_then(|cfg| cfg.gemini_model.as_deref())
            .and_then(non_empty);
        let file_base_url = file_config
            .as_ref()
            .and_then(|cfg| cfg.gemini_base_url.as_deref())
            .and_then(non_empty);

        let temperature = match env_non_empty("GEMINI_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .map_err(|err| err.to_string())
                .and_then(validate_temperature)
                .map_err(|reason| {
                    anyhow!("Failed to load config: GEMINI_TEMPERATURE: {reason}")
                })?,
            None => {
                let temperature = file_config
                    .as_ref()
                    .and_then(|cfg| cfg.temperature)
                    .unwrap_or(DEFAULT_TEMPERATURE);
                validate_temperature(temperature)
                    .map_err(|reason| config_error(&config_path, "temperature", &reason))?
            }
        };

        let request_timeout_secs = file_config
            .as_ref()
            .and_then(|cfg| cfg.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(config_error(
                &config_path,
                "request_timeout_secs",
                "must be >= 1",
            ));
        }

        let context = validate_context(
            file_config.as_ref().and_then(|cfg| cfg.context.as_ref()),
            &config_path,
        )?;
        let theme = validate_theme(
            file_config.as_ref().and_then(|cfg| cfg.theme.as_ref()),
            &config_path,
        )?;

        Ok(Self {
            config_path,
            gemini_api_key: env_non_empty("GEMINI_API_KEY")
                .or_else(|| env_non_empty("GOOGLE_API_KEY"))
                .or(file_api_key),
            gemini_model: env_non_empty("GEMINI_MODEL")
                .or(file_model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env_non_empty("GEMINI_BASE_URL")
                .or(file_base_url)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            temperature,
            request_timeout_secs,
            context,
            theme,
        })
    }
}

pub fn validate_temperature(value: f32) -> std::result::Result<f32, String> {
    if value.is_finite() && (0.0..=MAX_TEMPERATURE).contains(&value) {
        Ok(value)
    } else {
        Err(format!("must be between 0.0 and {MAX_TEMPERATURE:.1}, got {value}"))
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("Failed to resolve config path: HOME directory is unavailable"))?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text)
        .map(Some)
        .map_err(|err| anyhow!("Failed to load config {}: {err}", config_path.display()))
}

fn validate_context(
    raw_context: Option<&RawContextConfig>,
    config_path: &Path,
) -> Result<ContextConfig> {
    let mut config = ContextConfig::default();
    let Some(raw) = raw_context else {
        return Ok(config);
    };

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new(""));
    if let Some(path) = &raw.instructions_file {
        config.instructions_file = resolve_relative(base_dir, path);
    }
    if let Some(path) = &raw.knowledge_file {
        config.knowledge_file = resolve_relative(base_dir, path);
    }
    if let Some(style) = &raw.prompt_style {
        config.prompt_style = PromptStyle::from_str(style)
            .map_err(|reason| config_error(config_path, "context.prompt_style", &reason))?;
    }
    if let Some(send_history) = raw.send_history {
        config.send_history = send_history;
    }
    if let Some(message) = raw.welcome_message.as_deref().and_then(non_empty) {
        config.welcome_message = message;
    }

    Ok(config)
}

fn resolve_relative(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn validate_theme(raw_theme: Option<&RawThemeConfig>, config_path: &Path) -> Result<ThemeConfig> {
    let Some(theme) = raw_theme else {
        return Ok(ThemeConfig::default());
    };

    let mut config = ThemeConfig::default();

    if let Some(name) = &theme.name {
        config.preset = ThemePreset::from_str(name)
            .map_err(|reason| config_error(config_path, "theme.name", &reason))?;
    }

    for (token_name, raw_style) in theme.styles.iter().flatten() {
        let key = format!("theme.styles.{token_name}");
        let token = ThemeToken::from_str(token_name)
            .map_err(|reason| config_error(config_path, &key, &reason))?;

        let fg = parse_color(raw_style.fg.as_deref())
            .map_err(|reason| config_error(config_path, &format!("{key}.fg"), &reason))?;
        let bg = parse_color(raw_style.bg.as_deref())
            .map_err(|reason| config_error(config_path, &format!("{key}.bg"), &reason))?;
        let modifiers = parse_modifiers(raw_style.modifiers.as_deref())
            .map_err(|reason| config_error(config_path, &format!("{key}.modifiers"), &reason))?;

        config
            .styles
            .insert(token, StyleOverride { fg, bg, modifiers });
    }

    Ok(config)
}

fn parse_color(value: Option<&str>) -> std::result::Result<Option<HexColor>, String> {
    value.map(HexColor::from_str).transpose()
}

fn parse_modifiers(
    values: Option<&[String]>,
) -> std::result::Result<Option<Vec<ThemeModifier>>, String> {
    values
        .map(|values| {
            values
                .iter()
                .map(|value| ThemeModifier::from_str(value))
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .transpose()
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().as_deref().and_then(non_empty)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn config_error(config_path: &Path, key_path: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key_path}: {reason}",
        config_path.display()
    )
}
