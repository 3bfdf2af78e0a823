use crate::config::{
    HexColor, StyleOverride, ThemeConfig as UserThemeConfig, ThemeModifier, ThemePreset, ThemeToken,
};
use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Theme {
    enabled: bool,
    styles: HashMap<ThemeToken, Style>,
}

impl Theme {
    #[cfg(test)]
    pub fn new(enabled: bool) -> Self {
        Self::from_config(enabled, &UserThemeConfig::default())
    }

    pub fn from_config(enabled: bool, config: &UserThemeConfig) -> Self {
        let mut styles: HashMap<ThemeToken, Style> = ThemeToken::all()
            .iter()
            .map(|token| (*token, preset_style(config.preset, *token)))
            .collect();

        for (token, override_style) in &config.styles {
            let base = styles.get(token).copied().unwrap_or_default();
            styles.insert(*token, merge_style(base, override_style));
        }

        Self { enabled, styles }
    }

    pub fn style(&self, token: ThemeToken) -> Style {
        if !self.enabled {
            return monochrome_style(token);
        }

        self.styles.get(&token).copied().unwrap_or_default()
    }
}

/// Palette for one preset. Tokens not listed fall back to the terminal default.
struct Palette {
    accent: Color,
    user: Color,
    answer: Color,
    muted: Color,
    info: Color,
    error: Color,
    input_bg: Color,
    input_fg: Color,
}

fn palette(preset: ThemePreset) -> Palette {
    match preset {
        ThemePreset::Default => Palette {
            accent: Color::Rgb(122, 162, 247),
            user: Color::White,
            answer: Color::Rgb(192, 202, 245),
            muted: Color::Rgb(138, 138, 138),
            info: Color::Rgb(86, 95, 137),
            error: Color::Rgb(247, 118, 142),
            input_bg: Color::Rgb(22, 22, 30),
            input_fg: Color::White,
        },
        ThemePreset::Light => Palette {
            accent: Color::Rgb(31, 111, 235),
            user: Color::Rgb(36, 41, 47),
            answer: Color::Rgb(9, 105, 218),
            muted: Color::Rgb(80, 90, 110),
            info: Color::Rgb(36, 70, 120),
            error: Color::Rgb(176, 0, 32),
            input_bg: Color::Rgb(246, 248, 250),
            input_fg: Color::Rgb(36, 41, 47),
        },
        ThemePreset::HighContrast => Palette {
            accent: Color::Rgb(255, 215, 0),
            user: Color::Rgb(255, 255, 255),
            answer: Color::Rgb(135, 206, 250),
            muted: Color::Rgb(220, 220, 220),
            info: Color::Rgb(173, 216, 230),
            error: Color::Rgb(255, 64, 64),
            input_bg: Color::Rgb(0, 0, 0),
            input_fg: Color::Rgb(255, 255, 255),
        },
    }
}

fn preset_style(preset: ThemePreset, token: ThemeToken) -> Style {
    let p = palette(preset);
    let plain = Style::default();
    match token {
        ThemeToken::UserPrompt | ThemeToken::CommandPrompt => {
            plain.fg(p.accent).add_modifier(Modifier::BOLD)
        }
        ThemeToken::UserInput => plain.fg(p.user),
        ThemeToken::AssistantText => plain.fg(p.answer),
        ThemeToken::AssistantWaiting => plain
            .fg(p.accent)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ThemeToken::AssistantMeta | ThemeToken::DirectoryDetail => {
            plain.fg(p.muted).add_modifier(Modifier::ITALIC)
        }
        ThemeToken::SystemInfo | ThemeToken::Status => plain.fg(p.info),
        ThemeToken::SystemError => plain.fg(p.error).add_modifier(Modifier::BOLD),
        ThemeToken::InputBlock => plain.bg(p.input_bg).fg(p.input_fg),
        ThemeToken::DirectoryTitle => plain.fg(p.accent).add_modifier(Modifier::BOLD),
        ThemeToken::DirectoryEntry => plain.fg(p.user),
        ThemeToken::DirectorySelected => plain.fg(p.accent).add_modifier(Modifier::REVERSED),
    }
}

fn monochrome_style(token: ThemeToken) -> Style {
    match token {
        ThemeToken::UserPrompt | ThemeToken::CommandPrompt | ThemeToken::DirectoryTitle => {
            Style::default().add_modifier(Modifier::BOLD)
        }
        ThemeToken::DirectorySelected => Style::default().add_modifier(Modifier::REVERSED),
        _ => Style::default(),
    }
}

fn merge_style(base: Style, override_style: &StyleOverride) -> Style {
    let mut merged = base;

    if let Some(fg) = override_style.fg {
        merged = merged.fg(color_from_hex(fg));
    }

    if let Some(bg) = override_style.bg {
        merged = merged.bg(color_from_hex(bg));
    }

    if let Some(modifiers) = &override_style.modifiers {
        let wanted = modifiers
            .iter()
            .fold(Modifier::empty(), |acc, modifier| acc | to_ratatui(*modifier));
        merged = merged.remove_modifier(Modifier::all()).add_modifier(wanted);
    }

    merged
}

fn color_from_hex(color: HexColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

fn to_ratatui(modifier: ThemeModifier) -> Modifier {
    match modifier {
        ThemeModifier::Bold => Modifier::BOLD,
        ThemeModifier::Dim => Modifier::DIM,
        ThemeModifier::Italic => Modifier::ITALIC,
        ThemeModifier::Underlined => Modifier::UNDERLINED,
        ThemeModifier::Reversed => Modifier::REVERSED,
        ThemeModifier::CrossedOut => Modifier::CROSSED_OUT,
    }
}
