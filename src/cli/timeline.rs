use crate::cli::theme::Theme;
use crate::config::ThemeToken;
use crate::llm::provider::LlmTokenUsageTotals;
use ratatui::text::{Line, Span};

const TURN_PADDING: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputKind {
    SystemInfo,
    SystemError,
}

#[derive(Debug, Clone)]
pub(crate) enum TimelineEntry {
    CommandInput(String),
    OutputLine { kind: OutputKind, text: String },
    ChatTurn(ChatTurn),
}

#[derive(Debug, Clone)]
pub(crate) struct ChatTurn {
    pub(crate) question: String,
    pub(crate) state: ChatTurnState,
    pub(crate) token_usage: Option<LlmTokenUsageTotals>,
    pub(crate) answered_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChatTurnState {
    InFlight,
    Answered(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Timeline {
    entries: Vec<TimelineEntry>,
    welcome_message: String,
}

impl Timeline {
    pub(crate) fn new(welcome_message: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            welcome_message: welcome_message.into(),
        }
    }

    pub(crate) fn push_output(&mut self, kind: OutputKind, text: &str) {
        for line in split_output_lines(text) {
            self.entries.push(TimelineEntry::OutputLine {
                kind,
                text: line.to_string(),
            });
        }
    }

    pub(crate) fn push_command_input(&mut self, text: &str) {
        self.entries
            .push(TimelineEntry::CommandInput(text.trim().to_string()));
    }

    pub(crate) fn push_chat_turn(&mut self, question: &str) -> usize {
        let index = self.entries.len();
        self.entries.push(TimelineEntry::ChatTurn(ChatTurn {
            question: question.to_string(),
            state: ChatTurnState::InFlight,
            token_usage: None,
            answered_at: None,
        }));
        index
    }

    pub(crate) fn chat_turn_mut(&mut self, index: usize) -> Option<&mut ChatTurn> {
        match self.entries.get_mut(index) {
            Some(TimelineEntry::ChatTurn(turn)) => Some(turn),
            _ => None,
        }
    }

    pub(crate) fn render_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        if self.entries.is_empty() {
            return split_output_lines(&self.welcome_message)
                .into_iter()
                .map(|line| {
                    Line::from(Span::styled(
                        line.to_string(),
                        theme.style(ThemeToken::SystemInfo),
                    ))
                })
                .collect();
        }

        let context = RenderContext { theme };
        let mut lines = Vec::new();
        for entry in &self.entries {
            widget_for_entry(entry).render(&context, &mut lines);
        }

        lines
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

trait TimelineWidget {
    fn render(&self, context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>);
}

struct RenderContext<'a> {
    theme: &'a Theme,
}

struct CommandInputWidget<'a> {
    text: &'a str,
}

impl TimelineWidget for CommandInputWidget<'_> {
    fn render(&self, context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>) {
        lines.push(Line::from(vec![
            Span::styled("cmd> ", context.theme.style(ThemeToken::CommandPrompt)),
            Span::styled(
                self.text.to_string(),
                context.theme.style(ThemeToken::UserInput),
            ),
        ]));
    }
}

struct OutputLineWidget<'a> {
    kind: OutputKind,
    text: &'a str,
}

impl TimelineWidget for OutputLineWidget<'_> {
    fn render(&self, context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>) {
        lines.push(Line::from(Span::styled(
            self.text.to_string(),
            context.theme.style(output_token_for(self.kind)),
        )));
    }
}

struct ChatTurnWidget<'a> {
    turn: &'a ChatTurn,
}

impl TimelineWidget for ChatTurnWidget<'_> {
    fn render(&self, context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>) {
        let theme = context.theme;
        for (index, line) in split_output_lines(&self.turn.question).into_iter().enumerate() {
            let prefix = if index == 0 { "you> " } else { "     " };
            lines.push(Line::from(vec![
                Span::styled(prefix, theme.style(ThemeToken::UserPrompt)),
                Span::styled(line.to_string(), theme.style(ThemeToken::UserInput)),
            ]));
        }

        match &self.turn.state {
            ChatTurnState::InFlight => {
                lines.push(Line::from(vec![
                    Span::raw(TURN_PADDING),
                    Span::styled("Thinking...", theme.style(ThemeToken::AssistantWaiting)),
                ]));
            }
            ChatTurnState::Answered(text) => {
                for line in split_output_lines(text) {
                    lines.push(Line::from(Span::styled(
                        line.to_string(),
                        theme.style(ThemeToken::AssistantText),
                    )));
                }
                render_turn_meta(context, lines, self.turn);
            }
            ChatTurnState::Failed(message) => {
                for line in split_output_lines(message) {
                    lines.push(Line::from(Span::styled(
                        line.to_string(),
                        theme.style(ThemeToken::SystemError),
                    )));
                }
            }
        }

        lines.push(Line::from(""));
    }
}

fn render_turn_meta(context: &RenderContext<'_>, lines: &mut Vec<Line<'static>>, turn: &ChatTurn) {
    let mut parts = Vec::new();
    if let Some(time) = &turn.answered_at {
        parts.push(format!("[{time} UTC]"));
    }
    if let Some(usage) = turn.token_usage.as_ref().filter(|usage| !usage.is_zero()) {
        let total = if usage.total_tokens == 0 {
            "?".to_string()
        } else {
            usage.total_tokens.to_string()
        };
        parts.push(format!("tokens: {total}"));
    }
    if parts.is_empty() {
        return;
    }

    lines.push(Line::from(Span::styled(
        format!("{TURN_PADDING}{}", parts.join(" ")),
        context.theme.style(ThemeToken::AssistantMeta),
    )));
}

fn widget_for_entry(entry: &TimelineEntry) -> Box<dyn TimelineWidget + '_> {
    match entry {
        TimelineEntry::CommandInput(text) => Box::new(CommandInputWidget { text }),
        TimelineEntry::OutputLine { kind, text } => {
            Box::new(OutputLineWidget { kind: *kind, text })
        }
        TimelineEntry::ChatTurn(turn) => Box::new(ChatTurnWidget { turn }),
    }
}

/// Splits rendered lines so none is wider than `width` cells. Styles are kept per span.
pub(crate) fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return lines;
    }

    let mut wrapped = Vec::with_capacity(lines.len());
    for line in lines {
        if line.width() <= width {
            wrapped.push(line);
            continue;
        }

        let mut current: Vec<Span<'static>> = Vec::new();
        let mut used = 0;
        for span in line.spans {
            let mut chunk = String::new();
            for ch in span.content.chars() {
                let ch_width = char_width(ch);
                if used > 0 && used + ch_width > width {
                    if !chunk.is_empty() {
                        current.push(Span::styled(std::mem::take(&mut chunk), span.style));
                    }
                    wrapped.push(Line::from(std::mem::take(&mut current)));
                    used = 0;
                }
                chunk.push(ch);
                used += ch_width;
            }
            if !chunk.is_empty() {
                current.push(Span::styled(chunk, span.style));
            }
        }
        if !current.is_empty() {
            wrapped.push(Line::from(current));
        }
    }

    wrapped
}

pub(crate) fn char_width(ch: char) -> usize {
    let mut buf = [0u8; 4];
    Span::raw(&*ch.encode_utf8(&mut buf)).width()
}

fn split_output_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }

    text.lines().collect()
}

fn output_token_for(kind: OutputKind) -> ThemeToken {
    match kind {
        OutputKind::SystemInfo => ThemeToken::SystemInfo,
        OutputKind::SystemError => ThemeToken::SystemError,
    }
}
