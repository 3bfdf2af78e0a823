mod session;

pub use session::{ChatMessage, ChatRole, ChatSession};

use crate::context::ContextFiles;
use crate::llm::provider::{
    AssistantInput, AssistantMessage, AssistantOutput, LlmProvider, LlmResult,
};
use crate::prompt::{PromptStyle, build_system_instruction, build_user_prompt};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatSettings {
    pub prompt_style: PromptStyle,
    pub send_history: bool,
    pub temperature: Option<f32>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            prompt_style: PromptStyle::default(),
            send_history: false,
            temperature: Some(0.0),
        }
    }
}

/// Builds the request for `question`. Earlier turns go out as typed; only the
/// newest one carries the knowledge template.
pub fn build_input(
    context: &ContextFiles,
    settings: &ChatSettings,
    history: &[ChatMessage],
    question: &str,
) -> AssistantInput {
    let knowledge = &context.knowledge().text;
    let mut messages = Vec::new();

    if settings.send_history {
        messages.extend(history.iter().map(|message| match message.role {
            ChatRole::User => AssistantMessage::user(message.content.as_str()),
            ChatRole::Assistant => AssistantMessage::model(message.content.as_str()),
        }));
    }
    messages.push(AssistantMessage::user(build_user_prompt(
        settings.prompt_style,
        knowledge,
        question,
    )));

    AssistantInput {
        system_instruction: build_system_instruction(
            settings.prompt_style,
            &context.instructions().text,
            knowledge,
        ),
        messages,
        temperature: settings.temperature,
    }
}

/// Records `question` in the session, asks the provider, and records the answer on success.
pub async fn ask<P: LlmProvider>(
    provider: &P,
    context: &ContextFiles,
    settings: &ChatSettings,
    session: &mut ChatSession,
    question: &str,
) -> LlmResult<AssistantOutput> {
    let input = build_input(context, settings, session.messages(), question);
    session.push_user(question);

    let output = provider.generate(input).await?;
    session.push_assistant(output.text.as_str());
    Ok(output)
}
