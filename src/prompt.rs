use std::fmt::{Display, Formatter};
use std::str::FromStr;

const STRUCTURED_RULES: &str = "# Strict rules\nAnswer using only the contents of the material below. If the material does not cover the question, answer \"Unknown\" instead of guessing.";
const REFERENCE_PREAMBLE: &str =
    "Refer to the following material as your knowledge and answer the user's question.";
const SYSTEM_MATERIAL_HEADING: &str = "Reference material:";

/// How the knowledge document reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    /// Rules, material and question in one structured user message.
    #[default]
    Structured,
    /// Material prefixed with a "refer to this" request, then the question.
    Reference,
    /// Material appended to the system instruction; the question goes out as typed.
    SystemContext,
}

impl PromptStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Reference => "reference",
            Self::SystemContext => "system",
        }
    }
}

impl Display for PromptStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "structured" => Ok(Self::Structured),
            "reference" => Ok(Self::Reference),
            "system" => Ok(Self::SystemContext),
            _ => Err(format!("unknown prompt style '{value}'")),
        }
    }
}

pub fn build_system_instruction(
    style: PromptStyle,
    instructions: &str,
    knowledge: &str,
) -> Option<String> {
    let instructions = instructions.trim();
    let knowledge = knowledge.trim();

    let text = match style {
        PromptStyle::SystemContext if !knowledge.is_empty() => {
            if instructions.is_empty() {
                format!("{SYSTEM_MATERIAL_HEADING}\n{knowledge}")
            } else {
                format!("{instructions}\n\n{SYSTEM_MATERIAL_HEADING}\n{knowledge}")
            }
        }
        _ => instructions.to_string(),
    };

    if text.is_empty() { None } else { Some(text) }
}

pub fn build_user_prompt(style: PromptStyle, knowledge: &str, question: &str) -> String {
    let knowledge = knowledge.trim();
    if knowledge.is_empty() {
        return question.to_string();
    }

    match style {
        PromptStyle::Structured => format!(
            "{STRUCTURED_RULES}\n\n# Material\n{knowledge}\n\n# User question\n{question}\n"
        ),
        PromptStyle::Reference => {
            format!("{REFERENCE_PREAMBLE}\n\nMaterial:\n{knowledge}\n\nQuestion:\n{question}\n")
        }
        PromptStyle::SystemContext => question.to_string(),
    }
}
