mod directory;

pub use directory::{Directory, DirectoryEntry};

use anyhow::{Result, anyhow};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A text document read from disk. A missing file reads as empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub path: PathBuf,
    pub text: String,
    pub missing: bool,
}

impl TextDocument {
    fn summary_line(&self, label: &str) -> String {
        if self.missing {
            format!("{label}: {} (missing, using empty text)", self.path.display())
        } else {
            format!(
                "{label}: {} ({} chars)",
                self.path.display(),
                self.text.chars().count()
            )
        }
    }
}

pub fn load_text_file(path: &Path) -> Result<TextDocument> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(TextDocument {
            path: path.to_path_buf(),
            text,
            missing: false,
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(TextDocument {
            path: path.to_path_buf(),
            text: String::new(),
            missing: true,
        }),
        Err(err) => Err(anyhow!(
            "Failed to load context file {}: {err}",
            path.display()
        )),
    }
}

/// The system instruction and knowledge documents, plus the directory parsed from the latter.
#[derive(Debug, Clone)]
pub struct ContextFiles {
    instructions: TextDocument,
    knowledge: TextDocument,
    directory: Directory,
}

impl ContextFiles {
    pub fn load(instructions_path: &Path, knowledge_path: &Path) -> Result<Self> {
        let instructions = load_text_file(instructions_path)?;
        let knowledge = load_text_file(knowledge_path)?;
        Ok(Self::from_documents(instructions, knowledge))
    }

    pub fn from_text(instructions: &str, knowledge: &str) -> Self {
        Self::from_documents(
            TextDocument {
                path: PathBuf::from("<inline instructions>"),
                text: instructions.to_string(),
                missing: false,
            },
            TextDocument {
                path: PathBuf::from("<inline knowledge>"),
                text: knowledge.to_string(),
                missing: false,
            },
        )
    }

    fn from_documents(instructions: TextDocument, knowledge: TextDocument) -> Self {
        let directory = Directory::parse(&knowledge.text);
        Self {
            instructions,
            knowledge,
            directory,
        }
    }

    /// Re-reads both files. On error the previously loaded content is kept.
    pub fn reload(&mut self) -> Result<()> {
        let reloaded = Self::load(&self.instructions.path, &self.knowledge.path)?;
        *self = reloaded;
        Ok(())
    }

    pub fn instructions(&self) -> &TextDocument {
        &self.instructions
    }

    pub fn knowledge(&self) -> &TextDocument {
        &self.knowledge
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            self.instructions.summary_line("instructions"),
            self.knowledge.summary_line("knowledge"),
            format!("directory: {} entries", self.directory.len()),
        ]
    }

    /// Startup notices for documents that could not be found.
    pub fn warnings(&self) -> Vec<String> {
        [("instructions", &self.instructions), ("knowledge", &self.knowledge)]
            .into_iter()
            .filter(|(_, doc)| doc.missing)
            .map(|(label, doc)| {
                format!(
                    "Warning: {label} file {} not found; continuing without it.",
                    doc.path.display()
                )
            })
            .collect()
    }
}
