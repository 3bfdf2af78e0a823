#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub details: Vec<String>,
}

impl DirectoryEntry {
    /// Question pre-filled into the chat input when the entry is picked.
    pub fn question(&self) -> String {
        format!("Tell me about \"{}\".", self.name)
    }

    fn matches(&self, needle: &str) -> bool {
        contains_folded(&self.name, needle)
            || self
                .details
                .iter()
                .any(|detail| contains_folded(detail, needle))
    }
}

/// Facilities listed in the knowledge document: blank-line separated blocks,
/// first line is the name, the rest are details. `#` lines are headings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
}

impl Directory {
    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();
        let mut current: Option<DirectoryEntry> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                entries.extend(current.take());
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            match current.as_mut() {
                Some(entry) => entry.details.push(line.to_string()),
                None => {
                    current = Some(DirectoryEntry {
                        name: line.to_string(),
                        details: Vec::new(),
                    });
                }
            }
        }
        entries.extend(current);

        Self { entries }
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn search(&self, query: &str) -> Vec<&DirectoryEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.entries.iter().collect();
        }

        self.entries
            .iter()
            .filter(|entry| entry.matches(&needle))
            .collect()
    }
}

fn contains_folded(haystack: &str, folded_needle: &str) -> bool {
    haystack.to_lowercase().contains(folded_needle)
}
