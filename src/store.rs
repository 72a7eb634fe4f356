use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CHAT_DIR: &str = "chats";

/// One turn of a conversation. Role is `"user"`, `"assistant"` or `"system"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Maps filesystem-hostile characters to `_`. Idempotent.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect()
}

/// One JSON file per conversation under a fixed directory. Single-process,
/// single-active-conversation access; concurrent external edits are
/// undefined behavior.
pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("cannot create conversation directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(CHAT_DIR)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sorted conversation names (file stems of `*.json` entries).
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("cannot read conversation directory {}", self.dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Creates an empty conversation and returns its sanitized name.
    /// Fails if a conversation with that name already exists.
    pub fn create(&self, name: &str) -> Result<String> {
        let stem = sanitize_name(name);
        let path = self.path_for(&stem);
        if path.exists() {
            return Err(anyhow!("a conversation named '{stem}' already exists"));
        }
        self.write_messages(&path, &[])?;
        Ok(stem)
    }

    /// Ordered message history. Records missing a string `role` or `content`
    /// are dropped; the loss is logged rather than failing the load.
    pub fn load(&self, name: &str) -> Result<Vec<Message>> {
        let path = self.path_for(name);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("cannot read conversation {}", path.display()))?;
        let records: Vec<serde_json::Value> = serde_json::from_str(&raw)
            .with_context(|| format!("conversation {} is not a JSON array", path.display()))?;

        let total = records.len();
        let messages: Vec<Message> = records
            .into_iter()
            .filter_map(|record| {
                let role = record.get("role")?.as_str()?.to_string();
                let content = record.get("content")?.as_str()?.to_string();
                Some(Message { role, content })
            })
            .collect();

        let dropped = total - messages.len();
        if dropped > 0 {
            warn!(
                "dropped {dropped} malformed record(s) while loading {}",
                path.display()
            );
        }

        Ok(messages)
    }

    /// Full rewrite of the conversation file, pretty-printed.
    pub fn save(&self, name: &str, messages: &[Message]) -> Result<()> {
        let path = self.path_for(name);
        self.write_messages(&path, messages)
    }

    fn write_messages(&self, path: &Path, messages: &[Message]) -> Result<()> {
        let body = serde_json::to_string_pretty(messages)
            .context("cannot serialize conversation history")?;
        fs::write(path, body)
            .with_context(|| format!("cannot write conversation {}", path.display()))
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_name(name)))
    }
}
