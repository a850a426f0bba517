//! Text transformation tasks served by the model.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A task the seq2seq model knows how to perform.
///
/// The set is closed: each variant carries the instruction phrase the model was
/// fine-tuned on, and the source text is appended to it as `"{instruction}: {text}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Remove personally identifiable information from Italian text
    Anonymize,
    /// Translate English text to Italian
    Translate,
    /// Summarize text
    Summarize,
}

impl Task {
    /// All task variants for iteration.
    pub const ALL: [Task; 3] = [Task::Anonymize, Task::Translate, Task::Summarize];

    /// Wire name used in requests and responses.
    pub fn name(&self) -> &'static str {
        match self {
            Task::Anonymize => "anonymize",
            Task::Translate => "translate",
            Task::Summarize => "summarize",
        }
    }

    /// Instruction prefix prepended to the source text.
    pub fn instruction(&self) -> &'static str {
        match self {
            Task::Anonymize => "anonymize",
            Task::Translate => "translate English to Italian",
            Task::Summarize => "summarize",
        }
    }

    /// Look up a task by its exact wire name.
    pub fn from_name(name: &str) -> Option<Task> {
        Task::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Build the model prompt for `text`.
    pub fn prompt(&self, text: &str) -> String {
        format!("{}: {}", self.instruction(), text)
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing a name that is not in the task set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTask(pub String);

impl std::fmt::Display for UnknownTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown task: {}", self.0)
    }
}

impl std::error::Error for UnknownTask {}

impl FromStr for Task {
    type Err = UnknownTask;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Task::from_name(s).ok_or_else(|| UnknownTask(s.to_string()))
    }
}
