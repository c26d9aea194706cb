//! Task kinds and routing priorities.
//!
//! Both enums travel through configuration files and backend requests, so
//! they serialize as lowercase strings and parse back with [`FromStr`].

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::Error;

/// Category of work a backend is asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Conversational replies
    Chat,
    /// Code generation and review
    Code,
    /// Condensing long input
    Summarize,
    /// Pulling structured data out of text
    Extract,
    /// Multi-step reasoning
    Reason,
    /// Vector embeddings
    Embedding,
    /// Deciding which agent should act
    Orchestration,
}

impl TaskKind {
    /// All task kinds in declaration order.
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::Chat,
            Self::Code,
            Self::Summarize,
            Self::Extract,
            Self::Reason,
            Self::Embedding,
            Self::Orchestration,
        ]
    }

    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Code => "code",
            Self::Summarize => "summarize",
            Self::Extract => "extract",
            Self::Reason => "reason",
            Self::Embedding => "embedding",
            Self::Orchestration => "orchestration",
        }
    }
}

impl Display for TaskKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::Config(format!("unknown task kind: {value}")))
    }
}

/// Trade-off preference that reweights the router's scoring nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Favour fast backends
    Speed,
    /// Favour the strongest backends
    Quality,
    /// Favour cheap backends
    Cost,
    /// Even trade-off
    #[default]
    Balanced,
}

impl Priority {
    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Quality => "quality",
            Self::Cost => "cost",
            Self::Balanced => "balanced",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "speed" => Ok(Self::Speed),
            "quality" => Ok(Self::Quality),
            "cost" => Ok(Self::Cost),
            "balanced" | "balance" => Ok(Self::Balanced),
            _ => Err(Error::Config(format!("unknown priority: {value}"))),
        }
    }
}
