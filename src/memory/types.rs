//! Core memory type definitions.

use serde::{Deserialize, Serialize};

/// Speaker of a stored utterance. Descriptive only; recall never filters on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
    /// Any other label (`system`, `creator`, a file name during ingestion…).
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Other(label) => label,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        match label.as_str() {
            "" => Err("role must not be empty".to_string()),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Ok(Self::Other(label)),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A stored utterance, matching the `memories` table schema.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryRecord {
    /// Monotonically increasing, assigned by the backend.
    pub id: i64,
    pub session_id: String,
    pub role: Role,
    /// Cleaned, never empty.
    pub text: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// A row about to be inserted. The backend assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub session_id: String,
    pub role: Role,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A nearest-neighbour candidate before policy filtering.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: i64,
    pub role: Role,
    pub text: String,
    /// Cosine distance to the query; `None` when undefined (zero vector).
    pub distance: Option<f64>,
}

/// One recalled memory, ordered by ascending `distance`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recalled {
    pub role: Role,
    pub text: String,
    pub distance: f64,
}

/// Per-session record count and time range.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub records: u64,
    pub first_at: String,
    pub last_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_known_and_free_form_labels() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!(" Assistant ".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!(
            "Mediator".parse::<Role>().unwrap(),
            Role::Other("mediator".to_string())
        );
        assert!("  ".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_as_plain_string() {
        let json = serde_json::to_string(&Role::Other("system".into())).unwrap();
        assert_eq!(json, "\"system\"");
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
    }
}
