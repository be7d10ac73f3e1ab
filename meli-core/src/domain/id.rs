use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier that may arrive as a JSON number or a string.
///
/// Seed files and callers mix the two spellings freely (`1` vs `"1"`), so
/// equality goes through a canonical string form instead of the serde
/// representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl EntityId {
    /// Canonical spelling used for comparison, hashing, and display.
    pub fn canonical(&self) -> String {
        match self {
            EntityId::Int(n) => n.to_string(),
            EntityId::Text(s) => s.trim().to_string(),
        }
    }

    /// Numeric view of the id, when it has one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            EntityId::Int(n) => Some(*n),
            EntityId::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        EntityId::Int(0)
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Int(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Text(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::Text(s)
    }
}

impl From<&EntityId> for Value {
    fn from(id: &EntityId) -> Self {
        match id {
            EntityId::Int(n) => Value::from(*n),
            EntityId::Text(s) => Value::from(s.clone()),
        }
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Value::from(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_spellings_compare_equal() {
        assert_eq!(EntityId::Int(1), EntityId::from("1"));
        assert_eq!(EntityId::from("42"), EntityId::Int(42));
        assert_ne!(EntityId::Int(1), EntityId::from("2"));
    }

    #[test]
    fn canonical_trims_whitespace() {
        assert_eq!(EntityId::from(" 7 "), EntityId::Int(7));
    }

    #[test]
    fn deserializes_from_either_representation() {
        let ids: Vec<EntityId> = serde_json::from_str(r#"[1, "1"]"#).unwrap();
        assert_eq!(ids[0], ids[1]);
    }
}
