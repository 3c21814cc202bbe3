//! Stat identifier module.
//!
//! Provides `StatId`, the key of a stat inside a container and the name a
//! formula uses to reference it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// Interned string identifier for stats.
///
/// Backed by `Arc<str>`, so cloning is cheap and the same name can be
/// shared by stats, modifiers and the dependency graph.
///
/// # Examples
///
/// ```rust
/// use statforge::StatId;
///
/// let strength = StatId::from_str("Strength");
/// let also_strength: StatId = "Strength".into();
///
/// assert_eq!(strength, also_strength);
/// assert_eq!(strength.as_str(), "Strength");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatId(Arc<str>);

impl Serialize for StatId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StatId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(StatId::from(s))
    }
}

impl StatId {
    /// Create a new `StatId` from a string slice.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the string representation of this `StatId`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a formula can reference this stat by name.
    ///
    /// Formula variables start with a letter or `_`, continue with
    /// letters, digits or `_`, and are not the literals `true`/`false`.
    ///
    /// ```rust
    /// use statforge::StatId;
    ///
    /// assert!(StatId::from_str("CritChance").is_formula_name());
    /// assert!(!StatId::from_str("Move Speed").is_formula_name());
    /// assert!(!StatId::from_str("2ndWind").is_formula_name());
    /// ```
    pub fn is_formula_name(&self) -> bool {
        let mut chars = self.0.chars();
        let head_ok = chars
            .next()
            .map_or(false, |c| c.is_alphabetic() || c == '_');
        head_ok
            && chars.all(|c| c.is_alphanumeric() || c == '_')
            && !matches!(self.as_str(), "true" | "false")
    }
}

impl AsRef<str> for StatId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StatId {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for StatId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for StatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_id_equality() {
        let a = StatId::from_str("Agility");
        let b: StatId = String::from("Agility").into();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Agility");
    }

    #[test]
    fn test_stat_id_ordering() {
        let damage = StatId::from_str("Damage");
        let health = StatId::from_str("Health");
        assert!(damage < health);
    }

    #[test]
    fn test_formula_names() {
        for name in ["Strength", "_hidden", "Tier2Armor", "max_hp"] {
            assert!(StatId::from_str(name).is_formula_name(), "{name}");
        }
        for name in ["", "Move Speed", "3rdEye", "Hit%", "true", "Fire-Resist"] {
            assert!(!StatId::from_str(name).is_formula_name(), "{name}");
        }
    }

    #[test]
    fn test_stat_id_serde_as_plain_string() {
        let id = StatId::from_str("Luck");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"Luck\"");
        let back: StatId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
