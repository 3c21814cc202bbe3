//! Stat sheet configuration.
//!
//! Stats and status effects are authored as data and loaded before a
//! container is initialized. A `StatSheet` is the serde form of that data;
//! JSON is read and written through `serde_json`.
//!
//! ```json
//! {
//!   "stats": [
//!     { "id": "Strength", "base_value": 10 },
//!     { "id": "Damage", "formula": "Strength * 2" },
//!     { "id": "Health", "base_value": 100, "has_runtime_value": true }
//!   ],
//!   "status_effects": [
//!     { "id": "Poison", "duration": 5, "stacking_rule": "Refresh",
//!       "modifiers": [{ "stat": "Health", "value": -10 }] }
//!   ]
//! }
//! ```

use crate::effect::{EffectId, StackingRule, StatusEffect};
use crate::error::StatError;
use crate::formula::Formula;
use crate::modifier::StatModifier;
use crate::stat::Stat;
use crate::stat_id::StatId;
use crate::unit_stats::UnitStats;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Negative maxima (conventionally `-1`) mean "no maximum".
fn max_value_or_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| *v >= 0.0))
}

fn default_duration() -> f64 {
    1.0
}

/// One stat as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDefinition {
    pub id: StatId,
    #[serde(default)]
    pub base_value: f64,
    #[serde(default)]
    pub min_value: f64,
    #[serde(default, deserialize_with = "max_value_or_none")]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub has_runtime_value: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub formula: Option<String>,
    /// Modifiers present from the start.
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,
}

impl StatDefinition {
    pub fn to_stat(&self) -> Stat {
        let mut stat = Stat::new(self.id.clone(), self.base_value).with_min(self.min_value);
        if let Some(max) = self.max_value {
            stat = stat.with_max(max);
        }
        if self.has_runtime_value {
            stat = stat.with_runtime_value();
        }
        if self.hidden {
            stat = stat.hidden();
        }
        if let Some(text) = self.formula.as_deref().filter(|t| !t.trim().is_empty()) {
            stat = stat.with_formula(Formula::new(text));
        }
        for modifier in &self.modifiers {
            stat.add_modifier(modifier.clone().into_ref());
        }
        stat
    }
}

/// One status effect as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectDefinition {
    pub id: EffectId,
    /// Display name; the id when absent.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Seconds; negative means infinite.
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default)]
    pub stacking_rule: StackingRule,
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,
}

impl StatusEffectDefinition {
    pub fn to_status_effect(&self) -> StatusEffect {
        let mut effect = StatusEffect::new(self.id.clone(), self.duration, self.stacking_rule)
            .with_description(self.description.clone());
        if let Some(name) = &self.name {
            effect = effect.with_name(name.clone());
        }
        for modifier in &self.modifiers {
            effect = effect.with_modifier(modifier.clone());
        }
        effect
    }
}

/// All authored stats and status effects of one kind of entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatSheet {
    #[serde(default)]
    pub stats: Vec<StatDefinition>,
    #[serde(default)]
    pub status_effects: Vec<StatusEffectDefinition>,
}

impl StatSheet {
    /// Parse a sheet from JSON.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statforge::config::StatSheet;
    ///
    /// let sheet = StatSheet::from_json(r#"{
    ///     "stats": [
    ///         { "id": "Strength", "base_value": 10 },
    ///         { "id": "Damage", "formula": "Strength * 2" }
    ///     ]
    /// }"#).unwrap();
    ///
    /// let stats = sheet.build_unit_stats().unwrap();
    /// assert_eq!(stats.formula_value(&"Damage".into()), 20.0);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, StatError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, StatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build and initialize a container from the stat definitions.
    pub fn build_unit_stats(&self) -> Result<UnitStats, StatError> {
        UnitStats::from_stats(self.stats.iter().map(StatDefinition::to_stat).collect())
    }

    /// Build the shared status effect definitions, keyed by id.
    pub fn build_status_effects(&self) -> Result<BTreeMap<EffectId, Arc<StatusEffect>>, StatError> {
        let mut effects = BTreeMap::new();
        for definition in &self.status_effects {
            let effect = definition.to_status_effect().into_shared();
            if effects.insert(definition.id.clone(), effect).is_some() {
                return Err(StatError::Config(format!(
                    "duplicate status effect: {}",
                    definition.id
                )));
            }
        }
        Ok(effects)
    }
}
