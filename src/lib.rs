//! # statforge - Runtime Stat Engine
//!
//! Named numeric stats per entity, with:
//! - **Modifiers**: flat and percentage adjustments, removed by identity
//! - **Formulas**: stats derived from other stats through arithmetic text
//! - **Propagation**: change notifications flow along a dependency graph
//! - **Runtime counters**: bounded current/max values (health, mana)
//! - **Status effects**: timed modifier bundles with stacking rules
//! - **Preview**: "what if" evaluation of modifiers without side effects
//!
//! ## Core Concepts
//!
//! ```text
//! StatusEffectController → UnitStats::add_modifier → Stat
//!                                                     ↓
//!                             DependencyGraph → dependent Stats / RuntimeStats
//!                                                     ↓
//!                                                 listeners
//! ```
//!
//! A stat's *basic* value is its base plus modifiers. Its *final* value
//! runs its formula (if any) over the basic values of the stats the
//! formula names. Formulas never see other formulas' output, which keeps
//! evaluation non-recursive and propagation one hop deep. Cycles between
//! formulas are rejected when the container is initialized.
//!
//! ## Example
//!
//! ```rust
//! use statforge::*;
//!
//! let stats = UnitStats::from_stats(vec![
//!     Stat::new("Strength", 10.0),
//!     Stat::new("Damage", 0.0).with_formula("Strength * 2"),
//!     Stat::new("Health", 100.0).with_runtime_value(),
//! ])
//! .unwrap();
//!
//! let mut controller = StatusEffectController::new(stats);
//! let rage = StatusEffect::new("Rage", 5.0, StackingRule::Refresh)
//!     .with_modifier(StatModifier::flat("Strength", 5.0))
//!     .into_shared();
//!
//! controller.apply_status_effect(&rage, 0.0);
//! assert_eq!(controller.stats().formula_value(&"Damage".into()), 30.0);
//!
//! controller.update(5.0);
//! assert_eq!(controller.stats().formula_value(&"Damage".into()), 20.0);
//! ```
//!
//! ## Modules
//!
//! - [`stat_id`] - Stat identifier type
//! - [`modifier`] - Flat/percentage modifiers
//! - [`formula`] - Formula compilation and evaluation
//! - [`stat`] - Single stat
//! - [`runtime`] - Current/max counters
//! - [`event`] - Change listeners
//! - [`graph`] - Dependency graph
//! - [`unit_stats`] - Per-entity stat container
//! - [`effect`] - Status effect definitions
//! - [`controller`] - Status effect stacking and expiry
//! - [`config`] - Serde configuration
//! - [`error`] - Error types

pub mod config;
pub mod controller;
pub mod effect;
pub mod error;
pub mod event;
pub mod formula;
pub mod graph;
pub mod modifier;
pub mod runtime;
pub mod stat;
pub mod stat_id;
pub mod unit_stats;

// Re-export main types for convenience
pub use controller::{ApplyOutcome, StatusEffectController};
pub use effect::{EffectId, RuntimeStatusEffect, StackingRule, StatusEffect, INFINITE_DURATION};
pub use error::StatError;
pub use event::{ListenerId, Listeners};
pub use formula::Formula;
pub use graph::DependencyGraph;
pub use modifier::{ModifierRef, StatModifier};
pub use runtime::{RuntimeStat, RuntimeStatMut, RuntimeStatRef, NOTIFY_EPSILON};
pub use stat::Stat;
pub use stat_id::StatId;
pub use unit_stats::{StatPreviewChange, UnitStats};
