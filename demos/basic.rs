//! Basic example: stats, modifiers, formulas and listeners
//!
//! This example demonstrates:
//! - Building a container of stats
//! - Formulas derived from other stats
//! - Adding and removing modifiers by identity
//! - Subscribing to value changes
//!
//! Run with `RUST_LOG=statforge=debug` to see the engine's logging.

use statforge::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), StatError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let strength = StatId::from_str("Strength");
    let damage = StatId::from_str("Damage");
    let crit = StatId::from_str("CritChance");

    let mut stats = UnitStats::from_stats(vec![
        Stat::new("Strength", 10.0),
        Stat::new("Agility", 8.0),
        Stat::new("Damage", 0.0).with_formula("Strength * 2 + Agility * 0.5"),
        Stat::new("CritChance", 0.0)
            .with_max(75.0)
            .with_formula("5 + Agility * 0.5"),
    ])?;

    println!("=== Initial Stats ===");
    for stat in stats.visible_stats() {
        println!("  {}: {:.2}", stat.id(), stats.formula_value(stat.id()));
    }

    stats.subscribe(&damage, |v| println!("  [listener] Damage -> {:.2}", v));

    // Equip a sword: +5 Strength, +20%
    println!("\nEquipping sword (+5 Strength, +20% Strength):");
    let flat = StatModifier::flat("Strength", 5.0).into_ref();
    let percent = StatModifier::percentage("Strength", 20.0).into_ref();
    stats.add_modifier(&strength, flat.clone(), true);
    stats.add_modifier(&strength, percent.clone(), true);

    println!("  Strength: {:.2}", stats.basic_value(&strength));
    println!("  Damage: {:.2}", stats.formula_value(&damage));

    println!("\nUnequipping sword:");
    stats.remove_modifier(&strength, &flat, true);
    stats.remove_modifier(&strength, &percent, true);
    println!("  Damage: {:.2}", stats.formula_value(&damage));

    println!("\nCrit chance is capped at its maximum:");
    let agility = StatId::from_str("Agility");
    stats.add_modifier(&agility, StatModifier::flat("Agility", 500.0).into_ref(), false);
    println!("  CritChance: {:.2}", stats.formula_value(&crit));

    println!("\n=== Dependency Graph ===");
    println!("  (logged at info level, run with RUST_LOG=statforge=info)");
    stats.log_dependency_graph();

    Ok(())
}
