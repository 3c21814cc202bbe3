//! Preview example: comparing equipment without touching the character
//!
//! This example demonstrates:
//! - Building hypothetical modifier sets per stat
//! - `preview_stat_changes` reporting before/after for dependents
//! - The container being unchanged afterwards

use statforge::*;
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

fn item(modifiers: &[StatModifier]) -> BTreeMap<StatId, Vec<ModifierRef>> {
    let mut per_stat: BTreeMap<StatId, Vec<ModifierRef>> = BTreeMap::new();
    for modifier in modifiers {
        per_stat
            .entry(modifier.stat().clone())
            .or_default()
            .push(modifier.clone().into_ref());
    }
    per_stat
}

fn main() -> Result<(), StatError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut stats = UnitStats::from_stats(vec![
        Stat::new("Strength", 14.0),
        Stat::new("Dexterity", 9.0),
        Stat::new("Vitality", 11.0),
        Stat::new("Attack", 0.0).with_formula("Strength * 3 + Dexterity"),
        Stat::new("Evasion", 0.0).with_max(60.0).with_formula("Dexterity * 2"),
        Stat::new("MaxHealth", 0.0)
            .with_formula("80 + Vitality * 12")
            .with_runtime_value(),
    ])?;

    let candidates = [
        (
            "Greataxe",
            item(&[
                StatModifier::flat("Strength", 6.0),
                StatModifier::flat("Dexterity", -2.0),
            ]),
        ),
        (
            "Rapier",
            item(&[
                StatModifier::flat("Dexterity", 5.0),
                StatModifier::percentage("Dexterity", 20.0),
            ]),
        ),
        ("Amulet of Vigor", item(&[StatModifier::percentage("Vitality", 50.0)])),
    ];

    for (name, modifiers) in &candidates {
        println!("=== {} ===", name);
        for (stat, before, after) in stats.preview_stat_change_list(modifiers) {
            println!("  {:<10} {:>7.2} -> {:>7.2} ({:+.2})", stat.as_str(), before, after, after - before);
        }
    }

    println!("\nCurrent values are unchanged:");
    for stat in stats.visible_stats() {
        println!("  {:<10} {:>7.2}", stat.id().as_str(), stats.formula_value(stat.id()));
    }

    Ok(())
}
