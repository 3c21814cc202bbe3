//! Status effect example: timed buffs and debuffs from a JSON sheet
//!
//! This example demonstrates:
//! - Loading stats and effects with `StatSheet`
//! - Stacking rules resolving repeated applications
//! - Expiring effects with a simulated clock
//! - Runtime counters (health) tracking their maximum

use statforge::config::StatSheet;
use statforge::*;
use tracing_subscriber::EnvFilter;

const SHEET: &str = r#"{
    "stats": [
        { "id": "Vitality", "base_value": 10 },
        { "id": "Strength", "base_value": 12 },
        { "id": "Damage", "formula": "Strength * 2" },
        { "id": "MaxHealth", "formula": "50 + Vitality * 10", "has_runtime_value": true }
    ],
    "status_effects": [
        { "id": "Poison", "name": "Spider Venom", "duration": 5, "stacking_rule": "Refresh",
          "modifiers": [{ "stat": "Strength", "value": -3 }] },
        { "id": "Rage", "duration": 3, "stacking_rule": "Stack",
          "modifiers": [{ "stat": "Strength", "value": 25, "percentage": true }] },
        { "id": "Fortitude", "duration": -1, "stacking_rule": "Ignore",
          "modifiers": [{ "stat": "Vitality", "value": 5 }] }
    ]
}"#;

fn report(hero: &StatusEffectController, now: f64) {
    let stats = hero.stats();
    let health = stats.runtime_stat(&"MaxHealth".into());
    println!(
        "t={:>4.1}  Damage {:>6.2}  Health {:>6.2}/{:>6.2}  active [{}]",
        now,
        stats.formula_value(&"Damage".into()),
        health.map_or(0.0, |h| h.current_value()),
        health.map_or(0.0, |h| h.max_value()),
        hero.active_effects()
            .iter()
            .map(|a| a.source().name())
            .collect::<Vec<_>>()
            .join(", ")
    );
}

fn main() -> Result<(), StatError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let sheet = StatSheet::from_json(SHEET)?;
    let effects = sheet.build_status_effects()?;
    let mut hero = StatusEffectController::new(sheet.build_unit_stats()?);

    let poison = &effects[&EffectId::from_str("Poison")];
    let rage = &effects[&EffectId::from_str("Rage")];
    let fortitude = &effects[&EffectId::from_str("Fortitude")];

    let mut now = 0.0;
    report(&hero, now);

    let script: [(f64, &std::sync::Arc<StatusEffect>); 6] = [
        (0.0, fortitude),
        (0.5, poison),
        (1.0, rage),
        (1.5, rage),
        (2.0, poison),
        (2.5, fortitude),
    ];

    for (at, effect) in script {
        now = at;
        hero.update(now);
        let outcome = hero.apply_status_effect(effect, now);
        println!("t={:>4.1}  {} -> {:?}", now, effect.name(), outcome);
        report(&hero, now);
    }

    while now < 8.0 {
        now += 1.0;
        let expired = hero.update(now);
        if expired > 0 {
            println!("t={:>4.1}  {} effect(s) expired", now, expired);
        }
        report(&hero, now);
    }

    Ok(())
}
