//! Headless прогон энкаунтера
//!
//! Запускает Bevy App без рендера: босс против неподвижной цели, арена с
//! двумя колоннами. Опционально читает TOML конфиг (первый аргумент).

use bevy::prelude::*;
use boss_encounter::{
    create_headless_app, log_error, log_info, run_ticks, spawn_boss, spawn_target,
    ArenaObstacles, BossTuning, ControllerRoutine, EncounterConfig, EncounterSignal, FormState,
    Obstacle,
};

fn load_tuning() -> BossTuning {
    let Some(path) = std::env::args().nth(1) else {
        return BossTuning::default();
    };

    let parsed = std::fs::read_to_string(&path)
        .map_err(|err| err.to_string())
        .and_then(|source| EncounterConfig::from_toml_str(&source).map_err(|err| err.to_string()))
        .and_then(|config| config.resolve().map_err(|err| err.to_string()));

    match parsed {
        Ok(tuning) => {
            log_info(&format!("📄 Encounter config loaded from {}", path));
            tuning
        }
        Err(err) => {
            log_error(&format!("❌ Config {} rejected ({}), using defaults", path, err));
            BossTuning::default()
        }
    }
}

fn main() {
    let seed = 42;
    println!("Starting boss encounter headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.insert_resource(ArenaObstacles::new(vec![
        Obstacle {
            id: 1,
            center: Vec3::new(-10.0, 0.0, 10.0),
            radius: 2.0,
        },
        Obstacle {
            id: 2,
            center: Vec3::new(10.0, 0.0, -10.0),
            radius: 2.0,
        },
    ]));

    let tuning = load_tuning();
    let world = app.world_mut();
    let target = spawn_target(world, Vec3::new(0.0, 0.0, 12.0));
    let boss = spawn_boss(world, tuning, Vec3::ZERO, Some(target));

    // 1000 fixed тиков ≈ 16.7s боя
    for tick in 0..10 {
        let signals = run_ticks(&mut app, 100);
        let damage = signals
            .iter()
            .filter(|s| matches!(s, EncounterSignal::DamageRequest { .. }))
            .count();

        let world = app.world();
        let (Some(form), Some(routine)) = (
            world.get::<FormState>(boss),
            world.get::<ControllerRoutine>(boss),
        ) else {
            break;
        };
        println!(
            "Tick {}: {:?} ({}), counter {}/{}, {} signals, {} damage requests",
            (tick + 1) * 100,
            form.current_form,
            routine.label(),
            form.attack_counter,
            form.attack_threshold,
            signals.len(),
            damage
        );
    }

    println!("Simulation complete!");
}
