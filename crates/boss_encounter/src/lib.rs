//! Boss Encounter Core
//!
//! ECS-логика босса на Bevy 0.16: Form Controller, Attack Selector,
//! Resource Arbitration, Interruption Handler, Charge, Pull.
//!
//! Архитектура:
//! - ECS = поведение босса (routines, таймеры, арбитраж)
//! - Engine bridge = анимация, физика, навигация, VFX (через события)
//!
//! Всё поведение крутится в FixedUpdate (60Hz) в фиксированном порядке
//! (`EncounterSet`), RNG один и seeded: одинаковый seed + одинаковые
//! callbacks → одинаковый бой.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod arbitration;
pub mod catalog;
pub mod charge;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod form;
pub mod headless;
pub mod interrupt;
pub mod logger;
pub mod selector;
pub mod suction;

pub use catalog::{AnimationClips, AttackCatalog, AttackId, AttackKind};
pub use components::*;
pub use config::{BossTuning, EncounterConfig};
pub use error::ConfigError;
pub use events::{AnimationCallback, ArenaCallback, EncounterSignal};
pub use form::{ControllerRoutine, Form, FormState};
pub use headless::HeadlessMotionPlugin;
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_with_level, set_log_level,
    set_logger, set_logger_if_needed, LogLevel, LogPrinter,
};

use crate::arbitration::{tick_body_resources, BodyResources};
use crate::form::{advance_form_controllers, ingest_arena_callbacks};
use crate::interrupt::tick_stuns;
use crate::suction::tick_pull_routines;

/// Порядок подсистем внутри одного fixed tick
///
/// Ingest → Arbitration → Interrupt → Controller → Pull → Motion
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncounterSet {
    /// Arena callbacks (parry, obstacle, zone, mount, hits, panels, defeat)
    Ingest,
    /// Deploy/retract confirmations + timers
    Arbitration,
    /// Stun phases and exit
    Interrupt,
    /// Form Controller routines
    Controller,
    /// Pull velocities
    Pull,
    /// Headless body integration (only with `HeadlessMotionPlugin`)
    Motion,
}

/// Главный plugin энкаунтера (объединяет все подсистемы)
pub struct EncounterPlugin {
    pub seed: u64,
}

impl Default for EncounterPlugin {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl Plugin for EncounterPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .init_resource::<AttackCatalog>()
            .init_resource::<AnimationClips>()
            .init_resource::<ArenaObstacles>()
            .add_event::<AnimationCallback>()
            .add_event::<ArenaCallback>()
            .add_event::<EncounterSignal>()
            .configure_sets(
                FixedUpdate,
                (
                    EncounterSet::Ingest,
                    EncounterSet::Arbitration,
                    EncounterSet::Interrupt,
                    EncounterSet::Controller,
                    EncounterSet::Pull,
                    EncounterSet::Motion,
                )
                    .chain(),
            )
            // Отклонённый каталог: ни одна подсистема босса не тикает
            .configure_sets(
                FixedUpdate,
                (
                    EncounterSet::Ingest,
                    EncounterSet::Arbitration,
                    EncounterSet::Interrupt,
                    EncounterSet::Controller,
                    EncounterSet::Pull,
                )
                    .run_if(catalog_accepted),
            )
            .add_systems(
                FixedUpdate,
                (
                    check_attack_catalog.before(EncounterSet::Ingest),
                    ingest_arena_callbacks.in_set(EncounterSet::Ingest),
                    tick_body_resources.in_set(EncounterSet::Arbitration),
                    tick_stuns.in_set(EncounterSet::Interrupt),
                    advance_form_controllers.in_set(EncounterSet::Controller),
                    tick_pull_routines.in_set(EncounterSet::Pull),
                ),
            );

        // Seed задаётся только если RNG ещё не вставлен (create_headless_app)
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(self.seed));
        }

        let mut status = CatalogStatus::default();
        status.record(app.world().resource::<AttackCatalog>().validate());
        app.insert_resource(status);

        log_info("🐉 EncounterPlugin initialized (FixedUpdate 60Hz)");
    }
}

/// Результат последней проверки `AttackCatalog`
///
/// Пока каталог отклонён, энкаунтер стоит (сигналов нет). Каталог,
/// вставленный после plugin, перепроверяется на следующем fixed tick.
#[derive(Resource, Debug, Default)]
pub struct CatalogStatus {
    pub rejected: Option<ConfigError>,
}

impl CatalogStatus {
    pub fn is_accepted(&self) -> bool {
        self.rejected.is_none()
    }

    fn record(&mut self, result: Result<(), ConfigError>) {
        match result {
            Ok(()) => {
                if self.rejected.take().is_some() {
                    log_info("✅ Attack catalog accepted, encounter resumes");
                }
            }
            Err(err) => {
                let repeated = self
                    .rejected
                    .as_ref()
                    .is_some_and(|prev| prev.to_string() == err.to_string());
                if !repeated {
                    log_error(&format!("❌ Attack catalog rejected: {}", err));
                }
                self.rejected = Some(err);
            }
        }
    }
}

fn catalog_accepted(status: Res<CatalogStatus>) -> bool {
    status.is_accepted()
}

/// Перепроверка каталога при замене resource
fn check_attack_catalog(catalog: Res<AttackCatalog>, mut status: ResMut<CatalogStatus>) {
    if catalog.is_changed() {
        status.record(catalog.validate());
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции энкаунтера
///
/// MinimalPlugins + EncounterPlugin + HeadlessMotionPlugin. Тики гоняются
/// через `step_fixed` / `run_ticks` (не через `app.update()`, чтобы число
/// fixed шагов не зависело от wall clock).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins((EncounterPlugin { seed }, HeadlessMotionPlugin));

    app
}

/// Один fixed tick: сдвигает `Time<Fixed>` на timestep, гоняет FixedUpdate,
/// возвращает все сигналы, выпущенные за тик.
pub fn step_fixed(app: &mut App) -> Vec<EncounterSignal> {
    let world = app.world_mut();

    let timestep = world.resource::<Time<Fixed>>().timestep();
    world.resource_mut::<Time<Fixed>>().advance_by(timestep);
    world.run_schedule(FixedUpdate);

    let signals: Vec<EncounterSignal> = world
        .resource_mut::<Events<EncounterSignal>>()
        .drain()
        .collect();

    // Входящие события живут два тика (double buffer), потом уходят
    world.resource_mut::<Events<ArenaCallback>>().update();
    world.resource_mut::<Events<AnimationCallback>>().update();

    signals
}

/// `ticks` fixed шагов подряд, сигналы склеены в порядке выпуска.
pub fn run_ticks(app: &mut App, ticks: usize) -> Vec<EncounterSignal> {
    let mut signals = Vec::new();
    for _ in 0..ticks {
        signals.extend(step_fixed(app));
    }
    signals
}

/// Спавнит босса с данным тюнингом
///
/// BodyResources, SidePanels и порог transition строятся из `tuning`
/// (порог: из `DeterministicRng`, поэтому зависит от seed).
pub fn spawn_boss(
    world: &mut World,
    tuning: BossTuning,
    position: Vec3,
    target: Option<Entity>,
) -> Entity {
    let form = {
        let mut rng = world.resource_mut::<DeterministicRng>();
        FormState::rolled(&tuning.selection, &mut rng.rng)
    };

    let entity = world
        .spawn((
            Boss,
            Transform::from_translation(position),
            BodyResources::new(&tuning),
            SidePanels::new(&tuning.panels),
            form,
            TrackedTarget(target),
            tuning,
        ))
        .id();

    log(&format!(
        "🐉 Boss {:?} spawned at {:.1?} (target {:?})",
        entity, position, target
    ));
    entity
}

/// Спавнит цель (игрока) в позиции.
pub fn spawn_target(world: &mut World, position: Vec3) -> Entity {
    world
        .spawn((EncounterTarget, Transform::from_translation(position)))
        .id()
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
