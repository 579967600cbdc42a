//! Encounter configuration (TOML) and its validated runtime form.
//!
//! `EncounterConfig` is what designers edit; `BossTuning` is what the
//! systems read. Every duration that arbitration depends on is resolved to a
//! definite value during validation, so a running encounter can never wait
//! on a completion signal that has no fallback.

use bevy::prelude::*;
use serde::Deserialize;

use crate::arbitration::{BodyResource, TransitionDirection};
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    pub selection: SelectionConfig,
    pub stun: StunConfig,
    pub arbitration: ArbitrationConfig,
    pub charge: ChargeConfig,
    pub suction: SuctionConfig,
    pub transition: TransitionConfig,
    pub panels: PanelConfig,
    pub movement: MovementConfig,
}

/// Attack selection knobs (Primary form loop).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Body radius of the boss; subtracted from raw distance before range checks
    pub agent_clearance: f32,
    /// Extra slack subtracted from raw distance (max with clearance)
    pub range_buffer: f32,
    /// How long a "close distance" move runs before re-querying (seconds)
    pub close_distance_duration: f32,
    /// Pause between two attacks (seconds)
    pub decision_interval: f32,
    /// Target still counts as mounted this long after dismounting (seconds)
    pub mount_grace_seconds: f32,
    /// Successful attacks before the transition attack is forced (rolled inclusive)
    pub threshold_min: u32,
    pub threshold_max: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            agent_clearance: 1.5,
            range_buffer: 1.0,
            close_distance_duration: 1.5,
            decision_interval: 0.4,
            mount_grace_seconds: 1.0,
            threshold_min: 8,
            threshold_max: 12,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StunConfig {
    pub parry_duration: f32,
    pub obstacle_duration: f32,
}

impl Default for StunConfig {
    fn default() -> Self {
        Self {
            parry_duration: 2.5,
            obstacle_duration: 4.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArbitrationConfig {
    pub limbs: ResourceTimingConfig,
    pub plating: ResourceTimingConfig,
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        Self {
            limbs: ResourceTimingConfig::default(),
            plating: ResourceTimingConfig {
                deploy_seconds: Some(0.5),
                retract_seconds: Some(0.5),
                await_confirmation: true,
                auto_retract_delay: 4.0,
            },
        }
    }
}

/// Timing for one arbitrated resource.
///
/// With `await_confirmation` the animation layer's complete callback ends a
/// transition and the duration is only a fallback timeout. Without it the
/// duration alone governs and callbacks are treated as stale.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResourceTimingConfig {
    pub deploy_seconds: Option<f32>,
    pub retract_seconds: Option<f32>,
    pub await_confirmation: bool,
    pub auto_retract_delay: f32,
}

impl Default for ResourceTimingConfig {
    fn default() -> Self {
        Self {
            deploy_seconds: Some(0.8),
            retract_seconds: Some(0.8),
            await_confirmation: true,
            auto_retract_delay: 3.0,
        }
    }
}

/// Charge movement tuning. Windup timing comes from the ChargeDash
/// descriptor and its clip, like any other attack phase.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChargeConfig {
    /// Movement speed multiplier while dashing
    pub speed_multiplier: f32,
    /// Turn-rate multiplier for steerable charges (continuous correction)
    pub steerable_turn_multiplier: f32,
    /// Turn-rate multiplier for targeted charges (heading locked)
    pub targeted_turn_multiplier: f32,
    /// Targeted charges aim this far past the target (units)
    pub overshoot: f32,
    pub arrival_threshold: f32,
    pub safety_timeout: f32,
    /// Pause at the start point before turning (seconds)
    pub pause_seconds: f32,
    pub turn_timeout: f32,
    pub facing_tolerance_degrees: f32,
    /// Distance at which a segment start counts as reached
    pub start_tolerance: f32,
    /// Move-to-start speed ramps down inside this radius
    pub approach_slowdown_radius: f32,
    /// Give up walking to a segment start after this long (seconds)
    pub approach_timeout: f32,
    pub combos_per_cycle_min: u32,
    pub combos_per_cycle_max: u32,
    pub combos: Vec<ComboConfig>,
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 3.0,
            steerable_turn_multiplier: 4.0,
            targeted_turn_multiplier: 0.0,
            overshoot: 5.0,
            arrival_threshold: 1.0,
            safety_timeout: 4.0,
            pause_seconds: 0.4,
            turn_timeout: 1.5,
            facing_tolerance_degrees: 10.0,
            start_tolerance: 1.0,
            approach_slowdown_radius: 4.0,
            approach_timeout: 6.0,
            combos_per_cycle_min: 2,
            combos_per_cycle_max: 3,
            combos: vec![
                ComboConfig {
                    name: "cross".to_string(),
                    segments: vec![
                        SegmentConfig { start: [-15.0, 0.0, -15.0], end: [15.0, 0.0, 15.0] },
                        SegmentConfig { start: [15.0, 0.0, -15.0], end: [-15.0, 0.0, 15.0] },
                    ],
                },
                ComboConfig {
                    name: "sweep".to_string(),
                    segments: vec![
                        SegmentConfig { start: [-18.0, 0.0, 0.0], end: [18.0, 0.0, 0.0] },
                        SegmentConfig { start: [18.0, 0.0, 8.0], end: [-18.0, 0.0, 8.0] },
                        SegmentConfig { start: [-18.0, 0.0, -8.0], end: [18.0, 0.0, -8.0] },
                    ],
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    pub name: String,
    pub segments: Vec<SegmentConfig>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SegmentConfig {
    pub start: [f32; 3],
    pub end: [f32; 3],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SuctionConfig {
    pub base_strength: f32,
    pub max_strength: f32,
    /// Exponential smoothing time constant (seconds)
    pub ramp_time: f32,
    /// Distance at (and beyond) which the pull is at base strength
    pub falloff_distance: f32,
    pub arrived_radius: f32,
    pub repath_interval: f32,
    /// Clearance kept from obstacle edges when routing around them
    pub obstacle_margin: f32,
}

impl Default for SuctionConfig {
    fn default() -> Self {
        Self {
            base_strength: 8.0,
            max_strength: 18.0,
            ramp_time: 0.35,
            falloff_distance: 20.0,
            arrived_radius: 2.0,
            repath_interval: 0.5,
            obstacle_margin: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// After the active phase, wait this long for the zone report before
    /// declaring the attempt failed (seconds)
    pub zone_report_grace: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self { zone_report_grace: 0.5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub count: usize,
    pub health: f32,
    pub vulnerability_multiplier: f32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            count: 2,
            health: 150.0,
            vulnerability_multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub base_speed: f32,
    /// Radians per second
    pub base_turn_rate: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            base_speed: 5.0,
            base_turn_rate: std::f32::consts::PI,
        }
    }
}

impl EncounterConfig {
    /// Parse TOML and validate in one step.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EncounterConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolve().map(|_| ())
    }

    /// Validate and produce the runtime tuning.
    pub fn resolve(&self) -> Result<BossTuning, ConfigError> {
        let s = &self.selection;
        positive("selection.close_distance_duration", s.close_distance_duration)?;
        non_negative("selection.decision_interval", s.decision_interval)?;
        non_negative("selection.mount_grace_seconds", s.mount_grace_seconds)?;
        if s.threshold_min == 0 {
            return Err(ConfigError::NonPositive {
                field: "selection.threshold_min",
                value: 0.0,
            });
        }
        ordered("selection.threshold", s.threshold_min as f32, s.threshold_max as f32)?;

        positive("stun.parry_duration", self.stun.parry_duration)?;
        positive("stun.obstacle_duration", self.stun.obstacle_duration)?;

        let limbs = resolve_timing(BodyResource::Limbs, &self.arbitration.limbs)?;
        let plating = resolve_timing(BodyResource::Plating, &self.arbitration.plating)?;

        let c = &self.charge;
        positive("charge.speed_multiplier", c.speed_multiplier)?;
        positive("charge.arrival_threshold", c.arrival_threshold)?;
        positive("charge.safety_timeout", c.safety_timeout)?;
        positive("charge.turn_timeout", c.turn_timeout)?;
        positive("charge.approach_timeout", c.approach_timeout)?;
        positive("charge.start_tolerance", c.start_tolerance)?;
        non_negative("charge.pause_seconds", c.pause_seconds)?;
        non_negative("charge.overshoot", c.overshoot)?;
        ordered(
            "charge.combos_per_cycle",
            c.combos_per_cycle_min as f32,
            c.combos_per_cycle_max as f32,
        )?;

        let p = &self.suction;
        positive("suction.base_strength", p.base_strength)?;
        positive("suction.falloff_distance", p.falloff_distance)?;
        positive("suction.repath_interval", p.repath_interval)?;
        non_negative("suction.ramp_time", p.ramp_time)?;
        ordered("suction.strength", p.base_strength, p.max_strength)?;

        non_negative("transition.zone_report_grace", self.transition.zone_report_grace)?;
        positive("panels.health", self.panels.health)?;
        positive("movement.base_speed", self.movement.base_speed)?;
        positive("movement.base_turn_rate", self.movement.base_turn_rate)?;

        Ok(BossTuning {
            selection: self.selection.clone(),
            stun: self.stun.clone(),
            limbs,
            plating,
            charge: self.charge.clone(),
            suction: self.suction.clone(),
            transition: self.transition.clone(),
            panels: self.panels.clone(),
            movement: self.movement.clone(),
        })
    }
}

/// Resource timing after validation: every direction has a definite duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTiming {
    pub deploy_seconds: f32,
    pub retract_seconds: f32,
    pub await_confirmation: bool,
    pub auto_retract_delay: f32,
}

impl ResolvedTiming {
    pub fn duration(&self, direction: TransitionDirection) -> f32 {
        match direction {
            TransitionDirection::Deploy => self.deploy_seconds,
            TransitionDirection::Retract => self.retract_seconds,
        }
    }
}

/// Validated per-boss tuning (see `EncounterConfig::resolve`).
#[derive(Component, Debug, Clone)]
pub struct BossTuning {
    pub selection: SelectionConfig,
    pub stun: StunConfig,
    pub limbs: ResolvedTiming,
    pub plating: ResolvedTiming,
    pub charge: ChargeConfig,
    pub suction: SuctionConfig,
    pub transition: TransitionConfig,
    pub panels: PanelConfig,
    pub movement: MovementConfig,
}

impl BossTuning {
    pub fn timing(&self, resource: BodyResource) -> ResolvedTiming {
        match resource {
            BodyResource::Limbs => self.limbs,
            BodyResource::Plating => self.plating,
        }
    }
}

impl Default for BossTuning {
    fn default() -> Self {
        EncounterConfig::default()
            .resolve()
            .unwrap_or_else(|err| unreachable!("default encounter config is invalid: {err}"))
    }
}

fn resolve_timing(
    resource: BodyResource,
    config: &ResourceTimingConfig,
) -> Result<ResolvedTiming, ConfigError> {
    let deploy = definite(resource, TransitionDirection::Deploy, config.deploy_seconds)?;
    let retract = definite(resource, TransitionDirection::Retract, config.retract_seconds)?;
    positive("arbitration.auto_retract_delay", config.auto_retract_delay)?;

    Ok(ResolvedTiming {
        deploy_seconds: deploy,
        retract_seconds: retract,
        await_confirmation: config.await_confirmation,
        auto_retract_delay: config.auto_retract_delay,
    })
}

fn definite(
    resource: BodyResource,
    direction: TransitionDirection,
    seconds: Option<f32>,
) -> Result<f32, ConfigError> {
    match seconds {
        Some(value) if value > 0.0 => Ok(value),
        _ => Err(ConfigError::ArbitrationDeadlock { resource, direction }),
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { field, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EncounterConfig::default();
        assert!(config.validate().is_ok());

        let tuning = config.resolve().unwrap();
        assert_eq!(tuning.limbs.deploy_seconds, 0.8);
        assert!(tuning.plating.await_confirmation);
    }

    #[test]
    fn test_missing_fallback_is_deadlock() {
        let mut config = EncounterConfig::default();
        config.arbitration.plating.retract_seconds = None;

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ArbitrationDeadlock {
                resource: BodyResource::Plating,
                direction: TransitionDirection::Retract,
            }
        ));
    }

    #[test]
    fn test_inverted_threshold_rejected() {
        let mut config = EncounterConfig::default();
        config.selection.threshold_min = 12;
        config.selection.threshold_max = 4;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { field: "selection.threshold", .. })
        ));
    }

    #[test]
    fn test_suction_max_below_base_rejected() {
        let mut config = EncounterConfig::default();
        config.suction.max_strength = 2.0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_partial_override() {
        let source = r#"
            [selection]
            threshold_min = 10
            threshold_max = 10

            [arbitration.limbs]
            deploy_seconds = 1.2
            retract_seconds = 0.9
            await_confirmation = false
            auto_retract_delay = 3.0

            [[charge.combos]]
            name = "line"
            segments = [ { start = [0.0, 0.0, 0.0], end = [10.0, 0.0, 0.0] } ]
        "#;

        let config = EncounterConfig::from_toml_str(source).unwrap();
        assert_eq!(config.selection.threshold_min, 10);
        assert_eq!(config.arbitration.limbs.deploy_seconds, Some(1.2));
        assert!(!config.arbitration.limbs.await_confirmation);
        assert_eq!(config.charge.combos.len(), 1);
        // Не указанные секции берут defaults
        assert_eq!(config.stun.parry_duration, 2.5);
    }

    #[test]
    fn test_from_toml_reports_parse_error() {
        let result = EncounterConfig::from_toml_str("[selection]\nthreshold_min = \"ten\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
