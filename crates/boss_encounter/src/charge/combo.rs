//! Charge combos: ordered lists of start→end segments.
//!
//! Per segment: move to start (slowing down on approach) → pause →
//! turn in place toward the end → steerable charge.
//! Invalid or unreachable segments are skipped with a warning; the combo
//! carries on with the next one. A stun abandons the whole combo (the
//! controller drops the routine).

use bevy::prelude::*;

use crate::charge::ChargeExecution;
use crate::components::{angle_between, planar_distance, MovementCommand};
use crate::config::{ComboConfig, SegmentConfig};
use crate::events::Outbox;
use crate::form::{BossParts, TickContext};

/// Минимальная длина сегмента
const MIN_SEGMENT_LENGTH: f32 = 0.5;
/// Нижняя граница скорости подхода к старту
const MIN_APPROACH_SCALE: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeSegment {
    pub start: Vec3,
    pub end: Vec3,
}

impl ChargeSegment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_finite()
            && self.end.is_finite()
            && planar_distance(self.start, self.end) >= MIN_SEGMENT_LENGTH
    }
}

impl From<&SegmentConfig> for ChargeSegment {
    fn from(config: &SegmentConfig) -> Self {
        Self::new(Vec3::from_array(config.start), Vec3::from_array(config.end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentStep {
    MoveToStart { elapsed: f32 },
    Pause { remaining: f32 },
    Turn { elapsed: f32 },
    Charge(ChargeExecution),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRun {
    pub segment: ChargeSegment,
    pub step: SegmentStep,
}

enum SegmentProgress {
    Running,
    Done,
    Skipped(&'static str),
}

impl SegmentRun {
    fn new(segment: ChargeSegment, ctx: &TickContext) -> Self {
        let config = &ctx.tuning.charge;
        let step = if planar_distance(ctx.position, segment.start) <= config.start_tolerance {
            SegmentStep::Pause {
                remaining: config.pause_seconds,
            }
        } else {
            SegmentStep::MoveToStart { elapsed: 0.0 }
        };
        Self { segment, step }
    }

    fn advance(
        &mut self,
        parts: &mut BossParts,
        ctx: &TickContext,
        outbox: &mut Outbox,
    ) -> SegmentProgress {
        let config = &ctx.tuning.charge;

        match &mut self.step {
            SegmentStep::MoveToStart { elapsed } => {
                // Навигация отвечает за предыдущую цель на первом тике
                if *elapsed > 0.0 && !ctx.has_valid_path {
                    *parts.command = MovementCommand::Stop;
                    return SegmentProgress::Skipped("segment start unreachable");
                }
                *elapsed += ctx.delta;

                let distance = planar_distance(ctx.position, self.segment.start);
                if distance <= config.start_tolerance {
                    *parts.command = MovementCommand::Stop;
                    self.step = SegmentStep::Pause {
                        remaining: config.pause_seconds,
                    };
                } else if *elapsed >= config.approach_timeout {
                    *parts.command = MovementCommand::Stop;
                    return SegmentProgress::Skipped("approach to segment start timed out");
                } else {
                    let speed_scale = (distance / config.approach_slowdown_radius.max(f32::EPSILON))
                        .clamp(MIN_APPROACH_SCALE, 1.0);
                    *parts.command = MovementCommand::MoveToPosition {
                        target: self.segment.start,
                        speed_scale,
                    };
                }
                SegmentProgress::Running
            }
            SegmentStep::Pause { remaining } => {
                *remaining -= ctx.delta;
                if *remaining <= 0.0 {
                    self.step = SegmentStep::Turn { elapsed: 0.0 };
                }
                SegmentProgress::Running
            }
            SegmentStep::Turn { elapsed } => {
                *elapsed += ctx.delta;
                *parts.command = MovementCommand::FaceTowards {
                    point: self.segment.end,
                };

                let off_angle = angle_between(ctx.facing, self.segment.end - ctx.position);
                let aligned = off_angle <= config.facing_tolerance_degrees.to_radians();
                if aligned || *elapsed >= config.turn_timeout {
                    if !aligned {
                        crate::log_warning(&format!(
                            "↪️ {:?}: turn timed out {:.0}° off, charging anyway",
                            ctx.boss,
                            off_angle.to_degrees()
                        ));
                    }
                    let charge = ChargeExecution::steerable(self.segment.end, parts, ctx, outbox);
                    self.step = SegmentStep::Charge(charge);
                }
                SegmentProgress::Running
            }
            SegmentStep::Charge(charge) => match charge.advance(parts, ctx, outbox) {
                Some(_) => SegmentProgress::Done,
                None => SegmentProgress::Running,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboProgress {
    Running,
    Finished,
}

/// Resumable combo routine.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboRoutine {
    pub name: String,
    segments: Vec<ChargeSegment>,
    next_index: usize,
    current: Option<SegmentRun>,
}

impl ComboRoutine {
    pub fn new(name: impl Into<String>, segments: Vec<ChargeSegment>) -> Self {
        Self {
            name: name.into(),
            segments,
            next_index: 0,
            current: None,
        }
    }

    pub fn from_config(config: &ComboConfig) -> Self {
        Self::new(
            config.name.clone(),
            config.segments.iter().map(ChargeSegment::from).collect(),
        )
    }

    pub fn current(&self) -> Option<&SegmentRun> {
        self.current.as_ref()
    }

    /// Segments not yet started (excluding the current one).
    pub fn remaining_segments(&self) -> usize {
        self.segments.len().saturating_sub(self.next_index)
    }

    pub fn advance(
        &mut self,
        parts: &mut BossParts,
        ctx: &TickContext,
        outbox: &mut Outbox,
    ) -> ComboProgress {
        loop {
            if self.current.is_none() {
                let Some(segment) = self.segments.get(self.next_index).copied() else {
                    return ComboProgress::Finished;
                };
                self.next_index += 1;

                if !segment.is_valid() {
                    crate::log_warning(&format!(
                        "⚠️ combo '{}': segment {} invalid ({:?} → {:?}), skipped",
                        self.name,
                        self.next_index - 1,
                        segment.start,
                        segment.end
                    ));
                    continue;
                }
                self.current = Some(SegmentRun::new(segment, ctx));
            }

            let Some(run) = self.current.as_mut() else {
                continue;
            };

            match run.advance(parts, ctx, outbox) {
                SegmentProgress::Running => return ComboProgress::Running,
                SegmentProgress::Done => {
                    self.current = None;
                    return ComboProgress::Running;
                }
                SegmentProgress::Skipped(reason) => {
                    crate::log_warning(&format!(
                        "⚠️ combo '{}': segment {} skipped ({})",
                        self.name,
                        self.next_index - 1,
                        reason
                    ));
                    self.current = None;
                }
            }
        }
    }
}
