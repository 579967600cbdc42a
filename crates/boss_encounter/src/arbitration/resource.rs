//! One arbitrated binary body resource (limbs or plating).
//!
//! State machine:
//!
//! ```text
//! Retracted ──deploy──▶ Deploying ──complete──▶ Deployed
//!     ▲                                            │
//!     └──complete── Retracting ◀──retract──────────┘
//! ```
//!
//! A request against the opposite in-flight direction is queued and started
//! only after the in-flight transition completes. An in-flight transition is
//! never aborted.

use bevy::prelude::*;

use crate::config::ResolvedTiming;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum BodyResource {
    Limbs,
    Plating,
}

impl BodyResource {
    pub fn clip_stem(self) -> &'static str {
        match self {
            BodyResource::Limbs => "limbs",
            BodyResource::Plating => "plating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum TransitionDirection {
    Deploy,
    Retract,
}

impl TransitionDirection {
    pub fn opposite(self) -> Self {
        match self {
            TransitionDirection::Deploy => TransitionDirection::Retract,
            TransitionDirection::Retract => TransitionDirection::Deploy,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            TransitionDirection::Deploy => "deploy",
            TransitionDirection::Retract => "retract",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum ResourceState {
    #[default]
    Retracted,
    Deploying,
    Deployed,
    Retracting,
}

impl ResourceState {
    pub fn in_flight(self) -> Option<TransitionDirection> {
        match self {
            ResourceState::Deploying => Some(TransitionDirection::Deploy),
            ResourceState::Retracting => Some(TransitionDirection::Retract),
            _ => None,
        }
    }

    fn settled_for(direction: TransitionDirection) -> Self {
        match direction {
            TransitionDirection::Deploy => ResourceState::Deployed,
            TransitionDirection::Retract => ResourceState::Retracted,
        }
    }

    fn moving_for(direction: TransitionDirection) -> Self {
        match direction {
            TransitionDirection::Deploy => ResourceState::Deploying,
            TransitionDirection::Retract => ResourceState::Retracting,
        }
    }
}

/// What a request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Already in the requested end state; nothing to do
    AlreadySettled,
    /// Transition started now
    Started,
    /// Same direction already in flight; caller awaits the same completion
    Joined,
    /// Opposite direction in flight; starts once it completes
    Queued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    Confirmed,
    /// Fallback duration elapsed without a confirmation
    Timeout,
    /// Timed mode: the fixed duration is the completion
    Elapsed,
}

/// Journal entries, drained by the owner after every mutation batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResourceEvent {
    Started {
        resource: BodyResource,
        direction: TransitionDirection,
    },
    Completed {
        resource: BodyResource,
        direction: TransitionDirection,
        source: CompletionSource,
    },
    AutoRetractArmed {
        resource: BodyResource,
        delay: f32,
    },
    AutoRetractCancelled {
        resource: BodyResource,
    },
    AutoRetractFired {
        resource: BodyResource,
    },
    StaleConfirmation {
        resource: BodyResource,
        direction: TransitionDirection,
    },
}

impl ResourceEvent {
    /// Animation trigger name for events that drive a visual.
    pub fn trigger_name(&self) -> Option<String> {
        match self {
            ResourceEvent::Started { resource, direction } => {
                Some(format!("{}_{}", resource.clip_stem(), direction.as_str()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct InFlight {
    direction: TransitionDirection,
    elapsed: f32,
}

/// Pending "retract after idle" timer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoRetractTimer {
    pub remaining: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArbitratedResource {
    kind: BodyResource,
    state: ResourceState,
    timing: ResolvedTiming,
    in_flight: Option<InFlight>,
    queued: Option<TransitionDirection>,
    cancel_requested: bool,
    auto_retract: Option<AutoRetractTimer>,
    /// Deploy still in flight with nobody owning it: arm the idle timer on completion
    arm_on_deploy: bool,
    journal: Vec<ResourceEvent>,
}

impl ArbitratedResource {
    pub fn new(kind: BodyResource, timing: ResolvedTiming) -> Self {
        Self {
            kind,
            state: ResourceState::Retracted,
            timing,
            in_flight: None,
            queued: None,
            cancel_requested: false,
            auto_retract: None,
            arm_on_deploy: false,
            journal: Vec::new(),
        }
    }

    pub fn kind(&self) -> BodyResource {
        self.kind
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn queued(&self) -> Option<TransitionDirection> {
        self.queued
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub fn auto_retract(&self) -> Option<AutoRetractTimer> {
        self.auto_retract
    }

    pub fn arm_on_deploy(&self) -> bool {
        self.arm_on_deploy
    }

    pub fn is_deployed(&self) -> bool {
        self.state == ResourceState::Deployed
    }

    pub fn is_retracted(&self) -> bool {
        self.state == ResourceState::Retracted
    }

    pub fn request_deploy(&mut self) -> RequestOutcome {
        self.request(TransitionDirection::Deploy)
    }

    pub fn request_retract(&mut self) -> RequestOutcome {
        self.request(TransitionDirection::Retract)
    }

    pub fn request(&mut self, direction: TransitionDirection) -> RequestOutcome {
        match self.in_flight {
            Some(flight) if flight.direction == direction => {
                // Последний запрос побеждает: отменяем очередь в обратную сторону
                self.queued = None;
                RequestOutcome::Joined
            }
            Some(_) => {
                self.queued = Some(direction);
                RequestOutcome::Queued
            }
            None if self.state == ResourceState::settled_for(direction) => {
                RequestOutcome::AlreadySettled
            }
            None => {
                self.start(direction);
                RequestOutcome::Started
            }
        }
    }

    /// External "operation complete" callback.
    ///
    /// Ignored (journalled as stale) unless the same direction is in flight
    /// and this resource waits for confirmations.
    pub fn confirm(&mut self, direction: TransitionDirection) -> bool {
        let matches = self
            .in_flight
            .is_some_and(|flight| flight.direction == direction);

        if !matches || !self.timing.await_confirmation {
            self.journal.push(ResourceEvent::StaleConfirmation {
                resource: self.kind,
                direction,
            });
            return false;
        }

        self.complete(CompletionSource::Confirmed);
        true
    }

    /// Advance the in-flight transition and the auto-retract timer.
    pub fn tick(&mut self, delta: f32) {
        if let Some(flight) = self.in_flight.as_mut() {
            flight.elapsed += delta;
            if flight.elapsed >= self.timing.duration(flight.direction) {
                let source = if self.timing.await_confirmation {
                    CompletionSource::Timeout
                } else {
                    CompletionSource::Elapsed
                };
                self.complete(source);
            }
        }

        self.tick_auto_retract(delta);
    }

    /// Arm the idle timer; only meaningful while Deployed.
    pub fn arm_auto_retract(&mut self) {
        if self.state != ResourceState::Deployed {
            return;
        }
        let delay = self.timing.auto_retract_delay;
        self.cancel_requested = false;
        self.auto_retract = Some(AutoRetractTimer { remaining: delay });
        self.journal.push(ResourceEvent::AutoRetractArmed {
            resource: self.kind,
            delay,
        });
    }

    /// Arm the idle timer now if Deployed, or as soon as a pending deploy
    /// lands. No-op while retracting or retracted.
    pub fn arm_auto_retract_once_deployed(&mut self) {
        if self.state == ResourceState::Deployed {
            if self.auto_retract.is_none() {
                self.arm_auto_retract();
            }
            return;
        }
        let deploy_pending = self
            .in_flight
            .is_some_and(|flight| flight.direction == TransitionDirection::Deploy)
            || self.queued == Some(TransitionDirection::Deploy);
        if deploy_pending {
            self.arm_on_deploy = true;
        }
    }

    /// Flag a pending auto-retract as cancelled. The timer notices on its
    /// next check and exits without acting. In-flight transitions are untouched.
    pub fn cancel_auto_retract(&mut self) {
        // Ресурс снова принадлежит атаке
        self.arm_on_deploy = false;
        if self.auto_retract.is_some() {
            self.cancel_requested = true;
        }
    }

    pub fn drain_events(&mut self) -> Vec<ResourceEvent> {
        std::mem::take(&mut self.journal)
    }

    fn start(&mut self, direction: TransitionDirection) {
        self.state = ResourceState::moving_for(direction);
        self.in_flight = Some(InFlight {
            direction,
            elapsed: 0.0,
        });
        // Любое движение ресурса делает idle-таймер бессмысленным
        self.auto_retract = None;
        self.cancel_requested = false;
        if direction == TransitionDirection::Retract {
            self.arm_on_deploy = false;
        }
        self.journal.push(ResourceEvent::Started {
            resource: self.kind,
            direction,
        });
    }

    fn complete(&mut self, source: CompletionSource) {
        let Some(flight) = self.in_flight.take() else {
            return;
        };
        self.state = ResourceState::settled_for(flight.direction);
        self.journal.push(ResourceEvent::Completed {
            resource: self.kind,
            direction: flight.direction,
            source,
        });

        if let Some(next) = self.queued.take() {
            if self.state != ResourceState::settled_for(next) {
                self.start(next);
            }
        }

        if self.arm_on_deploy && self.in_flight.is_none() && self.state == ResourceState::Deployed {
            self.arm_on_deploy = false;
            self.arm_auto_retract();
        }
    }

    fn tick_auto_retract(&mut self, delta: f32) {
        let Some(timer) = self.auto_retract.as_mut() else {
            return;
        };

        // Проверка флага во время ожидания
        if self.cancel_requested {
            self.exit_cancelled();
            return;
        }

        timer.remaining -= delta;
        if timer.remaining > 0.0 {
            return;
        }

        // И повторно непосредственно перед действием
        if self.cancel_requested || self.state != ResourceState::Deployed {
            self.exit_cancelled();
            return;
        }

        self.auto_retract = None;
        self.journal.push(ResourceEvent::AutoRetractFired {
            resource: self.kind,
        });
        self.request(TransitionDirection::Retract);
    }

    fn exit_cancelled(&mut self) {
        self.auto_retract = None;
        self.cancel_requested = false;
        self.journal.push(ResourceEvent::AutoRetractCancelled {
            resource: self.kind,
        });
    }
}
