//! Resource arbitration: limbs and defensive plating.
//!
//! Each resource is an independent deploy/retract state machine with
//! mutual exclusion between directions and a cancellable auto-retract
//! timer. Attack routines only ever *request* transitions and then await
//! the settled state; they never drive the state directly.

use bevy::prelude::*;

pub mod resource;
pub mod systems;


pub use resource::{
    ArbitratedResource, AutoRetractTimer, BodyResource, CompletionSource, RequestOutcome,
    ResourceEvent, ResourceState, TransitionDirection,
};
pub use systems::tick_body_resources;

use crate::config::BossTuning;
use crate::events::Outbox;

/// Both arbitrated resources of one boss. Owned by this subsystem.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct BodyResources {
    pub limbs: ArbitratedResource,
    pub plating: ArbitratedResource,
}

impl BodyResources {
    pub fn new(tuning: &BossTuning) -> Self {
        Self {
            limbs: ArbitratedResource::new(BodyResource::Limbs, tuning.limbs),
            plating: ArbitratedResource::new(BodyResource::Plating, tuning.plating),
        }
    }

    pub fn get(&self, resource: BodyResource) -> &ArbitratedResource {
        match resource {
            BodyResource::Limbs => &self.limbs,
            BodyResource::Plating => &self.plating,
        }
    }

    pub fn get_mut(&mut self, resource: BodyResource) -> &mut ArbitratedResource {
        match resource {
            BodyResource::Limbs => &mut self.limbs,
            BodyResource::Plating => &mut self.plating,
        }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ArbitratedResource> {
        [&mut self.limbs, &mut self.plating].into_iter()
    }

    /// Any new attack start cancels pending idle timers.
    pub fn cancel_auto_retracts(&mut self) {
        for resource in self.iter_mut() {
            resource.cancel_auto_retract();
        }
    }

    /// Re-arm idle timers for everything left deployed or still deploying
    /// (stun exit). A deploy that lands later arms its timer on completion.
    pub fn rearm_deployed(&mut self) {
        for resource in self.iter_mut() {
            resource.arm_auto_retract_once_deployed();
        }
    }

    /// Move every resource toward its neutral (retracted) state.
    pub fn force_neutral(&mut self) {
        for resource in self.iter_mut() {
            resource.cancel_auto_retract();
            resource.request_retract();
        }
    }

    /// Drain journals into log lines and outbound animation triggers.
    pub fn flush(&mut self, outbox: &mut Outbox) {
        for resource in self.iter_mut() {
            for event in resource.drain_events() {
                report(&event, outbox);
            }
        }
    }
}

impl Default for BodyResources {
    fn default() -> Self {
        Self::new(&BossTuning::default())
    }
}

fn report(event: &ResourceEvent, outbox: &mut Outbox) {
    if let Some(name) = event.trigger_name() {
        outbox.trigger(name);
    }

    match event {
        ResourceEvent::Started { resource, direction } => {
            crate::log(&format!("🦾 {:?}: {:?} started ({:?})", resource, direction, outbox.boss()));
        }
        ResourceEvent::Completed {
            resource,
            direction,
            source: CompletionSource::Timeout,
        } => {
            crate::log_warning(&format!(
                "⏱️ {:?}: {:?} confirmation never arrived, completed by fallback timeout ({:?})",
                resource,
                direction,
                outbox.boss()
            ));
        }
        ResourceEvent::Completed { resource, direction, .. } => {
            crate::log(&format!("✅ {:?}: {:?} complete ({:?})", resource, direction, outbox.boss()));
        }
        ResourceEvent::AutoRetractArmed { resource, delay } => {
            crate::log(&format!("⏲️ {:?}: auto-retract armed ({:.1}s)", resource, delay));
        }
        ResourceEvent::AutoRetractCancelled { resource } => {
            crate::log(&format!("🚫 {:?}: auto-retract cancelled", resource));
        }
        ResourceEvent::AutoRetractFired { resource } => {
            crate::log_info(&format!("⏲️ {:?}: idle too long → auto-retract", resource));
        }
        ResourceEvent::StaleConfirmation { resource, direction } => {
            crate::log(&format!(
                "🔁 {:?}: stale {:?} confirmation ignored ({:?})",
                resource,
                direction,
                outbox.boss()
            ));
        }
    }
}
