//! Clip-length lookup (animation collaborator, pure query).

use std::collections::HashMap;

use bevy::prelude::*;

/// Clip lengths reported by the animation layer, in seconds.
///
/// Filled by the engine bridge at load time. Missing clips are not an
/// error: phase timing falls back to the catalog's base lengths.
#[derive(Resource, Debug, Clone, Default)]
pub struct AnimationClips {
    lengths: HashMap<String, f32>,
}

impl AnimationClips {
    pub fn insert(&mut self, clip: impl Into<String>, seconds: f32) {
        self.lengths.insert(clip.into(), seconds);
    }

    pub fn clip_length(&self, clip: &str) -> Option<f32> {
        self.lengths.get(clip).copied().filter(|s| *s > 0.0)
    }
}
