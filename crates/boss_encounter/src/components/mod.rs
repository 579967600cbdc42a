//! ECS Components для энкаунтера
//!
//! Организация по доменам:
//! - boss: маркер босса, цель, side panels, Defeated
//! - combat: активные hitbox'ы (HitDetection)
//! - movement: команды и ручки перемещения (MovementCommand, MovementTuning)
//! - world: геометрия арены (ArenaObstacles)
//!
//! Owned state подсистем (FormState, BodyResources, StunState, …) живёт в
//! модулях своих владельцев.

pub mod boss;
pub mod combat;
pub mod movement;
pub mod world;

// Re-exports для удобного импорта
pub use boss::*;
pub use combat::*;
pub use movement::*;
pub use world::*;
