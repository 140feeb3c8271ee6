//! Rigid-body physics
//!
//! A discrete solver on top of the spatial indices: bodies wrap a bounding
//! volume plus linear/angular state, and each `solve` call integrates
//! forces, asks the index for candidate pairs, resolves penetrations with
//! damped impulses, and keeps everything inside the world bound.

pub mod body;
pub mod layers;
pub mod simulation;

pub use body::{Body, BodyFlags, BodyId};
pub use layers::CollisionLayers;
pub use simulation::{PhysicsError, Simulation};
