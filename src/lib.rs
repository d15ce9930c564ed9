//! # kinscene
//!
//! A deterministic 2D robotic-arm simulation core.
//!
//! Control parameters flow one way through the crate: a motor primitive turns
//! a compact motor [`Signal`] into a trajectory of joint-angle vectors, a
//! [`KinematicChain`] turns each vector into link positions, and a fixed-step
//! [`World`] of circular bodies lets the arm's tip push objects around. The
//! final positions are projected back into a sensory [`Signal`].
//!
//! Environments are chosen explicitly through an [`EnvironmentConfig`] and
//! built with [`create_environment`], using a [`PrimitiveRegistry`] owned by
//! the caller. Given the same configuration (including any motor-map seed) and
//! the same motor signal, an execution always produces the same sensory signal
//! and collision log.

pub mod chain;
pub mod channel;
pub mod collision;
pub mod config;
pub mod dmp;
pub mod environment;
pub mod error;
pub mod kinarm;
pub mod motor;
pub mod physics;
pub mod scene;
pub mod sensory;
pub mod turtle;

pub use chain::*;
pub use channel::{Channel, Signal};
pub use collision::{Segment, polyline_self_intersects, segments_intersect};
pub use config::*;
pub use environment::*;
pub use error::{Result, SceneError};
pub use kinarm::*;
pub use motor::*;
pub use physics::*;
pub use scene::*;
pub use sensory::*;
pub use turtle::*;
