//! The environment execution contract and the variant factory.

use crate::channel::{Channel, Signal};
use crate::config::EnvironmentConfig;
use crate::error::Result;
use crate::kinarm::{KinArmSynergies2D, KinematicArm2D};
use crate::motor::PrimitiveRegistry;
use crate::physics::CollisionEvent;
use crate::scene::KinScene2D;
use crate::sensory::RawSensors;
use tracing::info;
use uuid::Uuid;

/// Result of one [`Environment::execute`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct Feedback {
    pub s_signal: Signal,
    /// Fresh per call; only meant for external correlation.
    pub uuid: Uuid,
}

/// Optional side channel filled in by an execution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExecutionMeta {
    /// The motor signal as received.
    pub m_signal: Option<Signal>,
    /// Position traces recorded by a physics scene.
    pub raw_sensors: Option<RawSensors>,
    /// Contacts resolved by a physics scene, in order.
    pub collisions: Vec<CollisionEvent>,
}

/// A system that maps motor signals to sensory signals.
///
/// Callers format signals against [`m_channels`](Self::m_channels); only the
/// presence of every channel is checked, not its range.
pub trait Environment {
    fn m_channels(&self) -> &[Channel];

    fn s_channels(&self) -> &[Channel];

    /// Computes the sensory signal for `m_signal`.
    fn execute_signal(&self, m_signal: &Signal, meta: Option<&mut ExecutionMeta>) -> Result<Signal>;

    /// Runs [`execute_signal`](Self::execute_signal) and tags the result.
    fn execute(&self, m_signal: &Signal, meta: Option<&mut ExecutionMeta>) -> Result<Feedback> {
        let s_signal = self.execute_signal(m_signal, meta)?;
        Ok(Feedback {
            s_signal,
            uuid: Uuid::new_v4(),
        })
    }
}

/// Builds the environment variant selected by `cfg`.
pub fn create_environment(
    cfg: &EnvironmentConfig,
    registry: &PrimitiveRegistry,
) -> Result<Box<dyn Environment>> {
    let env: Box<dyn Environment> = match cfg {
        EnvironmentConfig::KinematicArm2D(arm) => Box::new(KinematicArm2D::new(arm)?),
        EnvironmentConfig::KinArmSynergies2D(syn) => Box::new(KinArmSynergies2D::new(syn)?),
        EnvironmentConfig::KinScene2D(scene) => Box::new(KinScene2D::new(scene, registry)?),
    };
    info!(
        m_channels = env.m_channels().len(),
        s_channels = env.s_channels().len(),
        "environment created"
    );
    Ok(env)
}
