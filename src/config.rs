//! Configuration records for arms, primitives and scenes.
//!
//! These are plain, already-validated data handed in by the caller; their
//! defaults follow the stock arm (six unit links, ±150° joints) and a
//! 10 ms physics step. Constructors reject only the shapes they cannot use.

use crate::error::{Result, SceneError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One value shared by every joint, or one value per joint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerJoint<T> {
    Uniform(T),
    Each(Vec<T>),
}

impl<T: Clone> PerJoint<T> {
    /// Expands to exactly `n` values.
    pub fn resolve(&self, n: usize, what: &str) -> Result<Vec<T>> {
        match self {
            Self::Uniform(v) => Ok(vec![v.clone(); n]),
            Self::Each(values) if values.len() == n => Ok(values.clone()),
            Self::Each(values) => Err(SceneError::invalid_config(format!(
                "expected {n} {what}, got {}",
                values.len()
            ))),
        }
    }
}

/// Geometry and behaviour of a serial planar arm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// Number of joints.
    pub dim: usize,
    /// Joint limits in degrees.
    pub limits: PerJoint<(f64, f64)>,
    /// Link lengths.
    pub lengths: PerJoint<f64>,
    /// `(x, y, heading)` of the arm base.
    pub arm_origin: [f64; 3],
    /// Treat self-collision as a non-executable order.
    pub collision_fail: bool,
    /// Seed for a one-time shuffle of the motor map; `None` keeps it identity.
    pub motor_seed: Option<u64>,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            dim: 6,
            limits: PerJoint::Uniform((-150.0, 150.0)),
            lengths: PerJoint::Uniform(1.0),
            arm_origin: [0.0, 0.0, 0.0],
            collision_fail: false,
            motor_seed: None,
        }
    }
}

/// Layout of the synergy channels of a synergy arm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynergyConfig {
    /// Number of consecutive joints one synergy touches.
    pub syn_span: usize,
    /// Joint stride between two synergies.
    pub syn_res: usize,
}

impl Default for SynergyConfig {
    fn default() -> Self {
        Self {
            syn_span: 5,
            syn_res: 5,
        }
    }
}

/// A serial arm driven through joint and synergy channels.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynergyArmConfig {
    pub arm: ArmConfig,
    pub synergy: SynergyConfig,
}

/// Parameters of a motor primitive, selected by `name` in a
/// [`PrimitiveRegistry`](crate::motor::PrimitiveRegistry).
///
/// `dmp_sharedwidth` reads `dt`, `traj_end`, `target_end`, `n_basis`,
/// `init_states`, `target_states` and `angle_ranges`; `motorsteps` reads
/// `limits`, `init_pos` and `angular_step`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorPrimitiveConfig {
    pub name: String,
    pub dt: f64,
    /// Number of trajectory samples (rounded down to even).
    pub traj_end: usize,
    /// Sample at which the primitive's time constant elapses.
    pub target_end: usize,
    pub n_basis: usize,
    /// Initial angle of every degree of freedom, in degrees.
    pub init_states: Vec<f64>,
    /// Attractor angle of every degree of freedom, in degrees.
    pub target_states: Vec<f64>,
    /// Symmetric `(-r, r)` range of every degree of freedom, in degrees.
    pub angle_ranges: Vec<(f64, f64)>,
    pub limits: PerJoint<(f64, f64)>,
    pub init_pos: Vec<f64>,
    /// Angular distance covered per step, in degrees.
    pub angular_step: f64,
}

impl Default for MotorPrimitiveConfig {
    fn default() -> Self {
        Self {
            name: "dmp_sharedwidth".to_string(),
            dt: 0.01,
            traj_end: 1000,
            target_end: 500,
            n_basis: 2,
            init_states: Vec::new(),
            target_states: Vec::new(),
            angle_ranges: Vec::new(),
            limits: PerJoint::Uniform((-150.0, 150.0)),
            init_pos: Vec::new(),
            angular_step: 1.0,
        }
    }
}

/// The kinematic body that follows the arm's end effector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TipConfig {
    pub radius: f64,
    pub mass: f64,
}

impl Default for TipConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            mass: 1.0,
        }
    }
}

/// A free ball placed in the scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    pub radius: f64,
    /// Explicit mass; takes precedence over `density`.
    #[serde(default)]
    pub mass: Option<f64>,
    /// Areal density used to derive the mass from the radius.
    #[serde(default)]
    pub density: Option<f64>,
    pub pos: [f64; 2],
    /// Report this object's displacement instead of the tip's.
    #[serde(default)]
    pub track: bool,
    #[serde(default)]
    pub friction: f64,
}

/// Arena limits, shared by the physics world and the displacement channels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorLimits {
    pub x_limits: (f64, f64),
    pub y_limits: (f64, f64),
}

impl Default for SensorLimits {
    fn default() -> Self {
        Self {
            x_limits: (-1000.0, 1000.0),
            y_limits: (-1000.0, 1000.0),
        }
    }
}

/// An arm, a tip body and free objects stepped along a motor primitive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub arm: ArmConfig,
    /// Physics step, in seconds.
    pub dt: f64,
    pub tip: TipConfig,
    pub objects: BTreeMap<String, ObjectConfig>,
    pub mprims: MotorPrimitiveConfig,
    pub s_prims: SensorLimits,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            arm: ArmConfig::default(),
            dt: 0.01,
            tip: TipConfig::default(),
            objects: BTreeMap::new(),
            mprims: MotorPrimitiveConfig::default(),
            s_prims: SensorLimits::default(),
        }
    }
}

/// Selects and parameterises one environment variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "classname")]
pub enum EnvironmentConfig {
    KinematicArm2D(ArmConfig),
    KinArmSynergies2D(SynergyArmConfig),
    KinScene2D(SceneConfig),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_joint_resolution() {
        assert_eq!(PerJoint::Uniform(1.5).resolve(3, "lengths").unwrap(), vec![1.5; 3]);
        assert_eq!(
            PerJoint::Each(vec![1.0, 2.0]).resolve(2, "lengths").unwrap(),
            vec![1.0, 2.0]
        );
        assert!(PerJoint::Each(vec![1.0]).resolve(2, "lengths").is_err());
    }

    #[test]
    fn test_defaults() {
        let arm = ArmConfig::default();
        assert_eq!(arm.dim, 6);
        assert!(!arm.collision_fail);
        let scene = SceneConfig::default();
        assert_eq!(scene.dt, 0.01);
        assert_eq!(scene.mprims.name, "dmp_sharedwidth");
        assert_eq!(scene.s_prims.x_limits, (-1000.0, 1000.0));
    }
}
