//! Kinematic arm environments: forward kinematics without physics.

use crate::chain::{ChainPose, KinematicChain, MotorMap};
use crate::channel::{self, Channel, Signal};
use crate::config::{ArmConfig, SynergyArmConfig, SynergyConfig};
use crate::environment::{Environment, ExecutionMeta};
use crate::error::{Result, SceneError};
use crate::turtle::ArmTurtle;
use tracing::warn;

/// A serial planar arm reporting its end-effector position.
///
/// Motor channels are `j0..j{dim-1}` (degrees); sensory channels are `x` and
/// `y`, bounded by the total arm length.
#[derive(Clone, Debug)]
pub struct KinematicArm2D {
    chain: KinematicChain,
    lengths: Vec<f64>,
    collision_fail: bool,
    m_channels: Vec<Channel>,
    s_channels: Vec<Channel>,
}

impl KinematicArm2D {
    pub fn new(cfg: &ArmConfig) -> Result<Self> {
        if cfg.dim == 0 {
            return Err(SceneError::invalid_config("arm needs at least one joint"));
        }
        let lengths = cfg.lengths.resolve(cfg.dim, "lengths")?;
        let limits = cfg.limits.resolve(cfg.dim, "joint limits")?;
        let motor_map = match cfg.motor_seed {
            Some(seed) => MotorMap::shuffled(cfg.dim, seed),
            None => MotorMap::identity(cfg.dim),
        };
        let chain = KinematicChain::serial(
            &lengths,
            &limits,
            ArmTurtle::from_origin(cfg.arm_origin),
            motor_map,
        )?;

        // Motor m drives the joint k with permutation[k] == m.
        let joint_limits = chain.joint_limits();
        let mut motor_limits = joint_limits.clone();
        for (k, &m) in chain.motor_map().as_slice().iter().enumerate() {
            motor_limits[m] = joint_limits[k];
        }
        let m_channels = motor_limits
            .into_iter()
            .enumerate()
            .map(|(i, bounds)| Channel::new(format!("j{i}"), bounds).with_unit("deg"))
            .collect();

        let reach: f64 = lengths.iter().sum();
        let s_channels = vec![
            Channel::new("x", (-reach, reach)),
            Channel::new("y", (-reach, reach)),
        ];

        Ok(Self {
            chain,
            lengths,
            collision_fail: cfg.collision_fail,
            m_channels,
            s_channels,
        })
    }

    pub fn chain(&self) -> &KinematicChain {
        &self.chain
    }

    pub fn dim(&self) -> usize {
        self.chain.len()
    }

    pub fn lengths(&self) -> &[f64] {
        &self.lengths
    }

    /// Forward kinematics for a motor-ordered angle vector.
    ///
    /// Fails with [`SceneError::OrderNotExecutable`] when the arm crosses
    /// itself and `collision_fail` is set.
    pub fn pose(&self, motor_angles: &[f64]) -> Result<ChainPose> {
        let pose = self.chain.forward_kinematics(motor_angles)?;
        if self.collision_fail && pose.self_collides() {
            warn!(?motor_angles, "self-collision in 2D arm");
            return Err(SceneError::order_not_executable("collision detected in 2D arm"));
        }
        Ok(pose)
    }

    fn tip_signal(&self, pose: &ChainPose) -> Result<Signal> {
        let tip = pose.end_effector();
        channel::to_signal(&[tip.x, tip.y], &self.s_channels)
    }
}

impl Environment for KinematicArm2D {
    fn m_channels(&self) -> &[Channel] {
        &self.m_channels
    }

    fn s_channels(&self) -> &[Channel] {
        &self.s_channels
    }

    fn execute_signal(&self, m_signal: &Signal, meta: Option<&mut ExecutionMeta>) -> Result<Signal> {
        if let Some(meta) = meta {
            meta.m_signal = Some(m_signal.clone());
        }
        let m_vector = channel::to_vector(m_signal, &self.m_channels)?;
        let pose = self.pose(&m_vector)?;
        self.tip_signal(&pose)
    }
}

/// A [`KinematicArm2D`] with additional synergy channels.
///
/// Synergy `s{i}` takes a value in `[0, 1]`, restored into the bounds of each
/// of the `syn_span` joints starting at `i`; every joint then averages its own
/// command with the synergies covering it.
#[derive(Clone, Debug)]
pub struct KinArmSynergies2D {
    arm: KinematicArm2D,
    synergy: SynergyConfig,
    m_channels: Vec<Channel>,
}

impl KinArmSynergies2D {
    pub fn new(cfg: &SynergyArmConfig) -> Result<Self> {
        if cfg.synergy.syn_res == 0 {
            return Err(SceneError::invalid_config("syn_res must be positive"));
        }
        let arm = KinematicArm2D::new(&cfg.arm)?;
        let mut m_channels = arm.m_channels.clone();
        m_channels.extend(
            (0..arm.dim())
                .step_by(cfg.synergy.syn_res)
                .map(|i| Channel::new(format!("s{i}"), (0.0, 1.0))),
        );
        Ok(Self {
            arm,
            synergy: cfg.synergy.clone(),
            m_channels,
        })
    }

    pub fn arm(&self) -> &KinematicArm2D {
        &self.arm
    }

    /// Folds the synergy channels into one command per joint, in motor order.
    pub fn flatten_synergies(&self, m_signal: &Signal) -> Result<Vec<f64>> {
        let joints = &self.arm.m_channels;
        let mut commands = channel::to_vector(m_signal, joints)?;
        let mut weights = vec![1.0; commands.len()];

        for i in (0..joints.len()).step_by(self.synergy.syn_res) {
            let name = format!("s{i}");
            let v = *m_signal
                .get(&name)
                .ok_or(SceneError::MissingChannel(name))?;
            for k in i..(i + self.synergy.syn_span).min(joints.len()) {
                let (low, high) = joints[k].bounds;
                commands[k] += v * (high - low) + low;
                weights[k] += 1.0;
            }
        }

        Ok(commands.iter().zip(&weights).map(|(c, w)| c / w).collect())
    }
}

impl Environment for KinArmSynergies2D {
    fn m_channels(&self) -> &[Channel] {
        &self.m_channels
    }

    fn s_channels(&self) -> &[Channel] {
        &self.arm.s_channels
    }

    fn execute_signal(&self, m_signal: &Signal, meta: Option<&mut ExecutionMeta>) -> Result<Signal> {
        if let Some(meta) = meta {
            meta.m_signal = Some(m_signal.clone());
        }
        let m_vector = self.flatten_synergies(m_signal)?;
        let pose = self.arm.pose(&m_vector)?;
        self.arm.tip_signal(&pose)
    }
}
