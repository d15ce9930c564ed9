//! Motor primitives: compact control signals to joint-angle trajectories.
//!
//! Both strategies implement [`MotorPrimitive`]. Environments obtain them by
//! name through a [`PrimitiveRegistry`] owned by the caller, so the set of
//! available primitives is explicit at the composition root.

use crate::channel::{self, Channel, Signal};
use crate::config::MotorPrimitiveConfig;
use crate::dmp::{self, Dmp, LwrModel};
use crate::error::{Result, SceneError};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// One joint-angle vector per time step, in degrees.
pub type Trajectory = Vec<Vec<f64>>;

/// Turns a motor signal into a finite trajectory of joint-angle vectors.
pub trait MotorPrimitive: fmt::Debug {
    /// Channels a motor signal must provide.
    fn m_channels(&self) -> &[Channel];

    /// Length of every joint-angle vector produced.
    fn dof(&self) -> usize;

    fn process_motor_signal(&self, m_signal: &Signal) -> Result<Trajectory>;
}

/// Basis-function primitive: one DMP per degree of freedom, sharing the
/// kernel centers and widths.
///
/// The motor vector is laid out as `(slope, offset)` for every basis of every
/// degree of freedom, followed by one shared width per basis.
#[derive(Clone, Debug)]
pub struct DmpSharedWidth {
    n_basis: usize,
    dt: f64,
    target_end: usize,
    dmps: Vec<Dmp>,
    /// Upper end of each degree of freedom's symmetric angle range.
    ranges: Vec<f64>,
    m_channels: Vec<Channel>,
}

/// Half-width of the internal DMP scale.
const DMP_SCALE: f64 = 5.0;

impl DmpSharedWidth {
    pub fn new(cfg: &MotorPrimitiveConfig) -> Result<Self> {
        let size = cfg.init_states.len();
        if size == 0 {
            return Err(SceneError::invalid_config("dmp primitive has no degrees of freedom"));
        }
        for len in [cfg.target_states.len(), cfg.angle_ranges.len()] {
            if len != size {
                return Err(SceneError::length_mismatch(size, len));
            }
        }
        if cfg.n_basis == 0 {
            return Err(SceneError::invalid_config("n_basis must be positive"));
        }
        let traj_end = cfg.traj_end - cfg.traj_end % 2;
        if traj_end == 0 || cfg.target_end == 0 {
            return Err(SceneError::invalid_config(
                "traj_end and target_end must be positive",
            ));
        }

        let mut ranges = Vec::with_capacity(size);
        for (index, &(min, max)) in cfg.angle_ranges.iter().enumerate() {
            if min != -max || max <= 0.0 {
                return Err(SceneError::AsymmetricRange { index, min, max });
            }
            ranges.push(max);
        }

        let duration = traj_end as f64 / cfg.target_end as f64;
        let dmps = (0..size)
            .map(|i| {
                let scale = DMP_SCALE / ranges[i];
                Dmp::new(
                    scale * cfg.init_states[i],
                    scale * cfg.target_states[i],
                    traj_end,
                    duration,
                )
            })
            .collect();

        let n = cfg.n_basis;
        let mut m_channels = Vec::with_capacity(n * (2 * size + 1));
        for motor in 0..size {
            for i in 0..n {
                m_channels.push(Channel::new(format!("slope{motor}.{i}"), (-400.0, 400.0)));
                m_channels.push(Channel::new(format!("offset{motor}.{i}"), (-400.0, 400.0)));
            }
        }
        for i in 0..n {
            m_channels.push(Channel::new(
                format!("width{i}"),
                (0.05 / n as f64, 1.0 / n as f64),
            ));
        }

        Ok(Self {
            n_basis: n,
            dt: cfg.dt,
            target_end: cfg.target_end,
            dmps,
            ranges,
            m_channels,
        })
    }

    pub fn n_basis(&self) -> usize {
        self.n_basis
    }

    /// Wall-clock time of every trajectory sample, in seconds.
    pub fn time_axis(&self) -> Vec<f64> {
        let scale = self.target_end as f64 * self.dt;
        let Some(dmp) = self.dmps.first() else {
            return Vec::new();
        };
        let n = dmp.n_steps;
        let step = if n > 1 { dmp.duration / (n - 1) as f64 } else { 0.0 };
        (0..n).map(|k| scale * k as f64 * step).collect()
    }
}

impl MotorPrimitive for DmpSharedWidth {
    fn m_channels(&self) -> &[Channel] {
        &self.m_channels
    }

    fn dof(&self) -> usize {
        self.dmps.len()
    }

    fn process_motor_signal(&self, m_signal: &Signal) -> Result<Trajectory> {
        if m_signal.len() != self.m_channels.len() {
            return Err(SceneError::length_mismatch(self.m_channels.len(), m_signal.len()));
        }
        let m_vector = channel::to_vector(m_signal, &self.m_channels)?;

        let n = self.n_basis;
        let widths = m_vector[m_vector.len() - n..].to_vec();
        let centers = dmp::basis_centers(n);

        let mut per_dof = Vec::with_capacity(self.dmps.len());
        for (i, dmp) in self.dmps.iter().enumerate() {
            let params = &m_vector[2 * n * i..2 * n * (i + 1)];
            let slopes = params.iter().step_by(2).copied().collect();
            let offsets = params.iter().skip(1).step_by(2).copied().collect();
            let model = LwrModel::new(centers.clone(), widths.clone(), slopes, offsets)?;

            let scale = self.ranges[i] / DMP_SCALE;
            let ys: Vec<f64> = dmp.trajectory(&model).ys.into_iter().map(|y| scale * y).collect();
            per_dof.push(ys);
        }

        let steps = per_dof.first().map_or(0, Vec::len);
        debug!(steps, dof = per_dof.len(), "dmp trajectory generated");
        Ok((0..steps)
            .map(|t| per_dof.iter().map(|ys| ys[t]).collect())
            .collect())
    }
}

/// Fixed-step interpolation: every joint moves from its initial position
/// toward its target by `angular_step` degrees per step, then holds.
///
/// Out-of-range targets are clamped into the channel bounds first, so the
/// trajectory length is bounded by the limits span over the step.
#[derive(Clone, Debug)]
pub struct MotorSteps {
    init_pos: Vec<f64>,
    step: f64,
    m_channels: Vec<Channel>,
}

impl MotorSteps {
    pub fn new(cfg: &MotorPrimitiveConfig) -> Result<Self> {
        let dim = cfg.init_pos.len();
        if dim == 0 {
            return Err(SceneError::invalid_config("motorsteps needs an initial position"));
        }
        if !cfg.angular_step.is_finite() || cfg.angular_step <= 0.0 {
            return Err(SceneError::invalid_config(format!(
                "angular_step must be positive, got {}",
                cfg.angular_step
            )));
        }
        if let Some(start) = cfg.init_pos.iter().find(|p| !p.is_finite()) {
            return Err(SceneError::invalid_config(format!(
                "initial position {start} is not finite"
            )));
        }
        let limits = cfg.limits.resolve(dim, "joint limits")?;
        for &(low, high) in &limits {
            if !low.is_finite() || !high.is_finite() || low > high {
                return Err(SceneError::invalid_config(format!(
                    "motorsteps limits ({low}, {high}) must be finite and ordered"
                )));
            }
        }
        let m_channels = limits
            .into_iter()
            .enumerate()
            .map(|(i, bounds)| Channel::new(format!("j{i}"), bounds).with_unit("deg"))
            .collect();

        Ok(Self {
            init_pos: cfg.init_pos.clone(),
            step: cfg.angular_step,
            m_channels,
        })
    }
}

impl MotorPrimitive for MotorSteps {
    fn m_channels(&self) -> &[Channel] {
        &self.m_channels
    }

    fn dof(&self) -> usize {
        self.init_pos.len()
    }

    fn process_motor_signal(&self, m_signal: &Signal) -> Result<Trajectory> {
        if m_signal.len() != self.m_channels.len() {
            return Err(SceneError::length_mismatch(self.m_channels.len(), m_signal.len()));
        }
        // Targets are clamped into the joint limits, NaN to the lower one.
        let target: Vec<f64> = channel::to_vector(m_signal, &self.m_channels)?
            .into_iter()
            .zip(&self.m_channels)
            .map(|(goal, c)| goal.max(c.low()).min(c.high()))
            .collect();
        let farthest = target
            .iter()
            .zip(&self.init_pos)
            .map(|(t, i)| (t - i).abs())
            .fold(0.0, f64::max);
        let steps = (farthest / self.step).ceil() as usize;

        Ok((0..=steps)
            .map(|k| {
                let reach = k as f64 * self.step;
                target
                    .iter()
                    .zip(&self.init_pos)
                    .map(|(&goal, &start)| {
                        if (goal - start).abs() <= reach {
                            goal
                        } else {
                            start + (goal - start).signum() * reach
                        }
                    })
                    .collect()
            })
            .collect())
    }
}

/// Builds a motor primitive from its configuration.
pub type MotorPrimitiveFactory = fn(&MotorPrimitiveConfig) -> Result<Box<dyn MotorPrimitive>>;

/// Name-to-constructor table for motor primitives.
#[derive(Clone, Debug, Default)]
pub struct PrimitiveRegistry {
    factories: HashMap<String, MotorPrimitiveFactory>,
}

impl PrimitiveRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `dmp_sharedwidth` and `motorsteps`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("dmp_sharedwidth", |cfg| {
            Ok(Box::new(DmpSharedWidth::new(cfg)?) as Box<dyn MotorPrimitive>)
        });
        registry.register("motorsteps", |cfg| {
            Ok(Box::new(MotorSteps::new(cfg)?) as Box<dyn MotorPrimitive>)
        });
        registry
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, factory: MotorPrimitiveFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds the primitive named by `cfg.name`.
    pub fn create(&self, cfg: &MotorPrimitiveConfig) -> Result<Box<dyn MotorPrimitive>> {
        let factory = self
            .factories
            .get(&cfg.name)
            .ok_or_else(|| SceneError::UnknownPrimitive(cfg.name.clone()))?;
        factory(cfg)
    }
}
