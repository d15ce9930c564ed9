//! Arm-and-ball scenes: a motor primitive drives the arm, the arm's tip pushes
//! free balls around a bounded physics world.

use crate::channel::{Channel, Signal};
use crate::config::{ObjectConfig, SceneConfig};
use crate::environment::{Environment, ExecutionMeta};
use crate::error::{Result, SceneError};
use crate::kinarm::KinematicArm2D;
use crate::motor::{MotorPrimitive, PrimitiveRegistry, Trajectory};
use crate::physics::{Ball, CollisionEvent, World, WorldBounds};
use crate::sensory::{Displacement, RawSensors, SensoryPrimitive};
use glam::DVec2;
use tracing::debug;

/// Name of the kinematic body attached to the end effector.
pub const TIP: &str = "tip";

/// Output of one physics run of a [`KinScene2D`].
#[derive(Clone, Debug, PartialEq)]
pub struct SceneRun {
    pub raw_sensors: RawSensors,
    pub collisions: Vec<CollisionEvent>,
}

/// A kinematic arm whose tip is a static ball stepping through a physics world
/// along the trajectory of a motor primitive.
///
/// The sensory signal is the final position of the tracked object (the tip
/// unless an object is configured with `track`).
#[derive(Debug)]
pub struct KinScene2D {
    arm: KinematicArm2D,
    m_prim: Box<dyn MotorPrimitive>,
    s_prim: Displacement,
    dt: f64,
    bounds: WorldBounds,
    tip_radius: f64,
    tip_mass: f64,
    objects: Vec<(String, ObjectConfig)>,
}

impl KinScene2D {
    pub fn new(cfg: &SceneConfig, registry: &PrimitiveRegistry) -> Result<Self> {
        if !cfg.dt.is_finite() || cfg.dt <= 0.0 {
            return Err(SceneError::invalid_config(format!(
                "dt must be positive, got {}",
                cfg.dt
            )));
        }
        let arm = KinematicArm2D::new(&cfg.arm)?;
        let m_prim = registry.create(&cfg.mprims)?;
        if m_prim.dof() != arm.dim() {
            return Err(SceneError::length_mismatch(arm.dim(), m_prim.dof()));
        }

        for (name, obj) in &cfg.objects {
            if name == TIP {
                return Err(SceneError::invalid_config("object name 'tip' is reserved"));
            }
            if obj.mass.is_none() && obj.density.is_none() {
                return Err(SceneError::invalid_config(format!(
                    "object '{name}' needs a mass or a density"
                )));
            }
        }
        let mut tracked = cfg.objects.iter().filter(|(_, obj)| obj.track).map(|(name, _)| name);
        let target = tracked.next().map_or(TIP, String::as_str);
        if let Some(other) = tracked.next() {
            return Err(SceneError::invalid_config(format!(
                "only one object can be tracked, got '{target}' and '{other}'"
            )));
        }

        let limits = &cfg.s_prims;
        Ok(Self {
            s_prim: Displacement::new(target, limits.x_limits, limits.y_limits),
            arm,
            m_prim,
            dt: cfg.dt,
            bounds: WorldBounds::new(limits.x_limits, limits.y_limits),
            tip_radius: cfg.tip.radius,
            tip_mass: cfg.tip.mass,
            objects: cfg
                .objects
                .iter()
                .map(|(name, obj)| (name.clone(), obj.clone()))
                .collect(),
        })
    }

    pub fn arm(&self) -> &KinematicArm2D {
        &self.arm
    }

    pub fn motor_primitive(&self) -> &dyn MotorPrimitive {
        self.m_prim.as_ref()
    }

    /// Name of the body whose displacement is reported.
    pub fn tracked_object(&self) -> &str {
        self.s_prim.object_name()
    }

    fn spawn_object(&self, name: &str, obj: &ObjectConfig) -> Ball {
        let pos = DVec2::from(obj.pos);
        let ball = match (obj.mass, obj.density) {
            (Some(mass), _) => Ball::new(self.dt, obj.radius, mass, pos),
            (None, density) => Ball::from_density(self.dt, obj.radius, density.unwrap_or(0.0), pos),
        };
        ball.with_friction(obj.friction).named(name)
    }

    /// Steps a fresh world along `trajectory` and returns the recorded traces.
    ///
    /// Every pose is checked for self-collision when the arm is configured to
    /// fail on it.
    pub fn run(&self, trajectory: &Trajectory) -> Result<SceneRun> {
        let first = trajectory.first().ok_or(SceneError::EmptyTrajectory)?;
        let mut world = World::new(self.dt, self.bounds);

        let start = self.arm.pose(first)?.end_effector();
        let tip = world.add(
            Ball::new(self.dt, self.tip_radius, self.tip_mass, start)
                .with_static(true)
                .named(TIP),
        );
        let mut bodies = vec![(TIP.to_string(), tip)];
        for (name, obj) in &self.objects {
            let id = world.add(self.spawn_object(name, obj));
            bodies.push((name.clone(), id));
        }

        for angles in trajectory {
            let pose = self.arm.pose(angles)?;
            world.move_body(tip, pose.end_effector());
            world.step();
        }
        debug!(
            steps = trajectory.len(),
            collisions = world.collisions().len(),
            "scene run complete"
        );

        let mut raw_sensors = RawSensors::new();
        for (name, id) in bodies {
            if let Some(ball) = world.body(id) {
                raw_sensors.insert(name, ball.positions().to_vec());
            }
        }
        Ok(SceneRun {
            raw_sensors,
            collisions: world.into_collisions(),
        })
    }
}

impl Environment for KinScene2D {
    fn m_channels(&self) -> &[Channel] {
        self.m_prim.m_channels()
    }

    fn s_channels(&self) -> &[Channel] {
        self.s_prim.s_channels()
    }

    fn execute_signal(&self, m_signal: &Signal, mut meta: Option<&mut ExecutionMeta>) -> Result<Signal> {
        if let Some(meta) = meta.as_deref_mut() {
            meta.m_signal = Some(m_signal.clone());
        }
        let trajectory = self.m_prim.process_motor_signal(m_signal)?;
        let run = self.run(&trajectory)?;
        let s_signal = self.s_prim.process_raw_sensors(&run.raw_sensors)?;
        if let Some(meta) = meta {
            meta.raw_sensors = Some(run.raw_sensors);
            meta.collisions = run.collisions;
        }
        Ok(s_signal)
    }
}
