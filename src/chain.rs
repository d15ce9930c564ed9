//! Planar kinematic trees of revolute joints.
//!
//! A [`KinematicChain`] is assembled once through a [`ChainBuilder`], together
//! with a [`MotorMap`] that relabels motor indices onto joints. After that it is
//! immutable: [`KinematicChain::forward_kinematics`] walks the tree with an
//! [`ArmTurtle`] and returns a fresh [`ChainPose`] on every call.

use crate::collision;
use crate::error::{Result, SceneError};
use crate::turtle::ArmTurtle;
use glam::DVec2;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a joint inside its chain, in insertion order.
pub type JointId = usize;

/// Names under which a joint publishes its end pose. `None` hides a component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JointFeatures {
    pub x: Option<String>,
    pub y: Option<String>,
    pub angle: Option<String>,
}

impl JointFeatures {
    /// Publishes the `x` and `y` components only.
    pub fn position(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: Some(x.into()),
            y: Some(y.into()),
            angle: None,
        }
    }

    fn names(&self) -> [Option<&str>; 3] {
        [self.x.as_deref(), self.y.as_deref(), self.angle.as_deref()]
    }
}

/// A revolute joint and the rigid link attached to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevJoint {
    /// Length of the link driven by this joint.
    pub length: f64,

    /// Legal angle range, in degrees, relative to `origin_offset`.
    pub limits: (f64, f64),

    /// Fixed rest orientation added to every requested angle, in degrees.
    pub origin_offset: f64,

    /// Components of the end pose exposed in the readings.
    pub features: JointFeatures,

    #[serde(skip)]
    children: Vec<JointId>,
}

impl Default for RevJoint {
    fn default() -> Self {
        Self::new(1.0, (-150.0, 150.0))
    }
}

impl RevJoint {
    pub fn new(length: f64, limits: (f64, f64)) -> Self {
        Self {
            length,
            limits,
            origin_offset: 0.0,
            features: JointFeatures::default(),
            children: Vec::new(),
        }
    }

    pub fn with_offset(mut self, origin_offset: f64) -> Self {
        self.origin_offset = origin_offset;
        self
    }

    pub fn with_features(mut self, features: JointFeatures) -> Self {
        self.features = features;
        self
    }

    /// Joints attached to the end of this joint's link.
    pub fn children(&self) -> &[JointId] {
        &self.children
    }

    /// Clamps `angle` into the joint limits. Out-of-range requests are legal.
    pub fn clamp_angle(&self, angle: f64) -> f64 {
        let (min, max) = self.limits;
        angle.max(min).min(max)
    }

    /// End pose of this joint's link when the parent link ends at `parent`.
    pub fn reach(&self, parent: ArmTurtle, angle: f64) -> ArmTurtle {
        let mut turtle = parent;
        turtle.turn(self.clamp_angle(angle) + self.origin_offset);
        turtle.advance(self.length);
        turtle
    }
}

/// A fixed bijection from motor index to joint index.
///
/// `permutation[k]` is the motor index whose command drives the `k`-th joint
/// in traversal order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorMap {
    permutation: Vec<usize>,
}

impl MotorMap {
    /// Motor `k` drives joint `k`.
    pub fn identity(n: usize) -> Self {
        Self {
            permutation: (0..n).collect(),
        }
    }

    /// A seeded random relabeling, drawn once.
    pub fn shuffled(n: usize, seed: u64) -> Self {
        let mut permutation: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        permutation.shuffle(&mut rng);
        Self { permutation }
    }

    /// Validates that `permutation` is a bijection over `0..len`.
    pub fn from_permutation(permutation: Vec<usize>) -> Result<Self> {
        let mut seen = vec![false; permutation.len()];
        for &p in &permutation {
            match seen.get_mut(p) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(SceneError::invalid_config(format!(
                        "motor map {permutation:?} is not a permutation"
                    )));
                }
            }
        }
        Ok(Self { permutation })
    }

    pub fn len(&self) -> usize {
        self.permutation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permutation.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.permutation
    }

    /// Reorders a motor-indexed vector into joint order.
    pub fn apply(&self, motor_values: &[f64]) -> Result<Vec<f64>> {
        if motor_values.len() != self.permutation.len() {
            return Err(SceneError::length_mismatch(
                self.permutation.len(),
                motor_values.len(),
            ));
        }
        Ok(self.permutation.iter().map(|&m| motor_values[m]).collect())
    }
}

/// Incrementally assembles the joint tree of a [`KinematicChain`].
#[derive(Clone, Debug, Default)]
pub struct ChainBuilder {
    joints: Vec<RevJoint>,
    origin: ArmTurtle,
}

impl ChainBuilder {
    /// Starts an empty tree whose root is anchored at `origin`.
    pub fn new(origin: ArmTurtle) -> Self {
        Self {
            joints: Vec::new(),
            origin,
        }
    }

    /// Attaches `joint` to `parent`, or makes it the root when `parent` is `None`.
    pub fn add_joint(&mut self, parent: Option<JointId>, joint: RevJoint) -> Result<JointId> {
        let (min, max) = joint.limits;
        if min.is_nan() || max.is_nan() || min > max {
            return Err(SceneError::invalid_config(format!(
                "joint limits ({min}, {max}) are inverted"
            )));
        }
        let id = self.joints.len();
        match parent {
            None if !self.joints.is_empty() => {
                return Err(SceneError::InvalidTopology(
                    "tried to create a root in a non-empty chain".into(),
                ));
            }
            None => {}
            Some(p) => {
                let parent = self.joints.get_mut(p).ok_or_else(|| {
                    SceneError::InvalidTopology(format!("parent joint {p} does not exist"))
                })?;
                parent.children.push(id);
            }
        }
        self.joints.push(RevJoint {
            children: Vec::new(),
            ..joint
        });
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Freezes the tree together with its motor map.
    pub fn build(self, motor_map: MotorMap) -> Result<KinematicChain> {
        if self.joints.is_empty() {
            return Err(SceneError::InvalidTopology("chain has no joints".into()));
        }
        if motor_map.len() != self.joints.len() {
            return Err(SceneError::length_mismatch(self.joints.len(), motor_map.len()));
        }
        Ok(KinematicChain {
            joints: self.joints,
            origin: self.origin,
            motor_map,
        })
    }
}

/// The outcome of one forward-kinematics query.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainPose {
    /// Published joint features, plus the origin as `x0`/`y0`.
    pub readings: HashMap<String, f64>,

    /// The origin followed by the end point of every link, in traversal order.
    pub points: Vec<DVec2>,

    /// Absolute heading of every link, in degrees, in traversal order.
    pub headings: Vec<f64>,
}

impl ChainPose {
    pub fn reading(&self, name: &str) -> Option<f64> {
        self.readings.get(name).copied()
    }

    /// End point of the last link in traversal order.
    pub fn end_effector(&self) -> DVec2 {
        self.points.last().copied().unwrap_or_default()
    }

    /// `true` when two non-adjacent links of the chain cross.
    pub fn self_collides(&self) -> bool {
        collision::polyline_self_intersects(&self.points)
    }
}

/// An immutable revolute-joint tree and its motor relabeling.
#[derive(Clone, Debug, PartialEq)]
pub struct KinematicChain {
    joints: Vec<RevJoint>,
    origin: ArmTurtle,
    motor_map: MotorMap,
}

impl KinematicChain {
    /// A serial arm: joint `i` has `lengths[i]`, `limits[i]` and exposes
    /// `x{i+1}`/`y{i+1}`.
    pub fn serial(
        lengths: &[f64],
        limits: &[(f64, f64)],
        origin: ArmTurtle,
        motor_map: MotorMap,
    ) -> Result<Self> {
        if lengths.len() != limits.len() {
            return Err(SceneError::length_mismatch(lengths.len(), limits.len()));
        }
        let mut builder = ChainBuilder::new(origin);
        let mut parent = None;
        for (i, (&length, &limits)) in lengths.iter().zip(limits).enumerate() {
            let joint = RevJoint::new(length, limits)
                .with_features(JointFeatures::position(format!("x{}", i + 1), format!("y{}", i + 1)));
            parent = Some(builder.add_joint(parent, joint)?);
        }
        builder.build(motor_map)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joints(&self) -> &[RevJoint] {
        &self.joints
    }

    pub fn origin(&self) -> ArmTurtle {
        self.origin
    }

    pub fn motor_map(&self) -> &MotorMap {
        &self.motor_map
    }

    /// Joint ids in tree pre-order, starting at the root.
    pub fn preorder(&self) -> Vec<JointId> {
        let mut order = Vec::with_capacity(self.joints.len());
        let mut stack = vec![0];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.joints[id].children.iter().rev());
        }
        order
    }

    /// `(min, max)` of every joint in tree pre-order.
    pub fn joint_limits(&self) -> Vec<(f64, f64)> {
        self.preorder().into_iter().map(|id| self.joints[id].limits).collect()
    }

    /// Computes the pose for angles given in motor-index order.
    pub fn forward_kinematics(&self, motor_angles: &[f64]) -> Result<ChainPose> {
        let joint_angles = self.motor_map.apply(motor_angles)?;
        self.forward_kinematics_joint_order(&joint_angles)
    }

    /// Computes the pose for angles already in traversal order.
    ///
    /// Requested angles are clamped into each joint's limits. Every joint may
    /// have at most one child.
    pub fn forward_kinematics_joint_order(&self, joint_angles: &[f64]) -> Result<ChainPose> {
        if joint_angles.len() != self.joints.len() {
            return Err(SceneError::length_mismatch(self.joints.len(), joint_angles.len()));
        }

        let mut readings = HashMap::new();
        readings.insert("x0".to_string(), self.origin.position.x);
        readings.insert("y0".to_string(), self.origin.position.y);
        let mut points = Vec::with_capacity(self.joints.len() + 1);
        let mut headings = Vec::with_capacity(self.joints.len());
        points.push(self.origin.position);

        let mut stack = vec![(0, self.origin)];
        let mut cursor = 0;
        while let Some((id, parent)) = stack.pop() {
            let joint = &self.joints[id];
            if joint.children.len() > 1 {
                return Err(SceneError::UnsupportedBranching {
                    joint: id,
                    children: joint.children.len(),
                });
            }

            let end = joint.reach(parent, joint_angles[cursor]);
            cursor += 1;

            for (name, value) in joint.features.names().into_iter().zip(end.components()) {
                if let Some(name) = name {
                    readings.insert(name.to_string(), value);
                }
            }
            points.push(end.position);
            headings.push(end.heading);

            stack.extend(joint.children.iter().map(|&child| (child, end)));
        }

        Ok(ChainPose {
            readings,
            points,
            headings,
        })
    }
}
