//! Sensory primitives: raw position traces to sensory signals.

use crate::channel::{self, Channel, Signal};
use crate::error::{Result, SceneError};
use glam::DVec2;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Recorded position history of every named body of one execution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSensors {
    traces: BTreeMap<String, Vec<DVec2>>,
}

impl RawSensors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, trace: Vec<DVec2>) {
        self.traces.insert(name.into(), trace);
    }

    pub fn trace(&self, name: &str) -> Option<&[DVec2]> {
        self.traces.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.traces.keys().map(String::as_str)
    }
}

/// Projects raw traces onto the channels it declares.
pub trait SensoryPrimitive: fmt::Debug {
    fn s_channels(&self) -> &[Channel];

    fn process_raw_sensors(&self, raw_sensors: &RawSensors) -> Result<Signal>;
}

/// Reports the final position of one named body as `x`/`y`.
#[derive(Clone, Debug)]
pub struct Displacement {
    object_name: String,
    s_channels: Vec<Channel>,
}

impl Displacement {
    pub fn new(object_name: impl Into<String>, x_limits: (f64, f64), y_limits: (f64, f64)) -> Self {
        Self {
            object_name: object_name.into(),
            s_channels: vec![Channel::new("x", x_limits), Channel::new("y", y_limits)],
        }
    }

    /// Renames the two output channels, keeping their bounds.
    pub fn with_channel_names(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.s_channels[0].name = x.into();
        self.s_channels[1].name = y.into();
        self
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }
}

impl SensoryPrimitive for Displacement {
    fn s_channels(&self) -> &[Channel] {
        &self.s_channels
    }

    fn process_raw_sensors(&self, raw_sensors: &RawSensors) -> Result<Signal> {
        let last = raw_sensors
            .trace(&self.object_name)
            .and_then(<[DVec2]>::last)
            .ok_or_else(|| SceneError::MissingChannel(self.object_name.clone()))?;
        channel::to_signal(&[last.x, last.y], &self.s_channels)
    }
}

/// Merges the signals of several sensory primitives.
#[derive(Debug, Default)]
pub struct ConcatSPrimitive {
    s_prims: Vec<Box<dyn SensoryPrimitive>>,
    s_channels: Vec<Channel>,
    names: HashSet<String>,
}

impl ConcatSPrimitive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `s_prim`; its channel names must not collide with earlier ones.
    pub fn add_s_prim(&mut self, s_prim: Box<dyn SensoryPrimitive>) -> Result<()> {
        let mut incoming = HashSet::new();
        for c in s_prim.s_channels() {
            if self.names.contains(&c.name) || !incoming.insert(c.name.clone()) {
                return Err(SceneError::DuplicateChannel(c.name.clone()));
            }
        }
        self.names.extend(incoming);
        self.s_channels.extend_from_slice(s_prim.s_channels());
        self.s_prims.push(s_prim);
        Ok(())
    }
}

impl SensoryPrimitive for ConcatSPrimitive {
    fn s_channels(&self) -> &[Channel] {
        &self.s_channels
    }

    fn process_raw_sensors(&self, raw_sensors: &RawSensors) -> Result<Signal> {
        let mut s_signal = Signal::with_capacity(self.s_channels.len());
        for s_prim in &self.s_prims {
            s_signal.extend(s_prim.process_raw_sensors(raw_sensors)?);
        }
        Ok(s_signal)
    }
}
