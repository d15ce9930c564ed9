//! Error types for scene construction and execution.

use thiserror::Error;

/// Errors raised by the kinematic, physics and primitive layers.
///
/// Every variant except [`SceneError::OrderNotExecutable`] is a contract
/// violation: a malformed configuration or a signal that does not match the
/// declared channels. Those are reported at the earliest point and never
/// retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// A vector does not have one value per channel (or per joint).
    #[error("length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A signal lacks a value for a declared channel.
    #[error("channel '{0}' is missing from the signal")]
    MissingChannel(String),

    /// A channel's lower bound exceeds its upper bound.
    #[error("channel '{name}' has inverted bounds ({low}, {high})")]
    InvertedBounds { name: String, low: f64, high: f64 },

    /// A channel with infinite bounds was asked for a random value.
    #[error("channel '{0}' is unbounded")]
    UnboundedChannel(String),

    /// A motor angle range must be symmetric around zero.
    #[error("angle range of motor {index} is not symmetric: ({min}, {max})")]
    AsymmetricRange { index: usize, min: f64, max: f64 },

    /// Forward kinematics only walks serial chains.
    #[error("joint {joint} has {children} children; only serial chains can be traversed")]
    UnsupportedBranching { joint: usize, children: usize },

    /// The joint graph is not a single rooted tree.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// A configuration value is out of its legal domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No constructor is registered under the requested primitive name.
    #[error("unknown motor primitive: {0}")]
    UnknownPrimitive(String),

    /// Two sensory primitives declare the same channel.
    #[error("channel name '{0}' is declared twice")]
    DuplicateChannel(String),

    /// A motor primitive produced no poses.
    #[error("motor primitive produced an empty trajectory")]
    EmptyTrajectory,

    /// The command is legal but cannot be carried out (self-collision).
    #[error("order not executable: {0}")]
    OrderNotExecutable(String),
}

/// Result type alias for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;

impl SceneError {
    /// Create a length mismatch error.
    #[must_use]
    pub const fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an order-not-executable error.
    #[must_use]
    pub fn order_not_executable(msg: impl Into<String>) -> Self {
        Self::OrderNotExecutable(msg.into())
    }

    /// `true` for programmer/configuration errors, `false` for the
    /// recoverable [`SceneError::OrderNotExecutable`].
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        !matches!(self, Self::OrderNotExecutable(_))
    }
}
