//! Named, bounded signal dimensions and the signal/vector conversions.
//!
//! A [`Signal`] maps channel names to values and carries no ordering. A vector
//! is the same data laid out in the order of an explicit channel list; the
//! conversions in this module are the only place where that order is applied.

use crate::error::{Result, SceneError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A name-keyed set of channel values.
pub type Signal = HashMap<String, f64>;

/// A named scalar dimension with bounds and an optional fixed value.
///
/// Channels are immutable once built; a configuration change builds a new one.
/// `low == high` marks a channel that is effectively constant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub bounds: (f64, f64),
    #[serde(default)]
    pub fixed: Option<f64>,
    #[serde(default)]
    pub unit: String,
}

impl Channel {
    pub fn new(name: impl Into<String>, bounds: (f64, f64)) -> Self {
        Self {
            name: name.into(),
            bounds,
            fixed: None,
            unit: String::new(),
        }
    }

    /// A channel with infinite bounds on both sides.
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self::new(name, (f64::NEG_INFINITY, f64::INFINITY))
    }

    pub fn with_fixed(mut self, value: f64) -> Self {
        self.fixed = Some(value);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn low(&self) -> f64 {
        self.bounds.0
    }

    pub fn high(&self) -> f64 {
        self.bounds.1
    }

    /// Width used to normalise values; `1.0` for degenerate channels.
    fn scale(&self) -> Result<f64> {
        let (low, high) = self.bounds;
        if low == high {
            return Ok(1.0);
        }
        if low > high {
            return Err(SceneError::InvertedBounds {
                name: self.name.clone(),
                low,
                high,
            });
        }
        Ok(high - low)
    }
}

fn value_of(signal: &Signal, channel: &Channel) -> Result<f64> {
    signal
        .get(&channel.name)
        .copied()
        .ok_or_else(|| SceneError::MissingChannel(channel.name.clone()))
}

/// Projects `signal` onto `channels`, in channel order.
pub fn to_vector(signal: &Signal, channels: &[Channel]) -> Result<Vec<f64>> {
    channels.iter().map(|c| value_of(signal, c)).collect()
}

/// Zips `vector` onto the channel names. The lengths must match.
pub fn to_signal(vector: &[f64], channels: &[Channel]) -> Result<Signal> {
    if vector.len() != channels.len() {
        return Err(SceneError::length_mismatch(channels.len(), vector.len()));
    }
    Ok(channels
        .iter()
        .zip(vector)
        .map(|(c, &v)| (c.name.clone(), v))
        .collect())
}

/// `true` when every channel present in `signal` lies within its bounds.
///
/// Channels absent from the signal are not checked.
pub fn in_bounds(signal: &Signal, channels: &[Channel]) -> bool {
    channels.iter().all(|c| match signal.get(&c.name) {
        Some(&v) => c.low() <= v && v <= c.high(),
        None => true,
    })
}

/// Draws a uniform value inside each channel's bounds.
///
/// Fixed channels always report their fixed value.
pub fn random_signal<R: Rng + ?Sized>(channels: &[Channel], rng: &mut R) -> Result<Signal> {
    let bounds: Vec<(f64, f64)> = channels.iter().map(|c| c.bounds).collect();
    random_signal_within(channels, &bounds, rng)
}

/// Like [`random_signal`], but draws inside `bounds` (one pair per channel)
/// instead of the channels' own bounds.
pub fn random_signal_within<R: Rng + ?Sized>(
    channels: &[Channel],
    bounds: &[(f64, f64)],
    rng: &mut R,
) -> Result<Signal> {
    if bounds.len() != channels.len() {
        return Err(SceneError::length_mismatch(channels.len(), bounds.len()));
    }
    let mut signal = Signal::with_capacity(channels.len());
    for (c, &(low, high)) in channels.iter().zip(bounds) {
        let value = match c.fixed {
            Some(v) => v,
            None => {
                if !low.is_finite() || !high.is_finite() {
                    return Err(SceneError::UnboundedChannel(c.name.clone()));
                }
                if low > high {
                    return Err(SceneError::InvertedBounds {
                        name: c.name.clone(),
                        low,
                        high,
                    });
                }
                if low == high {
                    low
                } else {
                    rng.gen_range(low..=high)
                }
            }
        };
        signal.insert(c.name.clone(), value);
    }
    Ok(signal)
}

/// Maps every channel value to `[0, 1]` through `(v - low) / (high - low)`.
pub fn uniformize(signal: &Signal, channels: &[Channel]) -> Result<Signal> {
    channels
        .iter()
        .map(|c| -> Result<(String, f64)> {
            Ok((c.name.clone(), (value_of(signal, c)? - c.low()) / c.scale()?))
        })
        .collect()
}

/// Exact inverse of [`uniformize`].
pub fn restore(uni_signal: &Signal, channels: &[Channel]) -> Result<Signal> {
    channels
        .iter()
        .map(|c| -> Result<(String, f64)> {
            Ok((c.name.clone(), value_of(uni_signal, c)? * c.scale()? + c.low()))
        })
        .collect()
}

/// Returns the first candidate channel list whose names all appear in `signal`.
pub fn find_channels<'a>(signal: &Signal, candidates: &'a [Vec<Channel>]) -> Option<&'a [Channel]> {
    candidates
        .iter()
        .find(|channels| channels.iter().all(|c| signal.contains_key(&c.name)))
        .map(Vec::as_slice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn arm_channels() -> Vec<Channel> {
        vec![
            Channel::new("j0", (-150.0, 150.0)),
            Channel::new("j1", (-90.0, 30.0)),
            Channel::new("gain", (0.0, 1.0)).with_unit("ratio"),
        ]
    }

    #[test]
    fn test_vector_follows_channel_order() {
        let channels = arm_channels();
        let signal: Signal = [("gain", 0.5), ("j1", -10.0), ("j0", 42.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(to_vector(&signal, &channels).unwrap(), vec![42.0, -10.0, 0.5]);
        assert_eq!(to_signal(&[42.0, -10.0, 0.5], &channels).unwrap(), signal);
    }

    #[test]
    fn test_missing_channel_and_wrong_length() {
        let channels = arm_channels();
        let signal: Signal = [("j0".to_string(), 1.0)].into_iter().collect();
        assert_eq!(
            to_vector(&signal, &channels),
            Err(SceneError::MissingChannel("j1".into()))
        );
        assert_eq!(
            to_signal(&[1.0, 2.0], &channels),
            Err(SceneError::length_mismatch(3, 2))
        );
    }

    #[test]
    fn test_uniformize_restore_round_trip() {
        let channels = arm_channels();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let signal = random_signal(&channels, &mut rng).unwrap();
            assert!(in_bounds(&signal, &channels));
            let uni = uniformize(&signal, &channels).unwrap();
            for c in &channels {
                assert!((0.0..=1.0).contains(&uni[&c.name]));
            }
            let back = restore(&uni, &channels).unwrap();
            for c in &channels {
                assert_relative_eq!(back[&c.name], signal[&c.name], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_degenerate_channel_uses_unit_scale() {
        let channels = vec![Channel::new("c", (2.0, 2.0))];
        let signal: Signal = [("c".to_string(), 3.5)].into_iter().collect();
        assert_eq!(uniformize(&signal, &channels).unwrap()["c"], 1.5);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let channels = vec![Channel::new("c", (1.0, 0.0))];
        let signal: Signal = [("c".to_string(), 0.5)].into_iter().collect();
        assert!(matches!(
            uniformize(&signal, &channels),
            Err(SceneError::InvertedBounds { .. })
        ));
    }

    #[test]
    fn test_random_signal_respects_fixed_and_unbounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let channels = vec![Channel::unbounded("free").with_fixed(3.0)];
        assert_eq!(random_signal(&channels, &mut rng).unwrap()["free"], 3.0);

        let channels = vec![Channel::unbounded("free")];
        assert_eq!(
            random_signal(&channels, &mut rng),
            Err(SceneError::UnboundedChannel("free".into()))
        );
    }

    #[test]
    fn test_in_bounds_ignores_absent_channels() {
        let channels = arm_channels();
        let mut signal: Signal = [("j0".to_string(), 200.0)].into_iter().collect();
        assert!(!in_bounds(&signal, &channels));
        signal.insert("j0".into(), 0.0);
        assert!(in_bounds(&signal, &channels));
    }

    #[test]
    fn test_find_channels() {
        let xy = vec![Channel::new("x", (0.0, 1.0)), Channel::new("y", (0.0, 1.0))];
        let joints = arm_channels();
        let candidates = vec![joints.clone(), xy.clone()];
        let signal: Signal = [("x", 0.1), ("y", 0.2)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(find_channels(&signal, &candidates), Some(xy.as_slice()));
        assert_eq!(find_channels(&Signal::new(), &candidates[..1]), None);
    }
}
