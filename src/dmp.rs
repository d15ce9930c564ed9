//! One-dimensional dynamical movement primitives shaped by an LWR model.
//!
//! A [`Dmp`] integrates a critically damped spring from its initial state to
//! its attractor. A forcing term, read from a [`LwrModel`] over normalised time
//! and gated by an exponentially decaying phase, bends the path on the way.

use crate::error::{Result, SceneError};

/// Spring stiffness of the transformation system.
pub const ALPHA_Z: f64 = 14.0;
/// Damping ratio term; `ALPHA_Z / 4` makes the spring critically damped.
pub const BETA_Z: f64 = ALPHA_Z / 4.0;
/// Decay rate of the phase gating the forcing term.
pub const ALPHA_X: f64 = 4.6;

/// `n` centers evenly spaced strictly inside `(0, 1)`.
pub fn basis_centers(n: usize) -> Vec<f64> {
    (1..=n).map(|k| k as f64 / (n + 1) as f64).collect()
}

/// Locally weighted regression: Gaussian kernels, each carrying a line.
#[derive(Clone, Debug, PartialEq)]
pub struct LwrModel {
    pub centers: Vec<f64>,
    pub widths: Vec<f64>,
    pub slopes: Vec<f64>,
    pub offsets: Vec<f64>,
}

impl LwrModel {
    pub fn new(centers: Vec<f64>, widths: Vec<f64>, slopes: Vec<f64>, offsets: Vec<f64>) -> Result<Self> {
        let n = centers.len();
        for len in [widths.len(), slopes.len(), offsets.len()] {
            if len != n {
                return Err(SceneError::length_mismatch(n, len));
            }
        }
        Ok(Self {
            centers,
            widths,
            slopes,
            offsets,
        })
    }

    pub fn n_bases(&self) -> usize {
        self.centers.len()
    }

    /// Kernel-weighted mean of the local lines at `s`.
    ///
    /// Kernels with a non-positive width carry no weight.
    pub fn predict(&self, s: f64) -> f64 {
        let mut weighted = 0.0;
        let mut total = 0.0;
        for i in 0..self.n_bases() {
            let width = self.widths[i];
            if width <= 0.0 {
                continue;
            }
            let u = (s - self.centers[i]) / width;
            let psi = (-0.5 * u * u).exp();
            weighted += psi * (self.slopes[i] * s + self.offsets[i]);
            total += psi;
        }
        if total > f64::MIN_POSITIVE {
            weighted / total
        } else {
            0.0
        }
    }
}

/// Sampled output of [`Dmp::trajectory`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DmpTrajectory {
    pub ts: Vec<f64>,
    pub ys: Vec<f64>,
    pub yds: Vec<f64>,
}

/// A single degree-of-freedom movement primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct Dmp {
    pub initial: f64,
    pub attractor: f64,
    /// Number of samples, including both ends.
    pub n_steps: usize,
    /// Integrated time span.
    pub duration: f64,
    /// Time constant; the forcing term is spread over `[0, tau]`.
    pub tau: f64,
}

impl Dmp {
    pub fn new(initial: f64, attractor: f64, n_steps: usize, duration: f64) -> Self {
        Self {
            initial,
            attractor,
            n_steps,
            duration,
            tau: 1.0,
        }
    }

    /// Euler-integrates the system over `n_steps` evenly spaced samples.
    pub fn trajectory(&self, model: &LwrModel) -> DmpTrajectory {
        let n = self.n_steps;
        let dt = if n > 1 { self.duration / (n - 1) as f64 } else { 0.0 };
        let goal = self.attractor;

        let mut out = DmpTrajectory {
            ts: Vec::with_capacity(n),
            ys: Vec::with_capacity(n),
            yds: Vec::with_capacity(n),
        };
        let (mut y, mut z) = (self.initial, 0.0);
        for k in 0..n {
            let t = k as f64 * dt;
            out.ts.push(t);
            out.ys.push(y);
            out.yds.push(z / self.tau);

            let phase = (-ALPHA_X * t / self.tau).exp();
            let forcing = phase * model.predict((t / self.tau).min(1.0));
            let zd = (ALPHA_Z * (BETA_Z * (goal - y) - z) + forcing) / self.tau;
            let yd = z / self.tau;
            z += zd * dt;
            y += yd * dt;
        }
        out
    }
}
