//! Adaptive Dormand-Prince 5(4) integrator for small fixed-size systems.
//!
//! The solver advances with an embedded error estimate and lands exactly on
//! every requested output time, so callers get the state at those times
//! without interpolation.

use nalgebra::SVector;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("solver produced a non-finite state at t = {t}")]
    NonFinite { t: f64 },

    #[error("step size underflow at t = {t} (h = {h:e})")]
    StepSizeUnderflow { t: f64, h: f64 },

    #[error("exceeded {max_steps} steps before reaching t = {t}")]
    TooManySteps { t: f64, max_steps: usize },

    #[error("output times must be finite and non-decreasing")]
    UnorderedTimes,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            rtol: 1e-8,
            atol: 1e-8,
            max_steps: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

#[derive(Debug, Clone)]
pub struct Solution<const D: usize> {
    /// One state per requested output time.
    pub states: Vec<SVector<f64, D>>,
    pub stats: SolverStats,
}

// Butcher tableau
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
// Fifth-order weights (also the last stage row, FSAL)
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;
// Fifth minus fourth order weights
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

pub struct DormandPrince {
    tolerances: Tolerances,
}

impl DormandPrince {
    pub fn new(tolerances: Tolerances) -> Self {
        DormandPrince { tolerances }
    }

    /// Integrates `dy/dt = f(t, y)` from `y0` at `times[0]` and returns the
    /// state at each entry of `times`.
    pub fn solve<F, const D: usize>(
        &self,
        mut f: F,
        y0: SVector<f64, D>,
        times: &[f64],
    ) -> Result<Solution<D>, SolverError>
    where
        F: FnMut(f64, &SVector<f64, D>) -> SVector<f64, D>,
    {
        let mut stats = SolverStats::default();
        let mut states = Vec::with_capacity(times.len());
        let Some(&t0) = times.first() else {
            return Ok(Solution { states, stats });
        };
        if times.iter().any(|t| !t.is_finite()) || times.windows(2).any(|w| w[1] < w[0]) {
            return Err(SolverError::UnorderedTimes);
        }
        if y0.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NonFinite { t: t0 });
        }

        let Tolerances {
            rtol,
            atol,
            max_steps,
        } = self.tolerances;

        let mut t = t0;
        let mut y = y0;
        let mut k1 = f(t, &y);
        stats.evaluations += 1;
        let mut h = self.initial_step(&mut f, t, &y, &k1, times[times.len() - 1] - t0);
        stats.evaluations += 1;
        states.push(y);

        for &t_out in &times[1..] {
            while t < t_out {
                if stats.accepted + stats.rejected >= max_steps {
                    return Err(SolverError::TooManySteps { t: t_out, max_steps });
                }
                // Stretch onto t_out rather than leave a sliver too short to take
                let clamped = t + h >= t_out - 16.0 * f64::EPSILON * t_out.abs().max(1.0);
                let step = if clamped { t_out - t } else { h };
                if step <= 16.0 * f64::EPSILON * t.abs().max(1.0) {
                    return Err(SolverError::StepSizeUnderflow { t, h: step });
                }

                let k2 = f(t + C2 * step, &(y + k1 * (step * A21)));
                let k3 = f(t + C3 * step, &(y + (k1 * A31 + k2 * A32) * step));
                let k4 = f(t + C4 * step, &(y + (k1 * A41 + k2 * A42 + k3 * A43) * step));
                let k5 = f(
                    t + C5 * step,
                    &(y + (k1 * A51 + k2 * A52 + k3 * A53 + k4 * A54) * step),
                );
                let k6 = f(
                    t + step,
                    &(y + (k1 * A61 + k2 * A62 + k3 * A63 + k4 * A64 + k5 * A65) * step),
                );
                let y_new = y + (k1 * B1 + k3 * B3 + k4 * B4 + k5 * B5 + k6 * B6) * step;
                let k7 = f(t + step, &y_new);
                stats.evaluations += 6;

                let err_vec = (k1 * E1 + k3 * E3 + k4 * E4 + k5 * E5 + k6 * E6 + k7 * E7) * step;
                let err = scaled_rms(&err_vec, &y, &y_new, rtol, atol);
                if !err.is_finite() || y_new.iter().any(|v| !v.is_finite()) {
                    return Err(SolverError::NonFinite { t: t + step });
                }

                if err <= 1.0 {
                    stats.accepted += 1;
                    t = if clamped { t_out } else { t + step };
                    y = y_new;
                    k1 = k7;
                    let factor = if err == 0.0 {
                        MAX_FACTOR
                    } else {
                        (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                    };
                    // A step shortened to hit an output time says nothing
                    // about the controller's preferred size.
                    h = if clamped { h.max(step * factor) } else { step * factor };
                } else {
                    stats.rejected += 1;
                    h = step * (SAFETY * err.powf(-0.2)).max(MIN_FACTOR);
                }
            }
            states.push(y);
        }

        Ok(Solution { states, stats })
    }

    // Hairer, Norsett & Wanner, "Solving ODEs I", II.4.
    fn initial_step<F, const D: usize>(
        &self,
        f: &mut F,
        t0: f64,
        y0: &SVector<f64, D>,
        f0: &SVector<f64, D>,
        span: f64,
    ) -> f64
    where
        F: FnMut(f64, &SVector<f64, D>) -> SVector<f64, D>,
    {
        let Tolerances { rtol, atol, .. } = self.tolerances;
        let d0 = scaled_rms(y0, y0, y0, rtol, atol);
        let d1 = scaled_rms(f0, y0, y0, rtol, atol);
        let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };

        let y1 = y0 + f0 * h0;
        let f1 = f(t0 + h0, &y1);
        let d2 = scaled_rms(&(f1 - f0), y0, y0, rtol, atol) / h0;

        let h1 = if d1.max(d2) <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(0.2)
        };
        let h = (100.0 * h0).min(h1);
        if span > 0.0 { h.min(span) } else { h }
    }
}

fn scaled_rms<const D: usize>(
    v: &SVector<f64, D>,
    y_a: &SVector<f64, D>,
    y_b: &SVector<f64, D>,
    rtol: f64,
    atol: f64,
) -> f64 {
    if D == 0 {
        return 0.0;
    }
    let sum: f64 = (0..D)
        .map(|i| {
            let scale = atol + rtol * y_a[i].abs().max(y_b[i].abs());
            (v[i] / scale).powi(2)
        })
        .sum();
    (sum / D as f64).sqrt()
}
