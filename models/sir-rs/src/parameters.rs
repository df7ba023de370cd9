use serde::Deserialize;

use crate::error::SimulationError;
use crate::ode::Tolerances;

/// Hand-set SIR constants and run settings. Every field has a default, so
/// a config only lists what it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    #[serde(alias = "s0")]
    pub susceptible: f64,
    #[serde(alias = "i0")]
    pub infected: f64,
    #[serde(alias = "r0_recovered")]
    pub recovered: f64,
    /// Basic reproduction number.
    pub r0: f64,
    /// Mean infectious period in days.
    pub duration: f64,
    /// Number of simulated days, starting at day 0.
    pub horizon: usize,
    /// Leading reported days dropped as unreliable.
    pub truncate: usize,
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        let tolerances = Tolerances::default();
        Parameters {
            susceptible: 7_722_935_549.0,
            infected: 1.0,
            recovered: 0.0,
            r0: 3.09,
            duration: 14.0,
            horizon: 535,
            truncate: 13,
            rtol: tolerances.rtol,
            atol: tolerances.atol,
            max_steps: tolerances.max_steps,
        }
    }
}

impl Parameters {
    /// Parameters given directly as rates rather than r0 and duration.
    pub fn from_rates(
        susceptible: f64,
        infected: f64,
        recovered: f64,
        beta: f64,
        gamma: f64,
        horizon: usize,
    ) -> Self {
        Parameters {
            susceptible,
            infected,
            recovered,
            r0: beta / gamma,
            duration: 1.0 / gamma,
            horizon,
            ..Parameters::default()
        }
    }

    pub fn population(&self) -> f64 {
        self.susceptible + self.infected + self.recovered
    }

    pub fn gamma(&self) -> f64 {
        1.0 / self.duration
    }

    pub fn beta(&self) -> f64 {
        self.r0 / self.duration
    }

    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            rtol: self.rtol,
            atol: self.atol,
            max_steps: self.max_steps,
        }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |msg: String| Err(SimulationError::InvalidParameters(msg));
        for (name, value) in [
            ("susceptible", self.susceptible),
            ("infected", self.infected),
            ("recovered", self.recovered),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{name} must be a non-negative number, got {value}"));
            }
        }
        if self.population() <= 0.0 {
            return invalid("population must be positive".to_string());
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return invalid(format!("duration must be positive, got {}", self.duration));
        }
        if !self.r0.is_finite() || self.r0 < 0.0 {
            return invalid(format!("r0 must be non-negative, got {}", self.r0));
        }
        if self.horizon == 0 {
            return invalid("horizon must be at least one day".to_string());
        }
        if !(self.rtol > 0.0 && self.atol > 0.0) || self.max_steps == 0 {
            return invalid("solver tolerances and step budget must be positive".to_string());
        }
        Ok(())
    }
}
