use thiserror::Error;

use crate::ode::SolverError;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("population not conserved on day {day}: S+I+R = {total}, expected {expected}")]
    ConservationViolated { day: usize, total: f64, expected: f64 },

    #[error("{compartment} compartment went negative on day {day}: {value}")]
    NegativeCompartment {
        day: usize,
        compartment: &'static str,
        value: f64,
    },

    #[error("only {available} reported days, none left after dropping the first {truncate}")]
    NoObservedData { available: usize, truncate: usize },

    #[error(
        "horizon of {horizon} days ends before the last observed date (day {last_observed_day})"
    )]
    HorizonTooShort {
        horizon: usize,
        last_observed_day: usize,
    },
}
