use log::debug;
use nalgebra::Vector3;

use crate::error::SimulationError;
use crate::ode::DormandPrince;
use crate::output::SirOutput;
use crate::parameters::Parameters;

// Relative slack allowed on conservation and non-negativity.
const TOLERANCE: f64 = 1e-6;

pub struct SirModel {
    beta: f64,
    gamma: f64,
    population: f64,
}

impl SirModel {
    pub fn new(parameters: &Parameters) -> SirModel {
        SirModel {
            beta: parameters.beta(),
            gamma: parameters.gamma(),
            population: parameters.population(),
        }
    }

    /// dS/dt, dI/dt, dR/dt for a state (S, I, R).
    pub fn derivative(&self, state: &Vector3<f64>) -> Vector3<f64> {
        let (s, i) = (state[0], state[1]);
        let infections = self.beta * i * s / self.population;
        let recoveries = self.gamma * i;
        Vector3::new(-infections, infections - recoveries, recoveries)
    }

    pub fn simulate(parameters: &Parameters) -> Result<SirOutput, SimulationError> {
        parameters.validate()?;
        let model = SirModel::new(parameters);
        let initial = Vector3::new(
            parameters.susceptible,
            parameters.infected,
            parameters.recovered,
        );
        let times: Vec<f64> = (0..parameters.horizon).map(|day| day as f64).collect();

        let solution = DormandPrince::new(parameters.tolerances()).solve(
            |_, state: &Vector3<f64>| model.derivative(state),
            initial,
            &times,
        )?;
        debug!(
            "solver took {} steps ({} rejected, {} evaluations)",
            solution.stats.accepted, solution.stats.rejected, solution.stats.evaluations
        );

        let mut output = SirOutput::new(parameters.horizon);
        for (day, state) in solution.states.iter().enumerate() {
            model.check_state(day, state)?;
            output.susceptible.push(state[0]);
            output.infected.push(state[1]);
            output.recovered.push(state[2]);
        }
        Ok(output)
    }

    // Small negative overshoot near zero is left as is.
    fn check_state(&self, day: usize, state: &Vector3<f64>) -> Result<(), SimulationError> {
        let slack = TOLERANCE * self.population;
        let total = state.sum();
        if !total.is_finite() || f64::abs(total - self.population) > slack {
            return Err(SimulationError::ConservationViolated {
                day,
                total,
                expected: self.population,
            });
        }
        let compartments = ["susceptible", "infected", "recovered"];
        for (compartment, value) in compartments.into_iter().zip(state.iter()) {
            if *value < -slack {
                return Err(SimulationError::NegativeCompartment {
                    day,
                    compartment,
                    value: *value,
                });
            }
        }
        Ok(())
    }
}
