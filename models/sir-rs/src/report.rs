use std::fmt;

use casedata::CalendarDate;

use crate::output::SirOutput;
use crate::timeline::{ObservedSeries, Timeline};

/// First day the model has fewer than one infected individual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extinction {
    DiedOut {
        day: usize,
        date: CalendarDate,
        recovered: f64,
        susceptible: f64,
    },
    /// Infection was still at or above one on the last simulated day.
    Persisted { horizon: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub day: usize,
    pub date: CalendarDate,
    pub infected: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub current_date: CalendarDate,
    pub current_infected: i64,
    pub current_infected_model: f64,
    pub extinction: Extinction,
    pub peak: Option<Peak>,
}

impl Summary {
    /// Callers align `timeline` with `observed` first, so the last observed
    /// date is inside the simulated horizon.
    pub fn compute(observed: &ObservedSeries, output: &SirOutput, timeline: &Timeline) -> Summary {
        let (current_date, current_infected) = observed.last();
        let current_infected_model = timeline
            .day_for(current_date)
            .and_then(|day| output.infected.get(day).copied())
            .unwrap_or(f64::NAN);
        Summary {
            current_date,
            current_infected,
            current_infected_model,
            extinction: find_extinction(output, timeline),
            peak: find_peak(&output.infected, timeline),
        }
    }
}

pub fn find_extinction(output: &SirOutput, timeline: &Timeline) -> Extinction {
    match output.infected.iter().position(|&i| i < 1.0) {
        Some(day) => Extinction::DiedOut {
            day,
            date: timeline.calendar_date_for(day),
            recovered: output.recovered[day],
            susceptible: output.susceptible[day],
        },
        None => Extinction::Persisted {
            horizon: output.len(),
        },
    }
}

/// Largest value of `infected`, first occurrence on ties.
pub fn find_peak(infected: &[f64], timeline: &Timeline) -> Option<Peak> {
    let mut best: Option<(usize, f64)> = None;
    for (day, &value) in infected.iter().enumerate() {
        if best.is_none_or(|(_, max)| value > max) {
            best = Some((day, value));
        }
    }
    best.map(|(day, infected)| Peak {
        day,
        date: timeline.calendar_date_for(day),
        infected,
    })
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Current number of infected individuals ({}): {}",
            self.current_date, self.current_infected
        )?;
        writeln!(
            f,
            "Current number of infected individuals using SIR: {}",
            self.current_infected_model
        )?;
        match self.extinction {
            Extinction::DiedOut {
                day,
                date,
                recovered,
                susceptible,
            } => {
                writeln!(
                    f,
                    "Using SIR, the infection is expected to die out after {day} days on {date}"
                )?;
                writeln!(
                    f,
                    "Using SIR, the total number of infected/recovered is: {recovered}"
                )?;
                writeln!(f, "Using SIR, the total number of uninfected is: {susceptible}")?;
            }
            Extinction::Persisted { horizon } => {
                writeln!(
                    f,
                    "Using SIR, the infection did not die out within {horizon} days"
                )?;
            }
        }
        if let Some(peak) = &self.peak {
            writeln!(
                f,
                "Using SIR, the peak number of individuals infected in a single day is {} on {}",
                peak.infected, peak.date
            )?;
        }
        Ok(())
    }
}
