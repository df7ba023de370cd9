use casedata::{CalendarDate, CaseSeries};

use crate::error::SimulationError;

/// Reported daily cases kept for comparison, after the unreliable leading
/// days are dropped. Never empty.
#[derive(Debug, Clone)]
pub struct ObservedSeries {
    series: CaseSeries,
}

impl ObservedSeries {
    pub fn new(condensed: &CaseSeries, truncate: usize) -> Result<Self, SimulationError> {
        let series = condensed.skip(truncate);
        if series.is_empty() {
            return Err(SimulationError::NoObservedData {
                available: condensed.len(),
                truncate,
            });
        }
        Ok(ObservedSeries { series })
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn first(&self) -> (CalendarDate, i64) {
        self.series.entries()[0]
    }

    pub fn last(&self) -> (CalendarDate, i64) {
        self.series.entries()[self.series.len() - 1]
    }

    pub fn points(&self) -> &[(CalendarDate, i64)] {
        self.series.entries()
    }
}

/// Maps simulation days to calendar dates. Day 0 is the first observed
/// date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    origin: CalendarDate,
    horizon: usize,
}

impl Timeline {
    pub fn new(origin: CalendarDate, horizon: usize) -> Self {
        Timeline { origin, horizon }
    }

    /// Anchors the timeline on `observed` and checks that the horizon
    /// reaches its last date.
    pub fn align(observed: &ObservedSeries, horizon: usize) -> Result<Self, SimulationError> {
        let timeline = Timeline::new(observed.first().0, horizon);
        let (last_date, _) = observed.last();
        match timeline.day_for(last_date) {
            Some(_) => Ok(timeline),
            None => Err(SimulationError::HorizonTooShort {
                horizon,
                last_observed_day: timeline.days_since_origin(last_date).unwrap_or(0),
            }),
        }
    }

    pub fn origin(&self) -> CalendarDate {
        self.origin
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn calendar_date_for(&self, day: usize) -> CalendarDate {
        self.origin.plus_days(day as u64)
    }

    /// Simulation day of `date`, if it falls inside the horizon.
    pub fn day_for(&self, date: CalendarDate) -> Option<usize> {
        self.days_since_origin(date).filter(|&day| day < self.horizon)
    }

    fn days_since_origin(&self, date: CalendarDate) -> Option<usize> {
        let days = (date.naive() - self.origin.naive()).num_days();
        usize::try_from(days).ok()
    }

    pub fn last_date(&self) -> CalendarDate {
        self.calendar_date_for(self.horizon.saturating_sub(1))
    }
}
