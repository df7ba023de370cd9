use casedata::Environment;

use crate::timeline::Timeline;

/// Daily compartment sizes, index = simulation day.
#[derive(Debug, Clone, Default)]
pub struct SirOutput {
    pub susceptible: Vec<f64>,
    pub infected: Vec<f64>,
    pub recovered: Vec<f64>,
}

impl SirOutput {
    pub fn new(len: usize) -> SirOutput {
        SirOutput {
            susceptible: Vec::with_capacity(len),
            infected: Vec::with_capacity(len),
            recovered: Vec::with_capacity(len),
        }
    }

    pub fn len(&self) -> usize {
        self.infected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infected.is_empty()
    }

    pub fn write_csv(
        &self,
        env: &Environment<impl Sized>,
        filename: &str,
        timeline: &Timeline,
    ) -> casedata::Result<()> {
        let rows: Vec<Vec<String>> = (0..self.len())
            .map(|day| {
                vec![
                    day.to_string(),
                    timeline.calendar_date_for(day).to_string(),
                    self.susceptible[day].to_string(),
                    self.infected[day].to_string(),
                    self.recovered[day].to_string(),
                ]
            })
            .collect();
        env.write_csv(
            filename,
            &["day", "date", "susceptible", "infected", "recovered"],
            &rows,
        )
    }
}
