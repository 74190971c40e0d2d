use crate::{
    errors::SimError,
    models::{Observation, ObservationSet},
    Result,
};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

/// Reads `time,concentration` tables of observed plasma levels.
pub struct ObservationParser;

impl ObservationParser {
    pub fn parse_file<P: AsRef<Path>>(file_path: P) -> Result<ObservationSet> {
        let file = File::open(file_path)?;
        Self::parse_reader(file)
    }

    pub fn parse_reader<R: std::io::Read>(reader: R) -> Result<ObservationSet> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut observations = Vec::new();
        for (row, result) in reader.deserialize().enumerate() {
            let obs: Observation = result?;
            Self::validate(&obs, row + 1)?;
            observations.push(obs);
        }

        if observations.is_empty() {
            return Err(SimError::ParseError("No observations found".to_string()));
        }

        observations.sort_by(|a, b| a.time.total_cmp(&b.time));
        log::debug!("Parsed {} observations", observations.len());

        Ok(ObservationSet::new(observations))
    }

    fn validate(obs: &Observation, row: usize) -> Result<()> {
        if !obs.time.is_finite() || obs.time < 0.0 {
            return Err(SimError::ParseError(format!(
                "Row {}: time must be a non-negative number, got {}",
                row, obs.time
            )));
        }

        if !obs.concentration.is_finite() || obs.concentration < 0.0 {
            return Err(SimError::ParseError(format!(
                "Row {}: concentration must be a non-negative number, got {}",
                row, obs.concentration
            )));
        }

        Ok(())
    }
}
