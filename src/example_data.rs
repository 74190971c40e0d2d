use crate::{
    concentration::ConcentrationModel,
    errors::SimError,
    models::{FitParameters, Observation, ObservationSet},
    Result,
};
use csv::Writer;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::LogNormal;
use std::path::Path;

/// Parameters behind the generated example: peak near day 9, slow terminal decline.
pub const EXAMPLE_PARAMETERS: FitParameters = FitParameters {
    d: 180.0,
    m: 0.04,
    n: 0.25,
};

/// Sampling days of a typical monthly depot study.
pub const EXAMPLE_SAMPLING_DAYS: [f64; 12] =
    [0.0, 1.0, 2.0, 4.0, 7.0, 10.0, 14.0, 21.0, 28.0, 42.0, 56.0, 84.0];

pub struct ExampleDataGenerator;

impl ExampleDataGenerator {
    /// Write noisy observations of [`EXAMPLE_PARAMETERS`] to a `time,concentration` file.
    pub fn generate_dataset<P: AsRef<Path>>(output_path: P, cv: f64) -> Result<ObservationSet> {
        let mut rng = StdRng::seed_from_u64(42); // Reproducible results
        let observations =
            Self::generate_observations(&mut rng, &EXAMPLE_PARAMETERS, &EXAMPLE_SAMPLING_DAYS, cv)?;

        let mut writer = Writer::from_path(output_path)?;
        for obs in &observations.observations {
            writer.serialize(obs)?;
        }
        writer.flush()?;

        log::info!("Generated example dataset with {} observations", observations.len());
        Ok(observations)
    }

    /// Model values at `times` with multiplicative log-normal error of coefficient of variation `cv`.
    pub fn generate_observations(
        rng: &mut StdRng,
        params: &FitParameters,
        times: &[f64],
        cv: f64,
    ) -> Result<ObservationSet> {
        let values = ConcentrationModel::concentrations(times, params)?;
        let noise = Self::residual_error(cv)?;

        let observations = times
            .iter()
            .zip(values)
            .map(|(&time, concentration)| {
                let factor = noise.as_ref().map_or(1.0, |dist| dist.sample(&mut *rng));
                Observation {
                    time,
                    concentration: (concentration * factor).max(0.0),
                }
            })
            .collect();

        Ok(ObservationSet::new(observations))
    }

    /// Log-normal error factor with unit mean. `None` when there is no noise.
    fn residual_error(cv: f64) -> Result<Option<LogNormal>> {
        if !(cv >= 0.0) {
            return Err(SimError::InvalidInput(format!(
                "Coefficient of variation must be non-negative, got {}",
                cv
            )));
        }

        if cv == 0.0 {
            return Ok(None);
        }

        let sigma = (1.0 + cv * cv).ln().sqrt();
        let mu = -0.5 * sigma * sigma;
        Ok(Some(LogNormal::new(mu, sigma)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_free_matches_model() {
        let mut rng = StdRng::seed_from_u64(7);
        let set = ExampleDataGenerator::generate_observations(
            &mut rng,
            &EXAMPLE_PARAMETERS,
            &EXAMPLE_SAMPLING_DAYS,
            0.0,
        )
        .unwrap();

        let expected =
            ConcentrationModel::concentrations(&EXAMPLE_SAMPLING_DAYS, &EXAMPLE_PARAMETERS).unwrap();
        assert_eq!(set.concentrations(), expected);
    }

    #[test]
    fn test_noisy_values_stay_non_negative() {
        let mut rng = StdRng::seed_from_u64(1);
        let set = ExampleDataGenerator::generate_observations(
            &mut rng,
            &EXAMPLE_PARAMETERS,
            &EXAMPLE_SAMPLING_DAYS,
            0.3,
        )
        .unwrap();

        assert_eq!(set.len(), EXAMPLE_SAMPLING_DAYS.len());
        assert_eq!(set.observations[0].concentration, 0.0);
        assert!(set.concentrations().iter().all(|&c| c >= 0.0 && c.is_finite()));
        assert_ne!(
            set.concentrations(),
            ConcentrationModel::concentrations(&EXAMPLE_SAMPLING_DAYS, &EXAMPLE_PARAMETERS).unwrap()
        );
    }

    #[test]
    fn test_negative_noise_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = ExampleDataGenerator::generate_observations(
            &mut rng,
            &EXAMPLE_PARAMETERS,
            &EXAMPLE_SAMPLING_DAYS,
            -0.1,
        )
        .unwrap_err();

        assert!(matches!(err, SimError::InvalidInput(_)));
    }
}
