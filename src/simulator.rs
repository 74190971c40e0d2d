use crate::{
    curve::CurveGenerator,
    errors::SimError,
    fitting::CurveFitter,
    models::{FitParameters, FitResult, ObservationSet, PkDescriptors},
    output::ResultStore,
    superposition::DoseSuperposer,
    Result,
};
use std::path::{Path, PathBuf};

/// Flip-flop simulator for plasma levels after single and repeated depot injections.
///
/// Tuning fits the model and regenerates the single-dose curve in one step.
/// The repeated-dose curve is only recomputed by [`LaiSimulator::simulate_n`].
#[derive(Debug, Clone, Default)]
pub struct LaiSimulator {
    name: String,
    fit: Option<FitResult>,
    curve: Option<Vec<f64>>,
    plasma: Option<Vec<f64>>,
}

impl LaiSimulator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build a simulator tuned against observed plasma levels.
    pub fn from_observations(
        name: impl Into<String>,
        observations: &ObservationSet,
        duration: i64,
        initial_guess: &FitParameters,
    ) -> Result<Self> {
        let mut simulator = Self::new(name);
        simulator.tune(observations, duration, initial_guess)?;
        Ok(simulator)
    }

    /// Build a simulator tuned from tmax, cmax and half-life.
    pub fn from_pk_descriptors(
        name: impl Into<String>,
        descriptors: &PkDescriptors,
        duration: Option<i64>,
        initial_guess: &FitParameters,
    ) -> Result<Self> {
        let mut simulator = Self::new(name);
        simulator.pk_tune(descriptors, duration, initial_guess)?;
        Ok(simulator)
    }

    /// Fit the model to `observations` and simulate `duration` days of a single dose.
    ///
    /// On error the previous fit and curves are kept.
    pub fn tune(
        &mut self,
        observations: &ObservationSet,
        duration: i64,
        initial_guess: &FitParameters,
    ) -> Result<()> {
        let fit = CurveFitter::fit_observations(observations, initial_guess)?;
        let curve = CurveGenerator::generate(&fit.parameters, duration)?;

        log::info!(
            "Tuned '{}' on {} observations: d={:.4}, m={:.5}, n={:.5} ({} days)",
            self.name,
            observations.len(),
            fit.parameters.d,
            fit.parameters.m,
            fit.parameters.n,
            curve.len()
        );

        self.fit = Some(fit);
        self.curve = Some(curve);
        Ok(())
    }

    /// Tune from descriptors. Without a duration, ten half-lives past tmax are simulated.
    pub fn pk_tune(
        &mut self,
        descriptors: &PkDescriptors,
        duration: Option<i64>,
        initial_guess: &FitParameters,
    ) -> Result<()> {
        descriptors.validate()?;
        let observations = ObservationSet::from_descriptors(descriptors);
        let duration =
            duration.unwrap_or_else(|| CurveGenerator::days_in(descriptors.default_duration()));
        self.tune(&observations, duration, initial_guess)
    }

    /// Superpose `num_doses` further doses every `dose_interval` days on the single-dose curve.
    pub fn simulate_n(&mut self, num_doses: usize, dose_interval: usize) -> Result<&[f64]> {
        let curve = self.curve.as_deref().ok_or_else(|| {
            SimError::ConfigurationError(format!(
                "Simulator '{}' must be tuned before simulating repeated doses",
                self.name
            ))
        })?;

        let plasma = DoseSuperposer::superpose(curve, num_doses, dose_interval)?;
        Ok(self.plasma.insert(plasma).as_slice())
    }

    /// Save the curves under `path`, or under the simulator name when no path is given.
    pub fn save(&self, path: Option<&Path>) -> Result<Vec<PathBuf>> {
        let prefix = match path {
            Some(path) if !path.as_os_str().is_empty() => path.to_path_buf(),
            _ if !self.name.is_empty() => PathBuf::from(&self.name),
            _ => {
                return Err(SimError::ConfigurationError(
                    "If no name is set, a path must be provided".to_string(),
                ))
            }
        };

        ResultStore::save(prefix, self.curve(), self.plasma())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fit(&self) -> Option<&FitResult> {
        self.fit.as_ref()
    }

    pub fn parameters(&self) -> Option<FitParameters> {
        self.fit.as_ref().map(|fit| fit.parameters)
    }

    pub fn curve(&self) -> Option<&[f64]> {
        self.curve.as_deref()
    }

    pub fn plasma(&self) -> Option<&[f64]> {
        self.plasma.as_deref()
    }
}
