use chrono::{DateTime, Utc};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{errors::SimError, Result};

/// Shape parameters of the flip-flop model.
///
/// `d` scales the amplitude, `m` and `n` are first-order rate constants
/// in 1/day. The closed form is undefined when `m == n`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitParameters {
    pub d: f64,
    pub m: f64,
    pub n: f64,
}

impl FitParameters {
    /// Starting point used when the caller has no better guess.
    pub const DEFAULT_GUESS: FitParameters = FitParameters {
        d: 150.0,
        m: 0.05,
        n: 0.01,
    };

    pub fn new(d: f64, m: f64, n: f64) -> Self {
        Self { d, m, n }
    }

    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.d, self.m, self.n)
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.d, self.m, self.n]
    }

    pub fn from_array(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }
}

impl Default for FitParameters {
    fn default() -> Self {
        Self::DEFAULT_GUESS
    }
}

/// Outcome of a least-squares fit.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub parameters: FitParameters,
    /// Parameter covariance estimate. Filled with infinities when it cannot be estimated.
    pub covariance: DMatrix<f64>,
    /// Residual evaluations spent by the optimizer.
    pub evaluations: usize,
    pub residual_sum_of_squares: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub time: f64,
    pub concentration: f64,
}

/// Ordered (time, concentration) pairs used as fitting targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationSet {
    pub observations: Vec<Observation>,
}

impl ObservationSet {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn from_pairs(times: &[f64], concentrations: &[f64]) -> Result<Self> {
        if times.len() != concentrations.len() {
            return Err(SimError::InvalidInput(format!(
                "{} times but {} concentrations",
                times.len(),
                concentrations.len()
            )));
        }

        Ok(Self::new(
            times
                .iter()
                .zip(concentrations)
                .map(|(&time, &concentration)| Observation { time, concentration })
                .collect(),
        ))
    }

    /// Three synthetic points encoding the descriptors: the origin, the peak,
    /// and half the peak one half-life later.
    pub fn from_descriptors(descriptors: &PkDescriptors) -> Self {
        Self::new(vec![
            Observation { time: 0.0, concentration: 0.0 },
            Observation {
                time: descriptors.tmax,
                concentration: descriptors.cmax,
            },
            Observation {
                time: descriptors.tmax + descriptors.half_life,
                concentration: descriptors.cmax / 2.0,
            },
        ])
    }

    pub fn times(&self) -> Vec<f64> {
        self.observations.iter().map(|obs| obs.time).collect()
    }

    pub fn concentrations(&self) -> Vec<f64> {
        self.observations.iter().map(|obs| obs.concentration).collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Summary pharmacokinetic descriptors of a single LAI dose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PkDescriptors {
    /// Days from injection to peak plasma level.
    pub tmax: f64,
    /// Peak plasma level.
    pub cmax: f64,
    /// Elimination half-life in days.
    pub half_life: f64,
}

impl PkDescriptors {
    pub fn new(tmax: f64, cmax: f64, half_life: f64) -> Self {
        Self { tmax, cmax, half_life }
    }

    /// All three descriptors must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.tmax > 0.0 && self.cmax > 0.0 && self.half_life > 0.0 {
            Ok(())
        } else {
            Err(SimError::InvalidInput(format!(
                "tmax, cmax and half-life must be positive (got {}, {}, {})",
                self.tmax, self.cmax, self.half_life
            )))
        }
    }

    /// Ten half-lives past the peak.
    pub fn default_duration(&self) -> f64 {
        self.tmax + 10.0 * self.half_life
    }
}

/// One row of a persisted curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveRecord {
    pub days: usize,
    pub plasma_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub normalized_means: Vec<f64>,
    pub troughs: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TuningSource {
    Observations { path: PathBuf },
    Descriptors(PkDescriptors),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segmentation {
    Count(usize),
    Length(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub name: String,
    pub output_path: PathBuf,
    pub source: TuningSource,
    pub duration: Option<i64>,
    pub initial_guess: FitParameters,
    pub num_doses: usize,
    pub dose_interval: usize,
    pub segmentation: Option<Segmentation>,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SimError::ConfigurationError(
                "A simulation name is required to prefix output files".to_string(),
            ));
        }

        if let TuningSource::Descriptors(pk) = &self.source {
            pk.validate()
                .map_err(|err| SimError::ConfigurationError(err.to_string()))?;
        }

        match self.segmentation {
            Some(Segmentation::Count(0)) | Some(Segmentation::Length(0)) => {
                Err(SimError::ConfigurationError(
                    "Hair segmentation needs a positive count or length".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Prefix shared by every file written for this run.
    pub fn output_prefix(&self) -> PathBuf {
        self.output_path.join(&self.name)
    }
}

/// Run summary written next to the curve records by the command-line tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub config: SimulationConfig,
    pub parameters: FitParameters,
    pub residual_sum_of_squares: f64,
    pub single_dose_days: usize,
    pub single_dose_peak: f64,
    pub single_dose_peak_day: usize,
    pub repeated_dose_days: Option<usize>,
    pub segments: Option<SegmentSummary>,
}
