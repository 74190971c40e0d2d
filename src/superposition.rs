//! Repeated-dose plasma levels by superposition of a single-dose curve.
//!
//! Assumes linear, time-invariant kinetics: each dose contributes the same
//! curve, delayed by one more dosing interval than the dose before it.

use crate::{errors::SimError, Result};

pub struct DoseSuperposer;

impl DoseSuperposer {
    /// Add `num_doses` further doses, `dose_interval` days apart, to `base`.
    ///
    /// The result covers `base.len() + num_doses * dose_interval` days. The first
    /// dose is `base` itself at day 0; dose `k` starts at day `k * dose_interval`.
    /// With `num_doses == 0` the base curve is returned unchanged, and with a zero
    /// interval all doses coincide at day 0.
    pub fn superpose(base: &[f64], num_doses: usize, dose_interval: usize) -> Result<Vec<f64>> {
        let total_len = Self::superposed_len(base.len(), num_doses, dose_interval)?;
        let mut plasma = Vec::with_capacity(total_len);
        plasma.extend_from_slice(base);
        plasma.resize(total_len, 0.0);

        let mut offset = 0;
        for _ in 0..num_doses {
            // the shifted copy trails the previous one by a further interval
            offset += dose_interval;
            for (level, dose_level) in plasma[offset..].iter_mut().zip(base) {
                *level += dose_level;
            }
        }

        log::debug!(
            "Superposed {} additional doses every {} days over {} days",
            num_doses,
            dose_interval,
            total_len
        );

        Ok(plasma)
    }

    pub fn superposed_len(base_len: usize, num_doses: usize, dose_interval: usize) -> Result<usize> {
        num_doses
            .checked_mul(dose_interval)
            .and_then(|extension| extension.checked_add(base_len))
            .ok_or_else(|| {
                SimError::InvalidInput(format!(
                    "{} doses every {} days overflow the simulation horizon",
                    num_doses, dose_interval
                ))
            })
    }
}
