use crate::{errors::SimError, models::FitParameters, Result};

/// Closed-form flip-flop kinetics for a single depot injection.
pub struct ConcentrationModel;

impl ConcentrationModel {
    /// Plasma level `t` days after the dose:
    /// `(exp(-m t) - exp(-n t)) * m d / (n - m)`
    pub fn concentration(t: f64, params: &FitParameters) -> Result<f64> {
        Self::check_domain(params)?;
        Ok(Self::evaluate(t, params))
    }

    /// Element-wise form of [`ConcentrationModel::concentration`].
    pub fn concentrations(times: &[f64], params: &FitParameters) -> Result<Vec<f64>> {
        Self::check_domain(params)?;
        Ok(times.iter().map(|&t| Self::evaluate(t, params)).collect())
    }

    /// Partial derivatives (dC/dd, dC/dm, dC/dn) at time `t`.
    pub fn jacobian_row(t: f64, params: &FitParameters) -> Result<[f64; 3]> {
        Self::check_domain(params)?;

        let FitParameters { d, m, n } = *params;
        let decay_m = (-m * t).exp();
        let decay_n = (-n * t).exp();
        let spread = decay_m - decay_n;
        let gap = n - m;
        let scale = m / gap;

        Ok([
            scale * spread,
            d * spread * n / (gap * gap) - d * scale * t * decay_m,
            -d * spread * m / (gap * gap) + d * scale * t * decay_n,
        ])
    }

    pub(crate) fn check_domain(params: &FitParameters) -> Result<()> {
        if !params.m.is_finite() || !params.n.is_finite() || !params.d.is_finite() {
            return Err(SimError::DomainError(format!(
                "Non-finite model parameters (d={}, m={}, n={})",
                params.d, params.m, params.n
            )));
        }

        if params.m == params.n {
            return Err(SimError::DomainError(format!(
                "Rate constants must differ (m = n = {})",
                params.m
            )));
        }

        Ok(())
    }

    fn evaluate(t: f64, params: &FitParameters) -> f64 {
        let FitParameters { d, m, n } = *params;
        ((-m * t).exp() - (-n * t).exp()) * (m * d) / (n - m)
    }
}
