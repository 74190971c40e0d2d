use crate::{
    concentration::ConcentrationModel,
    errors::SimError,
    models::{FitParameters, FitResult, ObservationSet},
    Result,
};
use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{DMatrix, DVector, Dyn, OMatrix, Owned, Vector3, U3};

const NUM_PARAMS: usize = 3;

/// Flip-flop model residuals against a fixed set of observations.
struct FlipFlopProblem<'a> {
    observations: &'a ObservationSet,
    times: Vec<f64>,
    params: Vector3<f64>,
}

impl<'a> FlipFlopProblem<'a> {
    fn new(observations: &'a ObservationSet, initial_guess: &FitParameters) -> Self {
        Self {
            observations,
            times: observations.times(),
            params: Vector3::from(initial_guess.as_array()),
        }
    }

    fn parameters(&self) -> FitParameters {
        FitParameters::new(self.params[0], self.params[1], self.params[2])
    }
}

impl LeastSquaresProblem<f64, Dyn, U3> for FlipFlopProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, U3>;
    type ParameterStorage = Owned<f64, U3>;

    fn set_params(&mut self, p: &Vector3<f64>) {
        self.params.copy_from(p);
    }

    fn params(&self) -> Vector3<f64> {
        self.params
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        let values = ConcentrationModel::concentrations(&self.times, &self.parameters()).ok()?;
        let residuals = DVector::from_iterator(
            values.len(),
            values
                .iter()
                .zip(&self.observations.observations)
                .map(|(predicted, obs)| predicted - obs.concentration),
        );

        residuals.iter().all(|r| r.is_finite()).then_some(residuals)
    }

    fn jacobian(&self) -> Option<OMatrix<f64, Dyn, U3>> {
        let params = self.parameters();
        let mut jacobian = OMatrix::<f64, Dyn, U3>::zeros(self.times.len());
        for (i, &t) in self.times.iter().enumerate() {
            let row = ConcentrationModel::jacobian_row(t, &params).ok()?;
            for (k, value) in row.iter().enumerate() {
                jacobian[(i, k)] = *value;
            }
        }

        jacobian.iter().all(|v| v.is_finite()).then_some(jacobian)
    }
}

/// Levenberg-Marquardt least squares of the flip-flop model against observations.
pub struct CurveFitter;

impl CurveFitter {
    /// Fit (d, m, n) to the observations starting from `initial_guess`.
    ///
    /// Any termination the optimizer does not report as successful is a
    /// [`SimError::FitError`].
    pub fn fit_observations(
        observations: &ObservationSet,
        initial_guess: &FitParameters,
    ) -> Result<FitResult> {
        if observations.is_empty() {
            return Err(SimError::InvalidInput(
                "Need at least one observation to fit the model".to_string(),
            ));
        }

        ConcentrationModel::check_domain(initial_guess)?;

        let problem = FlipFlopProblem::new(observations, initial_guess);
        if problem.residuals().is_none() {
            return Err(SimError::FitError(
                "Residuals are not finite at the initial guess".to_string(),
            ));
        }

        let (problem, report) = LevenbergMarquardt::new().minimize(problem);
        if !report.termination.was_successful() {
            return Err(SimError::FitError(format!(
                "Optimizer stopped without converging: {:?} after {} evaluations",
                report.termination, report.number_of_evaluations
            )));
        }

        let parameters = problem.parameters();
        let residuals = problem.residuals().ok_or_else(|| {
            SimError::FitError("Residuals are not finite at the fitted parameters".to_string())
        })?;
        let cost = residuals.norm_squared();

        log::debug!(
            "Fit terminated ({:?}) after {} evaluations: d={:.6}, m={:.6}, n={:.6}, rss={:.3e}",
            report.termination,
            report.number_of_evaluations,
            parameters.d,
            parameters.m,
            parameters.n,
            cost
        );

        let covariance = Self::covariance(&problem, cost)?;

        Ok(FitResult {
            parameters,
            covariance,
            evaluations: report.number_of_evaluations,
            residual_sum_of_squares: cost,
        })
    }

    /// Covariance from the pseudo-inverse of JᵀJ scaled by the residual variance.
    /// Infinite when there are no spare degrees of freedom.
    fn covariance(problem: &FlipFlopProblem<'_>, cost: f64) -> Result<DMatrix<f64>> {
        let n_obs = problem.times.len();
        if n_obs <= NUM_PARAMS {
            return Ok(DMatrix::from_element(NUM_PARAMS, NUM_PARAMS, f64::INFINITY));
        }

        let jacobian = problem.jacobian().ok_or_else(|| {
            SimError::FitError("Jacobian is not finite at the fitted parameters".to_string())
        })?;
        let jacobian = DMatrix::from_column_slice(n_obs, NUM_PARAMS, jacobian.as_slice());
        let svd = jacobian.svd(false, true);
        let v_t = match svd.v_t {
            Some(v_t) => v_t,
            None => return Ok(DMatrix::from_element(NUM_PARAMS, NUM_PARAMS, f64::INFINITY)),
        };

        let threshold = f64::EPSILON * n_obs.max(NUM_PARAMS) as f64 * svd.singular_values.max();
        let mut pinv = DMatrix::<f64>::zeros(NUM_PARAMS, NUM_PARAMS);
        for (k, &sigma) in svd.singular_values.iter().enumerate() {
            if sigma > threshold {
                let row = v_t.row(k);
                pinv += row.transpose() * row / (sigma * sigma);
            }
        }

        Ok(pinv * (cost / (n_obs - NUM_PARAMS) as f64))
    }
}
