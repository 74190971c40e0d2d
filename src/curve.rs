use crate::{concentration::ConcentrationModel, models::FitParameters, Result};

pub struct CurveGenerator;

impl CurveGenerator {
    /// Daily plasma levels for days `0..duration`. Non-positive durations give an empty curve.
    pub fn generate(params: &FitParameters, duration: i64) -> Result<Vec<f64>> {
        if duration <= 0 {
            return Ok(Vec::new());
        }

        let days: Vec<f64> = (0..duration).map(|day| day as f64).collect();
        ConcentrationModel::concentrations(&days, params)
    }

    /// Number of whole days in the half-open range `[0, duration)`.
    pub fn days_in(duration: f64) -> i64 {
        duration.ceil() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_length() {
        let params = FitParameters::new(100.0, 0.1, 0.5);
        for duration in [-5, 0, 1, 2, 21, 365] {
            let curve = CurveGenerator::generate(&params, duration).unwrap();
            assert_eq!(curve.len(), duration.max(0) as usize);
        }
    }

    #[test]
    fn test_generate_is_pure() {
        let params = FitParameters::new(75.0, 0.03, 0.2);
        let first = CurveGenerator::generate(&params, 90).unwrap();
        let second = CurveGenerator::generate(&params, 90).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0], 0.0);
    }

    #[test]
    fn test_days_in_half_open_range() {
        assert_eq!(CurveGenerator::days_in(21.0), 21);
        assert_eq!(CurveGenerator::days_in(20.5), 21);
        assert_eq!(CurveGenerator::days_in(0.0), 0);
        assert_eq!(CurveGenerator::days_in(-3.0), -3);
    }

    #[test]
    fn test_degenerate_rates_with_empty_range() {
        let params = FitParameters::new(10.0, 0.4, 0.4);
        assert!(CurveGenerator::generate(&params, 0).unwrap().is_empty());
        assert!(CurveGenerator::generate(&params, 5).is_err());
    }
}
