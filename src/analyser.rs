use crate::{errors::SimError, models::SegmentSummary, Result};
use itertools::Itertools;
use statrs::statistics::Statistics;

/// Summary statistics over hair segments.
pub struct SegmentAnalyser {
    values: Vec<f64>,
}

impl SegmentAnalyser {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Indices of local minima.
    ///
    /// A flat-bottomed trough reports the middle of its plateau (rounded down).
    /// The first and last samples are never troughs.
    pub fn find_troughs(&self) -> Vec<usize> {
        let mut start = 0;
        let runs: Vec<(usize, usize, f64)> = self
            .values
            .iter()
            .dedup_with_count()
            .map(|(count, &value)| {
                let run = (start, count, value);
                start += count;
                run
            })
            .collect();

        runs.iter()
            .tuple_windows::<(_, _, _)>()
            .filter(|(before, run, after)| before.2 > run.2 && run.2 < after.2)
            .map(|(_, &(start, count, _), _)| start + (count - 1) / 2)
            .collect()
    }

    /// Mean of each segment scaled so the largest mean is 1.
    pub fn homogenize(segments: &[Vec<f64>]) -> Result<Vec<f64>> {
        if segments.is_empty() {
            return Err(SimError::InvalidInput("No segments to homogenize".to_string()));
        }

        if let Some(i) = segments.iter().position(|segment| segment.is_empty()) {
            return Err(SimError::InvalidInput(format!("Segment {} is empty", i)));
        }

        let means: Vec<f64> = segments.iter().map(|segment| segment.iter().mean()).collect();
        let max_response = means.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if !(max_response > 0.0) {
            return Err(SimError::CalculationError(format!(
                "Cannot normalize segment means with maximum {}",
                max_response
            )));
        }

        Ok(means.iter().map(|mean| mean / max_response).collect())
    }

    /// Normalized segment means and the troughs among them.
    pub fn summarize(segments: &[Vec<f64>]) -> Result<SegmentSummary> {
        let normalized_means = Self::homogenize(segments)?;
        let troughs = Self::new(normalized_means.clone()).find_troughs();

        log::debug!(
            "{} segments, troughs at {:?}",
            normalized_means.len(),
            troughs
        );

        Ok(SegmentSummary {
            normalized_means,
            troughs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_strict_minima() {
        let analyser = SegmentAnalyser::new(vec![5.0, 3.0, 4.0, 6.0, 2.0, 7.0]);
        assert_eq!(analyser.find_troughs(), vec![1, 4]);
    }

    #[test]
    fn test_plateau_trough_reports_middle() {
        let analyser = SegmentAnalyser::new(vec![4.0, 1.0, 1.0, 1.0, 1.0, 3.0]);
        assert_eq!(analyser.find_troughs(), vec![2]);
    }

    #[test]
    fn test_edges_and_shelves_ignored() {
        assert!(SegmentAnalyser::new(vec![1.0, 2.0, 3.0]).find_troughs().is_empty());
        assert!(SegmentAnalyser::new(vec![3.0, 2.0, 2.0]).find_troughs().is_empty());
        assert!(SegmentAnalyser::new(vec![3.0, 2.0, 2.0, 1.0]).find_troughs().is_empty());
        assert!(SegmentAnalyser::new(vec![]).find_troughs().is_empty());
    }

    #[test]
    fn test_homogenize_scales_to_one() {
        let segments = vec![vec![1.0, 3.0], vec![4.0, 4.0], vec![0.0, 2.0]];
        let normalized = SegmentAnalyser::homogenize(&segments).unwrap();

        assert_relative_eq!(normalized[0], 0.5);
        assert_relative_eq!(normalized[1], 1.0);
        assert_relative_eq!(normalized[2], 0.25);
    }

    #[test]
    fn test_homogenize_rejects_bad_input() {
        assert!(SegmentAnalyser::homogenize(&[]).is_err());
        assert!(SegmentAnalyser::homogenize(&[vec![1.0], vec![]]).is_err());
        assert!(matches!(
            SegmentAnalyser::homogenize(&[vec![0.0, 0.0]]),
            Err(SimError::CalculationError(_))
        ));
    }
}
