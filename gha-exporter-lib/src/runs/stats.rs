use super::record::{Conclusion, RunRecord};

/// Summary statistics over a sample of runs
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub total_runs: usize,
    pub completed_runs: usize,
    pub failures: usize,

    /// Fraction of completed runs that failed (0..1)
    pub failure_rate: f64,

    pub duration_p50_minutes: f64,
    pub duration_p95_minutes: f64,
    pub duration_max_minutes: f64,
}

impl RunStats {
    /// Compute statistics over `runs`. Durations only consider completed runs.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "acceptable for statistics")]
    pub fn from_runs(runs: &[RunRecord]) -> Self {
        let completed: Vec<&RunRecord> = runs.iter().filter(|r| r.is_completed()).collect();
        let failures = completed.iter().filter(|r| r.conclusion == Some(Conclusion::Failure)).count();

        let failure_rate = if completed.is_empty() {
            0.0
        } else {
            failures as f64 / completed.len() as f64
        };

        let mut minutes: Vec<f64> = completed
            .iter()
            .map(|r| r.duration_minutes())
            .filter(|m| m.is_finite())
            .collect();
        minutes.sort_by(f64::total_cmp);

        Self {
            total_runs: runs.len(),
            completed_runs: completed.len(),
            failures,
            failure_rate,
            duration_p50_minutes: percentile(&minutes, 50),
            duration_p95_minutes: percentile(&minutes, 95),
            duration_max_minutes: minutes.last().copied().unwrap_or(0.0),
        }
    }
}

/// Nearest-rank percentile: index `floor(len * p / 100)`, clamped to the last element.
fn percentile(sorted_data: &[f64], percentile: usize) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let idx = (sorted_data.len() * percentile / 100).min(sorted_data.len() - 1);
    sorted_data[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::RunStatus;
    use chrono::{DateTime, Duration};

    fn run(id: u64, status: RunStatus, conclusion: Option<Conclusion>, minutes: i64) -> RunRecord {
        let created_at = DateTime::from_timestamp(1_704_067_200, 0).unwrap();
        let updated_at = created_at + Duration::minutes(minutes);
        RunRecord {
            id,
            run_number: id,
            status,
            conclusion,
            created_at,
            updated_at,
            duration_seconds: (updated_at - created_at).to_std().unwrap().as_secs_f64(),
            head_branch: String::new(),
            short_sha: String::new(),
            html_url: String::new(),
            event: "merge_group".to_string(),
        }
    }

    #[test]
    fn test_percentile_empty() {
        assert!(percentile(&[], 50).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentile_single_element() {
        assert!((percentile(&[42.0], 95) - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile(&data, 50) - 3.0).abs() < f64::EPSILON);
        assert!((percentile(&data, 95) - 5.0).abs() < f64::EPSILON);
        assert!((percentile(&data, 100) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_empty() {
        let stats = RunStats::from_runs(&[]);
        assert_eq!(stats.total_runs, 0);
        assert_eq!(stats.completed_runs, 0);
        assert!(stats.failure_rate.abs() < f64::EPSILON);
        assert!(stats.duration_max_minutes.abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_mixed_runs() {
        let runs = [
            run(1, RunStatus::Completed, Some(Conclusion::Success), 10),
            run(2, RunStatus::Completed, Some(Conclusion::Failure), 30),
            run(3, RunStatus::Completed, Some(Conclusion::Success), 20),
            run(4, RunStatus::Completed, Some(Conclusion::Cancelled), 5),
            run(5, RunStatus::InProgress, None, 500),
        ];

        let stats = RunStats::from_runs(&runs);
        assert_eq!(stats.total_runs, 5);
        assert_eq!(stats.completed_runs, 4);
        assert_eq!(stats.failures, 1);
        assert!((stats.failure_rate - 0.25).abs() < f64::EPSILON);
        assert!((stats.duration_p50_minutes - 20.0).abs() < f64::EPSILON);
        assert!((stats.duration_p95_minutes - 30.0).abs() < f64::EPSILON);
        assert!((stats.duration_max_minutes - 30.0).abs() < f64::EPSILON);
    }
}
