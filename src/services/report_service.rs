use chrono::Utc;

use crate::models::results::{Report, ResultsAccumulator};

/// The exam's real pass rule: 70% of the multiple-choice questions.
pub const PASSING_PERCENTAGE: f64 = 70.0;

pub struct ReportService;

impl ReportService {
    /// Consolidates the accumulator into the final report. The three
    /// per-type partials are carried through unmodified; only the
    /// multiple-choice fraction feeds the pass flag, and only when
    /// multiple-choice items were present.
    pub fn aggregate(accumulator: &ResultsAccumulator) -> Report {
        let case_points: f64 = accumulator.case_study.iter().map(|e| e.weight()).sum();
        let case_max_points = accumulator.case_study.len() as f64;

        let overall_pass = if accumulator.multiple_choice.total > 0 {
            let percentage = (accumulator.multiple_choice.correct as f64
                / accumulator.multiple_choice.total as f64)
                * 100.0;
            Some(percentage >= PASSING_PERCENTAGE)
        } else {
            None
        };

        Report {
            multiple_choice: accumulator.multiple_choice,
            case_study: accumulator.case_study.clone(),
            case_points,
            case_max_points,
            interactive: accumulator.interactive,
            overall_pass,
            generated_at: Utc::now(),
        }
    }
}
