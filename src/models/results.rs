use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::item::ItemKind;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MultipleChoiceTally {
    pub correct: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractiveTally {
    pub score: i32,
    pub max_score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseEvaluation {
    Correct,
    Partial,
    Incorrect,
}

impl CaseEvaluation {
    /// Partial-credit weight used for display points.
    pub fn weight(&self) -> f64 {
        match self {
            CaseEvaluation::Correct => 1.0,
            CaseEvaluation::Partial => 0.5,
            CaseEvaluation::Incorrect => 0.0,
        }
    }
}

/// What the grading service returns per case sub-question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSubQuestionGrade {
    pub evaluation: CaseEvaluation,
    pub justification: String,
}

/// Per-type partial scoring state for one session. Owned exclusively by the
/// active session and mutated exactly once per completed item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultsAccumulator {
    pub multiple_choice: MultipleChoiceTally,
    pub case_study: Vec<CaseEvaluation>,
    pub interactive: InteractiveTally,
}

/// The common shape every item runner adapter reduces a completed item to.
/// Carries the item id so the orchestrator can reject stale or replayed
/// results instead of double-counting them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedItemResult {
    pub item_id: Uuid,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    MultipleChoice { is_correct: bool },
    CaseStudy { evaluations: Vec<CaseEvaluation> },
    Interactive { score: i32, max_score: i32 },
}

impl ItemOutcome {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemOutcome::MultipleChoice { .. } => ItemKind::MultipleChoice,
            ItemOutcome::CaseStudy { .. } => ItemKind::CaseStudy,
            ItemOutcome::Interactive { .. } => ItemKind::InteractiveDialogue,
        }
    }
}

impl ResultsAccumulator {
    /// Merges one normalized result. Case evaluations are appended entry by
    /// entry, never collapsed into a single number.
    pub fn merge(&mut self, result: &NormalizedItemResult) {
        match &result.outcome {
            ItemOutcome::MultipleChoice { is_correct } => {
                self.multiple_choice.total += 1;
                if *is_correct {
                    self.multiple_choice.correct += 1;
                }
            }
            ItemOutcome::CaseStudy { evaluations } => {
                self.case_study.extend(evaluations.iter().copied());
            }
            ItemOutcome::Interactive { score, max_score } => {
                self.interactive.score += score;
                self.interactive.max_score += max_score;
            }
        }
    }
}

/// Consolidated end-of-session report. The three per-type partials are kept
/// separate; the UI decides whether and how to combine them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub multiple_choice: MultipleChoiceTally,
    pub case_study: Vec<CaseEvaluation>,
    pub case_points: f64,
    pub case_max_points: f64,
    pub interactive: InteractiveTally,
    /// Pass/fail from the multiple-choice fraction alone; None when the
    /// session had no multiple-choice items.
    pub overall_pass: Option<bool>,
    pub generated_at: DateTime<Utc>,
}

/// Combined result of the standalone interactive flow: dialogue score plus
/// the optional bridging-quiz score, displayed side by side ("8/10 | 1/2"),
/// never blended into one number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractiveBreakdown {
    pub dialogue_score: i32,
    pub dialogue_max_score: i32,
    pub quiz: Option<QuizTally>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizTally {
    pub correct: u32,
    pub total: u32,
}

impl std::fmt::Display for InteractiveBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.dialogue_score, self.dialogue_max_score)?;
        if let Some(quiz) = &self.quiz {
            write!(f, " | {}/{}", quiz.correct, quiz.total)?;
        }
        Ok(())
    }
}
