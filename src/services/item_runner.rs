use crate::error::{Error, Result};
use crate::models::item::{AssessmentItem, ItemPayload};
use crate::models::results::{
    CaseSubQuestionGrade, InteractiveBreakdown, ItemOutcome, NormalizedItemResult, QuizTally,
};
use crate::services::dialogue_engine::DialogueOutcome;
use crate::services::grading_service::CaseGrader;

/// Scores one completed item per type and reduces it to a
/// `NormalizedItemResult` the orchestrator can merge. Each runner checks that
/// the item it was handed actually is of its type; a mismatch is queue
/// corruption, not a skippable condition.
pub struct ItemRunner;

impl ItemRunner {
    pub fn run_multiple_choice(
        item: &AssessmentItem,
        chosen_index: usize,
    ) -> Result<NormalizedItemResult> {
        let ItemPayload::MultipleChoice(payload) = &item.payload else {
            return Err(Error::QueueCorruption(format!(
                "item {} dispatched to the multiple-choice runner with a different payload",
                item.id
            )));
        };

        if chosen_index >= payload.options.len() {
            return Err(Error::InvalidState(format!(
                "chosen option index {} out of range for {} options",
                chosen_index,
                payload.options.len()
            )));
        }

        Ok(NormalizedItemResult {
            item_id: item.id,
            outcome: ItemOutcome::MultipleChoice {
                is_correct: chosen_index == payload.correct_answer,
            },
        })
    }

    /// Grades all sub-questions in one remote call. Returns the normalized
    /// result together with the per-sub-question grades so the host can show
    /// the justifications. Fails (without consuming anything) when the grader
    /// errors; the orchestrator's cursor is untouched until a result exists.
    pub async fn run_case_study(
        item: &AssessmentItem,
        answers: &[String],
        grader: &dyn CaseGrader,
    ) -> Result<(NormalizedItemResult, Vec<CaseSubQuestionGrade>)> {
        let ItemPayload::CaseStudy(payload) = &item.payload else {
            return Err(Error::QueueCorruption(format!(
                "item {} dispatched to the case-study runner with a different payload",
                item.id
            )));
        };

        if answers.len() != payload.sub_questions.len() {
            return Err(Error::InvalidState(format!(
                "{} answers supplied for {} sub-questions",
                answers.len(),
                payload.sub_questions.len()
            )));
        }

        let grades = grader
            .grade_case(&payload.context, &payload.sub_questions, answers)
            .await?;

        let result = NormalizedItemResult {
            item_id: item.id,
            outcome: ItemOutcome::CaseStudy {
                evaluations: grades.iter().map(|g| g.evaluation).collect(),
            },
        };

        Ok((result, grades))
    }

    /// Normalizes a finished dialogue for the mixed-queue flow.
    pub fn run_dialogue(
        item: &AssessmentItem,
        outcome: &DialogueOutcome,
    ) -> Result<NormalizedItemResult> {
        let ItemPayload::Interactive(_) = &item.payload else {
            return Err(Error::QueueCorruption(format!(
                "item {} dispatched to the dialogue runner with a different payload",
                item.id
            )));
        };

        Ok(NormalizedItemResult {
            item_id: item.id,
            outcome: ItemOutcome::Interactive {
                score: outcome.score,
                max_score: outcome.max_score,
            },
        })
    }

    /// Standalone (non-queue) interactive flow. When the item carries a
    /// bridging quiz the quiz answers are graded here and the final result
    /// keeps both component scores separate ("20/25 | 1/2"); they are never
    /// blended into one number.
    pub fn finish_standalone_dialogue(
        item: &AssessmentItem,
        outcome: &DialogueOutcome,
        quiz_answers: &[usize],
    ) -> Result<InteractiveBreakdown> {
        let ItemPayload::Interactive(payload) = &item.payload else {
            return Err(Error::QueueCorruption(format!(
                "item {} dispatched to the dialogue runner with a different payload",
                item.id
            )));
        };

        let quiz = if payload.follow_up_quiz.is_empty() {
            None
        } else {
            if quiz_answers.len() != payload.follow_up_quiz.len() {
                return Err(Error::InvalidState(format!(
                    "{} quiz answers supplied for {} bridging questions",
                    quiz_answers.len(),
                    payload.follow_up_quiz.len()
                )));
            }

            let correct = payload
                .follow_up_quiz
                .iter()
                .zip(quiz_answers.iter())
                .filter(|(question, chosen)| **chosen == question.correct_answer)
                .count() as u32;

            Some(QuizTally {
                correct,
                total: payload.follow_up_quiz.len() as u32,
            })
        };

        Ok(InteractiveBreakdown {
            dialogue_score: outcome.score,
            dialogue_max_score: outcome.max_score,
            quiz,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dialogue::DialogueTree;
    use crate::models::item::{
        BridgingQuestion, CaseSubQuestion, CaseStudyPayload, Difficulty, InteractivePayload,
        ItemKind, MultipleChoicePayload,
    };
    use crate::models::results::CaseEvaluation;
    use crate::services::grading_service::MockCaseGrader;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn mc_item(correct_answer: usize) -> AssessmentItem {
        AssessmentItem {
            id: Uuid::new_v4(),
            kind: ItemKind::MultipleChoice,
            payload: ItemPayload::MultipleChoice(MultipleChoicePayload {
                question: "Which instrument settles in D+1?".to_string(),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer,
                explanation: None,
                difficulty: Difficulty::Basic,
            }),
        }
    }

    fn interactive_item(quiz: Vec<BridgingQuestion>) -> AssessmentItem {
        AssessmentItem {
            id: Uuid::new_v4(),
            kind: ItemKind::InteractiveDialogue,
            payload: ItemPayload::Interactive(InteractivePayload {
                context: "A client calls about a margin call.".to_string(),
                tree: DialogueTree {
                    nodes: HashMap::new(),
                },
                follow_up_quiz: quiz,
            }),
        }
    }

    #[test]
    fn multiple_choice_compares_by_index() {
        let item = mc_item(2);

        let result = ItemRunner::run_multiple_choice(&item, 2).unwrap();
        assert!(matches!(
            result.outcome,
            ItemOutcome::MultipleChoice { is_correct: true }
        ));
        assert_eq!(result.item_id, item.id);

        let result = ItemRunner::run_multiple_choice(&item, 0).unwrap();
        assert!(matches!(
            result.outcome,
            ItemOutcome::MultipleChoice { is_correct: false }
        ));
    }

    #[test]
    fn wrong_payload_is_queue_corruption() {
        let item = mc_item(0);
        let outcome = DialogueOutcome {
            path: vec![],
            score: 0,
            max_score: 0,
        };
        let err = ItemRunner::run_dialogue(&item, &outcome).unwrap_err();
        assert!(matches!(err, Error::QueueCorruption(_)));
    }

    #[tokio::test]
    async fn case_study_preserves_one_evaluation_per_sub_question() {
        let item = AssessmentItem {
            id: Uuid::new_v4(),
            kind: ItemKind::CaseStudy,
            payload: ItemPayload::CaseStudy(CaseStudyPayload {
                context: "A 52-year-old investor...".to_string(),
                sub_questions: vec![
                    CaseSubQuestion {
                        prompt: "What risk profile applies?".to_string(),
                        ideal_answer: "Moderate".to_string(),
                    },
                    CaseSubQuestion {
                        prompt: "Which product fits?".to_string(),
                        ideal_answer: "Fixed income".to_string(),
                    },
                    CaseSubQuestion {
                        prompt: "What disclosure is required?".to_string(),
                        ideal_answer: "Suitability statement".to_string(),
                    },
                ],
            }),
        };

        let mut grader = MockCaseGrader::new();
        grader.expect_grade_case().returning(|_, _, _| {
            Ok(vec![
                CaseSubQuestionGrade {
                    evaluation: CaseEvaluation::Correct,
                    justification: "matches the ideal answer".to_string(),
                },
                CaseSubQuestionGrade {
                    evaluation: CaseEvaluation::Partial,
                    justification: "missing the rationale".to_string(),
                },
                CaseSubQuestionGrade {
                    evaluation: CaseEvaluation::Incorrect,
                    justification: "names the wrong document".to_string(),
                },
            ])
        });

        let answers = vec!["Moderate".to_string(), "Bonds".to_string(), "None".to_string()];
        let (result, grades) = ItemRunner::run_case_study(&item, &answers, &grader)
            .await
            .unwrap();

        let ItemOutcome::CaseStudy { evaluations } = result.outcome else {
            panic!("expected a case-study outcome");
        };
        assert_eq!(
            evaluations,
            vec![
                CaseEvaluation::Correct,
                CaseEvaluation::Partial,
                CaseEvaluation::Incorrect
            ]
        );
        assert_eq!(grades.len(), 3);
    }

    #[tokio::test]
    async fn grader_failure_produces_no_result() {
        let item = AssessmentItem {
            id: Uuid::new_v4(),
            kind: ItemKind::CaseStudy,
            payload: ItemPayload::CaseStudy(CaseStudyPayload {
                context: "ctx".to_string(),
                sub_questions: vec![CaseSubQuestion {
                    prompt: "p".to_string(),
                    ideal_answer: "a".to_string(),
                }],
            }),
        };

        let mut grader = MockCaseGrader::new();
        grader
            .expect_grade_case()
            .returning(|_, _, _| Err(Error::GradingService("judge unavailable".to_string())));

        let err = ItemRunner::run_case_study(&item, &["x".to_string()], &grader)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GradingService(_)));
    }

    #[test]
    fn bridging_quiz_keeps_component_scores_separate() {
        let item = interactive_item(vec![
            BridgingQuestion {
                question: "q1".to_string(),
                options: vec!["a".into(), "b".into()],
                correct_answer: 0,
            },
            BridgingQuestion {
                question: "q2".to_string(),
                options: vec!["a".into(), "b".into()],
                correct_answer: 1,
            },
        ]);
        let outcome = DialogueOutcome {
            path: vec![],
            score: 8,
            max_score: 10,
        };

        let breakdown =
            ItemRunner::finish_standalone_dialogue(&item, &outcome, &[0, 0]).unwrap();
        assert_eq!(breakdown.to_string(), "8/10 | 1/2");
    }

    #[test]
    fn dialogue_without_quiz_has_no_quiz_component() {
        let item = interactive_item(vec![]);
        let outcome = DialogueOutcome {
            path: vec![],
            score: 20,
            max_score: 25,
        };

        let breakdown = ItemRunner::finish_standalone_dialogue(&item, &outcome, &[]).unwrap();
        assert_eq!(breakdown.quiz, None);
        assert_eq!(breakdown.to_string(), "20/25");
    }
}
