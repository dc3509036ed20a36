use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::session_dto::StartSessionRequest;
use crate::error::{Error, Result};
use crate::models::item::AssessmentItem;
use crate::models::results::{NormalizedItemResult, Report, ResultsAccumulator};
use crate::services::content_service::ContentService;
use crate::services::report_service::ReportService;

/// The ordered item queue of one full mock-exam session. Insertion order is
/// presentation order and is fixed for the session's lifetime. The cursor is
/// deliberately not stored here: it travels through `SessionRunner::advance`
/// so the whole session state stays a serializable
/// `(queue, cursor, accumulator)` triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentQueue {
    pub session_id: Uuid,
    pub items: Vec<AssessmentItem>,
    pub started_at: DateTime<Utc>,
}

impl AssessmentQueue {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NextAction {
    DispatchItem {
        cursor: usize,
        item: AssessmentItem,
    },
    Complete {
        accumulator: ResultsAccumulator,
    },
}

#[derive(Debug, Clone)]
pub struct Advance {
    pub next_cursor: usize,
    pub next_accumulator: ResultsAccumulator,
    pub next_action: NextAction,
}

/// Builds session queues from the remote content source.
#[derive(Clone)]
pub struct SessionService {
    content_service: ContentService,
}

impl SessionService {
    pub fn new(content_service: ContentService) -> Self {
        Self { content_service }
    }

    /// Fetches content for the requested filters and builds the queue:
    /// multiple-choice first, then case studies, then interactive items.
    /// Short pools are taken as-is with a warning; an empty queue is a
    /// `ContentLoad` error.
    pub async fn start_session(&self, request: &StartSessionRequest) -> Result<AssessmentQueue> {
        request.validate()?;

        let bundle = self.content_service.fetch_items(&request.filters).await?;

        let mut items = Vec::new();
        items.extend(take_pool(
            bundle.multiple_choice,
            request.mc_count as usize,
            "multiple-choice",
        ));
        items.extend(take_pool(
            bundle.case_studies,
            request.case_count as usize,
            "case-study",
        ));
        items.extend(take_pool(
            bundle.interactive,
            request.interactive_count as usize,
            "interactive",
        ));

        if items.is_empty() {
            return Err(Error::ContentLoad(
                "no items available for the requested session".to_string(),
            ));
        }

        let queue = AssessmentQueue {
            session_id: Uuid::new_v4(),
            items,
            started_at: Utc::now(),
        };
        tracing::info!(
            session_id = %queue.session_id,
            items = queue.len(),
            "Mock exam session started"
        );

        Ok(queue)
    }
}

fn take_pool(pool: Vec<AssessmentItem>, requested: usize, label: &str) -> Vec<AssessmentItem> {
    if pool.len() < requested {
        tracing::warn!(
            "Only {} {} items available of {} requested",
            pool.len(),
            label,
            requested
        );
    }
    pool.into_iter().take(requested).collect()
}

/// The orchestrator's step function. Pure and synchronous: the same inputs
/// always produce the same outputs, so a session can be resumed from
/// persisted state and a duplicate trigger can never double-count.
pub struct SessionRunner;

impl SessionRunner {
    /// One orchestration step. With a `last_item_result` the result is merged
    /// and the cursor moves; without one the call is a pure read that
    /// re-issues the pending dispatch (or `Complete` at the end of the
    /// queue). A result that does not belong to the item at the cursor,
    /// such as a replay after the cursor already moved, is `QueueCorruption`:
    /// items are never silently skipped or double-counted.
    pub fn advance(
        queue: &AssessmentQueue,
        cursor: usize,
        accumulator: &ResultsAccumulator,
        last_item_result: Option<&NormalizedItemResult>,
    ) -> Result<Advance> {
        if cursor > queue.len() {
            return Err(Error::QueueCorruption(format!(
                "cursor {} beyond queue of {} items",
                cursor,
                queue.len()
            )));
        }

        let mut next_accumulator = accumulator.clone();
        let mut next_cursor = cursor;

        if let Some(result) = last_item_result {
            let item = queue.items.get(cursor).ok_or_else(|| {
                Error::QueueCorruption(
                    "item result supplied after the queue was exhausted".to_string(),
                )
            })?;
            if result.item_id != item.id {
                return Err(Error::QueueCorruption(format!(
                    "result for item {} does not match item {} at cursor {}",
                    result.item_id, item.id, cursor
                )));
            }
            if result.outcome.kind() != item.kind {
                return Err(Error::QueueCorruption(format!(
                    "result kind {:?} does not match item kind {:?}",
                    result.outcome.kind(),
                    item.kind
                )));
            }

            next_accumulator.merge(result);
            next_cursor += 1;
        }

        let next_action = match queue.items.get(next_cursor) {
            Some(item) => {
                if !item.is_consistent() {
                    return Err(Error::QueueCorruption(format!(
                        "item {} has no matching adapter for its payload",
                        item.id
                    )));
                }
                NextAction::DispatchItem {
                    cursor: next_cursor,
                    item: item.clone(),
                }
            }
            None => NextAction::Complete {
                accumulator: next_accumulator.clone(),
            },
        };

        Ok(Advance {
            next_cursor,
            next_accumulator,
            next_action,
        })
    }

    /// Best-effort exit after a session-fatal error: whatever was scored so
    /// far becomes the final report.
    pub fn abort(accumulator: &ResultsAccumulator) -> Report {
        tracing::error!("Session aborted; reporting partial results");
        ReportService::aggregate(accumulator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::{Difficulty, ItemKind, ItemPayload, MultipleChoicePayload};
    use crate::models::results::ItemOutcome;

    fn mc_item() -> AssessmentItem {
        AssessmentItem {
            id: Uuid::new_v4(),
            kind: ItemKind::MultipleChoice,
            payload: ItemPayload::MultipleChoice(MultipleChoicePayload {
                question: "q".to_string(),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: 0,
                explanation: None,
                difficulty: Difficulty::Basic,
            }),
        }
    }

    fn mc_queue(n: usize) -> AssessmentQueue {
        AssessmentQueue {
            session_id: Uuid::new_v4(),
            items: (0..n).map(|_| mc_item()).collect(),
            started_at: Utc::now(),
        }
    }

    fn mc_result(item: &AssessmentItem, is_correct: bool) -> NormalizedItemResult {
        NormalizedItemResult {
            item_id: item.id,
            outcome: ItemOutcome::MultipleChoice { is_correct },
        }
    }

    #[test]
    fn advance_without_result_is_a_pure_read() {
        let queue = mc_queue(2);
        let accumulator = ResultsAccumulator::default();

        let first = SessionRunner::advance(&queue, 0, &accumulator, None).unwrap();
        let second = SessionRunner::advance(&queue, 0, &accumulator, None).unwrap();

        assert_eq!(first.next_cursor, 0);
        assert_eq!(second.next_cursor, 0);
        assert_eq!(first.next_accumulator, accumulator);
        assert!(matches!(
            first.next_action,
            NextAction::DispatchItem { cursor: 0, .. }
        ));
    }

    #[test]
    fn replayed_result_is_rejected_not_double_counted() {
        let queue = mc_queue(2);
        let accumulator = ResultsAccumulator::default();
        let result = mc_result(&queue.items[0], true);

        let advance = SessionRunner::advance(&queue, 0, &accumulator, Some(&result)).unwrap();
        assert_eq!(advance.next_cursor, 1);
        assert_eq!(advance.next_accumulator.multiple_choice.correct, 1);

        // Replaying the consumed result at the new cursor must fail loudly.
        let err = SessionRunner::advance(
            &queue,
            advance.next_cursor,
            &advance.next_accumulator,
            Some(&result),
        )
        .unwrap_err();
        assert!(matches!(err, Error::QueueCorruption(_)));
        assert!(err.is_session_fatal());
    }

    #[test]
    fn n_multiple_choice_items_tally_k_correct() {
        let queue = mc_queue(5);
        let mut cursor = 0;
        let mut accumulator = ResultsAccumulator::default();

        for (idx, item) in queue.items.iter().enumerate() {
            let result = mc_result(item, idx < 3);
            let advance =
                SessionRunner::advance(&queue, cursor, &accumulator, Some(&result)).unwrap();
            cursor = advance.next_cursor;
            accumulator = advance.next_accumulator;
        }

        assert_eq!(accumulator.multiple_choice.correct, 3);
        assert_eq!(accumulator.multiple_choice.total, 5);
        assert_eq!(cursor, 5);

        let done = SessionRunner::advance(&queue, cursor, &accumulator, None).unwrap();
        assert!(matches!(done.next_action, NextAction::Complete { .. }));
    }

    #[test]
    fn result_after_exhaustion_is_queue_corruption() {
        let queue = mc_queue(1);
        let accumulator = ResultsAccumulator::default();
        let result = mc_result(&queue.items[0], true);

        let err = SessionRunner::advance(&queue, 1, &accumulator, Some(&result)).unwrap_err();
        assert!(matches!(err, Error::QueueCorruption(_)));
    }

    #[test]
    fn cursor_beyond_queue_is_queue_corruption() {
        let queue = mc_queue(1);
        let accumulator = ResultsAccumulator::default();

        let err = SessionRunner::advance(&queue, 5, &accumulator, None).unwrap_err();
        assert!(matches!(err, Error::QueueCorruption(_)));
    }

    #[test]
    fn result_kind_mismatch_is_queue_corruption() {
        let queue = mc_queue(1);
        let accumulator = ResultsAccumulator::default();
        let result = NormalizedItemResult {
            item_id: queue.items[0].id,
            outcome: ItemOutcome::Interactive {
                score: 5,
                max_score: 5,
            },
        };

        let err = SessionRunner::advance(&queue, 0, &accumulator, Some(&result)).unwrap_err();
        assert!(matches!(err, Error::QueueCorruption(_)));
    }
}
