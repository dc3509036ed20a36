use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::dialogue::DialogueTree;

/// One unit of assessment content. The kind tag is fixed once the item enters
/// a queue; `payload` carries the variant-specific content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentItem {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(flatten)]
    pub payload: ItemPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    MultipleChoice,
    CaseStudy,
    InteractiveDialogue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemPayload {
    MultipleChoice(MultipleChoicePayload),
    CaseStudy(CaseStudyPayload),
    Interactive(InteractivePayload),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipleChoicePayload {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Basic,
    #[default]
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseStudyPayload {
    pub context: String,
    pub sub_questions: Vec<CaseSubQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSubQuestion {
    pub prompt: String,
    pub ideal_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractivePayload {
    pub context: String,
    pub tree: DialogueTree,
    /// Optional short multiple-choice quiz shown after the dialogue in the
    /// standalone flow. Empty for most items.
    #[serde(default)]
    pub follow_up_quiz: Vec<BridgingQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgingQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

impl AssessmentItem {
    /// Whether the payload variant agrees with the kind tag. A mismatch means
    /// the item cannot be dispatched to any adapter.
    pub fn is_consistent(&self) -> bool {
        matches!(
            (self.kind, &self.payload),
            (ItemKind::MultipleChoice, ItemPayload::MultipleChoice(_))
                | (ItemKind::CaseStudy, ItemPayload::CaseStudy(_))
                | (ItemKind::InteractiveDialogue, ItemPayload::Interactive(_))
        )
    }
}
