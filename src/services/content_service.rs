use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::dto::session_dto::ContentFilters;
use crate::error::{Error, Result};
use crate::models::item::{
    AssessmentItem, CaseStudyPayload, InteractivePayload, ItemKind, ItemPayload,
    MultipleChoicePayload,
};

/// Client for the remote content source. Items that fail shape checks are
/// dropped with a warning; only an entirely unusable payload is an error, so
/// a session can never silently start with an empty queue.
#[derive(Clone)]
pub struct ContentService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Default)]
pub struct ContentBundle {
    pub multiple_choice: Vec<AssessmentItem>,
    pub case_studies: Vec<AssessmentItem>,
    pub interactive: Vec<AssessmentItem>,
}

impl ContentBundle {
    pub fn is_empty(&self) -> bool {
        self.multiple_choice.is_empty() && self.case_studies.is_empty() && self.interactive.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    multiple_choice: Vec<JsonValue>,
    #[serde(default)]
    case_studies: Vec<JsonValue>,
    #[serde(default)]
    interactive: Vec<JsonValue>,
}

impl ContentService {
    pub fn new(base_url: String, api_key: Option<String>, client: Client) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    pub async fn fetch_items(&self, filters: &ContentFilters) -> Result<ContentBundle> {
        let mut request = self
            .client
            .get(format!("{}/items", self.base_url))
            .query(&[("certification", filters.certification.as_str())]);
        if let Some(topic) = &filters.topic {
            request = request.query(&[("topic", topic.as_str())]);
        }
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await?;
        if !res.status().is_success() {
            return Err(Error::ContentLoad(format!(
                "content source returned {}",
                res.status()
            )));
        }

        let body: ContentResponse = res
            .json()
            .await
            .map_err(|e| Error::ContentLoad(format!("malformed content payload: {}", e)))?;

        let bundle = ContentBundle {
            multiple_choice: sanitize_items(&body.multiple_choice, ItemKind::MultipleChoice),
            case_studies: sanitize_items(&body.case_studies, ItemKind::CaseStudy),
            interactive: sanitize_items(&body.interactive, ItemKind::InteractiveDialogue),
        };

        if bundle.is_empty() {
            return Err(Error::ContentLoad(
                "content source returned no usable items".to_string(),
            ));
        }

        tracing::info!(
            multiple_choice = bundle.multiple_choice.len(),
            case_studies = bundle.case_studies.len(),
            interactive = bundle.interactive.len(),
            "Loaded assessment content"
        );

        Ok(bundle)
    }
}

pub(crate) fn sanitize_items(raw: &[JsonValue], kind: ItemKind) -> Vec<AssessmentItem> {
    raw.iter()
        .filter_map(|value| match coerce_item(value, kind) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed content item");
                None
            }
        })
        .collect()
}

fn coerce_item(value: &JsonValue, kind: ItemKind) -> Result<AssessmentItem> {
    let id = value
        .get("id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let payload = match kind {
        ItemKind::MultipleChoice => {
            let payload: MultipleChoicePayload = serde_json::from_value(value.clone())?;
            if payload.options.len() < 2 {
                return Err(Error::ContentLoad(
                    "multiple-choice item has fewer than two options".to_string(),
                ));
            }
            if payload.correct_answer >= payload.options.len() {
                return Err(Error::ContentLoad(format!(
                    "correct answer index {} out of range for {} options",
                    payload.correct_answer,
                    payload.options.len()
                )));
            }
            ItemPayload::MultipleChoice(payload)
        }
        ItemKind::CaseStudy => {
            let payload: CaseStudyPayload = serde_json::from_value(value.clone())?;
            if payload.sub_questions.is_empty() {
                return Err(Error::ContentLoad(
                    "case study has no sub-questions".to_string(),
                ));
            }
            ItemPayload::CaseStudy(payload)
        }
        ItemKind::InteractiveDialogue => {
            let mut payload: InteractivePayload = serde_json::from_value(value.clone())?;
            payload
                .tree
                .validate()
                .map_err(|e| Error::ContentLoad(format!("invalid dialogue tree: {}", e)))?;
            payload.follow_up_quiz.retain(|q| {
                let ok = q.options.len() >= 2 && q.correct_answer < q.options.len();
                if !ok {
                    tracing::warn!("Dropping malformed bridging question");
                }
                ok
            });
            ItemPayload::Interactive(payload)
        }
    };

    Ok(AssessmentItem { id, kind, payload })
}
