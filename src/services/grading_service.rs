use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::item::CaseSubQuestion;
use crate::models::results::CaseSubQuestionGrade;

/// Grades a candidate's free-text answers to a case study's sub-questions.
/// The production implementation calls a remote judge; tests substitute a
/// mock. The core never retries a failed call itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaseGrader: Send + Sync {
    async fn grade_case(
        &self,
        context: &str,
        sub_questions: &[CaseSubQuestion],
        answers: &[String],
    ) -> Result<Vec<CaseSubQuestionGrade>>;
}

#[derive(Clone)]
pub struct AiGradingService {
    client: Client,
    api_key: String,
    model: String,
}

impl AiGradingService {
    pub fn new(api_key: String, model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }

    async fn chat_judge(&self, payload: JsonValue) -> Result<JsonValue> {
        let res = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::GradingService(format!(
                "judge API error {}: {}",
                status, text
            )));
        }

        let body: JsonValue = res.json().await?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .and_then(|s| serde_json::from_str(s).ok())
            .ok_or_else(|| Error::GradingService("invalid judge response format".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct JudgeSubQuestion<'a> {
    prompt: &'a str,
    ideal_answer: &'a str,
    candidate_answer: &'a str,
}

#[derive(Debug, Deserialize)]
struct JudgeVerdicts {
    grades: Vec<CaseSubQuestionGrade>,
}

#[async_trait]
impl CaseGrader for AiGradingService {
    async fn grade_case(
        &self,
        context: &str,
        sub_questions: &[CaseSubQuestion],
        answers: &[String],
    ) -> Result<Vec<CaseSubQuestionGrade>> {
        let system_prompt = r#"You are a strict, unbiased examiner for certification-exam case studies.
For every sub-question, compare the candidate's answer against the ideal answer and the case context.
Return a JSON object: {"grades": [{"evaluation": "correct" | "partial" | "incorrect", "justification": "..."}]}.
Rules:
1. Return exactly one grade per sub-question, in the same order.
2. "correct" requires the key points of the ideal answer; "partial" means some but not all; otherwise "incorrect".
3. The justification must name what was missing or wrong, in the candidate's language.
"#;

        let judged: Vec<JudgeSubQuestion> = sub_questions
            .iter()
            .zip(answers.iter())
            .map(|(sq, answer)| JudgeSubQuestion {
                prompt: &sq.prompt,
                ideal_answer: &sq.ideal_answer,
                candidate_answer: answer,
            })
            .collect();

        let user_data = serde_json::json!({
            "case_context": context,
            "sub_questions": judged,
        });

        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": serde_json::to_string(&user_data)?}
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.1
        });

        tracing::info!(
            sub_questions = sub_questions.len(),
            "Sending case study to grading judge"
        );
        let response = self.chat_judge(payload).await?;

        let verdicts: JudgeVerdicts = serde_json::from_value(response)
            .map_err(|e| Error::GradingService(format!("judge returned malformed grades: {}", e)))?;

        if verdicts.grades.len() != sub_questions.len() {
            return Err(Error::GradingService(format!(
                "judge returned {} grades for {} sub-questions",
                verdicts.grades.len(),
                sub_questions.len()
            )));
        }

        Ok(verdicts.grades)
    }
}
