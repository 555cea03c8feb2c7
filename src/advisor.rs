//! Estimate advisor: asks a generative model whether a task's estimate should
//! change, based on the minutes actually logged for it.
//!
//! The advisor only ever reads. A suggestion changes nothing until the caller
//! passes it to [`apply_suggestion`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AdvisorConfig;
use crate::error::{Result, TimeflowError};
use crate::models::Task;
use crate::store::TaskStore;

/// What the advisor is asked about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub task_name: String,
    pub estimated_time: u32,
    pub actual_times: Vec<u32>,
}

/// What the advisor answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Signed minutes to add to the current estimate.
    pub suggested_adjustment: i64,
    pub reason: String,
}

impl SuggestionRequest {
    /// Builds a request from a task's logged history.
    ///
    /// `estimate` overrides the task's stored estimate. Logs with no time
    /// recorded are skipped; if the task has logs but none with time, there is
    /// nothing to analyse and the request is refused.
    pub fn for_task(store: &TaskStore, task_id: u64, estimate: Option<i64>) -> Result<Self> {
        let task = store
            .task(task_id)
            .ok_or(TimeflowError::TaskNotFound { id: task_id })?;
        let estimated_time = match estimate {
            Some(e) if e <= 0 => {
                return Err(TimeflowError::validation("estimatedTime", "must be at least 1 minute"))
            }
            Some(e) => u32::try_from(e)
                .map_err(|_| TimeflowError::validation("estimatedTime", "is too large"))?,
            None => task.estimated_time,
        };

        let logs = store.logs_for_task(task_id);
        let actual_times: Vec<u32> = logs
            .iter()
            .map(|log| log.actual_time)
            .filter(|minutes| *minutes > 0)
            .collect();
        if actual_times.is_empty() && !logs.is_empty() {
            return Err(TimeflowError::RemoteSuggestion(format!(
                "not enough data: no actual time logged for '{}' yet",
                task.name
            )));
        }

        Ok(SuggestionRequest {
            task_name: task.name.clone(),
            estimated_time,
            actual_times,
        })
    }

    /// The prompt sent to the model.
    pub fn prompt(&self) -> String {
        let actual = self
            .actual_times
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "You are a time management expert. Analyze the past task completion times and \
             suggest adjustments to the estimated times.\n\n\
             Task Name: {}\n\
             Estimated Time: {} minutes\n\
             Actual Times: {}\n\n\
             Based on this data, suggest an adjustment to the estimated time and explain your reasoning. \
             Respond with a JSON object with the fields \"suggestedAdjustment\" (integer minutes, \
             negative to shorten) and \"reason\" (string).",
            self.task_name, self.estimated_time, actual
        )
    }
}

/// Anything that can turn a history into a suggestion.
#[async_trait]
pub trait EstimateAdvisor: Send + Sync {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Suggestion>;
}

/// Applies a suggestion to the stored task.
///
/// The new estimate is the task's current estimate plus the adjustment, never
/// less than one minute.
pub fn apply_suggestion(store: &mut TaskStore, task_id: u64, suggestion: &Suggestion) -> Result<Task> {
    let mut task = store
        .task(task_id)
        .cloned()
        .ok_or(TimeflowError::TaskNotFound { id: task_id })?;
    let adjusted = i64::from(task.estimated_time)
        .checked_add(suggestion.suggested_adjustment)
        .ok_or_else(|| TimeflowError::validation("estimatedTime", "is too large"))?
        .max(1);
    task.estimated_time = u32::try_from(adjusted)
        .map_err(|_| TimeflowError::validation("estimatedTime", "is too large"))?;
    info!(task_id, estimated_time = task.estimated_time, "suggestion applied");
    store.update_task(task)
}

/// Advisor backed by an OpenAI-compatible chat-completions API.
pub struct HttpAdvisor {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpAdvisor {
    pub fn new(base_url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            model,
            api_key,
        }
    }

    /// Builds an advisor from configuration, reading the API key from the
    /// environment.
    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TimeflowError::Configuration {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key(),
        })
    }
}

#[async_trait]
impl EstimateAdvisor for HttpAdvisor {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Suggestion> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.prompt(),
            }],
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
        };

        let url = format!("{}/chat/completions", self.base_url);
        info!(url = %url, model = %self.model, task = %request.task_name, "requesting estimate suggestion");

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| TimeflowError::RemoteSuggestion(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        debug!(%status, "advisor responded");
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TimeflowError::RemoteSuggestion(format!(
                "advisor returned HTTP {}: {}",
                status.as_u16(),
                text.trim_end()
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| TimeflowError::RemoteSuggestion(format!("unreadable response: {}", e)))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| TimeflowError::RemoteSuggestion("response had no choices".to_string()))?;
        parse_suggestion(&content)
    }
}

/// Parses the model's reply, tolerating a fenced code block around the JSON.
pub fn parse_suggestion(content: &str) -> Result<Suggestion> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    serde_json::from_str(json)
        .map_err(|e| TimeflowError::RemoteSuggestion(format!("malformed suggestion: {}", e)))
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_fenced_replies() {
        let plain = parse_suggestion(r#"{"suggestedAdjustment": 10, "reason": "runs long"}"#).unwrap();
        assert_eq!(plain.suggested_adjustment, 10);

        let fenced = parse_suggestion("```json\n{\"suggestedAdjustment\": -5, \"reason\": \"quick\"}\n```").unwrap();
        assert_eq!(fenced.suggested_adjustment, -5);
        assert_eq!(fenced.reason, "quick");
    }

    #[test]
    fn rejects_replies_without_the_schema() {
        let err = parse_suggestion("sure, add ten minutes").unwrap_err();
        assert!(matches!(err, TimeflowError::RemoteSuggestion(_)));
    }
}
