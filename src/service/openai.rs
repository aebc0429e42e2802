//! OpenAI Assistants (v2) implementation of [`ConversationService`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::http::{assistants_headers, event_stream, shared_client, status_to_error};
use super::{ConversationService, EventStream};
use crate::config::ThreadrunConfig;
use crate::error::ThreadrunError;
use crate::types::{
    Assistant, AssistantPatch, AssistantSpec, DeletionStatus, Role, Run, Thread, ThreadMessage,
    ToolOutput,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const PAGE_LIMIT: usize = 100;

/// HTTP client for threads, runs and assistants.
pub struct OpenAiAssistantsService {
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiAssistantsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiAssistantsService")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// One page of a list endpoint.
#[derive(Deserialize)]
struct ListPage<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

impl OpenAiAssistantsService {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Build from configuration; fails when no API key is configured.
    pub fn from_config(config: &ThreadrunConfig) -> Result<Self, ThreadrunError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| ThreadrunError::Authentication("Missing OPENAI_API_KEY".into()))?;
        Ok(Self::new(api_key, config.base_url()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ThreadrunError> {
        let resp = request
            .headers(assistants_headers(&self.api_key))
            .send()
            .await?;
        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ThreadrunError> {
        let resp = self
            .send(shared_client().get(self.url(path)).query(query))
            .await?;
        Ok(resp.json().await?)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ThreadrunError> {
        let resp = self
            .send(shared_client().post(self.url(path)).json(body))
            .await?;
        Ok(resp.json().await?)
    }

    async fn post_stream(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<EventStream, ThreadrunError> {
        let resp = self
            .send(shared_client().post(self.url(path)).json(body))
            .await?;
        Ok(event_stream(resp))
    }

    /// Walk every page of a list endpoint.
    async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ThreadrunError> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let mut query = vec![("limit", PAGE_LIMIT.to_string())];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }
            let page: ListPage<T> = self.get_json(path, &query).await?;
            items.extend(page.data);
            match (page.has_more, page.last_id) {
                (true, Some(last_id)) => after = Some(last_id),
                _ => break,
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl ConversationService for OpenAiAssistantsService {
    async fn create_thread(&self) -> Result<Thread, ThreadrunError> {
        self.post_json("threads", &serde_json::json!({})).await
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<DeletionStatus, ThreadrunError> {
        let resp = self
            .send(shared_client().delete(self.url(&format!("threads/{thread_id}"))))
            .await?;
        Ok(resp.json().await?)
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<ThreadMessage, ThreadrunError> {
        self.post_json(
            &format!("threads/{thread_id}/messages"),
            &serde_json::json!({ "role": role, "content": content }),
        )
        .await
    }

    async fn create_run_stream(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<EventStream, ThreadrunError> {
        debug!(thread_id, assistant_id, "creating streaming run");
        self.post_stream(
            &format!("threads/{thread_id}/runs"),
            &serde_json::json!({ "assistant_id": assistant_id, "stream": true }),
        )
        .await
    }

    async fn list_runs(&self, thread_id: &str) -> Result<Vec<Run>, ThreadrunError> {
        self.list_all(&format!("threads/{thread_id}/runs")).await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ThreadrunError> {
        self.get_json(&format!("threads/{thread_id}/runs/{run_id}"), &[])
            .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ThreadrunError> {
        self.post_json(
            &format!("threads/{thread_id}/runs/{run_id}/cancel"),
            &serde_json::json!({}),
        )
        .await
    }

    async fn submit_tool_outputs_stream(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<EventStream, ThreadrunError> {
        debug!(thread_id, run_id, outputs = outputs.len(), "submitting tool outputs");
        self.post_stream(
            &format!("threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
            &serde_json::json!({ "tool_outputs": outputs, "stream": true }),
        )
        .await
    }

    async fn find_assistant_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Assistant>, ThreadrunError> {
        let assistants: Vec<Assistant> = self.list_all("assistants").await?;
        Ok(assistants
            .into_iter()
            .find(|a| a.name.as_deref() == Some(name)))
    }

    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant, ThreadrunError> {
        self.post_json("assistants", &serde_json::to_value(spec)?)
            .await
    }

    async fn update_assistant(
        &self,
        assistant_id: &str,
        patch: &AssistantPatch,
    ) -> Result<Assistant, ThreadrunError> {
        self.post_json(
            &format!("assistants/{assistant_id}"),
            &serde_json::to_value(patch)?,
        )
        .await
    }
}
