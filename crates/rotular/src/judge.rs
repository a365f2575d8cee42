//! Judgment collaborator: the remote oracle that decides whether an
//! element's text describes its topic or purpose.
//!
//! The core treats the judge as an opaque text generator: it submits
//! one element (or a batch) and gets free-form text back. Shaping that
//! text into a verdict is the recovery module's job, not the judge's.
//! The wire implementation behind the `llm` feature speaks the
//! OpenAI-compatible chat-completions API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::static_dom::NodeContext;

/// One element as submitted for judgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSubmission {
    /// Lower-case tag name (`h1`..`h6`, `label`)
    #[serde(rename = "type")]
    pub element_type: String,
    /// Best-available accessible text, normalized
    pub text: String,
    /// Outer HTML from the static parse
    pub markup: String,
    /// Surrounding static context, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<NodeContext>,
}

/// Failures of a judgment call.
///
/// Kept transport-agnostic so the trait (and every fixture judge in
/// tests) exists without the `llm` feature.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// The request never completed
    #[error("judgment transport failed: {message}")]
    Transport {
        /// Underlying transport error text
        message: String,
    },
    /// The endpoint answered with an error status
    #[error("judgment endpoint returned {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
    /// The endpoint answered successfully but with no content
    #[error("judgment endpoint returned an empty reply")]
    EmptyReply,
}

/// The judgment seam. Implementations return the raw reply text;
/// callers recover structure from it and record (never propagate)
/// per-element failures.
#[async_trait]
pub trait Judge {
    /// Judge one element of the page at `url`
    async fn judge_element(
        &self,
        url: &str,
        submission: &ElementSubmission,
    ) -> Result<String, JudgeError>;

    /// Judge every element in one call; the reply is expected to carry
    /// an `elements` array
    async fn judge_batch(
        &self,
        url: &str,
        submissions: &[ElementSubmission],
    ) -> Result<String, JudgeError>;
}

const CRITERIA: &str = "\
You are an accessibility testing expert specializing in WCAG 2.4.6 \
Headings and Labels. Your task is to analyze whether headings and \
labels adequately describe their topic or purpose.

WCAG 2.4.6 requirement: headings and labels describe topic or purpose.

Evaluation criteria:
1. Headings (h1-h6):
   - represent the page structure appropriately
   - clearly describe the content of their section
   - form a logical hierarchy
   - are unique and specific
2. Labels:
   - clearly describe the purpose of the form control
   - make the expected input obvious to the user
   - are unique and specific";

/// Prompt for a single-element judgment. Instructs the model to reply
/// with exactly one JSON object in the verdict shape.
#[must_use]
pub fn element_prompt(url: &str, submission: &ElementSubmission) -> String {
    let element_json = serde_json::to_string_pretty(submission)
        .unwrap_or_else(|_| format!("{{\"type\": \"{}\"}}", submission.element_type));
    format!(
        "{CRITERIA}\n\n\
         Page under test: {url}\n\n\
         Analyze the element below and report:\n\
         1. whether its text is sufficiently descriptive (true/false)\n\
         2. an evaluation of the current text\n\
         3. concrete recommendations when improvement is needed\n\n\
         Reply with exactly one JSON object in this format and nothing else:\n\
         {{\n\
         \x20 \"descriptive\": true/false,\n\
         \x20 \"evaluation\": \"evaluation comment\",\n\
         \x20 \"recommendations\": [\n\
         \x20   \"recommendation 1\",\n\
         \x20   \"recommendation 2\"\n\
         \x20 ]\n\
         }}\n\n\
         Element to analyze:\n{element_json}"
    )
}

/// Prompt for a batch judgment over every audited element at once.
#[must_use]
pub fn batch_prompt(url: &str, submissions: &[ElementSubmission]) -> String {
    let elements_json =
        serde_json::to_string_pretty(submissions).unwrap_or_else(|_| "[]".to_string());
    format!(
        "{CRITERIA}\n\n\
         Page under test: {url}\n\n\
         Analyze every element below. Reply with exactly one JSON object\n\
         in this format and nothing else:\n\
         {{\n\
         \x20 \"elements\": [\n\
         \x20   {{\n\
         \x20     \"type\": \"h1\",\n\
         \x20     \"text\": \"the element text, echoed back\",\n\
         \x20     \"descriptive\": true/false,\n\
         \x20     \"evaluation\": \"evaluation comment\",\n\
         \x20     \"recommendations\": []\n\
         \x20   }}\n\
         \x20 ]\n\
         }}\n\n\
         Elements to analyze:\n{elements_json}"
    )
}

#[cfg(feature = "llm")]
pub use self::llm::LlmJudge;

#[cfg(feature = "llm")]
mod llm {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use tracing::debug;

    use super::{batch_prompt, element_prompt, ElementSubmission, Judge, JudgeError};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    enum Role {
        System,
        User,
        Assistant,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct ChatMessage {
        role: Role,
        content: String,
    }

    #[derive(Debug, Clone, Serialize)]
    struct ChatRequest {
        model: String,
        messages: Vec<ChatMessage>,
        #[serde(skip_serializing_if = "Option::is_none")]
        temperature: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_tokens: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stream: Option<bool>,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct ChatResponseChoice {
        message: ChatMessage,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct ChatResponse {
        choices: Vec<ChatResponseChoice>,
    }

    impl From<reqwest::Error> for JudgeError {
        fn from(err: reqwest::Error) -> Self {
            Self::Transport {
                message: err.to_string(),
            }
        }
    }

    /// Judge backed by an OpenAI-compatible chat-completions endpoint.
    #[derive(Debug, Clone)]
    pub struct LlmJudge {
        base_url: String,
        model: String,
        api_key: Option<String>,
        max_tokens: u32,
        client: reqwest::Client,
    }

    impl LlmJudge {
        /// Per-request token ceiling; generous enough for batch replies
        const DEFAULT_MAX_TOKENS: u32 = 4096;

        /// Create a judge pointing at the given base URL.
        ///
        /// `api_key`, when set, is sent as a bearer token; local
        /// inference servers typically need none.
        #[must_use]
        pub fn new(
            base_url: impl Into<String>,
            model: impl Into<String>,
            api_key: Option<String>,
        ) -> Self {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default();
            Self {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                model: model.into(),
                api_key,
                max_tokens: Self::DEFAULT_MAX_TOKENS,
                client,
            }
        }

        /// Override the per-request token ceiling
        #[must_use]
        pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = max_tokens;
            self
        }

        /// The configured base URL
        #[must_use]
        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        /// The configured model name
        #[must_use]
        pub fn model(&self) -> &str {
            &self.model
        }

        async fn complete(&self, prompt: String) -> Result<String, JudgeError> {
            let request = ChatRequest {
                model: self.model.clone(),
                messages: vec![ChatMessage {
                    role: Role::User,
                    content: prompt,
                }],
                temperature: Some(0.0),
                max_tokens: Some(self.max_tokens),
                stream: Some(false),
            };

            let url = format!("{}/v1/chat/completions", self.base_url);
            let mut builder = self.client.post(&url).json(&request);
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }

            let resp = builder.send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(JudgeError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let response: ChatResponse = resp.json().await?;
            let reply = response
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content)
                .filter(|content| !content.trim().is_empty())
                .ok_or(JudgeError::EmptyReply)?;
            debug!(chars = reply.len(), "judgment reply received");
            Ok(reply)
        }
    }

    #[async_trait]
    impl Judge for LlmJudge {
        async fn judge_element(
            &self,
            url: &str,
            submission: &ElementSubmission,
        ) -> Result<String, JudgeError> {
            self.complete(element_prompt(url, submission)).await
        }

        async fn judge_batch(
            &self,
            url: &str,
            submissions: &[ElementSubmission],
        ) -> Result<String, JudgeError> {
            self.complete(batch_prompt(url, submissions)).await
        }
    }
}
