//! Fire-and-forget advisory call made while a request is processed.
//!
//! The Service asks a chat-completion endpoint a fixed question and logs the
//! answer. Nothing in the response path waits for it or looks at its outcome.

use std::time::Duration;

use serde_json::{json, Value};

use crate::config::AdvisorConfig;

/// Handle to the optional advisory endpoint.
#[derive(Debug, Clone)]
pub struct Advisor {
    inner: Option<Endpoint>,
}

#[derive(Debug, Clone)]
struct Endpoint {
    client: reqwest::Client,
    url: String,
    model: String,
    question: String,
    api_key: Option<String>,
}

impl Advisor {
    /// An advisor that never calls out.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn from_config(config: &AdvisorConfig) -> Self {
        let Some(url) = config.endpoint.clone() else {
            return Self::disabled();
        };

        let client = match reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "Advisor client could not be built, advisor disabled");
                return Self::disabled();
            }
        };

        Self {
            inner: Some(Endpoint {
                client,
                url,
                model: config.model.clone(),
                question: config.question.clone(),
                api_key: std::env::var(&config.api_key_env).ok(),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Launch the call in the background and return immediately.
    pub fn consult(&self) {
        let Some(endpoint) = self.inner.clone() else {
            return;
        };

        tokio::spawn(async move {
            match endpoint.ask().await {
                Ok(answer) => tracing::debug!(answer = %answer, "Advisor answered"),
                Err(e) => tracing::warn!(error = %e, "Advisor call failed"),
            }
        });
    }
}

impl Endpoint {
    async fn ask(&self) -> Result<String, reqwest::Error> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": self.question }],
        });

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let reply: Value = request.send().await?.error_for_status()?.json().await?;
        Ok(extract_answer(&reply))
    }
}

fn extract_answer(reply: &Value) -> String {
    reply["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().replace('*', ""))
        .unwrap_or_default()
}
