use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ModelError;
use crate::model::ModelSettings;
use crate::providers::http_errors::{model_api_request_error, model_api_status_error};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

pub async fn complete(
    client: &Client,
    settings: &ModelSettings,
    prompt: &str,
) -> Result<String, ModelError> {
    let api_url = completions_url(&settings.base_url);
    let body = ChatCompletionRequest {
        model: &settings.model_id,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
        max_tokens: settings.max_output_tokens,
        stream: false,
    };
    debug!(
        api_url = %api_url,
        model = %settings.model_id,
        max_tokens = settings.max_output_tokens,
        "sending chat completion request"
    );

    let response = client
        .post(&api_url)
        .bearer_auth(&settings.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(
                api_url = %api_url,
                model = %settings.model_id,
                error = %err,
                "chat completion request failed"
            );
            model_api_request_error(err, &api_url, settings.timeout_secs)
        })?;

    let status = response.status();
    if !status.is_success() {
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            api_url = %api_url,
            model = %settings.model_id,
            status = %status,
            response_body_len = response_body.len(),
            "model API returned non-success status"
        );
        return Err(model_api_status_error(status, response_body));
    }

    let text = response
        .text()
        .await
        .map_err(|err| model_api_request_error(err, &api_url, settings.timeout_secs))?;
    let parsed: ChatCompletionResponse =
        serde_json::from_str(&text).map_err(|err| ModelError::InvalidResponse(err.to_string()))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ModelError::InvalidResponse("response contained no choices".to_string()))?;

    debug!(
        model = %settings.model_id,
        response_len = content.len(),
        "received chat completion response"
    );
    Ok(content)
}
