use serde::{Deserialize, Serialize};

use super::provider::{AssistantInput, AssistantOutput, LlmError, LlmProvider, LlmResult};
use crate::http::client::HttpClient;
use crate::session::{PromptMessage, PromptRole};

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl GeminiProvider {
    pub fn new(
        http: HttpClient,
        api_key: Option<String>,
        model: String,
        base_url: String,
        temperature: f32,
    ) -> LlmResult<Self> {
        let api_key = api_key
            .filter(|v| !v.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        Ok(Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, messages: &[PromptMessage]) -> GeminiGenerateRequest {
        let system_parts: Vec<GeminiPart> = messages
            .iter()
            .filter(|m| m.role == PromptRole::System)
            .map(|m| GeminiPart {
                text: m.content.clone(),
            })
            .collect();

        let contents = messages
            .iter()
            .filter_map(|m| {
                let role = match m.role {
                    PromptRole::System => return None,
                    PromptRole::User => "user",
                    PromptRole::Assistant => "model",
                };
                Some(GeminiContent {
                    role: role.to_string(),
                    parts: vec![GeminiPart {
                        text: m.content.clone(),
                    }],
                })
            })
            .collect();

        GeminiGenerateRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then_some(GeminiSystemInstruction {
                parts: system_parts,
            }),
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
            },
        }
    }

    /// Joins the text parts of the first candidate exactly as sent. Only a
    /// candidate without any text part counts as empty.
    fn extract_text(resp: GeminiGenerateResponse) -> LlmResult<String> {
        let parts: Vec<String> = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if parts.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(parts.concat())
    }
}

impl LlmProvider for GeminiProvider {
    async fn generate(&self, input: AssistantInput) -> LlmResult<AssistantOutput> {
        let payload = self.build_request(&input.messages);
        let resp = self
            .http
            .post_json(
                &self.endpoint(),
                &[("x-goog-api-key", self.api_key.as_str())],
                &payload,
            )
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        if !(200..300).contains(&resp.status) {
            let body = resp.body.chars().take(400).collect::<String>();
            return Err(LlmError::HttpStatus {
                status: resp.status,
                body,
            });
        }

        let parsed = serde_json::from_str::<GeminiGenerateResponse>(&resp.body)
            .map_err(|err| LlmError::Parse(err.to_string()))?;
        let text = Self::extract_text(parsed)?;
        Ok(AssistantOutput { text })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiGenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::GeminiProvider;
    use crate::http::client::HttpClient;
    use crate::http::debug::HttpDebugConfig;
    use crate::llm::provider::{AssistantInput, LlmError, LlmProvider};
    use crate::session::{Message, PromptMessage};
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: String) -> GeminiProvider {
        GeminiProvider::new(
            HttpClient::new(Client::new(), HttpDebugConfig::disabled()),
            Some("test-key".to_string()),
            "test-model".to_string(),
            base_url,
            0.2,
        )
        .expect("provider")
    }

    fn input(messages: Vec<PromptMessage>) -> AssistantInput {
        AssistantInput { messages }
    }

    #[tokio::test]
    async fn generate_sends_system_instruction_and_mapped_roles() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_json(json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "hi"}]},
                    {"role": "model", "parts": [{"text": "hello"}]},
                    {"role": "user", "parts": [{"text": "why?"}]}
                ],
                "systemInstruction": {"parts": [{"text": "be brief"}]},
                "generationConfig": {"temperature": 0.2}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Because "}, {"text": "reasons.\n"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let out = provider(server.uri())
            .generate(input(vec![
                PromptMessage::system("be brief"),
                (&Message::user("hi")).into(),
                (&Message::assistant("hello")).into(),
                (&Message::user("why?")).into(),
            ]))
            .await
            .expect("success");

        assert_eq!(out.text, "Because reasons.\n");

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests[0].url.query(), None, "api key must not travel in the url");
    }

    #[tokio::test]
    async fn whitespace_reply_is_returned_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "  \n"}]}}]
            })))
            .mount(&server)
            .await;

        let out = provider(server.uri())
            .generate(input(vec![PromptMessage::system("s")]))
            .await
            .expect("whitespace is still text");
        assert_eq!(out.text, "  \n");
    }

    #[tokio::test]
    async fn generate_maps_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .generate(input(vec![PromptMessage::system("s")]))
            .await
            .expect_err("quota error");

        match err {
            LlmError::HttpStatus { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("quota exceeded"));
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_reports_malformed_body_as_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .generate(input(vec![PromptMessage::system("s")]))
            .await
            .expect_err("parse error");
        assert!(matches!(err, LlmError::Parse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn generate_returns_empty_response_when_no_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .generate(input(vec![PromptMessage::system("s")]))
            .await
            .expect_err("empty");
        assert_eq!(err, LlmError::EmptyResponse);
    }

    #[tokio::test]
    async fn generate_reports_unreachable_endpoint_as_transport_error() {
        let err = provider("http://127.0.0.1:9".to_string())
            .generate(input(vec![PromptMessage::system("s")]))
            .await
            .expect_err("transport");
        assert!(matches!(err, LlmError::Transport(_)), "got {err:?}");
    }

    #[test]
    fn new_requires_api_key() {
        for key in [None, Some("   ".to_string())] {
            let err = GeminiProvider::new(
                HttpClient::new(Client::new(), HttpDebugConfig::disabled()),
                key,
                "m".to_string(),
                "https://example.com".to_string(),
                0.2,
            )
            .expect_err("missing key");
            assert_eq!(err, LlmError::MissingApiKey);
        }
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let p = provider("https://example.com///".to_string());
        assert_eq!(
            p.endpoint(),
            "https://example.com/v1beta/models/test-model:generateContent"
        );
    }
}
