//! Dry-run mock responder
//!
//! Synthesizes a canned response per endpoint so the whole pipeline
//! (artifacts, validation, state capture) runs identically offline. Every
//! canned body satisfies at least one registered shape predicate for its
//! endpoint; `test_every_mock_body_matches_a_shape` in `scenario::steps`
//! holds that invariant.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::endpoints::Endpoint;
use crate::transport::{Backend, BackendResult, MetadataEncoding};

/// Mock file key returned by the upload endpoint
pub const MOCK_FILE_KEY: &str = "files/mock/file.csv";

/// Offline stand-in for the gateway
#[derive(Debug, Default)]
pub struct MockResponder;

impl MockResponder {
    pub fn new() -> Self {
        Self
    }

    /// Canned response body for an endpoint
    ///
    /// Total and pure: no I/O, no failure. Only `SetTags` looks at the
    /// request — it echoes the `tags` array back, defaulting to an empty
    /// list, mirroring the gateway's idempotent echo semantics.
    pub fn synthesize(endpoint: Endpoint, request: &Value) -> Value {
        match endpoint {
            Endpoint::AvailableModels => json!({
                "data": {
                    "models": [
                        {"id": "gpt-4o-mini", "name": "GPT-4o mini"},
                        {"id": "gpt-4o", "name": "GPT-4o"},
                    ]
                }
            }),
            Endpoint::Chat => json!({
                "data": {
                    "answer": "Paris is the capital of France.",
                    "sources": [],
                }
            }),
            Endpoint::EmbeddingDualRetrieval => json!({
                "data": [
                    {"text": "Paris is the capital and largest city of France.", "score": 0.91},
                ]
            }),
            Endpoint::AssistantCreate => json!({
                "data": {"id": "asst_mock_0001", "name": "conformance probe"}
            }),
            Endpoint::AssistantCreateCodeInterpreter => json!({
                "data": {"id": "asst_mock_ci_0001", "name": "conformance probe (code)"}
            }),
            Endpoint::AssistantChatCodeInterpreter => json!({
                "data": {
                    "answer": "The file has 3 rows.",
                    "threadId": "thread_mock_0001",
                    "runId": "run_mock_0001",
                }
            }),
            Endpoint::AssistantList => json!({
                "data": [
                    {"id": "asst_mock_0001", "name": "conformance probe"},
                ]
            }),
            Endpoint::AssistantShare => json!({"success": true, "data": "shared"}),
            Endpoint::AssistantDelete
            | Endpoint::OpenAiAssistantDelete
            | Endpoint::OpenAiThreadDelete => json!({"success": true, "data": "deleted"}),
            Endpoint::AssistantFilesDownload => json!({
                "data": {"fileName": "output.csv", "content": "a,b\n1,2\n"}
            }),
            Endpoint::FilesUpload => json!({
                "data": {"fileKey": MOCK_FILE_KEY}
            }),
            Endpoint::FilesQuery => json!({
                "data": {"files": [{"key": MOCK_FILE_KEY, "tags": []}]}
            }),
            Endpoint::TagsList => json!({"data": ["demo"]}),
            Endpoint::TagsCreate => json!({"success": true, "data": ["conformance"]}),
            Endpoint::TagsDelete => json!({"success": true, "data": []}),
            Endpoint::SetTags => {
                let tags = request
                    .get("tags")
                    .cloned()
                    .unwrap_or_else(|| Value::Array(Vec::new()));
                json!({"success": true, "data": {"fileKey": MOCK_FILE_KEY, "tags": tags}})
            }
            Endpoint::StateShare => json!({"data": "state_mock_0001"}),
            Endpoint::StateShareLoad => json!({"success": true, "data": {"messages": []}}),
        }
    }

    fn respond(endpoint: Endpoint, request: &Value) -> BackendResult {
        let body = Self::synthesize(endpoint, request);
        BackendResult {
            status: endpoint.success_status(),
            body: body.to_string().into_bytes(),
            headers: vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("x-mock-backend".to_string(), "true".to_string()),
            ],
        }
    }
}

#[async_trait]
impl Backend for MockResponder {
    async fn call_json(&self, endpoint: Endpoint, body: Option<&Value>) -> BackendResult {
        let empty = Value::Object(Default::default());
        Self::respond(endpoint, body.unwrap_or(&empty))
    }

    async fn call_multipart(
        &self,
        endpoint: Endpoint,
        _file: &Path,
        metadata: &Value,
        _encoding: MetadataEncoding,
    ) -> BackendResult {
        Self::respond(endpoint, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_tags_echoes_request_tags() {
        let request = json!({"fileKey": MOCK_FILE_KEY, "tags": ["a", "b"]});
        let body = MockResponder::synthesize(Endpoint::SetTags, &request);
        assert_eq!(body["data"]["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_set_tags_defaults_to_empty_list() {
        let body = MockResponder::synthesize(Endpoint::SetTags, &json!({}));
        assert_eq!(body["data"]["tags"], json!([]));
    }

    #[test]
    fn test_other_endpoints_ignore_request() {
        let a = MockResponder::synthesize(Endpoint::Chat, &json!({}));
        let b = MockResponder::synthesize(Endpoint::Chat, &json!({"question": "anything"}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_upload_returns_mock_file_key() {
        let body = MockResponder::synthesize(Endpoint::FilesUpload, &json!({}));
        assert_eq!(body["data"]["fileKey"], MOCK_FILE_KEY);
    }

    #[tokio::test]
    async fn test_backend_reports_success_status() {
        let responder = MockResponder::new();
        let result = responder.call_json(Endpoint::AvailableModels, None).await;
        assert_eq!(result.status, 200);
        let body: Value = serde_json::from_slice(&result.body).unwrap();
        assert_eq!(body["data"]["models"][0]["id"], "gpt-4o-mini");
    }
}
