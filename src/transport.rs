//! HTTP transport
//!
//! The [`Transport`] owns the artifact store and a [`Backend`]: either the
//! live reqwest-based gateway client or the mock responder in dry-run mode.
//! Callers above this boundary never learn which one is active.
//!
//! Network-level failures (connection refused, timeout) are reported as
//! status 0 rather than errors, so a broken gateway fails individual steps
//! instead of aborting the run.

use std::io::Write as _;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::artifacts::ArtifactStore;
use crate::common::{Result, RunConfig};
use crate::endpoints::Endpoint;
use crate::mock::MockResponder;

/// Status recorded when the call never produced an HTTP response
pub const STATUS_TRANSPORT_FAILURE: u16 = 0;

/// Raw result of one backend call
#[derive(Debug, Clone)]
pub struct BackendResult {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: Vec<(String, String)>,
}

impl BackendResult {
    /// A transport-level failure with the error text as the body
    pub fn failure(message: String) -> Self {
        Self {
            status: STATUS_TRANSPORT_FAILURE,
            body: message.into_bytes(),
            headers: Vec::new(),
        }
    }
}

/// What the engine sees after a call: the status plus the parsed body
/// (None when the response wasn't JSON). The full artifacts are on disk.
#[derive(Debug, Clone)]
pub struct CallResult {
    pub status: u16,
    pub body: Option<Value>,
}

/// Metadata-part encodings for multipart uploads, canonical first
///
/// Gateways in the field disagree on how the metadata part of an upload
/// must be encoded. After the canonical attempt fails, each looser
/// encoding is tried in order, stopping at the first success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataEncoding {
    /// In-memory JSON part with an explicit application/json content type
    JsonPart,
    /// File-backed part with filename and application/json content type
    TypedFileRef,
    /// File-backed part with filename but no content type
    UntypedFileRef,
    /// Plain text part, no filename, no content type
    InlineText,
}

/// Attempt order for the multipart metadata part
pub const METADATA_ENCODINGS: [MetadataEncoding; 4] = [
    MetadataEncoding::JsonPart,
    MetadataEncoding::TypedFileRef,
    MetadataEncoding::UntypedFileRef,
    MetadataEncoding::InlineText,
];

/// One concrete way of reaching the gateway
#[async_trait]
pub trait Backend: Send + Sync {
    /// Issue a JSON (or body-less) call
    async fn call_json(&self, endpoint: Endpoint, body: Option<&Value>) -> BackendResult;

    /// Issue a multipart upload with the given metadata encoding
    async fn call_multipart(
        &self,
        endpoint: Endpoint,
        file: &Path,
        metadata: &Value,
        encoding: MetadataEncoding,
    ) -> BackendResult;
}

/// The engine-facing transport: artifacts + backend + retry policy
pub struct Transport {
    store: ArtifactStore,
    backend: Box<dyn Backend>,
}

impl Transport {
    /// Build a transport from the run configuration
    ///
    /// Dry-run swaps the live backend for the mock responder; nothing
    /// above this constructor branches on the flag.
    pub fn new(config: &RunConfig, store: ArtifactStore) -> Result<Self> {
        let backend: Box<dyn Backend> = if config.dry_run {
            Box::new(MockResponder::new())
        } else {
            Box::new(LiveBackend::new(config)?)
        };
        Ok(Self { store, backend })
    }

    /// Build a transport over an explicit backend (used by tests)
    pub fn with_backend(store: ArtifactStore, backend: Box<dyn Backend>) -> Self {
        Self { store, backend }
    }

    /// Artifact store backing this transport
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Issue a JSON call, persisting artifacts before returning
    pub async fn invoke(
        &self,
        name: &str,
        endpoint: Endpoint,
        body: Option<Value>,
    ) -> Result<CallResult> {
        self.store.record_request(name, body.as_ref())?;
        debug!(test = name, path = endpoint.path(), "invoking");

        let result = self.backend.call_json(endpoint, body.as_ref()).await;
        self.persist(name, &result)?;
        Ok(Self::into_call_result(result))
    }

    /// Issue a multipart upload, walking the metadata encodings until one
    /// succeeds
    ///
    /// Artifacts reflect only the final attempt. Encoding fallback applies
    /// to non-success HTTP statuses only; a transport failure (status 0)
    /// is not retried.
    pub async fn upload(
        &self,
        name: &str,
        endpoint: Endpoint,
        file: &Path,
        metadata: Value,
    ) -> Result<CallResult> {
        let success = endpoint.success_status();
        let mut last: Option<(MetadataEncoding, BackendResult)> = None;

        for (attempt, encoding) in METADATA_ENCODINGS.into_iter().enumerate() {
            let result = self
                .backend
                .call_multipart(endpoint, file, &metadata, encoding)
                .await;
            let status = result.status;
            last = Some((encoding, result));
            if status == success || status == STATUS_TRANSPORT_FAILURE {
                break;
            }
            if attempt + 1 < METADATA_ENCODINGS.len() {
                warn!(
                    test = name,
                    status,
                    ?encoding,
                    "upload attempt rejected, trying a looser metadata encoding"
                );
            }
        }

        // The loop always runs at least once.
        let (encoding, result) = last.expect("at least one upload attempt");

        let request_record = serde_json::json!({
            "file": file.display().to_string(),
            "metadata": metadata,
            "metadataEncoding": format!("{encoding:?}"),
        });
        self.store.record_request(name, Some(&request_record))?;
        self.persist(name, &result)?;
        Ok(Self::into_call_result(result))
    }

    fn persist(&self, name: &str, result: &BackendResult) -> Result<()> {
        self.store.record_response(name, &result.body)?;
        self.store.record_headers(name, &result.headers)?;
        Ok(())
    }

    fn into_call_result(result: BackendResult) -> CallResult {
        let body = serde_json::from_slice(&result.body).ok();
        CallResult {
            status: result.status,
            body,
        }
    }
}

/// Live gateway client over reqwest
pub struct LiveBackend {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl LiveBackend {
    pub fn new(config: &RunConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| crate::common::Error::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn run(&self, request: reqwest::RequestBuilder) -> BackendResult {
        let response = match request
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return BackendResult::failure(e.to_string()),
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(key, value)| {
                (
                    key.to_string(),
                    value.to_str().unwrap_or("<non-utf8>").to_string(),
                )
            })
            .collect();

        match response.bytes().await {
            Ok(body) => BackendResult {
                status,
                body: body.to_vec(),
                headers,
            },
            Err(e) => BackendResult::failure(e.to_string()),
        }
    }
}

#[async_trait]
impl Backend for LiveBackend {
    async fn call_json(&self, endpoint: Endpoint, body: Option<&Value>) -> BackendResult {
        let mut request = self.client.request(endpoint.method(), self.url(endpoint));
        if let Some(body) = body {
            request = request.json(body);
        }
        self.run(request).await
    }

    async fn call_multipart(
        &self,
        endpoint: Endpoint,
        file: &Path,
        metadata: &Value,
        encoding: MetadataEncoding,
    ) -> BackendResult {
        let bytes = match std::fs::read(file) {
            Ok(bytes) => bytes,
            Err(e) => {
                return BackendResult::failure(format!(
                    "failed to read '{}': {e}",
                    file.display()
                ))
            }
        };

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        let mime = detect_mime(file, &bytes);

        let file_part = match reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
        {
            Ok(part) => part,
            Err(e) => return BackendResult::failure(format!("invalid mime '{mime}': {e}")),
        };

        let metadata_json = metadata.to_string();
        let metadata_part = match build_metadata_part(&metadata_json, encoding) {
            Ok(part) => part,
            Err(e) => return BackendResult::failure(e),
        };

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .part("metadata", metadata_part);

        let request = self
            .client
            .request(endpoint.method(), self.url(endpoint))
            .multipart(form);
        self.run(request).await
    }
}

/// Build the metadata part for one encoding attempt
fn build_metadata_part(
    metadata_json: &str,
    encoding: MetadataEncoding,
) -> std::result::Result<reqwest::multipart::Part, String> {
    use reqwest::multipart::Part;

    match encoding {
        MetadataEncoding::JsonPart => Part::text(metadata_json.to_string())
            .mime_str("application/json")
            .map_err(|e| e.to_string()),
        MetadataEncoding::TypedFileRef => {
            let bytes = stage_metadata_file(metadata_json)?;
            Part::bytes(bytes)
                .file_name("metadata.json")
                .mime_str("application/json")
                .map_err(|e| e.to_string())
        }
        MetadataEncoding::UntypedFileRef => {
            let bytes = stage_metadata_file(metadata_json)?;
            Ok(Part::bytes(bytes).file_name("metadata.json"))
        }
        MetadataEncoding::InlineText => Ok(Part::text(metadata_json.to_string())),
    }
}

/// Round the metadata through a real file, matching what gateways see
/// from file-reference form fields
fn stage_metadata_file(metadata_json: &str) -> std::result::Result<Vec<u8>, String> {
    let mut tmp = tempfile::NamedTempFile::new().map_err(|e| e.to_string())?;
    tmp.write_all(metadata_json.as_bytes())
        .map_err(|e| e.to_string())?;
    std::fs::read(tmp.path()).map_err(|e| e.to_string())
}

/// Resolve the MIME type for an upload
///
/// Content sniffing first, extension mapping second. `.csv` always wins:
/// sniffers routinely misread CSV as text/plain and the gateway's tabular
/// ingestion keys off text/csv.
pub fn detect_mime(path: &Path, contents: &[u8]) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if extension.as_deref() == Some("csv") {
        return "text/csv";
    }

    if let Some(mime) = sniff_mime(contents) {
        return mime;
    }

    match extension.as_deref() {
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Magic-byte content inspection for the formats the gateway accepts
fn sniff_mime(contents: &[u8]) -> Option<&'static str> {
    if contents.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if contents.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if contents.starts_with(b"%PDF-") {
        Some("application/pdf")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted backend: returns a fixed status sequence for multipart
    /// calls and records the encodings it was asked for.
    struct ScriptedBackend {
        statuses: Vec<u16>,
        calls: AtomicUsize,
        encodings: Arc<Mutex<Vec<MetadataEncoding>>>,
    }

    impl ScriptedBackend {
        fn new(statuses: Vec<u16>) -> (Self, Arc<Mutex<Vec<MetadataEncoding>>>) {
            let encodings = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    statuses,
                    calls: AtomicUsize::new(0),
                    encodings: Arc::clone(&encodings),
                },
                encodings,
            )
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn call_json(&self, _endpoint: Endpoint, _body: Option<&Value>) -> BackendResult {
            BackendResult {
                status: 200,
                body: b"{}".to_vec(),
                headers: Vec::new(),
            }
        }

        async fn call_multipart(
            &self,
            _endpoint: Endpoint,
            _file: &Path,
            _metadata: &Value,
            encoding: MetadataEncoding,
        ) -> BackendResult {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            self.encodings.lock().unwrap().push(encoding);
            let status = self.statuses[index.min(self.statuses.len() - 1)];
            BackendResult {
                status,
                body: format!(r#"{{"attempt":{index}}}"#).into_bytes(),
                headers: Vec::new(),
            }
        }
    }

    fn transport_with(
        statuses: Vec<u16>,
    ) -> (Transport, Arc<Mutex<Vec<MetadataEncoding>>>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(&dir.path().join("out")).unwrap();
        let (backend, encodings) = ScriptedBackend::new(statuses);
        let transport = Transport::with_backend(store, Box::new(backend));
        (transport, encodings, dir)
    }

    #[tokio::test]
    async fn test_upload_stops_at_first_success() {
        let (transport, encodings, _dir) = transport_with(vec![415, 200]);
        let result = transport
            .upload(
                "upload-file",
                Endpoint::FilesUpload,
                Path::new("sample.csv"),
                serde_json::json!({"tags": []}),
            )
            .await
            .unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.body.unwrap()["attempt"], 1);
        assert_eq!(
            *encodings.lock().unwrap(),
            vec![MetadataEncoding::JsonPart, MetadataEncoding::TypedFileRef]
        );
    }

    #[tokio::test]
    async fn test_upload_fallback_ordering() {
        let (transport, encodings, _dir) = transport_with(vec![415, 415, 415, 415]);
        let result = transport
            .upload(
                "upload-file",
                Endpoint::FilesUpload,
                Path::new("sample.csv"),
                serde_json::json!({}),
            )
            .await
            .unwrap();

        // All four encodings tried in the defined order, last status wins.
        assert_eq!(result.status, 415);
        let backend_result: Value = result.body.unwrap();
        assert_eq!(backend_result["attempt"], 3);
        assert_eq!(*encodings.lock().unwrap(), METADATA_ENCODINGS.to_vec());
    }

    #[tokio::test]
    async fn test_upload_transport_failure_not_retried() {
        let (transport, encodings, _dir) = transport_with(vec![STATUS_TRANSPORT_FAILURE, 200]);
        let result = transport
            .upload(
                "upload-file",
                Endpoint::FilesUpload,
                Path::new("sample.csv"),
                serde_json::json!({}),
            )
            .await
            .unwrap();

        assert_eq!(result.status, STATUS_TRANSPORT_FAILURE);
        assert_eq!(encodings.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_artifacts_reflect_final_attempt() {
        let (transport, _encodings, _dir) = transport_with(vec![415, 415, 200]);
        transport
            .upload(
                "upload-file",
                Endpoint::FilesUpload,
                Path::new("sample.csv"),
                serde_json::json!({"tags": ["a"]}),
            )
            .await
            .unwrap();

        let response =
            std::fs::read_to_string(transport.store().response_path("upload-file")).unwrap();
        let response: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(response["attempt"], 2);

        let request =
            std::fs::read_to_string(transport.store().request_path("upload-file")).unwrap();
        let request: Value = serde_json::from_str(&request).unwrap();
        assert_eq!(request["metadataEncoding"], "UntypedFileRef");
    }

    #[tokio::test]
    async fn test_invoke_records_empty_request_for_get() {
        let (transport, _encodings, _dir) = transport_with(vec![]);
        transport
            .invoke("list-models", Endpoint::AvailableModels, None)
            .await
            .unwrap();

        let request =
            std::fs::read_to_string(transport.store().request_path("list-models")).unwrap();
        let request: Value = serde_json::from_str(&request).unwrap();
        assert_eq!(request, serde_json::json!({}));
    }

    #[test]
    fn test_detect_mime_csv_always_wins() {
        // PNG magic bytes, but the extension says CSV.
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_mime(Path::new("data.csv"), &png_magic), "text/csv");
    }

    #[test]
    fn test_detect_mime_sniffs_content() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_mime(Path::new("noext"), &png_magic), "image/png");
        assert_eq!(
            detect_mime(Path::new("doc.txt"), b"%PDF-1.7 ..."),
            "application/pdf"
        );
    }

    #[test]
    fn test_detect_mime_extension_fallback() {
        assert_eq!(detect_mime(Path::new("a.json"), b"{}"), "application/json");
        assert_eq!(detect_mime(Path::new("a.txt"), b"hello"), "text/plain");
        assert_eq!(detect_mime(Path::new("a.JPG"), b"x"), "image/jpeg");
        assert_eq!(
            detect_mime(Path::new("a.weird"), b"x"),
            "application/octet-stream"
        );
    }
}
