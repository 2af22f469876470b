//! Artifact persistence
//!
//! Every invocation leaves three files behind, keyed by test name:
//! the outbound request body, the response body, and the response headers.
//! The output root is wiped and recreated at the start of each run so a
//! run's artifacts are always self-consistent.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::common::{Error, Result};

const REQUESTS_DIR: &str = "requests";
const RESPONSES_DIR: &str = "responses";
const HEADERS_DIR: &str = "headers";

/// Writes per-test request/response/header files under a run-scoped root
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a clean artifact tree at `root`
    ///
    /// Removes any previous contents so stale artifacts from an earlier
    /// run can't be mistaken for this run's output.
    pub fn create(root: &Path) -> Result<Self> {
        if root.exists() {
            fs::remove_dir_all(root).map_err(|e| Error::output_dir(root, e))?;
        }
        for sub in [REQUESTS_DIR, RESPONSES_DIR, HEADERS_DIR] {
            fs::create_dir_all(root.join(sub)).map_err(|e| Error::output_dir(root, e))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the recorded request body for a test
    pub fn request_path(&self, name: &str) -> PathBuf {
        self.root.join(REQUESTS_DIR).join(format!("{name}.request.json"))
    }

    /// Path of the recorded response body for a test
    pub fn response_path(&self, name: &str) -> PathBuf {
        self.root
            .join(RESPONSES_DIR)
            .join(format!("{name}.response.json"))
    }

    /// Path of the recorded response headers for a test
    pub fn headers_path(&self, name: &str) -> PathBuf {
        self.root.join(HEADERS_DIR).join(format!("{name}.headers.txt"))
    }

    /// Record the outbound request body
    ///
    /// An absent body is recorded as `{}` so every test has a request
    /// artifact for audit.
    pub fn record_request(&self, name: &str, body: Option<&Value>) -> Result<()> {
        let body = body.cloned().unwrap_or_else(|| Value::Object(Default::default()));
        let rendered = serde_json::to_string_pretty(&body)?;
        fs::write(self.request_path(name), rendered)?;
        Ok(())
    }

    /// Record the response body, pretty-printing when it parses as JSON
    ///
    /// Non-JSON bodies are kept verbatim; the re-serialization is
    /// best-effort and never fails the call.
    pub fn record_response(&self, name: &str, body: &[u8]) -> Result<()> {
        let rendered = match serde_json::from_slice::<Value>(body) {
            Ok(value) => serde_json::to_string_pretty(&value)
                .map(|s| s.into_bytes())
                .unwrap_or_else(|_| body.to_vec()),
            Err(_) => body.to_vec(),
        };
        fs::write(self.response_path(name), rendered)?;
        Ok(())
    }

    /// Record the response headers, one `name: value` per line
    pub fn record_headers(&self, name: &str, headers: &[(String, String)]) -> Result<()> {
        let mut out = String::new();
        for (key, value) in headers {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        fs::write(self.headers_path(name), out)?;
        Ok(())
    }
}
