//! Document content loading from local files or URLs

use crate::{BridgeError, PipelineConfig, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::fs;
use std::time::Duration;
use tracing::{debug, warn};

/// True for `http://` and `https://` sources
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Source of raw document text
///
/// The sniffer and the pipeline only ever read documents through this trait,
/// so tests can substitute canned content and headers.
pub trait ContentLoader {
    /// Read the full text of a file path or URL
    fn load(&self, source: &str) -> Result<String>;

    /// `Content-Type` reported by a HEAD request, if any
    fn content_type(&self, url: &str) -> Result<Option<String>>;
}

/// Loader backed by the filesystem and a blocking HTTP client
pub struct DefaultLoader {
    client: Client,
}

impl DefaultLoader {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BridgeError::Fetch(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, "sending GET request");
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| BridgeError::Fetch(format!("GET {} failed: {}", url, e)))?;

        response
            .text()
            .map_err(|e| BridgeError::Fetch(format!("Failed to read body of {}: {}", url, e)))
    }

    fn read_file(&self, path: &str) -> Result<String> {
        debug!(path, "reading local file");
        let bytes = fs::read(path)?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(path, "file is not valid UTF-8, decoding lossily");
                Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        }
    }
}

impl ContentLoader for DefaultLoader {
    fn load(&self, source: &str) -> Result<String> {
        if is_url(source) {
            self.fetch(source)
        } else {
            self.read_file(source)
        }
    }

    fn content_type(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|e| BridgeError::Fetch(format!("HEAD {} failed: {}", url, e)))?;

        Ok(response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/openapi.json"));
        assert!(is_url("http://localhost:8080"));
        assert!(!is_url("./docs/api.md"));
        assert!(!is_url("ftp://example.com/api.json"));
    }

    #[test]
    fn test_load_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "# Pets API").unwrap();

        let loader = DefaultLoader::new(&PipelineConfig::default()).unwrap();
        let content = loader.load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(content, "# Pets API");
    }

    #[test]
    fn test_load_non_utf8_file_lossily() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'#', b' ', 0xC4, 0xE3]).unwrap();

        let loader = DefaultLoader::new(&PipelineConfig::default()).unwrap();
        let content = loader.load(file.path().to_str().unwrap()).unwrap();
        assert!(content.starts_with("# "));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let loader = DefaultLoader::new(&PipelineConfig::default()).unwrap();
        let result = loader.load("/no/such/file.md");
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }
}
