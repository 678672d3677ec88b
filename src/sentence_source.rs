//! Where the ordered list of practice sentences comes from.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::http_client;
use crate::session::errors::LoadError;

const MAX_SENTENCE_BYTES: usize = 8 * 1024 * 1024;
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub trait SentenceSource {
    /// Human-readable origin, used in errors and logs.
    fn location(&self) -> String;
    fn fetch(&self) -> Result<Vec<String>, LoadError>;
}

/// Reads a JSON array of strings from a local file.
#[derive(Debug, Clone)]
pub struct FileSentenceSource {
    pub path: PathBuf,
}

impl FileSentenceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SentenceSource for FileSentenceSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<String>, LoadError> {
        let body = fs::read_to_string(&self.path).map_err(|e| LoadError::SentencesUnreachable {
            location: self.location(),
            reason: e.to_string(),
        })?;
        parse_sentence_payload(&body, &self.location())
    }
}

/// Fetches a JSON array of strings with a `GET` request.
///
/// The agent is built once, so repeated fetches share its connection settings.
#[derive(Debug, Clone)]
pub struct HttpSentenceSource {
    pub url: String,
    agent: ureq::Agent,
}

impl HttpSentenceSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            agent: http_client::agent(FETCH_TIMEOUT),
        }
    }
}

impl SentenceSource for HttpSentenceSource {
    fn location(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<Vec<String>, LoadError> {
        let unreachable = |reason: String| LoadError::SentencesUnreachable {
            location: self.url.clone(),
            reason,
        };
        let response = match self
            .agent
            .get(&self.url)
            .set("Accept", "application/json")
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(unreachable(format!("HTTP {code}"))),
            Err(ureq::Error::Transport(err)) => return Err(unreachable(err.to_string())),
        };
        let body = http_client::read_response_string(response, MAX_SENTENCE_BYTES)
            .map_err(|e| unreachable(e.to_string()))?;
        parse_sentence_payload(&body, &self.url)
    }
}

/// A fixed in-memory list.
#[derive(Debug, Clone, Default)]
pub struct StaticSentenceSource(pub Vec<String>);

impl SentenceSource for StaticSentenceSource {
    fn location(&self) -> String {
        "<in-memory>".to_string()
    }

    fn fetch(&self) -> Result<Vec<String>, LoadError> {
        Ok(self.0.clone())
    }
}

/// Picks the HTTP source for `http(s)://` locations and the file source otherwise.
pub fn from_location(location: &str) -> Box<dyn SentenceSource> {
    let trimmed = location.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Box::new(HttpSentenceSource::new(trimmed))
    } else {
        Box::new(FileSentenceSource::new(trimmed))
    }
}

/// Accepts only a JSON array whose elements are all strings. `[]` is valid.
pub fn parse_sentence_payload(body: &str, location: &str) -> Result<Vec<String>, LoadError> {
    let malformed = |reason: String| LoadError::SentencesMalformed {
        location: location.to_string(),
        reason,
    };
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    let serde_json::Value::Array(items) = value else {
        return Err(malformed("top-level value is not an array".to_string()));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            serde_json::Value::String(s) => Ok(s),
            other => Err(malformed(format!("element {i} is not a string: {other}"))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::test_server::{http_response, serve_once, serve_times};

    #[test]
    fn parses_array_of_strings() {
        let sentences = parse_sentence_payload(r#"["你好世界", "再见"]"#, "test").unwrap();
        assert_eq!(sentences, vec!["你好世界".to_string(), "再见".to_string()]);
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_sentence_payload("[]", "test").unwrap().is_empty());
    }

    #[test]
    fn non_array_payload_is_malformed() {
        let err = parse_sentence_payload(r#"{"sentences": []}"#, "test").unwrap_err();
        assert!(matches!(err, LoadError::SentencesMalformed { .. }));
    }

    #[test]
    fn non_string_element_is_malformed() {
        let err = parse_sentence_payload(r#"["ok", 3]"#, "test").unwrap_err();
        assert!(matches!(err, LoadError::SentencesMalformed { .. }));
    }

    #[test]
    fn missing_file_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSentenceSource::new(dir.path().join("nope.json"));
        assert!(matches!(
            source.fetch(),
            Err(LoadError::SentencesUnreachable { .. })
        ));
    }

    #[test]
    fn file_source_reads_sentences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentences.json");
        std::fs::write(&path, r#"["一", "二"]"#).unwrap();
        let sentences = FileSentenceSource::new(&path).fetch().unwrap();
        assert_eq!(sentences.len(), 2);
    }

    #[test]
    fn http_source_reads_sentences() {
        let url = serve_once(http_response("200 OK", "application/json", r#"["一"]"#));
        let sentences = HttpSentenceSource::new(url).fetch().unwrap();
        assert_eq!(sentences, vec!["一".to_string()]);
    }

    #[test]
    fn http_source_fetches_repeatedly() {
        let url = serve_times(http_response("200 OK", "application/json", r#"["一", "二"]"#), 2);
        let source = HttpSentenceSource::new(url);
        assert_eq!(source.fetch().unwrap().len(), 2);
        assert_eq!(source.fetch().unwrap(), vec!["一".to_string(), "二".to_string()]);
    }

    #[test]
    fn http_error_status_is_unreachable() {
        let url = serve_once(http_response("404 Not Found", "text/plain", "missing"));
        assert!(matches!(
            HttpSentenceSource::new(url).fetch(),
            Err(LoadError::SentencesUnreachable { .. })
        ));
    }

    #[test]
    fn from_location_picks_by_scheme() {
        assert!(from_location("https://example.com/s.json")
            .location()
            .starts_with("https://"));
        assert_eq!(from_location("data/s.json").location(), "data/s.json");
    }
}
