//! Client for the remote text-revision service.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::http_client;
use crate::parsing::diff_markup::{DELETED_CLASS, INSERTED_CLASS};
use crate::types::revision::{RevisedSentence, Revision, MAX_MARK, MIN_MARK};

const MAX_REVISION_RESPONSE_BYTES: usize = 256 * 1024;
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RevisionError {
    #[error("Revision service unreachable: {0}")]
    Transport(String),
    #[error("Revision service returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("Revision service response was malformed: {0}")]
    Malformed(String),
}

/// Language pair and rubric named in the prompt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PromptSettings {
    pub source_language: String,
    pub target_language: String,
    pub exam: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            source_language: "Chinese".to_string(),
            target_language: "English".to_string(),
            exam: "IELTS writing".to_string(),
        }
    }
}

/// Wire body sent to the service: `{ "prompt": ... }`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RevisionRequest {
    pub prompt: String,
}

impl RevisionRequest {
    pub fn for_translation(settings: &PromptSettings, sentence: &str, draft: &str) -> Self {
        let PromptSettings {
            source_language,
            target_language,
            exam,
        } = settings;
        let prompt = format!(
            "This is a translation practice from {source_language} to {target_language}, \
revise it to get a higher band in {exam}.\n\
The {source_language} sentence is: \"{sentence}\"\n\
and the translation is: \"{draft}\"\n\
Revise the sentence in three ways with tailwind style,\n\
use \"{DELETED_CLASS}\" class to mark the deleted words,\n\
use \"{INSERTED_CLASS}\" class to mark the added words;\n\
For example: This is a <span class=\"{DELETED_CLASS}\">good</span> <span class=\"{INSERTED_CLASS}\">exceptional</span> work.\n\
Mark the original translation (fill \"mark\") and each revised one (fill \"mark_1\", \"mark_2\", \"mark_3\") with the {exam} band standard.\n\
Return JSON only, in this format: {{\"mark\": 1-9, \"mark_1\": 1-9, \"mark_2\": 1-9, \"mark_3\": 1-9, \
\"revised_sentence\": \"\", \"revised_sentence_2\": \"\", \"revised_sentence_3\": \"\"}}\n"
        );
        Self { prompt }
    }
}

pub trait RevisionService: Send + Sync {
    fn revise(&self, request: &RevisionRequest) -> Result<Revision, RevisionError>;
}

/// Posts the prompt as JSON and parses the critique from the body.
pub struct HttpRevisionService {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpRevisionService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent: http_client::agent(timeout),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RevisionService for HttpRevisionService {
    fn revise(&self, request: &RevisionRequest) -> Result<Revision, RevisionError> {
        let req = self
            .agent
            .post(&self.endpoint)
            .set("Accept", "application/json")
            .set("Content-Type", "application/json");

        let response = match req.send_json(request) {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = http_client::read_response_string(response, MAX_REVISION_RESPONSE_BYTES)
                    .unwrap_or_else(|err| err.to_string());
                return Err(RevisionError::Status {
                    code,
                    body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
                });
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(RevisionError::Transport(err.to_string()));
            }
        };

        let body = http_client::read_response_string(response, MAX_REVISION_RESPONSE_BYTES)
            .map_err(|err| RevisionError::Transport(err.to_string()))?;
        parse_revision_body(&body)
    }
}

#[derive(Deserialize, Debug)]
struct RevisionWire {
    mark: Option<f64>,
    mark_1: Option<f64>,
    mark_2: Option<f64>,
    mark_3: Option<f64>,
    revised_sentence: Option<String>,
    revised_sentence_2: Option<String>,
    revised_sentence_3: Option<String>,
}

/// Accepts the response only if every field is present and every mark is in range.
///
/// The body may also be a JSON string holding the object, as some proxies
/// double-encode the model output.
pub fn parse_revision_body(body: &str) -> Result<Revision, RevisionError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(RevisionError::Malformed("Empty response body".to_string()));
    }
    let value: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|err| RevisionError::Malformed(format!("{err}: {}", truncate_chars(trimmed, 120))))?;
    let value = match value {
        serde_json::Value::String(inner) => serde_json::from_str(inner.trim())
            .map_err(|err| RevisionError::Malformed(format!("embedded JSON: {err}")))?,
        other => other,
    };
    if !value.is_object() {
        return Err(RevisionError::Malformed("Response is not a JSON object".to_string()));
    }
    let wire: RevisionWire =
        serde_json::from_value(value).map_err(|err| RevisionError::Malformed(err.to_string()))?;

    let mark = require_mark("mark", wire.mark)?;
    let revised = vec![
        RevisedSentence {
            markup: require_text("revised_sentence", wire.revised_sentence)?,
            mark: require_mark("mark_1", wire.mark_1)?,
        },
        RevisedSentence {
            markup: require_text("revised_sentence_2", wire.revised_sentence_2)?,
            mark: require_mark("mark_2", wire.mark_2)?,
        },
        RevisedSentence {
            markup: require_text("revised_sentence_3", wire.revised_sentence_3)?,
            mark: require_mark("mark_3", wire.mark_3)?,
        },
    ];
    Ok(Revision { mark, revised })
}

fn require_mark(field: &str, value: Option<f64>) -> Result<f32, RevisionError> {
    let mark = value.ok_or_else(|| RevisionError::Malformed(format!("Missing field '{field}'")))?;
    let mark = mark as f32;
    if !mark.is_finite() || !(MIN_MARK..=MAX_MARK).contains(&mark) {
        return Err(RevisionError::Malformed(format!(
            "Field '{field}' is out of range: {mark}"
        )));
    }
    Ok(mark)
}

fn require_text(field: &str, value: Option<String>) -> Result<String, RevisionError> {
    value.ok_or_else(|| RevisionError::Malformed(format!("Missing field '{field}'")))
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
