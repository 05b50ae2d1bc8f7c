//! Metadata extraction seam.
//!
//! Given the raw text of a paper's first page, an extractor returns the
//! title, ordered author list, year and APA citation, or a typed failure.
//! The shipped implementation talks to an OpenAI-compatible chat
//! completion endpoint with blocking HTTP; tests implement the trait
//! directly.

use std::time::Duration;

use serde::Deserialize;

use crate::records::DocumentMetadata;

/// Prompt used when the prompt store has no entry for the metadata
/// category. `{document}` is replaced with the first-page snippet.
pub const DEFAULT_METADATA_PROMPT: &str = "\
You are an expert in parsing scientific articles.
Given the input text, which contains the first page of a scientific paper, extract:
1. The title of the paper.
2. The authors, in the order they appear, as 'Last name, First initial.' (e.g., Smith, J.).
3. The year of publication.
4. The citation in APA format (e.g., \"Smith, J., & Doe, J. (2020). Title of the paper. Journal Name, Volume(Issue), Pages.\").

Return only a valid JSON object with the fields Title, Authors, Year and Citation.

Input Text: {document}";

/// Request timeout for the chat completion call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    #[error("Metadata request failed: {0}")]
    Http(String),

    #[error("Metadata endpoint returned status {0}")]
    Status(u16),

    #[error("Metadata reply was not parseable: {0}")]
    Parse(String),

    #[error("Metadata reply was empty")]
    EmptyReply,
}

/// Extracts document metadata from a first-page text snippet.
pub trait MetadataExtractor {
    fn extract(&self, first_page: &str) -> Result<DocumentMetadata, ExtractorError>;
}

/// Extractor backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionExtractor {
    endpoint: String,
    model: String,
    api_key: String,
    prompt_template: String,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

/// Reply shape the prompt asks for. Field names are tolerated in both
/// title case and lowercase since models drift between the two.
#[derive(Deserialize)]
struct MetadataReply {
    #[serde(alias = "title")]
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(alias = "authors")]
    #[serde(rename = "Authors")]
    #[serde(default)]
    authors: Vec<String>,
    #[serde(alias = "year")]
    #[serde(rename = "Year")]
    #[serde(deserialize_with = "year_as_string", default)]
    year: Option<String>,
    #[serde(alias = "citation")]
    #[serde(rename = "Citation")]
    citation: Option<String>,
}

/// Models return the year as either a JSON string or a bare number.
fn year_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl ChatCompletionExtractor {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: &str,
        prompt_template: &str,
    ) -> Result<Self, ExtractorError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExtractorError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            prompt_template: prompt_template.to_string(),
            client,
        })
    }

    fn render_prompt(&self, snippet: &str) -> String {
        self.prompt_template.replace("{document}", snippet)
    }
}

impl MetadataExtractor for ChatCompletionExtractor {
    fn extract(&self, first_page: &str) -> Result<DocumentMetadata, ExtractorError> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0,
            "messages": [{ "role": "user", "content": self.render_prompt(first_page) }],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| ExtractorError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractorError::Status(status.as_u16()));
        }

        let reply: ChatResponse = response
            .json()
            .map_err(|e| ExtractorError::Parse(e.to_string()))?;

        let content = reply
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or(ExtractorError::EmptyReply)?;

        parse_metadata_reply(content)
    }
}

/// Parse the model's JSON reply, tolerating markdown code fences.
pub fn parse_metadata_reply(content: &str) -> Result<DocumentMetadata, ExtractorError> {
    let stripped = strip_code_fences(content);

    let reply: MetadataReply =
        serde_json::from_str(stripped).map_err(|e| ExtractorError::Parse(e.to_string()))?;

    Ok(DocumentMetadata {
        title: reply.title,
        authors: reply.authors,
        year: reply.year,
        citation: reply.citation,
    })
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}
