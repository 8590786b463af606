use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::errors::AppError;
use crate::providers::InlineImage;

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Raw chat body as received on the wire.
///
/// Every field is read leniently: a field of the wrong JSON type counts as
/// absent rather than failing the whole body, so validation below can answer
/// with the message for the field that is actually unusable.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ChatBody {
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub prompt: Option<String>,
    /// Accepted as an alias for `prompt`.
    #[serde(deserialize_with = "lenient_string")]
    pub message: Option<String>,
    /// Base64 image, with or without a `data:` URL prefix.
    #[serde(deserialize_with = "lenient_string")]
    pub image: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub language: Option<String>,
    /// Disease name for the deep expert view.
    #[serde(deserialize_with = "lenient_string")]
    pub disease: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_owned))
}

/// Reply language requested by the farmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Ur,
    Hi,
}

impl Language {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "ur" | "urdu" => Some(Language::Ur),
            "hi" | "hindi" => Some(Language::Hi),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ur => "ur",
            Language::Hi => "hi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// What the farmer is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// Free-form question, no persona.
    Generic,
    /// Question answered in the resident agronomist persona.
    Expert,
    /// Image-based crop disease diagnosis with a structured reply.
    Diagnosis,
    /// Follow-up deep dive on a previously diagnosed disease.
    DeepExpert { disease: String },
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::Generic => "generic",
            PromptKind::Expert => "expert",
            PromptKind::Diagnosis => "crop-diagnosis",
            PromptKind::DeepExpert { .. } => "deep-expert",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A chat body that passed validation. At least one of `text` and `image` is
/// guaranteed non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub kind: PromptKind,
    pub text: String,
    pub image: Option<InlineImage>,
    pub language: Language,
}

impl PromptRequest {
    /// Validate a raw body into a dispatchable request.
    ///
    /// Rejections carry a stable message naming the unusable field; no
    /// upstream call is made on any failure path here.
    pub fn from_body(body: ChatBody) -> Result<Self, AppError> {
        let language = match body.language.as_deref().map(str::trim) {
            None | Some("") => Language::default(),
            Some(tag) => Language::parse(tag)
                .ok_or_else(|| AppError::invalid_input(format!("Unsupported language '{tag}'")))?,
        };

        let text = trimmed_non_empty(&body.prompt).or_else(|| trimmed_non_empty(&body.message));
        let kind_tag = body.kind.as_deref().map(str::trim).unwrap_or("");

        match kind_tag {
            "" | "generic" => Ok(Self {
                kind: PromptKind::Generic,
                text: text.ok_or_else(|| AppError::invalid_input("Invalid prompt"))?,
                image: optional_image(&body)?,
                language,
            }),
            "expert" => Ok(Self {
                kind: PromptKind::Expert,
                text: text.ok_or_else(|| AppError::invalid_input("Invalid prompt"))?,
                image: optional_image(&body)?,
                language,
            }),
            "crop-diagnosis" => Ok(Self {
                kind: PromptKind::Diagnosis,
                text: text.unwrap_or_default(),
                image: Some(required_image(&body)?),
                language,
            }),
            "deep-expert" => {
                let disease = trimmed_non_empty(&body.disease)
                    .or(text)
                    .ok_or_else(|| AppError::invalid_input("Invalid disease name"))?;
                Ok(Self {
                    kind: PromptKind::DeepExpert { disease },
                    text: String::new(),
                    image: Some(required_image(&body)?),
                    language,
                })
            }
            other => Err(AppError::invalid_input(format!(
                "Unknown request type '{other}'"
            ))),
        }
    }
}

fn trimmed_non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn optional_image(body: &ChatBody) -> Result<Option<InlineImage>, AppError> {
    match body.image.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_image(raw).map(Some),
    }
}

fn required_image(body: &ChatBody) -> Result<InlineImage, AppError> {
    optional_image(body)?.ok_or_else(|| AppError::invalid_input("Invalid image"))
}

/// Split a `data:` URL into mime type and payload, or take bare base64 as-is.
/// The payload is checked against the base64 alphabet after whitespace is
/// stripped; anything else is rejected before it can reach a provider.
fn parse_image(raw: &str) -> Result<InlineImage, AppError> {
    let (mime_type, payload) = match raw.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| AppError::invalid_input("Invalid image"))?;
            let mime = header.split(';').next().unwrap_or("").trim();
            let mime = if mime.is_empty() { DEFAULT_IMAGE_MIME } else { mime };
            (mime.to_string(), payload)
        }
        None => (DEFAULT_IMAGE_MIME.to_string(), raw),
    };

    let data: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if data.is_empty() || !is_base64(&data) {
        return Err(AppError::invalid_input("Invalid image"));
    }

    Ok(InlineImage { mime_type, data })
}

fn is_base64(data: &str) -> bool {
    data.bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}
