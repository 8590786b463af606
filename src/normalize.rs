use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Served whenever the upstream call failed and a generation endpoint degrades.
pub const UNAVAILABLE_MESSAGE: &str = "AI service temporarily unavailable";
/// Degraded body for the deep expert view.
pub const EXPERT_UNAVAILABLE_MESSAGE: &str = "Expert analysis currently unavailable.";
/// Ticker text shown while the news feed has nothing usable.
pub const NEWS_PLACEHOLDER: &str = "Updating live feed...";

const UNKNOWN_DISEASE: &str = "Unknown";
const FALLBACK_TEMPERATURE: &str = "18°C";
const FALLBACK_CONDITION: &str = "Clear";
const FALLBACK_HUMIDITY: &str = "55%";

/// Plain-text reply for generic and expert prompts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatAnswer {
    pub answer: String,
}

impl ChatAnswer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }

    pub fn unavailable() -> Self {
        Self::new(UNAVAILABLE_MESSAGE)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    /// Case-insensitive parse for model output.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            _ => None,
        }
    }
}

/// Structured crop diagnosis. Every field has a defined default, so this type
/// can always be produced no matter what the model returned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub disease_name: String,
    pub confidence: f64,
    pub severity: Severity,
    pub description: String,
    pub treatment: Vec<String>,
    pub preventive_measures: Vec<String>,
}

impl Default for DiagnosisResult {
    fn default() -> Self {
        Self {
            disease_name: UNKNOWN_DISEASE.to_string(),
            confidence: 0.0,
            severity: Severity::Low,
            description: String::new(),
            treatment: Vec::new(),
            preventive_measures: Vec::new(),
        }
    }
}

impl DiagnosisResult {
    /// Build a diagnosis from raw model text.
    ///
    /// The model is asked for a single JSON object but routinely wraps it in
    /// markdown fences or prose, drops fields, or returns junk. Parsing is
    /// field-by-field: each usable field is taken, everything else falls back
    /// to the documented default. This function does not fail.
    pub fn from_model_text(text: &str) -> Self {
        match extract_json_object(text) {
            Some(value) => Self::from_value(&value),
            None => Self::default(),
        }
    }

    /// Degraded diagnosis served when the upstream call itself failed.
    pub fn unavailable() -> Self {
        Self {
            description: UNAVAILABLE_MESSAGE.to_string(),
            ..Self::default()
        }
    }

    fn from_value(value: &Value) -> Self {
        Self {
            disease_name: non_empty_string(value, "diseaseName")
                .unwrap_or_else(|| UNKNOWN_DISEASE.to_string()),
            confidence: confidence_field(value),
            severity: non_empty_string(value, "severity")
                .and_then(|raw| Severity::parse(&raw))
                .unwrap_or_default(),
            description: string_field(value, "description").unwrap_or_default(),
            treatment: string_list_field(value, "treatment"),
            preventive_measures: string_list_field(value, "preventiveMeasures"),
        }
    }
}

/// Dashboard weather summary with a static fallback.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeatherSummary {
    pub city: String,
    pub temperature: String,
    pub condition: String,
    pub humidity: String,
}

impl WeatherSummary {
    /// Static values served when no live weather is available.
    pub fn fallback(city: &str) -> Self {
        Self {
            city: city.to_string(),
            temperature: FALLBACK_TEMPERATURE.to_string(),
            condition: FALLBACK_CONDITION.to_string(),
            humidity: FALLBACK_HUMIDITY.to_string(),
        }
    }

    /// Merge model output over the static fallback, field by field.
    pub fn from_model_text(city: &str, text: &str) -> Self {
        let fallback = Self::fallback(city);
        let Some(value) = extract_json_object(text) else {
            return fallback;
        };

        Self {
            city: city.to_string(),
            temperature: non_empty_string(&value, "temperature").unwrap_or(fallback.temperature),
            condition: non_empty_string(&value, "condition").unwrap_or(fallback.condition),
            humidity: non_empty_string(&value, "humidity").unwrap_or(fallback.humidity),
        }
    }
}

/// Locate and parse the first JSON object inside free-form model text.
///
/// Handles the three shapes seen in practice: bare JSON, JSON inside a
/// markdown code fence, and JSON embedded in prose.
fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str::<Value>(&trimmed[start..=end])
        .ok()
        .filter(|value| value.is_object())
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(str::to_owned)
}

fn non_empty_string(value: &Value, key: &str) -> Option<String> {
    string_field(value, key).filter(|s| !s.trim().is_empty())
}

/// Collect the string entries of an array field, skipping anything that is
/// not a string. A missing or mistyped field yields an empty list.
fn string_list_field(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

/// Confidence clamped to [0, 1]. Anything non-numeric counts as zero.
fn confidence_field(value: &Value) -> f64 {
    value
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite())
        .map(|n| n.clamp(0.0, 1.0))
        .unwrap_or(0.0)
}
