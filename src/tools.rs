//! Tool-call boundary: definitions, parameter decoding, and result rendering.
//!
//! Every call produces a single pretty-printed JSON string. Failures are
//! rendered as `{"error": "<message>"}` through the same channel; the typed
//! `QueryError` is only flattened here.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::constants::limits::{
    QUERY_MAX_CHARS, QUERY_MIN_CHARS, SAMPLE_DEFAULT, SAMPLE_MAX, SAMPLE_MIN,
    SEARCH_LIMIT_DEFAULT, SEARCH_LIMIT_MAX, SEARCH_LIMIT_MIN,
};
use crate::constants::tools::{
    ANALYZE_EMOTION_DISTRIBUTION, COUNT_BY_EMOTION, GET_SAMPLE, SEARCH_TEXT,
};
use crate::data::Emotion;
use crate::errors::QueryError;
use crate::queries::EmotionQueries;

/// Behavior hints advertised with each tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    /// Human-readable title.
    pub title: String,
    /// The tool never modifies state.
    pub read_only_hint: bool,
    /// The tool may destroy data.
    pub destructive_hint: bool,
    /// Repeated calls with the same arguments give the same result.
    pub idempotent_hint: bool,
    /// The tool reaches systems beyond the loaded dataset.
    pub open_world_hint: bool,
}

impl ToolAnnotations {
    fn read_only(title: &str, idempotent: bool) -> Self {
        Self {
            title: title.to_string(),
            read_only_hint: true,
            destructive_hint: false,
            idempotent_hint: idempotent,
            open_world_hint: false,
        }
    }
}

/// Tool definition: name, description, JSON Schema for input, and hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name used in `tools/call`.
    pub name: String,
    /// What the tool returns.
    pub description: String,
    /// JSON Schema of the `arguments` object.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    /// Behavior hints.
    pub annotations: ToolAnnotations,
}

impl ToolDefinition {
    fn new(
        name: &str,
        description: &str,
        input_schema: Value,
        annotations: ToolAnnotations,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
            annotations,
        }
    }
}

/// Definitions for the four dataset tools.
pub fn definitions() -> Vec<ToolDefinition> {
    let emotion_names = Emotion::ALL
        .iter()
        .map(|emotion| emotion.name())
        .collect::<Vec<_>>();
    vec![
        ToolDefinition::new(
            GET_SAMPLE,
            "Get n random samples from the emotion dataset. Returns a JSON array of \
             {text, emotion, label_id} objects; each call draws a fresh random selection.",
            json!({
                "type": "object",
                "properties": {
                    "n": {
                        "type": "integer",
                        "minimum": SAMPLE_MIN,
                        "maximum": SAMPLE_MAX,
                        "default": SAMPLE_DEFAULT,
                        "description": "Number of random samples to retrieve"
                    }
                },
                "additionalProperties": false
            }),
            ToolAnnotations::read_only("Get Random Samples", false),
        ),
        ToolDefinition::new(
            COUNT_BY_EMOTION,
            "Count the number of samples labeled with one emotion. Returns \
             {emotion, count, total, percentage}.",
            json!({
                "type": "object",
                "properties": {
                    "emotion": {
                        "type": "string",
                        "enum": emotion_names,
                        "description": "Emotion to count (sadness, joy, love, anger, fear, surprise)"
                    }
                },
                "required": ["emotion"],
                "additionalProperties": false
            }),
            ToolAnnotations::read_only("Count Samples by Emotion", true),
        ),
        ToolDefinition::new(
            SEARCH_TEXT,
            "Case-insensitive substring search across all samples, in dataset order. \
             Returns {query, count, results} with up to `limit` matches.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "minLength": QUERY_MIN_CHARS,
                        "maxLength": QUERY_MAX_CHARS,
                        "description": "Text to search for in samples"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": SEARCH_LIMIT_MIN,
                        "maximum": SEARCH_LIMIT_MAX,
                        "default": SEARCH_LIMIT_DEFAULT,
                        "description": "Maximum number of results to return"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
            ToolAnnotations::read_only("Search Text in Samples", true),
        ),
        ToolDefinition::new(
            ANALYZE_EMOTION_DISTRIBUTION,
            "Count and percentage for every emotion across the dataset, sorted by \
             emotion name. Returns {total_samples, distribution}.",
            json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
            ToolAnnotations::read_only("Analyze Emotion Distribution", true),
        ),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetSampleParams {
    #[serde(default = "default_sample_size")]
    n: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CountByEmotionParams {
    emotion: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchTextParams {
    query: String,
    #[serde(default = "default_search_limit")]
    limit: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

fn default_sample_size() -> i64 {
    SAMPLE_DEFAULT
}

fn default_search_limit() -> i64 {
    SEARCH_LIMIT_DEFAULT
}

/// Routes tool calls to `EmotionQueries` and renders their results.
#[derive(Clone)]
pub struct ToolRouter {
    queries: EmotionQueries,
}

impl ToolRouter {
    /// Create a router over `queries`.
    pub fn new(queries: EmotionQueries) -> Self {
        Self { queries }
    }

    /// Underlying query facade.
    pub fn queries(&self) -> &EmotionQueries {
        &self.queries
    }

    /// Run tool `name` with JSON `arguments`.
    ///
    /// Returns `None` for unknown tool names; otherwise the rendered payload,
    /// which is an `{"error": ...}` object when the call failed.
    pub fn call(&self, name: &str, arguments: Option<&Value>) -> Option<String> {
        debug!("[emotion:tools] call {} arguments={:?}", name, arguments);
        let payload = match name {
            GET_SAMPLE => self.run(arguments, "Failed to get samples", |params: GetSampleParams| {
                self.queries.get_sample(params.n)
            }),
            COUNT_BY_EMOTION => self.run(
                arguments,
                "Failed to count by emotion",
                |params: CountByEmotionParams| self.queries.count_by_emotion_name(&params.emotion),
            ),
            SEARCH_TEXT => self.run(arguments, "Failed to search text", |params: SearchTextParams| {
                self.queries.search_text(&params.query, params.limit)
            }),
            ANALYZE_EMOTION_DISTRIBUTION => self.run(
                arguments,
                "Failed to analyze distribution",
                |_: NoParams| self.queries.analyze_emotion_distribution(),
            ),
            _ => return None,
        };
        Some(payload)
    }

    fn run<P, T>(
        &self,
        arguments: Option<&Value>,
        failure_context: &str,
        op: impl FnOnce(P) -> Result<T, QueryError>,
    ) -> String
    where
        P: DeserializeOwned,
        T: Serialize,
    {
        let result = decode_params::<P>(arguments).and_then(op);
        match result {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(rendered) => rendered,
                Err(err) => render_error(&format!("{failure_context}: {err}")),
            },
            Err(err) if err.is_validation() => render_error(&err.to_string()),
            Err(err) => render_error(&format!("{failure_context}: {err}")),
        }
    }
}

/// Decode tool arguments, accepting a flat object or a `{"params": {...}}` wrapper.
///
/// Missing or `null` arguments decode as an empty object so defaults apply.
fn decode_params<P: DeserializeOwned>(arguments: Option<&Value>) -> Result<P, QueryError> {
    let mut value = match arguments {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(value) => value.clone(),
    };
    if let Value::Object(map) = &mut value
        && map.len() == 1
        && map.get("params").is_some_and(Value::is_object)
        && let Some(inner) = map.remove("params")
    {
        value = inner;
    }
    serde_json::from_value(value)
        .map_err(|err| QueryError::validation("arguments", err.to_string()))
}

/// Render `{"error": message}` as pretty JSON.
pub fn render_error(message: &str) -> String {
    let payload = json!({ "error": message });
    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
}
