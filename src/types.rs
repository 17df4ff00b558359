/// Identifier for the source that produced the dataset.
/// Examples: `emotion`, `emotion_fixture`
pub type SourceId = String;
/// Raw integer emotion code as stored in the dataset.
/// Examples: `0` (sadness), `5` (surprise)
pub type LabelId = i64;
/// Canonical lowercase emotion name.
/// Examples: `joy`, `anger`
pub type EmotionName = &'static str;
/// Name of a tool-call parameter, used in validation errors.
/// Examples: `n`, `query`, `limit`
pub type ParamName = &'static str;
/// Name of a tool at the tool-call boundary.
/// Examples: `get_sample`, `search_text`
pub type ToolName = String;
