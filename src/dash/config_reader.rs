use crate::dash::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SENTIMENT_COLUMN: &str = "sentiment_vader";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSource {
    /// csv or xlsx
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "sentimentColumn")]
    pub sentiment_column: Option<String>,
}

/// A partial selection. The missing fields keep the default of the dashboard.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSettings {
    pub candidates: Option<Vec<String>>,
    pub sentiment: Option<String>,
    pub states: Option<Vec<String>>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

impl FilterSettings {
    /// The fields set in `other` replace the ones of `self`.
    pub fn overlay(&self, other: &FilterSettings) -> FilterSettings {
        FilterSettings {
            candidates: other.candidates.clone().or_else(|| self.candidates.clone()),
            sentiment: other.sentiment.clone().or_else(|| self.sentiment.clone()),
            states: other.states.clone().or_else(|| self.states.clone()),
            start_date: other.start_date.clone().or_else(|| self.start_date.clone()),
            end_date: other.end_date.clone().or_else(|| self.end_date.clone()),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    pub country: Option<String>,
    /// A file path, or stdout
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashConfig {
    #[serde(rename = "inputSource", default)]
    pub input_source: InputSource,
    pub candidates: Option<CandidatePair>,
    #[serde(default)]
    pub filters: FilterSettings,
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
}

pub fn read_config(path: &str) -> DashResult<DashConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

pub fn read_summary(path: &str) -> DashResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_summary: {:?}", js);
    Ok(js)
}

pub fn parse_date(s: &str) -> DashResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .context(ParsingDateSnafu { content: s })
}
