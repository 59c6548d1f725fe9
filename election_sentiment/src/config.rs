// ********* Input data structures ***********

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::Display;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One tweet, as read from the input table.
///
/// Optional categorical fields are `None` when the cell was empty. Such
/// records are never offered as filter options, and a missing candidate or
/// state never matches a filter.
#[derive(PartialEq, Debug, Clone)]
pub struct Record {
    pub tweet_id: String,
    pub created_at: NaiveDateTime,
    pub candidate: Option<String>,
    pub state_code: Option<String>,
    /// The sentiment label (`positive`, `negative`, `neutral`, ...).
    pub sentiment: Option<String>,
    pub representative_word: Option<String>,
    /// Empty cells are `None`. They count as 0 in the totals.
    pub likes: Option<f64>,
    pub retweet_count: Option<f64>,
    pub weighted_sentiment: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

impl Record {
    pub fn date(&self) -> NaiveDate {
        self.created_at.date()
    }
}

/// A record with the fields computed once over the full dataset.
#[derive(PartialEq, Debug, Clone)]
pub struct AnnotatedRecord {
    pub record: Record,
    /// likes + retweets, `None` if either one is missing.
    pub engagement: Option<f64>,
    /// weighted_sentiment / engagement, or 0 when the engagement is not
    /// positive or is missing. `None` when the engagement is positive but the
    /// weighted sentiment is missing.
    pub normalized_sentiment: Option<f64>,
    /// The preferred candidate of the state of this record, if the record has a state.
    pub preferred_candidate: Option<String>,
}

/// The two candidates of the election.
///
/// The order matters: the first candidate is preferred in a state only if
/// its total weighted sentiment is strictly greater than the one of the
/// second candidate.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePair {
    pub first: String,
    pub second: String,
}

impl CandidatePair {
    pub fn new(first: &str, second: &str) -> Result<CandidatePair, DashboardErrors> {
        if first.is_empty() || second.is_empty() || first == second {
            return Err(DashboardErrors::InvalidCandidates);
        }
        Ok(CandidatePair {
            first: first.to_string(),
            second: second.to_string(),
        })
    }

    pub fn names(&self) -> [&str; 2] {
        [self.first.as_str(), self.second.as_str()]
    }
}

impl Default for CandidatePair {
    fn default() -> Self {
        CandidatePair {
            first: "Joe Biden".to_string(),
            second: "Donald Trump".to_string(),
        }
    }
}

/// The selection made with the filter controls.
///
/// The sentiment is a single label while the other filters accept several
/// values.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FilterSpec {
    pub candidates: BTreeSet<String>,
    pub sentiment: String,
    pub states: BTreeSet<String>,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
}

impl FilterSpec {
    /// The initial state of the controls: everything selected, the first
    /// sentiment label, the full date range.
    pub fn defaults(options: &FilterOptions) -> FilterSpec {
        FilterSpec {
            candidates: options.candidates.iter().cloned().collect(),
            sentiment: options.sentiments.first().cloned().unwrap_or_default(),
            states: options.states.iter().cloned().collect(),
            start_date: options.min_date,
            end_date: options.max_date,
        }
    }
}

// ******** Output data structures *********

/// The values that can be selected in the filter controls.
///
/// All the lists are in order of first appearance in the dataset.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub candidates: Vec<String>,
    pub sentiments: Vec<String>,
    pub states: Vec<String>,
    #[serde(rename = "minDate")]
    pub min_date: NaiveDate,
    #[serde(rename = "maxDate")]
    pub max_date: NaiveDate,
}

/// The headline numbers of the full dataset.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct DatasetOverview {
    #[serde(rename = "totalTweets")]
    pub total_tweets: u64,
    #[serde(rename = "totalRetweets")]
    pub total_retweets: f64,
    #[serde(rename = "totalLikes")]
    pub total_likes: f64,
    pub rows: u64,
    pub columns: u64,
    pub country: String,
    #[serde(rename = "mainTopic")]
    pub main_topic: String,
    #[serde(rename = "mainTopicCount")]
    pub main_topic_count: u64,
}

/// Statistics for one state on one day.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct StateDaySummary {
    #[serde(rename = "stateCode")]
    pub state_code: String,
    pub date: NaiveDate,
    #[serde(rename = "totalLikes")]
    pub total_likes: f64,
    #[serde(rename = "totalRetweets")]
    pub total_retweets: f64,
    /// The mean over the records that have one. `None` if none has.
    #[serde(rename = "normalizedSentiment")]
    pub normalized_sentiment: Option<f64>,
    #[serde(rename = "preferredCandidate")]
    pub preferred_candidate: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

/// One frame of the animated map: all the states seen on that day.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct MapFrame {
    pub date: String,
    pub states: Vec<StateDaySummary>,
}

/// Statistics for one day of the timeline.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    #[serde(rename = "tweetCount")]
    pub tweet_count: u64,
    #[serde(rename = "totalLikes")]
    pub total_likes: f64,
    #[serde(rename = "meanSentimentScore")]
    pub mean_sentiment_score: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct DashboardView {
    pub rows: u64,
    #[serde(rename = "stateDays")]
    pub state_days: Vec<StateDaySummary>,
    pub frames: Vec<MapFrame>,
    pub timeline: Vec<DaySummary>,
}

/// The outcome of applying a filter selection.
#[derive(PartialEq, Debug, Clone)]
pub enum RenderOutcome {
    /// The selection matched no record. Nothing gets aggregated.
    NoData,
    Data(DashboardView),
}

/// Errors that prevent the dashboard from being assembled.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DashboardErrors {
    EmptyDataset,
    /// The two candidates must be distinct and non-empty.
    InvalidCandidates,
}

impl Error for DashboardErrors {}

impl Display for DashboardErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardErrors::EmptyDataset => write!(f, "DashboardError: the dataset is empty"),
            DashboardErrors::InvalidCandidates => {
                write!(f, "DashboardError: two distinct candidate names are required")
            }
        }
    }
}
