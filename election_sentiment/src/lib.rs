mod config;
pub mod builder;
pub mod manual;

use chrono::NaiveDate;
use log::{debug, info};

use std::collections::{BTreeMap, HashMap, HashSet};

pub use crate::config::*;

/// Reported as the main topic when no representative word is available.
pub const NO_TOPIC: &str = "N/A";

/// Reported as the country of the dataset unless configured otherwise.
pub const DEFAULT_COUNTRY: &str = "USA";

/// The columns of the input table, not counting the representative word.
pub const BASE_COLUMN_COUNT: u64 = 11;

/// Number of columns added by the derivation: preferred_candidate, engagement, normalized_sentiment.
const DERIVED_COLUMN_COUNT: u64 = 3;

/// The loaded dataset with all the derived fields attached.
///
/// It is built once (see [builder::Builder]) and never mutated afterwards.
/// Every change in the filter controls goes through [Dashboard::render].
#[derive(Debug)]
pub struct Dashboard {
    records: Vec<AnnotatedRecord>,
    preferred: BTreeMap<String, String>,
    overview: DatasetOverview,
    options: FilterOptions,
}

impl Dashboard {
    pub(crate) fn assemble(
        records: Vec<Record>,
        candidates: &CandidatePair,
        country: &str,
        column_count: u64,
        has_representative_word: bool,
    ) -> Result<Dashboard, DashboardErrors> {
        if records.is_empty() {
            return Err(DashboardErrors::EmptyDataset);
        }
        info!(
            "Assembling dashboard over {:?} records, candidates: {:?}",
            records.len(),
            candidates
        );
        let (annotated, preferred) = derive_all(records, candidates);
        let overview = compute_overview(
            &annotated,
            country,
            column_count + DERIVED_COLUMN_COUNT,
            has_representative_word,
        );
        let options = compute_filter_options(&annotated)?;
        info!("Overview: {:?}", overview);
        debug!("Filter options: {:?}", options);
        Ok(Dashboard {
            records: annotated,
            preferred,
            overview,
            options,
        })
    }

    pub fn records(&self) -> &[AnnotatedRecord] {
        &self.records
    }

    /// The preferred candidate of each state, over the full dataset.
    pub fn preferred_candidates(&self) -> &BTreeMap<String, String> {
        &self.preferred
    }

    pub fn overview(&self) -> &DatasetOverview {
        &self.overview
    }

    pub fn filter_options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn default_filter(&self) -> FilterSpec {
        FilterSpec::defaults(&self.options)
    }

    /// Runs the filter and the aggregations for one selection.
    ///
    /// A selection that matches nothing stops here with [RenderOutcome::NoData].
    pub fn render(&self, spec: &FilterSpec) -> RenderOutcome {
        debug!("render: spec: {:?}", spec);
        let filtered = filter_records(&self.records, spec);
        if filtered.is_empty() {
            info!("No data available for the selected filters");
            return RenderOutcome::NoData;
        }
        let state_days = aggregate_state_days(&filtered);
        let frames = map_frames(&state_days);
        let timeline = aggregate_days(&filtered);
        info!(
            "render: {} rows -> {} state/day summaries, {} frames, {} days",
            filtered.len(),
            state_days.len(),
            frames.len(),
            timeline.len()
        );
        RenderOutcome::Data(DashboardView {
            rows: filtered.len() as u64,
            state_days,
            frames,
            timeline,
        })
    }
}

// ******** Derivation *********

/// Finds, for every state of the dataset, the candidate with the higher total
/// weighted sentiment.
///
/// The first candidate must be strictly ahead. On a tie, or when neither
/// candidate appears in a state, the second candidate is selected.
/// Records without a state are ignored, and so are the candidates that are
/// not part of the pair.
pub fn compute_preferred_candidates(
    records: &[Record],
    candidates: &CandidatePair,
) -> BTreeMap<String, String> {
    // (total of the first candidate, total of the second candidate)
    let mut totals: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for r in records.iter() {
        let state = match &r.state_code {
            Some(s) => s,
            None => continue,
        };
        let entry = totals.entry(state.clone()).or_insert((0.0, 0.0));
        match r.candidate.as_deref() {
            Some(c) if c == candidates.first => entry.0 += r.weighted_sentiment.unwrap_or(0.0),
            Some(c) if c == candidates.second => entry.1 += r.weighted_sentiment.unwrap_or(0.0),
            _ => {}
        }
    }

    totals
        .into_iter()
        .map(|(state, (first_total, second_total))| {
            let preferred = if first_total > second_total {
                &candidates.first
            } else {
                if first_total == second_total {
                    debug!(
                        "compute_preferred_candidates: no dominant candidate in {}: {} vs {}, using {}",
                        state, first_total, second_total, candidates.second
                    );
                }
                &candidates.second
            };
            (state, preferred.clone())
        })
        .collect()
}

/// Computes the engagement, the normalized sentiment and the preferred
/// candidate of one record.
///
/// A missing count makes the engagement missing, and the normalized sentiment
/// falls back to 0 as for a record without engagement. A missing weighted
/// sentiment is only propagated when there is some engagement to divide by.
pub fn attach_derived_fields(
    record: Record,
    preferred: &BTreeMap<String, String>,
) -> AnnotatedRecord {
    let engagement = record
        .likes
        .zip(record.retweet_count)
        .map(|(likes, retweets)| likes + retweets);
    let normalized_sentiment = match engagement {
        Some(e) if e > 0.0 => record.weighted_sentiment.map(|w| w / e),
        _ => Some(0.0),
    };
    let preferred_candidate = record
        .state_code
        .as_ref()
        .and_then(|s| preferred.get(s))
        .cloned();
    AnnotatedRecord {
        record,
        engagement,
        normalized_sentiment,
        preferred_candidate,
    }
}

/// Attaches the derived fields to all the records.
///
/// The preferred candidates are computed over all the records passed here,
/// so this must be called on the full dataset, before any filtering.
pub fn derive_all(
    records: Vec<Record>,
    candidates: &CandidatePair,
) -> (Vec<AnnotatedRecord>, BTreeMap<String, String>) {
    let preferred = compute_preferred_candidates(&records, candidates);
    debug!("derive_all: preferred candidates: {:?}", preferred);
    let annotated = records
        .into_iter()
        .map(|r| attach_derived_fields(r, &preferred))
        .collect();
    (annotated, preferred)
}

pub fn compute_overview(
    records: &[AnnotatedRecord],
    country: &str,
    column_count: u64,
    has_representative_word: bool,
) -> DatasetOverview {
    let total_likes: f64 = records.iter().filter_map(|ar| ar.record.likes).sum();
    let total_retweets: f64 = records
        .iter()
        .filter_map(|ar| ar.record.retweet_count)
        .sum();

    let topic = if has_representative_word {
        most_frequent(
            records
                .iter()
                .filter_map(|ar| ar.record.representative_word.as_deref()),
        )
    } else {
        None
    };
    let (main_topic, main_topic_count) = topic.unwrap_or_else(|| (NO_TOPIC.to_string(), 0));

    DatasetOverview {
        total_tweets: records.len() as u64,
        total_retweets,
        total_likes,
        rows: records.len() as u64,
        columns: column_count,
        country: country.to_string(),
        main_topic,
        main_topic_count,
    }
}

pub fn compute_filter_options(
    records: &[AnnotatedRecord],
) -> Result<FilterOptions, DashboardErrors> {
    let min_date = records
        .iter()
        .map(|ar| ar.record.date())
        .min()
        .ok_or(DashboardErrors::EmptyDataset)?;
    let max_date = records
        .iter()
        .map(|ar| ar.record.date())
        .max()
        .ok_or(DashboardErrors::EmptyDataset)?;
    Ok(FilterOptions {
        candidates: distinct(records.iter().map(|ar| ar.record.candidate.as_deref())),
        sentiments: distinct(records.iter().map(|ar| ar.record.sentiment.as_deref())),
        states: distinct(records.iter().map(|ar| ar.record.state_code.as_deref())),
        min_date,
        max_date,
    })
}

// The non-empty values, in order of first appearance.
fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for v in values.flatten() {
        if seen.insert(v) {
            res.push(v.to_string());
        }
    }
    res
}

// The most frequent value with its count. Ties go to the value seen first.
fn most_frequent<'a>(values: impl Iterator<Item = &'a str>) -> Option<(String, u64)> {
    let mut counts: Vec<(&str, u64)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for v in values {
        match positions.get(v) {
            Some(idx) => counts[*idx].1 += 1,
            None => {
                positions.insert(v, counts.len());
                counts.push((v, 1));
            }
        }
    }
    let mut best: Option<(&str, u64)> = None;
    for (v, c) in counts {
        if best.map_or(true, |(_, bc)| c > bc) {
            best = Some((v, c));
        }
    }
    best.map(|(v, c)| (v.to_string(), c))
}

// ******** Filtering *********

/// Selects the records matching the filter, sorted by creation time.
///
/// The sort is stable: records created at the same time keep their
/// relative order.
pub fn filter_records<'a, I>(records: I, spec: &FilterSpec) -> Vec<&'a AnnotatedRecord>
where
    I: IntoIterator<Item = &'a AnnotatedRecord>,
{
    let mut res: Vec<&AnnotatedRecord> = records
        .into_iter()
        .filter(|ar| matches_filter(&ar.record, spec))
        .collect();
    res.sort_by_key(|ar| ar.record.created_at);
    debug!("filter_records: {} records selected", res.len());
    res
}

fn matches_filter(r: &Record, spec: &FilterSpec) -> bool {
    let date = r.date();
    r.candidate
        .as_ref()
        .map_or(false, |c| spec.candidates.contains(c))
        && r.sentiment.as_deref() == Some(spec.sentiment.as_str())
        && r.state_code
            .as_ref()
            .map_or(false, |s| spec.states.contains(s))
        && spec.start_date <= date
        && date <= spec.end_date
}

// ******** Aggregation *********

#[derive(Default, Debug)]
struct StateDayAccumulator {
    total_likes: f64,
    total_retweets: f64,
    sentiment_sum: f64,
    sentiment_count: u64,
    // Candidate labels with their number of occurrences, in order of first appearance.
    labels: Vec<(String, u64)>,
}

impl StateDayAccumulator {
    fn add(&mut self, ar: &AnnotatedRecord) {
        self.total_likes += ar.record.likes.unwrap_or(0.0);
        self.total_retweets += ar.record.retweet_count.unwrap_or(0.0);
        if let Some(s) = ar.normalized_sentiment {
            self.sentiment_sum += s;
            self.sentiment_count += 1;
        }
        if let Some(label) = &ar.preferred_candidate {
            match self.labels.iter_mut().find(|(l, _)| l == label) {
                Some((_, c)) => *c += 1,
                None => self.labels.push((label.clone(), 1)),
            }
        }
    }

    fn mean_sentiment(&self) -> Option<f64> {
        if self.sentiment_count > 0 {
            Some(self.sentiment_sum / (self.sentiment_count as f64))
        } else {
            None
        }
    }

    fn mode(&self) -> Option<String> {
        let mut best: Option<&(String, u64)> = None;
        for p in self.labels.iter() {
            if best.map_or(true, |b| p.1 > b.1) {
                best = Some(p);
            }
        }
        best.map(|(l, _)| l.clone())
    }
}

/// Groups the filtered records by state and calendar day.
///
/// Only the (state, day) pairs present in the input are returned, ordered by
/// state then by day. Records without a state are dropped.
pub fn aggregate_state_days(filtered: &[&AnnotatedRecord]) -> Vec<StateDaySummary> {
    let coordinates = state_coordinates(filtered);
    let mut groups: BTreeMap<(String, NaiveDate), StateDayAccumulator> = BTreeMap::new();
    for ar in filtered.iter() {
        if let Some(state) = &ar.record.state_code {
            groups
                .entry((state.clone(), ar.record.date()))
                .or_default()
                .add(ar);
        }
    }

    groups
        .into_iter()
        .map(|((state_code, date), acc)| {
            let coords = coordinates.get(&state_code).copied();
            StateDaySummary {
                date,
                total_likes: acc.total_likes,
                total_retweets: acc.total_retweets,
                normalized_sentiment: acc.mean_sentiment(),
                preferred_candidate: acc.mode(),
                lat: coords.map(|(lat, _)| lat),
                long: coords.map(|(_, long)| long),
                state_code,
            }
        })
        .collect()
}

/// One (latitude, longitude) pair per state: the first complete one in the
/// filtered records.
pub fn state_coordinates(filtered: &[&AnnotatedRecord]) -> BTreeMap<String, (f64, f64)> {
    let mut res: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for ar in filtered.iter() {
        if let (Some(state), Some(lat), Some(long)) =
            (&ar.record.state_code, ar.record.lat, ar.record.long)
        {
            res.entry(state.clone()).or_insert((lat, long));
        }
    }
    res
}

#[derive(Default, Debug)]
struct DayAccumulator {
    tweet_count: u64,
    total_likes: f64,
    score_sum: f64,
    score_count: u64,
}

/// The timeline: one entry per calendar day, in order.
pub fn aggregate_days(filtered: &[&AnnotatedRecord]) -> Vec<DaySummary> {
    let mut groups: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for ar in filtered.iter() {
        let acc = groups.entry(ar.record.date()).or_default();
        // Tweets without an id are not counted, but their likes are.
        if !ar.record.tweet_id.is_empty() {
            acc.tweet_count += 1;
        }
        acc.total_likes += ar.record.likes.unwrap_or(0.0);
        if let Some(score) = ar.record.sentiment_score {
            acc.score_sum += score;
            acc.score_count += 1;
        }
    }
    groups
        .into_iter()
        .map(|(date, acc)| DaySummary {
            date,
            tweet_count: acc.tweet_count,
            total_likes: acc.total_likes,
            mean_sentiment_score: if acc.score_count > 0 {
                Some(acc.score_sum / (acc.score_count as f64))
            } else {
                None
            },
        })
        .collect()
}

/// Splits the state summaries into the frames of the map animation.
pub fn map_frames(summaries: &[StateDaySummary]) -> Vec<MapFrame> {
    let mut frames: BTreeMap<NaiveDate, Vec<StateDaySummary>> = BTreeMap::new();
    for s in summaries.iter() {
        frames.entry(s.date).or_default().push(s.clone());
    }
    frames
        .into_iter()
        .map(|(date, states)| MapFrame {
            date: date.format("%Y-%m-%d").to_string(),
            states,
        })
        .collect()
}
