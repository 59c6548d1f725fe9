pub use crate::config::*;
use crate::{Dashboard, BASE_COLUMN_COUNT, DEFAULT_COUNTRY};

/// A builder for assembling a dashboard from records.
///
/// The derived fields are computed when calling `build`, over all the records added so far.
///
/// ```
/// pub use election_sentiment::builder::Builder;
/// pub use election_sentiment::{CandidatePair, Record, RenderOutcome};
/// # use election_sentiment::DashboardErrors;
/// use chrono::NaiveDate;
///
/// let mut builder = Builder::new(&CandidatePair::default())?.country("USA");
///
/// builder.add_record(Record {
///     tweet_id: "1".to_string(),
///     created_at: NaiveDate::from_ymd_opt(2020, 10, 15).unwrap().and_hms_opt(12, 0, 0).unwrap(),
///     candidate: Some("Joe Biden".to_string()),
///     state_code: Some("OH".to_string()),
///     sentiment: Some("positive".to_string()),
///     representative_word: None,
///     likes: Some(3.0),
///     retweet_count: Some(1.0),
///     weighted_sentiment: Some(2.0),
///     sentiment_score: Some(0.4),
///     lat: None,
///     long: None,
/// })?;
///
/// let dashboard = builder.build()?;
/// assert_eq!(dashboard.preferred_candidates()["OH"], "Joe Biden");
/// assert!(matches!(dashboard.render(&dashboard.default_filter()), RenderOutcome::Data(_)));
///
/// # Ok::<(), DashboardErrors>(())
/// ```
pub struct Builder {
    pub(crate) _candidates: CandidatePair,
    pub(crate) _country: String,
    pub(crate) _column_count: Option<u64>,
    pub(crate) _has_representative_word: bool,
    pub(crate) _records: Vec<Record>,
}

impl Builder {
    pub fn new(candidates: &CandidatePair) -> Result<Builder, DashboardErrors> {
        Ok(Builder {
            _candidates: CandidatePair::new(&candidates.first, &candidates.second)?,
            _country: DEFAULT_COUNTRY.to_string(),
            _column_count: None,
            _has_representative_word: true,
            _records: Vec::new(),
        })
    }

    pub fn country(self, country: &str) -> Builder {
        Builder {
            _country: country.to_string(),
            ..self
        }
    }

    /// The number of columns of the input table, as reported in the overview.
    ///
    /// If not provided, it is inferred from the standard layout.
    pub fn column_count(self, column_count: u64) -> Builder {
        Builder {
            _column_count: Some(column_count),
            ..self
        }
    }

    /// Tells whether the input had a representative word column.
    /// Without it, the main topic is reported as not available.
    pub fn has_representative_word(self, present: bool) -> Builder {
        Builder {
            _has_representative_word: present,
            ..self
        }
    }

    pub fn add_record(&mut self, record: Record) -> Result<(), DashboardErrors> {
        self._records.push(record);
        Ok(())
    }

    pub fn add_records(&mut self, records: Vec<Record>) -> Result<(), DashboardErrors> {
        for r in records {
            self.add_record(r)?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<Dashboard, DashboardErrors> {
        let column_count = self._column_count.unwrap_or(if self._has_representative_word {
            BASE_COLUMN_COUNT + 1
        } else {
            BASE_COLUMN_COUNT
        });
        Dashboard::assemble(
            self._records,
            &self._candidates,
            &self._country,
            column_count,
            self._has_representative_word,
        )
    }
}
