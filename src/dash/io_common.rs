// Primitives shared by all the readers.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::dash::*;

/// Cell contents that are read as a missing value.
const MISSING_VALUES: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// The table, as returned by the readers.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub records: Vec<Record>,
    /// Number of columns in the header, including the ones that are not used.
    pub column_count: u64,
    pub has_representative_word: bool,
}

/// The position of each column of interest in a row.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnIndexes {
    tweet_id: usize,
    created_at: usize,
    candidate: usize,
    state_code: usize,
    sentiment: usize,
    likes: usize,
    retweet_count: usize,
    weighted_sentiment: usize,
    sentiment_score: usize,
    lat: usize,
    long: usize,
    representative_word: Option<usize>,
}

pub fn find_columns(
    header: &[String],
    sentiment_column: &str,
    path: &str,
) -> DashResult<ColumnIndexes> {
    let position = |name: &str| header.iter().position(|h| h.trim() == name);
    let required = |name: &str| -> DashResult<usize> {
        position(name).context(MissingColumnSnafu {
            column: name,
            path,
        })
    };
    let cols = ColumnIndexes {
        tweet_id: required("tweet_id")?,
        created_at: required("created_at")?,
        candidate: required("candidate")?,
        state_code: required("state_code")?,
        sentiment: required(sentiment_column)?,
        likes: required("likes")?,
        retweet_count: required("retweet_count")?,
        weighted_sentiment: required("weighted_sentiment")?,
        sentiment_score: required("sentiment_score")?,
        lat: required("lat")?,
        long: required("long")?,
        representative_word: position("representative_word"),
    };
    debug!("find_columns: {:?}", cols);
    Ok(cols)
}

impl ColumnIndexes {
    pub fn has_representative_word(&self) -> bool {
        self.representative_word.is_some()
    }
}

fn is_missing(s: &str) -> bool {
    MISSING_VALUES.contains(&s.trim())
}

fn text(s: &str) -> Option<String> {
    if is_missing(s) {
        None
    } else {
        Some(s.trim().to_string())
    }
}

fn optional_number(lineno: usize, column: &str, s: &str) -> DashResult<Option<f64>> {
    if is_missing(s) {
        return Ok(None);
    }
    s.trim()
        .parse::<f64>()
        .ok()
        .map(Some)
        .context(ParsingNumberSnafu {
            lineno,
            column,
            content: s,
        })
}

// Short rows are padded with empty cells.
fn cell_at<'a>(row: &[&'a str], idx: usize) -> &'a str {
    row.get(idx).copied().unwrap_or("")
}

/// Reads a timestamp.
///
/// When an offset is present, the local time is kept as written.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Builds a record from the cells of one row.
///
/// `lineno` is only used to report errors.
pub fn parse_record(lineno: usize, row: &[&str], cols: &ColumnIndexes) -> DashResult<Record> {
    let cell = |idx: usize| cell_at(row, idx);

    let created_at_s = cell(cols.created_at);
    let created_at = parse_timestamp(created_at_s).context(ParsingTimestampSnafu {
        lineno,
        content: created_at_s,
    })?;

    Ok(Record {
        tweet_id: cell(cols.tweet_id).trim().to_string(),
        created_at,
        candidate: text(cell(cols.candidate)),
        state_code: text(cell(cols.state_code)),
        sentiment: text(cell(cols.sentiment)),
        representative_word: cols.representative_word.and_then(|idx| text(cell(idx))),
        likes: optional_number(lineno, "likes", cell(cols.likes))?,
        retweet_count: optional_number(lineno, "retweet_count", cell(cols.retweet_count))?,
        weighted_sentiment: optional_number(
            lineno,
            "weighted_sentiment",
            cell(cols.weighted_sentiment),
        )?,
        sentiment_score: optional_number(lineno, "sentiment_score", cell(cols.sentiment_score))?,
        lat: optional_number(lineno, "lat", cell(cols.lat))?,
        long: optional_number(lineno, "long", cell(cols.long))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &str) -> Vec<String> {
        names.split(',').map(|s| s.to_string()).collect()
    }

    const HEADER: &str = "tweet_id,created_at,likes,retweet_count,candidate,state_code,lat,long,sentiment_score,sentiment_vader,weighted_sentiment";

    #[test]
    fn timestamps() {
        let expected = NaiveDate::from_ymd_opt(2020, 10, 15)
            .unwrap()
            .and_hms_opt(23, 30, 5)
            .unwrap();
        assert_eq!(parse_timestamp("2020-10-15 23:30:05"), Some(expected));
        assert_eq!(parse_timestamp("2020-10-15T23:30:05"), Some(expected));
        assert_eq!(parse_timestamp("2020-10-15T23:30:05Z"), Some(expected));
        // The offset does not move the day.
        assert_eq!(parse_timestamp("2020-10-15 23:30:05-05:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2020-10-15 23:30:05.250"),
            Some(expected + chrono::Duration::milliseconds(250))
        );
        assert_eq!(
            parse_timestamp("2020-10-15"),
            NaiveDate::from_ymd_opt(2020, 10, 15).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("15/10/2020"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn missing_column() {
        let res = find_columns(&header(HEADER), "sentiment_label", "tweets.csv");
        match res {
            Err(DashError::MissingColumn { column, path }) => {
                assert_eq!(column, "sentiment_label");
                assert_eq!(path, "tweets.csv");
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn optional_representative_word() {
        let cols = find_columns(&header(HEADER), "sentiment_vader", "tweets.csv").unwrap();
        assert!(!cols.has_representative_word());
        let with_word = format!("{},representative_word", HEADER);
        let cols = find_columns(&header(&with_word), "sentiment_vader", "tweets.csv").unwrap();
        assert!(cols.has_representative_word());
    }

    #[test]
    fn record_cells() {
        let cols = find_columns(&header(HEADER), "sentiment_vader", "tweets.csv").unwrap();
        let row = vec![
            "1.3166e18",
            "2020-10-15 00:00:01",
            "12.0",
            "",
            "Joe Biden",
            "NaN",
            "",
            "",
            "0.4",
            "positive",
            "-2.5",
        ];
        let r = parse_record(2, &row, &cols).unwrap();
        assert_eq!(r.tweet_id, "1.3166e18");
        assert_eq!(r.likes, Some(12.0));
        assert_eq!(r.retweet_count, None);
        assert_eq!(r.candidate, Some("Joe Biden".to_string()));
        assert_eq!(r.state_code, None);
        assert_eq!(r.lat, None);
        assert_eq!(r.sentiment_score, Some(0.4));
        assert_eq!(r.weighted_sentiment, Some(-2.5));
        assert_eq!(r.representative_word, None);
    }

    #[test]
    fn bad_cells() {
        let cols = find_columns(&header(HEADER), "sentiment_vader", "tweets.csv").unwrap();
        let mut row = vec![
            "1",
            "yesterday",
            "1",
            "1",
            "Joe Biden",
            "OH",
            "",
            "",
            "",
            "positive",
            "1",
        ];
        assert!(matches!(
            parse_record(7, &row, &cols),
            Err(DashError::ParsingTimestamp { lineno: 7, .. })
        ));
        row[1] = "2020-10-15";
        row[2] = "many";
        assert!(matches!(
            parse_record(8, &row, &cols),
            Err(DashError::ParsingNumber { lineno: 8, .. })
        ));
    }
}
