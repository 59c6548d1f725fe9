use log::{debug, info, warn};

use election_sentiment::builder::Builder;
use election_sentiment::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::dash::config_reader::*;
use crate::dash::io_common::LoadedTable;

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
pub enum DashError {
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Required column {column} is missing in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Line {lineno}: could not parse the timestamp {content:?}"))]
    ParsingTimestamp { lineno: usize, content: String },
    #[snafu(display("Line {lineno}: could not parse the number {content:?} in column {column}"))]
    ParsingNumber {
        lineno: usize,
        column: String,
        content: String,
    },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel worksheet is missing or empty"))]
    EmptyExcel {},
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error serializing JSON"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Could not parse the date {content:?} (expected YYYY-MM-DD)"))]
    ParsingDate { content: String },
    #[snafu(display("Error accessing the input {path}"))]
    ReadingInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing the output {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error assembling the dashboard"))]
    Dashboard { source: DashboardErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashResult<T> = Result<T, DashError>;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputProvider {
    Csv,
    Excel,
}

/// Where and how to read the table of tweets.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct InputSettings {
    pub path: String,
    pub provider: InputProvider,
    pub excel_worksheet_name: Option<String>,
    pub sentiment_column: String,
}

fn read_table(input: &InputSettings) -> DashResult<LoadedTable> {
    info!("Attempting to read input file {:?}", input.path);
    match input.provider {
        InputProvider::Csv => io_csv::read_csv_records(input),
        InputProvider::Excel => io_excel::read_excel_records(input),
    }
}

fn load_dashboard(
    input: &InputSettings,
    candidates: &CandidatePair,
    country: &str,
) -> DashResult<Dashboard> {
    let table = read_table(input)?;
    info!(
        "Read {} records ({} columns) from {:?}",
        table.records.len(),
        table.column_count,
        input.path
    );
    if !table.has_representative_word {
        warn!("No representative_word column: the main topic will not be available");
    }
    let mut builder = Builder::new(candidates)
        .context(DashboardSnafu {})?
        .country(country)
        .column_count(table.column_count)
        .has_representative_word(table.has_representative_word);
    builder
        .add_records(table.records)
        .context(DashboardSnafu {})?;
    builder.build().context(DashboardSnafu {})
}

/// The dashboard with the modification time of the file it was loaded from.
struct DashboardSession {
    input: InputSettings,
    candidates: CandidatePair,
    country: String,
    modified: Option<SystemTime>,
    dashboard: Dashboard,
}

impl DashboardSession {
    fn open(input: &InputSettings, candidates: &CandidatePair, country: &str) -> DashResult<Self> {
        let modified = modification_time(&input.path)?;
        let dashboard = load_dashboard(input, candidates, country)?;
        Ok(DashboardSession {
            input: input.clone(),
            candidates: candidates.clone(),
            country: country.to_string(),
            modified,
            dashboard,
        })
    }

    /// Loads the input again if it changed on disk since the last load.
    fn refresh(&mut self) -> DashResult<()> {
        let modified = modification_time(&self.input.path)?;
        if modified.is_some() && modified != self.modified {
            info!("Input {:?} changed, reloading", self.input.path);
            self.dashboard = load_dashboard(&self.input, &self.candidates, &self.country)?;
            self.modified = modified;
        }
        Ok(())
    }
}

fn modification_time(path: &str) -> DashResult<Option<SystemTime>> {
    let meta = fs::metadata(path).context(ReadingInputSnafu { path })?;
    // Not all the platforms report it. The data is then never reloaded.
    Ok(meta.modified().ok())
}

/// Combines the default selection of the dashboard with the given settings.
fn build_selection(dashboard: &Dashboard, settings: &FilterSettings) -> DashResult<FilterSpec> {
    let mut spec = dashboard.default_filter();
    if let Some(cs) = &settings.candidates {
        spec.candidates = cs.iter().cloned().collect();
    }
    if let Some(s) = &settings.sentiment {
        spec.sentiment = s.clone();
    }
    if let Some(ss) = &settings.states {
        spec.states = ss.iter().cloned().collect();
    }
    if let Some(d) = &settings.start_date {
        spec.start_date = parse_date(d)?;
    }
    if let Some(d) = &settings.end_date {
        spec.end_date = parse_date(d)?;
    }
    debug!("build_selection: {:?}", spec);
    Ok(spec)
}

fn result_to_json(outcome: &RenderOutcome) -> JSValue {
    match outcome {
        RenderOutcome::NoData => json!({
            "status": "noData",
            "message": "No data available for the selected filters."
        }),
        RenderOutcome::Data(view) => json!({
            "status": "ok",
            "rows": view.rows,
            "stateDays": view.state_days,
            "frames": view.frames,
            "timeline": view.timeline
        }),
    }
}

fn build_summary_js(dashboard: &Dashboard, spec: &FilterSpec, outcome: &RenderOutcome) -> JSValue {
    json!({
        "overview": dashboard.overview(),
        "filters": dashboard.filter_options(),
        "selection": spec,
        "result": result_to_json(outcome)
    })
}

fn parse_provider(input_type: Option<&str>, path: &str) -> DashResult<InputProvider> {
    match input_type {
        Some("csv") => Ok(InputProvider::Csv),
        Some("xlsx") | Some("excel") => Ok(InputProvider::Excel),
        Some(x) => whatever!("Input type {:?} not implemented", x),
        None => {
            let is_excel = Path::new(path)
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |e| e.eq_ignore_ascii_case("xlsx"));
            Ok(if is_excel {
                InputProvider::Excel
            } else {
                InputProvider::Csv
            })
        }
    }
}

/// The configuration file, with all the command line options applied on top of it.
fn resolve_config(args: &Args) -> DashResult<(DashConfig, InputSettings)> {
    let (config, root_p): (DashConfig, Option<PathBuf>) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .map(|p| p.to_path_buf());
            (config, root)
        }
        None => (DashConfig::default(), None),
    };
    info!("config: {:?}", config);

    let path: String = match (&args.input, &config.input_source.file_path) {
        (Some(p), _) => p.clone(),
        (None, Some(p)) => {
            let full: PathBuf = match &root_p {
                Some(root) => root.join(p),
                None => PathBuf::from(p),
            };
            full.as_path().display().to_string()
        }
        (None, None) => {
            whatever!("No input file: use --input or set inputSource.filePath in the configuration")
        }
    };

    let input_type = args
        .input_type
        .as_deref()
        .or(config.input_source.provider.as_deref());
    let input = InputSettings {
        provider: parse_provider(input_type, &path)?,
        path,
        excel_worksheet_name: args
            .excel_worksheet_name
            .clone()
            .or_else(|| config.input_source.excel_worksheet_name.clone()),
        sentiment_column: args
            .sentiment_column
            .clone()
            .or_else(|| config.input_source.sentiment_column.clone())
            .unwrap_or_else(|| DEFAULT_SENTIMENT_COLUMN.to_string()),
    };

    let cli_filters = FilterSettings {
        candidates: args.candidates.clone(),
        sentiment: args.sentiment.clone(),
        states: args.states.clone(),
        start_date: args.start_date.clone(),
        end_date: args.end_date.clone(),
    };
    let default_candidates = CandidatePair::default();
    let config_candidates = config.candidates.clone().unwrap_or(default_candidates);
    let candidates = CandidatePair {
        first: args
            .first_candidate
            .clone()
            .unwrap_or(config_candidates.first),
        second: args
            .second_candidate
            .clone()
            .unwrap_or(config_candidates.second),
    };
    let resolved = DashConfig {
        input_source: config.input_source.clone(),
        candidates: Some(candidates),
        filters: config.filters.overlay(&cli_filters),
        output_settings: OutputSettings {
            country: args.country.clone().or(config.output_settings.country),
            output_path: args.out.clone().or(config.output_settings.output_path),
        },
    };
    Ok((resolved, input))
}

fn write_output(output_path: Option<&str>, contents: &str) -> DashResult<()> {
    match output_path {
        None | Some("stdout") | Some("") => {
            println!("{}", contents);
        }
        Some(p) => {
            fs::write(p, contents).context(WritingOutputSnafu { path: p })?;
            info!("Dashboard data written to {:?}", p);
        }
    }
    Ok(())
}

pub fn run_dashboard(args: &Args) -> DashResult<()> {
    let (config, input) = resolve_config(args)?;
    let candidates = config.candidates.clone().unwrap_or_default();
    let country = config
        .output_settings
        .country
        .clone()
        .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

    if args.interactive {
        return run_interactive(&input, &candidates, &country, &config.filters);
    }

    let dashboard = load_dashboard(&input, &candidates, &country)?;
    let spec = build_selection(&dashboard, &config.filters)?;
    let outcome = dashboard.render(&spec);
    if outcome == RenderOutcome::NoData {
        warn!("No data available for the selected filters: {:?}", spec);
    }

    // Assemble the final json
    let result_js = build_summary_js(&dashboard, &spec, &outcome);
    let pretty_js = serde_json::to_string_pretty(&result_js).context(SerializingJsonSnafu {})?;
    write_output(config.output_settings.output_path.as_deref(), &pretty_js)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js {
            warn!("Found differences with the reference string");
            print_diff(pretty_js_summary_ref.as_str(), pretty_js.as_ref(), "\n");
            whatever!("Difference detected between calculated output and reference output")
        }
        info!("Output matches the reference {:?}", summary_p);
    }

    Ok(())
}

// Answers one selection. Malformed selections get an error line instead of stopping the session.
fn answer_line(dashboard: &Dashboard, base: &FilterSettings, line: &str) -> JSValue {
    let request: FilterSettings = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            warn!("Could not parse the selection {:?}: {}", line, e);
            return json!({"status": "error", "message": e.to_string()});
        }
    };
    match build_selection(dashboard, &base.overlay(&request)) {
        Ok(spec) => {
            let outcome = dashboard.render(&spec);
            json!({"selection": spec, "result": result_to_json(&outcome)})
        }
        Err(e) => {
            warn!("Invalid selection {:?}: {}", line, e);
            json!({"status": "error", "message": e.to_string()})
        }
    }
}

fn run_interactive(
    input: &InputSettings,
    candidates: &CandidatePair,
    country: &str,
    base: &FilterSettings,
) -> DashResult<()> {
    let mut session = DashboardSession::open(input, candidates, country)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let ready = json!({
        "overview": session.dashboard.overview(),
        "filters": session.dashboard.filter_options()
    });
    writeln!(out, "{}", ready).context(WritingOutputSnafu { path: "stdout" })?;
    out.flush().context(WritingOutputSnafu { path: "stdout" })?;

    let stdin = std::io::stdin();
    for line_r in stdin.lock().lines() {
        let line = line_r.context(ReadingInputSnafu { path: "stdin" })?;
        if line.trim().is_empty() {
            continue;
        }
        session.refresh()?;
        let answer = answer_line(&session.dashboard, base, &line);
        writeln!(out, "{}", answer).context(WritingOutputSnafu { path: "stdout" })?;
        out.flush().context(WritingOutputSnafu { path: "stdout" })?;
    }
    info!("End of input, leaving the interactive mode");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn test_dir() -> String {
        option_env!("TWEETMAP_TEST_DIR")
            .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests"))
            .to_string()
    }

    fn run_dashboard_test(
        test_name: &str,
        config_lpath: &str,
        summary_lpath: &str,
    ) -> DashResult<()> {
        let test_dir = test_dir();
        info!("Running test {}", test_name);
        let config_p = format!("{}/{}/{}", test_dir, test_name, config_lpath);
        let summary_p = format!("{}/{}/{}", test_dir, test_name, summary_lpath);
        let args = test_args(&["--config", &config_p, "--reference", &summary_p]);
        run_dashboard(&args)
    }

    fn test_wrapper(test_name: &str) {
        let res = run_dashboard_test(
            test_name,
            format!("{}_config.json", test_name).as_str(),
            format!("{}_expected_summary.json", test_name).as_str(),
        );
        if let Err(e) = &res {
            eprintln!("An error occured {}", e);
        }
        assert!(res.is_ok(), "test {} failed: {:?}", test_name, res);
    }

    fn test_args(extra: &[&str]) -> Args {
        let mut argv: Vec<&str> = vec!["tweetmap"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    fn small_dashboard() -> Dashboard {
        let input = InputSettings {
            path: format!("{}/small_election/small_election.csv", test_dir()),
            provider: InputProvider::Csv,
            excel_worksheet_name: None,
            sentiment_column: DEFAULT_SENTIMENT_COLUMN.to_string(),
        };
        load_dashboard(&input, &CandidatePair::default(), DEFAULT_COUNTRY).unwrap()
    }

    #[test]
    fn small_election() {
        test_wrapper("small_election");
    }

    #[test]
    fn small_election_no_data() {
        test_wrapper("small_election_no_data");
    }

    #[test]
    fn provider_from_extension() {
        assert_eq!(
            parse_provider(None, "data/tweets.XLSX").unwrap(),
            InputProvider::Excel
        );
        assert_eq!(
            parse_provider(None, "data/tweets.csv").unwrap(),
            InputProvider::Csv
        );
        assert_eq!(
            parse_provider(Some("csv"), "tweets.xlsx").unwrap(),
            InputProvider::Csv
        );
        assert!(parse_provider(Some("parquet"), "tweets.parquet").is_err());
    }

    #[test]
    fn command_line_overrides_config() {
        let config_p = format!("{}/small_election/small_election_config.json", test_dir());
        let args = test_args(&[
            "--config",
            &config_p,
            "--states",
            "TX",
            "--sentiment",
            "negative",
            "--first-candidate",
            "Donald Trump",
            "--second-candidate",
            "Joe Biden",
        ]);
        let (config, input) = resolve_config(&args).unwrap();
        assert!(input.path.ends_with("small_election.csv"), "{}", input.path);
        assert_eq!(input.provider, InputProvider::Csv);
        assert_eq!(config.filters.states, Some(vec!["TX".to_string()]));
        assert_eq!(config.filters.sentiment, Some("negative".to_string()));
        assert_eq!(
            config.candidates,
            Some(CandidatePair {
                first: "Donald Trump".to_string(),
                second: "Joe Biden".to_string(),
            })
        );
    }

    #[test]
    fn missing_input_is_an_error() {
        let args = test_args(&["--sentiment", "positive"]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn selection_overlays_defaults() {
        let dashboard = small_dashboard();
        let settings = FilterSettings {
            states: Some(vec!["OH".to_string()]),
            start_date: Some("2020-10-15".to_string()),
            ..Default::default()
        };
        let spec = build_selection(&dashboard, &settings).unwrap();
        assert_eq!(spec.states.len(), 1);
        assert_eq!(spec.candidates.len(), 2);
        assert_eq!(spec.sentiment, "positive");

        let bad = FilterSettings {
            end_date: Some("15/10/2020".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_selection(&dashboard, &bad),
            Err(DashError::ParsingDate { .. })
        ));
    }

    #[test]
    fn interactive_answers() {
        let dashboard = small_dashboard();
        let base = FilterSettings::default();

        let answer = answer_line(&dashboard, &base, r#"{"states": ["TX"]}"#);
        assert_eq!(answer["result"]["status"], "ok");
        assert_eq!(answer["result"]["rows"], 2);
        assert_eq!(answer["result"]["stateDays"][0]["stateCode"], "TX");

        let answer = answer_line(&dashboard, &base, r#"{"sentiment": "angry"}"#);
        assert_eq!(answer["result"]["status"], "noData");

        let answer = answer_line(&dashboard, &base, "not json");
        assert_eq!(answer["status"], "error");

        let answer = answer_line(&dashboard, &base, r#"{"startDate": "yesterday"}"#);
        assert_eq!(answer["status"], "error");
    }

    #[test]
    fn session_keeps_dashboard_when_unchanged() {
        let input = InputSettings {
            path: format!("{}/small_election/small_election.csv", test_dir()),
            provider: InputProvider::Csv,
            excel_worksheet_name: None,
            sentiment_column: DEFAULT_SENTIMENT_COLUMN.to_string(),
        };
        let mut session =
            DashboardSession::open(&input, &CandidatePair::default(), DEFAULT_COUNTRY).unwrap();
        let before = session.modified;
        session.refresh().unwrap();
        assert_eq!(session.modified, before);
        assert_eq!(session.dashboard.records().len(), 6);
    }

    #[test]
    fn session_reloads_changed_input() {
        let source = format!("{}/small_election/small_election.csv", test_dir());
        let contents = fs::read_to_string(&source).unwrap();
        let path = std::env::temp_dir().join(format!("tweetmap_reload_{}.csv", std::process::id()));
        fs::write(&path, &contents).unwrap();
        let input = InputSettings {
            path: path.to_string_lossy().to_string(),
            provider: InputProvider::Csv,
            excel_worksheet_name: None,
            sentiment_column: DEFAULT_SENTIMENT_COLUMN.to_string(),
        };
        let mut session =
            DashboardSession::open(&input, &CandidatePair::default(), DEFAULT_COUNTRY).unwrap();
        let before = session.modified;
        assert!(before.is_some());
        assert_eq!(session.dashboard.records().len(), 6);

        // Keep the header and the first two tweets, with a later modification time.
        let shorter: Vec<&str> = contents.lines().take(3).collect();
        fs::write(&path, shorter.join("\n")).unwrap();
        let later = before.unwrap() + std::time::Duration::from_secs(10);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        session.refresh().unwrap();
        assert_eq!(session.modified, Some(later));
        assert_eq!(session.dashboard.records().len(), 2);
        assert_eq!(session.dashboard.preferred_candidates().len(), 1);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn serialization_errors() {
        let bad: std::collections::BTreeMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        let err = serde_json::to_string_pretty(&bad)
            .context(SerializingJsonSnafu {})
            .unwrap_err();
        assert!(matches!(err, DashError::SerializingJson { .. }));
        assert_eq!(err.to_string(), "Error serializing JSON");
    }
}
