use clap::Parser;

/// This program builds the data behind an election sentiment dashboard from a table of tweets.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON configuration of the dashboard.
    /// For more information about the file format, read the documentation of the manual.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the expected output in JSON format. If provided, tweetmap will
    /// check that the computed output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the dashboard data will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) The table of tweets. Setting this option overrides the path that may be specified with
    /// the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx, default inferred from the file extension) The type of the input.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (default sentiment_vader) The name of the column holding the sentiment label.
    #[clap(long, value_parser)]
    pub sentiment_column: Option<String>,

    /// (default 'Joe Biden') The first candidate. It is preferred in a state only if strictly ahead.
    #[clap(long, value_parser)]
    pub first_candidate: Option<String>,

    /// (default 'Donald Trump') The second candidate.
    #[clap(long, value_parser)]
    pub second_candidate: Option<String>,

    /// (default USA) The country reported in the overview.
    #[clap(long, value_parser)]
    pub country: Option<String>,

    // Filters
    /// (repeatable, default: all) The candidates to keep.
    #[clap(long, value_parser)]
    pub candidates: Option<Vec<String>>,

    /// (default: the first label in the data) The sentiment label to keep.
    #[clap(long, value_parser)]
    pub sentiment: Option<String>,

    /// (repeatable, default: all) The state codes to keep.
    #[clap(long, value_parser)]
    pub states: Option<Vec<String>>,

    /// (YYYY-MM-DD, default: first day of the data) The first day to keep.
    #[clap(long, value_parser)]
    pub start_date: Option<String>,

    /// (YYYY-MM-DD, default: last day of the data) The last day to keep.
    #[clap(long, value_parser)]
    pub end_date: Option<String>,

    // Other arguments
    /// If passed as an argument, reads one JSON selection per line on the standard input
    /// and answers each of them on one line of the standard output.
    #[clap(long, takes_value = false)]
    pub interactive: bool,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
