use clap::Parser;

/// This is a tabulation program for weighted opinion polls.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file describing the dashboard: data source, filters and views, in JSON format.
    /// For more information about the file format, read the documentation of the survey_weights::manual module.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference report in JSON format. If provided, surveytab will check that the
    /// computed report matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the report will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified in the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the respondents will be read from this file instead of the
    /// file given in the configuration.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx) The type of the input. Overrides the provider of the configuration.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// The name of the column holding the sample weights. Overrides the configuration.
    #[clap(long, value_parser)]
    pub weight_column: Option<String>,

    /// (attribute=value1,value2) Restricts the respondents to the given values of an attribute.
    /// May be repeated. Replaces the filters of the configuration.
    #[clap(long, value_parser)]
    pub filter: Vec<String>,

    /// Ignores all the filters of the configuration.
    #[clap(long, takes_value = false)]
    pub clear_filters: bool,

    /// (view id) Only computes the given view.
    #[clap(long, value_parser)]
    pub view: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on debug logging.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
