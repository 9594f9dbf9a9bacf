use clap::Parser;

/// Downloads the election data sources and builds the per-district feature tables.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the data directory and the source addresses.
    /// See the manual for the list of keys.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, default data/) Where all the downloaded and generated files are stored.
    /// The directory must exist.
    #[clap(short, long, value_parser)]
    pub data_dir: Option<String>,

    /// If passed as an argument, downloads again the files that are already present.
    #[clap(long, takes_value = false)]
    pub force_refresh: bool,

    /// (fetch, parse, join or all; default all) Only runs the given stage.
    #[clap(short, long, value_parser)]
    pub stage: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
