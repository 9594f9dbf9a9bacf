use log::{debug, warn};

use clap::Parser;
use snafu::ErrorCompat;

mod args;
mod pipeline;

use crate::args::Args;

fn main() {
    let args = Args::parse();
    let default_filter = if args.verbose {
        "debug"
    } else {
        "elexprep=info,district_features=info,warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    debug!("main: args: {:?}", args);

    if let Err(e) = pipeline::run_pipeline(&args) {
        warn!("main: the pipeline stopped");
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("{}", bt);
        }
        std::process::exit(1);
    }
}
