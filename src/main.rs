use clap::Parser;
use log::LevelFilter;
use snafu::ErrorCompat;

mod args;
mod survey;

fn main() {
    let args = args::Args::parse();
    if args.verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    if let Err(e) = survey::run_dashboard(&args) {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("{}", bt);
        }
        std::process::exit(1);
    }
}
