use clap::Parser;
use log::info;
use snafu::ErrorCompat;

mod args;
mod convert;

fn main() {
    let parsed_args = args::Args::parse();
    if parsed_args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    info!("args: {:?}", parsed_args);

    if let Err(e) = convert::run_conversion(&parsed_args) {
        eprintln!("An error occurred: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
