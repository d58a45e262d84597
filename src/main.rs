use clap::Parser;
use log::error;
use nurse_scheduling::runner::run;
use nurse_scheduling::runner::Cli;

fn main() {
    match run(Cli::parse()) {
        Ok(()) => {}
        Err(e) => {
            error!("Execution failed, error: {e:#}");
            std::process::exit(1);
        }
    }
}
