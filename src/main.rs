use clap::Parser;
use rsitrader::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
