use clap::Parser;
use volsqueeze::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
