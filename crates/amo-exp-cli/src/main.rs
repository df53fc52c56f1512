use std::error::Error;

use clap::{Parser, Subcommand};
use flexi_logger::Logger;

use commands::{
    assign::{self, AssignArgs},
    simulate::{self, SimulateArgs},
    validate::{self, ValidateArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "amo-exp", about = "AMO experiment assignment tools")]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check an experiment definition and print it in canonical form.
    Validate(ValidateArgs),
    /// Run one gate evaluation against a cookie value and toggles.
    Assign(AssignArgs),
    /// Sample a definition repeatedly and report per-variant counts.
    Simulate(SimulateArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _logger = Logger::try_with_env_or_str(&cli.log_level)?
        .log_to_stderr()
        .start()?;
    match cli.command {
        Command::Validate(args) => validate::run(&args),
        Command::Assign(args) => assign::run(&args),
        Command::Simulate(args) => simulate::run(&args),
    }
}
