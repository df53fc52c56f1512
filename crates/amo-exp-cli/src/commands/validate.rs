use std::error::Error;
use std::path::PathBuf;

use clap::Args;

use super::{load_definition, print_json};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// TOML experiment definition.
    #[arg(long)]
    pub definition: PathBuf,
}

pub fn run(args: &ValidateArgs) -> Result<(), Box<dyn Error>> {
    let definition = load_definition(&args.definition)?;
    print_json(&definition)
}
