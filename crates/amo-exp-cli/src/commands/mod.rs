pub mod assign;
pub mod simulate;
pub mod validate;

use std::error::Error;
use std::fs;
use std::path::Path;

use amo_exp_core::serde::to_canonical_json_string;
use amo_exp_core::ExperimentDefinition;
use log::debug;
use serde::Serialize;

pub(crate) fn load_definition(path: &Path) -> Result<ExperimentDefinition, Box<dyn Error>> {
    let input = fs::read_to_string(path)?;
    let definition = ExperimentDefinition::from_toml_str(&input)?;
    debug!(
        "event=definition_load module=cli experiment={} variants={}",
        definition.id(),
        definition.variants().len()
    );
    Ok(definition)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", to_canonical_json_string(value)?);
    Ok(())
}
