use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

use amo_exp_core::RngHandle;
use clap::Args;
use log::info;
use serde::Serialize;

use super::{load_definition, print_json};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// TOML experiment definition.
    #[arg(long)]
    pub definition: PathBuf,
    /// Number of simulated first visits.
    #[arg(long, default_value_t = 10_000)]
    pub trials: u64,
    /// Master seed; the experiment id selects the substream.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

#[derive(Debug, Serialize)]
struct VariantTally {
    id: String,
    weight: f64,
    count: u64,
    share: f64,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    experiment_id: String,
    seed: u64,
    trials: u64,
    variants: Vec<VariantTally>,
}

pub fn run(args: &SimulateArgs) -> Result<(), Box<dyn Error>> {
    if args.trials == 0 {
        return Err("--trials must be positive".into());
    }
    let definition = load_definition(&args.definition)?;
    let mut rng = RngHandle::for_experiment(args.seed, definition.id().as_str());
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for _ in 0..args.trials {
        *counts.entry(definition.variants().sample(&mut rng)).or_default() += 1;
    }
    let variants = definition
        .variants()
        .variants()
        .iter()
        .map(|variant| {
            let count = counts.get(variant.id.as_str()).copied().unwrap_or(0);
            VariantTally {
                id: variant.id.clone(),
                weight: variant.weight,
                count,
                share: count as f64 / args.trials as f64,
            }
        })
        .collect();
    info!(
        "event=simulate module=cli experiment={} trials={} seed={}",
        definition.id(),
        args.trials,
        args.seed
    );
    print_json(&SimulationReport {
        experiment_id: definition.id().to_string(),
        seed: args.seed,
        trials: args.trials,
        variants,
    })
}
