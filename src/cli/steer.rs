use std::{thread::sleep, time::Duration};

use chrono::Local;

use crate::{
    checkpoint::TomlCheckpointStore,
    cli::{SteerArgs, inputs::initial_state_of_charge},
    config::Config,
    core::{cache::AnalysisCache, steering::decide},
    prelude::*,
};

pub fn steer(config: &Config, args: &SteerArgs) -> Result {
    let mut cache = AnalysisCache::default();
    let Some(repeat_seconds) = args.repeat_seconds else {
        return steer_once(config, args, &mut cache);
    };
    loop {
        if let Err(error) = steer_once(config, args, &mut cache) {
            error!("failed to decide: {error:#}");
        }
        sleep(Duration::from_secs(repeat_seconds));
    }
}

/// Re-read the inputs and decide for the current hour, reusing the analysis if nothing changed.
#[instrument(skip_all)]
fn steer_once(config: &Config, args: &SteerArgs, cache: &mut AnalysisCache) -> Result {
    let now = Local::now().naive_local();
    let store = TomlCheckpointStore::new(&args.checkpoint.data_file);
    let snapshot = args.inputs.read(config, initial_state_of_charge(config, &store))?;
    let analysis = cache.get_or_try_insert_with(now.date(), &snapshot, || snapshot.analyze(None))?;
    match decide(&analysis, now) {
        Some(decision) => println!("{decision}"),
        None => warn!(%now, "the analysis does not cover the current hour"),
    }
    Ok(())
}
