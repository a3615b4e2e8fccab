use crate::{
    checkpoint::{CheckpointStore, TomlCheckpointStore},
    cli::{AnalyzeArgs, CheckpointArgs, inputs::initial_state_of_charge},
    config::Config,
    prelude::*,
    tables::{build_days_table, build_slots_table},
};

#[instrument(skip_all)]
pub fn analyze(config: &Config, args: &AnalyzeArgs) -> Result {
    let store = TomlCheckpointStore::new(&args.checkpoint.data_file);
    let snapshot = args.inputs.read(config, initial_state_of_charge(config, &store))?;
    let checkpoint_store: Option<&dyn CheckpointStore> =
        if args.scout { None } else { Some(&store) };
    let analysis = snapshot.analyze(checkpoint_store)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }
    info!(energy_today = %analysis.energy_today, n_days = analysis.days.len(), "analyzed");
    println!("{}", build_days_table(&analysis.days));
    if let Some(date) = args.slots {
        ensure!(analysis.days.iter().any(|day| day.date == date), "{date} is not in the forecast");
        println!("{}", build_slots_table(&analysis, date));
    }
    Ok(())
}

pub fn show_checkpoint(args: &CheckpointArgs) {
    let store = TomlCheckpointStore::new(&args.data_file);
    match store.load() {
        Some(checkpoint) => println!("{}: {}", checkpoint.date, checkpoint.state_of_charge),
        None => println!("no checkpoint in `{}`", store.path().display()),
    }
}
