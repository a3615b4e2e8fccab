use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{prelude::*, quantity::percent::Percent};

/// Battery state at the end of the last completed day.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub date: NaiveDate,
    pub state_of_charge: Percent,
}

/// Where the end-of-day battery state is kept between runs.
pub trait CheckpointStore {
    /// Last saved checkpoint, or `None` when there is no usable prior state.
    fn load(&self) -> Option<Checkpoint>;

    fn save(&self, checkpoint: &Checkpoint) -> Result;
}

/// Checkpoint kept under the `battery` table of a TOML data file.
///
/// Other tables in the file are preserved.
pub struct TomlCheckpointStore {
    path: PathBuf,
}

impl TomlCheckpointStore {
    const TABLE: &'static str = "battery";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<toml::Table> {
        if self.path.is_file() {
            let contents = fs::read_to_string(&self.path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            Ok(toml::Table::new())
        }
    }

    fn load_fallibly(&self) -> Result<Option<Checkpoint>> {
        self.read_document()?
            .remove(Self::TABLE)
            .map(|value| value.try_into::<Checkpoint>())
            .transpose()
            .map_err(Error::from)
    }

    fn save_fallibly(&self, checkpoint: &Checkpoint) -> Result {
        let mut document = self.read_document().unwrap_or_else(|error| {
            warn!("overwriting the unreadable data file: {error:#}");
            toml::Table::new()
        });
        document.insert(Self::TABLE.to_string(), toml::Value::try_from(checkpoint)?);

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, toml::to_string(&document)?)
            .with_context(|| format!("failed to write `{}`", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("failed to replace `{}`", self.path.display()))?;
        Ok(())
    }
}

impl CheckpointStore for TomlCheckpointStore {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn load(&self) -> Option<Checkpoint> {
        match self.load_fallibly() {
            Ok(Some(checkpoint)) => {
                debug!(?checkpoint, "loaded the checkpoint");
                Some(checkpoint)
            }
            Ok(None) => {
                warn!("no checkpoint stored yet");
                None
            }
            Err(error) => {
                warn!("failed to load the checkpoint: {error:#}");
                None
            }
        }
    }

    #[instrument(skip_all, fields(path = %self.path.display(), date = %checkpoint.date))]
    fn save(&self, checkpoint: &Checkpoint) -> Result {
        self.save_fallibly(checkpoint)?;
        debug!(state_of_charge = %checkpoint.state_of_charge, "saved the checkpoint");
        Ok(())
    }
}
