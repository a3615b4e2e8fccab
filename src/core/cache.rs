use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{core::analysis::Analysis, prelude::*};

type Digest = [u8; 16];

/// Analyses keyed by the digest of the input snapshot they were computed from.
///
/// Entries only live for one calendar day.
#[derive(Default)]
pub struct AnalysisCache {
    day: Option<NaiveDate>,
    entries: HashMap<Digest, Arc<Analysis>>,
}

impl AnalysisCache {
    /// Return the cached analysis for the snapshot, or run and remember a fresh one.
    pub fn get_or_try_insert_with<K: Serialize>(
        &mut self,
        today: NaiveDate,
        snapshot: &K,
        analyze: impl FnOnce() -> Result<Analysis>,
    ) -> Result<Arc<Analysis>> {
        if self.day != Some(today) {
            if !self.is_empty() {
                debug!(previous = ?self.day, %today, "the day has changed, dropping the cache");
            }
            self.invalidate();
            self.day = Some(today);
        }

        let digest = md5::compute(
            serde_json::to_vec(snapshot).context("failed to serialize the input snapshot")?,
        )
        .0;
        if let Some(analysis) = self.entries.get(&digest) {
            debug!("cache hit");
            return Ok(Arc::clone(analysis));
        }

        let analysis = Arc::new(analyze()?);
        self.entries.insert(digest, Arc::clone(&analysis));
        debug!(n_entries = self.len(), "cached a fresh analysis");
        Ok(analysis)
    }

    /// Drop everything, for example after the configuration is reloaded.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::quantity::energy::WattHours;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn analysis(energy: f64) -> Analysis {
        Analysis { energy_today: WattHours::from(energy), ..Analysis::default() }
    }

    #[test]
    fn test_hit() -> Result {
        let mut cache = AnalysisCache::default();
        let calls = Cell::new(0);
        let analyze = || {
            calls.set(calls.get() + 1);
            Ok(analysis(1.0))
        };
        let first = cache.get_or_try_insert_with(today(), &("config", 50.0), analyze)?;
        let second = cache.get_or_try_insert_with(today(), &("config", 50.0), analyze)?;
        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        Ok(())
    }

    #[test]
    fn test_different_snapshot() -> Result {
        let mut cache = AnalysisCache::default();
        cache.get_or_try_insert_with(today(), &50.0, || Ok(analysis(1.0)))?;
        let other = cache.get_or_try_insert_with(today(), &51.0, || Ok(analysis(2.0)))?;
        assert_eq!(other.energy_today, WattHours::from(2.0));
        assert_eq!(cache.len(), 2);
        Ok(())
    }

    #[test]
    fn test_day_change() -> Result {
        let mut cache = AnalysisCache::default();
        cache.get_or_try_insert_with(today(), &50.0, || Ok(analysis(1.0)))?;
        let tomorrow = today().succ_opt().unwrap();
        let analysis = cache.get_or_try_insert_with(tomorrow, &50.0, || Ok(analysis(2.0)))?;
        assert_eq!(analysis.energy_today, WattHours::from(2.0));
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn test_invalidate() -> Result {
        let mut cache = AnalysisCache::default();
        cache.get_or_try_insert_with(today(), &50.0, || Ok(analysis(1.0)))?;
        cache.invalidate();
        assert!(cache.is_empty());
        Ok(())
    }

    #[test]
    fn test_error_is_not_cached() -> Result {
        let mut cache = AnalysisCache::default();
        assert!(cache.get_or_try_insert_with(today(), &50.0, || bail!("no data")).is_err());
        assert!(cache.is_empty());
        Ok(())
    }
}
