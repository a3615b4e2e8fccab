use serde::{Deserialize, Serialize};

use crate::{core::cost::DayOption, quantity::percent::Percent};

/// What the next day's correction needs to know about the previous day.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayOutcome {
    pub option: DayOption,

    /// Highest corrected state of charge of the day.
    pub peak: Percent,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Correction {
    pub state_of_charge: Vec<Percent>,
    pub outcome: DayOutcome,
}

/// Rewrite a day's state-of-charge trajectory for the chosen option.
///
/// When the heater is cheaper, the battery is not drained for heating: from the day's peak
/// on the charge is held at the peak. If the heater ran the previous day as well, the charge
/// kept overnight is carried in first: slots before the battery would have hit the floor are
/// set to the previous peak, the rest are lifted by the previous peak's headroom above the
/// floor.
///
/// Only `raw` and `previous` are read.
pub fn correct_day(
    raw: &[Percent],
    min_state_of_charge: Percent,
    option: DayOption,
    previous: Option<DayOutcome>,
) -> Correction {
    let mut state_of_charge = raw.to_vec();

    if option == DayOption::Heater {
        if let Some(previous) = previous.filter(|previous| previous.option == DayOption::Heater) {
            let floor_index = raw
                .iter()
                .position(|soc| *soc <= min_state_of_charge)
                .unwrap_or(raw.len());
            let boost = previous.peak - min_state_of_charge;
            let (before_floor, after_floor) = state_of_charge.split_at_mut(floor_index);
            before_floor.fill(previous.peak);
            for soc in after_floor {
                *soc = (*soc + boost).min(Percent::FULL);
            }
        }
        if let Some(peak_index) = index_of_peak(&state_of_charge) {
            let peak = state_of_charge[peak_index];
            state_of_charge[peak_index..].fill(peak);
        }
    }

    let peak =
        state_of_charge.iter().copied().reduce(Percent::max).unwrap_or(min_state_of_charge);
    Correction { state_of_charge, outcome: DayOutcome { option, peak } }
}

/// Index of the first occurrence of the maximum.
fn index_of_peak(trajectory: &[Percent]) -> Option<usize> {
    trajectory
        .iter()
        .enumerate()
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
        .map(|(index, _)| index)
}
