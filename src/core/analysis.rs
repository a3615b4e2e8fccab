use bon::Builder;
use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    checkpoint::{Checkpoint, CheckpointStore},
    core::{
        battery::{BatteryParameters, Simulator, Step},
        correction::{DayOutcome, correct_day},
        cost::{CostEvaluator, DayCost, DayOption},
        ledger::{DailyLedger, LedgerEntry},
        series::{IntegrateSlots, Series},
        slot::Slot,
    },
    prelude::*,
    quantity::{
        energy::WattHours,
        percent::Percent,
        power::Watts,
        rate::KilowattHourRate,
        time::Hours,
    },
};

/// Everything the dashboard shows for one analysis run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Analysis {
    /// PV energy of the first day of the horizon.
    pub energy_today: WattHours,

    pub pv_power: Series<NaiveDateTime, Watts>,
    pub market_price: Series<NaiveDateTime, KilowattHourRate>,
    pub heating_power: Series<NaiveDateTime, Watts>,
    pub difference_power: Series<NaiveDateTime, Watts>,

    /// Corrected state of charge.
    pub state_of_charge: Series<NaiveDateTime, Percent>,

    /// Energy moved in or out of the battery by the forward pass.
    ///
    /// Like `difference_power`, this is the uncorrected flow: on a heater day the held state of
    /// charge stays flat while the battery still shows the energy it would have delivered.
    pub battery_energy: Series<NaiveDateTime, WattHours>,

    pub days: Vec<DaySummary>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub n_slots: usize,

    /// `None` for incomplete days, which are not evaluated.
    pub option: Option<DayOption>,

    pub cost: Option<DayCost>,
    pub pv_energy: WattHours,

    /// Highest state of charge after the correction.
    pub battery_peak: Percent,
}

/// Forward battery pass over the slots, followed by the per-day cost correction.
#[derive(Builder)]
#[builder(finish_fn(vis = ""))]
pub struct Analyzer<'a> {
    slots: &'a [Slot],
    battery: BatteryParameters,

    /// State of charge before the first slot.
    initial_state_of_charge: Percent,

    cost_evaluator: &'a CostEvaluator,

    /// Receives the raw end-of-day state of charge after each completed day.
    checkpoint_store: Option<&'a dyn CheckpointStore>,
}

impl<S: analyzer_builder::IsComplete> AnalyzerBuilder<'_, S> {
    pub fn run(self) -> Analysis {
        self.build().run()
    }
}

impl Analyzer<'_> {
    #[instrument(
        skip_all,
        fields(n_slots = self.slots.len(), initial_state_of_charge = %self.initial_state_of_charge)
    )]
    fn run(self) -> Analysis {
        let mut simulator = Simulator::new(self.battery, self.initial_state_of_charge);
        let mut previous: Option<DayOutcome> = None;
        let mut analysis = Analysis::default();

        for (date, day) in &self.slots.iter().chunk_by(|slot| slot.timestamp.date()) {
            let day: Vec<&Slot> = day.collect();
            let mut ledger = DailyLedger::new(date);
            let steps: Vec<Step> = day
                .iter()
                .map(|slot| {
                    let step = simulator.apply(slot.balance(), slot.pv.overload);
                    ledger.push(LedgerEntry {
                        difference_power: step.difference_power,
                        heating_power: slot.heating.power,
                        market_price: slot.market_price,
                        battery_power: step.battery_energy / Hours::QUARTER,
                    });
                    step
                })
                .collect();
            let raw: Vec<Percent> = steps.iter().map(|step| step.state_of_charge).collect();
            let pv_energy =
                day.iter().map(|slot| (slot.timestamp, slot.pv.power)).integrate_slots();

            let (state_of_charge, summary) = if ledger.is_complete() {
                let cost = self.cost_evaluator.evaluate(&ledger);
                let option = cost.option();
                let correction =
                    correct_day(&raw, self.battery.min_state_of_charge, option, previous);
                info!(
                    date = %ledger.date,
                    %option,
                    electric = %cost.electric,
                    fossil = %cost.fossil,
                    peak = %correction.outcome.peak,
                    "evaluated"
                );
                previous = Some(correction.outcome);
                self.save_checkpoint(date, simulator.state_of_charge());
                let summary = DaySummary {
                    date,
                    n_slots: ledger.len(),
                    option: Some(option),
                    cost: Some(cost),
                    pv_energy,
                    battery_peak: correction.outcome.peak,
                };
                (correction.state_of_charge, summary)
            } else {
                warn!(%date, n_slots = ledger.len(), "incomplete day, not evaluated");
                previous = None;
                let summary = DaySummary {
                    date,
                    n_slots: ledger.len(),
                    option: None,
                    cost: None,
                    pv_energy,
                    battery_peak: raw
                        .iter()
                        .copied()
                        .reduce(Percent::max)
                        .unwrap_or(self.battery.min_state_of_charge),
                };
                (raw, summary)
            };

            for ((slot, step), state_of_charge) in day.iter().zip(&steps).zip(state_of_charge) {
                let timestamp = slot.timestamp;
                analysis.pv_power.push((timestamp, slot.pv.power));
                analysis.market_price.push((timestamp, slot.market_price));
                analysis.heating_power.push((timestamp, slot.heating.power));
                analysis.difference_power.push((timestamp, step.difference_power));
                analysis.state_of_charge.push((timestamp, state_of_charge));
                analysis.battery_energy.push((timestamp, step.battery_energy));
            }
            analysis.days.push(summary);
        }

        analysis.energy_today = analysis.days.first().map_or(WattHours::ZERO, |day| day.pv_energy);
        analysis
    }

    fn save_checkpoint(&self, date: NaiveDate, state_of_charge: Percent) {
        if let Some(store) = self.checkpoint_store
            && let Err(error) = store.save(&Checkpoint { date, state_of_charge })
        {
            error!(%date, "failed to save the checkpoint: {error:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use approx::assert_abs_diff_eq;
    use chrono::TimeDelta;

    use super::*;
    use crate::{
        core::{
            cost::{Fuel, Heater, Tariffs},
            heating::HeatingDemand,
            pv::PvOutput,
            slot::SLOTS_PER_DAY,
        },
        quantity::cost::Cost,
    };

    const MIN_STATE_OF_CHARGE: f64 = 20.0;

    fn battery() -> Result<BatteryParameters> {
        BatteryParameters::builder()
            .capacity(WattHours::from(5000.0))
            .max_depth_of_discharge(Percent::from(80.0))
            .max_charge_power(Watts::from(1000.0))
            .load_efficiency(0.9)
            .converter_efficiency(0.95)
            .build()
    }

    fn evaluator(gas_price: f64) -> CostEvaluator {
        CostEvaluator::builder()
            .tariffs(Tariffs { pv_cost_factor: 0.5, battery_cost_factor: 0.25 })
            .heater(Heater {
                fuel: Fuel::Gas,
                efficiency: Percent::from(90.0),
                price: Cost::from(gas_price),
            })
            .build()
    }

    /// Identical slots for `n_days` full days starting on the 15th of January.
    fn slots(n_days: usize, pv: f64, heating: f64) -> Vec<Slot> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
        (0..n_days * SLOTS_PER_DAY)
            .map(|index| Slot {
                timestamp: start + TimeDelta::minutes(15 * index as i64),
                outdoor_temperature: 0.0,
                pv: PvOutput { power: Watts::from(pv), overload: Watts::ZERO },
                load: Watts::ZERO,
                heating: HeatingDemand { power: Watts::from(heating), cop: 3.0 },
                market_price: KilowattHourRate::from(30.0),
            })
            .collect()
    }

    fn analyze(slots: &[Slot], gas_price: f64) -> Result<Analysis> {
        Ok(Analyzer::builder()
            .slots(slots)
            .battery(battery()?)
            .initial_state_of_charge(Percent::from(50.0))
            .cost_evaluator(&evaluator(gas_price))
            .run())
    }

    fn values<V: Copy>(series: &Series<NaiveDateTime, V>) -> Vec<V> {
        series.iter().map(|(_, value)| *value).collect()
    }

    #[derive(Default)]
    struct MemoryStore(RefCell<Vec<Checkpoint>>);

    impl CheckpointStore for MemoryStore {
        fn load(&self) -> Option<Checkpoint> {
            self.0.borrow().last().copied()
        }

        fn save(&self, checkpoint: &Checkpoint) -> Result {
            self.0.borrow_mut().push(*checkpoint);
            Ok(())
        }
    }

    /// Surplus without heating demand: the battery fills up and the day stays on PV and battery.
    #[test]
    fn surplus_fills_the_battery() -> Result {
        let analysis = analyze(&slots(1, 2000.0, 0.0), 2.0)?;
        let state_of_charge = values(&analysis.state_of_charge);
        assert_eq!(state_of_charge.len(), SLOTS_PER_DAY);
        assert_abs_diff_eq!(state_of_charge[0].0, 54.5, epsilon = 1e-9);
        assert!(state_of_charge[12..].iter().all(|soc| *soc == Percent::FULL));
        assert_eq!(analysis.days[0].option, Some(DayOption::Battery));
        assert_abs_diff_eq!(analysis.energy_today.0, 2000.0 * 24.0, epsilon = 1e-6);
        Ok(())
    }

    /// Heating with cheap gas: the battery keeps its morning charge all day.
    #[test]
    fn cheap_fuel_holds_the_peak() -> Result {
        let analysis = analyze(&slots(1, 0.0, 3000.0), 2.0)?;
        let day = analysis.days[0];
        assert_eq!(day.option, Some(DayOption::Heater));
        let cost = day.cost.unwrap();
        assert!(cost.fossil < cost.electric, "{cost:?}");

        let peak = 50.0 - 250.0 / 0.95 / 5000.0 * 100.0;
        assert_abs_diff_eq!(day.battery_peak.0, peak, epsilon = 1e-9);
        for soc in values(&analysis.state_of_charge) {
            assert_abs_diff_eq!(soc.0, peak, epsilon = 1e-9);
        }
        Ok(())
    }

    /// The held trajectory does not rewrite the battery flow of the forward pass.
    #[test]
    fn heater_day_keeps_the_forward_flow() -> Result {
        let analysis = analyze(&slots(1, 0.0, 3000.0), 2.0)?;
        let state_of_charge = values(&analysis.state_of_charge);
        assert_eq!(state_of_charge[0], state_of_charge[1]);
        let battery_energy = values(&analysis.battery_energy);
        assert_abs_diff_eq!(battery_energy[1].0, 250.0 / 0.95, epsilon = 1e-6);
        assert_eq!(battery_energy[10], WattHours::ZERO);
        Ok(())
    }

    /// Expensive fuel leaves the raw trajectory: monotonically down to the floor, then pinned.
    #[test]
    fn deficit_drains_to_the_floor() -> Result {
        let analysis = analyze(&slots(1, 0.0, 3000.0), 100.0)?;
        assert_eq!(analysis.days[0].option, Some(DayOption::Battery));
        let state_of_charge = values(&analysis.state_of_charge);
        assert!(state_of_charge.iter().tuple_windows().all(|(before, after)| after <= before));
        let floor_index = state_of_charge
            .iter()
            .position(|soc| *soc == Percent::from(MIN_STATE_OF_CHARGE))
            .unwrap();
        assert_eq!(floor_index, 5);
        assert!(state_of_charge[floor_index..].iter().all(|soc| *soc == Percent::from(MIN_STATE_OF_CHARGE)));

        // While the battery covers the deficit, nothing goes to the grid:
        let difference_power = values(&analysis.difference_power);
        assert!(difference_power[..=floor_index].iter().all(|power| *power == Watts::ZERO));
        assert!(difference_power[floor_index + 1..].iter().all(|power| *power == Watts::from(-1000.0)));
        Ok(())
    }

    /// Two heater days in a row: the second day carries the first day's peak.
    #[test]
    fn chained_heater_days() -> Result {
        let analysis = analyze(&slots(2, 0.0, 3000.0), 2.0)?;
        assert_eq!(analysis.days.len(), 2);
        assert!(analysis.days.iter().all(|day| day.option == Some(DayOption::Heater)));
        let first_peak = analysis.days[0].battery_peak;
        for (_, soc) in &analysis.state_of_charge[SLOTS_PER_DAY..] {
            assert_abs_diff_eq!(soc.0, first_peak.0, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(analysis.days[1].battery_peak.0, first_peak.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn correction_does_not_look_ahead() -> Result {
        let one_day = analyze(&slots(1, 0.0, 3000.0), 2.0)?;
        let two_days = analyze(&slots(2, 0.0, 3000.0), 2.0)?;
        assert_eq!(one_day.state_of_charge[..], two_days.state_of_charge[..SLOTS_PER_DAY]);
        assert_eq!(one_day.days[0], two_days.days[0]);
        Ok(())
    }

    #[test]
    fn deterministic() -> Result {
        let slots = slots(2, 1500.0, 3000.0);
        assert_eq!(analyze(&slots, 8.0)?, analyze(&slots, 8.0)?);
        Ok(())
    }

    #[test]
    fn state_of_charge_stays_in_bounds() -> Result {
        let mut slots = slots(2, 0.0, 0.0);
        for (index, slot) in slots.iter_mut().enumerate() {
            // Alternate between long surplus and long deficit stretches:
            let sign: f64 = if (index / 20) % 2 == 0 { 1.0 } else { -1.0 };
            slot.pv = PvOutput { power: Watts::from(sign.max(0.0) * 6000.0), overload: Watts::from(500.0) };
            slot.load = Watts::from(sign.min(0.0) * -4000.0);
        }
        let analysis = analyze(&slots, 8.0)?;
        for (_, soc) in &analysis.state_of_charge {
            assert!(*soc >= Percent::from(MIN_STATE_OF_CHARGE) && *soc <= Percent::FULL, "{soc}");
        }
        Ok(())
    }

    #[test]
    fn incomplete_day_is_not_evaluated() -> Result {
        let slots = slots(2, 0.0, 3000.0);
        let analysis = analyze(&slots[..SLOTS_PER_DAY + 40], 2.0)?;
        assert_eq!(analysis.days[1].n_slots, 40);
        assert_eq!(analysis.days[1].option, None);
        assert_eq!(analysis.state_of_charge.len(), SLOTS_PER_DAY + 40);
        Ok(())
    }

    #[test]
    fn checkpoint_after_each_complete_day() -> Result {
        let slots = slots(3, 0.0, 3000.0);
        let store = MemoryStore::default();
        let _ = Analyzer::builder()
            .slots(&slots[..2 * SLOTS_PER_DAY + 10])
            .battery(battery()?)
            .initial_state_of_charge(Percent::from(50.0))
            .cost_evaluator(&evaluator(2.0))
            .checkpoint_store(&store)
            .run();
        let checkpoints = store.0.into_inner();
        assert_eq!(checkpoints.len(), 2);
        assert_eq!(checkpoints[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(checkpoints[1].date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
        // The raw state: the heater correction is not persisted.
        assert_eq!(checkpoints[1].state_of_charge, Percent::from(MIN_STATE_OF_CHARGE));
        Ok(())
    }
}
