use chrono::NaiveDate;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::izip;

use crate::core::{
    analysis::{Analysis, DaySummary},
    cost::DayOption,
    series::SliceDay,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

pub fn build_days_table(days: &[DaySummary]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Slots", "Option", "PV", "Peak", "Heater", "Electric"]);
    for day in days {
        let (heater_cost, electric_cost) = match day.cost {
            Some(cost) => {
                let heater_cheaper = cost.fossil < cost.electric;
                (
                    Cell::new(cost.fossil.round_to_hundredths())
                        .fg(if heater_cheaper { Color::Green } else { Color::Reset }),
                    Cell::new(cost.electric.round_to_hundredths())
                        .fg(if heater_cheaper { Color::Reset } else { Color::Green }),
                )
            }
            None => (Cell::new("-"), Cell::new("-")),
        };
        table.add_row(vec![
            Cell::new(day.date.format("%b %d")),
            Cell::new(day.n_slots)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            day.option.map_or_else(
                || Cell::new("incomplete").add_attribute(Attribute::Dim),
                |option| {
                    Cell::new(option).fg(match option {
                        DayOption::Heater => Color::DarkYellow,
                        DayOption::Battery => Color::Green,
                    })
                },
            ),
            Cell::new(day.pv_energy).set_alignment(CellAlignment::Right),
            Cell::new(day.battery_peak).set_alignment(CellAlignment::Right),
            heater_cost.set_alignment(CellAlignment::Right),
            electric_cost.set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Slot-by-slot view of a single day.
pub fn build_slots_table(analysis: &Analysis, date: NaiveDate) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Time", "PV", "Price", "Heating", "Difference", "Battery", "SOC"]);
    let rows = izip!(
        analysis.pv_power.on_day(date),
        analysis.market_price.on_day(date),
        analysis.heating_power.on_day(date),
        analysis.difference_power.on_day(date),
        analysis.battery_energy.on_day(date),
        analysis.state_of_charge.on_day(date),
    );
    for (
        (timestamp, pv_power),
        (_, market_price),
        (_, heating_power),
        (_, difference_power),
        (_, battery_energy),
        (_, state_of_charge),
    ) in rows
    {
        table.add_row(vec![
            Cell::new(timestamp.format("%H:%M")),
            Cell::new(pv_power).set_alignment(CellAlignment::Right),
            Cell::new(market_price)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(heating_power).set_alignment(CellAlignment::Right),
            Cell::new(difference_power).set_alignment(CellAlignment::Right).fg(
                if difference_power.0 < 0.0 { Color::Red } else { Color::Reset },
            ),
            Cell::new(battery_energy).set_alignment(CellAlignment::Right),
            Cell::new(state_of_charge).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
