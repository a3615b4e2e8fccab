mod parameters;
mod simulator;

pub use self::{
    parameters::BatteryParameters,
    simulator::{Simulator, Step},
};
