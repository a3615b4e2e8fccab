pub mod aligner;
pub mod analysis;
pub mod battery;
pub mod cache;
pub mod correction;
pub mod cost;
pub mod forecast;
pub mod heating;
pub mod ledger;
pub mod preparation;
pub mod pv;
pub mod series;
pub mod slot;
pub mod solar;
pub mod steering;
