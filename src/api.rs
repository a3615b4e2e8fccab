pub mod load_profile;
pub mod market;
pub mod weather;
