//! Command implementations for the Aerocast CLI.

pub mod domains;
pub mod run;
