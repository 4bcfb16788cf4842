//! Terminal interface: arguments, screens and the breathing ritual

pub mod breath;
pub mod cli;
#[cfg(test)]
mod tests;

pub use breath::{guide_breathing, BreathPhase};
pub use cli::{Args, Cli, Command};
