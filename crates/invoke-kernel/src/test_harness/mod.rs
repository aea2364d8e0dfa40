//! Test harness
//!
//! Provider doubles shared by unit and integration tests, and the seeded
//! invoke simulator behind `invoke-kernel simulate`.

pub mod doubles;
pub mod simulator;

pub use doubles::RecordingProvider;
pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport, SimulatorStats, Violation};
