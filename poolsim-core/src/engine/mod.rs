//! The simulation engine: entry scanning, exit simulation, and
//! theoretical return calculation.

pub mod exit;
pub mod returns;
pub mod scanner;

pub use exit::ExitStateMachine;
pub use scanner::EntryScanner;
