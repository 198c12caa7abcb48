//! Kernel control logic for a didactic single-processor operating system
//! simulator: process admission, priority scheduling, context switching and
//! interrupt-driven state transitions on a simulated processor with a
//! base/limit MMU.

pub mod config;
pub mod error;
pub mod io;
pub mod kernel;

pub use config::SimulatorConfig;
pub use error::{KernelError, KernelResult};
pub use kernel::{Driver, Kernel, Pid};
