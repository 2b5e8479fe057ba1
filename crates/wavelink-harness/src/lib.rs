//! Deterministic simulation harness for Wavelink engine testing.
//!
//! Scripted, reproducible stand-ins for the engine's two external seams:
//!
//! - [`SimEnv`]: a manually advanced microsecond clock plus a seeded RNG,
//!   so message ids and retry timing are identical across runs;
//! - [`SimPhy`]: a recording PHY adapter with scripted failures (rejected
//!   sends, failed peer registrations) in either addressing mode.
//!
//! [`EventLog`] captures everything the engine dispatches to subscribers.
//! Tests wire the three together, pump recorded frames wherever the
//! scenario needs them, and assert on the transcripts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod event_log;
pub mod sim_env;
pub mod sim_phy;

pub use event_log::{Event, EventLog};
pub use sim_env::SimEnv;
pub use sim_phy::SimPhy;
