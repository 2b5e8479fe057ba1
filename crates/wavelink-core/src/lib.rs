//! Reliable-datagram engine for short radio messages.
//!
//! The [`Engine`] carries short messages between peers identified by 6-byte
//! hardware addresses, over any PHY that can transmit a frame and deliver
//! received ones ([`PhyAdapter`]). It provides at-least-once delivery with
//! at-most-once application dispatch:
//!
//! - every DATA frame carries a fresh 3-byte id and is retransmitted until
//!   the matching ACK arrives or retries are exhausted ([`SendQueue`]);
//! - every received DATA frame is ACKed, then deduplicated against a
//!   time-windowed history before dispatch ([`DedupHistory`]);
//! - results fan out to typed subscriber callbacks (text, raw data,
//!   16-bit commands, ACK notifications).
//!
//! Three execution contexts touch the engine concurrently: callers, the PHY
//! receive path, and the periodic [`RetryDriver`] tick. Two mutexes (queue,
//! history) serialize them; at most one is held at a time, and subscriber
//! callbacks always run outside both.

pub mod binding;
pub mod driver;
pub mod engine;
pub mod env;
pub mod error;
pub mod history;
pub mod msg_id;
pub mod phy;
pub mod queue;
pub mod subscribers;
mod sync;
pub mod system_env;

pub use binding::PhyBinding;
pub use driver::{DEFAULT_TICK_PERIOD, RetryDriver};
pub use engine::{
    CommandOutcome, DEFAULT_MAX_RETRIES, DEFAULT_QUEUE_CAPACITY, DEFAULT_TIMEOUT_MS, Engine,
    EngineConfig,
};
pub use env::Environment;
pub use error::EngineError;
pub use history::{DedupHistory, MAX_HISTORY, MAX_HISTORY_AGE_US, Observation};
pub use msg_id::MessageIdGen;
pub use phy::{PhyAdapter, PhyError};
pub use queue::{Coalesce, PendingMessage, Retransmit, SendQueue};
pub use subscribers::Subscribers;
pub use system_env::SystemEnv;
