//! Floodgate - Multi-Region Request Rate Limiter
//!
//! This crate meters work against named regions, each constrained by any
//! number of sliding-window rates that must all hold simultaneously. Tasks
//! submitted against a region either run immediately or wait in that
//! region's FIFO queue until a background driver, beating once per second,
//! replenishes capacity. Capacity consumed by a task is only returned one
//! full window after the task finishes, so slow tasks hold their slot for
//! as long as they run.
//!
//! # Quick Start
//!
//! ```no_run
//! use floodgate::{Admission, Limiter};
//!
//! #[tokio::main]
//! async fn main() -> floodgate::Result<()> {
//!     let limiter = Limiter::new();
//!     limiter.add_region("na")?;
//!     limiter.add_rate(500, 600, "na")?;
//!
//!     let admission = limiter.enqueue(
//!         Box::new(|| async {
//!             // Call the rate-limited service here.
//!         }),
//!         "na",
//!     )?;
//!     match admission {
//!         Admission::Immediate(allowance) => println!("running, allowance was {allowance:?}"),
//!         Admission::Queued => println!("waiting for capacity"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod ratelimit;

pub use config::{LimiterConfig, RateConfig};
pub use error::{FloodgateError, Result};
pub use ratelimit::{Admission, Allowance, Limiter, Task};
