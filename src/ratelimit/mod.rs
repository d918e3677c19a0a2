//! Rate limiting logic and state management.

mod limiter;
mod rate;
mod region;
mod task;

pub use limiter::{Admission, Limiter};
pub use region::Allowance;
pub use task::Task;
