//! Region state: the rate set and FIFO task queue for one named partition.

use std::collections::VecDeque;

use super::rate::Rate;
use super::task::Task;

/// Remaining admission capacity for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    /// No rates are registered; admissions never block.
    Unbounded,
    /// At most this many admissions remain before tasks start queueing.
    Remaining(u32),
}

impl Allowance {
    /// True when no further admission can be reserved right now.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Allowance::Remaining(0))
    }
}

/// A named rate-limiting partition.
///
/// Holds an ordered set of rates that must all have spare capacity for an
/// admission, plus the FIFO queue of tasks waiting for that capacity. All
/// access is serialized by the owning limiter's lock; the queue needs no
/// synchronization of its own.
pub(crate) struct Region {
    /// Ordered rate constraints; every admission charges all of them.
    rates: Vec<Rate>,
    /// Tasks awaiting capacity, oldest first.
    queue: VecDeque<Box<dyn Task>>,
    /// Set once a zero-period rate is registered. When that rate's budget is
    /// spent the region can never admit again.
    has_zero_period: bool,
}

impl Region {
    pub(crate) fn new() -> Self {
        Self {
            rates: Vec::new(),
            queue: VecDeque::new(),
            has_zero_period: false,
        }
    }

    /// Append a rate constraint, fully replenished.
    pub(crate) fn add_rate(&mut self, max: u32, period: u32) {
        if period == 0 {
            self.has_zero_period = true;
        }
        self.rates.push(Rate::new(max, period));
    }

    /// Effective allowance: the minimum across all owned rates, unbounded
    /// when none are registered.
    pub(crate) fn allowance(&self) -> Allowance {
        match self.rates.iter().map(Rate::allowance).min() {
            Some(min) => Allowance::Remaining(min),
            None => Allowance::Unbounded,
        }
    }

    /// Reserve one admission against every rate; a single admission must
    /// satisfy all constraints simultaneously.
    pub(crate) fn reserve(&mut self) {
        for rate in &mut self.rates {
            rate.reserve();
        }
    }

    /// Record a finished task against every rate.
    pub(crate) fn record_completion(&mut self) {
        for rate in &mut self.rates {
            rate.record_completion();
        }
    }

    /// Advance every rate's window by one second.
    pub(crate) fn tick(&mut self, clock: u64) {
        for rate in &mut self.rates {
            rate.tick(clock);
        }
    }

    /// True when a zero-period rate has spent its entire one-time budget.
    /// No future tick can admit anything here again.
    pub(crate) fn is_permanently_exhausted(&self) -> bool {
        self.has_zero_period
            && self
                .rates
                .iter()
                .any(|rate| rate.is_zero_period() && rate.allowance() == 0)
    }

    pub(crate) fn push_task(&mut self, task: Box<dyn Task>) {
        self.queue.push_back(task);
    }

    pub(crate) fn pop_task(&mut self) -> Option<Box<dyn Task>> {
        self.queue.pop_front()
    }

    pub(crate) fn queue_depth(&self) -> usize {
        self.queue.len()
    }
}
