//! Per-second windowed rate accounting.

/// A single rate constraint: at most `max` admissions per `period` seconds.
///
/// Accounting is discretized to whole seconds. Completions recorded during
/// the current second accumulate in `this_tick`; each driver tick folds that
/// count into a circular `history` buffer and simultaneously returns the
/// capacity consumed `period` seconds ago to `allowance`. The result
/// approximates a sliding window to within one second, with O(1) work per
/// tick and O(period) memory.
pub(crate) struct Rate {
    /// Capacity ceiling: admissions allowed per window.
    max: u32,
    /// Window length in whole seconds. Zero is a sentinel: the rate never
    /// replenishes and represents a hard one-time budget.
    period: u32,
    /// Remaining capacity right now. Decremented on reservation, incremented
    /// on replenishment; stays within `0..=max` outside of bookkeeping.
    allowance: u32,
    /// One counter per second of the window, indexed by `clock % period`.
    history: Vec<u32>,
    /// Admissions that completed during the current, still-open second.
    this_tick: u32,
}

impl Rate {
    /// Create a fully replenished rate.
    pub(crate) fn new(max: u32, period: u32) -> Self {
        Self {
            max,
            period,
            allowance: max,
            history: vec![0; period as usize],
            this_tick: 0,
        }
    }

    /// Advance the window by one second.
    ///
    /// The bucket at `clock % period` holds the admissions that completed
    /// `period` seconds ago; their capacity is free again now. The bucket is
    /// then overwritten with the count for the second that just closed.
    /// Zero-period rates never replenish.
    pub(crate) fn tick(&mut self, clock: u64) {
        if self.period == 0 {
            return;
        }
        let idx = (clock % u64::from(self.period)) as usize;
        self.allowance += self.history[idx];
        self.history[idx] = self.this_tick;
        self.this_tick = 0;
        debug_assert!(self.allowance <= self.max, "allowance above ceiling");
    }

    /// Reserve one admission.
    ///
    /// Optimistic: happens at admission time, before the task runs, and
    /// deliberately does not touch `this_tick`. Callers must check allowance
    /// first.
    pub(crate) fn reserve(&mut self) {
        debug_assert!(self.allowance > 0, "reserve without allowance");
        self.allowance -= 1;
    }

    /// Record a finished task. Folded into `history` by the next tick.
    pub(crate) fn record_completion(&mut self) {
        self.this_tick += 1;
    }

    /// Remaining capacity.
    pub(crate) fn allowance(&self) -> u32 {
        self.allowance
    }

    /// True for the never-replenishing sentinel.
    pub(crate) fn is_zero_period(&self) -> bool {
        self.period == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run one admission through its full lifecycle within the open second.
    fn admit_and_complete(rate: &mut Rate) {
        rate.reserve();
        rate.record_completion();
    }

    #[test]
    fn test_new_rate_is_fully_replenished() {
        let rate = Rate::new(7, 3);
        assert_eq!(rate.allowance(), 7);
        assert!(!rate.is_zero_period());
    }

    #[test]
    fn test_reserve_decrements_allowance() {
        let mut rate = Rate::new(2, 5);
        rate.reserve();
        assert_eq!(rate.allowance(), 1);
        rate.reserve();
        assert_eq!(rate.allowance(), 0);
    }

    #[test]
    fn test_completion_alone_does_not_replenish() {
        let mut rate = Rate::new(1, 5);
        admit_and_complete(&mut rate);
        assert_eq!(rate.allowance(), 0);
    }

    #[test]
    fn test_capacity_returns_one_period_after_consumption() {
        let mut rate = Rate::new(1, 3);
        admit_and_complete(&mut rate);

        // The completion is folded into the bucket for second 0 on the next
        // tick and returns when the clock wraps back to that bucket.
        rate.tick(0);
        assert_eq!(rate.allowance(), 0);
        rate.tick(1);
        assert_eq!(rate.allowance(), 0);
        rate.tick(2);
        assert_eq!(rate.allowance(), 0);
        rate.tick(3);
        assert_eq!(rate.allowance(), 1);
    }

    #[test]
    fn test_buckets_replenish_independently() {
        let mut rate = Rate::new(2, 3);

        // One admission completing in second 0, another in second 1.
        admit_and_complete(&mut rate);
        rate.tick(0);
        admit_and_complete(&mut rate);
        rate.tick(1);
        assert_eq!(rate.allowance(), 0);

        rate.tick(2);
        assert_eq!(rate.allowance(), 0);
        rate.tick(3); // second-0 bucket wraps
        assert_eq!(rate.allowance(), 1);
        rate.tick(4); // second-1 bucket wraps
        assert_eq!(rate.allowance(), 2);
    }

    #[test]
    fn test_zero_period_never_replenishes() {
        let mut rate = Rate::new(2, 0);
        assert!(rate.is_zero_period());

        admit_and_complete(&mut rate);
        admit_and_complete(&mut rate);
        assert_eq!(rate.allowance(), 0);

        for clock in 0..100 {
            rate.tick(clock);
        }
        assert_eq!(rate.allowance(), 0);
    }

    #[test]
    fn test_slow_task_returns_capacity_late() {
        let mut rate = Rate::new(1, 2);
        rate.reserve();

        // Ticks pass while the task is still running; nothing replenishes.
        rate.tick(0);
        rate.tick(1);
        rate.tick(2);
        assert_eq!(rate.allowance(), 0);

        // Completion lands in second 3 and wraps back two seconds later.
        rate.record_completion();
        rate.tick(3);
        rate.tick(4);
        assert_eq!(rate.allowance(), 0);
        rate.tick(5);
        assert_eq!(rate.allowance(), 1);
    }
}
