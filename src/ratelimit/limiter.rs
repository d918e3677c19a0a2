//! Core limiter implementation: region registry, discrete clock, and the
//! periodic driver that replenishes capacity and drains queues.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace};

use super::region::{Allowance, Region};
use super::task::Task;
use crate::error::{FloodgateError, Result};

/// Beat of the periodic driver. The one-second discretization is part of the
/// accounting contract, not a tunable.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of a successful admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The task was dispatched immediately. Carries the region allowance as
    /// it stood before this call reserved capacity: `Remaining(1)` means
    /// this call took the last slot and the next submission may queue.
    Immediate(Allowance),
    /// Every constraint was exhausted; the task waits in the region's FIFO
    /// queue until a tick frees capacity.
    Queued,
}

/// Everything the driver, admission decisions, and completion bookkeeping
/// contend on, behind the one global lock.
struct LimiterState {
    /// Region registry, keyed by unique name.
    regions: HashMap<String, Region>,
    /// Discrete second counter, incremented once per driver tick.
    clock: u64,
    /// Monotonic: set by `stop` or drop, observed by everything else.
    stopped: bool,
}

type SharedState = Arc<Mutex<LimiterState>>;

impl LimiterState {
    fn new() -> Self {
        Self {
            regions: HashMap::new(),
            clock: 0,
            stopped: false,
        }
    }

    /// One driver beat: replenish every rate, advance the clock, then serve
    /// queued tasks. The queues must not be served against stale allowance,
    /// so the order here is fixed.
    fn advance(&mut self, shared: &SharedState) {
        for region in self.regions.values_mut() {
            region.tick(self.clock);
        }
        self.clock += 1;
        trace!(clock = self.clock, "Advanced limiter clock");
        self.drain(shared);
    }

    /// Serve queued tasks in submission order per region, while capacity
    /// remains.
    fn drain(&mut self, shared: &SharedState) {
        for (name, region) in self.regions.iter_mut() {
            while !region.allowance().is_exhausted() {
                let Some(task) = region.pop_task() else { break };
                region.reserve();
                trace!(region = %name, "Dispatching queued task");
                dispatch(Arc::clone(shared), name.clone(), task);
            }
        }
    }
}

/// Run an admitted task on its own Tokio task, then record the completion
/// against the owning region's rates. Execution happens outside the global
/// lock; only the post-completion bookkeeping reacquires it.
fn dispatch(shared: SharedState, region: String, task: Box<dyn Task>) {
    tokio::spawn(async move {
        task.run().await;
        let mut state = shared.lock();
        if let Some(reg) = state.regions.get_mut(&region) {
            reg.record_completion();
        }
    });
}

/// Periodic driver loop. Beats once per second until `stopped` is observed;
/// the flag is only consulted under the lock, so a stop between beats takes
/// effect on the next one.
async fn drive(shared: SharedState) {
    let mut ticker = time::interval_at(time::Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let mut state = shared.lock();
        if state.stopped {
            debug!("Driver halting: limiter stopped");
            return;
        }
        state.advance(&shared);
    }
}

/// The top-level admission authority.
///
/// A limiter owns its region registry, its discrete clock, and a background
/// driver that beats once per wall-clock second. Callers register regions
/// and rates once at startup, then submit tasks per region: each submission
/// either runs immediately (capacity permitting) or waits in that region's
/// FIFO queue until the driver frees capacity.
///
/// All state transitions serialize through one internal lock; task execution
/// does not. Share a limiter across collaborators behind an `Arc`.
pub struct Limiter {
    state: SharedState,
}

impl Limiter {
    /// Create a limiter with its driver already running.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the driver is spawned
    /// immediately.
    pub fn new() -> Self {
        let state = Arc::new(Mutex::new(LimiterState::new()));
        tokio::spawn(drive(Arc::clone(&state)));
        info!("Limiter started");
        Self { state }
    }

    /// Register an empty region under a unique name.
    ///
    /// A region with no rates admits everything; constraints are attached
    /// with [`add_rate`](Limiter::add_rate).
    pub fn add_region(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.stopped {
            return Err(FloodgateError::Stopped);
        }
        if state.regions.contains_key(name) {
            return Err(FloodgateError::RegionExists(name.to_string()));
        }
        state.regions.insert(name.to_string(), Region::new());
        debug!(region = %name, "Registered region");
        Ok(())
    }

    /// Append a `(max, period)` rate to a region, fully replenished.
    ///
    /// Tasks are only admitted while every rate of the region has spare
    /// allowance. A `period` of zero registers a hard one-time budget: once
    /// its allowance is spent, the region never admits again.
    pub fn add_rate(&self, max: u32, period: u32, region: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.stopped {
            return Err(FloodgateError::Stopped);
        }
        let reg = state
            .regions
            .get_mut(region)
            .ok_or_else(|| FloodgateError::RegionNotFound(region.to_string()))?;
        reg.add_rate(max, period);
        debug!(region = %region, max, period, "Registered rate");
        Ok(())
    }

    /// Submit a task for a region: the central admission decision.
    ///
    /// If the region has spare allowance, capacity is reserved and the task
    /// starts running on its own Tokio task before this call returns
    /// [`Admission::Immediate`] with the pre-reservation allowance.
    /// Otherwise the task joins the region's FIFO queue
    /// ([`Admission::Queued`]) and waits, without deadline, for the driver
    /// to free capacity.
    ///
    /// This call never blocks on task completion; results must flow through
    /// the task's own channels.
    pub fn enqueue(&self, task: Box<dyn Task>, region: &str) -> Result<Admission> {
        let mut state = self.state.lock();
        if state.stopped {
            return Err(FloodgateError::Stopped);
        }
        let reg = state
            .regions
            .get_mut(region)
            .ok_or_else(|| FloodgateError::RegionNotFound(region.to_string()))?;

        let before = reg.allowance();
        if !before.is_exhausted() {
            reg.reserve();
            trace!(region = %region, allowance = ?before, "Admitted task");
            dispatch(Arc::clone(&self.state), region.to_string(), task);
            Ok(Admission::Immediate(before))
        } else if reg.is_permanently_exhausted() {
            // A spent zero-period budget can never replenish; queueing here
            // would leak the task forever.
            Err(FloodgateError::RegionExhausted(region.to_string()))
        } else {
            reg.push_task(task);
            trace!(region = %region, depth = reg.queue_depth(), "Queued task");
            Ok(Admission::Queued)
        }
    }

    /// Halt the limiter permanently. There is no un-stopping.
    ///
    /// The driver exits on its next beat and every subsequent mutating call
    /// fails with [`FloodgateError::Stopped`]. Tasks already dispatched run
    /// to completion; tasks still queued are abandoned without being run or
    /// signaled.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if !state.stopped {
            state.stopped = true;
            info!("Limiter stopped");
        }
    }

    /// True once [`stop`](Limiter::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Current allowance of a region, without reserving anything.
    pub fn allowance(&self, region: &str) -> Result<Allowance> {
        let state = self.state.lock();
        state
            .regions
            .get(region)
            .map(Region::allowance)
            .ok_or_else(|| FloodgateError::RegionNotFound(region.to_string()))
    }

    /// Number of tasks waiting in a region's queue.
    pub fn queue_depth(&self, region: &str) -> Result<usize> {
        let state = self.state.lock();
        state
            .regions
            .get(region)
            .map(Region::queue_depth)
            .ok_or_else(|| FloodgateError::RegionNotFound(region.to_string()))
    }

    /// Number of registered regions.
    pub fn region_count(&self) -> usize {
        self.state.lock().regions.len()
    }

    /// Current value of the discrete clock: driver beats since construction.
    pub fn clock(&self) -> u64 {
        self.state.lock().clock
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Limiter {
    fn drop(&mut self) {
        // The driver holds its own Arc and would outlive the handle forever.
        self.state.lock().stopped = true;
    }
}
