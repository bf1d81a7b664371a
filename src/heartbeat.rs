//! Heartbeat pacer
//!
//! A fixed-period ticker that enqueues [`AppEvent::Heartbeat`] while
//! pacing is active. The tick never executes session logic on the timer's
//! own context; it only performs a non-blocking dispatch, preserving the
//! single-writer ownership of session state. While connecting the tick
//! drives the attempt timeout, while connected it is the sole trigger for
//! audio delivery, so the interval fully determines the pacing cadence.

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};

use crate::event::{AppEvent, EventQueue};

/// Period of the heartbeat ticker
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(100);

/// Heartbeat ticks allowed in Connecting before the attempt is abandoned
pub const CONNECTING_TICK_BUDGET: u32 = 10;

/// Commands accepted by the pacer task
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum PacerCommand {
    /// Start ticking; resets the tick phase
    Start,
    /// Stop ticking
    Stop,
}

/// Worker-side handle controlling the pacer task
///
/// Backed by a signal rather than a channel: commands overwrite each other,
/// so the latest start/stop decision always wins and the worker never
/// suspends to issue one.
pub struct PacerControl {
    signal: Signal<CriticalSectionRawMutex, PacerCommand>,
}

impl PacerControl {
    /// Create an idle control handle
    #[must_use]
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Start (or restart) pacing
    pub fn start(&self) {
        self.signal.signal(PacerCommand::Start);
    }

    /// Stop pacing
    pub fn stop(&self) {
        self.signal.signal(PacerCommand::Stop);
    }

    async fn wait(&self) -> PacerCommand {
        self.signal.wait().await
    }

    #[cfg(test)]
    pub(crate) fn take(&self) -> Option<PacerCommand> {
        self.signal.try_take()
    }
}

impl Default for PacerControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the pacer
///
/// Idle until started; once started, every [`HEARTBEAT_INTERVAL`] a
/// heartbeat event is dispatched into the queue. A full queue drops the
/// tick (the next one is never far behind).
pub async fn pacer_task(queue: &EventQueue, control: &PacerControl) -> ! {
    let mut active = false;
    let mut ticker = Ticker::every(HEARTBEAT_INTERVAL);

    loop {
        if active {
            match select(control.wait(), ticker.next()).await {
                Either::First(command) => {
                    active = apply(command, &mut ticker);
                }
                Either::Second(()) => {
                    if queue.dispatch(AppEvent::Heartbeat).is_err() {
                        defmt::warn!("[PACER] queue full, tick dropped");
                    }
                }
            }
        } else {
            let command = control.wait().await;
            active = apply(command, &mut ticker);
        }
    }
}

fn apply(command: PacerCommand, ticker: &mut Ticker) -> bool {
    match command {
        PacerCommand::Start => {
            ticker.reset();
            true
        }
        PacerCommand::Stop => false,
    }
}

/// Counters attached to an active pacing phase
///
/// Owned by the worker loop; the pacer task never touches them. Reset on
/// every state entry that restarts pacing and torn down with the state
/// that owns them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatContext {
    /// Ticks observed since the current state was entered
    interval_count: u32,
    /// Ticks observed since pacing first started this session
    total_intervals: u32,
    /// Audio frames pushed while connected
    packet_count: u32,
}

impl HeartbeatContext {
    /// Fresh context with all counters at zero
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval_count: 0,
            total_intervals: 0,
            packet_count: 0,
        }
    }

    /// Zero the per-state counters for a new pacing phase
    pub fn restart(&mut self) {
        self.interval_count = 0;
        self.packet_count = 0;
    }

    /// Record one tick, returning the per-state count
    pub fn tick(&mut self) -> u32 {
        self.interval_count += 1;
        self.total_intervals += 1;
        self.interval_count
    }

    /// Record one pushed audio frame
    pub fn count_packet(&mut self) {
        self.packet_count += 1;
    }

    /// Ticks observed in the current state
    #[must_use]
    pub const fn interval_count(&self) -> u32 {
        self.interval_count
    }

    /// Ticks observed across the whole session
    #[must_use]
    pub const fn total_intervals(&self) -> u32 {
        self.total_intervals
    }

    /// Audio frames pushed so far
    #[must_use]
    pub const fn packet_count(&self) -> u32 {
        self.packet_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counts_per_state_and_total() {
        let mut ctx = HeartbeatContext::new();
        assert_eq!(ctx.tick(), 1);
        assert_eq!(ctx.tick(), 2);
        ctx.restart();
        assert_eq!(ctx.interval_count(), 0);
        assert_eq!(ctx.tick(), 1);
        // The session-wide counter keeps running across restarts
        assert_eq!(ctx.total_intervals(), 3);
    }

    #[test]
    fn test_restart_clears_packet_count() {
        let mut ctx = HeartbeatContext::new();
        ctx.count_packet();
        ctx.count_packet();
        assert_eq!(ctx.packet_count(), 2);
        ctx.restart();
        assert_eq!(ctx.packet_count(), 0);
    }

    #[test]
    fn test_latest_pacer_command_wins() {
        let control = PacerControl::new();
        control.start();
        control.stop();
        assert_eq!(control.take(), Some(PacerCommand::Stop));
        assert_eq!(control.take(), None);
    }
}
