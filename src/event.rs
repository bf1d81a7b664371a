//! Event model and bounded message queue
//!
//! Stack callbacks run on contexts this crate does not control and must
//! never be blocked. Producer adapters therefore translate every callback
//! into an owned [`AppEvent`] (copying any transient parameters into the
//! envelope) and hand it off with a non-blocking [`EventQueue::dispatch`].
//! A single worker loop drains the queue in FIFO order; all session state
//! is mutated there and nowhere else.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use heapless::Vec;

use crate::avrcp::AvrcpEvent;
use crate::session::PeerDescriptor;
use crate::{MAX_EIR_LENGTH, PeerAddress};

/// Capacity of the event queue
///
/// Sized for bursts of inquiry results arriving between worker wake-ups.
/// Producers drop events when the queue is full rather than block.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Failure to enqueue an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum DispatchError {
    /// The queue is at capacity; the event was dropped
    QueueFull,
}

/// One inquiry-scan result, copied out of the stack callback
///
/// The EIR payload is deep-copied into the envelope because the callback's
/// buffer is only valid for the duration of the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InquiryResult {
    /// Address of the responding device
    pub addr: PeerAddress,
    /// Signal strength, when the controller reports it
    pub rssi: Option<i8>,
    /// Raw Extended Inquiry Response record
    pub eir: Vec<u8, MAX_EIR_LENGTH>,
}

impl InquiryResult {
    /// Build an owned result from borrowed callback parameters
    ///
    /// EIR data beyond [`MAX_EIR_LENGTH`] bytes is truncated; the name
    /// filter tolerates truncated records.
    #[must_use]
    pub fn from_parts(bd_addr: bt_hci::param::BdAddr, rssi: Option<i8>, eir: &[u8]) -> Self {
        let take = eir.len().min(MAX_EIR_LENGTH);
        let mut copy = Vec::new();
        copy.extend_from_slice(&eir[..take]).ok();
        Self {
            addr: bd_addr.into(),
            rssi,
            eir: copy,
        }
    }
}

/// GAP discovery events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapEvent {
    /// A device answered the inquiry scan
    InquiryResult(InquiryResult),
    /// The inquiry scan finished or was cancelled
    InquiryComplete,
}

/// Link state reported by the A2DP transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum LinkState {
    /// Link established
    Connected,
    /// The lower layer started tearing the link down
    Disconnecting,
    /// Link fully closed
    Disconnected,
}

/// Media-control commands whose acknowledgement the engine waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum MediaCommand {
    /// Start streaming
    Start,
    /// Stop streaming
    Stop,
}

/// A2DP transport events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum A2dpEvent {
    /// The link to the peer changed state
    ConnectionState {
        /// New link state
        state: LinkState,
        /// Peer the link belongs to
        addr: PeerAddress,
    },
    /// The connection attempt failed before a link came up
    ConnectFailed,
    /// The stack acknowledged a media-control command
    MediaControlAck {
        /// Which command was acknowledged
        command: MediaCommand,
        /// Whether the stack accepted it
        accepted: bool,
    },
}

/// Everything the worker loop can receive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Discovery collaborator event
    Gap(GapEvent),
    /// A2DP transport event
    A2dp(A2dpEvent),
    /// Remote-control (AVRCP) event
    Avrcp(AvrcpEvent),
    /// The device filter selected a peer
    PeerFound(PeerDescriptor),
    /// Periodic tick from the heartbeat pacer
    Heartbeat,
    /// Terminal envelope; the worker loop exits after this
    Shutdown,
}

/// Bounded FIFO hand-off between producer contexts and the worker loop
///
/// This is the only entity shared between producers and the consumer; every
/// other piece of session state is owned by the worker.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, AppEvent, EVENT_QUEUE_DEPTH>,
}

impl EventQueue {
    /// Create an empty queue
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue an event without blocking
    ///
    /// Safe to call from any context, including stack callbacks. When the
    /// queue is full the event is dropped and [`DispatchError::QueueFull`]
    /// is returned; producers must not wait for space.
    ///
    /// # Errors
    /// Returns [`DispatchError::QueueFull`] if the queue is at capacity.
    pub fn dispatch(&self, event: AppEvent) -> Result<(), DispatchError> {
        self.channel
            .try_send(event)
            .map_err(|TrySendError::Full(_)| DispatchError::QueueFull)
    }

    /// Wait for the next event
    ///
    /// The worker loop's sole suspension point.
    pub async fn receive(&self) -> AppEvent {
        self.channel.receive().await
    }

    /// Number of events currently queued
    #[must_use]
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    /// Whether the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_and_receive_fifo() {
        let queue = EventQueue::new();
        queue.dispatch(AppEvent::Heartbeat).unwrap();
        queue.dispatch(AppEvent::Gap(GapEvent::InquiryComplete)).unwrap();

        embassy_futures::block_on(async {
            assert_eq!(queue.receive().await, AppEvent::Heartbeat);
            assert_eq!(queue.receive().await, AppEvent::Gap(GapEvent::InquiryComplete));
        });
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dispatch_rejects_when_full() {
        let queue = EventQueue::new();
        for _ in 0..EVENT_QUEUE_DEPTH {
            queue.dispatch(AppEvent::Heartbeat).unwrap();
        }

        assert_eq!(
            queue.dispatch(AppEvent::Shutdown),
            Err(DispatchError::QueueFull)
        );
        // The rejected envelope must not corrupt the queue
        assert_eq!(queue.len(), EVENT_QUEUE_DEPTH);
        embassy_futures::block_on(async {
            assert_eq!(queue.receive().await, AppEvent::Heartbeat);
        });
    }

    #[test]
    fn test_inquiry_result_copies_eir() {
        let eir = [0x05, 0x09, b'T', b'e', b's', b't'];
        let result = InquiryResult::from_parts(
            bt_hci::param::BdAddr::new([1, 2, 3, 4, 5, 6]),
            Some(-42),
            &eir,
        );
        assert_eq!(result.addr, PeerAddress::new([1, 2, 3, 4, 5, 6]));
        assert_eq!(result.rssi, Some(-42));
        assert_eq!(result.eir.as_slice(), &eir);
    }

    #[test]
    fn test_inquiry_result_truncates_oversized_eir() {
        let eir = [0xAAu8; MAX_EIR_LENGTH + 16];
        let result =
            InquiryResult::from_parts(bt_hci::param::BdAddr::new([0; 6]), None, &eir);
        assert_eq!(result.eir.len(), MAX_EIR_LENGTH);
    }
}
