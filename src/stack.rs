//! Collaborator contracts consumed by the session engine
//!
//! The radio stack itself (GAP inquiry, A2DP signaling, SBC encoding, link
//! security) lives outside this crate. The engine drives it through the
//! traits below and receives its notifications back as [`AppEvent`]s
//! dispatched by producer adapters.
//!
//! [`AppEvent`]: crate::event::AppEvent

use crate::{PairingConfig, PeerAddress};

/// Errors reported by stack collaborators
///
/// The engine never treats these as fatal: command failures on the
/// connection path revert the session to `Unconnected` and discovery
/// resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum StackError {
    /// The underlying controller rejected or failed the command
    CommandFailed,
    /// The collaborator is not ready for the requested operation
    NotReady,
    /// Invalid parameter passed through to the stack
    InvalidParameter,
}

/// Inquiry-scan collaborator
///
/// Emits inquiry results back through the event queue; the engine only
/// issues start/stop commands.
pub trait DiscoveryControl {
    /// Begin an inquiry scan
    async fn start_inquiry(&mut self) -> Result<(), StackError>;

    /// Cancel an inquiry scan in progress
    async fn cancel_inquiry(&mut self) -> Result<(), StackError>;
}

/// A2DP link and media-path collaborator
///
/// Link state changes and media acknowledgements come back asynchronously
/// as [`A2dpEvent`]s; none of these commands confirm anything beyond
/// acceptance by the stack.
///
/// [`A2dpEvent`]: crate::event::A2dpEvent
pub trait MediaTransport {
    /// Open an A2DP connection to the peer
    async fn connect(&mut self, addr: PeerAddress) -> Result<(), StackError>;

    /// Tear down the A2DP connection to the peer
    async fn disconnect(&mut self, addr: PeerAddress) -> Result<(), StackError>;

    /// Ask the stack to start the media stream
    async fn start_media(&mut self) -> Result<(), StackError>;

    /// Ask the stack to stop the media stream
    async fn stop_media(&mut self) -> Result<(), StackError>;

    /// Hand one frame of audio to the stack's send path
    ///
    /// A zero-length frame is a valid underrun marker and must be accepted.
    async fn write_media(&mut self, frame: &[u8]) -> Result<(), StackError>;
}

/// Pairing collaborator
///
/// The engine forwards the configured pairing mode and optional fixed PIN
/// exactly once at start-up; pairing itself happens in the stack.
pub trait PairingControl {
    /// Forward the pairing configuration to the stack
    async fn apply_pairing(&mut self, pairing: &PairingConfig) -> Result<(), StackError>;
}
