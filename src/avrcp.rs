//! Remote-control (AVRCP) session handling
//!
//! AVRCP controller events travel through the same queue as everything
//! else but mutate only the [`RemoteControlSession`]. The control channel
//! and the audio channel track the same peer in practice, yet either can
//! drop independently, so nothing here feeds back into the A2DP state
//! machine.

use crate::PeerAddress;

/// AVRCP controller-role events delivered by the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvrcpEvent {
    /// The control session connected or disconnected
    ConnectionState {
        /// Whether the session is now up
        connected: bool,
        /// Peer the session belongs to
        addr: PeerAddress,
    },
    /// The peer announced which notifications it can emit
    Capabilities {
        /// Supported-notification capability bitmask
        mask: u16,
    },
    /// A registered notification fired on the peer
    Notification {
        /// AVRCP event identifier
        event_id: u8,
    },
}

/// State of the remote-control session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteControlSession {
    connected: bool,
    peer_cap_mask: Option<u16>,
}

impl RemoteControlSession {
    /// Fresh, disconnected session
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connected: false,
            peer_cap_mask: None,
        }
    }

    /// Whether the control session is currently up
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Capability bitmask announced by the peer, if any
    #[must_use]
    pub const fn peer_capabilities(&self) -> Option<u16> {
        self.peer_cap_mask
    }

    /// Apply one AVRCP event
    pub fn handle_event(&mut self, event: AvrcpEvent) {
        match event {
            AvrcpEvent::ConnectionState { connected, addr } => {
                defmt::info!(
                    "[AVRCP] session {} {}",
                    if connected { "connected to" } else { "disconnected from" },
                    addr
                );
                self.connected = connected;
                if !connected {
                    self.peer_cap_mask = None;
                }
            }
            AvrcpEvent::Capabilities { mask } => {
                defmt::debug!("[AVRCP] peer notification capabilities {=u16:#x}", mask);
                self.peer_cap_mask = Some(mask);
            }
            AvrcpEvent::Notification { event_id } => {
                defmt::debug!("[AVRCP] notification {=u8:#x}", event_id);
            }
        }
    }
}
