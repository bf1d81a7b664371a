//! A2DP source session state machine
//!
//! [`SourceSession`] owns every piece of mutable session state: connection
//! state, the selected peer, the heartbeat counters, and the remote-control
//! session. It is only ever driven from the worker loop, one event at a
//! time, so none of it needs synchronization.
//!
//! The state machine is deliberately tolerant: the stack can deliver stale
//! or duplicate notifications (a second link-opened while already
//! connected, a tick left over from a previous phase), and every
//! state-inappropriate event is logged and ignored rather than treated as
//! an error. Failures on the connection path collapse back to
//! `Unconnected` and discovery resumes; the session never halts.

use embassy_time::Instant;
use heapless::String;

use crate::audio::{AUDIO_PULL_LEN, AudioSource};
use crate::avrcp::RemoteControlSession;
use crate::event::{A2dpEvent, AppEvent, EventQueue, GapEvent, InquiryResult, LinkState, MediaCommand};
use crate::filter::DeviceFilter;
use crate::heartbeat::{CONNECTING_TICK_BUDGET, HeartbeatContext, PacerControl};
use crate::stack::{DiscoveryControl, MediaTransport, PairingControl};
use crate::{EngineError, MAX_DEVICE_NAME_LENGTH, PeerAddress, SourceConfig};

/// Lifecycle of the A2DP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum ConnectionState {
    /// No peer selected; discovery may be running
    Unconnected,
    /// Connection request issued, waiting for the link to come up
    Connecting,
    /// Link established; heartbeat drives audio delivery
    Connected,
    /// Teardown requested, waiting for confirmation
    Disconnecting,
}

/// The peer selected by the device filter
///
/// Populated on the first name match of a session and cleared whenever the
/// session falls back to `Unconnected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDescriptor {
    /// Device address
    pub addr: PeerAddress,
    /// Name extracted from the EIR record
    pub name: String<MAX_DEVICE_NAME_LENGTH>,
    /// When the filter matched
    pub discovered_at: Instant,
}

impl PeerDescriptor {
    /// Build a descriptor from a matched inquiry result
    #[must_use]
    pub fn new(addr: PeerAddress, name: &str, discovered_at: Instant) -> Self {
        Self {
            addr,
            name: String::try_from(name).unwrap_or_default(),
            discovered_at,
        }
    }
}

/// All session state, owned by the worker loop
pub struct SourceSession<'e, S, A> {
    config: SourceConfig,
    state: ConnectionState,
    peer: Option<PeerDescriptor>,
    heartbeat: HeartbeatContext,
    remote_control: RemoteControlSession,
    media_ready: bool,
    frame: [u8; AUDIO_PULL_LEN],
    stack: S,
    audio: A,
    queue: &'e EventQueue,
    pacer: &'e PacerControl,
}

impl<'e, S, A> SourceSession<'e, S, A>
where
    S: DiscoveryControl + MediaTransport + PairingControl,
    A: AudioSource,
{
    /// Create a session in `Unconnected` with no peer selected
    pub fn new(
        config: SourceConfig,
        stack: S,
        audio: A,
        queue: &'e EventQueue,
        pacer: &'e PacerControl,
    ) -> Self {
        Self {
            config,
            state: ConnectionState::Unconnected,
            peer: None,
            heartbeat: HeartbeatContext::new(),
            remote_control: RemoteControlSession::new(),
            media_ready: false,
            frame: [0u8; AUDIO_PULL_LEN],
            stack,
            audio,
            queue,
            pacer,
        }
    }

    /// Forward the pairing configuration and begin scanning
    ///
    /// # Errors
    /// Returns [`EngineError::DiscoveryFailed`] if the inquiry cannot be
    /// started. A pairing forwarding failure is logged but not fatal; the
    /// stack may still pair with its own defaults.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        if self.stack.apply_pairing(&self.config.pairing).await.is_err() {
            defmt::warn!("[SESSION] pairing configuration rejected by stack");
        }
        defmt::info!(
            "[SESSION] scanning for '{}'",
            self.config.target_name.as_str()
        );
        self.stack
            .start_inquiry()
            .await
            .map_err(|_| EngineError::DiscoveryFailed)
    }

    /// Current connection state
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// The selected peer, if any
    #[must_use]
    pub const fn peer(&self) -> Option<&PeerDescriptor> {
        self.peer.as_ref()
    }

    /// Heartbeat counters for the current phase
    #[must_use]
    pub const fn heartbeat(&self) -> &HeartbeatContext {
        &self.heartbeat
    }

    /// Remote-control session state
    #[must_use]
    pub const fn remote_control(&self) -> &RemoteControlSession {
        &self.remote_control
    }

    /// Whether the media path has been confirmed started
    #[must_use]
    pub const fn media_ready(&self) -> bool {
        self.media_ready
    }

    /// The stack collaborator (mainly useful for inspection in tests)
    #[must_use]
    pub const fn stack(&self) -> &S {
        &self.stack
    }

    pub(crate) const fn queue(&self) -> &'e EventQueue {
        self.queue
    }

    /// Apply one dequeued event
    ///
    /// The only place session state is ever mutated.
    pub async fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Gap(GapEvent::InquiryResult(result)) => {
                self.on_inquiry_result(&result).await;
            }
            AppEvent::Gap(GapEvent::InquiryComplete) => self.on_inquiry_complete().await,
            AppEvent::PeerFound(peer) => self.on_peer_found(peer).await,
            AppEvent::A2dp(a2dp) => self.on_a2dp_event(a2dp).await,
            AppEvent::Avrcp(avrcp) => self.remote_control.handle_event(avrcp),
            AppEvent::Heartbeat => self.on_heartbeat().await,
            // The worker exits before handing this over; ignore defensively
            AppEvent::Shutdown => {}
        }
    }

    /// Run one inquiry result through the device filter
    ///
    /// Only consulted while unconnected or connecting and no peer has been
    /// selected yet; at most one peer descriptor is active per session.
    async fn on_inquiry_result(&mut self, result: &InquiryResult) {
        let filtering = matches!(
            self.state,
            ConnectionState::Unconnected | ConnectionState::Connecting
        ) && self.peer.is_none();
        if !filtering {
            return;
        }

        let filter = DeviceFilter::new(self.config.target_name.as_str());
        let Some(peer) = filter.evaluate(result) else {
            return;
        };

        self.peer = Some(peer.clone());
        if self.stack.cancel_inquiry().await.is_err() {
            defmt::warn!("[SESSION] inquiry cancel rejected; scan will time out");
        }
        if self.queue.dispatch(AppEvent::PeerFound(peer)).is_err() {
            // Drop the selection so a later inquiry result can retry
            defmt::warn!("[SESSION] queue full, peer hand-off dropped");
            self.peer = None;
        }
    }

    /// An inquiry period ended; keep scanning if still unconnected
    async fn on_inquiry_complete(&mut self) {
        if self.state == ConnectionState::Unconnected && self.peer.is_none() {
            defmt::debug!("[SESSION] inquiry complete without match, rescanning");
            if self.stack.start_inquiry().await.is_err() {
                defmt::error!("[SESSION] failed to restart inquiry");
            }
        }
    }

    /// The filter selected a peer; open the connection
    async fn on_peer_found(&mut self, peer: PeerDescriptor) {
        if self.state != ConnectionState::Unconnected {
            defmt::debug!(
                "[SESSION] peer-found ignored in {}",
                self.state
            );
            return;
        }

        defmt::info!("[SESSION] connecting to {}", peer.addr);
        if self.stack.connect(peer.addr).await.is_err() {
            defmt::warn!("[SESSION] connection request rejected");
            self.enter_unconnected(true).await;
            return;
        }
        self.state = ConnectionState::Connecting;
        self.heartbeat.restart();
        self.pacer.start();
    }

    /// One heartbeat tick; the effect depends on the current state
    async fn on_heartbeat(&mut self) {
        match self.state {
            ConnectionState::Connecting => {
                let elapsed = self.heartbeat.tick();
                if elapsed >= CONNECTING_TICK_BUDGET {
                    defmt::warn!(
                        "[SESSION] no link after {=u32} ticks, abandoning attempt",
                        elapsed
                    );
                    if let Some(addr) = self.peer.as_ref().map(|p| p.addr) {
                        self.stack.disconnect(addr).await.ok();
                    }
                    self.enter_unconnected(true).await;
                }
            }
            ConnectionState::Connected => {
                self.heartbeat.tick();
                if self.media_ready {
                    self.push_one_frame().await;
                } else {
                    defmt::debug!("[SESSION] tick before media start confirmation");
                }
            }
            // Stale tick from a phase that already ended
            _ => defmt::debug!("[SESSION] heartbeat ignored in {}", self.state),
        }
    }

    /// Pull one frame from the audio source and push it to the stack
    ///
    /// A short or empty pull is an underrun: the partial frame is forwarded
    /// as-is and no retry happens within this tick.
    async fn push_one_frame(&mut self) {
        let written = self.audio.pull(&mut self.frame);
        let len = written.min(self.frame.len());
        if self.stack.write_media(&self.frame[..len]).await.is_err() {
            defmt::warn!("[SESSION] media write failed, frame lost");
            return;
        }
        self.heartbeat.count_packet();
    }

    async fn on_a2dp_event(&mut self, event: A2dpEvent) {
        match event {
            A2dpEvent::ConnectionState {
                state: LinkState::Connected,
                addr,
            } => self.on_link_opened(addr).await,
            A2dpEvent::ConnectionState {
                state: LinkState::Disconnecting,
                addr,
            } => self.on_remote_disconnect(addr).await,
            A2dpEvent::ConnectionState {
                state: LinkState::Disconnected,
                ..
            } => self.on_link_closed().await,
            A2dpEvent::ConnectFailed => {
                if self.state == ConnectionState::Connecting {
                    defmt::warn!("[SESSION] connection attempt failed");
                    self.enter_unconnected(true).await;
                } else {
                    defmt::debug!("[SESSION] connect-failed ignored in {}", self.state);
                }
            }
            A2dpEvent::MediaControlAck { command, accepted } => {
                self.on_media_ack(command, accepted);
            }
        }
    }

    /// The link came up
    async fn on_link_opened(&mut self, addr: PeerAddress) {
        match self.state {
            ConnectionState::Connecting => {
                defmt::info!("[SESSION] link opened to {}", addr);
                self.state = ConnectionState::Connected;
                self.heartbeat.restart();
                self.pacer.start();
                self.media_ready = false;
                if self.stack.start_media().await.is_err() {
                    defmt::warn!("[SESSION] media start request rejected");
                }
            }
            // Duplicate delivery; no second pacer restart
            ConnectionState::Connected => {
                defmt::debug!("[SESSION] duplicate link-opened ignored");
            }
            _ => defmt::debug!("[SESSION] link-opened ignored in {}", self.state),
        }
    }

    /// The lower layer started tearing the link down; teardown always wins
    async fn on_remote_disconnect(&mut self, addr: PeerAddress) {
        match self.state {
            ConnectionState::Connected | ConnectionState::Connecting => {
                defmt::info!("[SESSION] remote teardown from {}", addr);
                self.pacer.stop();
                self.media_ready = false;
                self.stack.disconnect(addr).await.ok();
                self.state = ConnectionState::Disconnecting;
            }
            _ => defmt::debug!("[SESSION] teardown notice ignored in {}", self.state),
        }
    }

    /// Teardown confirmed (or the link dropped outright)
    async fn on_link_closed(&mut self) {
        match self.state {
            ConnectionState::Disconnecting
            | ConnectionState::Connected
            | ConnectionState::Connecting => {
                defmt::info!("[SESSION] link closed");
                self.enter_unconnected(true).await;
            }
            ConnectionState::Unconnected => {
                defmt::debug!("[SESSION] link-closed ignored while unconnected");
            }
        }
    }

    fn on_media_ack(&mut self, command: MediaCommand, accepted: bool) {
        if self.state != ConnectionState::Connected {
            defmt::debug!("[SESSION] media ack ignored in {}", self.state);
            return;
        }
        match command {
            MediaCommand::Start if accepted => {
                defmt::info!("[SESSION] media started, audio cycle enabled");
                self.media_ready = true;
            }
            MediaCommand::Start => {
                defmt::warn!("[SESSION] media start rejected by stack");
            }
            MediaCommand::Stop => {
                defmt::debug!("[SESSION] media stopped");
                self.media_ready = false;
            }
        }
    }

    /// Collapse back to `Unconnected`, clearing the peer and stopping pacing
    async fn enter_unconnected(&mut self, restart_discovery: bool) {
        self.pacer.stop();
        self.peer = None;
        self.media_ready = false;
        self.state = ConnectionState::Unconnected;
        if restart_discovery {
            if self.stack.start_inquiry().await.is_err() {
                defmt::error!("[SESSION] failed to resume discovery");
            }
        }
    }
}
