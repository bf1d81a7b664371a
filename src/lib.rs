#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![allow(async_fn_in_trait, clippy::too_many_lines)]

pub mod audio;
pub mod avrcp;
pub mod constants;
pub mod event;
pub mod filter;
pub mod heartbeat;
pub mod processor;
pub mod session;
pub mod stack;

mod address;

use heapless::{String, Vec};

pub use address::PeerAddress;
pub use constants::{MAX_DEVICE_NAME_LENGTH, MAX_EIR_LENGTH, MAX_PIN_LENGTH};
pub use event::{AppEvent, DispatchError};
pub use session::{ConnectionState, PeerDescriptor, SourceSession};

use event::EventQueue;
use heartbeat::PacerControl;

/// Event queue backing [`processor::run`]; producers reach it via [`dispatch`]
pub(crate) static EVENT_QUEUE: EventQueue = EventQueue::new();

/// Pacer control backing [`processor::run`]
pub(crate) static HEARTBEAT_PACER: PacerControl = PacerControl::new();

/// Enqueue an event for the engine started by [`processor::run`]
///
/// Safe to call from any stack callback context: never blocks, never
/// allocates. A full queue drops the event.
///
/// # Errors
/// Returns [`DispatchError::QueueFull`] if the event was dropped.
pub fn dispatch(event: AppEvent) -> Result<(), DispatchError> {
    EVENT_QUEUE.dispatch(event)
}

/// Ask the engine started by [`processor::run`] to exit
///
/// Events already queued are still processed before the worker stops.
///
/// # Errors
/// Returns [`DispatchError::QueueFull`] if the shutdown envelope could not
/// be enqueued; callers should retry once the worker has drained.
pub fn shutdown() -> Result<(), DispatchError> {
    EVENT_QUEUE.dispatch(AppEvent::Shutdown)
}

/// Engine-level errors
///
/// There is no fatal class here: connection-path failures are recovered
/// internally by falling back to `Unconnected` and rescanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum EngineError {
    /// Invalid parameter (name or PIN too long, malformed address)
    InvalidParameter,
    /// The discovery collaborator refused to start scanning
    DiscoveryFailed,
    /// The transport refused the connection request
    ConnectionFailed,
}

/// PIN code type forwarded to the pairing collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum PinKind {
    /// Fixed-length 16-digit PIN
    Fixed,
    /// Variable-length PIN
    Variable,
}

/// Optional fixed PIN code for legacy pairing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinCode {
    /// ASCII digits of the code
    pub digits: Vec<u8, MAX_PIN_LENGTH>,
    /// Whether the stack should treat the length as fixed or variable
    pub kind: PinKind,
}

impl PinCode {
    /// Variable-length PIN from its ASCII digits
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidParameter`] if the code is longer than
    /// [`MAX_PIN_LENGTH`] digits.
    pub fn variable(digits: &str) -> Result<Self, EngineError> {
        Self::new(digits, PinKind::Variable)
    }

    /// Fixed-length PIN from its ASCII digits
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidParameter`] if the code is longer than
    /// [`MAX_PIN_LENGTH`] digits.
    pub fn fixed(digits: &str) -> Result<Self, EngineError> {
        Self::new(digits, PinKind::Fixed)
    }

    fn new(digits: &str, kind: PinKind) -> Result<Self, EngineError> {
        let digits =
            Vec::from_slice(digits.as_bytes()).map_err(|()| EngineError::InvalidParameter)?;
        Ok(Self { digits, kind })
    }
}

/// Pairing settings forwarded once to the pairing collaborator at start-up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingConfig {
    /// Enable Secure Simple Pairing
    pub ssp_enabled: bool,
    /// Fixed PIN for legacy pairing, if any
    pub pin: Option<PinCode>,
}

/// Engine configuration
///
/// The target device name is the only required setting; pairing options
/// default to legacy pairing without a fixed PIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Name the device filter matches inquiry results against
    pub target_name: String<MAX_DEVICE_NAME_LENGTH>,
    /// Pairing settings forwarded at start-up
    pub pairing: PairingConfig,
}

impl SourceConfig {
    /// Configuration targeting the given device name
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidParameter`] if the name exceeds
    /// [`MAX_DEVICE_NAME_LENGTH`] bytes.
    pub fn new(target_name: &str) -> Result<Self, EngineError> {
        let target_name =
            String::try_from(target_name).map_err(|()| EngineError::InvalidParameter)?;
        Ok(Self {
            target_name,
            pairing: PairingConfig::default(),
        })
    }

    /// Enable or disable Secure Simple Pairing
    #[must_use]
    pub fn with_ssp(mut self, enabled: bool) -> Self {
        self.pairing.ssp_enabled = enabled;
        self
    }

    /// Set a fixed PIN code for legacy pairing
    #[must_use]
    pub fn with_pin(mut self, pin: PinCode) -> Self {
        self.pairing.pin = Some(pin);
        self
    }
}

// Host test binaries need a logger implementation to link defmt symbols.
#[cfg(test)]
mod test_logger {
    #[defmt::global_logger]
    struct NopLogger;

    unsafe impl defmt::Logger for NopLogger {
        fn acquire() {}
        unsafe fn flush() {}
        unsafe fn release() {}
        unsafe fn write(_bytes: &[u8]) {}
    }

    defmt::timestamp!("{=u64}", 0);

    #[defmt::panic_handler]
    fn panic() -> ! {
        core::panic!()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_config_defaults() {
        let config = SourceConfig::new("Speaker").unwrap();
        assert_eq!(config.target_name.as_str(), "Speaker");
        assert!(!config.pairing.ssp_enabled);
        assert!(config.pairing.pin.is_none());
    }

    #[test]
    fn test_source_config_builder() {
        let config = SourceConfig::new("Speaker")
            .unwrap()
            .with_ssp(true)
            .with_pin(PinCode::fixed("1234").unwrap());
        assert!(config.pairing.ssp_enabled);
        let pin = config.pairing.pin.unwrap();
        assert_eq!(pin.digits.as_slice(), b"1234");
        assert_eq!(pin.kind, PinKind::Fixed);
    }

    #[test]
    fn test_source_config_rejects_oversized_name() {
        let bytes = [b'X'; MAX_DEVICE_NAME_LENGTH + 1];
        let name = core::str::from_utf8(&bytes).unwrap();
        assert_eq!(
            SourceConfig::new(name).unwrap_err(),
            EngineError::InvalidParameter
        );
    }

    #[test]
    fn test_pin_code_length_limit() {
        assert!(PinCode::variable("0000111122223333").is_ok());
        assert_eq!(
            PinCode::variable("00001111222233334").unwrap_err(),
            EngineError::InvalidParameter
        );
    }
}
