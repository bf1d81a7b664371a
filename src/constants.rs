//! Constants used throughout the engine

/// Maximum device name length in bytes, per the GAP name field limit
pub const MAX_DEVICE_NAME_LENGTH: usize = 32;

/// Maximum Extended Inquiry Response record length in bytes
pub const MAX_EIR_LENGTH: usize = 240;

/// Maximum PIN code length in digits
pub const MAX_PIN_LENGTH: usize = 16;
