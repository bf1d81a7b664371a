use crate::EngineError;

/// A Bluetooth Classic device address (`BD_ADDR`).
///
/// Producer adapters usually obtain one of these from a `bt_hci` event
/// parameter; the conversions below keep that boundary free of manual
/// byte shuffling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, defmt::Format)]
pub struct PeerAddress([u8; 6]);

impl PeerAddress {
    /// Create an address from raw bytes
    #[must_use]
    pub const fn new(addr: [u8; 6]) -> Self {
        Self(addr)
    }

    /// Raw address bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Format as colon-separated uppercase hex, for diagnostics
    #[must_use]
    pub fn format_hex(&self) -> heapless::String<17> {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        let mut out = heapless::String::new();
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(':').ok();
            }
            out.push(HEX[usize::from(byte >> 4)] as char).ok();
            out.push(HEX[usize::from(byte & 0x0F)] as char).ok();
        }
        out
    }
}

impl From<[u8; 6]> for PeerAddress {
    fn from(addr: [u8; 6]) -> Self {
        Self(addr)
    }
}

impl From<PeerAddress> for [u8; 6] {
    fn from(addr: PeerAddress) -> Self {
        addr.0
    }
}

impl From<bt_hci::param::BdAddr> for PeerAddress {
    fn from(bd_addr: bt_hci::param::BdAddr) -> Self {
        let mut addr = [0u8; 6];
        addr.copy_from_slice(bd_addr.raw());
        Self(addr)
    }
}

impl From<PeerAddress> for bt_hci::param::BdAddr {
    fn from(addr: PeerAddress) -> Self {
        bt_hci::param::BdAddr::new(addr.0)
    }
}

impl TryFrom<&[u8]> for PeerAddress {
    type Error = EngineError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() == 6 {
            let mut addr = [0u8; 6];
            addr.copy_from_slice(bytes);
            Ok(Self(addr))
        } else {
            Err(EngineError::InvalidParameter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hex() {
        let addr = PeerAddress::new([0x00, 0x1B, 0x66, 0xA0, 0x0F, 0xFE]);
        assert_eq!(addr.format_hex().as_str(), "00:1B:66:A0:0F:FE");
    }

    #[test]
    fn test_bd_addr_round_trip() {
        let addr = PeerAddress::new([0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC]);
        let bd_addr: bt_hci::param::BdAddr = addr.into();
        assert_eq!(PeerAddress::from(bd_addr), addr);
    }

    #[test]
    fn test_try_from_slice_rejects_bad_length() {
        assert!(PeerAddress::try_from(&[0x12u8, 0x34][..]).is_err());
        assert!(PeerAddress::try_from(&[0u8; 7][..]).is_err());
        assert_eq!(
            PeerAddress::try_from(&[1u8, 2, 3, 4, 5, 6][..]).unwrap(),
            PeerAddress::new([1, 2, 3, 4, 5, 6])
        );
    }
}
