//! Device filter over inquiry-scan results
//!
//! Inquiry results carry a variable-length Extended Inquiry Response (EIR)
//! record: a sequence of `{length, tag, data}` fields. Devices may omit the
//! name field, shorten it, or truncate the record mid-field, so the parser
//! is lazy and clamps instead of erroring. The filter compares the
//! extracted name case-sensitively against the configured target and
//! produces a [`PeerDescriptor`] on the first exact match.

use embassy_time::Instant;

use crate::event::InquiryResult;
use crate::session::PeerDescriptor;

/// EIR field tag: Shortened Local Name
const EIR_TYPE_SHORT_LOCAL_NAME: u8 = 0x08;
/// EIR field tag: Complete Local Name
const EIR_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;

/// Lazy iterator over the `{length, tag, data}` fields of an EIR record
///
/// A zero length byte terminates the record. A declared length that
/// overruns the buffer yields the remaining bytes instead of failing, so
/// truncated records still surface whatever name prefix they carry.
pub struct EirFields<'a> {
    remaining: &'a [u8],
}

impl<'a> EirFields<'a> {
    /// Start a parse over a raw EIR record
    #[must_use]
    pub const fn new(eir: &'a [u8]) -> Self {
        Self { remaining: eir }
    }
}

impl<'a> Iterator for EirFields<'a> {
    /// `(tag, data)` of one EIR field
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, rest) = self.remaining.split_first()?;
        if len == 0 {
            self.remaining = &[];
            return None;
        }
        let (&tag, rest) = rest.split_first()?;
        let data_len = (len as usize - 1).min(rest.len());
        let (data, rest) = rest.split_at(data_len);
        self.remaining = rest;
        Some((tag, data))
    }
}

/// Extract the device name from an EIR record
///
/// Prefers the Complete Local Name field and falls back to the Shortened
/// Local Name. Returns `None` when the record carries neither.
#[must_use]
pub fn local_name(eir: &[u8]) -> Option<&[u8]> {
    let mut short_name = None;
    for (tag, data) in EirFields::new(eir) {
        match tag {
            EIR_TYPE_COMPLETE_LOCAL_NAME => return Some(data),
            EIR_TYPE_SHORT_LOCAL_NAME => short_name = Some(data),
            _ => {}
        }
    }
    short_name
}

/// Name filter applied to every inquiry result until a peer is selected
pub struct DeviceFilter<'a> {
    target_name: &'a str,
}

impl<'a> DeviceFilter<'a> {
    /// Create a filter for the given target name
    #[must_use]
    pub const fn new(target_name: &'a str) -> Self {
        Self { target_name }
    }

    /// Check one inquiry result against the target name
    ///
    /// Absent, empty, truncated-to-mismatch, or non-UTF-8 names are all
    /// treated as non-matching, never as errors. The match is exact and
    /// case-sensitive.
    #[must_use]
    pub fn evaluate(&self, result: &InquiryResult) -> Option<PeerDescriptor> {
        let name = local_name(&result.eir)?;
        let name = core::str::from_utf8(name).ok()?;
        if name.is_empty() || name != self.target_name {
            return None;
        }
        defmt::info!(
            "[FILTER] matched '{}' at {}",
            name,
            result.addr.format_hex().as_str()
        );
        Some(PeerDescriptor::new(result.addr, name, Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PeerAddress;
    use heapless::Vec;

    fn result_with_eir(eir: &[u8]) -> InquiryResult {
        let mut copy = Vec::new();
        copy.extend_from_slice(eir).unwrap();
        InquiryResult {
            addr: PeerAddress::new([0x10, 0x20, 0x30, 0x40, 0x50, 0x60]),
            rssi: Some(-60),
            eir: copy,
        }
    }

    // {len, tag, data...} helper: complete local name "Speaker"
    const SPEAKER_EIR: &[u8] = &[
        0x02, 0x01, 0x06, // flags field, ignored
        0x08, 0x09, b'S', b'p', b'e', b'a', b'k', b'e', b'r',
    ];

    #[test]
    fn test_local_name_complete() {
        assert_eq!(local_name(SPEAKER_EIR), Some(&b"Speaker"[..]));
    }

    #[test]
    fn test_local_name_prefers_complete_over_short() {
        let eir = [
            0x03, 0x08, b'S', b'p', // shortened "Sp"
            0x05, 0x09, b'F', b'u', b'l', b'l', // complete "Full"
        ];
        assert_eq!(local_name(&eir), Some(&b"Full"[..]));
    }

    #[test]
    fn test_local_name_falls_back_to_short() {
        let eir = [0x03, 0x08, b'S', b'p'];
        assert_eq!(local_name(&eir), Some(&b"Sp"[..]));
    }

    #[test]
    fn test_local_name_absent() {
        let eir = [0x02, 0x01, 0x06];
        assert_eq!(local_name(&eir), None);
    }

    #[test]
    fn test_truncated_record_yields_prefix() {
        // Declared length runs past the end of the buffer
        let eir = [0x10, 0x09, b'S', b'p', b'e'];
        assert_eq!(local_name(&eir), Some(&b"Spe"[..]));
    }

    #[test]
    fn test_zero_length_field_terminates() {
        let eir = [0x00, 0x09, b'X'];
        assert_eq!(local_name(&eir), None);
    }

    #[test]
    fn test_filter_exact_match() {
        let filter = DeviceFilter::new("Speaker");
        let result = result_with_eir(SPEAKER_EIR);
        let peer = filter.evaluate(&result).unwrap();
        assert_eq!(peer.addr, result.addr);
        assert_eq!(peer.name.as_str(), "Speaker");
    }

    #[test]
    fn test_filter_rejects_other_names() {
        let filter = DeviceFilter::new("Speaker");
        let eir = [0x06, 0x09, b'P', b'h', b'o', b'n', b'e'];
        assert!(filter.evaluate(&result_with_eir(&eir)).is_none());
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        let filter = DeviceFilter::new("speaker");
        assert!(filter.evaluate(&result_with_eir(SPEAKER_EIR)).is_none());
    }

    #[test]
    fn test_filter_rejects_partial_prefix() {
        let filter = DeviceFilter::new("Speaker");
        let eir = [0x04, 0x09, b'S', b'p', b'e'];
        assert!(filter.evaluate(&result_with_eir(&eir)).is_none());
    }

    #[test]
    fn test_filter_treats_empty_name_as_non_matching() {
        // Name field truncated to zero length is not an error
        let filter = DeviceFilter::new("Speaker");
        let eir = [0x01, 0x09];
        assert!(filter.evaluate(&result_with_eir(&eir)).is_none());

        let empty_target = DeviceFilter::new("");
        assert!(empty_target.evaluate(&result_with_eir(&eir)).is_none());
    }
}
