//! Fixed-size binary image of a [`FilterState`].
//!
//! Layout, in order: `arp`, `rarp`, `non_ip` (one byte each, 0 or 1), the
//! IP filter name (NUL-padded, [`NAME_CAPACITY`] bytes), the active flag
//! (one byte), the rule payload length (little-endian `u32`) and the rule
//! payload ([`RULES_CAPACITY`] bytes, zero-padded). There is no version
//! field; anything that does not decode cleanly is rejected.

use thiserror::Error;

use crate::models::filter::{
    FilterName, FilterState, IpFilter, IpFilterRules, NAME_CAPACITY, RULES_CAPACITY,
};

const FLAGS_OFFSET: usize = 0;
const NAME_OFFSET: usize = FLAGS_OFFSET + 3;
const ACTIVE_OFFSET: usize = NAME_OFFSET + NAME_CAPACITY;
const RULES_LEN_OFFSET: usize = ACTIVE_OFFSET + 1;
const RULES_OFFSET: usize = RULES_LEN_OFFSET + 4;

/// Size of every snapshot, in bytes
pub const SNAPSHOT_LEN: usize = RULES_OFFSET + RULES_CAPACITY;

/// Serialize `state` into a snapshot
pub fn encode(state: &FilterState) -> Vec<u8> {
    let mut buf = vec![0u8; SNAPSHOT_LEN];
    buf[FLAGS_OFFSET] = state.arp as u8;
    buf[FLAGS_OFFSET + 1] = state.rarp as u8;
    buf[FLAGS_OFFSET + 2] = state.non_ip as u8;

    if let Some(filter) = state.ip_filter() {
        let name = filter.name.as_str().as_bytes();
        buf[NAME_OFFSET..NAME_OFFSET + name.len()].copy_from_slice(name);
        buf[ACTIVE_OFFSET] = 1;

        // FilterName and IpFilterRules enforce the capacities
        let rules = filter.rules.as_bytes();
        buf[RULES_LEN_OFFSET..RULES_OFFSET].copy_from_slice(&(rules.len() as u32).to_le_bytes());
        buf[RULES_OFFSET..RULES_OFFSET + rules.len()].copy_from_slice(rules);
    }

    buf
}

/// Why a snapshot was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Byte count differs from [`SNAPSHOT_LEN`]
    #[error("snapshot is {0} bytes, expected {}", SNAPSHOT_LEN)]
    WrongSize(usize),

    /// A flag byte other than 0 or 1
    #[error("invalid flag value {value} at offset {offset}")]
    BadFlag { offset: usize, value: u8 },

    /// Name is not NUL-padded UTF-8
    #[error("IP filter name is not valid UTF-8")]
    BadName,

    /// Active flag set without a usable name
    #[error("IP filter marked active without a name")]
    MissingName,

    /// Rule length exceeds the payload area
    #[error("rule payload length {0} exceeds {}", RULES_CAPACITY)]
    BadRulesLength(usize),
}

fn flag(buf: &[u8], offset: usize) -> Result<bool, DecodeError> {
    match buf[offset] {
        0 => Ok(false),
        1 => Ok(true),
        value => Err(DecodeError::BadFlag { offset, value }),
    }
}

/// Rebuild a [`FilterState`] from a snapshot
pub fn decode(buf: &[u8]) -> Result<FilterState, DecodeError> {
    if buf.len() != SNAPSHOT_LEN {
        return Err(DecodeError::WrongSize(buf.len()));
    }

    let mut state = FilterState::new();
    state.arp = flag(buf, FLAGS_OFFSET)?;
    state.rarp = flag(buf, FLAGS_OFFSET + 1)?;
    state.non_ip = flag(buf, FLAGS_OFFSET + 2)?;

    if !flag(buf, ACTIVE_OFFSET)? {
        return Ok(state);
    }

    let raw_name = &buf[NAME_OFFSET..ACTIVE_OFFSET];
    let end = raw_name.iter().position(|&b| b == 0).unwrap_or(raw_name.len());
    if raw_name[end..].iter().any(|&b| b != 0) {
        return Err(DecodeError::BadName);
    }
    let name = std::str::from_utf8(&raw_name[..end]).map_err(|_| DecodeError::BadName)?;
    let name = FilterName::new(name).map_err(|_| DecodeError::MissingName)?;

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&buf[RULES_LEN_OFFSET..RULES_OFFSET]);
    let rules_len = u32::from_le_bytes(len_bytes) as usize;
    if rules_len > RULES_CAPACITY {
        return Err(DecodeError::BadRulesLength(rules_len));
    }
    let rules = IpFilterRules::new(&buf[RULES_OFFSET..RULES_OFFSET + rules_len])
        .map_err(|_| DecodeError::BadRulesLength(rules_len))?;

    state.set_ip_filter(Some(IpFilter { name, rules }));
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_filter(name: &str, rules: &[u8]) -> FilterState {
        let mut state = FilterState::new();
        state.set_ip_filter(Some(IpFilter {
            name: FilterName::new(name).unwrap(),
            rules: IpFilterRules::new(rules.to_vec()).unwrap(),
        }));
        state
    }

    #[test]
    fn test_snapshot_size_is_fixed() {
        assert_eq!(SNAPSHOT_LEN, 3 + NAME_CAPACITY + 1 + 4 + RULES_CAPACITY);
        assert_eq!(encode(&FilterState::new()).len(), SNAPSHOT_LEN);
        assert_eq!(encode(&with_filter("web-only", &[7u8; RULES_CAPACITY])).len(), SNAPSHOT_LEN);
    }

    #[test]
    fn test_field_layout() {
        let mut state = with_filter("web", b"xyz");
        state.rarp = true;
        let buf = encode(&state);
        assert_eq!(&buf[0..3], &[0, 1, 0]);
        assert_eq!(&buf[NAME_OFFSET..NAME_OFFSET + 4], b"web\0");
        assert_eq!(buf[ACTIVE_OFFSET], 1);
        assert_eq!(&buf[RULES_LEN_OFFSET..RULES_OFFSET], &3u32.to_le_bytes());
        assert_eq!(&buf[RULES_OFFSET..RULES_OFFSET + 3], b"xyz");
    }

    #[test]
    fn test_decode_restores_every_field() {
        let mut state = with_filter("web-only", b"tcp 80");
        state.arp = true;
        state.non_ip = true;
        assert_eq!(decode(&encode(&state)).unwrap(), state);
    }

    #[test]
    fn test_decode_rejects_wrong_sizes() {
        let buf = encode(&FilterState::new());
        assert_eq!(decode(&buf[..100]), Err(DecodeError::WrongSize(100)));
        let mut longer = buf.clone();
        longer.push(0);
        assert_eq!(decode(&longer), Err(DecodeError::WrongSize(SNAPSHOT_LEN + 1)));
        assert_eq!(decode(&[]), Err(DecodeError::WrongSize(0)));
    }

    #[test]
    fn test_decode_rejects_garbage_flags() {
        let mut buf = encode(&FilterState::new());
        buf[1] = 0xff;
        assert_eq!(decode(&buf), Err(DecodeError::BadFlag { offset: 1, value: 0xff }));
    }

    #[test]
    fn test_decode_rejects_active_flag_without_name() {
        let mut buf = encode(&FilterState::new());
        buf[ACTIVE_OFFSET] = 1;
        assert_eq!(decode(&buf), Err(DecodeError::MissingName));
    }

    #[test]
    fn test_decode_rejects_oversized_rule_length() {
        let mut buf = encode(&with_filter("web", b""));
        buf[RULES_LEN_OFFSET..RULES_OFFSET].copy_from_slice(&(RULES_CAPACITY as u32 + 1).to_le_bytes());
        assert_eq!(decode(&buf), Err(DecodeError::BadRulesLength(RULES_CAPACITY + 1)));
    }

    #[test]
    fn test_inactive_filter_ignores_name_area() {
        let mut buf = encode(&FilterState::new());
        buf[NAME_OFFSET] = b'x';
        assert_eq!(decode(&buf).unwrap(), FilterState::new());
    }
}
