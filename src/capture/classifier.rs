use log::{log_enabled, trace, Level};
use pnet::packet::ethernet::{EtherType, EtherTypes, EthernetPacket};

use crate::models::filter::FilterState;

/// Non-IP protocols with their own visibility toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonIpProtocol {
    Arp,
    Rarp,
    /// Anything else carried directly over the link layer
    Other(EtherType),
}

impl From<EtherType> for NonIpProtocol {
    fn from(ethertype: EtherType) -> Self {
        match ethertype {
            EtherTypes::Arp => NonIpProtocol::Arp,
            EtherTypes::Rarp => NonIpProtocol::Rarp,
            other => NonIpProtocol::Other(other),
        }
    }
}

impl From<u16> for NonIpProtocol {
    fn from(id: u16) -> Self {
        NonIpProtocol::from(EtherType::new(id))
    }
}

/// Whether a non-IP packet of the given protocol should be shown
#[inline]
pub fn classify(state: &FilterState, protocol: impl Into<NonIpProtocol>) -> bool {
    match protocol.into() {
        NonIpProtocol::Arp => state.arp,
        NonIpProtocol::Rarp => state.rarp,
        NonIpProtocol::Other(_) => state.non_ip,
    }
}

/// Decide visibility of a raw Ethernet II frame.
///
/// Returns `None` for IPv4/IPv6 frames, which the IP filter decides, and for
/// frames too short to carry an Ethernet header.
pub fn classify_frame(state: &FilterState, frame: &[u8]) -> Option<bool> {
    let eth_packet = EthernetPacket::new(frame)?;
    let ethertype = eth_packet.get_ethertype();

    match ethertype {
        EtherTypes::Ipv4 | EtherTypes::Ipv6 => None,
        _ => {
            let visible = classify(state, ethertype);
            if log_enabled!(Level::Trace) {
                trace!("EtherType: {:?}, visible: {}", ethertype, visible);
            }
            Some(visible)
        }
    }
}
