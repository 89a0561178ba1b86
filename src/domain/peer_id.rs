//! Type-safe peer identifier.
//!
//! [`PeerId`] names one live WebSocket connection. It is derived from the
//! remote socket address at registration time, which the TCP layer keeps
//! unique among concurrently open connections.

use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Identifier of a connected peer, e.g. `"203.0.113.7:51544"`.
///
/// Used as the key of the hub's membership map. Ordered so that
/// broadcast enumerates peers in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Builds the identifier from the peer's remote address.
    #[must_use]
    pub fn from_remote_addr(addr: SocketAddr) -> Self {
        Self(addr.to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SocketAddr> for PeerId {
    fn from(addr: SocketAddr) -> Self {
        Self::from_remote_addr(addr)
    }
}

impl From<&str> for PeerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn derived_from_remote_address() {
        let Ok(addr) = "127.0.0.1:4000".parse::<SocketAddr>() else {
            panic!("valid socket address");
        };
        let id = PeerId::from_remote_addr(addr);
        assert_eq!(id.as_str(), "127.0.0.1:4000");
        assert_eq!(id.to_string(), "127.0.0.1:4000");
    }

    #[test]
    fn distinct_ports_give_distinct_ids() {
        let a = PeerId::from("10.0.0.1:1000");
        let b = PeerId::from("10.0.0.1:1001");
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = PeerId::from("[::1]:9000");
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"[::1]:9000\"");
    }
}
