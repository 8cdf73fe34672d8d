//! Multi-address parsing and formatting.
//!
//! Wire form: `/ip4/<ipv4>/tcp/<port>/republic/<0x-address>`.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::identity::IdentityError;

const IP4_TAG: &str = "ip4";
const TCP_TAG: &str = "tcp";
const NODE_TAG: &str = "republic";

/// Network address of an overlay participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MultiAddress {
    ip: Ipv4Addr,
    port: u16,
    node: Address,
}

impl MultiAddress {
    pub fn new(ip: Ipv4Addr, port: u16, node: Address) -> Self {
        Self { ip, port, node }
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The node identity embedded in the address.
    pub fn address(&self) -> Address {
        self.node
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.ip, self.port))
    }

    /// Base URL for HTTP requests to this peer.
    pub fn http_base(&self) -> String {
        format!("http://{}", self.socket_addr())
    }
}

impl fmt::Display for MultiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{}/{}/{}/{}/{}/{}",
            IP4_TAG, self.ip, TCP_TAG, self.port, NODE_TAG, self.node
        )
    }
}

impl FromStr for MultiAddress {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |why: &str| IdentityError::AddressFormat(format!("'{}': {}", s, why));

        let parts: Vec<&str> = s.split('/').collect();
        let [empty, ip_tag, ip, tcp_tag, port, node_tag, node] = parts.as_slice() else {
            return Err(malformed("expected /ip4/<ip>/tcp/<port>/republic/<address>"));
        };
        if !empty.is_empty() || *ip_tag != IP4_TAG || *tcp_tag != TCP_TAG || *node_tag != NODE_TAG {
            return Err(malformed("expected /ip4/<ip>/tcp/<port>/republic/<address>"));
        }

        let ip: Ipv4Addr = ip.parse().map_err(|_| malformed("invalid IPv4 address"))?;
        let port: u16 = port.parse().map_err(|_| malformed("invalid TCP port"))?;
        if port == 0 {
            return Err(malformed("TCP port must be non-zero"));
        }
        let node: Address = node.parse().map_err(|_| malformed("invalid node address"))?;

        Ok(Self { ip, port, node })
    }
}

impl Serialize for MultiAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MultiAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_parse_and_display() {
        let s = format!("/ip4/203.0.113.5/tcp/18514/republic/{}", NODE);
        let addr: MultiAddress = s.parse().unwrap();

        assert_eq!(addr.ip(), Ipv4Addr::new(203, 0, 113, 5));
        assert_eq!(addr.port(), 18514);
        assert_eq!(addr.address(), NODE.parse::<Address>().unwrap());
        assert_eq!(addr.to_string(), s);
        assert_eq!(addr.http_base(), "http://203.0.113.5:18514");
    }

    #[test]
    fn test_rejects_malformed() {
        let cases = [
            "",
            "/ip4/203.0.113.5/tcp/18514",
            "/ip6/::1/tcp/18514/republic/0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "/ip4/203.0.113/tcp/18514/republic/0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "/ip4/203.0.113.5/tcp/port/republic/0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "/ip4/203.0.113.5/tcp/0/republic/0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "/ip4/203.0.113.5/tcp/18514/republic/0x123",
            "ip4/203.0.113.5/tcp/18514/republic/0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266/",
        ];
        for case in cases {
            let result = case.parse::<MultiAddress>();
            assert!(
                matches!(result, Err(IdentityError::AddressFormat(_))),
                "accepted {:?}",
                case
            );
        }
    }

    #[test]
    fn test_serde_as_string() {
        let s = format!("/ip4/10.0.0.1/tcp/80/republic/{}", NODE);
        let addr: MultiAddress = serde_json::from_str(&format!("\"{}\"", s)).unwrap();
        assert_eq!(serde_json::to_string(&addr).unwrap(), format!("\"{}\"", s));
    }
}
