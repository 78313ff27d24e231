//! Network join for host targets.
//!
//! On a device, joining means associating with an access point and waiting
//! for an address lease. On a host the operating system owns the link, so
//! joining resolves the peer and discovers which local address routes to
//! it. Either way the step either yields an address or fails with an error
//! the caller can retry.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use magbridge_core::{ClientConfig, NetworkConfig};

/// Errors that can occur while joining the network.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The peer host name could not be resolved.
    #[error("Failed to resolve {host}: {source}")]
    Resolve { host: String, source: io::Error },

    /// Resolution succeeded but returned no addresses.
    #[error("No address found for {0}")]
    NoAddress(String),

    /// No local route to the peer.
    #[error("No route to {peer}: {source}")]
    Unreachable { peer: SocketAddr, source: io::Error },
}

/// Result of a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinInfo {
    /// Local address used to reach the peer.
    pub local_addr: IpAddr,
    /// Resolved peer address.
    pub peer_addr: SocketAddr,
}

/// Join the network and acquire a local address for reaching the peer.
///
/// No packets are sent; the UDP socket is only connected to let the
/// operating system pick a route.
pub async fn join_network(
    network: &NetworkConfig,
    client: &ClientConfig,
) -> Result<JoinInfo, NetworkError> {
    if network.ssid.is_empty() {
        debug!("No SSID configured, using host network");
    } else {
        info!("Joining network '{}'", network.ssid);
    }

    let peer_addr = tokio::net::lookup_host((client.host.as_str(), client.port))
        .await
        .map_err(|source| NetworkError::Resolve {
            host: client.host.clone(),
            source,
        })?
        .next()
        .ok_or_else(|| NetworkError::NoAddress(client.host.clone()))?;

    let unspecified = if peer_addr.is_ipv4() {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
    } else {
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
    };

    let unreachable = |source| NetworkError::Unreachable {
        peer: peer_addr,
        source,
    };
    let socket = UdpSocket::bind(unspecified).await.map_err(unreachable)?;
    socket.connect(peer_addr).await.map_err(unreachable)?;
    let local_addr = socket.local_addr().map_err(unreachable)?.ip();

    info!("Network up");
    info!("  Local address: {}", local_addr);
    info!("  Peer:          {}", peer_addr);

    Ok(JoinInfo {
        local_addr,
        peer_addr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_loopback() {
        let client = ClientConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Default::default()
        };
        let info = join_network(&NetworkConfig::default(), &client).await.unwrap();
        assert_eq!(info.peer_addr, "127.0.0.1:3000".parse().unwrap());
        assert!(info.local_addr.is_loopback());
    }

    #[tokio::test]
    async fn test_join_unresolvable_host() {
        let client = ClientConfig {
            host: "host.invalid".to_string(),
            ..Default::default()
        };
        let err = join_network(&NetworkConfig::default(), &client).await.unwrap_err();
        assert!(matches!(err, NetworkError::Resolve { .. } | NetworkError::NoAddress(_)));
    }
}
