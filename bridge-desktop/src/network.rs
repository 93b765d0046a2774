//! Network Monitoring Implementation

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    network::{NetworkInfo, NetworkMonitor, NetworkStatus, NetworkType},
};
use std::time::Duration;
use tracing::debug;

const DEFAULT_CHECK_ADDR: &str = "8.8.8.8:53";
const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Desktop network monitor implementation
///
/// Reports connectivity by opening a TCP connection to a well-known
/// endpoint. Desktop links are treated as unmetered.
///
/// Note: Platform-specific implementations (Linux netlink, macOS SystemConfiguration,
/// Windows WinAPI) would be more robust but require additional dependencies.
pub struct DesktopNetworkMonitor {
    check_addr: String,
    check_timeout: Duration,
}

impl DesktopNetworkMonitor {
    /// Create a new network monitor
    pub fn new() -> Self {
        Self {
            check_addr: DEFAULT_CHECK_ADDR.to_string(),
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    /// Check a different `host:port`, e.g. the IPTV panel itself.
    pub fn with_check_target(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            check_addr: addr.into(),
            check_timeout: timeout,
        }
    }

    async fn check_connectivity(&self) -> NetworkStatus {
        match tokio::time::timeout(
            self.check_timeout,
            tokio::net::TcpStream::connect(self.check_addr.as_str()),
        )
        .await
        {
            Ok(Ok(_)) => NetworkStatus::Connected,
            Ok(Err(_)) => NetworkStatus::Disconnected,
            Err(_) => NetworkStatus::Disconnected,
        }
    }
}

impl Default for DesktopNetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkMonitor for DesktopNetworkMonitor {
    async fn get_network_info(&self) -> Result<NetworkInfo> {
        let status = self.check_connectivity().await;
        debug!(status = ?status, target = %self.check_addr, "Network info updated");

        Ok(match status {
            // Ethernet and WiFi are indistinguishable without platform APIs
            NetworkStatus::Connected => NetworkInfo::connected(NetworkType::Other),
            _ => NetworkInfo::disconnected(),
        })
    }

    async fn is_metered(&self) -> bool {
        false
    }
}
