use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum body length a single SMS may carry.
pub const DEFAULT_SMS_LENGTH_LIMIT: usize = 160;

/// Configuration for the keep-alive pinger.
///
/// The pinger opens a short-lived TCP connection to a well-known host so the
/// device's network path stays warm enough to receive push events promptly.
#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    /// Host to probe
    pub host: String,
    /// Port to probe
    pub port: u16,
    /// Fixed-rate interval between probes
    pub interval_ms: u64,
    /// Connect timeout for a single probe
    pub timeout_ms: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            host: "google.com".to_string(),
            port: 80,
            // 15 minutes
            interval_ms: 900_000,
            timeout_ms: 10_000,
        }
    }
}

impl KeepAliveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Connection settings for the remote job store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the document store (e.g. `https://pool.example.firebaseio.com`).
    /// When unset the node runs against an in-process store.
    pub base_url: Option<String>,
    /// Credential appended as the `auth` query parameter
    pub auth_token: Option<String>,
    /// Attempts before an optimistic transaction gives up
    pub max_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_token: None,
            max_retries: 25,
        }
    }
}

/// Settings for the external program that hands messages to the radio.
#[derive(Debug, Clone, Default)]
pub struct SmsConfig {
    /// Program invoked as `<program> <args...> <phone> <body>`.
    /// When unset the node cannot send SMS and skips every push.
    pub program: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub verifier_id: String,
    pub network_id: String,
    pub sms_length_limit: usize,
    pub device_token: Option<String>,
    pub listen_addr: SocketAddr,
    pub state_path: Option<PathBuf>,
    pub keepalive: KeepAliveConfig,
    pub store: StoreConfig,
    pub sms: SmsConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            verifier_id: "verifier-1".to_string(),
            network_id: "alfajores".to_string(),
            sms_length_limit: DEFAULT_SMS_LENGTH_LIMIT,
            device_token: None,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8645)),
            state_path: None,
            keepalive: KeepAliveConfig::default(),
            store: StoreConfig::default(),
            sms: SmsConfig::default(),
        }
    }
}

impl VerifierConfig {
    pub fn new(verifier_id: impl Into<String>, network_id: impl Into<String>) -> Self {
        Self {
            verifier_id: verifier_id.into(),
            network_id: network_id.into(),
            ..Default::default()
        }
    }

    pub fn with_device_token(mut self, token: impl Into<String>) -> Self {
        self.device_token = Some(token.into());
        self
    }

    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(path.into());
        self
    }

    pub fn with_keepalive(mut self, keepalive: KeepAliveConfig) -> Self {
        self.keepalive = keepalive;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keepalive_config_default() {
        let cfg = KeepAliveConfig::default();
        assert_eq!(cfg.host, "google.com");
        assert_eq!(cfg.port, 80);
        assert_eq!(cfg.interval(), Duration::from_secs(15 * 60));
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn store_config_default() {
        let cfg = StoreConfig::default();
        assert!(cfg.base_url.is_none());
        assert!(cfg.auth_token.is_none());
        assert_eq!(cfg.max_retries, 25);
    }

    #[test]
    fn sms_config_default_cannot_send() {
        let cfg = SmsConfig::default();
        assert!(cfg.program.is_none());
        assert!(cfg.args.is_empty());
    }

    #[test]
    fn verifier_config_default() {
        let cfg = VerifierConfig::default();
        assert_eq!(cfg.verifier_id, "verifier-1");
        assert_eq!(cfg.network_id, "alfajores");
        assert_eq!(cfg.sms_length_limit, 160);
        assert!(cfg.device_token.is_none());
        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:8645");
        assert!(cfg.state_path.is_none());
    }

    #[test]
    fn verifier_config_new() {
        let cfg = VerifierConfig::new("v42", "integration");
        assert_eq!(cfg.verifier_id, "v42");
        assert_eq!(cfg.network_id, "integration");
        assert_eq!(cfg.sms_length_limit, DEFAULT_SMS_LENGTH_LIMIT);
    }

    #[test]
    fn verifier_config_builders() {
        let cfg = VerifierConfig::default()
            .with_device_token("fcm-token")
            .with_state_path("/tmp/verifier.json")
            .with_keepalive(KeepAliveConfig {
                host: "127.0.0.1".to_string(),
                port: 9,
                interval_ms: 50,
                timeout_ms: 10,
            });
        assert_eq!(cfg.device_token.as_deref(), Some("fcm-token"));
        assert_eq!(cfg.state_path, Some(PathBuf::from("/tmp/verifier.json")));
        assert_eq!(cfg.keepalive.port, 9);
        assert_eq!(cfg.keepalive.interval(), Duration::from_millis(50));
    }
}
