//! Configuration loading for the CRTK client

use crate::codec::Codec;
use crate::{CrtkError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub node_name: String,
    pub transport: TransportConfig,
    pub codec: Codec,
    pub namespaces: NamespaceConfig,
    /// Pause after creating the handles so first samples can arrive
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Zenoh,
    Loopback,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Peer,
    Client,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Peer => "peer",
            SessionMode::Client => "client",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
    pub mode: SessionMode,
    /// Endpoints to connect to, e.g. `tcp/127.0.0.1:7447`
    pub connect: Vec<String>,
    pub listen: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NamespaceConfig {
    /// Prepended to every arm namespace, e.g. `/CRTK`
    pub arm_prefix: String,
    pub scene: String,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            arm_prefix: String::new(),
            scene: "/ambf/env".to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_name: "crtk_example_node".to_string(),
            transport: TransportConfig::default(),
            codec: Codec::default(),
            namespaces: NamespaceConfig::default(),
            settle_ms: 500,
        }
    }
}

impl ClientConfig {
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let path = config_path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| CrtkError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config_path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(config_path: impl AsRef<Path>) -> Result<Self> {
        if config_path.as_ref().exists() {
            Self::load(config_path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.node_name.trim().is_empty() {
            return Err(CrtkError::Config("node_name must not be empty".to_string()));
        }
        for (field, ns) in [
            ("namespaces.arm_prefix", &self.namespaces.arm_prefix),
            ("namespaces.scene", &self.namespaces.scene),
        ] {
            if !ns.is_empty() && (!ns.starts_with('/') || ns.ends_with('/')) {
                return Err(CrtkError::Config(format!(
                    "{} must start with '/' and not end with '/', got {:?}",
                    field, ns
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = ClientConfig::from_yaml("transport:\n  kind: loopback\n").unwrap();
        assert_eq!(config.transport.kind, TransportKind::Loopback);
        assert_eq!(config.transport.mode, SessionMode::Peer);
        assert_eq!(config.codec, Codec::Json);
        assert_eq!(config.namespaces.scene, "/ambf/env");
        assert_eq!(config.settle_ms, 500);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
node_name: my_node
transport:
  kind: zenoh
  mode: client
  connect: ["tcp/10.0.0.2:7447"]
codec: cbor
namespaces:
  arm_prefix: /CRTK
  scene: /ambf/env
settle_ms: 100
"#;
        let config = ClientConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.node_name, "my_node");
        assert_eq!(config.transport.mode, SessionMode::Client);
        assert_eq!(config.transport.connect, vec!["tcp/10.0.0.2:7447".to_string()]);
        assert_eq!(config.codec, Codec::Cbor);
        assert_eq!(config.namespaces.arm_prefix, "/CRTK");
        assert_eq!(config.settle_ms, 100);
    }

    #[test]
    fn test_trailing_slash_namespace_rejected() {
        let result = ClientConfig::from_yaml("namespaces:\n  scene: /ambf/env/\n");
        assert!(matches!(result, Err(CrtkError::Config(_))));
    }

    #[test]
    fn test_unknown_transport_kind_rejected() {
        let result = ClientConfig::from_yaml("transport:\n  kind: carrier-pigeon\n");
        assert!(matches!(result, Err(CrtkError::Yaml(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ClientConfig::load_or_default("does/not/exist.yaml").unwrap();
        assert_eq!(config.node_name, "crtk_example_node");
    }
}
