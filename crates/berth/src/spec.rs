//! Workload specification.
//!
//! A workload spec is a small YAML document describing one container. It is
//! turned into the daemon's create-time configuration by
//! [`WorkloadSpec::container_configs`].

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

use berth_common::{BerthError, BerthResult};
use bollard::container::{Config, NetworkingConfig};
use bollard::models::{EndpointSettings, HostConfig, PortBinding};
use serde::{Deserialize, Serialize};

/// Network modes handled by the daemon itself rather than a named network.
const BUILTIN_NETWORK_MODES: &[&str] = &["bridge", "host", "none", "default"];

/// Workload specification (workload.yaml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    /// Image to run.
    pub image: String,

    /// Command override.
    #[serde(default)]
    pub command: Vec<String>,

    /// Entrypoint override.
    #[serde(default)]
    pub entrypoint: Vec<String>,

    /// Environment variables.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Container labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Working directory inside the container.
    #[serde(default)]
    pub working_dir: Option<String>,

    /// User to run as.
    #[serde(default)]
    pub user: Option<String>,

    /// Port mappings (`[host_ip:]host_port:container_port[/proto]` or `container_port[/proto]`).
    #[serde(default)]
    pub ports: Vec<String>,

    /// Bind mounts (`source:destination[:mode]`).
    #[serde(default)]
    pub volumes: Vec<String>,

    /// Network mode or name of a user-defined network.
    #[serde(default)]
    pub network: Option<String>,

    /// Grace period before the daemon kills the container on stop, in seconds.
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout: u64,
}

const fn default_stop_timeout() -> u64 {
    10
}

/// Everything the daemon needs to create one container.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerConfigs {
    /// Container configuration, without host or networking parts.
    pub config: Config<String>,
    /// Host configuration.
    pub host_config: HostConfig,
    /// Networking configuration, when attaching to a named network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networking_config: Option<NetworkingConfig<String>>,
    /// Stop grace period.
    #[serde(skip)]
    pub stop_timeout: Duration,
}

impl WorkloadSpec {
    /// Spec for `image` with defaults everywhere else.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            command: Vec::new(),
            entrypoint: Vec::new(),
            environment: BTreeMap::new(),
            labels: BTreeMap::new(),
            working_dir: None,
            user: None,
            ports: Vec::new(),
            volumes: Vec::new(),
            network: None,
            stop_timeout: default_stop_timeout(),
        }
    }

    /// Parse from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, WorkloadSpecError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse from file.
    pub fn from_file(path: &Path) -> Result<Self, WorkloadSpecError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Stop grace period.
    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout)
    }

    /// Derive the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BerthError::InvalidSpec`] if the image is empty or a port or
    /// volume entry cannot be parsed.
    pub fn container_configs(&self) -> BerthResult<ContainerConfigs> {
        let image = self.image.trim();
        if image.is_empty() {
            return Err(invalid("image must not be empty"));
        }

        let mut exposed_ports = HashMap::new();
        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
        for entry in &self.ports {
            let mapping = PortMapping::parse(entry)?;
            let key = mapping.key();
            exposed_ports.insert(key.clone(), HashMap::new());
            if let Some(binding) = mapping.binding() {
                port_bindings
                    .entry(key)
                    .or_insert_with(|| Some(Vec::new()))
                    .get_or_insert_with(Vec::new)
                    .push(binding);
            }
        }

        let binds = self
            .volumes
            .iter()
            .map(|volume| parse_bind(volume))
            .collect::<BerthResult<Vec<_>>>()?;

        let networking_config = self
            .network
            .as_ref()
            .filter(|network| is_named_network(network))
            .map(|network| NetworkingConfig {
                endpoints_config: HashMap::from([(network.clone(), EndpointSettings::default())]),
            });

        let host_config = HostConfig {
            binds: non_empty(binds),
            port_bindings: (!port_bindings.is_empty()).then_some(port_bindings),
            network_mode: self.network.clone(),
            ..Default::default()
        };

        let config = Config {
            image: Some(image.to_string()),
            cmd: non_empty(self.command.clone()),
            entrypoint: non_empty(self.entrypoint.clone()),
            env: non_empty(
                self.environment
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect(),
            ),
            labels: (!self.labels.is_empty())
                .then(|| self.labels.clone().into_iter().collect::<HashMap<_, _>>()),
            working_dir: self.working_dir.clone(),
            user: self.user.clone(),
            exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
            stop_timeout: Some(i64::try_from(self.stop_timeout).unwrap_or(i64::MAX)),
            ..Default::default()
        };

        Ok(ContainerConfigs {
            config,
            host_config,
            networking_config,
            stop_timeout: self.stop_timeout(),
        })
    }
}

/// One parsed `ports` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PortMapping {
    host_ip: Option<String>,
    host_port: Option<u16>,
    container_port: u16,
    protocol: String,
}

impl PortMapping {
    fn parse(entry: &str) -> BerthResult<Self> {
        let (addresses, protocol) = match entry.split_once('/') {
            Some((addresses, protocol)) => (addresses, protocol),
            None => (entry, "tcp"),
        };
        if !matches!(protocol, "tcp" | "udp" | "sctp") {
            return Err(invalid(format!("unknown protocol in port mapping '{entry}'")));
        }

        let port = |value: &str| {
            value
                .parse::<u16>()
                .map_err(|_| invalid(format!("invalid port '{value}' in mapping '{entry}'")))
        };

        // Split from the right so unbracketed IPv6 host addresses stay whole.
        let mut parts = addresses.rsplitn(3, ':');
        let container_port = port(parts.next().unwrap_or_default())?;
        let host_port = parts.next().map(port).transpose()?;
        let host_ip = parts
            .next()
            .map(|ip| ip.trim_start_matches('[').trim_end_matches(']').to_string());

        Ok(Self {
            host_ip,
            host_port,
            container_port,
            protocol: protocol.to_string(),
        })
    }

    fn key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol)
    }

    fn binding(&self) -> Option<PortBinding> {
        self.host_port.map(|host_port| PortBinding {
            host_ip: self.host_ip.clone(),
            host_port: Some(host_port.to_string()),
        })
    }
}

fn parse_bind(volume: &str) -> BerthResult<String> {
    let parts: Vec<&str> = volume.split(':').collect();
    let valid = match parts.as_slice() {
        [source, destination] => !source.is_empty() && destination.starts_with('/'),
        [source, destination, mode] => {
            !source.is_empty() && destination.starts_with('/') && !mode.is_empty()
        }
        _ => false,
    };

    if valid {
        Ok(volume.to_string())
    } else {
        Err(invalid(format!(
            "invalid volume '{volume}', expected source:/destination[:mode]"
        )))
    }
}

fn is_named_network(network: &str) -> bool {
    !BUILTIN_NETWORK_MODES.contains(&network) && !network.starts_with("container:")
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    (!values.is_empty()).then_some(values)
}

fn invalid(message: impl Into<String>) -> BerthError {
    BerthError::InvalidSpec {
        message: message.into(),
    }
}

/// Workload spec parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum WorkloadSpecError {
    /// I/O error.
    #[error("Failed to read workload spec: {0}")]
    Io(#[from] std::io::Error),
    /// Parse error.
    #[error("Failed to parse workload spec: {0}")]
    Parse(#[from] serde_yaml::Error),
}
