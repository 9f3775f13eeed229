// ABOUTME: Static service catalog: the fixed stack topology per deployment profile.
// ABOUTME: Service definitions, run specs, start-order stages, probe policies.

mod profiles;

pub use profiles::Profile;

use crate::probe::ProbePolicy;
use crate::types::ImageRef;
use nonempty::NonEmpty;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Name of the private bridge network every stack container joins.
pub const STACK_NETWORK: &str = "stackdock";

/// The closed set of services making up the stack.
///
/// `as_str()` doubles as the container name and the DNS name other services
/// use to reach it on the stack network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    Db,
    Broker,
    Search,
    Transform,
    Repository,
    Proxy,
    WebApp,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Db => "db",
            ServiceKind::Broker => "broker",
            ServiceKind::Search => "search",
            ServiceKind::Transform => "transform",
            ServiceKind::Repository => "repository",
            ServiceKind::Proxy => "proxy",
            ServiceKind::WebApp => "web-app",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A host-port publication a service offers when ports are exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub host_port: u16,
    pub container_port: u16,
}

/// Runtime options for launching one service container.
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// Environment variables, in the order they are passed to the engine.
    pub env: Vec<(String, String)>,
    /// Memory limit in bytes.
    pub memory_bytes: u64,
    /// Host-port publication, applied only when the operator exposes ports.
    pub port: Option<PortSpec>,
    /// Command override (None uses the image CMD).
    pub command: Option<Vec<String>>,
}

/// One member of the stack topology.
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    pub kind: ServiceKind,
    pub image: ImageRef,
    pub run: RunSpec,
    /// Start-order group: lower groups must be running before higher groups
    /// are deployed.
    pub start_group: u8,
    pub probe: ProbePolicy,
}

/// Services that may be deployed concurrently, in deployment order.
#[derive(Debug, Clone)]
pub struct StageGroup {
    pub order: u8,
    pub services: Vec<ServiceKind>,
}

/// The resolved catalog for a profile: the ordered service list plus the
/// precomputed ascending stage groups.
#[derive(Debug, Clone)]
pub struct Catalog {
    profile: Profile,
    services: Vec<ServiceDefinition>,
    stages: NonEmpty<StageGroup>,
}

impl Catalog {
    /// Resolve the catalog for a deployment profile.
    ///
    /// Stage groups are computed here, once, rather than re-derived from the
    /// flat `start_group` fields on every deploy.
    pub fn for_profile(profile: Profile) -> Self {
        let services = profiles::definitions(profile);

        let mut orders: Vec<u8> = services.iter().map(|s| s.start_group).collect();
        orders.sort_unstable();
        orders.dedup();

        let groups: Vec<StageGroup> = orders
            .into_iter()
            .map(|order| StageGroup {
                order,
                services: services
                    .iter()
                    .filter(|s| s.start_group == order)
                    .map(|s| s.kind)
                    .collect(),
            })
            .collect();

        let stages = NonEmpty::from_vec(groups)
            .expect("a profile always defines at least one service");

        Self {
            profile,
            services,
            stages,
        }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Services in catalog order (the order observations are rendered in).
    pub fn services(&self) -> &[ServiceDefinition] {
        &self.services
    }

    /// Stage groups in ascending deployment order.
    pub fn stages(&self) -> &NonEmpty<StageGroup> {
        &self.stages
    }

    pub fn get(&self, kind: ServiceKind) -> &ServiceDefinition {
        self.services
            .iter()
            .find(|s| s.kind == kind)
            .expect("catalog contains every service kind it stages")
    }

    /// All image references in the catalog, in catalog order.
    pub fn images(&self) -> Vec<ImageRef> {
        self.services.iter().map(|s| s.image.clone()).collect()
    }
}

/// Error for an unrecognized profile name on the CLI.
#[derive(Debug, thiserror::Error)]
#[error("unknown profile: {0}")]
pub struct UnknownProfile(pub String);

impl FromStr for Profile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "community-7.2" => Ok(Profile::Community72),
            other => Err(UnknownProfile(other.to_string())),
        }
    }
}
