// ABOUTME: In-memory fake gateway backing orchestrator unit tests.
// ABOUTME: A programmable container/image world with a call log for assertions.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::{
    ContainerConfig, ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerState,
    ContainerSummary, ExecConfig, ExecError, ExecOps, ExecResult, ImageError, ImageOps,
    ImageSummary, NetworkConfig, NetworkError, NetworkOps,
};
use crate::types::{ContainerId, ImageRef, NetworkId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Debug, Clone)]
struct FakeContainer {
    id: String,
    image: String,
    state: ContainerState,
    host_ports: HashMap<u16, u16>,
}

#[derive(Default)]
struct World {
    containers: HashMap<String, FakeContainer>,
    images: HashSet<String>,
    networks: HashSet<String>,
    /// Container names whose readiness probes pass.
    probe_ok: HashSet<String>,
    /// Image references whose pulls fail.
    deny_pull: HashSet<String>,
    /// When false, started containers stay in Created until a test promotes
    /// them, simulating slow startup.
    auto_start: bool,
    /// Names passed to create_container, in call order.
    created_log: Vec<String>,
    next_id: u64,
}

/// A fake engine gateway over a mutable in-memory world.
pub struct FakeGateway {
    world: Mutex<World>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            world: Mutex::new(World {
                auto_start: true,
                ..Default::default()
            }),
        }
    }

    pub fn with_manual_start() -> Self {
        let fake = Self::new();
        fake.world.lock().auto_start = false;
        fake
    }

    pub fn add_image(&self, reference: &str) {
        self.world.lock().images.insert(reference.to_string());
    }

    pub fn deny_pull(&self, reference: &str) {
        self.world.lock().deny_pull.insert(reference.to_string());
    }

    pub fn insert_container(&self, name: &str, state: ContainerState) {
        let mut world = self.world.lock();
        world.next_id += 1;
        let id = format!("fake-{:08x}", world.next_id);
        world.containers.insert(
            name.to_string(),
            FakeContainer {
                id,
                image: String::new(),
                state,
                host_ports: HashMap::new(),
            },
        );
    }

    pub fn set_state(&self, name: &str, state: ContainerState) {
        if let Some(c) = self.world.lock().containers.get_mut(name) {
            c.state = state;
        }
    }

    pub fn pass_probe(&self, name: &str) {
        self.world.lock().probe_ok.insert(name.to_string());
    }

    pub fn pass_all_probes(&self) {
        let mut world = self.world.lock();
        let names: Vec<String> = world.containers.keys().cloned().collect();
        world.probe_ok.extend(names);
    }

    pub fn has_container(&self, name: &str) -> bool {
        self.world.lock().containers.contains_key(name)
    }

    pub fn container_state(&self, name: &str) -> Option<ContainerState> {
        self.world.lock().containers.get(name).map(|c| c.state)
    }

    pub fn created_log(&self) -> Vec<String> {
        self.world.lock().created_log.clone()
    }

    pub fn clear_created_log(&self) {
        self.world.lock().created_log.clear();
    }

    pub fn has_network(&self, name: &str) -> bool {
        self.world.lock().networks.contains(name)
    }

    fn info_for(name: &str, c: &FakeContainer) -> ContainerInfo {
        ContainerInfo {
            id: ContainerId::new(c.id.clone()),
            name: name.to_string(),
            image: c.image.clone(),
            state: c.state,
            status: format!("{:?}", c.state).to_lowercase(),
            host_ports: c.host_ports.clone(),
        }
    }
}

impl Sealed for FakeGateway {}

#[async_trait]
impl ContainerOps for FakeGateway {
    async fn inspect_container(
        &self,
        name: &str,
    ) -> Result<Option<ContainerInfo>, ContainerError> {
        let world = self.world.lock();
        Ok(world
            .containers
            .get(name)
            .map(|c| Self::info_for(name, c)))
    }

    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let mut world = self.world.lock();
        if world.containers.contains_key(&config.name) {
            return Err(ContainerError::AlreadyExists(config.name.clone()));
        }

        world.next_id += 1;
        let id = format!("fake-{:08x}", world.next_id);
        let host_ports = config
            .ports
            .iter()
            .map(|p| (p.container_port, p.host_port))
            .collect();

        world.created_log.push(config.name.clone());
        world.containers.insert(
            config.name.clone(),
            FakeContainer {
                id: id.clone(),
                image: config.image.to_string(),
                state: ContainerState::Created,
                host_ports,
            },
        );

        Ok(ContainerId::new(id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut world = self.world.lock();
        let auto_start = world.auto_start;
        let container = world
            .containers
            .values_mut()
            .find(|c| c.id == id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;

        if auto_start {
            container.state = ContainerState::Running;
        }
        Ok(())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        let mut world = self.world.lock();
        let container = world
            .containers
            .values_mut()
            .find(|c| c.id == id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;

        container.state = ContainerState::Exited;
        Ok(())
    }

    async fn remove_container(&self, name: &str) -> Result<(), ContainerError> {
        let mut world = self.world.lock();
        if let Some(c) = world.containers.get(name)
            && c.state == ContainerState::Running
        {
            return Err(ContainerError::Engine(format!(
                "cannot remove running container {}",
                name
            )));
        }
        world.containers.remove(name);
        Ok(())
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let world = self.world.lock();
        Ok(world
            .containers
            .iter()
            .filter(|(name, c)| {
                (filters.all || c.state == ContainerState::Running)
                    && filters
                        .name
                        .as_ref()
                        .is_none_or(|wanted| name.contains(wanted.as_str()))
            })
            .map(|(name, c)| ContainerSummary {
                id: ContainerId::new(c.id.clone()),
                name: name.clone(),
                image: c.image.clone(),
                state: format!("{:?}", c.state).to_lowercase(),
                status: format!("{:?}", c.state).to_lowercase(),
            })
            .collect())
    }
}

#[async_trait]
impl ImageOps for FakeGateway {
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        let mut world = self.world.lock();
        let name = reference.to_string();
        if world.deny_pull.contains(&name) {
            return Err(ImageError::PullFailed(name));
        }
        world.images.insert(name);
        Ok(())
    }

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        Ok(self.world.lock().images.contains(&reference.to_string()))
    }

    async fn list_images(&self, references: &[ImageRef]) -> Result<Vec<ImageSummary>, ImageError> {
        let world = self.world.lock();
        Ok(references
            .iter()
            .map(|r| r.to_string())
            .filter(|r| world.images.contains(r))
            .map(|r| ImageSummary { repo_tags: vec![r] })
            .collect())
    }
}

#[async_trait]
impl NetworkOps for FakeGateway {
    async fn ensure_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError> {
        self.world.lock().networks.insert(config.name.clone());
        Ok(NetworkId::new(config.name.clone()))
    }

    async fn network_exists(&self, name: &str) -> Result<bool, NetworkError> {
        Ok(self.world.lock().networks.contains(name))
    }
}

#[async_trait]
impl ExecOps for FakeGateway {
    async fn exec(&self, container: &str, _config: &ExecConfig) -> Result<ExecResult, ExecError> {
        let world = self.world.lock();
        let c = world
            .containers
            .get(container)
            .ok_or_else(|| ExecError::ContainerNotFound(container.to_string()))?;
        if c.state != ContainerState::Running {
            return Err(ExecError::ContainerNotRunning(container.to_string()));
        }

        // A passing probe answers like the real ones do: HTTP probes read the
        // stdout text, the query probe reads the exit code
        if world.probe_ok.contains(container) {
            Ok(ExecResult {
                exit_code: 0,
                stdout: b"200".to_vec(),
                stderr: Vec::new(),
            })
        } else {
            Ok(ExecResult {
                exit_code: 1,
                stdout: Vec::new(),
                stderr: b"connection refused".to_vec(),
            })
        }
    }
}
