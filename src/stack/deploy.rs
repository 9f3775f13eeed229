// ABOUTME: Staged deployment and teardown fan-out against the engine gateway.
// ABOUTME: Enforces start-order gating and per-service idempotence.

use crate::catalog::{Catalog, STACK_NETWORK, ServiceDefinition, ServiceKind};
use crate::runtime::{
    ContainerConfig, ContainerOps, ContainerState, NetworkConfig, NetworkOps, PortMapping,
};
use futures::future::join_all;
use std::collections::HashMap;
use std::time::Duration;

/// How long a stopped container gets to shut down before the engine kills it.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between polls while waiting for a stage group to come up.
const STAGE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Labels marking containers as managed by this tool.
fn managed_labels(kind: ServiceKind) -> HashMap<String, String> {
    HashMap::from([
        ("stackdock.managed".to_string(), "true".to_string()),
        ("stackdock.service".to_string(), kind.as_str().to_string()),
    ])
}

/// Deploy the whole stack, one stage group at a time.
///
/// Stages run in ascending order; within a stage every service launches
/// concurrently. A later stage is not started until every container of the
/// prior stage is running in the engine's bookkeeping sense - the process
/// exists, not that the service is ready.
///
/// Failures never propagate out: they are logged, and the poll loop derives
/// the resulting phase from whatever state the engine ends up in.
pub async fn deploy_stack<G>(
    gateway: &G,
    catalog: &Catalog,
    expose_ports: bool,
    poll_interval: Option<Duration>,
) where
    G: ContainerOps + NetworkOps,
{
    let network = NetworkConfig {
        name: STACK_NETWORK.to_string(),
        driver: Some("bridge".to_string()),
    };
    if let Err(e) = gateway.ensure_network(&network).await {
        tracing::warn!("failed to ensure network {}: {}", STACK_NETWORK, e);
        return;
    }

    let poll_interval = poll_interval.unwrap_or(STAGE_POLL_INTERVAL);

    for stage in catalog.stages().iter() {
        let launches = stage
            .services
            .iter()
            .map(|kind| deploy_service(gateway, catalog.get(*kind), expose_ports))
            .collect::<Vec<_>>();

        let results = join_all(launches).await;
        if results.iter().any(|ok| !ok) {
            tracing::warn!(
                "stage {} did not launch cleanly, deferring to the poll loop",
                stage.order
            );
            return;
        }

        if !wait_for_stage_running(gateway, &stage.services, poll_interval).await {
            return;
        }
    }
}

/// Launch one service if it is not already running.
///
/// A running container with the service's name is left alone; anything stale
/// under that name is removed first so the create cannot collide.
async fn deploy_service<G>(gateway: &G, def: &ServiceDefinition, expose_ports: bool) -> bool
where
    G: ContainerOps,
{
    let name = def.kind.as_str();

    match gateway.inspect_container(name).await {
        Ok(Some(info)) if info.state == ContainerState::Running => {
            tracing::debug!("{} already running, skipping", name);
            return true;
        }
        Ok(Some(_)) => {
            if let Err(e) = gateway.remove_container(name).await {
                tracing::warn!("failed to remove stale container {}: {}", name, e);
                return false;
            }
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!("inspect failed for {}: {}", name, e);
            return false;
        }
    }

    let ports = match (&def.run.port, expose_ports) {
        (Some(spec), true) => vec![PortMapping {
            host_port: spec.host_port,
            container_port: spec.container_port,
        }],
        _ => Vec::new(),
    };

    let config = ContainerConfig {
        name: name.to_string(),
        image: def.image.clone(),
        env: def.run.env.clone(),
        labels: managed_labels(def.kind),
        ports,
        memory_bytes: Some(def.run.memory_bytes),
        command: def.run.command.clone(),
        network: Some(STACK_NETWORK.to_string()),
    };

    let id = match gateway.create_container(&config).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("failed to create {}: {}", name, e);
            return false;
        }
    };

    if let Err(e) = gateway.start_container(&id).await {
        tracing::warn!("failed to start {}: {}", name, e);
        return false;
    }

    tracing::info!("started {}", name);
    true
}

/// Wait until every service in the group has a running container.
///
/// Gives up (returning false) when a container dies or disappears while
/// waiting - the next stage must not launch on a broken foundation, and the
/// poll loop will surface the failure as a phase change.
async fn wait_for_stage_running<G>(
    gateway: &G,
    services: &[ServiceKind],
    poll_interval: Duration,
) -> bool
where
    G: ContainerOps,
{
    loop {
        let mut all_running = true;

        for kind in services {
            let name = kind.as_str();
            match gateway.inspect_container(name).await {
                Ok(Some(info)) => match info.state {
                    ContainerState::Running => {}
                    ContainerState::Exited | ContainerState::Dead => {
                        tracing::warn!("{} {} while its stage was starting", name, info.status);
                        return false;
                    }
                    _ => all_running = false,
                },
                Ok(None) => {
                    // It was just created; if it vanished, someone tore the
                    // stack down underneath us
                    tracing::warn!("{} disappeared while its stage was starting", name);
                    return false;
                }
                Err(e) => {
                    tracing::debug!("inspect failed for {}: {}", name, e);
                    all_running = false;
                }
            }
        }

        if all_running {
            return true;
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Stop and remove (volumes included) every service that has a container.
///
/// Removal failures are logged, not surfaced: the poll loop re-derives the
/// phase from whatever containers remain.
pub async fn teardown_stack<G>(gateway: &G, catalog: &Catalog)
where
    G: ContainerOps,
{
    let teardowns = catalog
        .services()
        .iter()
        .map(|def| async move {
            let name = def.kind.as_str();

            let info = match gateway.inspect_container(name).await {
                Ok(Some(info)) => info,
                Ok(None) => return,
                Err(e) => {
                    tracing::debug!("inspect failed for {}: {}", name, e);
                    return;
                }
            };

            if info.state == ContainerState::Running {
                if let Err(e) = gateway.stop_container(&info.id, STOP_TIMEOUT).await {
                    tracing::warn!("failed to stop {}: {}", name, e);
                }
            }

            if let Err(e) = gateway.remove_container(name).await {
                tracing::warn!("failed to remove {}: {}", name, e);
            } else {
                tracing::info!("removed {}", name);
            }
        })
        .collect::<Vec<_>>();

    join_all(teardowns).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Profile};
    use crate::stack::testing::FakeGateway;
    use std::sync::Arc;

    fn catalog() -> Catalog {
        Catalog::for_profile(Profile::Community72)
    }

    fn all_names(catalog: &Catalog) -> Vec<&'static str> {
        catalog.services().iter().map(|s| s.kind.as_str()).collect()
    }

    #[tokio::test]
    async fn deploys_every_service_and_the_network() {
        let fake = FakeGateway::new();
        let catalog = catalog();

        deploy_stack(&fake, &catalog, false, None).await;

        assert!(fake.has_network(STACK_NETWORK));
        for name in all_names(&catalog) {
            assert_eq!(fake.container_state(name), Some(ContainerState::Running));
        }
    }

    #[tokio::test]
    async fn running_services_are_not_redeployed() {
        let fake = FakeGateway::new();
        let catalog = catalog();

        deploy_stack(&fake, &catalog, false, None).await;
        fake.clear_created_log();

        deploy_stack(&fake, &catalog, false, None).await;

        assert!(
            fake.created_log().is_empty(),
            "no create calls for already-running services"
        );
    }

    #[tokio::test]
    async fn stale_container_is_removed_before_create() {
        let fake = FakeGateway::new();
        let catalog = catalog();
        fake.insert_container("db", ContainerState::Exited);

        deploy_stack(&fake, &catalog, false, None).await;

        assert_eq!(fake.container_state("db"), Some(ContainerState::Running));
        assert_eq!(fake.created_log().iter().filter(|n| *n == "db").count(), 1);
    }

    #[tokio::test]
    async fn later_group_waits_for_prior_group_running() {
        let fake = Arc::new(FakeGateway::with_manual_start());
        let catalog = catalog();

        let task = {
            let fake = Arc::clone(&fake);
            let catalog = catalog.clone();
            tokio::spawn(async move {
                deploy_stack(
                    fake.as_ref(),
                    &catalog,
                    false,
                    Some(Duration::from_millis(5)),
                )
                .await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;

        // Group 0 launched, group 1 deferred while db/broker are only Created
        assert!(fake.has_container("db"));
        assert!(fake.has_container("broker"));
        assert!(!fake.has_container("transform"));
        assert!(!fake.has_container("search"));

        fake.set_state("db", ContainerState::Running);
        fake.set_state("broker", ContainerState::Running);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(fake.has_container("transform"));
        assert!(fake.has_container("search"));
        assert!(!fake.has_container("repository"));

        task.abort();
    }

    #[tokio::test]
    async fn deploy_aborts_when_a_service_dies_while_gating() {
        let fake = Arc::new(FakeGateway::with_manual_start());
        let catalog = catalog();

        let task = {
            let fake = Arc::clone(&fake);
            let catalog = catalog.clone();
            tokio::spawn(async move {
                deploy_stack(
                    fake.as_ref(),
                    &catalog,
                    false,
                    Some(Duration::from_millis(5)),
                )
                .await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        fake.set_state("db", ContainerState::Exited);
        fake.set_state("broker", ContainerState::Running);

        task.await.expect("deploy task finishes by aborting");
        assert!(!fake.has_container("transform"));
    }

    #[tokio::test]
    async fn teardown_stops_and_removes_everything() {
        let fake = FakeGateway::new();
        let catalog = catalog();
        deploy_stack(&fake, &catalog, false, None).await;

        teardown_stack(&fake, &catalog).await;

        for name in all_names(&catalog) {
            assert!(!fake.has_container(name), "{} should be removed", name);
        }
    }

    #[tokio::test]
    async fn teardown_tolerates_absent_containers() {
        let fake = FakeGateway::new();
        let catalog = catalog();
        fake.insert_container("db", ContainerState::Exited);

        // Only one of seven containers exists; the rest are no-ops
        teardown_stack(&fake, &catalog).await;

        assert!(!fake.has_container("db"));
    }
}
