//! Container runtime client
//!
//! Thin wrapper over the Docker API used for the live inventory, remote
//! introspection execs, and remote log retrieval. Everything above it talks
//! to the [`ContainerRuntime`] trait so remote behavior stays testable.

use super::{Container, ContainerInventory};
use async_trait::async_trait;
use bollard::container::ListContainersOptions;
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use bollard::Docker;
use futures_util::StreamExt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to connect to the container runtime: {0}")]
    Connect(#[source] bollard::errors::Error),

    #[error("Container listing failed: {0}")]
    List(#[source] bollard::errors::Error),

    #[error("Exec in container {container} failed: {source}")]
    Exec {
        container: String,
        #[source]
        source: bollard::errors::Error,
    },
}

/// Operations the topology resolver and remote probes need from a container
/// runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Running containers, normalized to the inventory model
    async fn list_containers(&self) -> Result<ContainerInventory, RuntimeError>;

    /// Run `cmd` inside `container` and capture its combined output
    async fn exec_capture(&self, container: &str, cmd: &[String]) -> Result<String, RuntimeError>;
}

/// [`ContainerRuntime`] backed by the local Docker daemon
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn connect() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults().map_err(RuntimeError::Connect)?;
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(&self) -> Result<ContainerInventory, RuntimeError> {
        let summaries = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await
            .map_err(RuntimeError::List)?;

        debug!(count = summaries.len(), "Listed running containers");
        Ok(ContainerInventory::new(
            summaries.into_iter().map(Container::from).collect(),
        ))
    }

    async fn exec_capture(&self, container: &str, cmd: &[String]) -> Result<String, RuntimeError> {
        let exec_err = |source| RuntimeError::Exec {
            container: container.to_string(),
            source,
        };

        let exec = self
            .docker
            .create_exec(
                container,
                CreateExecOptions {
                    cmd: Some(cmd.to_vec()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await
            .map_err(exec_err)?;

        let started = self
            .docker
            .start_exec(&exec.id, None::<StartExecOptions>)
            .await
            .map_err(exec_err)?;

        let mut captured = String::new();
        if let StartExecResults::Attached { mut output, .. } = started {
            while let Some(chunk) = output.next().await {
                captured.push_str(&chunk.map_err(exec_err)?.to_string());
            }
        }
        Ok(captured)
    }
}
