// Container inventory, runtime client, and topology resolution

pub mod inventory;
pub mod runtime;
pub mod topology;

pub use inventory::{Container, ContainerInventory, PortMapping};
pub use runtime::{ContainerRuntime, DockerRuntime, RuntimeError};
pub use topology::TopologyResolver;
