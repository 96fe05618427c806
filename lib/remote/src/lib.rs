//! Collaborator adapters for the flowdeck workflow canvas.
//!
//! - **Execution**: [`HttpExecutionClient`] posts graphs to the execution service
//! - **Agent catalog**: [`HttpAgentCatalog`] fetches the node palette
//! - **Persistence**: [`FileWorkflowStore`] keeps one JSON document per workflow
//! - **Configuration**: [`RemoteConfig`] loads endpoints and paths from the environment

pub mod catalog;
pub mod config;
pub mod execution;
pub mod store;

#[cfg(test)]
mod test_server;

pub use catalog::HttpAgentCatalog;
pub use config::{LayoutSettings, RemoteConfig, ServiceConfig, StoreConfig};
pub use execution::HttpExecutionClient;
pub use store::FileWorkflowStore;
