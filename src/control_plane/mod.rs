// src/control_plane/mod.rs
mod client;

pub use client::ClcClient;

use crate::error::RemoteError;
use crate::model::{Datacenter, Group, LoadBalancer, NewLoadBalancer, NewPool, Node, Pool, Server};
use async_trait::async_trait;

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// The remote primitives the reconciler relies on. There is no compare-and-
/// swap: every write blindly replaces remote state.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn get_datacenter(&self, dc: &str) -> RemoteResult<Datacenter>;

    async fn get_group(&self, id: &str) -> RemoteResult<Group>;

    async fn get_server(&self, name: &str) -> RemoteResult<Server>;

    async fn list_load_balancers(&self, dc: &str) -> RemoteResult<Vec<LoadBalancer>>;

    async fn get_load_balancer(&self, dc: &str, id: &str) -> RemoteResult<LoadBalancer>;

    async fn create_load_balancer(&self, dc: &str, lb: &NewLoadBalancer) -> RemoteResult<LoadBalancer>;

    async fn delete_load_balancer(&self, dc: &str, id: &str) -> RemoteResult<()>;

    async fn create_pool(&self, dc: &str, lb_id: &str, pool: &NewPool) -> RemoteResult<Pool>;

    async fn delete_pool(&self, dc: &str, lb_id: &str, pool_id: &str) -> RemoteResult<()>;

    /// Replace the full node list of a pool.
    async fn update_nodes(&self, dc: &str, lb_id: &str, pool_id: &str, nodes: &[Node]) -> RemoteResult<()>;
}
