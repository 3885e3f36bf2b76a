// src/model/resources.rs
//
// Shared load balancer resources as the control plane represents them.
//
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub pools: Vec<Pool>,
}

impl LoadBalancer {
    /// A balancer with no pools counts as empty too.
    pub fn all_pools_empty(&self) -> bool {
        self.pools.iter().all(Pool::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub port: u16,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub persistence: Option<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Pool {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A backend target. Two nodes are the same target iff address and port
/// both match; `status` is carried through so full-list writes keep it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub ip_address: IpAddr,
    pub private_port: u16,
}

impl Node {
    pub fn new(ip_address: IpAddr, private_port: u16) -> Self {
        Self {
            status: None,
            ip_address,
            private_port,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ip_address == other.ip_address && self.private_port == other.private_port
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ip_address.hash(state);
        self.private_port.hash(state);
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ip_address {
            IpAddr::V4(ip) => write!(f, "{}:{}", ip, self.private_port),
            IpAddr::V6(ip) => write!(f, "[{}]:{}", ip, self.private_port),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLoadBalancer {
    pub name: String,
    pub description: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPool {
    pub port: u16,
    pub method: String,
    pub persistence: String,
}
