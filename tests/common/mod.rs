// tests/common/mod.rs
//
// In-memory control plane that records every call.
//
#![allow(dead_code)]

use async_trait::async_trait;
use lb_registrator::config::Config;
use lb_registrator::control_plane::{ControlPlane, RemoteResult};
use lb_registrator::model::{
    Datacenter, Group, GroupRef, IpAddressPair, LoadBalancer, Link, NewLoadBalancer, NewPool,
    Node, Pool, Server, ServerDetails, ServiceInstance, ServiceOrigin,
};
use lb_registrator::RemoteError;
use std::collections::HashMap;
use std::sync::Mutex;

pub const DC: &str = "GB3";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetDatacenter(String),
    GetGroup(String),
    GetServer(String),
    ListLoadBalancers,
    GetLoadBalancer(String),
    CreateLoadBalancer(String),
    DeleteLoadBalancer(String),
    CreatePool(String, u16),
    DeletePool(String, String),
    UpdateNodes(String, String, Vec<Node>),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::CreateLoadBalancer(_)
                | Call::DeleteLoadBalancer(_)
                | Call::CreatePool(..)
                | Call::DeletePool(..)
                | Call::UpdateNodes(..)
        )
    }
}

#[derive(Default)]
struct State {
    root_groups: Vec<String>,
    groups: HashMap<String, Group>,
    servers: HashMap<String, Server>,
    balancers: Vec<LoadBalancer>,
    next_id: u64,
    calls: Vec<Call>,
    invisible_reads: HashMap<String, u32>,
    hide_new_balancers_for: u32,
    failures: HashMap<&'static str, u16>,
}

#[derive(Default)]
pub struct FakeControlPlane {
    state: Mutex<State>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root_group(&self, id: &str) {
        let mut state = self.state.lock().unwrap();
        state.root_groups.push(id.to_string());
        state.groups.insert(id.to_string(), group(id));
    }

    pub fn add_child_group(&self, parent: &str, id: &str) {
        let mut state = self.state.lock().unwrap();
        state.groups.insert(id.to_string(), group(id));
        let parent = state.groups.get_mut(parent).expect("parent group");
        parent.groups.push(GroupRef {
            id: id.to_string(),
            name: id.to_string(),
        });
    }

    /// Adds a server whose single public address maps to `internal`.
    pub fn add_server(&self, group_id: &str, name: &str, public: &str, internal: &str) {
        let mut state = self.state.lock().unwrap();
        state.servers.insert(
            name.to_string(),
            Server {
                id: name.to_string(),
                name: name.to_string(),
                details: ServerDetails {
                    ip_addresses: vec![
                        IpAddressPair {
                            public: None,
                            internal: Some(internal.parse().unwrap()),
                        },
                        IpAddressPair {
                            public: Some(public.parse().unwrap()),
                            internal: Some(internal.parse().unwrap()),
                        },
                    ],
                },
            },
        );
        let group = state.groups.get_mut(group_id).expect("group");
        group.links.push(Link {
            rel: "server".to_string(),
            id: Some(name.to_string()),
            href: None,
        });
    }

    pub fn insert_load_balancer(&self, name: &str, pools: Vec<(u16, Vec<Node>)>) -> String {
        let mut state = self.state.lock().unwrap();
        let id = next_id(&mut state, "lb");
        let pools = pools
            .into_iter()
            .map(|(port, nodes)| Pool {
                id: next_id(&mut state, "pool"),
                port,
                method: None,
                persistence: None,
                nodes,
            })
            .collect();
        state.balancers.push(LoadBalancer {
            id: id.clone(),
            name: name.to_string(),
            description: String::new(),
            ip_address: Some("64.94.114.12".to_string()),
            status: Some("enabled".to_string()),
            pools,
        });
        id
    }

    /// New balancers answer 404 to the next `reads` direct reads.
    pub fn hide_new_balancers_for(&self, reads: u32) {
        self.state.lock().unwrap().hide_new_balancers_for = reads;
    }

    pub fn fail(&self, operation: &'static str, status: u16) {
        self.state.lock().unwrap().failures.insert(operation, status);
    }

    pub fn balancers(&self) -> Vec<LoadBalancer> {
        self.state.lock().unwrap().balancers.clone()
    }

    pub fn balancer(&self, name: &str) -> Option<LoadBalancer> {
        self.balancers().into_iter().find(|lb| lb.name == name)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn begin(&self, operation: &'static str, call: Call) -> RemoteResult<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(status) = state.failures.get(operation) {
            return Err(RemoteError::status(operation, *status, "injected failure"));
        }
        Ok(state)
    }
}

fn group(id: &str) -> Group {
    Group {
        id: id.to_string(),
        name: id.to_string(),
        groups: Vec::new(),
        links: Vec::new(),
    }
}

fn next_id(state: &mut State, prefix: &str) -> String {
    state.next_id += 1;
    format!("{}-{}", prefix, state.next_id)
}

fn not_found(operation: &'static str) -> RemoteError {
    RemoteError::status(operation, 404, "not found")
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn get_datacenter(&self, dc: &str) -> RemoteResult<Datacenter> {
        let state = self.begin("get_datacenter", Call::GetDatacenter(dc.to_string()))?;
        Ok(Datacenter {
            id: dc.to_lowercase(),
            name: dc.to_string(),
            links: state
                .root_groups
                .iter()
                .map(|id| Link {
                    rel: "group".to_string(),
                    id: Some(id.clone()),
                    href: None,
                })
                .collect(),
        })
    }

    async fn get_group(&self, id: &str) -> RemoteResult<Group> {
        let state = self.begin("get_group", Call::GetGroup(id.to_string()))?;
        state.groups.get(id).cloned().ok_or_else(|| not_found("get_group"))
    }

    async fn get_server(&self, name: &str) -> RemoteResult<Server> {
        let state = self.begin("get_server", Call::GetServer(name.to_string()))?;
        state.servers.get(name).cloned().ok_or_else(|| not_found("get_server"))
    }

    async fn list_load_balancers(&self, _dc: &str) -> RemoteResult<Vec<LoadBalancer>> {
        let state = self.begin("list_load_balancers", Call::ListLoadBalancers)?;
        Ok(state.balancers.clone())
    }

    async fn get_load_balancer(&self, _dc: &str, id: &str) -> RemoteResult<LoadBalancer> {
        let mut state = self.begin("get_load_balancer", Call::GetLoadBalancer(id.to_string()))?;
        if let Some(remaining) = state.invisible_reads.get_mut(id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(not_found("get_load_balancer"));
            }
        }
        state
            .balancers
            .iter()
            .find(|lb| lb.id == id)
            .cloned()
            .ok_or_else(|| not_found("get_load_balancer"))
    }

    async fn create_load_balancer(&self, _dc: &str, lb: &NewLoadBalancer) -> RemoteResult<LoadBalancer> {
        let mut state = self.begin(
            "create_load_balancer",
            Call::CreateLoadBalancer(lb.name.clone()),
        )?;
        let id = next_id(&mut state, "lb");
        let created = LoadBalancer {
            id: id.clone(),
            name: lb.name.clone(),
            description: lb.description.clone(),
            ip_address: None,
            status: Some(lb.status.clone()),
            pools: Vec::new(),
        };
        let hidden = state.hide_new_balancers_for;
        state.invisible_reads.insert(id, hidden);
        state.balancers.push(created.clone());
        Ok(created)
    }

    async fn delete_load_balancer(&self, _dc: &str, id: &str) -> RemoteResult<()> {
        let mut state = self.begin(
            "delete_load_balancer",
            Call::DeleteLoadBalancer(id.to_string()),
        )?;
        let before = state.balancers.len();
        state.balancers.retain(|lb| lb.id != id);
        if state.balancers.len() == before {
            return Err(not_found("delete_load_balancer"));
        }
        Ok(())
    }

    async fn create_pool(&self, _dc: &str, lb_id: &str, pool: &NewPool) -> RemoteResult<Pool> {
        let mut state = self.begin("create_pool", Call::CreatePool(lb_id.to_string(), pool.port))?;
        let created = Pool {
            id: next_id(&mut state, "pool"),
            port: pool.port,
            method: Some(pool.method.clone()),
            persistence: Some(pool.persistence.clone()),
            nodes: Vec::new(),
        };
        let lb = state
            .balancers
            .iter_mut()
            .find(|lb| lb.id == lb_id)
            .ok_or_else(|| not_found("create_pool"))?;
        lb.pools.push(created.clone());
        Ok(created)
    }

    async fn delete_pool(&self, _dc: &str, lb_id: &str, pool_id: &str) -> RemoteResult<()> {
        let mut state = self.begin(
            "delete_pool",
            Call::DeletePool(lb_id.to_string(), pool_id.to_string()),
        )?;
        let lb = state
            .balancers
            .iter_mut()
            .find(|lb| lb.id == lb_id)
            .ok_or_else(|| not_found("delete_pool"))?;
        lb.pools.retain(|pool| pool.id != pool_id);
        Ok(())
    }

    async fn update_nodes(&self, _dc: &str, lb_id: &str, pool_id: &str, nodes: &[Node]) -> RemoteResult<()> {
        let mut state = self.begin(
            "update_nodes",
            Call::UpdateNodes(lb_id.to_string(), pool_id.to_string(), nodes.to_vec()),
        )?;
        let pool = state
            .balancers
            .iter_mut()
            .find(|lb| lb.id == lb_id)
            .and_then(|lb| lb.pools.iter_mut().find(|pool| pool.id == pool_id))
            .ok_or_else(|| not_found("update_nodes"))?;
        pool.nodes = nodes.to_vec();
        Ok(())
    }
}

/// Config with fast convergence polling.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.datacenter = DC.to_string();
    config.convergence.initial_delay_ms = 1;
    config.convergence.max_delay_ms = 5;
    config.convergence.timeout_ms = 500;
    config
}

/// Directory with one docker host: public 1.2.3.4 -> internal 10.0.0.5.
pub fn single_host_directory() -> FakeControlPlane {
    let fake = FakeControlPlane::new();
    fake.add_root_group("g-root");
    fake.add_server("g-root", "GB3ACMEDOCKER01", "1.2.3.4", "10.0.0.5");
    fake
}

pub fn instance(name: &str, host_ip: &str, host_port: &str, exposed_port: &str) -> ServiceInstance {
    ServiceInstance {
        id: format!("docker01:{}:{}", name, exposed_port),
        name: name.to_string(),
        attrs: HashMap::from([("clc".to_string(), "true".to_string())]),
        origin: ServiceOrigin {
            host_ip: host_ip.to_string(),
            host_port: host_port.to_string(),
            exposed_port: exposed_port.to_string(),
            port_type: "tcp".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn node(ip: &str, port: u16) -> Node {
    Node::new(ip.parse().unwrap(), port)
}
