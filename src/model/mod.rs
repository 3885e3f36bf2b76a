// src/model/mod.rs
mod directory;
mod instance;
mod resources;

pub use directory::{Datacenter, Group, GroupRef, IpAddressPair, Link, Server, ServerDetails};
pub use instance::{Deregistration, Registration, ServiceInstance, ServiceOrigin};
pub use resources::{LoadBalancer, NewLoadBalancer, NewPool, Node, Pool};

/// Outcome of a lookup where "nothing there" is a normal answer rather than
/// a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}
