// src/model/instance.rs
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// A running service instance as delivered by the event source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceInstance {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub attrs: HashMap<String, String>,
    pub origin: ServiceOrigin,
}

/// Where the instance came from. Ports are kept as the strings the host
/// hands over; they are parsed during validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceOrigin {
    pub container_id: String,
    pub container_name: String,
    pub container_hostname: String,
    /// Externally reachable address of the docker host.
    pub host_ip: String,
    /// Port published on the host; becomes the node's private port.
    pub host_port: String,
    pub exposed_ip: String,
    /// Port the service exposes; selects the pool.
    pub exposed_port: String,
    pub port_type: String,
}

/// Validated input for the add path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub service: String,
    pub host_ip: IpAddr,
    pub pool_port: u16,
    pub node_port: u16,
}

/// Validated input for the remove path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deregistration {
    pub service: String,
    pub host_ip: IpAddr,
    pub node_port: u16,
}

impl ServiceInstance {
    pub fn opted_in(&self, attribute: &str) -> bool {
        self.attrs.get(attribute).map(String::as_str) == Some("true")
    }

    pub fn registration(&self, allowed_ports: &[u16]) -> Result<Registration> {
        let service = self.service_name()?;
        let pool_port = parse_port("exposed port", &self.origin.exposed_port)?;
        if !allowed_ports.contains(&pool_port) {
            return Err(Error::validation(format!(
                "a load balancer can only be created for port {}, got {}",
                describe_ports(allowed_ports),
                pool_port
            )));
        }

        Ok(Registration {
            service,
            host_ip: parse_ip(&self.origin.host_ip)?,
            pool_port,
            node_port: parse_port("host port", &self.origin.host_port)?,
        })
    }

    pub fn deregistration(&self) -> Result<Deregistration> {
        Ok(Deregistration {
            service: self.service_name()?,
            host_ip: parse_ip(&self.origin.host_ip)?,
            node_port: parse_port("host port", &self.origin.host_port)?,
        })
    }

    fn service_name(&self) -> Result<String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::validation("service name is empty"));
        }
        Ok(name.to_string())
    }
}

fn parse_port(what: &str, raw: &str) -> Result<u16> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(Error::validation(format!("invalid {what} {raw:?}"))),
        Ok(port) => Ok(port),
    }
}

fn parse_ip(raw: &str) -> Result<IpAddr> {
    raw.trim()
        .parse()
        .map_err(|_| Error::validation(format!("invalid host IP {raw:?}")))
}

fn describe_ports(ports: &[u16]) -> String {
    let ports: Vec<String> = ports.iter().map(u16::to_string).collect();
    match ports.split_last() {
        None => "<none>".to_string(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}
