// src/model/directory.rs
//
// Read-only host directory: datacenter -> groups -> servers.
//
use serde::Deserialize;
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Link {
    pub rel: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Datacenter {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Datacenter {
    /// Ids of the top-level groups, in link order.
    pub fn root_group_ids(&self) -> Vec<String> {
        links_with_rel(&self.links, "group")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub groups: Vec<GroupRef>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Group {
    /// Names of the servers directly inside this group.
    pub fn server_names(&self) -> Vec<String> {
        links_with_rel(&self.links, "server")
    }

    pub fn child_group_ids(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.id.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAddressPair {
    #[serde(default)]
    pub public: Option<IpAddr>,
    #[serde(default)]
    pub internal: Option<IpAddr>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDetails {
    #[serde(default)]
    pub ip_addresses: Vec<IpAddressPair>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Server {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub details: ServerDetails,
}

impl Server {
    /// Internal counterpart of the first address pair whose public side
    /// equals `public`.
    pub fn internal_for(&self, public: IpAddr) -> Option<IpAddr> {
        self.details
            .ip_addresses
            .iter()
            .find(|pair| pair.public == Some(public))
            .and_then(|pair| pair.internal)
    }
}

fn links_with_rel(links: &[Link], rel: &str) -> Vec<String> {
    links
        .iter()
        .filter(|link| link.rel == rel)
        .filter_map(|link| link.id.clone())
        .collect()
}
