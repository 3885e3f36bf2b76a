// src/resolver/mod.rs
//
// Maps a docker host's public address to the internal address the load
// balancer must dial, by walking the datacenter's group hierarchy.
//
use crate::config::DirectoryConfig;
use crate::control_plane::ControlPlane;
use crate::error::{Error, Result};
use crate::model::Lookup;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

pub struct AddressResolver {
    control_plane: Arc<dyn ControlPlane>,
    limits: DirectoryConfig,
}

struct Pending {
    group_id: String,
    depth: usize,
}

impl AddressResolver {
    pub fn new(control_plane: Arc<dyn ControlPlane>, limits: DirectoryConfig) -> Self {
        Self {
            control_plane,
            limits,
        }
    }

    /// Depth-first over the directory: every server directly in a group is
    /// checked before any of its subgroups, and the first match wins.
    pub async fn resolve(&self, dc: &str, public: IpAddr) -> Result<Lookup<IpAddr>> {
        let datacenter = self.control_plane.get_datacenter(dc).await?;

        // Reversed so the first root group is popped first.
        let mut stack: Vec<Pending> = datacenter
            .root_group_ids()
            .into_iter()
            .rev()
            .map(|group_id| Pending { group_id, depth: 1 })
            .collect();
        let mut visited = 0usize;

        while let Some(Pending { group_id, depth }) = stack.pop() {
            if depth > self.limits.max_depth {
                return Err(Error::DirectoryLimit(format!(
                    "group {} is nested deeper than {} levels",
                    group_id, self.limits.max_depth
                )));
            }
            visited += 1;
            if visited > self.limits.max_groups {
                return Err(Error::DirectoryLimit(format!(
                    "more than {} groups visited",
                    self.limits.max_groups
                )));
            }

            let group = self.control_plane.get_group(&group_id).await?;
            debug!(group = %group.id, depth, "Searching group for public IP {}", public);

            for server_name in group.server_names() {
                let server = self.control_plane.get_server(&server_name).await?;
                if let Some(internal) = server.internal_for(public) {
                    debug!(server = %server.id, %internal, "Matched public IP {}", public);
                    return Ok(Lookup::Found(internal));
                }
            }

            stack.extend(
                group
                    .child_group_ids()
                    .into_iter()
                    .rev()
                    .map(|group_id| Pending {
                        group_id,
                        depth: depth + 1,
                    }),
            );
        }

        Ok(Lookup::NotFound)
    }
}
