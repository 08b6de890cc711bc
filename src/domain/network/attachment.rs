use std::collections::BTreeMap;

use crate::domain::network::topology::NetworkTopology;
use crate::domain::utils::id::{DeviceId, NodeId};
use crate::error::{Error, Result};

/// Maps devices to the topology node their access link attaches to.
#[derive(Debug, Clone)]
pub struct DeviceAttachments {
    resolved: BTreeMap<DeviceId, NodeId>,
    explicit: BTreeMap<DeviceId, NodeId>,
    require_explicit: bool,
}

impl DeviceAttachments {
    pub fn new(explicit: BTreeMap<DeviceId, NodeId>, require_explicit: bool) -> Self {
        Self { resolved: BTreeMap::new(), explicit, require_explicit }
    }

    /// Returns the attachment node of `device`, resolving it on first use.
    ///
    /// Resolution order: the explicit mapping, then (unless explicit attachment is
    /// required) the numeric suffix of the device id modulo the node count, e.g.
    /// `dev_7` on a 5-node topology attaches to the node at position 2.
    pub fn resolve(&mut self, device: &DeviceId, topology: &NetworkTopology) -> Result<NodeId> {
        if let Some(node) = self.resolved.get(device) {
            return Ok(node.clone());
        }

        let node = match self.explicit.get(device) {
            Some(node) if topology.contains_node(node) => node.clone(),
            Some(node) => {
                return Err(Error::InvalidTopology(format!("device {} is attached to unknown node '{}'", device, node)));
            }
            None if self.require_explicit => return Err(Error::UnattachedDevice(device.clone())),
            None => Self::fallback_node(device, topology).ok_or_else(|| Error::UnattachedDevice(device.clone()))?,
        };

        log::debug!("Device {} attached to node {}.", device, node);
        self.resolved.insert(device.clone(), node.clone());
        Ok(node)
    }

    fn fallback_node(device: &DeviceId, topology: &NetworkTopology) -> Option<NodeId> {
        let suffix: usize = device.as_str().rsplit('_').next()?.parse().ok()?;
        let nodes = topology.nodes();
        if nodes.is_empty() {
            return None;
        }
        Some(nodes[suffix % nodes.len()].id.clone())
    }
}
