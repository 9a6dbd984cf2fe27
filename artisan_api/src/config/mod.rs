use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::constants::{BASE_WEIGHT, DEFAULT_PORT};

pub(crate) mod error;

pub use error::ReconcileError;

/// RingRules describe the desired state of a ring: one region made of zones, which contain nodes,
/// which contain disks.
///
/// Zones and nodes are kept in ordered maps, so iterating them yields ascending zone IDs and
/// lexically sorted node IPs.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RingRules {
    /// Size of a disk with weight 100, in TB. Used to derive weights from `disk_size_tb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_size_tb: Option<f64>,

    /// Port used by nodes which do not declare their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_port: Option<u64>,

    /// Region of the ring. Only region 1 is supported.
    #[serde(default)]
    pub region: u64,

    /// Overload factor of the ring as a decimal, e.g. 0.1 for 10%.
    #[serde(default)]
    pub overload: f64,

    /// Zones of the ring by zone ID.
    #[serde(default)]
    pub zones: BTreeMap<u64, ZoneRules>,
}

impl RingRules {
    /// Checks whether any zone declares the given node.
    pub fn declares_node(&self, node_ip: &str) -> bool {
        self.zones
            .values()
            .any(|zone| zone.nodes.contains_key(node_ip))
    }
}

/// ZoneRules contain the nodes of a zone by node IP.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ZoneRules {
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeRules>,
}

/// NodeRules describe a server and its disks.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NodeRules {
    /// Number of disks, named `swift-01` up to `swift-<disk_count>`.
    pub disk_count: u64,

    /// Explicit weight of each disk. Takes precedence over `disk_size_tb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    /// Size of each disk in TB. The weight is derived from the ring's `base_size_tb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size_tb: Option<f64>,

    /// Port of the node, overrides the ring's `base_port`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u64>,

    /// Metadata of each disk. When unset, existing metadata is left untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, String>>,

    /// Device names like `swift-02` that shall be treated as non-existent. They are neither added
    /// nor removed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub broken_disks: Vec<String>,
}

impl NodeRules {
    /// Calculates the weight each disk of this node should have.
    ///
    /// An explicit weight is returned as is, zero included. Otherwise the weight is the disk size
    /// relative to the base size, in percent, truncated so that capacity is never overstated. A
    /// node without a disk size is assumed to carry base sized disks.
    pub fn desired_weight(
        &self,
        base_size_tb: Option<f64>,
        node_ip: &str,
    ) -> Result<f64, ReconcileError> {
        let weight = match (self.weight, base_size_tb.filter(|size| *size != 0.0)) {
            (Some(weight), _) => weight,
            (None, None) => {
                return Err(ReconcileError::InsufficientWeightData {
                    node_ip: node_ip.into(),
                })
            }
            (None, Some(base_size)) => match self.disk_size_tb.filter(|size| *size != 0.0) {
                Some(disk_size) => (disk_size / base_size * BASE_WEIGHT).floor(),
                None => BASE_WEIGHT,
            },
        };

        if !weight.is_finite() || weight < 0.0 {
            return Err(ReconcileError::InvalidWeight {
                node_ip: node_ip.into(),
                weight,
            });
        }

        if weight == 0.0 {
            info!(
                "Disks on node '{node_ip}' resolve to weight 0 (weight: {:?}, base size: {:?})",
                self.weight, base_size_tb
            );
        }

        Ok(weight)
    }

    /// Returns the port of this node, falling back to the ring's base port and then to the
    /// default port.
    pub fn port(&self, base_port: Option<u64>) -> u64 {
        self.port
            .filter(|port| *port != 0)
            .or(base_port.filter(|port| *port != 0))
            .unwrap_or(DEFAULT_PORT)
    }

    /// Checks whether the given device is declared broken.
    pub fn is_broken(&self, device_name: &str) -> bool {
        self.broken_disks.iter().any(|name| name == device_name)
    }
}
