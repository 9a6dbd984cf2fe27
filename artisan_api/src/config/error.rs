//! Errors raised while reconciling ring rules with an observed ring.

/// Identifies disagreements between the rule file and the observed ring, or rule files that do not
/// carry enough information to derive the desired state. Every variant aborts the reconciliation.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ReconcileError {
    #[error("Ring does not report any regions, the region count needs to be set")]
    RegionsUnset,

    #[error("Currently only one region is supported, but the rule file declares region {desired} and the ring reports {observed} regions")]
    UnsupportedRegion { desired: u64, observed: u64 },

    #[error("Zone ID mismatch for device '{device}' on node '{node_ip}' between parsed data {observed} and rule file {desired}")]
    ZoneMismatch {
        node_ip: String,
        device: String,
        observed: u64,
        desired: u64,
    },

    #[error("Port mismatch for device '{device}' on node '{node_ip}' between parsed data {observed} and rule file {desired}")]
    PortMismatch {
        node_ip: String,
        device: String,
        observed: u64,
        desired: u64,
    },

    #[error("Replication endpoint {replication_ip}:{replication_port} of device '{device}' does not match its endpoint {node_ip}:{port}, which is required")]
    ReplicationMismatch {
        node_ip: String,
        port: u64,
        device: String,
        replication_ip: String,
        replication_port: u64,
    },

    #[error("Not enough data to calculate the weight of the disks on node '{node_ip}': neither 'weight' nor 'base_size_tb' is set")]
    InsufficientWeightData { node_ip: String },

    #[error("Weight {weight} of the disks on node '{node_ip}' is invalid, it must be a finite, non-negative number")]
    InvalidWeight { node_ip: String, weight: f64 },
}
