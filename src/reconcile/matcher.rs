use artisan_api::{
    config::ReconcileError,
    ring::{DeviceInfo, RingInfo},
};

/// Finds the device named `name` on the node `ip`.
///
/// The zone is not part of the lookup: a device found in another zone than the one declared is an
/// error rather than a device to add. The same holds for a device listening on another port, or one
/// with a separate replication endpoint.
///
/// Returns `Ok(None)` when the node has no such device.
pub fn find_device<'a>(
    ring: &'a RingInfo,
    zone: u64,
    ip: &str,
    port: u64,
    name: &str,
) -> Result<Option<&'a DeviceInfo>, ReconcileError> {
    let Some(device) = ring
        .devices
        .iter()
        .find(|device| device.ip == ip && device.name == name)
    else {
        return Ok(None);
    };

    if device.zone != zone {
        return Err(ReconcileError::ZoneMismatch {
            node_ip: ip.into(),
            device: name.into(),
            observed: device.zone,
            desired: zone,
        });
    }

    if device.port != port {
        return Err(ReconcileError::PortMismatch {
            node_ip: ip.into(),
            device: name.into(),
            observed: device.port,
            desired: port,
        });
    }

    if !device.has_matching_replication_endpoint() {
        return Err(ReconcileError::ReplicationMismatch {
            node_ip: ip.into(),
            port: device.port,
            device: name.into(),
            replication_ip: device.replication_ip.clone(),
            replication_port: device.replication_port,
        });
    }

    Ok(Some(device))
}
