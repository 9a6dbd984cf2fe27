//! Calculates the commands that bring an observed ring in line with its ring rules.

use std::collections::BTreeSet;

use log::debug;

use artisan_api::{
    command::{DeviceSelector, RingAction, RingCommand},
    config::{ReconcileError, RingRules},
    constants::{device_name, FLOAT_TOLERANCE, SUPPORTED_REGION},
    ring::RingInfo,
};

mod matcher;

pub use matcher::find_device;

/// The outcome of a reconciliation: commands to run in order, and questions the operator has to
/// confirm before they may be run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChangeSet {
    pub commands: Vec<RingCommand>,
    pub confirmations: Vec<String>,
}

impl ChangeSet {
    /// Checks whether the ring already matches its rules.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Renders every command as a single line.
    pub fn rendered(&self) -> Vec<String> {
        self.commands.iter().map(ToString::to_string).collect()
    }

    /// Checks whether partitions need to be reassigned after running the commands, which is the
    /// case as soon as one command changes more than metadata.
    pub fn requires_rebalance(&self) -> bool {
        self.commands
            .iter()
            .any(|command| !command.is_metadata_only())
    }
}

/// Compares the observed ring to the ring rules and calculates the commands needed to reconcile
/// them. `builder_file` is the ring file the commands operate on.
///
/// Zones are visited in ascending order and nodes in lexical order, so the result only depends on
/// the inputs. Any inconsistency between the rules and the ring aborts the calculation without
/// returning the commands gathered so far.
pub fn calculate_changes(
    ring: &RingInfo,
    rules: &RingRules,
    builder_file: &str,
) -> Result<ChangeSet, ReconcileError> {
    if ring.regions == 0 {
        return Err(ReconcileError::RegionsUnset);
    }
    if rules.region != ring.regions || ring.regions != SUPPORTED_REGION {
        return Err(ReconcileError::UnsupportedRegion {
            desired: rules.region,
            observed: ring.regions,
        });
    }

    let mut changes = ChangeSet::default();

    if (ring.overload_factor_decimal - rules.overload).abs() > FLOAT_TOLERANCE {
        debug!(
            "Overload does not match, changing it from {} to {}",
            ring.overload_factor_decimal, rules.overload
        );
        changes.commands.push(RingCommand::new(
            builder_file,
            RingAction::SetOverload {
                overload: rules.overload,
            },
        ));
    }

    // Devices matched by a rule, by (ip, port, name)
    let mut discovered: BTreeSet<(&str, u64, &str)> = BTreeSet::new();
    // Broken devices, by (ip, name)
    let mut excluded: BTreeSet<(&str, String)> = BTreeSet::new();

    for (&zone, zone_rules) in &rules.zones {
        for (node_ip, node_rules) in &zone_rules.nodes {
            for disk_index in 1..=node_rules.disk_count {
                let name = device_name(disk_index);
                if node_rules.is_broken(&name) {
                    debug!("Skipping broken disk '{name}' on node '{node_ip}'");
                    excluded.insert((node_ip.as_str(), name));
                    continue;
                }

                let port = node_rules.port(rules.base_port);
                let weight = node_rules.desired_weight(rules.base_size_tb, node_ip)?;

                let Some(device) = find_device(ring, zone, node_ip, port, &name)? else {
                    debug!("Disk '{name}' on node '{node_ip}' was not found, adding it");
                    changes.commands.push(RingCommand::new(
                        builder_file,
                        RingAction::Add {
                            device: DeviceSelector {
                                region: rules.region,
                                zone,
                                ip: node_ip.clone(),
                                port,
                                name,
                            },
                            weight,
                            meta: node_rules.meta.clone(),
                        },
                    ));
                    continue;
                };

                discovered.insert((device.ip.as_str(), device.port, device.name.as_str()));

                if (device.weight - weight).abs() > FLOAT_TOLERANCE {
                    debug!(
                        "Weight of disk '{name}' on node '{node_ip}' does not match, changing it from {} to {weight}",
                        device.weight
                    );
                    changes.commands.push(RingCommand::new(
                        builder_file,
                        RingAction::SetWeight {
                            device: device.into(),
                            current: device.weight,
                            desired: weight,
                        },
                    ));
                }

                if let Some(meta) = node_rules
                    .meta
                    .as_ref()
                    .filter(|meta| device.meta.as_ref() != Some(*meta))
                {
                    debug!("Meta of disk '{name}' on node '{node_ip}' does not match, changing it");
                    changes.commands.push(RingCommand::new(
                        builder_file,
                        RingAction::SetInfo {
                            device: device.into(),
                            meta: meta.clone(),
                        },
                    ));
                }
            }
        }
    }

    for device in &ring.devices {
        if discovered.contains(&(device.ip.as_str(), device.port, device.name.as_str()))
            || excluded.contains(&(device.ip.as_str(), device.name.clone()))
        {
            continue;
        }

        debug!(
            "Disk '{}' on node '{}' is not declared, removing it",
            device.name, device.ip
        );
        if device.weight != 0.0 && !rules.declares_node(&device.ip) {
            changes.confirmations.push(format!(
                "Do you want to remove disk {} on node {} without first scaling its weight to 0? This poses a data loss risk.",
                device.name, device.ip
            ));
        }

        changes.commands.push(RingCommand::new(
            builder_file,
            RingAction::Remove {
                device: device.into(),
                weight: device.weight,
            },
        ));
    }

    Ok(changes)
}
