// Ring constants

/// Name of the external ring management tool.
pub const SWIFT_RING_BUILDER: &str = "swift-ring-builder";

/// Environment variable that can point to a specific `swift-ring-builder` binary.
pub const SWIFT_RING_BUILDER_ENV: &str = "SWIFT_RING_BUILDER";

/// Environment variable enabling debug logging.
pub const ARTISAN_DEBUG_ENV: &str = "ARTISAN_DEBUG";

/// The only region currently supported, both in rule files and in rings.
pub const SUPPORTED_REGION: u64 = 1;

/// Port used for a node when neither the node nor the ring rules declare one.
pub const DEFAULT_PORT: u64 = 6000;

/// Prefix of device names, followed by a two digit, 1-based disk index.
pub const DEVICE_NAME_PREFIX: &str = "swift-";

/// Absolute tolerance used when comparing weights and overload factors.
pub const FLOAT_TOLERANCE: f64 = 0.000001;

/// Weight assigned to a disk whose size equals the base size.
pub const BASE_WEIGHT: f64 = 100.0;

/// Returns the device name for the given 1-based disk index, e.g. `swift-03`.
pub fn device_name(disk_index: u64) -> String {
    format!("{DEVICE_NAME_PREFIX}{disk_index:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_name() {
        assert_eq!(device_name(1), "swift-01");
        assert_eq!(device_name(12), "swift-12");
        assert_eq!(device_name(100), "swift-100");
    }
}
