use serde::{Deserialize, Serialize};

use crate::error::UsbdError;

/// Highest endpoint number addressable by `bEndpointAddress`.
pub const MAX_ENDPOINT_NUMBER: u8 = 15;

fn default_max_interfaces() -> usize {
    3
}

fn default_max_configurations() -> u8 {
    1
}

fn default_max_endpoints() -> u8 {
    7
}

/// Static properties of the device build.
///
/// Fields missing from a serialized config fall back to [`UsbdConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsbdConfig {
    /// Capacity of the interface binding table.
    #[serde(default = "default_max_interfaces")]
    pub max_interfaces: usize,
    /// Highest accepted SET_CONFIGURATION value.
    #[serde(default = "default_max_configurations")]
    pub max_configurations: u8,
    /// Highest endpoint number accepted in endpoint-recipient requests.
    #[serde(default = "default_max_endpoints")]
    pub max_endpoints: u8,
    /// Reported in bit 0 of the device GET_STATUS reply.
    #[serde(default)]
    pub self_powered: bool,
    /// Forward unknown string indices to the interface 0 class.
    #[serde(default)]
    pub user_strings: bool,
    /// Link power management support; enables GET_DESCRIPTOR(BOS).
    #[serde(default)]
    pub lpm: bool,
}

impl Default for UsbdConfig {
    fn default() -> Self {
        Self {
            max_interfaces: default_max_interfaces(),
            max_configurations: default_max_configurations(),
            max_endpoints: default_max_endpoints(),
            self_powered: false,
            user_strings: false,
            lpm: false,
        }
    }
}

impl UsbdConfig {
    pub fn validate(&self) -> Result<(), UsbdError> {
        if self.max_interfaces == 0 {
            return Err(UsbdError::InvalidConfig("max_interfaces must be at least 1"));
        }
        // Interface numbers travel in the low byte of wIndex.
        if self.max_interfaces > usize::from(u8::MAX) + 1 {
            return Err(UsbdError::InvalidConfig("max_interfaces must be at most 256"));
        }
        if self.max_configurations == 0 {
            return Err(UsbdError::InvalidConfig(
                "max_configurations must be at least 1",
            ));
        }
        if self.max_endpoints > MAX_ENDPOINT_NUMBER {
            return Err(UsbdError::InvalidConfig("max_endpoints must be at most 15"));
        }
        Ok(())
    }
}
