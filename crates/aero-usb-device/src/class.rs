//! Class driver capability interface.
//!
//! A class driver (HID, MSC, ...) is bound to one or more interface slots of the device. The core
//! only ever talks to it through [`UsbClass`]: it forwards requests that target the interface,
//! activates/deactivates it on configuration changes, and asks it for the descriptors that depend
//! on the class layout.

use thiserror::Error;

use crate::driver::UsbDriver;
use crate::setup::SetupRequest;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassError {
    #[error("configuration {0} is not supported by the class")]
    UnsupportedConfiguration(u8),

    #[error("class rejected request (bRequest=0x{0:02x})")]
    Rejected(u8),

    #[error("class failure: {0}")]
    Other(&'static str),
}

pub trait UsbClass {
    /// Activates configuration `cfgidx` (SET_CONFIGURATION with a non-zero value).
    fn init(&mut self, cfgidx: u8) -> Result<(), ClassError>;

    /// Deactivates configuration `cfgidx`.
    fn deinit(&mut self, cfgidx: u8);

    /// Handles a request addressed to this class.
    ///
    /// The class owns the data stage of the requests it accepts and is given the driver to issue
    /// it. For requests without a data stage the core sends the status stage after `Ok(())`.
    /// On `Err` the class is expected to have stalled EP0 itself; the core sends nothing more.
    fn setup(&mut self, driver: &mut dyn UsbDriver, req: &SetupRequest) -> Result<(), ClassError>;

    fn hs_config_descriptor(&self) -> Option<&[u8]> {
        None
    }

    fn fs_config_descriptor(&self) -> Option<&[u8]> {
        None
    }

    fn other_speed_config_descriptor(&self) -> Option<&[u8]> {
        None
    }

    fn device_qualifier_descriptor(&self) -> Option<&[u8]> {
        None
    }

    /// String descriptors outside the six standard indices. `value` is the full `wValue`.
    fn user_string_descriptor(&self, _value: u16) -> Option<&[u8]> {
        None
    }
}
