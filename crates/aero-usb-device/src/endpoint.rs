use core::fmt;

use crate::setup::RequestDirection;

/// A USB endpoint address (`bEndpointAddress`): bit 7 is the direction, bits 3:0 the number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EndpointAddress(u8);

/// Control endpoint, IN direction.
pub const EP0_IN: EndpointAddress = EndpointAddress(0x80);
/// Control endpoint, OUT direction.
pub const EP0_OUT: EndpointAddress = EndpointAddress(0x00);

impl EndpointAddress {
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Endpoint number with the direction bit masked off.
    ///
    /// Reserved bits 6:4 are kept, so out-of-range values from a malformed `wIndex` remain
    /// visible to bounds checks.
    pub const fn number(self) -> u8 {
        self.0 & 0x7f
    }

    pub const fn direction(self) -> RequestDirection {
        if self.0 & 0x80 != 0 {
            RequestDirection::DeviceToHost
        } else {
            RequestDirection::HostToDevice
        }
    }

    /// True for 0x00 and 0x80.
    pub const fn is_control(self) -> bool {
        self.number() == 0
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}
