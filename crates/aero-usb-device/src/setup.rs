//! SETUP packet model.
//!
//! The 8-byte SETUP packet is decoded exactly once into a [`SetupRequest`]. The bitmask encoding of
//! `bmRequestType` only exists at the wire boundary ([`RequestType::from_bits`] /
//! [`RequestType::bits`]); request handlers work with the structured fields.

use core::fmt;

/// Length of a SETUP packet on the wire.
pub const SETUP_PACKET_LEN: usize = 8;

pub const USB_REQUEST_GET_STATUS: u8 = 0x00;
pub const USB_REQUEST_CLEAR_FEATURE: u8 = 0x01;
pub const USB_REQUEST_SET_FEATURE: u8 = 0x03;
pub const USB_REQUEST_SET_ADDRESS: u8 = 0x05;
pub const USB_REQUEST_GET_DESCRIPTOR: u8 = 0x06;
pub const USB_REQUEST_GET_CONFIGURATION: u8 = 0x08;
pub const USB_REQUEST_SET_CONFIGURATION: u8 = 0x09;

pub const USB_FEATURE_ENDPOINT_HALT: u16 = 0x0000;
pub const USB_FEATURE_DEVICE_REMOTE_WAKEUP: u16 = 0x0001;

pub const USB_DESCRIPTOR_TYPE_DEVICE: u8 = 0x01;
pub const USB_DESCRIPTOR_TYPE_CONFIGURATION: u8 = 0x02;
pub const USB_DESCRIPTOR_TYPE_STRING: u8 = 0x03;
pub const USB_DESCRIPTOR_TYPE_DEVICE_QUALIFIER: u8 = 0x06;
pub const USB_DESCRIPTOR_TYPE_OTHER_SPEED_CONFIGURATION: u8 = 0x07;
pub const USB_DESCRIPTOR_TYPE_BOS: u8 = 0x0f;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestDirection {
    HostToDevice,
    DeviceToHost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Standard,
    Class,
    Vendor,
    Reserved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestRecipient {
    Device,
    Interface,
    Endpoint,
    Other,
    /// Recipient codes 4..=31 are reserved by USB 2.0. The raw code is kept so the packet can be
    /// re-encoded unchanged.
    Reserved(u8),
}

/// Decoded `bmRequestType`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestType {
    pub direction: RequestDirection,
    pub kind: RequestKind,
    pub recipient: RequestRecipient,
}

impl RequestType {
    pub const fn from_bits(bits: u8) -> Self {
        let direction = if bits & 0x80 != 0 {
            RequestDirection::DeviceToHost
        } else {
            RequestDirection::HostToDevice
        };
        let kind = match (bits >> 5) & 0x03 {
            0 => RequestKind::Standard,
            1 => RequestKind::Class,
            2 => RequestKind::Vendor,
            _ => RequestKind::Reserved,
        };
        let recipient = match bits & 0x1f {
            0 => RequestRecipient::Device,
            1 => RequestRecipient::Interface,
            2 => RequestRecipient::Endpoint,
            3 => RequestRecipient::Other,
            code => RequestRecipient::Reserved(code),
        };
        Self {
            direction,
            kind,
            recipient,
        }
    }

    pub const fn bits(self) -> u8 {
        let direction = match self.direction {
            RequestDirection::HostToDevice => 0,
            RequestDirection::DeviceToHost => 0x80,
        };
        let kind = match self.kind {
            RequestKind::Standard => 0,
            RequestKind::Class => 1,
            RequestKind::Vendor => 2,
            RequestKind::Reserved => 3,
        };
        let recipient = match self.recipient {
            RequestRecipient::Device => 0,
            RequestRecipient::Interface => 1,
            RequestRecipient::Endpoint => 2,
            RequestRecipient::Other => 3,
            RequestRecipient::Reserved(code) => code & 0x1f,
        };
        direction | (kind << 5) | recipient
    }
}

/// A parsed SETUP packet.
///
/// Instances are immutable and live for a single control transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetupRequest {
    pub request_type: RequestType,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    /// Expected data-stage byte count (`wLength`).
    pub length: u16,
}

impl SetupRequest {
    /// Decodes a SETUP packet. All multi-byte fields are little-endian.
    ///
    /// No field validation happens here; whether a value is acceptable depends on the device state
    /// and on the handler the request is routed to.
    pub fn parse(buf: &[u8; SETUP_PACKET_LEN]) -> Self {
        Self {
            request_type: RequestType::from_bits(buf[0]),
            request: buf[1],
            value: u16::from_le_bytes([buf[2], buf[3]]),
            index: u16::from_le_bytes([buf[4], buf[5]]),
            length: u16::from_le_bytes([buf[6], buf[7]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; SETUP_PACKET_LEN] {
        let [v0, v1] = self.value.to_le_bytes();
        let [i0, i1] = self.index.to_le_bytes();
        let [l0, l1] = self.length.to_le_bytes();
        [self.request_type.bits(), self.request, v0, v1, i0, i1, l0, l1]
    }

    pub fn direction(&self) -> RequestDirection {
        self.request_type.direction
    }

    pub fn kind(&self) -> RequestKind {
        self.request_type.kind
    }

    pub fn recipient(&self) -> RequestRecipient {
        self.request_type.recipient
    }

    /// GET_DESCRIPTOR: descriptor type in the high byte of `wValue`.
    pub fn descriptor_type(&self) -> u8 {
        (self.value >> 8) as u8
    }

    /// GET_DESCRIPTOR: descriptor index in the low byte of `wValue`.
    pub fn descriptor_index(&self) -> u8 {
        (self.value & 0x00ff) as u8
    }

    /// Low byte of `wIndex`: the interface number or endpoint address the request targets.
    pub fn index_low(&self) -> u8 {
        (self.index & 0x00ff) as u8
    }
}

impl fmt::Display for SetupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bmRequestType=0x{:02x} bRequest=0x{:02x} wValue=0x{:04x} wIndex=0x{:04x} wLength={}",
            self.request_type.bits(),
            self.request,
            self.value,
            self.index,
            self.length
        )
    }
}
