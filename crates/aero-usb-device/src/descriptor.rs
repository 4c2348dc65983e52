//! GET_DESCRIPTOR dispatch.
//!
//! Descriptor bytes are never produced here. They come from the device-level
//! [`DescriptorProvider`] (device and standard string descriptors, BOS) or from the class bound to
//! interface 0 (configuration, qualifier, other-speed, user strings). [`resolve`] only picks the
//! source and hands back a borrowed view.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::setup::{
    SetupRequest, USB_DESCRIPTOR_TYPE_BOS, USB_DESCRIPTOR_TYPE_CONFIGURATION,
    USB_DESCRIPTOR_TYPE_DEVICE, USB_DESCRIPTOR_TYPE_DEVICE_QUALIFIER,
    USB_DESCRIPTOR_TYPE_OTHER_SPEED_CONFIGURATION, USB_DESCRIPTOR_TYPE_STRING,
};
use crate::state::DeviceContext;

pub const USB_STRING_INDEX_LANGID: u8 = 0x00;
pub const USB_STRING_INDEX_MANUFACTURER: u8 = 0x01;
pub const USB_STRING_INDEX_PRODUCT: u8 = 0x02;
pub const USB_STRING_INDEX_SERIAL: u8 = 0x03;
pub const USB_STRING_INDEX_CONFIGURATION: u8 = 0x04;
pub const USB_STRING_INDEX_INTERFACE: u8 = 0x05;

/// `bLength` is a single byte, so a string descriptor holds at most 126 UTF-16 code units.
pub const MAX_STRING_DESCRIPTOR_CHARS: usize = (u8::MAX as usize - 2) / 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UsbSpeed {
    Low,
    Full,
    High,
}

/// Device-level descriptor tables.
///
/// The returned slices must stay valid for the whole control transfer; in practice they are
/// `'static` tables or fields of the provider.
pub trait DescriptorProvider {
    fn device_descriptor(&self, speed: UsbSpeed) -> &[u8];
    fn lang_id_string(&self, speed: UsbSpeed) -> &[u8];
    fn manufacturer_string(&self, speed: UsbSpeed) -> &[u8];
    fn product_string(&self, speed: UsbSpeed) -> &[u8];
    fn serial_string(&self, speed: UsbSpeed) -> &[u8];
    fn configuration_string(&self, speed: UsbSpeed) -> &[u8];
    fn interface_string(&self, speed: UsbSpeed) -> &[u8];

    /// Binary Object Store. Only consulted when link power management is enabled.
    fn bos_descriptor(&self, _speed: UsbSpeed) -> Option<&[u8]> {
        None
    }
}

/// Selects the descriptor requested by a GET_DESCRIPTOR `req`.
///
/// The returned slice is not truncated to `wLength`; that is the caller's job.
pub fn resolve<'a>(
    ctx: &'a DeviceContext,
    provider: &'a dyn DescriptorProvider,
    req: &SetupRequest,
) -> Result<&'a [u8], RequestError> {
    let descriptor_type = req.descriptor_type();
    let index = req.descriptor_index();
    let unsupported = RequestError::UnsupportedDescriptor {
        descriptor_type,
        index,
    };
    let speed = ctx.speed;
    let class0 = ctx.interfaces.get(0);

    let desc = match descriptor_type {
        USB_DESCRIPTOR_TYPE_DEVICE => Some(provider.device_descriptor(speed)),
        USB_DESCRIPTOR_TYPE_CONFIGURATION => class0.and_then(|class| match speed {
            UsbSpeed::High => class.hs_config_descriptor(),
            UsbSpeed::Full | UsbSpeed::Low => class.fs_config_descriptor(),
        }),
        USB_DESCRIPTOR_TYPE_STRING => match index {
            USB_STRING_INDEX_LANGID => Some(provider.lang_id_string(speed)),
            USB_STRING_INDEX_MANUFACTURER => Some(provider.manufacturer_string(speed)),
            USB_STRING_INDEX_PRODUCT => Some(provider.product_string(speed)),
            USB_STRING_INDEX_SERIAL => Some(provider.serial_string(speed)),
            USB_STRING_INDEX_CONFIGURATION => Some(provider.configuration_string(speed)),
            USB_STRING_INDEX_INTERFACE => Some(provider.interface_string(speed)),
            _ if ctx.config.user_strings => {
                class0.and_then(|class| class.user_string_descriptor(req.value))
            }
            _ => None,
        },
        // Qualifier and other-speed descriptors only exist for high-speed capable devices that
        // are currently running at high speed.
        USB_DESCRIPTOR_TYPE_DEVICE_QUALIFIER if speed == UsbSpeed::High => {
            class0.and_then(|class| class.device_qualifier_descriptor())
        }
        USB_DESCRIPTOR_TYPE_OTHER_SPEED_CONFIGURATION if speed == UsbSpeed::High => {
            class0.and_then(|class| class.other_speed_config_descriptor())
        }
        USB_DESCRIPTOR_TYPE_BOS if ctx.config.lpm => provider.bos_descriptor(speed),
        _ => None,
    };

    desc.ok_or(unsupported)
}

/// Length of a NUL-terminated byte string. A slice without a NUL counts in full.
pub fn string_len(s: &[u8]) -> usize {
    s.iter().position(|&b| b == 0).unwrap_or(s.len())
}

/// Formats an ASCII string as a USB string descriptor into `out`, returning the descriptor length.
///
/// Each source byte becomes one UTF-16LE code unit (`byte, 0x00`); no multi-byte decoding is
/// attempted. The string is cut short if it does not fit into `out` or into the 255-byte
/// descriptor limit. Returns 0 if `out` cannot even hold the header.
pub fn string_descriptor(s: &[u8], out: &mut [u8]) -> usize {
    if out.len() < 2 {
        return 0;
    }
    let chars = string_len(s)
        .min(MAX_STRING_DESCRIPTOR_CHARS)
        .min((out.len() - 2) / 2);
    let len = 2 + chars * 2;

    out[0] = len as u8;
    out[1] = USB_DESCRIPTOR_TYPE_STRING;
    for (dst, &b) in out[2..len].chunks_exact_mut(2).zip(s) {
        dst[0] = b;
        dst[1] = 0x00;
    }
    len
}

/// String descriptor 0: a single supported LANGID.
pub fn string_descriptor_langid(langid: u16) -> [u8; 4] {
    let [l0, l1] = langid.to_le_bytes();
    [4, USB_DESCRIPTOR_TYPE_STRING, l0, l1]
}
