use bitflags::bitflags;

use super::{forward_setup, invalid_state};
use crate::descriptor::{self, DescriptorProvider};
use crate::driver::UsbDriver;
use crate::error::RequestError;
use crate::setup::{
    SetupRequest, USB_FEATURE_DEVICE_REMOTE_WAKEUP, USB_REQUEST_CLEAR_FEATURE,
    USB_REQUEST_GET_CONFIGURATION, USB_REQUEST_GET_DESCRIPTOR, USB_REQUEST_GET_STATUS,
    USB_REQUEST_SET_ADDRESS, USB_REQUEST_SET_CONFIGURATION, USB_REQUEST_SET_FEATURE,
};
use crate::state::{DeviceContext, DeviceState};

bitflags! {
    /// Device GET_STATUS reply (USB 2.0 §9.4.5).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DeviceStatus: u16 {
        const SELF_POWERED = 1 << 0;
        const REMOTE_WAKEUP = 1 << 1;
    }
}

pub(crate) fn std_dev_req(
    ctx: &mut DeviceContext,
    driver: &mut dyn UsbDriver,
    descriptors: &dyn DescriptorProvider,
    req: &SetupRequest,
) -> Result<(), RequestError> {
    match req.request {
        USB_REQUEST_GET_DESCRIPTOR => get_descriptor(ctx, driver, descriptors, req),
        USB_REQUEST_SET_ADDRESS => set_address(ctx, driver, req),
        USB_REQUEST_SET_CONFIGURATION => set_configuration(ctx, driver, req),
        USB_REQUEST_GET_CONFIGURATION => get_configuration(ctx, driver, req),
        USB_REQUEST_GET_STATUS => get_status(ctx, driver),
        USB_REQUEST_SET_FEATURE => set_feature(ctx, driver, req),
        USB_REQUEST_CLEAR_FEATURE => clear_feature(ctx, driver, req),
        other => Err(RequestError::UnsupportedRequest(other)),
    }
}

/// Class and vendor requests addressed to the device go to the interface 0 class.
pub(crate) fn class_dev_req(
    ctx: &mut DeviceContext,
    driver: &mut dyn UsbDriver,
    req: &SetupRequest,
) -> Result<(), RequestError> {
    let result = forward_setup(ctx, driver, 0, req).ok_or(RequestError::InvalidInterface(0))?;
    if result.is_ok() && req.length == 0 {
        driver.send_status();
    }
    Ok(())
}

fn get_descriptor(
    ctx: &mut DeviceContext,
    driver: &mut dyn UsbDriver,
    descriptors: &dyn DescriptorProvider,
    req: &SetupRequest,
) -> Result<(), RequestError> {
    let desc = descriptor::resolve(ctx, descriptors, req)?;

    // Nothing is sent when either side reports a zero length.
    if !desc.is_empty() && req.length != 0 {
        let len = desc.len().min(usize::from(req.length));
        driver.send_control_data(&desc[..len]);
    }
    Ok(())
}

fn set_address(
    ctx: &mut DeviceContext,
    driver: &mut dyn UsbDriver,
    req: &SetupRequest,
) -> Result<(), RequestError> {
    if req.index != 0 || req.length != 0 {
        return Err(RequestError::InvalidFields(
            "SET_ADDRESS requires wIndex=0 and wLength=0",
        ));
    }
    if matches!(ctx.state, DeviceState::Configured | DeviceState::Suspended) {
        return Err(invalid_state(ctx, req));
    }

    let address = (req.value & 0x007f) as u8;
    ctx.address = address;
    driver.set_address(address);
    // The status stage goes out before the state change; many controllers only latch the new
    // address once the status stage has been ACKed.
    driver.send_status();

    ctx.state = if address != 0 {
        DeviceState::Addressed
    } else {
        DeviceState::Default
    };
    tracing::debug!(address, state = ?ctx.state, "device address assigned");
    Ok(())
}

fn set_configuration(
    ctx: &mut DeviceContext,
    driver: &mut dyn UsbDriver,
    req: &SetupRequest,
) -> Result<(), RequestError> {
    let cfgidx = (req.value & 0x00ff) as u8;
    if cfgidx > ctx.config.max_configurations {
        return Err(RequestError::InvalidFields(
            "SET_CONFIGURATION value exceeds the supported configurations",
        ));
    }

    match ctx.state {
        DeviceState::Addressed => {
            if cfgidx != 0 {
                activate_configuration(ctx, cfgidx)?;
            }
            driver.send_status();
        }
        DeviceState::Configured => {
            if cfgidx == 0 {
                let old = ctx.configuration;
                ctx.state = DeviceState::Addressed;
                ctx.configuration = 0;
                ctx.clear_class_config(old);
                tracing::debug!(cfgidx = old, "configuration deactivated");
            } else if cfgidx != ctx.configuration {
                let old = ctx.configuration;
                ctx.clear_class_config(old);
                activate_configuration(ctx, cfgidx)?;
            }
            driver.send_status();
        }
        DeviceState::Default | DeviceState::Suspended => return Err(invalid_state(ctx, req)),
    }
    Ok(())
}

/// Enters the configured state with `cfgidx` and initializes every bound class.
///
/// If any class refuses, the classes initialized so far are rolled back and the device drops
/// back to the addressed state.
fn activate_configuration(ctx: &mut DeviceContext, cfgidx: u8) -> Result<(), RequestError> {
    ctx.configuration = cfgidx;
    ctx.state = DeviceState::Configured;

    if let Err(source) = ctx.set_class_config(cfgidx) {
        tracing::warn!(cfgidx, "class configuration failed: {source}");
        ctx.configuration = 0;
        ctx.state = DeviceState::Addressed;
        return Err(RequestError::ConfigurationActivation { cfgidx, source });
    }

    tracing::debug!(cfgidx, "configuration activated");
    Ok(())
}

fn get_configuration(
    ctx: &mut DeviceContext,
    driver: &mut dyn UsbDriver,
    req: &SetupRequest,
) -> Result<(), RequestError> {
    if req.length != 1 {
        return Err(RequestError::InvalidFields(
            "GET_CONFIGURATION requires wLength=1",
        ));
    }

    match ctx.state {
        DeviceState::Addressed => {
            ctx.default_configuration = 0;
            driver.send_control_data(&[ctx.default_configuration]);
        }
        DeviceState::Configured => driver.send_control_data(&[ctx.configuration]),
        DeviceState::Default | DeviceState::Suspended => return Err(invalid_state(ctx, req)),
    }
    Ok(())
}

fn get_status(ctx: &mut DeviceContext, driver: &mut dyn UsbDriver) -> Result<(), RequestError> {
    if !matches!(ctx.state, DeviceState::Addressed | DeviceState::Configured) {
        return Err(RequestError::InvalidState {
            request: USB_REQUEST_GET_STATUS,
            state: ctx.state,
        });
    }

    let mut status = DeviceStatus::empty();
    status.set(DeviceStatus::SELF_POWERED, ctx.config.self_powered);
    if ctx.remote_wakeup_enabled {
        // EP0 OUT is armed ahead of the data stage whenever remote wakeup is on.
        driver.receive_status();
        status |= DeviceStatus::REMOTE_WAKEUP;
    }

    driver.send_control_data(&status.bits().to_le_bytes());
    Ok(())
}

fn set_feature(
    ctx: &mut DeviceContext,
    driver: &mut dyn UsbDriver,
    req: &SetupRequest,
) -> Result<(), RequestError> {
    // Unknown feature selectors are ignored without a status stage.
    if req.value == USB_FEATURE_DEVICE_REMOTE_WAKEUP {
        ctx.remote_wakeup_enabled = true;
        forward_setup(ctx, driver, req.index_low(), req);
        driver.send_status();
        tracing::debug!("remote wakeup enabled");
    }
    Ok(())
}

fn clear_feature(
    ctx: &mut DeviceContext,
    driver: &mut dyn UsbDriver,
    req: &SetupRequest,
) -> Result<(), RequestError> {
    match ctx.state {
        DeviceState::Addressed | DeviceState::Configured => {
            if req.value == USB_FEATURE_DEVICE_REMOTE_WAKEUP {
                ctx.remote_wakeup_enabled = false;
                forward_setup(ctx, driver, req.index_low(), req);
                driver.send_status();
                tracing::debug!("remote wakeup disabled");
            }
            Ok(())
        }
        DeviceState::Default | DeviceState::Suspended => Err(invalid_state(ctx, req)),
    }
}
