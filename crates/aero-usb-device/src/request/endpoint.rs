use super::{forward_setup, invalid_state};
use crate::driver::UsbDriver;
use crate::endpoint::EndpointAddress;
use crate::error::RequestError;
use crate::setup::{
    RequestKind, SetupRequest, USB_FEATURE_ENDPOINT_HALT, USB_REQUEST_CLEAR_FEATURE,
    USB_REQUEST_GET_STATUS, USB_REQUEST_SET_FEATURE,
};
use crate::state::{DeviceContext, DeviceState};

pub(crate) fn std_ep_req(
    ctx: &mut DeviceContext,
    driver: &mut dyn UsbDriver,
    req: &SetupRequest,
) -> Result<(), RequestError> {
    let ep = EndpointAddress::from_raw(req.index_low());
    if ep.number() > ctx.config.max_endpoints {
        return Err(RequestError::InvalidEndpoint(ep));
    }
    // The `wIndex` low byte is used as the interface number as-is, direction bit included.
    let interface = req.index_low();

    // Class requests go straight to the owning class, which also owns the status stage.
    if req.kind() == RequestKind::Class && ctx.interfaces.is_valid(interface) {
        forward_setup(ctx, driver, interface, req);
        return Ok(());
    }

    match req.request {
        USB_REQUEST_SET_FEATURE => match ctx.state {
            DeviceState::Addressed => {
                if !ep.is_control() {
                    driver.stall_endpoint(ep);
                }
            }
            DeviceState::Configured => {
                if req.value == USB_FEATURE_ENDPOINT_HALT && !ep.is_control() {
                    driver.stall_endpoint(ep);
                    tracing::debug!(%ep, "endpoint halted");
                }
                forward_setup(ctx, driver, interface, req);
                driver.send_status();
            }
            DeviceState::Default | DeviceState::Suspended => return Err(invalid_state(ctx, req)),
        },
        USB_REQUEST_CLEAR_FEATURE => match ctx.state {
            DeviceState::Addressed => {
                if !ep.is_control() {
                    driver.stall_endpoint(ep);
                }
            }
            DeviceState::Configured => {
                if req.value == USB_FEATURE_ENDPOINT_HALT {
                    if !ep.is_control() {
                        driver.clear_stall(ep);
                        tracing::debug!(%ep, "endpoint halt cleared");
                        forward_setup(ctx, driver, interface, req);
                    }
                    // Status is sent for EP0 as well, even though nothing was cleared.
                    driver.send_status();
                }
            }
            DeviceState::Default | DeviceState::Suspended => return Err(invalid_state(ctx, req)),
        },
        USB_REQUEST_GET_STATUS => match ctx.state {
            DeviceState::Addressed => {
                // Only EP0 exists before SET_CONFIGURATION.
                if !ep.is_control() {
                    driver.stall_endpoint(ep);
                }
            }
            DeviceState::Configured => {
                let status = u16::from(driver.is_stalled(ep));
                driver.send_control_data(&status.to_le_bytes());
            }
            DeviceState::Default | DeviceState::Suspended => return Err(invalid_state(ctx, req)),
        },
        // Remaining standard requests have no meaning for an endpoint and are ignored.
        _ => {}
    }
    Ok(())
}
