use super::{forward_setup, invalid_state};
use crate::driver::UsbDriver;
use crate::error::RequestError;
use crate::setup::SetupRequest;
use crate::state::{DeviceContext, DeviceState};

/// Interface requests are passed through unchanged to the class bound at `wIndex[7:0]`.
pub(crate) fn std_itf_req(
    ctx: &mut DeviceContext,
    driver: &mut dyn UsbDriver,
    req: &SetupRequest,
) -> Result<(), RequestError> {
    if ctx.state != DeviceState::Configured {
        return Err(invalid_state(ctx, req));
    }

    let interface = req.index_low();
    let result =
        forward_setup(ctx, driver, interface, req).ok_or(RequestError::InvalidInterface(interface))?;

    // A class that fails a request reports it on EP0 itself.
    if result.is_ok() && req.length == 0 {
        driver.send_status();
    }
    Ok(())
}
