//! USB 2.0 chapter 9 standard request handlers.
//!
//! Handlers return `Err` for anything that should be rejected; they never stall EP0 themselves.
//! [`crate::UsbDevice`] turns every error into a single [`ctl_error`] call.
//!
//! Some responses here deliberately do nothing at all (no data, no status, no stall). Those follow
//! the behavior host stacks have been tested against and are called out where they happen.

mod device;
mod endpoint;
mod interface;

pub use device::DeviceStatus;
pub(crate) use device::{class_dev_req, std_dev_req};
pub(crate) use endpoint::std_ep_req;
pub(crate) use interface::std_itf_req;

use crate::class::ClassError;
use crate::driver::UsbDriver;
use crate::endpoint::{EP0_IN, EP0_OUT};
use crate::error::RequestError;
use crate::setup::SetupRequest;
use crate::state::DeviceContext;

/// Stalls both directions of the control endpoint.
pub fn ctl_stall(driver: &mut dyn UsbDriver) {
    driver.stall_endpoint(EP0_IN);
    driver.stall_endpoint(EP0_OUT);
}

/// Rejects `req`. The host observes a STALL; device state is left untouched.
pub fn ctl_error(driver: &mut dyn UsbDriver, req: &SetupRequest, err: &RequestError) {
    tracing::debug!(request = %req, "stalling control request: {err}");
    ctl_stall(driver);
}

fn invalid_state(ctx: &DeviceContext, req: &SetupRequest) -> RequestError {
    RequestError::InvalidState {
        request: req.request,
        state: ctx.state,
    }
}

/// Hands `req` to the class bound at `interface`.
///
/// Returns `None` if the slot is not a valid recipient.
fn forward_setup(
    ctx: &mut DeviceContext,
    driver: &mut dyn UsbDriver,
    interface: u8,
    req: &SetupRequest,
) -> Option<Result<(), ClassError>> {
    let class = ctx.interfaces.get_mut(interface)?;
    let result = class.setup(driver, req);
    if let Err(err) = &result {
        tracing::debug!(interface, request = %req, "class rejected request: {err}");
    }
    Some(result)
}
