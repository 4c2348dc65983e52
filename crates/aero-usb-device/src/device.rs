use alloc::boxed::Box;

use crate::class::UsbClass;
use crate::config::UsbdConfig;
use crate::descriptor::{DescriptorProvider, UsbSpeed};
use crate::driver::UsbDriver;
use crate::error::{RequestError, UsbdError};
use crate::request;
use crate::setup::{RequestKind, RequestRecipient, SetupRequest, SETUP_PACKET_LEN};
use crate::state::{DeviceContext, DeviceState};

/// Device-side endpoint-0 request engine.
///
/// `UsbDevice` owns the [`DeviceContext`], the endpoint driver `D` and the device descriptor
/// tables. The surrounding I/O layer feeds it one SETUP packet at a time via
/// [`UsbDevice::setup_stage`] and reports bus events (reset, speed, suspend/resume). Invocations
/// must be serialized: a new SETUP packet is only delivered once the previous control transfer has
/// finished or been abandoned.
pub struct UsbDevice<D: UsbDriver> {
    ctx: DeviceContext,
    driver: D,
    descriptors: Box<dyn DescriptorProvider>,
    last_error: Option<RequestError>,
}

impl<D: UsbDriver> UsbDevice<D> {
    pub fn new(
        config: UsbdConfig,
        driver: D,
        descriptors: Box<dyn DescriptorProvider>,
    ) -> Result<Self, UsbdError> {
        Ok(Self {
            ctx: DeviceContext::new(config)?,
            driver,
            descriptors,
            last_error: None,
        })
    }

    pub fn bind_interface(
        &mut self,
        interface: u8,
        class: Box<dyn UsbClass>,
    ) -> Result<(), UsbdError> {
        self.ctx.interfaces.bind(interface, class)
    }

    pub fn unbind_interface(&mut self, interface: u8) -> Option<Box<dyn UsbClass>> {
        self.ctx.interfaces.unbind(interface)
    }

    pub fn context(&self) -> &DeviceContext {
        &self.ctx
    }

    pub fn state(&self) -> DeviceState {
        self.ctx.state
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Reason the most recent request was stalled, cleared at the start of every request.
    pub fn last_error(&self) -> Option<&RequestError> {
        self.last_error.as_ref()
    }

    /// Decodes a raw SETUP packet and processes it.
    pub fn setup_stage(&mut self, packet: &[u8; SETUP_PACKET_LEN]) {
        let req = SetupRequest::parse(packet);
        self.handle_setup(&req);
    }

    /// Routes `req` to the device, interface or endpoint handler.
    ///
    /// Rejections never propagate: the host sees a STALL on EP0 and the device keeps accepting
    /// SETUP packets.
    pub fn handle_setup(&mut self, req: &SetupRequest) {
        tracing::trace!(recipient = ?req.recipient(), kind = ?req.kind(), request = %req, "setup");
        self.last_error = None;

        let ctx = &mut self.ctx;
        let driver: &mut dyn UsbDriver = &mut self.driver;
        let result = match req.recipient() {
            RequestRecipient::Device => match req.kind() {
                RequestKind::Standard => {
                    request::std_dev_req(ctx, driver, &*self.descriptors, req)
                }
                RequestKind::Class | RequestKind::Vendor | RequestKind::Reserved => {
                    request::class_dev_req(ctx, driver, req)
                }
            },
            RequestRecipient::Interface => request::std_itf_req(ctx, driver, req),
            RequestRecipient::Endpoint => request::std_ep_req(ctx, driver, req),
            RequestRecipient::Other | RequestRecipient::Reserved(_) => Err(
                RequestError::InvalidRecipient(req.request_type.bits()),
            ),
        };

        if let Err(err) = result {
            request::ctl_error(driver, req, &err);
            self.last_error = Some(err);
        }
    }

    /// USB bus reset: back to the default state at address 0.
    ///
    /// An active configuration is torn down first. Interface bindings survive the reset.
    pub fn reset(&mut self) {
        let configured = self.ctx.state == DeviceState::Configured
            || self.ctx.suspended_from == Some(DeviceState::Configured);
        if configured {
            let cfgidx = self.ctx.configuration;
            self.ctx.clear_class_config(cfgidx);
        }

        self.ctx.state = DeviceState::Default;
        self.ctx.suspended_from = None;
        self.ctx.address = 0;
        self.ctx.configuration = 0;
        self.ctx.remote_wakeup_enabled = false;
        self.ctx.speed = UsbSpeed::Full;
        self.last_error = None;
        tracing::debug!("bus reset");
    }

    /// Records the speed negotiated during reset.
    pub fn set_speed(&mut self, speed: UsbSpeed) {
        self.ctx.speed = speed;
    }

    pub fn suspend(&mut self) {
        if self.ctx.state == DeviceState::Suspended {
            return;
        }
        self.ctx.suspended_from = Some(self.ctx.state);
        self.ctx.state = DeviceState::Suspended;
        tracing::debug!(from = ?self.ctx.suspended_from, "suspended");
    }

    pub fn resume(&mut self) {
        if let Some(state) = self.ctx.suspended_from.take() {
            self.ctx.state = state;
            tracing::debug!(state = ?state, "resumed");
        }
    }
}
