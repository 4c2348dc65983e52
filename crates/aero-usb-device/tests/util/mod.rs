#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use aero_usb_device::descriptor::{string_descriptor, string_descriptor_langid};
use aero_usb_device::{
    ClassError, DescriptorProvider, EndpointAddress, SetupRequest, UsbClass, UsbDevice,
    UsbDriver, UsbSpeed, UsbdConfig,
};

pub const REQ_GET_STATUS: u8 = 0x00;
pub const REQ_CLEAR_FEATURE: u8 = 0x01;
pub const REQ_SET_FEATURE: u8 = 0x03;
pub const REQ_SET_ADDRESS: u8 = 0x05;
pub const REQ_GET_DESCRIPTOR: u8 = 0x06;
pub const REQ_GET_CONFIGURATION: u8 = 0x08;
pub const REQ_SET_CONFIGURATION: u8 = 0x09;

pub const DEVICE_DESCRIPTOR: [u8; 18] = [
    0x12, // bLength
    0x01, // bDescriptorType (Device)
    0x00, 0x02, // bcdUSB (2.00)
    0x00, // bDeviceClass
    0x00, // bDeviceSubClass
    0x00, // bDeviceProtocol
    0x40, // bMaxPacketSize0 (64)
    0x34, 0x12, // idVendor (0x1234)
    0x01, 0x00, // idProduct (0x0001)
    0x00, 0x01, // bcdDevice (1.00)
    0x01, // iManufacturer
    0x02, // iProduct
    0x03, // iSerialNumber
    0x01, // bNumConfigurations
];

pub const FS_CONFIG_DESCRIPTOR: [u8; 9] = [0x09, 0x02, 0x09, 0x00, 0x01, 0x01, 0x00, 0xa0, 0x32];
pub const HS_CONFIG_DESCRIPTOR: [u8; 9] = [0x09, 0x02, 0x09, 0x00, 0x01, 0x01, 0x00, 0xa0, 0xfa];
pub const OTHER_SPEED_CONFIG_DESCRIPTOR: [u8; 9] =
    [0x09, 0x07, 0x09, 0x00, 0x01, 0x01, 0x00, 0xa0, 0x32];
pub const DEVICE_QUALIFIER_DESCRIPTOR: [u8; 10] =
    [0x0a, 0x06, 0x00, 0x02, 0x00, 0x00, 0x00, 0x40, 0x01, 0x00];
pub const BOS_DESCRIPTOR: [u8; 12] = [
    0x05, 0x0f, 0x0c, 0x00, 0x01, // BOS header
    0x07, 0x10, 0x02, 0x06, 0x00, 0x00, 0x00, // USB 2.0 extension (LPM)
];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Builds a SETUP request through the wire decoder.
pub fn setup(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> SetupRequest {
    let [v0, v1] = value.to_le_bytes();
    let [i0, i1] = index.to_le_bytes();
    let [l0, l1] = length.to_le_bytes();
    SetupRequest::parse(&[request_type, request, v0, v1, i0, i1, l0, l1])
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverEvent {
    SetAddress(u8),
    Stall(u8),
    ClearStall(u8),
    Data(Vec<u8>),
    Status,
    ReceiveStatus,
}

/// Endpoint driver that records every call in order.
#[derive(Default)]
pub struct RecordingDriver {
    pub events: Vec<DriverEvent>,
    stalled: BTreeSet<u8>,
}

impl RecordingDriver {
    pub fn take_events(&mut self) -> Vec<DriverEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn ep0_stalled(&self) -> bool {
        self.stalled.contains(&0x00) && self.stalled.contains(&0x80)
    }
}

impl UsbDriver for RecordingDriver {
    fn set_address(&mut self, address: u8) {
        self.events.push(DriverEvent::SetAddress(address));
    }

    fn stall_endpoint(&mut self, ep: EndpointAddress) {
        self.stalled.insert(ep.raw());
        self.events.push(DriverEvent::Stall(ep.raw()));
    }

    fn clear_stall(&mut self, ep: EndpointAddress) {
        self.stalled.remove(&ep.raw());
        self.events.push(DriverEvent::ClearStall(ep.raw()));
    }

    fn is_stalled(&self, ep: EndpointAddress) -> bool {
        self.stalled.contains(&ep.raw())
    }

    fn send_control_data(&mut self, data: &[u8]) {
        self.events.push(DriverEvent::Data(data.to_vec()));
    }

    fn send_status(&mut self) {
        self.events.push(DriverEvent::Status);
    }

    fn receive_status(&mut self) {
        self.events.push(DriverEvent::ReceiveStatus);
    }
}

/// The two events every rejected request produces.
pub fn ep0_stall() -> Vec<DriverEvent> {
    vec![DriverEvent::Stall(0x80), DriverEvent::Stall(0x00)]
}

pub struct TestDescriptors {
    langid: [u8; 4],
    manufacturer: Vec<u8>,
    product: Vec<u8>,
    serial: Vec<u8>,
    configuration: Vec<u8>,
    interface: Vec<u8>,
    bos: Option<Vec<u8>>,
}

fn ascii_string(s: &str) -> Vec<u8> {
    let mut buf = [0u8; 256];
    let len = string_descriptor(s.as_bytes(), &mut buf);
    buf[..len].to_vec()
}

impl TestDescriptors {
    pub fn new() -> Self {
        Self {
            langid: string_descriptor_langid(0x0409),
            manufacturer: ascii_string("Aero"),
            product: ascii_string("Aero Test Device"),
            serial: ascii_string("0001"),
            configuration: ascii_string("Default"),
            interface: ascii_string("Test Interface"),
            bos: None,
        }
    }

    pub fn with_bos() -> Self {
        Self {
            bos: Some(BOS_DESCRIPTOR.to_vec()),
            ..Self::new()
        }
    }
}

impl DescriptorProvider for TestDescriptors {
    fn device_descriptor(&self, _speed: UsbSpeed) -> &[u8] {
        &DEVICE_DESCRIPTOR
    }

    fn lang_id_string(&self, _speed: UsbSpeed) -> &[u8] {
        &self.langid
    }

    fn manufacturer_string(&self, _speed: UsbSpeed) -> &[u8] {
        &self.manufacturer
    }

    fn product_string(&self, _speed: UsbSpeed) -> &[u8] {
        &self.product
    }

    fn serial_string(&self, _speed: UsbSpeed) -> &[u8] {
        &self.serial
    }

    fn configuration_string(&self, _speed: UsbSpeed) -> &[u8] {
        &self.configuration
    }

    fn interface_string(&self, _speed: UsbSpeed) -> &[u8] {
        &self.interface
    }

    fn bos_descriptor(&self, _speed: UsbSpeed) -> Option<&[u8]> {
        self.bos.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassCall {
    Init(u8),
    Deinit(u8),
    Setup(SetupRequest),
}

#[derive(Default)]
pub struct ClassState {
    pub calls: Vec<ClassCall>,
    pub fail_init: bool,
    pub fail_setup: bool,
    /// Data stage the class sends for requests it accepts.
    pub reply: Option<Vec<u8>>,
}

/// Class driver whose state is shared with the test through `Rc<RefCell<_>>`.
#[derive(Clone)]
pub struct MockClass {
    state: Rc<RefCell<ClassState>>,
    user_string: Vec<u8>,
}

impl MockClass {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ClassState::default())),
            user_string: ascii_string("User"),
        }
    }

    pub fn calls(&self) -> Vec<ClassCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn fail_init(&self, fail: bool) {
        self.state.borrow_mut().fail_init = fail;
    }

    pub fn fail_setup(&self, fail: bool) {
        self.state.borrow_mut().fail_setup = fail;
    }

    pub fn reply_with(&self, data: &[u8]) {
        self.state.borrow_mut().reply = Some(data.to_vec());
    }
}

impl UsbClass for MockClass {
    fn init(&mut self, cfgidx: u8) -> Result<(), ClassError> {
        let mut st = self.state.borrow_mut();
        st.calls.push(ClassCall::Init(cfgidx));
        if st.fail_init {
            return Err(ClassError::UnsupportedConfiguration(cfgidx));
        }
        Ok(())
    }

    fn deinit(&mut self, cfgidx: u8) {
        self.state.borrow_mut().calls.push(ClassCall::Deinit(cfgidx));
    }

    fn setup(&mut self, driver: &mut dyn UsbDriver, req: &SetupRequest) -> Result<(), ClassError> {
        let mut st = self.state.borrow_mut();
        st.calls.push(ClassCall::Setup(*req));
        if st.fail_setup {
            driver.stall_endpoint(aero_usb_device::EP0_IN);
            driver.stall_endpoint(aero_usb_device::EP0_OUT);
            return Err(ClassError::Rejected(req.request));
        }
        if let Some(reply) = &st.reply {
            driver.send_control_data(reply);
        }
        Ok(())
    }

    fn hs_config_descriptor(&self) -> Option<&[u8]> {
        Some(&HS_CONFIG_DESCRIPTOR)
    }

    fn fs_config_descriptor(&self) -> Option<&[u8]> {
        Some(&FS_CONFIG_DESCRIPTOR)
    }

    fn other_speed_config_descriptor(&self) -> Option<&[u8]> {
        Some(&OTHER_SPEED_CONFIG_DESCRIPTOR)
    }

    fn device_qualifier_descriptor(&self) -> Option<&[u8]> {
        Some(&DEVICE_QUALIFIER_DESCRIPTOR)
    }

    fn user_string_descriptor(&self, value: u16) -> Option<&[u8]> {
        ((value & 0x00ff) == 0xee).then_some(self.user_string.as_slice())
    }
}

pub type TestDevice = UsbDevice<RecordingDriver>;

pub fn device_with(config: UsbdConfig, descriptors: TestDescriptors) -> TestDevice {
    init_tracing();
    UsbDevice::new(config, RecordingDriver::default(), Box::new(descriptors))
        .expect("valid test configuration")
}

pub fn device() -> TestDevice {
    device_with(UsbdConfig::default(), TestDescriptors::new())
}

/// Device with `class` bound at interface 0.
pub fn device_with_class(class: &MockClass) -> TestDevice {
    let mut dev = device();
    dev.bind_interface(0, Box::new(class.clone()))
        .expect("interface 0 is free");
    dev
}

/// Runs `req` and returns the driver calls it produced.
pub fn run(dev: &mut TestDevice, req: SetupRequest) -> Vec<DriverEvent> {
    dev.driver_mut().take_events();
    dev.handle_setup(&req);
    dev.driver_mut().take_events()
}

pub fn set_address(dev: &mut TestDevice, address: u16) -> Vec<DriverEvent> {
    run(dev, setup(0x00, REQ_SET_ADDRESS, address, 0, 0))
}

pub fn set_configuration(dev: &mut TestDevice, cfgidx: u16) -> Vec<DriverEvent> {
    run(dev, setup(0x00, REQ_SET_CONFIGURATION, cfgidx, 0, 0))
}

/// SET_ADDRESS(1) followed by SET_CONFIGURATION(1).
pub fn enumerate(dev: &mut TestDevice) {
    assert_eq!(set_address(dev, 1), vec![DriverEvent::SetAddress(1), DriverEvent::Status]);
    assert_eq!(set_configuration(dev, 1), vec![DriverEvent::Status]);
}
