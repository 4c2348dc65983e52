//! Device-side USB control endpoint (EP0) request engine.
//!
//! This crate implements the chapter 9 part of a USB device: SETUP packet decoding, the
//! Default/Addressed/Configured state machine, the standard device/interface/endpoint requests and
//! GET_DESCRIPTOR dispatch. Endpoint hardware sits below it ([`UsbDriver`]); class drivers and
//! descriptor tables plug in sideways ([`UsbClass`], [`DescriptorProvider`]).
//!
//! Every rejected request ends in the same place: both directions of EP0 are stalled and the
//! device state is left as it was.

extern crate alloc;

pub mod class;
pub mod config;
pub mod descriptor;
mod device;
pub mod driver;
pub mod endpoint;
pub mod error;
pub mod request;
pub mod setup;
pub mod state;

pub use class::{ClassError, UsbClass};
pub use config::UsbdConfig;
pub use descriptor::{DescriptorProvider, UsbSpeed};
pub use device::UsbDevice;
pub use driver::UsbDriver;
pub use endpoint::{EndpointAddress, EP0_IN, EP0_OUT};
pub use error::{RequestError, UsbdError};
pub use setup::{RequestDirection, RequestKind, RequestRecipient, RequestType, SetupRequest};
pub use state::{DeviceContext, DeviceState};
