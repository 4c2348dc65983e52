use thiserror::Error;

use crate::class::ClassError;
use crate::endpoint::EndpointAddress;
use crate::state::DeviceState;

/// Why a control request was rejected.
///
/// Every variant ends in the same place on the wire: both directions of EP0 are stalled. The
/// distinction only exists for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request 0x{request:02x} not allowed in {state:?} state")]
    InvalidState { request: u8, state: DeviceState },

    #[error("interface {0} is not bound")]
    InvalidInterface(u8),

    #[error("endpoint {0} is out of range")]
    InvalidEndpoint(EndpointAddress),

    #[error("unsupported recipient (bmRequestType=0x{0:02x})")]
    InvalidRecipient(u8),

    #[error("invalid request fields: {0}")]
    InvalidFields(&'static str),

    #[error("unsupported request 0x{0:02x}")]
    UnsupportedRequest(u8),

    #[error("no descriptor for type 0x{descriptor_type:02x} index {index}")]
    UnsupportedDescriptor { descriptor_type: u8, index: u8 },

    #[error("failed to activate configuration {cfgidx}: {source}")]
    ConfigurationActivation {
        cfgidx: u8,
        #[source]
        source: ClassError,
    },
}

/// Errors outside of a control transfer: building the device and binding class drivers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsbdError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("interface {interface} exceeds the binding table (capacity {capacity})")]
    InterfaceOutOfRange { interface: u8, capacity: usize },

    #[error("interface {0} is already bound")]
    InterfaceAlreadyBound(u8),
}
