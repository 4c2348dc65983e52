use crate::endpoint::EndpointAddress;

/// Endpoint hardware below the control-request engine.
///
/// Implementations program the controller (or, in the emulator, the device-side endpoint model).
/// Every method is called synchronously from within a single control transfer; none of them may
/// re-enter [`crate::UsbDevice`].
pub trait UsbDriver {
    /// Programs the device address. Called before the status stage of SET_ADDRESS is issued;
    /// controllers that latch the address only after the status ACK are expected to defer it.
    fn set_address(&mut self, address: u8);

    fn stall_endpoint(&mut self, ep: EndpointAddress);

    fn clear_stall(&mut self, ep: EndpointAddress);

    fn is_stalled(&self, ep: EndpointAddress) -> bool;

    /// Starts the IN data stage on EP0. `data` is already truncated to `wLength`; the driver
    /// copies it before returning.
    fn send_control_data(&mut self, data: &[u8]);

    /// Zero-length IN status stage.
    fn send_status(&mut self);

    /// Arms EP0 OUT for the host's zero-length status packet.
    fn receive_status(&mut self);
}
