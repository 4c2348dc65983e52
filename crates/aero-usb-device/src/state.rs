//! Device state and the interface binding table.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::class::{ClassError, UsbClass};
use crate::config::UsbdConfig;
use crate::descriptor::UsbSpeed;
use crate::error::UsbdError;

/// USB 2.0 §9.1 visible device state, as far as the control-request engine is concerned.
///
/// `Suspended` is entered and left only through bus events ([`crate::UsbDevice::suspend`] /
/// [`crate::UsbDevice::resume`]); no request is valid in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceState {
    Default,
    Addressed,
    Configured,
    Suspended,
}

/// Fixed-capacity table of class drivers indexed by interface number.
pub struct Interfaces {
    slots: Vec<Option<Box<dyn UsbClass>>>,
}

impl Interfaces {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// An interface is a valid recipient when it is within the table and bound.
    pub fn is_valid(&self, interface: u8) -> bool {
        self.get(interface).is_some()
    }

    pub fn get(&self, interface: u8) -> Option<&dyn UsbClass> {
        self.slots.get(usize::from(interface))?.as_deref()
    }

    pub fn get_mut(&mut self, interface: u8) -> Option<&mut (dyn UsbClass + 'static)> {
        self.slots.get_mut(usize::from(interface))?.as_deref_mut()
    }

    pub fn bind(&mut self, interface: u8, class: Box<dyn UsbClass>) -> Result<(), UsbdError> {
        let capacity = self.capacity();
        let slot = self
            .slots
            .get_mut(usize::from(interface))
            .ok_or(UsbdError::InterfaceOutOfRange {
                interface,
                capacity,
            })?;
        if slot.is_some() {
            return Err(UsbdError::InterfaceAlreadyBound(interface));
        }
        *slot = Some(class);
        Ok(())
    }

    pub fn unbind(&mut self, interface: u8) -> Option<Box<dyn UsbClass>> {
        self.slots.get_mut(usize::from(interface))?.take()
    }

    pub(crate) fn bound_mut(
        &mut self,
    ) -> impl Iterator<Item = &mut (dyn UsbClass + 'static)> + '_ {
        self.slots.iter_mut().filter_map(|slot| slot.as_deref_mut())
    }
}

/// Everything the request handlers read and mutate.
///
/// Owned by [`crate::UsbDevice`] and passed explicitly to every handler; there is no other copy of
/// this state.
pub struct DeviceContext {
    pub(crate) state: DeviceState,
    /// State to return to on resume.
    pub(crate) suspended_from: Option<DeviceState>,
    pub(crate) address: u8,
    pub(crate) configuration: u8,
    /// Value reported by GET_CONFIGURATION while addressed. Always 0.
    pub(crate) default_configuration: u8,
    pub(crate) remote_wakeup_enabled: bool,
    pub(crate) speed: UsbSpeed,
    pub(crate) interfaces: Interfaces,
    pub(crate) config: UsbdConfig,
}

impl DeviceContext {
    pub fn new(config: UsbdConfig) -> Result<Self, UsbdError> {
        config.validate()?;
        Ok(Self {
            state: DeviceState::Default,
            suspended_from: None,
            address: 0,
            configuration: 0,
            default_configuration: 0,
            remote_wakeup_enabled: false,
            speed: UsbSpeed::Full,
            interfaces: Interfaces::new(config.max_interfaces),
            config,
        })
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn configuration(&self) -> u8 {
        self.configuration
    }

    pub fn remote_wakeup_enabled(&self) -> bool {
        self.remote_wakeup_enabled
    }

    pub fn self_powered(&self) -> bool {
        self.config.self_powered
    }

    pub fn speed(&self) -> UsbSpeed {
        self.speed
    }

    pub fn interfaces(&self) -> &Interfaces {
        &self.interfaces
    }

    pub fn config(&self) -> &UsbdConfig {
        &self.config
    }

    /// Calls `init` on every bound class in slot order.
    ///
    /// On the first failure the classes already initialized are deinitialized again; the failing
    /// class and the ones after it are left alone.
    pub(crate) fn set_class_config(&mut self, cfgidx: u8) -> Result<(), ClassError> {
        let mut initialized = 0;
        let mut failure = None;
        for class in self.interfaces.bound_mut() {
            if let Err(err) = class.init(cfgidx) {
                failure = Some(err);
                break;
            }
            initialized += 1;
        }

        match failure {
            None => Ok(()),
            Some(err) => {
                for class in self.interfaces.bound_mut().take(initialized) {
                    class.deinit(cfgidx);
                }
                Err(err)
            }
        }
    }

    pub(crate) fn clear_class_config(&mut self, cfgidx: u8) {
        for class in self.interfaces.bound_mut() {
            class.deinit(cfgidx);
        }
    }
}
