use serde::{Deserialize, Serialize};

/// A serial device found by [`Ports::scan_ports`](crate::Ports::scan_ports).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    name: String,
    port_path: String,
    bus_path: String,
    id: u16,
}

impl Device {
    pub fn new(
        name: impl Into<String>,
        port_path: impl Into<String>,
        bus_path: impl Into<String>,
        id: u16,
    ) -> Self {
        Self {
            name: name.into(),
            port_path: port_path.into(),
            bus_path: bus_path.into(),
            id,
        }
    }

    /// Link name under `/dev/serial/by-id`, e.g. `usb-FTDI_FT232R_USB_UART_A1B2C3D4`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device node to open, e.g. `/dev/ttyUSB0`.
    pub fn port_path(&self) -> &str {
        &self.port_path
    }

    /// Physical location of the device; the port path when it is unknown.
    pub fn bus_path(&self) -> &str {
        &self.bus_path
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_port_path(&mut self, port_path: impl Into<String>) {
        self.port_path = port_path.into();
    }

    pub fn set_bus_path(&mut self, bus_path: impl Into<String>) {
        self.bus_path = bus_path.into();
    }

    pub fn set_id(&mut self, id: u16) {
        self.id = id;
    }
}
