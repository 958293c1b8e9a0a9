//! Serial device discovery through the udev link directories.
//!
//! udev keeps one symbolic link per serial device in `/dev/serial/by-id`, named
//! after the device and pointing at its node (`../../ttyUSB0`). A sibling
//! `by-path` directory names the same nodes after their bus location.

use crate::device::Device;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BY_ID_DIR: &str = "/dev/serial/by-id";

const DEV_DIR: &str = "/dev";
const BY_PATH_DIR: &str = "by-path";

#[derive(Debug, Clone)]
pub struct Ports {
    dir: PathBuf,
    devices: Vec<Device>,
}

impl Default for Ports {
    fn default() -> Self {
        Self::new()
    }
}

impl Ports {
    /// Discovery over the system's `/dev/serial/by-id`.
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_BY_ID_DIR)
    }

    /// Discovery over any directory laid out like `/dev/serial/by-id`.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            devices: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rebuilds the device list and returns the number of devices found.
    ///
    /// Devices are ordered by link name and numbered from 0. Entries that are
    /// not symbolic links are skipped.
    pub fn scan_ports(&mut self) -> Result<u16> {
        self.devices.clear();

        let entries = fs::read_dir(&self.dir).map_err(|source| Error::Scan {
            path: self.dir.clone(),
            source,
        })?;

        let mut links = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::Scan {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            match link_target_name(&path) {
                Some(tty) => links.push((entry.file_name().to_string_lossy().into_owned(), tty)),
                None => log::warn!("Skipping '{}': not a device link", path.display()),
            }
        }
        links.sort();

        let bus_paths = self.bus_paths();
        for ((name, tty), id) in links.into_iter().zip(0u16..) {
            let port_path = format!("{DEV_DIR}/{tty}");
            let bus_path = bus_paths
                .get(&tty)
                .cloned()
                .unwrap_or_else(|| port_path.clone());
            log::debug!("Found device {id}: {name} -> {port_path} ({bus_path})");
            self.devices
                .push(Device::new(name, port_path, bus_path, id));
        }

        Ok(self.devices.len() as u16)
    }

    /// Maps device node names (`ttyUSB0`) to their `by-path` link.
    fn bus_paths(&self) -> HashMap<String, String> {
        let Some(by_path) = self.dir.parent().map(|parent| parent.join(BY_PATH_DIR)) else {
            return HashMap::new();
        };
        let entries = match fs::read_dir(&by_path) {
            Ok(entries) => entries,
            Err(err) => {
                log::debug!("No bus paths from '{}': {err}", by_path.display());
                return HashMap::new();
            }
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                let tty = link_target_name(&path)?;
                Some((tty, path.to_string_lossy().into_owned()))
            })
            .collect()
    }

    pub fn find_name(&self, id: u16) -> Option<&str> {
        self.find(id).map(Device::name)
    }

    pub fn find_port_path(&self, id: u16) -> Option<&str> {
        self.find(id).map(Device::port_path)
    }

    pub fn find_bus_path(&self, id: u16) -> Option<&str> {
        self.find(id).map(Device::bus_path)
    }

    fn find(&self, id: u16) -> Option<&Device> {
        self.devices.iter().find(|device| device.id() == id)
    }

    /// Devices found by the last scan.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Replaces the content of `devices` with the devices found by the last scan.
    pub fn get_devices(&self, devices: &mut Vec<Device>) {
        devices.clear();
        devices.extend_from_slice(&self.devices);
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// File name of the node a link points at, `None` if `path` is no link.
fn link_target_name(path: &Path) -> Option<String> {
    let target = fs::read_link(path).ok()?;
    target
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;

    fn by_id_dir(root: &Path) -> PathBuf {
        let dir = root.join("by-id");
        fs::create_dir(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_directory_is_an_error() {
        let mut ports = Ports::with_dir("/this/path/should/not/exist/serial/by-id");
        let err = ports.scan_ports().unwrap_err();
        assert!(matches!(err, Error::Scan { .. }));
        assert!(err.to_string().contains("Error while reading"));
        assert!(!err.is_io());
    }

    #[test]
    fn default_uses_system_directory() {
        assert_eq!(Ports::default().dir(), Path::new(DEFAULT_BY_ID_DIR));
        assert!(Ports::new().is_empty());
    }

    #[test]
    fn scan_fake_devices() {
        let root = tempfile::tempdir().unwrap();
        let dir = by_id_dir(root.path());
        symlink("../../ttyUSB0", dir.join("usb-FTDI_FT232R_USB_UART_A1B2C3D4")).unwrap();
        symlink("../../ttyUSB1", dir.join("usb-Arduino_Uno_12345678")).unwrap();

        let mut ports = Ports::with_dir(&dir);
        assert_eq!(ports.scan_ports().unwrap(), 2);
        assert_eq!(ports.len(), 2);

        assert_eq!(ports.find_name(0), Some("usb-Arduino_Uno_12345678"));
        assert_eq!(ports.find_name(1), Some("usb-FTDI_FT232R_USB_UART_A1B2C3D4"));
        assert_eq!(ports.find_port_path(0), Some("/dev/ttyUSB1"));
        assert_eq!(ports.find_port_path(1), Some("/dev/ttyUSB0"));
        // no by-path directory next to by-id
        assert_eq!(ports.find_bus_path(0), Some("/dev/ttyUSB1"));
        assert_eq!(ports.find_bus_path(1), Some("/dev/ttyUSB0"));
        assert_eq!(ports.find_name(2), None);
    }

    #[test]
    fn bus_path_from_sibling_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = by_id_dir(root.path());
        let by_path = root.path().join(BY_PATH_DIR);
        fs::create_dir(&by_path).unwrap();
        let bus_link = by_path.join("pci-0000:00:14.0-usb-0:1:1.0-port0");
        symlink("../../ttyUSB3", dir.join("usb-Device_Two_0002")).unwrap();
        symlink("../../ttyUSB3", &bus_link).unwrap();

        let mut ports = Ports::with_dir(&dir);
        assert_eq!(ports.scan_ports().unwrap(), 1);
        assert_eq!(ports.find_port_path(0), Some("/dev/ttyUSB3"));
        assert_eq!(ports.find_bus_path(0), Some(bus_link.to_str().unwrap()));
    }

    #[test]
    fn get_devices_replaces_list() {
        let root = tempfile::tempdir().unwrap();
        let dir = by_id_dir(root.path());
        symlink("../../ttyUSB2", dir.join("usb-Device_One_0001")).unwrap();
        symlink("../../ttyUSB3", dir.join("usb-Device_Two_0002")).unwrap();
        fs::write(dir.join("not-a-link"), b"").unwrap();

        let mut ports = Ports::with_dir(&dir);
        ports.scan_ports().unwrap();

        let mut devices = vec![Device::default(); 5];
        ports.get_devices(&mut devices);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name(), "usb-Device_One_0001");
        assert_eq!(devices[1].name(), "usb-Device_Two_0002");
        assert_eq!(devices[1].id(), 1);
        assert_eq!(devices, ports.devices());
    }

    #[test]
    fn rescan_clears_previous_devices() {
        let root = tempfile::tempdir().unwrap();
        let dir = by_id_dir(root.path());
        let link = dir.join("usb-Device_One_0001");
        symlink("../../ttyACM0", &link).unwrap();

        let mut ports = Ports::with_dir(&dir);
        assert_eq!(ports.scan_ports().unwrap(), 1);
        fs::remove_file(&link).unwrap();
        assert_eq!(ports.scan_ports().unwrap(), 0);
        assert!(ports.is_empty());
    }
}
