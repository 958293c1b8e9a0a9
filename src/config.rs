use crate::error::{Error, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Port settings, loadable from YAML.
///
/// ```yaml
/// baud_rate: 115200
/// parity: even
/// canonical_mode: disable
/// read_timeout: 500ms
/// ```
///
/// Missing keys take the defaults of a freshly opened [`Serial`](crate::Serial).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_length: DataLength,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    pub canonical_mode: CanonicalMode,
    pub terminator: Terminator,
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,
    pub max_safe_read_size: usize,
    /// VTIME in deciseconds
    pub timeout: u8,
    /// VMIN
    pub min_number_char_read: u8,
}

impl SerialConfig {
    pub const DEFAULT_BAUD_RATE: u32 = 9600;
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);
    pub const DEFAULT_MAX_SAFE_READ_SIZE: usize = 4096;

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_error = |reason: String| Error::ConfigFile {
            path: path.to_path_buf(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|err| config_error(err.to_string()))?;
        let config = Self::from_yaml(&text).map_err(|err| config_error(err.to_string()))?;
        log::debug!("Loaded {config:?} from '{}'", path.display());
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: Self::DEFAULT_BAUD_RATE,
            data_length: DataLength::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            canonical_mode: CanonicalMode::Enable,
            terminator: Terminator::Lf,
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
            write_timeout: Duration::ZERO,
            max_safe_read_size: Self::DEFAULT_MAX_SAFE_READ_SIZE,
            timeout: 0,
            min_number_char_read: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(SerialConfig::from_yaml("{}").unwrap(), SerialConfig::default());
    }

    #[test]
    fn partial_document() {
        let config = SerialConfig::from_yaml(
            "baud_rate: 115200\nparity: odd\ncanonical_mode: disable\nterminator: cr\nread_timeout: 250ms\n",
        )
        .unwrap();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.parity, Parity::Odd);
        assert_eq!(config.canonical_mode, CanonicalMode::Disable);
        assert_eq!(config.terminator, Terminator::Cr);
        assert_eq!(config.read_timeout, Duration::from_millis(250));
        assert_eq!(config.data_length, DataLength::Eight);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(SerialConfig::from_yaml("baudrate: 9600").is_err());
    }

    #[test]
    fn from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serial.yaml");
        std::fs::write(&path, "stop_bits: two\nmin_number_char_read: 0\ntimeout: 5\n").unwrap();
        let config = SerialConfig::from_file(&path).unwrap();
        assert_eq!(config.stop_bits, StopBits::Two);
        assert_eq!(config.min_number_char_read, 0);
        assert_eq!(config.timeout, 5);

        let missing = dir.path().join("missing.yaml");
        let err = SerialConfig::from_file(&missing).unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
        assert!(err.to_string().contains("missing.yaml"));
    }
}
