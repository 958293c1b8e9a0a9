use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Standard line speeds. Any other rate can be passed to
/// [`Serial::set_baud_rate`](crate::Serial::set_baud_rate) as a plain `u32`.
///
/// Serialized as its number, so `115200` in a YAML file reads back as
/// `Baud115200`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(u32)]
pub enum BaudRate {
    Baud50 = 50,
    Baud75 = 75,
    Baud110 = 110,
    Baud134 = 134,
    Baud150 = 150,
    Baud200 = 200,
    Baud300 = 300,
    Baud600 = 600,
    Baud1200 = 1200,
    Baud1800 = 1800,
    Baud2400 = 2400,
    Baud4800 = 4800,
    Baud9600 = 9600,
    Baud19200 = 19200,
    Baud38400 = 38400,
    Baud57600 = 57600,
    Baud115200 = 115200,
    Baud230400 = 230400,
    Baud460800 = 460800,
    Baud500000 = 500000,
    Baud576000 = 576000,
    Baud921600 = 921600,
    Baud1000000 = 1000000,
    Baud1152000 = 1152000,
    Baud1500000 = 1500000,
    Baud2000000 = 2000000,
    Baud2500000 = 2500000,
    Baud3000000 = 3000000,
    Baud3500000 = 3500000,
    Baud4000000 = 4000000,
}

impl BaudRate {
    pub const ALL: [BaudRate; 30] = [
        BaudRate::Baud50,
        BaudRate::Baud75,
        BaudRate::Baud110,
        BaudRate::Baud134,
        BaudRate::Baud150,
        BaudRate::Baud200,
        BaudRate::Baud300,
        BaudRate::Baud600,
        BaudRate::Baud1200,
        BaudRate::Baud1800,
        BaudRate::Baud2400,
        BaudRate::Baud4800,
        BaudRate::Baud9600,
        BaudRate::Baud19200,
        BaudRate::Baud38400,
        BaudRate::Baud57600,
        BaudRate::Baud115200,
        BaudRate::Baud230400,
        BaudRate::Baud460800,
        BaudRate::Baud500000,
        BaudRate::Baud576000,
        BaudRate::Baud921600,
        BaudRate::Baud1000000,
        BaudRate::Baud1152000,
        BaudRate::Baud1500000,
        BaudRate::Baud2000000,
        BaudRate::Baud2500000,
        BaudRate::Baud3000000,
        BaudRate::Baud3500000,
        BaudRate::Baud4000000,
    ];

    /// Rates commonly supported by USB serial adapters, slowest first.
    pub const COMMON: [BaudRate; 9] = [
        BaudRate::Baud1200,
        BaudRate::Baud2400,
        BaudRate::Baud4800,
        BaudRate::Baud9600,
        BaudRate::Baud19200,
        BaudRate::Baud38400,
        BaudRate::Baud57600,
        BaudRate::Baud115200,
        BaudRate::Baud230400,
    ];
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> u32 {
        rate as u32
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Error> {
        BaudRate::ALL
            .into_iter()
            .find(|rate| u32::from(*rate) == value)
            .ok_or(Error::UnsupportedBaudRate(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataLength {
    Five,
    Six,
    Seven,
    Eight,
}

impl From<DataLength> for serialport::DataBits {
    fn from(length: DataLength) -> Self {
        match length {
            DataLength::Five => serialport::DataBits::Five,
            DataLength::Six => serialport::DataBits::Six,
            DataLength::Seven => serialport::DataBits::Seven,
            DataLength::Eight => serialport::DataBits::Eight,
        }
    }
}

impl From<serialport::DataBits> for DataLength {
    fn from(bits: serialport::DataBits) -> Self {
        match bits {
            serialport::DataBits::Five => DataLength::Five,
            serialport::DataBits::Six => DataLength::Six,
            serialport::DataBits::Seven => DataLength::Seven,
            serialport::DataBits::Eight => DataLength::Eight,
        }
    }
}

/// Parity checking. Enabling parity without choosing a kind means `Even`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Even,
    Odd,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Even => serialport::Parity::Even,
            Parity::Odd => serialport::Parity::Odd,
        }
    }
}

impl From<serialport::Parity> for Parity {
    fn from(parity: serialport::Parity) -> Self {
        match parity {
            serialport::Parity::None => Parity::None,
            serialport::Parity::Even => Parity::Even,
            serialport::Parity::Odd => Parity::Odd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(stop_bits: StopBits) -> Self {
        match stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

impl From<serialport::StopBits> for StopBits {
    fn from(stop_bits: serialport::StopBits) -> Self {
        match stop_bits {
            serialport::StopBits::One => StopBits::One,
            serialport::StopBits::Two => StopBits::Two,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    None,
    /// XON/XOFF
    Software,
    /// RTS/CTS
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow_control: FlowControl) -> Self {
        match flow_control {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

impl From<serialport::FlowControl> for FlowControl {
    fn from(flow_control: serialport::FlowControl) -> Self {
        match flow_control {
            serialport::FlowControl::None => FlowControl::None,
            serialport::FlowControl::Software => FlowControl::Software,
            serialport::FlowControl::Hardware => FlowControl::Hardware,
        }
    }
}

/// Whether the kernel line discipline buffers input line by line.
///
/// In canonical mode [`Serial::read`](crate::Serial::read) returns whole lines;
/// in raw mode [`Serial::read_bytes`](crate::Serial::read_bytes) returns as
/// soon as the VMIN/VTIME thresholds are met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalMode {
    Enable,
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Terminator {
    /// End of transmission
    Eot = 4,
    Lf = 10,
    Cr = 13,
}

impl From<Terminator> for u8 {
    fn from(terminator: Terminator) -> u8 {
        terminator as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baud_rate_numeric_values() {
        assert_eq!(u32::from(BaudRate::Baud9600), 9600);
        assert_eq!(u32::from(BaudRate::Baud115200), 115_200);
        assert_eq!(u32::from(BaudRate::Baud4000000), 4_000_000);
        assert!(BaudRate::COMMON
            .windows(2)
            .all(|w| u32::from(w[0]) < u32::from(w[1])));
    }

    #[test]
    fn baud_rate_from_number() {
        for rate in BaudRate::ALL {
            assert_eq!(BaudRate::try_from(u32::from(rate)).unwrap(), rate);
        }
        assert!(matches!(
            BaudRate::try_from(12345),
            Err(Error::UnsupportedBaudRate(12345))
        ));
    }

    #[test]
    fn baud_rate_serializes_as_number() {
        assert_eq!(
            serde_yaml::to_string(&BaudRate::Baud115200).unwrap().trim(),
            "115200"
        );
        let rate: BaudRate = serde_yaml::from_str("57600").unwrap();
        assert_eq!(rate, BaudRate::Baud57600);

        let err = serde_yaml::from_str::<BaudRate>("12345").unwrap_err();
        assert!(err.to_string().contains("Unsupported baud rate: 12345"));
    }

    #[test]
    fn terminator_bytes() {
        assert_eq!(u8::from(Terminator::Eot), 0x04);
        assert_eq!(u8::from(Terminator::Cr), b'\r');
        assert_eq!(u8::from(Terminator::Lf), b'\n');
    }

    // A pty forces CS8 and clears PARENB, so these two settings only round
    // trip through a real UART; the conversions are checked here instead.
    #[test]
    fn data_length_and_parity_conversions() {
        for length in [
            DataLength::Five,
            DataLength::Six,
            DataLength::Seven,
            DataLength::Eight,
        ] {
            assert_eq!(DataLength::from(serialport::DataBits::from(length)), length);
        }
        assert_eq!(
            serialport::DataBits::from(DataLength::Seven),
            serialport::DataBits::Seven
        );
        assert_eq!(
            DataLength::from(serialport::DataBits::Five),
            DataLength::Five
        );

        for parity in [Parity::None, Parity::Even, Parity::Odd] {
            assert_eq!(Parity::from(serialport::Parity::from(parity)), parity);
        }
        assert_eq!(
            serialport::Parity::from(Parity::Odd),
            serialport::Parity::Odd
        );
        assert_eq!(Parity::from(serialport::Parity::None), Parity::None);
    }

    #[test]
    fn flow_control_and_stop_bits_conversions() {
        assert_eq!(
            serialport::FlowControl::from(FlowControl::Hardware),
            serialport::FlowControl::Hardware
        );
        assert_eq!(StopBits::from(serialport::StopBits::Two), StopBits::Two);
    }
}
