//! UART serial port descriptors
//!
//! Field-for-field description of an asynchronous serial port setup and
//! the trait a platform implements to apply it.

use crate::error::InitError;
use crate::gpio::PinId;

/// Serial port instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartInstance {
    Usart1,
    Usart2,
    Usart3,
    Usart6,
}

impl UartInstance {
    /// Peripheral name as printed in reference manuals
    pub const fn name(self) -> &'static str {
        match self {
            UartInstance::Usart1 => "USART1",
            UartInstance::Usart2 => "USART2",
            UartInstance::Usart3 => "USART3",
            UartInstance::Usart6 => "USART6",
        }
    }

    /// Parse a peripheral name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        [
            UartInstance::Usart1,
            UartInstance::Usart2,
            UartInstance::Usart3,
            UartInstance::Usart6,
        ]
        .into_iter()
        .find(|u| u.name().eq_ignore_ascii_case(name))
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WordLength {
    #[default]
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

impl Parity {
    /// Configuration name
    pub const fn name(self) -> &'static str {
        match self {
            Parity::None => "none",
            Parity::Even => "even",
            Parity::Odd => "odd",
        }
    }

    /// Parse a configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Parity::None),
            "even" => Some(Parity::Even),
            "odd" => Some(Parity::Odd),
            _ => None,
        }
    }
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    #[default]
    One,
    Two,
}

/// Which directions are enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Tx,
    Rx,
    #[default]
    TxRx,
}

impl Direction {
    /// Transmitter enabled
    pub const fn has_tx(self) -> bool {
        matches!(self, Direction::Tx | Direction::TxRx)
    }

    /// Receiver enabled
    pub const fn has_rx(self) -> bool {
        matches!(self, Direction::Rx | Direction::TxRx)
    }
}

/// Hardware flow control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlowControl {
    #[default]
    None,
    Rts,
    Cts,
    RtsCts,
}

/// Receiver oversampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    #[default]
    By16,
    By8,
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Which serial port
    pub instance: UartInstance,
    /// Pin carrying TX
    pub tx_pin: PinId,
    /// Pin carrying RX
    pub rx_pin: PinId,
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Data bits per frame
    pub word_length: WordLength,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Enabled directions
    pub direction: Direction,
    /// Hardware flow control
    pub flow_control: FlowControl,
    /// Receiver oversampling
    pub oversampling: Oversampling,
    /// Skipped by bring-up when false
    pub enabled: bool,
}

/// Default baud rate
pub const DEFAULT_BAUDRATE: u32 = 115_200;

impl UartConfig {
    /// 115200 8N1, TX+RX, no flow control, 16x oversampling
    pub const fn new(instance: UartInstance, tx_pin: PinId, rx_pin: PinId) -> Self {
        Self {
            instance,
            tx_pin,
            rx_pin,
            baudrate: DEFAULT_BAUDRATE,
            word_length: WordLength::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            direction: Direction::TxRx,
            flow_control: FlowControl::None,
            oversampling: Oversampling::By16,
            enabled: true,
        }
    }

    /// Replace the baud rate
    pub const fn with_baudrate(mut self, baudrate: u32) -> Self {
        self.baudrate = baudrate;
        self
    }
}

/// Serial port bring-up
pub trait UartInit {
    /// Handle to an initialized serial port
    type Uart;

    /// Apply the configuration and return the live handle
    ///
    /// The signal pins must already be configured for this instance.
    fn init_uart(&mut self, config: &UartConfig) -> Result<Self::Uart, InitError>;
}
