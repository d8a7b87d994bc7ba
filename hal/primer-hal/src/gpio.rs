//! GPIO pin descriptors
//!
//! Describes how a single pin is set up at boot: its mode, pull resistor,
//! output speed and, for alternate-function pins, which peripheral signal
//! it carries.

use core::fmt;

use crate::i2c::I2cInstance;
use crate::uart::UartInstance;

/// Number of pins per GPIO port
pub const PINS_PER_PORT: u8 = 16;

/// GPIO port (bank)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
}

impl Port {
    /// Zero-based port index (A = 0)
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Port letter as used in pin names
    pub const fn letter(self) -> char {
        match self {
            Port::A => 'A',
            Port::B => 'B',
            Port::C => 'C',
            Port::D => 'D',
            Port::E => 'E',
            Port::F => 'F',
            Port::G => 'G',
            Port::H => 'H',
            Port::I => 'I',
        }
    }

    /// Create a port from its letter
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'A' => Some(Port::A),
            'B' => Some(Port::B),
            'C' => Some(Port::C),
            'D' => Some(Port::D),
            'E' => Some(Port::E),
            'F' => Some(Port::F),
            'G' => Some(Port::G),
            'H' => Some(Port::H),
            'I' => Some(Port::I),
            _ => None,
        }
    }
}

/// A single pin: port plus pin number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId {
    /// Owning port
    pub port: Port,
    /// Pin number within the port (0-15)
    pub number: u8,
}

impl PinId {
    /// Create a pin identifier
    pub const fn new(port: Port, number: u8) -> Self {
        Self { port, number }
    }

    /// Bit mask of this pin within its port registers
    pub const fn mask(self) -> u16 {
        1 << (self.number & 0x0F)
    }

    /// Whether the pin number exists on a port
    pub const fn is_valid(self) -> bool {
        self.number < PINS_PER_PORT
    }

    /// Parse a pin name
    ///
    /// Supports the "PA0" / "PB12" format.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.trim().strip_prefix('P')?;
        let mut chars = rest.chars();
        let port = Port::from_letter(chars.next()?)?;
        let digits = chars.as_str();
        // u8::from_str also takes a leading '+'
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number: u8 = digits.parse().ok()?;
        if number >= PINS_PER_PORT {
            return None;
        }
        Some(Self { port, number })
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Rendered into a small buffer so width/alignment flags apply
        let mut buf = [b'P', self.port.letter() as u8, 0, 0];
        let len = if self.number >= 10 {
            buf[2] = b'0' + self.number / 10 % 10;
            buf[3] = b'0' + self.number % 10;
            4
        } else {
            buf[2] = b'0' + self.number;
            3
        };
        f.pad(core::str::from_utf8(&buf[..len]).map_err(|_| fmt::Error)?)
    }
}

/// Pull resistor setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    #[default]
    None,
    Up,
    Down,
}

impl Pull {
    /// Configuration name
    pub const fn name(self) -> &'static str {
        match self {
            Pull::None => "none",
            Pull::Up => "pull_up",
            Pull::Down => "pull_down",
        }
    }

    /// Parse a configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Pull::None),
            "pull_up" => Some(Pull::Up),
            "pull_down" => Some(Pull::Down),
            _ => None,
        }
    }
}

/// Output slew rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl Speed {
    /// Configuration name
    pub const fn name(self) -> &'static str {
        match self {
            Speed::Low => "low",
            Speed::Medium => "medium",
            Speed::High => "high",
            Speed::VeryHigh => "very_high",
        }
    }

    /// Parse a configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "low" => Some(Speed::Low),
            "medium" => Some(Speed::Medium),
            "high" => Some(Speed::High),
            "very_high" => Some(Speed::VeryHigh),
            _ => None,
        }
    }
}

/// Alternate-function selector value (AF0-AF15)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AltFunction(pub u8);

/// Peripheral signal routed to a pin in alternate-function mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signal {
    UartTx(UartInstance),
    UartRx(UartInstance),
    I2cScl(I2cInstance),
    I2cSda(I2cInstance),
}

impl Signal {
    /// Alternate-function selector that routes this signal on STM32F4
    pub const fn alternate_function(self) -> AltFunction {
        match self {
            Signal::UartTx(u) | Signal::UartRx(u) => match u {
                UartInstance::Usart1 | UartInstance::Usart2 | UartInstance::Usart3 => {
                    AltFunction(7)
                }
                UartInstance::Usart6 => AltFunction(8),
            },
            Signal::I2cScl(_) | Signal::I2cSda(_) => AltFunction(4),
        }
    }

    /// Configuration name, e.g. "usart1_tx"
    pub const fn name(self) -> &'static str {
        match self {
            Signal::UartTx(UartInstance::Usart1) => "usart1_tx",
            Signal::UartRx(UartInstance::Usart1) => "usart1_rx",
            Signal::UartTx(UartInstance::Usart2) => "usart2_tx",
            Signal::UartRx(UartInstance::Usart2) => "usart2_rx",
            Signal::UartTx(UartInstance::Usart3) => "usart3_tx",
            Signal::UartRx(UartInstance::Usart3) => "usart3_rx",
            Signal::UartTx(UartInstance::Usart6) => "usart6_tx",
            Signal::UartRx(UartInstance::Usart6) => "usart6_rx",
            Signal::I2cScl(I2cInstance::I2c1) => "i2c1_scl",
            Signal::I2cSda(I2cInstance::I2c1) => "i2c1_sda",
            Signal::I2cScl(I2cInstance::I2c2) => "i2c2_scl",
            Signal::I2cSda(I2cInstance::I2c2) => "i2c2_sda",
            Signal::I2cScl(I2cInstance::I2c3) => "i2c3_scl",
            Signal::I2cSda(I2cInstance::I2c3) => "i2c3_sda",
        }
    }

    /// Parse a configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        let (instance, signal) = name.split_once('_')?;
        if let Some(uart) = UartInstance::from_name(instance) {
            return match signal {
                "tx" => Some(Signal::UartTx(uart)),
                "rx" => Some(Signal::UartRx(uart)),
                _ => None,
            };
        }
        let i2c = I2cInstance::from_name(instance)?;
        match signal {
            "scl" => Some(Signal::I2cScl(i2c)),
            "sda" => Some(Signal::I2cSda(i2c)),
            _ => None,
        }
    }
}

/// Pin mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Digital input
    #[default]
    Input,
    /// Push-pull digital output
    OutputPushPull,
    /// Open-drain digital output
    OutputOpenDrain,
    /// Push-pull alternate function carrying a peripheral signal
    Alternate(Signal),
}

impl PinMode {
    /// Signal carried by this pin, if in alternate-function mode
    pub const fn signal(self) -> Option<Signal> {
        match self {
            PinMode::Alternate(signal) => Some(signal),
            _ => None,
        }
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinMode::Input => f.write_str("input"),
            PinMode::OutputPushPull => f.write_str("output"),
            PinMode::OutputOpenDrain => f.write_str("output_open_drain"),
            PinMode::Alternate(signal) => {
                write!(f, "af{} {}", signal.alternate_function().0, signal.name())
            }
        }
    }
}

/// Complete configuration of one pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// Which pin
    pub pin: PinId,
    /// Pin mode
    pub mode: PinMode,
    /// Pull resistor
    pub pull: Pull,
    /// Output speed
    pub speed: Speed,
}

impl PinConfig {
    /// Digital input, no pull, medium speed
    pub const fn input(pin: PinId) -> Self {
        Self {
            pin,
            mode: PinMode::Input,
            pull: Pull::None,
            speed: Speed::Medium,
        }
    }

    /// Push-pull output, no pull, medium speed
    pub const fn output(pin: PinId) -> Self {
        Self {
            pin,
            mode: PinMode::OutputPushPull,
            pull: Pull::None,
            speed: Speed::Medium,
        }
    }

    /// Alternate-function push-pull carrying `signal`, no pull, medium speed
    pub const fn alternate(pin: PinId, signal: Signal) -> Self {
        Self {
            pin,
            mode: PinMode::Alternate(signal),
            pull: Pull::None,
            speed: Speed::Medium,
        }
    }

    /// Replace the pull setting
    pub const fn with_pull(mut self, pull: Pull) -> Self {
        self.pull = pull;
        self
    }

    /// Replace the speed setting
    pub const fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    /// Whether this pin is routed to `signal`
    pub fn carries(&self, signal: Signal) -> bool {
        self.mode == PinMode::Alternate(signal)
    }
}

/// Port clock and pin configuration
///
/// Pin configuration cannot fail on the supported hardware; faults at this
/// level are hardware traps handled by the platform itself.
pub trait GpioControl {
    /// Switch on the clock domain of a port
    ///
    /// Must be called before any pin of that port is configured.
    fn enable_port_clock(&mut self, port: Port);

    /// Apply a pin configuration
    fn configure_pin(&mut self, config: &PinConfig);
}
