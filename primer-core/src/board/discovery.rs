//! STM32F4-Discovery board table
//!
//! STM32F407VG, 168 MHz SYSCLK. Uses the user button, the green LED, a
//! debug console on USART1 and the I2C1 bus on PB6/PB7, plus two base
//! timers.

use primer_hal::gpio::{PinConfig, PinId, Port, Pull, Signal, Speed};
use primer_hal::i2c::{I2cConfig, I2cInstance};
use primer_hal::timer::{TimerConfig, TimerInstance};
use primer_hal::uart::{UartConfig, UartInstance};

use super::BoardManifest;

/// System clock
pub const SYSCLK_HZ: u32 = 168_000_000;

/// User button (B1)
pub const USER_BUTTON: PinId = PinId::new(Port::A, 0);
/// Green user LED (LD4)
pub const STATUS_LED: PinId = PinId::new(Port::D, 12);
/// Debug console TX
pub const CONSOLE_TX: PinId = PinId::new(Port::A, 9);
/// Debug console RX
pub const CONSOLE_RX: PinId = PinId::new(Port::A, 10);
/// I2C bus clock
pub const I2C_SCL: PinId = PinId::new(Port::B, 6);
/// I2C bus data
pub const I2C_SDA: PinId = PinId::new(Port::B, 7);

/// Console serial port
pub const CONSOLE_UART: UartInstance = UartInstance::Usart1;
/// Board I2C bus
pub const BOARD_I2C: I2cInstance = I2cInstance::I2c1;
/// Slow tick timer: 1 ms counter tick at 84 MHz
pub const SLOW_TIMER: TimerInstance = TimerInstance::Tim2;
/// Fast tick timer: 1 ms update period at 168 MHz
pub const FAST_TIMER: TimerInstance = TimerInstance::Tim3;

const PINS: [PinConfig; 6] = [
    PinConfig::input(USER_BUTTON).with_pull(Pull::Up),
    PinConfig::output(STATUS_LED),
    PinConfig::alternate(CONSOLE_TX, Signal::UartTx(CONSOLE_UART)).with_speed(Speed::High),
    PinConfig::alternate(CONSOLE_RX, Signal::UartRx(CONSOLE_UART))
        .with_pull(Pull::Up)
        .with_speed(Speed::High),
    PinConfig::alternate(I2C_SCL, Signal::I2cScl(BOARD_I2C)),
    PinConfig::alternate(I2C_SDA, Signal::I2cSda(BOARD_I2C)),
];

const UARTS: [UartConfig; 1] = [UartConfig::new(CONSOLE_UART, CONSOLE_TX, CONSOLE_RX)];

const I2CS: [I2cConfig; 1] = [I2cConfig::new(BOARD_I2C, I2C_SCL, I2C_SDA)];

const TIMERS: [TimerConfig; 2] = [
    TimerConfig::from_divider(SLOW_TIMER, 84_000, 1_000, 84_000_000),
    TimerConfig::from_divider(FAST_TIMER, 168, 1_000, 168_000_000),
];

/// The STM32F4-Discovery bring-up table
pub const STM32F4_DISCOVERY: BoardManifest<'static> = BoardManifest {
    name: "STM32F4-Discovery",
    mcu: "STM32F407VG",
    sysclk_hz: SYSCLK_HZ,
    pins: &PINS,
    uarts: &UARTS,
    i2cs: &I2CS,
    timers: &TIMERS,
};
