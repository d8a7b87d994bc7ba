//! Primer - STM32F4-Discovery peripheral bring-up
//!
//! Brings the clock tree to 168 MHz, then runs the board bring-up once:
//! user button and LED pins, the USART1 console, the I2C1 bus and the
//! TIM2/TIM3 base timers. The resulting handles live in a static
//! `Peripherals` context for the rest of the program.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::time::Hertz;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use primer_core::board::discovery::{CONSOLE_UART, FAST_TIMER, SLOW_TIMER};
use primer_core::{bring_up, Peripherals};
use primer_hal_stm32f4::{Clocks, Stm32f4};

mod fatal;

/// Board crystal (X2)
const HSE_HZ: u32 = 8_000_000;

// Handles must outlive main's stack frame for application tasks
static PERIPHERALS: StaticCell<Peripherals<Stm32f4>> = StaticCell::new();

/// 8 MHz HSE -> PLL 336 MHz VCO -> 168 MHz SYSCLK, 48 MHz USB clock
fn clock_config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::*;

    let mut config = embassy_stm32::Config::default();
    config.rcc.hse = Some(Hse {
        freq: Hertz(HSE_HZ),
        mode: HseMode::Oscillator,
    });
    config.rcc.pll_src = PllSource::HSE;
    config.rcc.pll = Some(Pll {
        prediv: PllPreDiv::DIV8,
        mul: PllMul::MUL336,
        divp: Some(PllPDiv::DIV2),
        divq: Some(PllQDiv::DIV7),
        divr: None,
    });
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV4;
    config.rcc.apb2_pre = APBPrescaler::DIV2;
    config.rcc.sys = Sysclk::PLL1_P;
    config
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Primer firmware starting...");

    // Clock tree only; the peripherals below are configured by register
    let _p = embassy_stm32::init(clock_config());
    info!("Clock tree configured");

    let mut platform = Stm32f4::new(Clocks::DISCOVERY);
    let peripherals = PERIPHERALS.init(bring_up(&mut platform, &mut fatal::Halt));
    info!("{} peripherals ready", peripherals.len());

    // Timers are configured stopped; start both ticks
    for instance in [SLOW_TIMER, FAST_TIMER] {
        if let Some(timer) = peripherals.timer(instance) {
            timer.start();
        }
    }

    if peripherals.uart(CONSOLE_UART).is_some() {
        debug!("Console on {}", CONSOLE_UART);
    }

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Heartbeat");
    }
}
