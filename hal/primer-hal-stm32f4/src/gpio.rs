//! GPIO port clocks and pin configuration

use embassy_stm32::pac;
use embassy_stm32::pac::gpio::vals;
use primer_hal::gpio::{GpioControl, PinConfig, PinMode, Port, Pull, Speed};

use crate::Stm32f4;

fn port_regs(port: Port) -> pac::gpio::Gpio {
    match port {
        Port::A => pac::GPIOA,
        Port::B => pac::GPIOB,
        Port::C => pac::GPIOC,
        Port::D => pac::GPIOD,
        Port::E => pac::GPIOE,
        Port::F => pac::GPIOF,
        Port::G => pac::GPIOG,
        Port::H => pac::GPIOH,
        Port::I => pac::GPIOI,
    }
}

fn moder(mode: PinMode) -> vals::Moder {
    match mode {
        PinMode::Input => vals::Moder::INPUT,
        PinMode::OutputPushPull | PinMode::OutputOpenDrain => vals::Moder::OUTPUT,
        PinMode::Alternate(_) => vals::Moder::ALTERNATE,
    }
}

fn output_type(mode: PinMode) -> vals::Ot {
    match mode {
        PinMode::OutputOpenDrain => vals::Ot::OPEN_DRAIN,
        _ => vals::Ot::PUSH_PULL,
    }
}

fn pupdr(pull: Pull) -> vals::Pupdr {
    match pull {
        Pull::None => vals::Pupdr::FLOATING,
        Pull::Up => vals::Pupdr::PULL_UP,
        Pull::Down => vals::Pupdr::PULL_DOWN,
    }
}

fn ospeedr(speed: Speed) -> vals::Ospeedr {
    match speed {
        Speed::Low => vals::Ospeedr::LOW_SPEED,
        Speed::Medium => vals::Ospeedr::MEDIUM_SPEED,
        Speed::High => vals::Ospeedr::HIGH_SPEED,
        Speed::VeryHigh => vals::Ospeedr::VERY_HIGH_SPEED,
    }
}

impl GpioControl for Stm32f4 {
    fn enable_port_clock(&mut self, port: Port) {
        pac::RCC.ahb1enr().modify(|w| match port {
            Port::A => w.set_gpioaen(true),
            Port::B => w.set_gpioben(true),
            Port::C => w.set_gpiocen(true),
            Port::D => w.set_gpioden(true),
            Port::E => w.set_gpioeen(true),
            Port::F => w.set_gpiofen(true),
            Port::G => w.set_gpiogen(true),
            Port::H => w.set_gpiohen(true),
            Port::I => w.set_gpioien(true),
        });
        // Dummy read so the clock is running before the first register write
        let _ = pac::RCC.ahb1enr().read();
    }

    fn configure_pin(&mut self, config: &PinConfig) {
        let regs = port_regs(config.pin.port);
        let n = usize::from(config.pin.number & 0x0F);

        // AF selector goes in before the mode switch so the pin never
        // drives the wrong peripheral
        if let Some(signal) = config.mode.signal() {
            let af = signal.alternate_function().0;
            regs.afr(n / 8).modify(|w| w.set_afr(n % 8, af));
        }

        regs.pupdr().modify(|w| w.set_pupdr(n, pupdr(config.pull)));
        regs.otyper().modify(|w| w.set_ot(n, output_type(config.mode)));
        regs.ospeedr()
            .modify(|w| w.set_ospeedr(n, ospeedr(config.speed)));
        regs.moder().modify(|w| w.set_moder(n, moder(config.mode)));
    }
}
