//! General-purpose timer bring-up for STM32F4
//!
//! TIM2 and TIM5 have 32-bit counters, TIM3 and TIM4 16-bit ones. The
//! prescaler is 16 bits wide on all of them; a wider value is written and
//! the register keeps its low half. Timers are configured but left
//! stopped; [`Timer::start`] begins counting.

use embassy_stm32::pac;
use embassy_stm32::pac::timer::{vals, TimGp16, TimGp32};
use primer_hal::error::{InitError, PeripheralId};
use primer_hal::timer::{ClockDivision, CounterMode, TimerConfig, TimerInit, TimerInstance};

use crate::Stm32f4;

#[cfg(feature = "defmt")]
use defmt::warn;

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($($arg:tt)*) => {{}};
}

#[derive(Clone, Copy)]
enum Regs {
    Gp16(TimGp16),
    Gp32(TimGp32),
}

/// An initialized, stopped timer
pub struct Timer {
    instance: TimerInstance,
    regs: Regs,
}

impl Timer {
    /// Which timer this is
    pub fn instance(&self) -> TimerInstance {
        self.instance
    }

    /// Start counting
    pub fn start(&mut self) {
        match self.regs {
            Regs::Gp16(r) => r.cr1().modify(|w| w.set_cen(true)),
            Regs::Gp32(r) => r.cr1().modify(|w| w.set_cen(true)),
        }
    }

    /// Stop counting
    pub fn stop(&mut self) {
        match self.regs {
            Regs::Gp16(r) => r.cr1().modify(|w| w.set_cen(false)),
            Regs::Gp32(r) => r.cr1().modify(|w| w.set_cen(false)),
        }
    }

    /// Current counter value
    pub fn count(&self) -> u32 {
        match self.regs {
            Regs::Gp16(r) => u32::from(r.cnt().read().cnt()),
            Regs::Gp32(r) => r.cnt().read(),
        }
    }

    /// Check and clear the update (overflow) flag
    pub fn take_update(&mut self) -> bool {
        let pending = match self.regs {
            Regs::Gp16(r) => r.sr().read().uif(),
            Regs::Gp32(r) => r.sr().read().uif(),
        };
        if pending {
            match self.regs {
                Regs::Gp16(r) => r.sr().modify(|w| w.set_uif(false)),
                Regs::Gp32(r) => r.sr().modify(|w| w.set_uif(false)),
            }
        }
        pending
    }
}

fn dir_cms(mode: CounterMode) -> (vals::Dir, vals::Cms) {
    match mode {
        CounterMode::Up => (vals::Dir::UP, vals::Cms::EDGE_ALIGNED),
        CounterMode::Down => (vals::Dir::DOWN, vals::Cms::EDGE_ALIGNED),
        CounterMode::CenterAligned1 => (vals::Dir::UP, vals::Cms::CENTER_ALIGNED1),
        CounterMode::CenterAligned2 => (vals::Dir::UP, vals::Cms::CENTER_ALIGNED2),
        CounterMode::CenterAligned3 => (vals::Dir::UP, vals::Cms::CENTER_ALIGNED3),
    }
}

fn ckd(division: ClockDivision) -> vals::Ckd {
    match division {
        ClockDivision::Div1 => vals::Ckd::DIV1,
        ClockDivision::Div2 => vals::Ckd::DIV2,
        ClockDivision::Div4 => vals::Ckd::DIV4,
    }
}

fn enable_clock(instance: TimerInstance) {
    pac::RCC.apb1enr().modify(|w| match instance {
        TimerInstance::Tim2 => w.set_tim2en(true),
        TimerInstance::Tim3 => w.set_tim3en(true),
        TimerInstance::Tim4 => w.set_tim4en(true),
        TimerInstance::Tim5 => w.set_tim5en(true),
    });
}

// Same register layout on both widths, only ARR/CNT differ
macro_rules! configure {
    ($regs:expr, $config:expr, $psc:expr, $arr:expr) => {{
        let r = $regs;
        let (dir, cms) = dir_cms($config.counter_mode);
        r.cr1().modify(|w| {
            w.set_cen(false);
            w.set_dir(dir);
            w.set_cms(cms);
            w.set_ckd(ckd($config.clock_division));
            w.set_arpe(false);
        });
        r.psc().write_value($psc);
        r.arr().write_value($arr);
        // Load PSC/ARR now, then drop the update flag the load raised
        r.egr().write(|w| w.set_ug(true));
        r.sr().modify(|w| w.set_uif(false));
    }};
}

impl TimerInit for Stm32f4 {
    type Timer = Timer;

    fn init_timer(&mut self, config: &TimerConfig) -> Result<Timer, InitError> {
        let id = PeripheralId::Timer(config.instance);
        if config.period == 0 {
            return Err(InitError::invalid_config(id));
        }

        let psc = config.prescaler_register();
        if !config.prescaler_fits() {
            warn!(
                "{} prescaler {} exceeds PSC, effective divider {}",
                config.instance,
                config.prescaler,
                config.effective_divider()
            );
        }

        if config.assumed_clock_hz != self.clocks.apb1_timer_hz {
            warn!(
                "{} table assumes {} Hz, timer clock is {} Hz",
                config.instance, config.assumed_clock_hz, self.clocks.apb1_timer_hz
            );
        }

        let regs = match config.instance {
            TimerInstance::Tim2 | TimerInstance::Tim5 => {
                let r = if config.instance == TimerInstance::Tim2 {
                    pac::TIM2
                } else {
                    pac::TIM5
                };
                enable_clock(config.instance);
                configure!(r, config, psc, pac::timer::regs::Arr32(config.period));
                Regs::Gp32(r)
            }
            TimerInstance::Tim3 | TimerInstance::Tim4 => {
                let arr =
                    u16::try_from(config.period).map_err(|_| InitError::invalid_config(id))?;
                let r = if config.instance == TimerInstance::Tim3 {
                    pac::TIM3
                } else {
                    pac::TIM4
                };
                enable_clock(config.instance);
                configure!(r, config, psc, pac::timer::regs::Arr16(arr));
                Regs::Gp16(r)
            }
        };

        Ok(Timer {
            instance: config.instance,
            regs,
        })
    }
}
