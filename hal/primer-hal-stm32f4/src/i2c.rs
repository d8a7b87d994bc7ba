//! I2C controller bring-up for STM32F4
//!
//! The F4 I2C block (v1) needs the APB1 frequency in CR2, the SCL divider
//! in CCR and the maximum rise time in TRISE, all computed from the bus
//! speed.

use embassy_stm32::pac;
use embassy_stm32::pac::i2c::vals;
use primer_hal::error::{InitError, PeripheralId};
use primer_hal::i2c::{
    AddressingMode, DualAddress, DutyCycle, GeneralCall, I2cConfig, I2cInit, I2cInstance,
    NoStretch, FAST_MODE_HZ, STANDARD_MODE_HZ,
};

use crate::Stm32f4;

/// Peripheral clock range accepted in CR2.FREQ, in MHz
const FREQ_MHZ: core::ops::RangeInclusive<u32> = 2..=50;

/// An initialized I2C controller
pub struct I2c {
    instance: I2cInstance,
    regs: pac::i2c::I2c,
}

impl I2c {
    /// Which controller this is
    pub fn instance(&self) -> I2cInstance {
        self.instance
    }

    /// Register block, for drivers built on top
    pub fn regs(&self) -> pac::i2c::I2c {
        self.regs
    }
}

/// Timing register values for one bus speed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timings {
    /// CR2.FREQ
    pub freq_mhz: u8,
    /// CCR.CCR
    pub ccr: u16,
    /// CCR.F/S
    pub fast: bool,
    /// TRISE
    pub trise: u8,
}

/// Compute timing registers
///
/// Standard mode below 100 kHz inclusive, fast mode up to 400 kHz. `None`
/// when the clock or speed cannot be produced.
pub fn timings(pclk_hz: u32, speed_hz: u32, duty: DutyCycle) -> Option<Timings> {
    let freq_mhz = pclk_hz / 1_000_000;
    if !FREQ_MHZ.contains(&freq_mhz) || speed_hz == 0 || speed_hz > FAST_MODE_HZ {
        return None;
    }

    let (ccr, fast, trise) = if speed_hz <= STANDARD_MODE_HZ {
        // 1000 ns max rise time
        let ccr = (pclk_hz / (speed_hz * 2)).max(4);
        (ccr, false, freq_mhz + 1)
    } else {
        // 300 ns max rise time
        let ccr = match duty {
            DutyCycle::Two => pclk_hz / (speed_hz * 3),
            DutyCycle::SixteenNine => pclk_hz / (speed_hz * 25),
        }
        .max(1);
        (ccr, true, freq_mhz * 300 / 1000 + 1)
    };

    // CCR is 12 bits wide
    if ccr > 0x0FFF {
        return None;
    }

    Some(Timings {
        freq_mhz: freq_mhz as u8,
        ccr: ccr as u16,
        fast,
        trise: trise as u8,
    })
}

fn regs(instance: I2cInstance) -> pac::i2c::I2c {
    match instance {
        I2cInstance::I2c1 => pac::I2C1,
        I2cInstance::I2c2 => pac::I2C2,
        I2cInstance::I2c3 => pac::I2C3,
    }
}

fn enable_clock(instance: I2cInstance) {
    pac::RCC.apb1enr().modify(|w| match instance {
        I2cInstance::I2c1 => w.set_i2c1en(true),
        I2cInstance::I2c2 => w.set_i2c2en(true),
        I2cInstance::I2c3 => w.set_i2c3en(true),
    });
}

impl I2cInit for Stm32f4 {
    type I2c = I2c;

    fn init_i2c(&mut self, config: &I2cConfig) -> Result<I2c, InitError> {
        let id = PeripheralId::I2c(config.instance);
        if !config.own_address_fits() {
            return Err(InitError::invalid_config(id));
        }
        let t = timings(self.clocks.pclk1_hz, config.clock_speed, config.duty_cycle)
            .ok_or(InitError::invalid_config(id))?;

        enable_clock(config.instance);
        let r = regs(config.instance);

        r.cr1().modify(|w| w.set_pe(false));

        r.cr2().modify(|w| w.set_freq(t.freq_mhz));
        r.trise().write(|w| w.set_trise(t.trise));
        r.ccr().write(|w| {
            w.set_ccr(t.ccr);
            w.set_f_s(if t.fast {
                vals::FS::FAST
            } else {
                vals::FS::STANDARD
            });
            w.set_duty(match config.duty_cycle {
                DutyCycle::Two => vals::Duty::DUTY2_1,
                DutyCycle::SixteenNine => vals::Duty::DUTY16_9,
            });
        });

        r.oar1().write(|w| {
            match config.addressing_mode {
                AddressingMode::SevenBit => {
                    w.set_addmode(vals::Addmode::BIT7);
                    // 7-bit address sits in ADD[7:1]
                    w.set_add(config.own_address1 << 1);
                }
                AddressingMode::TenBit => {
                    w.set_addmode(vals::Addmode::BIT10);
                    w.set_add(config.own_address1);
                }
            }
        });
        r.oar2().write(|w| {
            w.set_endual(match config.dual_address {
                DualAddress::Disabled => vals::Endual::SINGLE,
                DualAddress::Enabled => vals::Endual::DUAL,
            });
            w.set_add2(config.own_address2);
        });

        r.cr1().modify(|w| {
            w.set_engc(config.general_call == GeneralCall::Enabled);
            // NOSTRETCH set means stretching is off
            w.set_nostretch(config.no_stretch == NoStretch::Enabled);
            w.set_pe(true);
        });

        // A target holding SDA or SCL low leaves the bus busy after enable
        if r.sr2().read().busy() {
            r.cr1().modify(|w| w.set_pe(false));
            return Err(InitError::not_responding(id));
        }

        Ok(I2c {
            instance: config.instance,
            regs: r,
        })
    }
}
