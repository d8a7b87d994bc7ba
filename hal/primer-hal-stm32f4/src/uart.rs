//! USART bring-up for STM32F4
//!
//! Asynchronous mode only: LIN, smartcard, IrDA and half-duplex stay off.

use embassy_stm32::pac;
use embassy_stm32::pac::usart::vals;
use primer_hal::error::{InitError, PeripheralId};
use primer_hal::uart::{
    FlowControl, Oversampling, Parity, StopBits, UartConfig, UartInit, UartInstance, WordLength,
};

use crate::Stm32f4;

/// Smallest USARTDIV the baud generator accepts
const MIN_USARTDIV: u32 = 16;

/// An initialized serial port
///
/// The port is enabled with the transmitter and receiver requested by its
/// configuration; data transfer belongs to the application.
pub struct Uart {
    instance: UartInstance,
    regs: pac::usart::Usart,
}

impl Uart {
    /// Which USART this is
    pub fn instance(&self) -> UartInstance {
        self.instance
    }

    /// Register block, for drivers built on top
    pub fn regs(&self) -> pac::usart::Usart {
        self.regs
    }
}

fn regs(instance: UartInstance) -> pac::usart::Usart {
    match instance {
        UartInstance::Usart1 => pac::USART1,
        UartInstance::Usart2 => pac::USART2,
        UartInstance::Usart3 => pac::USART3,
        UartInstance::Usart6 => pac::USART6,
    }
}

/// Baud rate register value
///
/// `None` when the divider falls outside what the generator can express.
pub fn brr(pclk_hz: u32, baudrate: u32, oversampling: Oversampling) -> Option<u16> {
    if baudrate == 0 {
        return None;
    }
    let pclk = u64::from(pclk_hz);
    let baud = u64::from(baudrate);

    let div = match oversampling {
        Oversampling::By16 => (pclk + baud / 2) / baud,
        Oversampling::By8 => (2 * pclk + baud / 2) / baud,
    };
    let div = u32::try_from(div).ok()?;
    if !(MIN_USARTDIV..=u32::from(u16::MAX)).contains(&div) {
        return None;
    }

    let brr = match oversampling {
        Oversampling::By16 => div,
        // Fraction is 3 bits wide with 8x oversampling
        Oversampling::By8 => (div & 0xFFF0) | ((div & 0x000F) >> 1),
    };
    u16::try_from(brr).ok()
}

impl Stm32f4 {
    fn uart_clock_hz(&self, instance: UartInstance) -> u32 {
        match instance {
            UartInstance::Usart1 | UartInstance::Usart6 => self.clocks.pclk2_hz,
            UartInstance::Usart2 | UartInstance::Usart3 => self.clocks.pclk1_hz,
        }
    }
}

fn enable_clock(instance: UartInstance) {
    match instance {
        UartInstance::Usart1 => pac::RCC.apb2enr().modify(|w| w.set_usart1en(true)),
        UartInstance::Usart6 => pac::RCC.apb2enr().modify(|w| w.set_usart6en(true)),
        UartInstance::Usart2 => pac::RCC.apb1enr().modify(|w| w.set_usart2en(true)),
        UartInstance::Usart3 => pac::RCC.apb1enr().modify(|w| w.set_usart3en(true)),
    }
}

impl UartInit for Stm32f4 {
    type Uart = Uart;

    fn init_uart(&mut self, config: &UartConfig) -> Result<Uart, InitError> {
        let id = PeripheralId::Uart(config.instance);
        let div = brr(
            self.uart_clock_hz(config.instance),
            config.baudrate,
            config.oversampling,
        )
        .ok_or(InitError::invalid_config(id))?;

        enable_clock(config.instance);
        let r = regs(config.instance);

        r.cr1().modify(|w| w.set_ue(false));

        r.cr2().modify(|w| {
            w.set_stop(match config.stop_bits {
                StopBits::One => vals::Stop::STOP1,
                StopBits::Two => vals::Stop::STOP2,
            });
            w.set_linen(false);
            w.set_clken(false);
        });

        r.cr3().modify(|w| {
            w.set_rtse(matches!(
                config.flow_control,
                FlowControl::Rts | FlowControl::RtsCts
            ));
            w.set_ctse(matches!(
                config.flow_control,
                FlowControl::Cts | FlowControl::RtsCts
            ));
            w.set_scen(false);
            w.set_hdsel(false);
            w.set_iren(false);
        });

        r.brr().write_value(pac::usart::regs::Brr(u32::from(div)));

        r.cr1().modify(|w| {
            w.set_m0(match config.word_length {
                WordLength::Eight => vals::M0::BIT8,
                WordLength::Nine => vals::M0::BIT9,
            });
            w.set_pce(config.parity != Parity::None);
            w.set_ps(match config.parity {
                Parity::Odd => vals::Ps::ODD,
                Parity::None | Parity::Even => vals::Ps::EVEN,
            });
            w.set_over8(match config.oversampling {
                Oversampling::By16 => vals::Over8::OVERSAMPLING16,
                Oversampling::By8 => vals::Over8::OVERSAMPLING8,
            });
            w.set_te(config.direction.has_tx());
            w.set_re(config.direction.has_rx());
            w.set_ue(true);
        });

        Ok(Uart {
            instance: config.instance,
            regs: r,
        })
    }
}
