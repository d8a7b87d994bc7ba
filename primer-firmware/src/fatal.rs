//! Terminal error path for bring-up

use defmt::*;
use primer_core::{BringUpError, FatalHandler};

/// Logs the error over RTT and stops the core
///
/// Interrupts are masked first so nothing scheduled later can run on half
/// configured hardware. A debugger attached over SWD still sees the halt.
pub struct Halt;

impl FatalHandler for Halt {
    fn fatal(&mut self, error: BringUpError) -> ! {
        error!("bring-up halted: {}", error);
        cortex_m::interrupt::disable();
        loop {
            cortex_m::asm::nop();
        }
    }
}
