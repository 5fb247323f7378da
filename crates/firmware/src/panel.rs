//! The panel front end: two CD74HC4067-style analog multiplexers sharing four address lines, read by ADC1, and a chain
//! of six 74HC165 shift registers carrying the buttons and switches.

use embassy_stm32::{
    adc::{Adc, AnyAdcChannel},
    gpio::{Input, Output},
    peripherals::ADC1,
};
use source_voice_lib::control_surface::{ControlInputs, DIGITAL_INPUTS, MuxBank};

/// Core clock cycles to wait after switching multiplexer lines, about 2µs at 216MHz.
const MUX_SETTLE_CYCLES: u32 = 432;

/// The on-chip ADC converts at 12 bits; the scanner works in 10.
const ADC_EXTRA_BITS: u32 = 2;

/// Hardware implementation of [`ControlInputs`].
pub struct Panel {
    adc: Adc<'static, ADC1>,
    /// Multiplexer outputs, indexed like [`MuxBank::ALL`].
    mux_outputs: [AnyAdcChannel<ADC1>; 2],
    /// Multiplexer address lines, least significant first.
    address: [Output<'static>; 4],
    /// Parallel load, active low.
    shift_load: Output<'static>,
    shift_clock: Output<'static>,
    shift_data: Input<'static>,
    /// The whole shift-register chain as of the last load; bit `n` is input `n`, set when pressed.
    buttons: u64,
}

impl Panel {
    /// Constructs a [`Panel`] and takes a first snapshot of the buttons.
    pub fn new(
        adc: Adc<'static, ADC1>,
        mux_outputs: [AnyAdcChannel<ADC1>; 2],
        address: [Output<'static>; 4],
        shift_load: Output<'static>,
        shift_clock: Output<'static>,
        shift_data: Input<'static>,
    ) -> Self {
        let mut panel = Self {
            adc,
            mux_outputs,
            address,
            shift_load,
            shift_clock,
            shift_data,
            buttons: 0,
        };
        panel.shift_load.set_high();
        panel.shift_clock.set_low();
        panel.load_buttons();
        panel
    }

    /// Latches every button into the shift registers and clocks the chain out.
    ///
    /// The inputs are pulled up, so a pressed button reads low.
    fn load_buttons(&mut self) {
        self.shift_load.set_low();
        cortex_m::asm::delay(MUX_SETTLE_CYCLES);
        self.shift_load.set_high();

        let mut buttons = 0;
        for bit in 0..DIGITAL_INPUTS {
            if self.shift_data.is_low() {
                buttons |= 1 << bit;
            }
            self.shift_clock.set_high();
            self.shift_clock.set_low();
        }
        self.buttons = buttons;
    }
}

impl ControlInputs for Panel {
    fn select_line(&mut self, line: u8) {
        for (n, pin) in self.address.iter_mut().enumerate() {
            if line & (1 << n) != 0 {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
        // one snapshot of the chain serves a whole round of lines
        if line == 0 {
            self.load_buttons();
        }
        cortex_m::asm::delay(MUX_SETTLE_CYCLES);
    }

    fn convert(&mut self, bank: MuxBank) -> u16 {
        let channel = match bank {
            MuxBank::One => &mut self.mux_outputs[0],
            MuxBank::Two => &mut self.mux_outputs[1],
        };
        self.adc.blocking_read(channel) >> ADC_EXTRA_BITS
    }

    fn read_button(&mut self, bit: u8) -> bool {
        self.buttons & (1 << bit) != 0
    }
}
