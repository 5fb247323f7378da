//! Source Voice is [Embassy](https://embassy.dev)-based control firmware for a MIDI-controlled analog synthesizer voice
//! modeled on the Moog Source. The firmware runs on the [Nucleo-F767ZI development
//! board](https://www.st.com/en/evaluation-tools/nucleo-f767zi.html), which is powered by an F7-series STM32
//! microcontroller.
//!
//! A single control loop scans the panel's potentiometers and buttons into synthesis parameters, runs the arpeggiator
//! and the two-track step sequencer, and plays incoming USB-MIDI notes, all expressed as
//! [CV/gate](https://en.wikipedia.org/wiki/CV/gate) signals for the analog voice. The portable logic lives in
//! `source_voice_lib`; this crate binds it to the board's peripherals.

#![no_std]
#![no_main]

mod midi;
mod panel;
mod storage;
mod voice;

use crate::{
    midi::MIDI_EVENTS,
    panel::Panel,
    storage::FlashSettings,
    voice::Voice,
};
use defmt::*;
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_stm32::{
    Config,
    adc::{Adc, AdcChannel},
    bind_interrupts,
    dac::Dac,
    flash::Flash,
    gpio::{Input, Level, Output, Pull, Speed},
    peripherals,
    time::Hertz,
    usb,
};
use embassy_usb::{Builder, class::midi::MidiClass};
use source_voice_lib::{
    configuration::Settings,
    control_surface::{ControlScanner, ScannerConfig},
    parameters::PanelParameters,
    performance::Performance,
    time_base::{EmbassyTimeBase, TimeBase},
};
use static_cell::StaticCell;

use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(
    #[doc(hidden)]
    struct Irqs {
        OTG_FS => usb::InterruptHandler<peripherals::USB_OTG_FS>;
    }
);

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Initializing Source Voice");

    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        // hse: high-speed external clock
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Bypass,
        });

        // pll: phase-locked loop, crucial for dividing clock
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL216,
            divp: Some(PllPDiv::DIV2), // 8mhz / 4 * 216 / 2 = 216Mhz
            // the 48MHz clock used for USB OTG FS is derived from the main PLL's Q output
            divq: Some(PllQDiv::DIV9), // 8mhz / 4 * 216 / 9 = 48Mhz
            divr: None,
        });
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.mux.clk48sel = mux::Clk48sel::PLL1_Q;
    }
    let p = embassy_stm32::init(config);

    let persistence = FlashSettings::new(Flash::new_blocking(p.FLASH));
    let settings = Settings::restore(&persistence);

    // Create the driver, from the HAL.
    static ENDPOINT_OUT_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();
    let mut config = embassy_stm32::usb::Config::default();

    // The board is powered independently of the USB port, so it must detect VBUS to comply with the USB spec.
    config.vbus_detection = true;

    let driver = usb::Driver::new_fs(
        p.USB_OTG_FS,
        Irqs,
        p.PA12,
        p.PA11,
        ENDPOINT_OUT_BUFFER.init([0; 256]),
        config,
    );

    // per https://pid.codes, FOSS projects can apply to be listed under the vendor ID owned by InterBiometrics;
    // 0x0001 is its test product ID, to be replaced once one is allocated
    let vendor_id = 0x1209;
    let product_id = 0x0001;

    let mut config = embassy_usb::Config::new(vendor_id, product_id);
    config.manufacturer = Some("Source Voice");
    config.product = Some("Source Voice");
    config.self_powered = true;
    config.max_power = 0;

    // Create embassy-usb DeviceBuilder using the driver and config.
    // It needs some buffers for building the descriptors.
    static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [], // no msos descriptors
        CONTROL_BUFFER.init([0; 64]),
    );

    let class = MidiClass::new(&mut builder, 0, 1, 64);
    let usb = builder.build();

    unwrap!(spawner.spawn(midi::usb_task(usb)));
    unwrap!(spawner.spawn(midi::midi_task(class, settings.receive_channel())));

    // keyboard CV leaves on PA4 (DAC channel 1); PA5 carries channel 2
    let (cv, spare_cv) = Dac::new(p.DAC1, p.DMA1_CH5, p.DMA1_CH6, p.PA4, p.PA5).split();
    let voice = Voice::new(
        cv,
        spare_cv,
        Output::new(p.PG1, Level::Low, Speed::Low),
        Output::new(p.PG0, Level::Low, Speed::Low),
    );

    let panel = Panel::new(
        Adc::new(p.ADC1),
        // A0 and A1 on the Nucleo's Arduino header
        [p.PA3.degrade_adc(), p.PC0.degrade_adc()],
        [
            Output::new(p.PE2, Level::Low, Speed::Low),
            Output::new(p.PE4, Level::Low, Speed::Low),
            Output::new(p.PE5, Level::Low, Speed::Low),
            Output::new(p.PE6, Level::Low, Speed::Low),
        ],
        Output::new(p.PF7, Level::High, Speed::Low),
        Output::new(p.PF8, Level::Low, Speed::Low),
        Input::new(p.PF9, Pull::None),
    );
    let scanner = ControlScanner::new(panel, ScannerConfig::default());
    let performance = Performance::new(PanelParameters::default(), settings.key_mode);

    unwrap!(spawner.spawn(control_loop(scanner, performance, voice)));
}

/// The control loop: scans the panel, ticks the performance engines and plays queued MIDI, without ever waiting.
///
/// Yielding after each pass lets the USB tasks run; the loop itself never blocks, so its period is the time one pass
/// takes plus whatever the USB tasks need.
#[embassy_executor::task]
async fn control_loop(
    mut scanner: ControlScanner<Panel>,
    mut performance: Performance<PanelParameters>,
    mut voice: Voice,
) -> ! {
    let time = EmbassyTimeBase;
    loop {
        let now = time.now();
        performance.poll(now, &mut scanner, &mut voice);
        while let Ok(event) = MIDI_EVENTS.try_receive() {
            performance.handle_midi(event);
        }
        voice.service(now);
        yield_now().await;
    }
}
