//! USB-MIDI input. Decoded events are handed to the control loop over [`MIDI_EVENTS`].

use defmt::{panic, *};
use embassy_stm32::{peripherals, usb};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_usb::{UsbDevice, class::midi::MidiClass, driver::EndpointError};
use source_voice_lib::midi::{self, MidiEvent, ReceiveChannel};

pub type UsbDriver = usb::Driver<'static, peripherals::USB_OTG_FS>;

/// Room for a full USB packet's worth of events (16 event packets of 4 bytes).
const MIDI_EVENT_CAPACITY: usize = 16;

/// Carries MIDI events from the USB task to the control loop, which drains it without waiting.
pub static MIDI_EVENTS: Channel<CriticalSectionRawMutex, MidiEvent, MIDI_EVENT_CAPACITY> = Channel::new();

#[embassy_executor::task]
pub async fn usb_task(mut usb: UsbDevice<'static, UsbDriver>) -> ! {
    usb.run().await
}

#[embassy_executor::task]
pub async fn midi_task(mut class: MidiClass<'static, UsbDriver>, channel: ReceiveChannel) -> ! {
    loop {
        class.wait_connection().await;
        info!("USB connected");
        let _ = process_midi(&mut class, channel).await;
        info!("USB disconnected");
    }
}

#[doc(hidden)]
struct Disconnected {}

impl From<EndpointError> for Disconnected {
    fn from(val: EndpointError) -> Self {
        match val {
            EndpointError::BufferOverflow => panic!("Buffer overflow"),
            EndpointError::Disabled => Disconnected {},
        }
    }
}

/// Helper function which interprets data received over USB.
///
/// Extracts MIDI from bytes and forwards the events the voice acts on. Waits for room in [`MIDI_EVENTS`] rather than
/// dropping events, so notes are never lost, only delayed.
async fn process_midi<'d, T: usb::Instance + 'd>(
    class: &mut MidiClass<'d, usb::Driver<'d, T>>,
    channel: ReceiveChannel,
) -> Result<(), Disconnected> {
    let mut buf = [0; 64];
    loop {
        let n = class.read_packet(&mut buf).await?;
        for event in midi::events(&buf[..n], channel) {
            MIDI_EVENTS.send(event).await;
        }
    }
}
