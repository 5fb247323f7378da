//! Keeps the user settings in the last sector of the on-chip flash, standing in for the EEPROM the panel firmware
//! traditionally uses.

use defmt::*;
use embassy_stm32::flash::{Blocking, Flash};
use source_voice_lib::configuration::{Persistence, SettingsSlot};

/// Offset of sector 11 (the last 256KB sector of a single-bank F767) from the start of flash.
const SETTINGS_SECTOR_OFFSET: u32 = 0x1C_0000;
const SETTINGS_SECTOR_SIZE: u32 = 0x4_0000;

/// Settings bytes padded to a whole number of flash write units.
const SETTINGS_LEN: usize = SettingsSlot::COUNT.next_multiple_of(8);

/// Flash-backed [`Persistence`].
///
/// Reads are served from a RAM copy taken at startup. Writes update the copy and rewrite the sector; if that fails the
/// copy stays authoritative until the next restart.
pub struct FlashSettings {
    flash: Flash<'static, Blocking>,
    bytes: [u8; SETTINGS_LEN],
}

impl FlashSettings {
    /// Reads the settings area. Should the read fail, every slot reads as erased and settings fall back to defaults.
    pub fn new(mut flash: Flash<'static, Blocking>) -> Self {
        let mut bytes = [0xFF; SETTINGS_LEN];
        if let Err(e) = flash.blocking_read(SETTINGS_SECTOR_OFFSET, &mut bytes) {
            warn!("Reading settings failed: {}", e);
            bytes = [0xFF; SETTINGS_LEN];
        }
        Self { flash, bytes }
    }

    fn write_back(&mut self) -> Result<(), embassy_stm32::flash::Error> {
        self.flash.blocking_erase(
            SETTINGS_SECTOR_OFFSET,
            SETTINGS_SECTOR_OFFSET + SETTINGS_SECTOR_SIZE,
        )?;
        self.flash.blocking_write(SETTINGS_SECTOR_OFFSET, &self.bytes)
    }
}

impl Persistence for FlashSettings {
    fn load_byte(&self, slot: SettingsSlot) -> u8 {
        self.bytes[slot.offset()]
    }

    fn store_byte(&mut self, slot: SettingsSlot, value: u8) {
        if self.bytes[slot.offset()] == value {
            return;
        }
        self.bytes[slot.offset()] = value;
        match self.write_back() {
            Ok(()) => info!("Stored setting {} = {}", slot, value),
            Err(e) => warn!("Storing setting {} failed: {}", slot, e),
        }
    }
}
