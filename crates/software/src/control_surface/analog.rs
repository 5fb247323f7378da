/// Largest value a 10-bit conversion can produce.
pub const ADC_MAX: u16 = 1023;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Reading {
    /// Nothing has been read from the channel since startup.
    #[default]
    Unread,
    /// A single reading that has yet to be confirmed by the next one.
    Candidate(u16),
    /// The value last reported downstream.
    Reported(u16),
}

/// Quantizing filter for a single potentiometer.
///
/// A new reading is only reported when it lands at least one quantization step away from the value last reported, so a
/// physically static knob never floods the parameter store with jitter. At startup the first reading is held back until
/// the following one agrees with it, which keeps a single noise spike from causing a parameter jump.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct AnalogChannel {
    reading: Reading,
}

impl AnalogChannel {
    /// Feeds a new (already averaged) reading to the filter, returning the value to report, if any.
    pub fn update(&mut self, reading: u16, step: u16) -> Option<u16> {
        let reading = reading.min(ADC_MAX);
        match self.reading {
            Reading::Unread => {
                self.reading = Reading::Candidate(reading);
                None
            }
            Reading::Candidate(candidate) if reading.abs_diff(candidate) < step => {
                self.reading = Reading::Reported(reading);
                Some(reading)
            }
            Reading::Candidate(_) => {
                self.reading = Reading::Candidate(reading);
                None
            }
            Reading::Reported(last) if reading.abs_diff(last) >= step => {
                self.reading = Reading::Reported(reading);
                Some(reading)
            }
            Reading::Reported(_) => None,
        }
    }

    /// The value last reported, if the channel has settled.
    pub fn reported(&self) -> Option<u16> {
        match self.reading {
            Reading::Reported(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: u16 = 10;

    fn settled_at(value: u16) -> AnalogChannel {
        AnalogChannel {
            reading: Reading::Reported(value),
        }
    }

    #[test]
    fn cold_start_waits_for_confirmation() {
        let mut channel = AnalogChannel::default();
        assert_eq!(None, channel.update(500, STEP), "First reading must not be reported");
        assert_eq!(
            Some(504),
            channel.update(504, STEP),
            "Agreeing second reading should be reported"
        );
        assert_eq!(Some(504), channel.reported());
    }

    #[test]
    fn cold_start_spike_is_discarded() {
        let mut channel = AnalogChannel::default();
        assert_eq!(None, channel.update(1000, STEP));
        assert_eq!(None, channel.update(200, STEP), "Disagreeing reading replaces the candidate");
        assert_eq!(None, channel.reported());
        assert_eq!(Some(203), channel.update(203, STEP));
    }

    #[test]
    fn change_below_one_step_is_not_reported() {
        let mut channel = settled_at(500);
        assert_eq!(None, channel.update(500 + STEP - 1, STEP));
        assert_eq!(None, channel.update(500 - (STEP - 1), STEP));
        assert_eq!(Some(500), channel.reported());
    }

    #[test]
    fn change_of_exactly_one_step_is_reported() {
        let mut channel = settled_at(500);
        assert_eq!(Some(510), channel.update(510, STEP));
        assert_eq!(Some(500), channel.update(500, STEP));
    }

    #[test]
    fn slow_drift_is_measured_from_last_report() {
        let mut channel = settled_at(500);
        for reading in 501..510 {
            assert_eq!(None, channel.update(reading, STEP));
        }
        assert_eq!(Some(510), channel.update(510, STEP));
    }

    #[test]
    fn readings_are_clamped() {
        let mut channel = settled_at(1000);
        assert_eq!(Some(ADC_MAX), channel.update(4095, STEP));
        assert_eq!(None, channel.update(u16::MAX, STEP));
    }
}
