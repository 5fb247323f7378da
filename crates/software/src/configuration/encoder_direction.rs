use num_derive::{FromPrimitive, ToPrimitive};

/// Which way the panel's rotary encoder counts. Encoders from different vendors wire their quadrature outputs in
/// opposite orders, so the performer picks whichever makes clockwise turns count up.
#[derive(Clone, Copy, Debug, Default, FromPrimitive, PartialEq, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderDirection {
    /// Detents are counted as reported ("Type 1").
    #[default]
    Clockwise,
    /// Detents are counted reversed ("Type 2").
    CounterClockwise,
}
impl super::CycleConfig for EncoderDirection {}

impl EncoderDirection {
    /// The byte kept in persistent storage. Clockwise ("Type 1") is stored as 1, so settings written by earlier panel
    /// firmware restore unchanged.
    pub fn to_stored(self) -> u8 {
        match self {
            EncoderDirection::Clockwise => 1,
            EncoderDirection::CounterClockwise => 0,
        }
    }

    /// Reads a byte written by [`to_stored`](Self::to_stored).
    pub fn from_stored(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(EncoderDirection::Clockwise),
            0 => Some(EncoderDirection::CounterClockwise),
            _ => None,
        }
    }

    /// Orients a raw detent count.
    pub fn orient(&self, detents: i8) -> i8 {
        match self {
            EncoderDirection::Clockwise => detents,
            EncoderDirection::CounterClockwise => detents.saturating_neg(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orient() {
        assert_eq!(3, EncoderDirection::Clockwise.orient(3));
        assert_eq!(-3, EncoderDirection::CounterClockwise.orient(3));
        assert_eq!(i8::MAX, EncoderDirection::CounterClockwise.orient(i8::MIN));
    }

    #[test]
    fn stored_byte() {
        assert_eq!(1, EncoderDirection::Clockwise.to_stored());
        assert_eq!(0, EncoderDirection::CounterClockwise.to_stored());
        assert_eq!(Some(EncoderDirection::Clockwise), EncoderDirection::from_stored(1));
        assert_eq!(Some(EncoderDirection::CounterClockwise), EncoderDirection::from_stored(0));
        assert_eq!(None, EncoderDirection::from_stored(2));
    }
}
