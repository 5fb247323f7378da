//! This module contains both the persisted user settings (implemented as enums and a plain record) and traits to make
//! them easier to work with in code.

mod encoder_direction;
pub use encoder_direction::*;

mod key_mode;
pub use key_mode::*;

mod persistence;
pub use persistence::*;

mod settings;
pub use settings::*;

use num_traits::{FromPrimitive, ToPrimitive};

/// A trait which allows infinite cycling of an enum's variants.
///
/// Useful for pushbutton and encoder user interfaces, allowing presses to advance from the current to the next
/// variant, cycling back to the beginning when all variants have been exhausted.
pub trait CycleConfig {
    /// Return the next variant, cycling back to the beginning as needed.
    fn cycle(self) -> Self
    where
        Self: FromPrimitive + ToPrimitive + Sized,
    {
        let index = self
            .to_u8()
            .expect("enum variants should be castable to u8");
        match <Self as FromPrimitive>::from_u8(index + 1) {
            Some(new_selection) => new_selection,
            None => FromPrimitive::from_u8(0).expect("enum should not be empty"),
        }
    }
}
