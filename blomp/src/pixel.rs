use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

/// An RGB color with floating point channels, nominally in `0.0..=1.0`.
///
/// Channels are not clamped until the color is quantized with
/// [`Pixel::to_bytes`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pixel {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel::splat(0.0);
    pub const WHITE: Pixel = Pixel::splat(1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// A grey with every channel set to `value`.
    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }

    /// Quantize to 8 bits per channel.
    pub fn to_bytes(self) -> [u8; 3] {
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    pub fn from_bytes([r, g, b]: [u8; 3]) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Sum of the three channels.
    pub fn channel_sum(self) -> f32 {
        self.r + self.g + self.b
    }
}

#[inline]
fn quantize(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

macro_rules! impl_channel_op {
    ($trait:ident, $fn:ident, $assign_trait:ident, $assign_fn:ident, $op:tt) => {
        impl $trait for Pixel {
            type Output = Pixel;

            fn $fn(self, rhs: Pixel) -> Pixel {
                Pixel::new(self.r $op rhs.r, self.g $op rhs.g, self.b $op rhs.b)
            }
        }

        impl $trait<f32> for Pixel {
            type Output = Pixel;

            fn $fn(self, rhs: f32) -> Pixel {
                Pixel::new(self.r $op rhs, self.g $op rhs, self.b $op rhs)
            }
        }

        impl $assign_trait for Pixel {
            fn $assign_fn(&mut self, rhs: Pixel) {
                *self = *self $op rhs;
            }
        }

        impl $assign_trait<f32> for Pixel {
            fn $assign_fn(&mut self, rhs: f32) {
                *self = *self $op rhs;
            }
        }
    };
}

impl_channel_op!(Add, add, AddAssign, add_assign, +);
impl_channel_op!(Sub, sub, SubAssign, sub_assign, -);
impl_channel_op!(Mul, mul, MulAssign, mul_assign, *);
impl_channel_op!(Div, div, DivAssign, div_assign, /);

impl Sum for Pixel {
    fn sum<I: Iterator<Item = Pixel>>(iter: I) -> Pixel {
        iter.fold(Pixel::BLACK, |acc, p| acc + p)
    }
}

impl<'a> Sum<&'a Pixel> for Pixel {
    fn sum<I: Iterator<Item = &'a Pixel>>(iter: I) -> Pixel {
        iter.copied().sum()
    }
}
