use byteorder::{ByteOrder, LittleEndian};

/// A fixed-size value the store can put and get.
///
/// Values are laid out little-endian, matching the client's in-memory layout.
pub trait Scalar: Copy {
    const SIZE: usize;

    /// `buf.len()` must be `SIZE`.
    fn write_to(self, buf: &mut [u8]);

    /// `buf.len()` must be `SIZE`.
    fn read_from(buf: &[u8]) -> Self;
}

impl Scalar for u8 {
    const SIZE: usize = 1;

    #[inline]
    fn write_to(self, buf: &mut [u8]) {
        buf[0] = self;
    }

    #[inline]
    fn read_from(buf: &[u8]) -> Self {
        buf[0]
    }
}

impl Scalar for i8 {
    const SIZE: usize = 1;

    #[inline]
    fn write_to(self, buf: &mut [u8]) {
        buf[0] = self as u8;
    }

    #[inline]
    fn read_from(buf: &[u8]) -> Self {
        buf[0] as i8
    }
}

macro_rules! impl_scalar {
    ($ty:ty, $size:expr, $write:ident, $read:ident) => {
        impl Scalar for $ty {
            const SIZE: usize = $size;

            #[inline]
            fn write_to(self, buf: &mut [u8]) {
                LittleEndian::$write(buf, self);
            }

            #[inline]
            fn read_from(buf: &[u8]) -> Self {
                LittleEndian::$read(buf)
            }
        }
    };
}

impl_scalar!(u16, 2, write_u16, read_u16);
impl_scalar!(i16, 2, write_i16, read_i16);
impl_scalar!(u32, 4, write_u32, read_u32);
impl_scalar!(i32, 4, write_i32, read_i32);
impl_scalar!(u64, 8, write_u64, read_u64);
impl_scalar!(i64, 8, write_i64, read_i64);
impl_scalar!(f32, 4, write_f32, read_f32);
impl_scalar!(f64, 8, write_f64, read_f64);
