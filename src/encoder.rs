use core::fmt::Debug;

/// Signed position counter of a quadrature encoder.
pub trait Encoder {
    /// Error reported by the counter hardware.
    type Error: Debug;

    /// Read the current count.
    fn count(&mut self) -> Result<i32, Self::Error>;

    /// Overwrite the current count, e.g. to re-zero at a known position.
    fn set_count(&mut self, count: i32) -> Result<(), Self::Error>;
}

impl<E: Encoder + ?Sized> Encoder for &mut E {
    type Error = E::Error;

    fn count(&mut self) -> Result<i32, Self::Error> {
        (**self).count()
    }

    fn set_count(&mut self, count: i32) -> Result<(), Self::Error> {
        (**self).set_count(count)
    }
}
