//! Error definitions for the IMX586 driver.

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum Error<I2cError> {
    /// Underlying I2C transaction failed.
    I2c(I2cError),
    /// Chip-id register did not hold the expected value; carries what was read.
    IdMismatch(u8),
    /// Requested media-bus code / transfer function has no mode table, or the
    /// code belongs to the other (color vs mono) code set.
    UnsupportedFormat,
    /// Control value outside the currently published bounds.
    OutOfRange,
    /// Control is temporarily immutable (flips while streaming).
    Busy,
    /// Bad pad, enumeration index or selection target.
    InvalidArgument,
}

impl<I2cError: core::fmt::Debug> core::fmt::Display for Error<I2cError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {:?}", e),
            Error::IdMismatch(id) => write!(f, "unexpected chip id {:#04x}", id),
            Error::UnsupportedFormat => write!(f, "unsupported media bus format"),
            Error::OutOfRange => write!(f, "control value out of range"),
            Error::Busy => write!(f, "control cannot change while streaming"),
            Error::InvalidArgument => write!(f, "invalid pad, index or target"),
        }
    }
}
