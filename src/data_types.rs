//! Value types shared by the format, control and streaming APIs.

use crate::registers::{DEFAULT_I2C_ADDRESS, PIXEL_ARRAY_HEIGHT, PIXEL_ARRAY_LEFT, PIXEL_ARRAY_TOP, PIXEL_ARRAY_WIDTH};

/// Sensor identity, fixed for the lifetime of a driver instance.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SensorVariant {
    /// Bayer color filter array.
    #[default]
    Color,
    /// No color filter array.
    Monochrome,
}

/// Attach-time configuration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    pub variant: SensorVariant,
    /// 7-bit I2C address.
    pub address: u8,
}

impl Config {
    pub const fn color() -> Self {
        Self {
            variant: SensorVariant::Color,
            address: DEFAULT_I2C_ADDRESS,
        }
    }

    pub const fn monochrome() -> Self {
        Self {
            variant: SensorVariant::Monochrome,
            address: DEFAULT_I2C_ADDRESS,
        }
    }

    pub const fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::color()
    }
}

/// Pixel sample depth on the bus.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BitDepth {
    Bits12,
    Bits16,
}

/// Media bus codes understood by the sensor (Linux `MEDIA_BUS_FMT_*` values).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum MbusCode {
    Y12 = 0x2013,
    Y16 = 0x202E,
    Sbggr12 = 0x3008,
    Sgbrg12 = 0x3010,
    Sgrbg12 = 0x3011,
    Srggb12 = 0x3012,
    Sbggr16 = 0x301D,
    Sgbrg16 = 0x301E,
    Sgrbg16 = 0x301F,
    Srggb16 = 0x3020,
    /// Embedded sensor metadata.
    SensorData = 0x7002,
}

impl MbusCode {
    pub const fn raw(self) -> u32 {
        self as u32
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0x2013 => MbusCode::Y12,
            0x202E => MbusCode::Y16,
            0x3008 => MbusCode::Sbggr12,
            0x3010 => MbusCode::Sgbrg12,
            0x3011 => MbusCode::Sgrbg12,
            0x3012 => MbusCode::Srggb12,
            0x301D => MbusCode::Sbggr16,
            0x301E => MbusCode::Sgbrg16,
            0x301F => MbusCode::Sgrbg16,
            0x3020 => MbusCode::Srggb16,
            0x7002 => MbusCode::SensorData,
            _ => return None,
        })
    }

    /// Sample depth of an image code; `None` for metadata.
    pub fn bit_depth(self) -> Option<BitDepth> {
        match self {
            MbusCode::Y12 | MbusCode::Sbggr12 | MbusCode::Sgbrg12 | MbusCode::Sgrbg12 | MbusCode::Srggb12 => {
                Some(BitDepth::Bits12)
            }
            MbusCode::Y16 | MbusCode::Sbggr16 | MbusCode::Sgbrg16 | MbusCode::Sgrbg16 | MbusCode::Srggb16 => {
                Some(BitDepth::Bits16)
            }
            MbusCode::SensorData => None,
        }
    }
}

/// Transfer function hint carried with a format request.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TransferFunction {
    #[default]
    Default,
    /// Sony gradation compression (non-linear 12-bit HDR output).
    GradationCompression,
    /// Any other V4L2 transfer function; treated like `Default` for mode selection.
    Other(u32),
}

impl TransferFunction {
    pub const GRADATION_COMPRESSION_RAW: u32 = 10;

    pub fn raw(self) -> u32 {
        match self {
            TransferFunction::Default => 0,
            TransferFunction::GradationCompression => Self::GRADATION_COMPRESSION_RAW,
            TransferFunction::Other(raw) => raw,
        }
    }

    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => TransferFunction::Default,
            Self::GRADATION_COMPRESSION_RAW => TransferFunction::GradationCompression,
            other => TransferFunction::Other(other),
        }
    }
}

/// Source pads exposed to the capture pipeline.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Pad {
    Image,
    Metadata,
}

/// Rectangle in sensor pixel coordinates.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Active pixel array; crop default and bounds for every mode.
pub const PIXEL_ARRAY: Rect = Rect::new(PIXEL_ARRAY_LEFT, PIXEL_ARRAY_TOP, PIXEL_ARRAY_WIDTH, PIXEL_ARRAY_HEIGHT);

/// Format on one pad.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FrameFormat {
    pub width: u32,
    pub height: u32,
    pub code: MbusCode,
    pub transfer_function: TransferFunction,
}

/// Frame size range reported by size enumeration. Modes are discrete, so
/// min and max are equal.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FrameSizeRange {
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

/// Scratch negotiation state owned by the caller (one per open file handle
/// in a V4L2 pipeline). Never touched by `Which::Active` requests.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PadConfig {
    pub image: FrameFormat,
    pub metadata: FrameFormat,
    pub crop: Rect,
}

/// Addressing mode of a format or selection request.
#[derive(Debug)]
pub enum Which<'a> {
    /// Persisted session state.
    Active,
    /// Caller-supplied scratch state.
    Try(&'a mut PadConfig),
}

/// Selection rectangles that can be queried.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SelectionTarget {
    Crop,
    CropDefault,
    CropBounds,
    NativeSize,
}

/// User-settable controls.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlId {
    VerticalBlank,
    HorizontalBlank,
    /// Integration time in lines.
    Exposure,
    /// 0.3 dB steps.
    AnalogueGain,
    HorizontalFlip,
    VerticalFlip,
}

/// Streaming state of the session.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum StreamState {
    #[default]
    Standby,
    Streaming,
    /// Streaming session with the sensor held in standby for system sleep.
    Suspended,
}
