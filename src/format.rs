//! Media bus code tables and the pure half of format negotiation.

use crate::data_types::{FrameFormat, MbusCode, SensorVariant, TransferFunction};
use crate::modes::Mode;
use crate::registers::{EMBEDDED_LINE_WIDTH, FlipBits, NUM_EMBEDDED_LINES};

/// Color codes, four per bit depth in flip order: none, h, v, h+v.
pub const COLOR_CODES: [MbusCode; 8] = [
    MbusCode::Srggb16,
    MbusCode::Sgrbg16,
    MbusCode::Sgbrg16,
    MbusCode::Sbggr16,
    MbusCode::Srggb12,
    MbusCode::Sgrbg12,
    MbusCode::Sgbrg12,
    MbusCode::Sbggr12,
];

pub const MONO_CODES: [MbusCode; 2] = [MbusCode::Y16, MbusCode::Y12];

/// Number of image codes the variant advertises (one per bit depth).
pub fn code_count(variant: SensorVariant) -> usize {
    match variant {
        SensorVariant::Color => COLOR_CODES.len() / 4,
        SensorVariant::Monochrome => MONO_CODES.len(),
    }
}

/// Code selected at attach time.
pub fn default_code(variant: SensorVariant) -> MbusCode {
    match variant {
        SensorVariant::Color => MbusCode::Srggb12,
        SensorVariant::Monochrome => MbusCode::Y12,
    }
}

/// Resolve `code` to the member of the variant's code set that matches the
/// current flips. Any bayer order of the right depth maps to the slot for
/// `flips`; mono codes are flip-invariant. Codes of the other set are `None`.
pub fn format_code(variant: SensorVariant, code: MbusCode, flips: FlipBits) -> Option<MbusCode> {
    match variant {
        SensorVariant::Monochrome => MONO_CODES.contains(&code).then_some(code),
        SensorVariant::Color => {
            let index = COLOR_CODES.iter().position(|c| *c == code)?;
            let slot = (flips & FlipBits::all()).bits() as usize;
            Some(COLOR_CODES[(index & !3) + slot])
        }
    }
}

/// Image code at enumeration `index`, adjusted for flips.
pub fn enum_code(variant: SensorVariant, index: usize, flips: FlipBits) -> Option<MbusCode> {
    let base = match variant {
        SensorVariant::Color => *COLOR_CODES.get(index * 4)?,
        SensorVariant::Monochrome => *MONO_CODES.get(index)?,
    };
    format_code(variant, base, flips)
}

/// Image pad format produced by `mode`.
pub fn image_format(mode: &Mode, code: MbusCode) -> FrameFormat {
    FrameFormat {
        width: mode.width,
        height: mode.height,
        code,
        transfer_function: if mode.linear {
            TransferFunction::Default
        } else {
            TransferFunction::GradationCompression
        },
    }
}

/// The only format the metadata pad supports.
pub fn metadata_format() -> FrameFormat {
    FrameFormat {
        width: EMBEDDED_LINE_WIDTH,
        height: NUM_EMBEDDED_LINES,
        code: MbusCode::SensorData,
        transfer_function: TransferFunction::Default,
    }
}
