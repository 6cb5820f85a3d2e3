//! Mode catalog.
//!
//! Modes are grouped into three families by pixel encoding. Each family is a
//! static slice, ordered the way format negotiation should prefer on ties.

use crate::data_types::{BitDepth, MbusCode, PIXEL_ARRAY, Rect, SensorVariant, TransferFunction};
use crate::registers::Reg;

/// Sensor operating mode.
#[derive(Debug, PartialEq, Eq)]
pub struct Mode {
    pub width: u32,
    pub height: u32,
    /// Clear HDR: combined high/low gain exposure channels.
    pub hdr: bool,
    /// Gradation compression disabled.
    pub linear: bool,
    pub min_hmax: u32,
    pub min_vmax: u32,
    pub default_hmax: u32,
    pub default_vmax: u32,
    pub min_shr: u32,
    /// Analog crop rectangle.
    pub crop: Rect,
    /// Register list applied on every stream start.
    pub regs: &'static [Reg],
}

/// Pixel encoding families, one mode table each.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModeFamily {
    /// 12-bit, normal readout.
    Linear12,
    /// 12-bit, Clear HDR with gradation compression.
    Nonlinear12,
    /// 16-bit, Clear HDR combined linear output.
    HdrLinear16,
}

impl ModeFamily {
    /// Pick the family for a requested code. Codes outside the variant's code
    /// set (including metadata) have no family.
    pub fn resolve(code: MbusCode, transfer_function: TransferFunction, variant: SensorVariant) -> Option<Self> {
        let in_set = match variant {
            SensorVariant::Monochrome => matches!(code, MbusCode::Y12 | MbusCode::Y16),
            SensorVariant::Color => !matches!(code, MbusCode::Y12 | MbusCode::Y16 | MbusCode::SensorData),
        };
        if !in_set {
            return None;
        }
        match code.bit_depth()? {
            BitDepth::Bits16 => Some(ModeFamily::HdrLinear16),
            BitDepth::Bits12 if transfer_function == TransferFunction::GradationCompression => {
                Some(ModeFamily::Nonlinear12)
            }
            BitDepth::Bits12 => Some(ModeFamily::Linear12),
        }
    }

    pub fn modes(self) -> &'static [Mode] {
        match self {
            ModeFamily::Linear12 => MODES_LINEAR_12BIT,
            ModeFamily::Nonlinear12 => MODES_NONLINEAR_12BIT,
            ModeFamily::HdrLinear16 => MODES_HDR_16BIT,
        }
    }
}

/// Nearest mode by summed absolute width/height difference. The first entry
/// wins on ties. `None` only for an empty slice.
pub fn find_nearest(modes: &'static [Mode], width: u32, height: u32) -> Option<&'static Mode> {
    let mut best: Option<(&'static Mode, u32)> = None;
    for mode in modes {
        let dist = mode.width.abs_diff(width).saturating_add(mode.height.abs_diff(height));
        match best {
            Some((_, d)) if d <= dist => {}
            _ => best = Some((mode, dist)),
        }
    }
    best.map(|(mode, _)| mode)
}

/// Mode active right after attach: full resolution, 12-bit linear.
pub fn default_mode() -> &'static Mode {
    &MODES_LINEAR_12BIT[0]
}

/// All-pixel 4K, 12-bit normal readout.
const MODE_4K_REGS: &[Reg] = &[
    Reg::new(0x301A, 0x00), // WDMODE normal
    Reg::new(0x301B, 0x00), // ADDMODE all pixel
    Reg::new(0x3022, 0x02),
    Reg::new(0x3023, 0x01), // MDBIT 12
    Reg::new(0x3024, 0x00),
    Reg::new(0x36EF, 0x00), // CCMP_EN off
    Reg::new(0x3069, 0x00),
    Reg::new(0x3074, 0x64),
    Reg::new(0x30D5, 0x04),
    Reg::new(0x3930, 0x0C),
    Reg::new(0x3931, 0x01),
    Reg::new(0x3A4C, 0x39),
    Reg::new(0x3A4D, 0x01),
    Reg::new(0x3A50, 0x48),
    Reg::new(0x3A51, 0x01),
    Reg::new(0x3E10, 0x10),
    Reg::new(0x493C, 0x23),
    Reg::new(0x4940, 0x41),
];

/// 2x2 binned 1080p, 12-bit normal readout.
const MODE_1080_REGS: &[Reg] = &[
    Reg::new(0x301A, 0x00),
    Reg::new(0x301B, 0x01), // ADDMODE binning
    Reg::new(0x3022, 0x00),
    Reg::new(0x3023, 0x01),
    Reg::new(0x3024, 0x00),
    Reg::new(0x36EF, 0x00),
    Reg::new(0x3069, 0x00),
    Reg::new(0x3074, 0x64),
    Reg::new(0x30D5, 0x02),
    Reg::new(0x3930, 0x0C),
    Reg::new(0x3931, 0x01),
    Reg::new(0x3A4C, 0x39),
    Reg::new(0x3A4D, 0x01),
    Reg::new(0x3A50, 0x48),
    Reg::new(0x3A51, 0x01),
    Reg::new(0x3E10, 0x10),
    Reg::new(0x493C, 0x23),
    Reg::new(0x4940, 0x41),
];

/// All-pixel 4K, 12-bit Clear HDR with gradation compression.
const MODE_4K_NONLINEAR_REGS: &[Reg] = &[
    Reg::new(0x301A, 0x10), // WDMODE Clear HDR
    Reg::new(0x301B, 0x00),
    Reg::new(0x3022, 0x02),
    Reg::new(0x3023, 0x01),
    Reg::new(0x3024, 0x02), // COMBI_EN
    Reg::new(0x36EF, 0x01), // CCMP_EN on
    Reg::new(0x3030, 0x00),
    Reg::new(0x3069, 0x02),
    Reg::new(0x3074, 0x63),
    Reg::new(0x3081, 0x02), // EXP_GAIN +12 dB
    Reg::new(0x30D5, 0x02),
    Reg::new(0x3930, 0xE6),
    Reg::new(0x3931, 0x00),
    Reg::new(0x3A4C, 0x61),
    Reg::new(0x3A4D, 0x02),
    Reg::new(0x3A50, 0x70),
    Reg::new(0x3A51, 0x02),
    Reg::new(0x3E10, 0x17),
    Reg::new(0x493C, 0x41),
    Reg::new(0x4940, 0x41),
];

/// All-pixel 4K, 16-bit Clear HDR.
const MODE_4K_16BIT_REGS: &[Reg] = &[
    Reg::new(0x301A, 0x10),
    Reg::new(0x301B, 0x00),
    Reg::new(0x3022, 0x02),
    Reg::new(0x3023, 0x03), // MDBIT 16
    Reg::new(0x3024, 0x02),
    Reg::new(0x36EF, 0x00),
    Reg::new(0x3030, 0x00),
    Reg::new(0x3069, 0x02),
    Reg::new(0x3074, 0x63),
    Reg::new(0x3081, 0x02),
    Reg::new(0x30D5, 0x02),
    Reg::new(0x3930, 0xE6),
    Reg::new(0x3931, 0x00),
    Reg::new(0x3A4C, 0x61),
    Reg::new(0x3A4D, 0x02),
    Reg::new(0x3A50, 0x70),
    Reg::new(0x3A51, 0x02),
    Reg::new(0x3E10, 0x17),
    Reg::new(0x493C, 0x41),
    Reg::new(0x4940, 0x41),
];

/// 2x2 binned 1080p, 16-bit Clear HDR.
const MODE_1080_16BIT_REGS: &[Reg] = &[
    Reg::new(0x301A, 0x10),
    Reg::new(0x301B, 0x01),
    Reg::new(0x3022, 0x02),
    Reg::new(0x3023, 0x03),
    Reg::new(0x3024, 0x02),
    Reg::new(0x36EF, 0x00),
    Reg::new(0x3030, 0x00),
    Reg::new(0x3069, 0x02),
    Reg::new(0x3074, 0x63),
    Reg::new(0x3081, 0x02),
    Reg::new(0x30D5, 0x02),
    Reg::new(0x3930, 0xE6),
    Reg::new(0x3931, 0x00),
    Reg::new(0x3A4C, 0x61),
    Reg::new(0x3A4D, 0x02),
    Reg::new(0x3A50, 0x70),
    Reg::new(0x3A51, 0x02),
    Reg::new(0x3E10, 0x17),
    Reg::new(0x493C, 0x41),
    Reg::new(0x4940, 0x41),
];

pub static MODES_LINEAR_12BIT: &[Mode] = &[
    Mode {
        width: 3856,
        height: 2180,
        hdr: false,
        linear: true,
        min_hmax: 550,
        min_vmax: 2250,
        default_hmax: 550,
        default_vmax: 2250,
        min_shr: 20,
        crop: PIXEL_ARRAY,
        regs: MODE_4K_REGS,
    },
    Mode {
        width: 1928,
        height: 1090,
        hdr: false,
        linear: true,
        min_hmax: 366,
        min_vmax: 2250,
        default_hmax: 366,
        default_vmax: 2250,
        min_shr: 20,
        crop: PIXEL_ARRAY,
        regs: MODE_1080_REGS,
    },
];

pub static MODES_NONLINEAR_12BIT: &[Mode] = &[Mode {
    width: 3856,
    height: 2180,
    hdr: true,
    linear: false,
    min_hmax: 550,
    min_vmax: 4500,
    default_hmax: 550,
    default_vmax: 4500,
    min_shr: 20,
    crop: PIXEL_ARRAY,
    regs: MODE_4K_NONLINEAR_REGS,
}];

pub static MODES_HDR_16BIT: &[Mode] = &[
    Mode {
        width: 1928,
        height: 1090,
        hdr: true,
        linear: true,
        min_hmax: 550,
        min_vmax: 4500,
        default_hmax: 550,
        default_vmax: 4500,
        min_shr: 20,
        crop: PIXEL_ARRAY,
        regs: MODE_1080_16BIT_REGS,
    },
    Mode {
        width: 3856,
        height: 2180,
        hdr: true,
        linear: true,
        min_hmax: 550,
        min_vmax: 4500,
        default_hmax: 550,
        default_vmax: 4500,
        min_shr: 20,
        crop: PIXEL_ARRAY,
        regs: MODE_4K_16BIT_REGS,
    },
];
