//! Analog gain to conversion-gain channel mapping.

use crate::registers::FdgSelBits;

pub const ANA_GAIN_MIN: u32 = 0;
/// 72 dB in 0.3 dB steps.
pub const ANA_GAIN_MAX: u32 = 240;
pub const ANA_GAIN_STEP: u32 = 1;
pub const ANA_GAIN_DEFAULT: u32 = 0;
/// Gain the HCG channel adds on its own (15.3 dB).
pub const ANA_GAIN_HCG_LEVEL: u32 = 51;
/// Requests at or above this switch to HCG in non-HDR modes.
pub const ANA_GAIN_HCG_THRESHOLD: u32 = ANA_GAIN_HCG_LEVEL + 29;
/// Lowest gain register value used together with HCG.
pub const ANA_GAIN_HCG_MIN: u32 = 34;

/// Conversion gain channel.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConversionGain {
    Low,
    High,
}

impl ConversionGain {
    /// FDG_SEL0 register value.
    pub fn bits(self) -> FdgSelBits {
        match self {
            ConversionGain::Low => FdgSelBits::empty(),
            ConversionGain::High => FdgSelBits::HCG,
        }
    }
}

/// Register values realizing one gain request.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GainSetting {
    pub channel: ConversionGain,
    /// ANALOG_GAIN register value.
    pub value: u16,
}

/// Map a gain step to channel and register value. HCG is never used in HDR
/// modes, which already combine both channels.
pub fn map_gain(step: u32, hdr: bool) -> GainSetting {
    if !hdr && step >= ANA_GAIN_HCG_THRESHOLD {
        let value = (step - ANA_GAIN_HCG_LEVEL).max(ANA_GAIN_HCG_MIN);
        GainSetting {
            channel: ConversionGain::High,
            value: value.min(u32::from(u16::MAX)) as u16,
        }
    } else {
        GainSetting {
            channel: ConversionGain::Low,
            value: step.min(u32::from(u16::MAX)) as u16,
        }
    }
}
