//! User controls and their currently published ranges.

use crate::data_types::ControlId;
use crate::gain::{ANA_GAIN_DEFAULT, ANA_GAIN_MAX, ANA_GAIN_MIN, ANA_GAIN_STEP};
use crate::registers::FlipBits;
use crate::timing::{HMAX_MAX, VMAX_MAX};

/// Exposure range published before the first mode's limits are applied.
pub const EXPOSURE_MIN: u32 = 52;
pub const EXPOSURE_MAX: u32 = 49_865;
pub const EXPOSURE_STEP: u32 = 1;
pub const EXPOSURE_DEFAULT: u32 = 1000;

/// One integer control: range, default, current value and whether it is
/// temporarily locked against writes.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Control {
    min: u32,
    max: u32,
    step: u32,
    default: u32,
    value: u32,
    grabbed: bool,
}

impl Control {
    pub const fn new(min: u32, max: u32, step: u32, default: u32) -> Self {
        Self {
            min,
            max,
            step,
            default,
            value: default,
            grabbed: false,
        }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn default_value(&self) -> u32 {
        self.default
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Locked while streaming (flips).
    pub fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Publish a new range; the default and current value are pulled inside it.
    pub(crate) fn modify_range(&mut self, min: u32, max: u32, default: u32) {
        let max = max.max(min);
        self.min = min;
        self.max = max;
        self.default = default.clamp(min, max);
        self.value = self.value.clamp(min, max);
    }

    pub(crate) fn set_value(&mut self, value: u32) {
        self.value = value;
    }

    pub(crate) fn grab(&mut self, grabbed: bool) {
        self.grabbed = grabbed;
    }
}

/// Full control set of one sensor session.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Controls {
    pixel_rate: u64,
    vblank: Control,
    hblank: Control,
    exposure: Control,
    analogue_gain: Control,
    hflip: Control,
    vflip: Control,
}

impl Controls {
    pub(crate) fn new() -> Self {
        Self {
            pixel_rate: 0,
            vblank: Control::new(0, VMAX_MAX, 1, 0),
            hblank: Control::new(0, HMAX_MAX, 1, 0),
            exposure: Control::new(EXPOSURE_MIN, EXPOSURE_MAX, EXPOSURE_STEP, EXPOSURE_DEFAULT),
            analogue_gain: Control::new(ANA_GAIN_MIN, ANA_GAIN_MAX, ANA_GAIN_STEP, ANA_GAIN_DEFAULT),
            hflip: Control::new(0, 1, 1, 0),
            vflip: Control::new(0, 1, 1, 0),
        }
    }

    /// Read-only pixel rate of the active mode.
    pub fn pixel_rate(&self) -> u64 {
        self.pixel_rate
    }

    pub(crate) fn set_pixel_rate(&mut self, pixel_rate: u64) {
        self.pixel_rate = pixel_rate;
    }

    pub fn get(&self, id: ControlId) -> &Control {
        match id {
            ControlId::VerticalBlank => &self.vblank,
            ControlId::HorizontalBlank => &self.hblank,
            ControlId::Exposure => &self.exposure,
            ControlId::AnalogueGain => &self.analogue_gain,
            ControlId::HorizontalFlip => &self.hflip,
            ControlId::VerticalFlip => &self.vflip,
        }
    }

    pub(crate) fn get_mut(&mut self, id: ControlId) -> &mut Control {
        match id {
            ControlId::VerticalBlank => &mut self.vblank,
            ControlId::HorizontalBlank => &mut self.hblank,
            ControlId::Exposure => &mut self.exposure,
            ControlId::AnalogueGain => &mut self.analogue_gain,
            ControlId::HorizontalFlip => &mut self.hflip,
            ControlId::VerticalFlip => &mut self.vflip,
        }
    }

    /// Current flips as register bits.
    pub fn flips(&self) -> FlipBits {
        let mut flips = FlipBits::empty();
        flips.set(FlipBits::H, self.hflip.value != 0);
        flips.set(FlipBits::V, self.vflip.value != 0);
        flips
    }

    pub(crate) fn grab_flips(&mut self, grabbed: bool) {
        self.hflip.grab(grabbed);
        self.vflip.grab(grabbed);
    }
}
