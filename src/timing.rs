//! Line/frame timing and exposure arithmetic.
//!
//! Everything here is integer register arithmetic. Divisions floor, exactly as
//! the sensor's integration-time formula does:
//!
//! `t_int = ((VMAX * (SVR + 1) - SHR) * HMAX + offset) / f_ref`
//!
//! where exposure is reported to users in units of `HMAX / f_ref` (lines).

use crate::modes::Mode;

/// Reference clock used to scale HMAX into the reported pixel rate.
pub const PIXEL_RATE_CONSTANT: u64 = 74_250_000;
/// Largest HMAX the register holds; also the hblank control's upper bound.
pub const HMAX_MAX: u32 = 0xFFFF;
/// Largest VMAX the register holds (20 bits).
pub const VMAX_MAX: u32 = 0xF_FFFF;
/// Largest SHR the 2-byte write can carry.
pub const SHR_MAX: u32 = 0xFFFF;
/// SHR must stay this many lines below the frame end.
pub const SHR_MARGIN: u32 = 4;

/// Secondary shutter parameters. Every mode currently uses [`ShutterTiming::DEFAULT`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ShutterTiming {
    /// Sub-vertical repeat multiplier.
    pub svr: u32,
    /// Fixed exposure offset, in HMAX-scaled units.
    pub offset: u32,
}

/// Legal exposure bounds for one HMAX/VMAX pair, in lines.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExposureLimits {
    pub min: u32,
    pub max: u32,
}

impl ShutterTiming {
    pub const DEFAULT: Self = Self { svr: 0, offset: 209 };

    fn frame_lines(&self, vmax: u32) -> u64 {
        u64::from(vmax) * (u64::from(self.svr) + 1)
    }

    /// SHR that realizes `exposure` lines.
    pub fn shr(&self, exposure: u32, hmax: u32, vmax: u32) -> u32 {
        let hmax = u64::from(hmax.max(1));
        let lines = (u64::from(exposure) * hmax).saturating_sub(u64::from(self.offset)) / hmax;
        clamp_u32(self.frame_lines(vmax).saturating_sub(lines))
    }

    /// Exposure in lines produced by `shr`.
    pub fn exposure(&self, shr: u32, hmax: u32, vmax: u32) -> u32 {
        let hmax = u64::from(hmax.max(1));
        let lines = self.frame_lines(vmax).saturating_sub(u64::from(shr));
        clamp_u32((lines * hmax + u64::from(self.offset)) / hmax)
    }

    /// Latest legal SHR for a frame of `vmax` lines.
    pub fn max_shr(&self, vmax: u32) -> u32 {
        self.frame_lines(vmax).saturating_sub(u64::from(SHR_MARGIN)).min(u64::from(SHR_MAX)) as u32
    }

    /// SHR for `exposure`, pulled back to [`ShutterTiming::max_shr`]. The
    /// floors in [`ShutterTiming::shr`] put the shortest published exposure
    /// one line past it.
    pub fn register_shr(&self, exposure: u32, hmax: u32, vmax: u32) -> u32 {
        self.shr(exposure, hmax, vmax).min(self.max_shr(vmax))
    }

    /// Exposure bounds: the latest legal SHR gives the shortest exposure,
    /// the mode's minimum SHR the longest.
    pub fn exposure_limits(&self, hmax: u32, vmax: u32, min_shr: u32) -> ExposureLimits {
        ExposureLimits {
            min: self.exposure(self.max_shr(vmax), hmax, vmax),
            max: self.exposure(min_shr, hmax, vmax),
        }
    }
}

impl Default for ShutterTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn clamp_u32(v: u64) -> u32 {
    v.min(u64::from(u32::MAX)) as u32
}

/// Pixel rate published for `mode`. Fixed while the mode is active.
pub fn pixel_rate(mode: &Mode) -> u64 {
    u64::from(mode.width) * PIXEL_RATE_CONSTANT / u64::from(mode.min_hmax.max(1))
}

/// HMAX register value for a horizontal blank, holding `pixel_rate` constant.
pub fn hmax_for_hblank(mode: &Mode, pixel_rate: u64, hblank: u32) -> u32 {
    let line = u64::from(mode.width) + u64::from(hblank);
    clamp_u32(line * PIXEL_RATE_CONSTANT / pixel_rate.max(1))
}

/// Smallest horizontal blank whose HMAX reaches `hmax`.
pub fn hblank_for_hmax(mode: &Mode, pixel_rate: u64, hmax: u32) -> u32 {
    let line = (u64::from(hmax) * pixel_rate).div_ceil(PIXEL_RATE_CONSTANT);
    let mut hblank = clamp_u32(line.saturating_sub(u64::from(mode.width))).min(HMAX_MAX);
    // The forward division floors, so the ceiling above can still land one short.
    while hblank < HMAX_MAX && hmax_for_hblank(mode, pixel_rate, hblank) < hmax {
        hblank += 1;
    }
    hblank
}

/// VMAX register value for a vertical blank.
pub fn vmax_for_vblank(mode: &Mode, vblank: u32) -> u32 {
    mode.height.saturating_add(vblank)
}

/// Legal vertical blank range `(min, max)` and default for `mode`.
pub fn vblank_limits(mode: &Mode) -> (u32, u32, u32) {
    (
        mode.min_vmax.saturating_sub(mode.height),
        VMAX_MAX.saturating_sub(mode.height),
        mode.default_vmax.saturating_sub(mode.height),
    )
}

/// SHR for `exposure` with the default shutter parameters.
pub fn shr_for_exposure(exposure: u32, hmax: u32, vmax: u32) -> u32 {
    ShutterTiming::DEFAULT.shr(exposure, hmax, vmax)
}

/// SHR actually programmed for `exposure`: [`shr_for_exposure`] capped at
/// the latest legal SHR.
pub fn register_shr_for_exposure(exposure: u32, hmax: u32, vmax: u32) -> u32 {
    ShutterTiming::DEFAULT.register_shr(exposure, hmax, vmax)
}

/// Exposure for `shr` with the default shutter parameters.
pub fn exposure_for_shr(shr: u32, hmax: u32, vmax: u32) -> u32 {
    ShutterTiming::DEFAULT.exposure(shr, hmax, vmax)
}

/// Exposure bounds for `mode` at the given HMAX/VMAX with the default shutter parameters.
pub fn exposure_limits(mode: &Mode, hmax: u32, vmax: u32) -> ExposureLimits {
    ShutterTiming::DEFAULT.exposure_limits(hmax, vmax, mode.min_shr)
}
