//! IMX586 driver: register access, format negotiation, controls and the
//! standby/streaming state machine.
//!
//! The driver owns the whole session state. Every operation that can change
//! it takes `&mut self`, so no two of them can interleave. Share the driver
//! behind a mutex if several contexts need it.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::controls::{Control, Controls};
use crate::data_types::{
    Config, ControlId, FrameFormat, FrameSizeRange, MbusCode, PIXEL_ARRAY, Pad, PadConfig, Rect, SelectionTarget,
    SensorVariant, StreamState, Which,
};
use crate::error::Error;
use crate::format::{self, image_format, metadata_format};
use crate::gain::map_gain;
use crate::modes::{Mode, ModeFamily, default_mode, find_nearest};
use crate::registers::{
    ACMP1_NONLINEAR, ACMP2_NONLINEAR, BLKLEVEL_DEFAULT, CCMP1_NONLINEAR, CCMP2_NONLINEAR, CHIP_ID, COMMON_REGS,
    EXP_BK_DEFAULT, EXP_TH_H_DEFAULT, EXP_TH_L_DEFAULT, ModeSelectBits, NATIVE_HEIGHT, NATIVE_WIDTH, Reg, RegHoldBits,
    STREAM_DELAY_US, addr,
};
use crate::timing::{self, HMAX_MAX};

/// IMX586 driver.
pub struct Imx586<I2C, D> {
    i2c: I2C,
    delay: D,
    config: Config,
    mode: &'static Mode,
    fmt_code: MbusCode,
    hmax: u32,
    vmax: u32,
    controls: Controls,
    streaming: bool,
    /// Sensor held in standby by [`Imx586::suspend`] while the session streams.
    suspended: bool,
    /// Common block applied since the last power-on.
    common_regs_written: bool,
}

impl<I2C, D> Imx586<I2C, D> {
    /// Create a driver in standby with the default mode and format code.
    /// No bus traffic; call [`Imx586::identify`] (or use [`Imx586::probe`])
    /// before relying on the device.
    pub fn new(i2c: I2C, delay: D, config: Config) -> Self {
        let mut dev = Self {
            i2c,
            delay,
            config,
            mode: default_mode(),
            fmt_code: format::default_code(config.variant),
            hmax: 0,
            vmax: 0,
            controls: Controls::new(),
            streaming: false,
            suspended: false,
            common_regs_written: false,
        };
        dev.apply_framing_limits();
        dev
    }

    /// Give back the bus and delay.
    pub fn free(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Attach-time configuration.
    pub fn config(&self) -> Config {
        self.config
    }

    /// 7-bit I2C address configured for this instance.
    pub fn address(&self) -> u8 {
        self.config.address
    }

    /// Color or monochrome.
    pub fn variant(&self) -> SensorVariant {
        self.config.variant
    }

    /// Active mode.
    pub fn mode(&self) -> &'static Mode {
        self.mode
    }

    /// Current HMAX register value.
    pub fn hmax(&self) -> u32 {
        self.hmax
    }

    /// Current VMAX register value.
    pub fn vmax(&self) -> u32 {
        self.vmax
    }

    /// Session stream state; `Suspended` while [`Imx586::suspend`] holds a
    /// streaming session in standby.
    pub fn stream_state(&self) -> StreamState {
        match (self.streaming, self.suspended) {
            (false, _) => StreamState::Standby,
            (true, false) => StreamState::Streaming,
            (true, true) => StreamState::Suspended,
        }
    }

    /// True only while the sensor is actually outputting frames.
    pub fn is_streaming(&self) -> bool {
        self.streaming && !self.suspended
    }

    /// Whether the common register block has been written since power-on.
    pub fn common_regs_written(&self) -> bool {
        self.common_regs_written
    }

    /// All controls with their published ranges.
    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Snapshot of one control.
    pub fn control(&self, id: ControlId) -> Control {
        *self.controls.get(id)
    }

    /// Read-only pixel rate of the active mode.
    pub fn pixel_rate(&self) -> u64 {
        self.controls.pixel_rate()
    }

    /// Resolve `code` to the variant's code for the current flips.
    pub fn get_format_code(&self, code: MbusCode) -> Result<MbusCode, Error<I2C::Error>>
    where
        I2C: embedded_hal::i2c::ErrorType,
    {
        format::format_code(self.config.variant, code, self.controls.flips()).ok_or(Error::UnsupportedFormat)
    }

    /// Fresh scratch state: default mode and code on the image pad, the
    /// fixed metadata format, crop at the pixel array.
    pub fn init_pad_config(&self) -> PadConfig {
        let default = format::default_code(self.config.variant);
        let code = format::format_code(self.config.variant, default, self.controls.flips()).unwrap_or(default);
        PadConfig {
            image: image_format(default_mode(), code),
            metadata: metadata_format(),
            crop: PIXEL_ARRAY,
        }
    }

    /// Code at `index` on `pad`.
    pub fn enum_mbus_code(&self, pad: Pad, index: usize) -> Result<MbusCode, Error<I2C::Error>>
    where
        I2C: embedded_hal::i2c::ErrorType,
    {
        match pad {
            Pad::Image => {
                format::enum_code(self.config.variant, index, self.controls.flips()).ok_or(Error::InvalidArgument)
            }
            Pad::Metadata if index == 0 => Ok(MbusCode::SensorData),
            Pad::Metadata => Err(Error::InvalidArgument),
        }
    }

    /// Frame size at `index` for `code` on `pad`.
    pub fn enum_frame_size(&self, pad: Pad, code: MbusCode, index: usize) -> Result<FrameSizeRange, Error<I2C::Error>>
    where
        I2C: embedded_hal::i2c::ErrorType,
    {
        let (width, height) = match pad {
            Pad::Image => {
                let family = ModeFamily::resolve(code, Default::default(), self.config.variant)
                    .ok_or(Error::UnsupportedFormat)?;
                if self.get_format_code(code)? != code {
                    return Err(Error::InvalidArgument);
                }
                let mode = family.modes().get(index).ok_or(Error::InvalidArgument)?;
                (mode.width, mode.height)
            }
            Pad::Metadata => {
                if code != MbusCode::SensorData || index > 0 {
                    return Err(Error::InvalidArgument);
                }
                let meta = metadata_format();
                (meta.width, meta.height)
            }
        };
        Ok(FrameSizeRange {
            min_width: width,
            max_width: width,
            min_height: height,
            max_height: height,
        })
    }

    /// Current format on `pad`. A `Try` read refreshes the scratch code for
    /// the current flips.
    pub fn get_format(&self, pad: Pad, which: Which<'_>) -> Result<FrameFormat, Error<I2C::Error>>
    where
        I2C: embedded_hal::i2c::ErrorType,
    {
        match (pad, which) {
            (Pad::Image, Which::Try(cfg)) => {
                cfg.image.code = self.get_format_code(cfg.image.code)?;
                Ok(cfg.image)
            }
            (Pad::Metadata, Which::Try(cfg)) => {
                cfg.metadata.code = MbusCode::SensorData;
                Ok(cfg.metadata)
            }
            (Pad::Image, Which::Active) => Ok(image_format(self.mode, self.get_format_code(self.fmt_code)?)),
            (Pad::Metadata, Which::Active) => Ok(metadata_format()),
        }
    }

    /// Selection rectangle on the image pad.
    pub fn get_selection(&self, pad: Pad, target: SelectionTarget, which: Which<'_>) -> Result<Rect, Error<I2C::Error>>
    where
        I2C: embedded_hal::i2c::ErrorType,
    {
        if pad != Pad::Image {
            return Err(Error::InvalidArgument);
        }
        Ok(match target {
            SelectionTarget::Crop => match which {
                Which::Active => self.mode.crop,
                Which::Try(cfg) => cfg.crop,
            },
            SelectionTarget::NativeSize => Rect::new(0, 0, NATIVE_WIDTH, NATIVE_HEIGHT),
            SelectionTarget::CropDefault | SelectionTarget::CropBounds => PIXEL_ARRAY,
        })
    }

    /// Publish pixel rate, blanking ranges/defaults and exposure limits for
    /// the active mode, and derive HMAX/VMAX from the new blanking.
    fn apply_framing_limits(&mut self) {
        let mode = self.mode;
        let pixel_rate = timing::pixel_rate(mode);
        self.controls.set_pixel_rate(pixel_rate);

        let def_hblank = timing::hblank_for_hmax(mode, pixel_rate, mode.default_hmax);
        let hblank = self.controls.get_mut(ControlId::HorizontalBlank);
        hblank.modify_range(0, HMAX_MAX, def_hblank);
        hblank.set_value(def_hblank);
        self.hmax = timing::hmax_for_hblank(mode, pixel_rate, def_hblank);

        let (min_vblank, max_vblank, def_vblank) = timing::vblank_limits(mode);
        let vblank = self.controls.get_mut(ControlId::VerticalBlank);
        vblank.modify_range(min_vblank, max_vblank, def_vblank);
        vblank.set_value(def_vblank);
        self.vmax = timing::vmax_for_vblank(mode, def_vblank);

        self.update_exposure_limits();
        debug!(
            "framing: pixel_rate={=u64} hblank={=u32} vblank={=u32} hmax={=u32} vmax={=u32}",
            pixel_rate,
            def_hblank,
            def_vblank,
            self.hmax,
            self.vmax
        );
    }

    /// Re-clamp the exposure range and value to the current HMAX/VMAX.
    fn update_exposure_limits(&mut self) {
        let limits = timing::exposure_limits(self.mode, self.hmax, self.vmax);
        let exposure = self.controls.get_mut(ControlId::Exposure);
        let default = exposure.default_value();
        exposure.modify_range(limits.min, limits.max, default);
        trace!(
            "exposure limits [{=u32}, {=u32}], value {=u32}",
            limits.min,
            limits.max,
            exposure.value()
        );
    }
}

impl<I2C, D> Imx586<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Create a driver and verify the chip id. Fails without retry on a
    /// bus error or an unexpected id.
    pub fn probe(i2c: I2C, delay: D, config: Config) -> Result<Self, Error<I2C::Error>> {
        let mut dev = Self::new(i2c, delay, config);
        dev.identify()?;
        Ok(dev)
    }

    /// Read the chip id register and compare it with [`CHIP_ID`].
    pub fn identify(&mut self) -> Result<(), Error<I2C::Error>> {
        let id = self.read_reg(addr::CHIP_ID, 1)? as u8;
        if id != CHIP_ID {
            error!("unexpected chip id {=u8:#x}", id);
            return Err(Error::IdMismatch(id));
        }
        info!("IMX586 found, id {=u8:#x}", id);
        Ok(())
    }

    /// Read up to four bytes starting at `reg`, assembled big-endian.
    pub fn read_reg(&mut self, reg: u16, len: usize) -> Result<u32, Error<I2C::Error>> {
        if len == 0 || len > 4 {
            return Err(Error::InvalidArgument);
        }
        let mut buf = [0u8; 4];
        self.i2c
            .write_read(self.config.address, &reg.to_be_bytes(), &mut buf[4 - len..])
            .map_err(Error::I2c)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Write one byte.
    pub fn write_reg(&mut self, reg: u16, value: u8) -> Result<(), Error<I2C::Error>> {
        self.write_bytes(reg, &[value])
    }

    /// Write two bytes, low byte at `reg`.
    pub fn write_reg_u16(&mut self, reg: u16, value: u16) -> Result<(), Error<I2C::Error>> {
        self.write_bytes(reg, &value.to_le_bytes())
    }

    /// Write the low three bytes of `value`, low byte at `reg`.
    pub fn write_reg_u24(&mut self, reg: u16, value: u32) -> Result<(), Error<I2C::Error>> {
        self.write_bytes(reg, &value.to_le_bytes()[..3])
    }

    /// Write a list of single byte registers in order, stopping at the first failure.
    pub fn write_regs(&mut self, regs: &[Reg]) -> Result<(), Error<I2C::Error>> {
        for reg in regs {
            self.write_reg(reg.address, reg.value)?;
        }
        Ok(())
    }

    fn write_bytes(&mut self, reg: u16, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        let mut buf = [0u8; 5];
        if data.is_empty() || data.len() + 2 > buf.len() {
            return Err(Error::InvalidArgument);
        }
        buf[..2].copy_from_slice(&reg.to_be_bytes());
        buf[2..2 + data.len()].copy_from_slice(data);
        self.i2c.write(self.config.address, &buf[..2 + data.len()]).map_err(|e| {
            error!("failed to write reg {=u16:#x}", reg);
            Error::I2c(e)
        })
    }

    /// Run `f` with register hold asserted so the sensor latches all of its
    /// writes at one frame boundary. The hold is released on every path; an
    /// error from `f` takes precedence over one from the release.
    pub fn with_register_hold<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Error<I2C::Error>>,
    ) -> Result<T, Error<I2C::Error>> {
        self.write_reg(addr::REGHOLD, RegHoldBits::HOLD.bits())?;
        let result = f(self);
        let release = self.write_reg(addr::REGHOLD, RegHoldBits::empty().bits());
        let value = result?;
        release?;
        Ok(value)
    }

    /// Negotiate a format. `Try` writes only into the caller's scratch state;
    /// `Active` switches the session mode and, when the mode changes,
    /// republishes framing limits. No registers are written here.
    pub fn set_format(&mut self, pad: Pad, which: Which<'_>, request: FrameFormat) -> Result<FrameFormat, Error<I2C::Error>> {
        if pad == Pad::Metadata {
            let fmt = metadata_format();
            if let Which::Try(cfg) = which {
                cfg.metadata = fmt;
            }
            return Ok(fmt);
        }

        let code = self.get_format_code(request.code)?;
        let family =
            ModeFamily::resolve(code, request.transfer_function, self.config.variant).ok_or(Error::UnsupportedFormat)?;
        let mode = find_nearest(family.modes(), request.width, request.height).ok_or(Error::UnsupportedFormat)?;
        let fmt = image_format(mode, code);

        match which {
            Which::Try(cfg) => cfg.image = fmt,
            Which::Active => {
                self.fmt_code = code;
                if !core::ptr::eq(self.mode, mode) {
                    info!("mode {=u32}x{=u32} hdr={=bool} linear={=bool}", mode.width, mode.height, mode.hdr, mode.linear);
                    self.mode = mode;
                    // Reaches the sensor with the next start.
                    self.apply_framing_limits();
                }
            }
        }
        Ok(fmt)
    }

    /// Validate and apply a control value. Out-of-range values and writes to
    /// grabbed controls are rejected untouched. Registers are only written
    /// while the sensor streams; in standby or suspend the value is cached
    /// for the next start.
    pub fn set_control(&mut self, id: ControlId, value: u32) -> Result<(), Error<I2C::Error>> {
        let ctrl = self.controls.get(id);
        if ctrl.is_grabbed() {
            return Err(Error::Busy);
        }
        if !ctrl.contains(value) {
            return Err(Error::OutOfRange);
        }

        let saved = (self.controls, self.hmax, self.vmax);
        self.controls.get_mut(id).set_value(value);
        match id {
            ControlId::VerticalBlank => {
                self.vmax = timing::vmax_for_vblank(self.mode, value);
                self.update_exposure_limits();
            }
            ControlId::HorizontalBlank => {
                self.hmax = timing::hmax_for_hblank(self.mode, self.controls.pixel_rate(), value);
                self.update_exposure_limits();
            }
            _ => {}
        }
        debug!("control {} = {=u32}", id, value);

        if self.is_streaming() {
            if let Err(e) = self.apply_control(id) {
                (self.controls, self.hmax, self.vmax) = saved;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Integration time in lines.
    pub fn set_exposure(&mut self, lines: u32) -> Result<(), Error<I2C::Error>> {
        self.set_control(ControlId::Exposure, lines)
    }

    /// Analog gain in 0.3 dB steps.
    pub fn set_analogue_gain(&mut self, step: u32) -> Result<(), Error<I2C::Error>> {
        self.set_control(ControlId::AnalogueGain, step)
    }

    /// Vertical blank in lines.
    pub fn set_vblank(&mut self, lines: u32) -> Result<(), Error<I2C::Error>> {
        self.set_control(ControlId::VerticalBlank, lines)
    }

    /// Horizontal blank in pixels.
    pub fn set_hblank(&mut self, pixels: u32) -> Result<(), Error<I2C::Error>> {
        self.set_control(ControlId::HorizontalBlank, pixels)
    }

    /// Mirror horizontally. Standby only.
    pub fn set_hflip(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.set_control(ControlId::HorizontalFlip, u32::from(enable))
    }

    /// Flip vertically. Standby only.
    pub fn set_vflip(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        self.set_control(ControlId::VerticalFlip, u32::from(enable))
    }

    fn apply_control(&mut self, id: ControlId) -> Result<(), Error<I2C::Error>> {
        match id {
            ControlId::VerticalBlank => {
                self.write_vmax()?;
                // SHR is measured from the frame end, so it moves with VMAX.
                self.write_shr()
            }
            ControlId::HorizontalBlank => self.write_hmax(),
            ControlId::Exposure => self.write_shr(),
            ControlId::AnalogueGain => self.write_gain(),
            ControlId::HorizontalFlip => {
                let value = self.controls.get(id).value() as u8;
                self.write_reg(addr::WINMODEH, value)
            }
            ControlId::VerticalFlip => {
                let value = self.controls.get(id).value() as u8;
                self.write_reg(addr::WINMODEV, value)
            }
        }
    }

    /// Push every cached control value, timing first.
    fn apply_all_controls(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_vmax()?;
        self.write_hmax()?;
        self.write_shr()?;
        self.write_gain()?;
        self.apply_control(ControlId::HorizontalFlip)?;
        self.apply_control(ControlId::VerticalFlip)
    }

    fn write_vmax(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg_u24(addr::VMAX, self.vmax)
    }

    fn write_hmax(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg_u16(addr::HMAX, self.hmax.min(HMAX_MAX) as u16)
    }

    fn write_shr(&mut self) -> Result<(), Error<I2C::Error>> {
        let exposure = self.controls.get(ControlId::Exposure).value();
        let shr = timing::register_shr_for_exposure(exposure, self.hmax, self.vmax);
        trace!("exposure {=u32} -> SHR {=u32}", exposure, shr);
        self.write_reg_u16(addr::SHR, shr as u16)
    }

    /// Gain value and conversion-gain channel go out inside one hold bracket.
    fn write_gain(&mut self) -> Result<(), Error<I2C::Error>> {
        let step = self.controls.get(ControlId::AnalogueGain).value();
        let setting = map_gain(step, self.mode.hdr);
        trace!("gain {=u32} -> {=u16} {}", step, setting.value, setting.channel);
        self.with_register_hold(|dev| {
            dev.write_reg_u16(addr::ANALOG_GAIN, setting.value)?;
            dev.write_reg(addr::FDG_SEL0, setting.channel.bits().bits())
        })
    }

    /// Move between standby and streaming. Requesting the current state does
    /// nothing. A failed start leaves the session in standby; a failed stop is
    /// reported but the session is still marked standby.
    ///
    /// A suspended session counts as neither: starting it restarts the sensor
    /// and ends the suspend, stopping it just ends the session since the
    /// sensor is already in standby.
    pub fn set_stream(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        if self.suspended {
            if enable {
                return self.restart_suspended();
            }
            self.end_suspended();
            return Ok(());
        }
        if self.streaming == enable {
            return Ok(());
        }
        let result = if enable {
            self.start_streaming()?;
            Ok(())
        } else {
            self.stop_streaming()
        };
        self.streaming = enable;
        // Flips change the bayer order, so they are frozen while streaming.
        self.controls.grab_flips(enable);
        result
    }

    /// Same as `set_stream(true)`.
    pub fn start(&mut self) -> Result<(), Error<I2C::Error>> {
        self.set_stream(true)
    }

    /// Same as `set_stream(false)`.
    pub fn stop(&mut self) -> Result<(), Error<I2C::Error>> {
        self.set_stream(false)
    }

    fn start_streaming(&mut self) -> Result<(), Error<I2C::Error>> {
        info!("start streaming");
        if !self.common_regs_written {
            self.write_regs(COMMON_REGS)?;
            self.write_reg_u16(addr::BLKLEVEL, BLKLEVEL_DEFAULT)?;
            self.common_regs_written = true;
            debug!("common registers written");
        }

        let mode = self.mode;
        self.write_regs(mode.regs)?;

        if mode.linear {
            self.write_reg_u24(addr::CCMP1_EXP, 0)?;
            self.write_reg(addr::ACMP1_EXP, 0)?;
            self.write_reg_u24(addr::CCMP2_EXP, 0)?;
            self.write_reg(addr::ACMP2_EXP, 0)?;
        } else {
            self.write_reg_u24(addr::CCMP1_EXP, CCMP1_NONLINEAR)?;
            self.write_reg(addr::ACMP1_EXP, ACMP1_NONLINEAR)?;
            self.write_reg_u24(addr::CCMP2_EXP, CCMP2_NONLINEAR)?;
            self.write_reg(addr::ACMP2_EXP, ACMP2_NONLINEAR)?;
        }

        if mode.hdr {
            self.write_reg_u16(addr::EXP_TH_H, EXP_TH_H_DEFAULT)?;
            self.write_reg_u16(addr::EXP_TH_L, EXP_TH_L_DEFAULT)?;
            self.write_reg(addr::EXP_BK, EXP_BK_DEFAULT)?;
        }

        self.write_reg(addr::DIGITAL_CLAMP, 0)?;

        self.apply_all_controls()?;

        self.write_reg(addr::MODE_SELECT, ModeSelectBits::empty().bits())?;
        self.delay.delay_us(STREAM_DELAY_US);
        Ok(())
    }

    fn stop_streaming(&mut self) -> Result<(), Error<I2C::Error>> {
        info!("stop streaming");
        let result = self.write_reg(addr::MODE_SELECT, ModeSelectBits::STANDBY.bits());
        if result.is_err() {
            warn!("failed to enter standby");
        }
        result
    }

    /// Call before the sensor loses power. Stops streaming if needed and
    /// forces the common block to be rewritten after the next power-on.
    pub fn power_off(&mut self) -> Result<(), Error<I2C::Error>> {
        let result = self.set_stream(false);
        self.common_regs_written = false;
        result
    }

    /// System sleep: halt sensor output but remember that the session was
    /// streaming. Controls set while suspended are cached until resume.
    pub fn suspend(&mut self) -> Result<(), Error<I2C::Error>> {
        if self.is_streaming() {
            self.stop_streaming()?;
            self.suspended = true;
        }
        Ok(())
    }

    /// Undo [`Imx586::suspend`]. If the restart fails the sensor is put back
    /// in standby and the session drops to standby.
    pub fn resume(&mut self) -> Result<(), Error<I2C::Error>> {
        if !self.suspended {
            return Ok(());
        }
        self.restart_suspended()
    }

    fn restart_suspended(&mut self) -> Result<(), Error<I2C::Error>> {
        self.suspended = false;
        if let Err(e) = self.start_streaming() {
            if self.stop_streaming().is_err() {
                warn!("standby after failed restart also failed");
            }
            self.streaming = false;
            self.controls.grab_flips(false);
            return Err(e);
        }
        Ok(())
    }

    fn end_suspended(&mut self) {
        info!("stop suspended stream");
        self.suspended = false;
        self.streaming = false;
        self.controls.grab_flips(false);
    }
}
