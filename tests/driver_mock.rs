use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};
use imx586_rs::data_types::{Config, ControlId, MbusCode, Pad, StreamState, TransferFunction, Which, FrameFormat};
use imx586_rs::modes::{Mode, MODES_LINEAR_12BIT, MODES_NONLINEAR_12BIT};
use imx586_rs::registers::{addr, COMMON_REGS};
use imx586_rs::{Error, Imx586};

const ADDR: u8 = 0x1A;

type Driver = Imx586<I2cMock, NoopDelay>;

fn w(reg: u16, data: &[u8]) -> I2cTrans {
    let mut bytes = reg.to_be_bytes().to_vec();
    bytes.extend_from_slice(data);
    I2cTrans::write(ADDR, bytes)
}

fn gain_bracket(gain: u16, fdg: u8) -> Vec<I2cTrans> {
    vec![
        w(addr::REGHOLD, &[0x01]),
        w(addr::ANALOG_GAIN, &gain.to_le_bytes()),
        w(addr::FDG_SEL0, &[fdg]),
        w(addr::REGHOLD, &[0x00]),
    ]
}

/// Register values pushed after the mode table on every start.
struct Pushed {
    vmax: u32,
    hmax: u16,
    shr: u16,
    gain: u16,
    fdg: u8,
}

/// Defaults for the 4K linear mode: exposure 1000 at HMAX 550 / VMAX 2250.
const DEFAULT_4K: Pushed = Pushed {
    vmax: 2250,
    hmax: 550,
    shr: 1251,
    gain: 0,
    fdg: 0,
};

fn start_sequence(mode: &Mode, with_common: bool, pushed: &Pushed) -> Vec<I2cTrans> {
    let mut t = Vec::new();
    if with_common {
        t.extend(COMMON_REGS.iter().map(|r| w(r.address, &[r.value])));
        t.push(w(addr::BLKLEVEL, &[0x00, 0x00]));
    }
    t.extend(mode.regs.iter().map(|r| w(r.address, &[r.value])));
    if mode.linear {
        t.push(w(addr::CCMP1_EXP, &[0, 0, 0]));
        t.push(w(addr::ACMP1_EXP, &[0]));
        t.push(w(addr::CCMP2_EXP, &[0, 0, 0]));
        t.push(w(addr::ACMP2_EXP, &[0]));
    } else {
        // 500 and 11500 as 24-bit little endian.
        t.push(w(addr::CCMP1_EXP, &[0xF4, 0x01, 0x00]));
        t.push(w(addr::ACMP1_EXP, &[0x02]));
        t.push(w(addr::CCMP2_EXP, &[0xEC, 0x2C, 0x00]));
        t.push(w(addr::ACMP2_EXP, &[0x06]));
    }
    if mode.hdr {
        t.push(w(addr::EXP_TH_H, &4095u16.to_le_bytes()));
        t.push(w(addr::EXP_TH_L, &512u16.to_le_bytes()));
        t.push(w(addr::EXP_BK, &[0x00]));
    }
    t.push(w(addr::DIGITAL_CLAMP, &[0x00]));
    t.push(w(addr::VMAX, &pushed.vmax.to_le_bytes()[..3]));
    t.push(w(addr::HMAX, &pushed.hmax.to_le_bytes()));
    t.push(w(addr::SHR, &pushed.shr.to_le_bytes()));
    t.extend(gain_bracket(pushed.gain, pushed.fdg));
    t.push(w(addr::WINMODEH, &[0x00]));
    t.push(w(addr::WINMODEV, &[0x00]));
    t.push(w(addr::MODE_SELECT, &[0x00]));
    t
}

fn stop_sequence() -> Vec<I2cTrans> {
    vec![w(addr::MODE_SELECT, &[0x01])]
}

fn driver(expectations: &[I2cTrans]) -> Driver {
    Imx586::new(I2cMock::new(expectations), NoopDelay::new(), Config::color())
}

fn finish(dev: Driver) {
    let (mut i2c, _) = dev.free();
    i2c.done();
}

#[test]
fn probe_reads_chip_id() {
    let expectations = [I2cTrans::write_read(0x10, vec![0x30, 0xDC], vec![0x32])];
    let dev = Imx586::probe(
        I2cMock::new(&expectations),
        NoopDelay::new(),
        Config::color().with_address(0x10),
    )
    .unwrap();
    assert_eq!(dev.address(), 0x10);
    assert_eq!(dev.stream_state(), StreamState::Standby);
    assert!(!dev.common_regs_written());
    finish(dev);
}

#[test]
fn identify_rejects_wrong_id() {
    let expectations = [I2cTrans::write_read(ADDR, vec![0x30, 0xDC], vec![0x31])];
    let mut dev = driver(&expectations);
    assert_eq!(dev.identify(), Err(Error::IdMismatch(0x31)));
    finish(dev);
}

#[test]
fn identify_propagates_bus_error() {
    let expectations = [I2cTrans::write_read(ADDR, vec![0x30, 0xDC], vec![0x00]).with_error(ErrorKind::Other)];
    let mut dev = driver(&expectations);
    assert_eq!(dev.identify(), Err(Error::I2c(ErrorKind::Other)));
    finish(dev);
}

#[test]
fn register_access_byte_order() {
    let expectations = [
        I2cTrans::write_read(ADDR, vec![0x30, 0x28], vec![0x01, 0x02, 0x03]),
        w(0x302C, &[0x34, 0x12]),
        w(0x3028, &[0x56, 0x34, 0x12]),
        w(0x3000, &[0x01]),
    ];
    let mut dev = driver(&expectations);
    assert_eq!(dev.read_reg(0x3028, 3), Ok(0x0001_0203));
    dev.write_reg_u16(0x302C, 0x1234).unwrap();
    dev.write_reg_u24(0x3028, 0x0012_3456).unwrap();
    dev.write_reg(0x3000, 0x01).unwrap();
    assert_eq!(dev.read_reg(0x3000, 5), Err(Error::InvalidArgument));
    assert_eq!(dev.read_reg(0x3000, 0), Err(Error::InvalidArgument));
    finish(dev);
}

#[test]
fn register_hold_released_after_failure() {
    let expectations = [
        w(addr::REGHOLD, &[0x01]),
        w(addr::ANALOG_GAIN, &[0x05, 0x00]).with_error(ErrorKind::Other),
        w(addr::REGHOLD, &[0x00]),
    ];
    let mut dev = driver(&expectations);
    let result = dev.with_register_hold(|d| d.write_reg_u16(addr::ANALOG_GAIN, 5));
    assert_eq!(result, Err(Error::I2c(ErrorKind::Other)));
    finish(dev);
}

#[test]
fn first_start_writes_full_sequence() {
    let expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    assert_eq!(dev.stream_state(), StreamState::Streaming);
    assert!(dev.common_regs_written());
    finish(dev);
}

#[test]
fn common_block_written_once_per_power_cycle() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    expectations.extend(stop_sequence());
    expectations.extend(start_sequence(&MODES_LINEAR_12BIT[0], false, &DEFAULT_4K));
    expectations.extend(stop_sequence());
    // Power loss forces the common block again.
    expectations.extend(start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K));

    let mut dev = driver(&expectations);
    dev.start().unwrap();
    dev.stop().unwrap();
    assert_eq!(dev.stream_state(), StreamState::Standby);
    dev.start().unwrap();
    dev.power_off().unwrap();
    assert!(!dev.common_regs_written());
    dev.start().unwrap();
    finish(dev);
}

#[test]
fn repeated_requests_are_noops() {
    let expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    let mut dev = driver(&expectations);
    dev.stop().unwrap();
    dev.start().unwrap();
    dev.set_stream(true).unwrap();
    finish(dev);

    let mut dev = driver(&[]);
    dev.power_off().unwrap();
    dev.set_stream(false).unwrap();
    finish(dev);
}

#[test]
fn failed_start_stays_in_standby() {
    let mut expectations = vec![w(0x3002, &[0x01]).with_error(ErrorKind::Other)];
    expectations.extend(start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K));

    let mut dev = driver(&expectations);
    assert_eq!(dev.start(), Err(Error::I2c(ErrorKind::Other)));
    assert_eq!(dev.stream_state(), StreamState::Standby);
    assert!(!dev.common_regs_written());
    // Flips stay writable after a failed start.
    assert!(!dev.control(ControlId::HorizontalFlip).is_grabbed());
    dev.start().unwrap();
    finish(dev);
}

#[test]
fn failed_stop_still_reports_standby() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    expectations.push(w(addr::MODE_SELECT, &[0x01]).with_error(ErrorKind::Other));

    let mut dev = driver(&expectations);
    dev.start().unwrap();
    assert_eq!(dev.stop(), Err(Error::I2c(ErrorKind::Other)));
    assert_eq!(dev.stream_state(), StreamState::Standby);
    assert!(!dev.control(ControlId::VerticalFlip).is_grabbed());
    finish(dev);
}

#[test]
fn controls_cached_in_standby() {
    let mut dev = driver(&[]);
    dev.set_exposure(500).unwrap();
    dev.set_analogue_gain(100).unwrap();
    dev.set_hflip(true).unwrap();
    dev.set_vblank(1000).unwrap();
    assert_eq!(dev.control(ControlId::Exposure).value(), 500);
    assert_eq!(dev.control(ControlId::AnalogueGain).value(), 100);
    assert_eq!(dev.vmax(), 3180);
    assert_eq!(dev.control(ControlId::Exposure).max(), 3160);
    finish(dev);
}

#[test]
fn cached_controls_applied_on_start() {
    let pushed = Pushed {
        vmax: 3180,
        hmax: 550,
        // 3180 - floor((500 * 550 - 209) / 550)
        shr: 2681,
        gain: 49,
        fdg: 0x01,
    };
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &pushed);
    let len = expectations.len();
    expectations[len - 3] = w(addr::WINMODEH, &[0x01]);

    let mut dev = driver(&expectations);
    dev.set_exposure(500).unwrap();
    dev.set_analogue_gain(100).unwrap();
    dev.set_hflip(true).unwrap();
    dev.set_vblank(1000).unwrap();
    dev.start().unwrap();
    finish(dev);
}

#[test]
fn out_of_range_rejected_without_bus_traffic() {
    let expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    assert_eq!(dev.set_exposure(2231), Err(Error::OutOfRange));
    assert_eq!(dev.set_exposure(3), Err(Error::OutOfRange));
    assert_eq!(dev.set_analogue_gain(241), Err(Error::OutOfRange));
    assert_eq!(dev.set_vblank(69), Err(Error::OutOfRange));
    assert_eq!(dev.control(ControlId::Exposure).value(), 1000);
    finish(dev);
}

#[test]
fn flips_busy_while_streaming() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    expectations.extend(stop_sequence());
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    assert_eq!(dev.set_hflip(true), Err(Error::Busy));
    assert_eq!(dev.set_vflip(true), Err(Error::Busy));
    assert_eq!(dev.control(ControlId::HorizontalFlip).value(), 0);
    dev.stop().unwrap();
    dev.set_vflip(true).unwrap();
    assert_eq!(
        dev.get_format(Pad::Image, Which::Active).unwrap().code,
        MbusCode::Sgbrg12
    );
    finish(dev);
}

#[test]
fn streaming_gain_uses_register_hold() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    expectations.extend(gain_bracket(49, 0x01));
    expectations.extend(gain_bracket(79, 0x00));
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    dev.set_analogue_gain(100).unwrap();
    dev.set_analogue_gain(79).unwrap();
    finish(dev);
}

#[test]
fn streaming_exposure_writes_shr() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    // 2250 - floor((2000 * 550 - 209) / 550) = 251
    expectations.push(w(addr::SHR, &251u16.to_le_bytes()));
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    dev.set_exposure(2000).unwrap();
    finish(dev);
}

#[test]
fn streaming_vblank_rewrites_vmax_and_shr() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    expectations.push(w(addr::VMAX, &[0xE8, 0x08, 0x00]));
    expectations.push(w(addr::SHR, &1281u16.to_le_bytes()));
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    dev.set_vblank(100).unwrap();
    assert_eq!(dev.vmax(), 2280);
    assert_eq!(dev.control(ControlId::Exposure).max(), 2260);
    finish(dev);
}

#[test]
fn shrinking_vblank_clamps_exposure() {
    let mut dev = driver(&[]);
    dev.set_vblank(1000).unwrap();
    dev.set_exposure(3000).unwrap();
    dev.set_vblank(70).unwrap();
    assert_eq!(dev.control(ControlId::Exposure).value(), 2230);
    finish(dev);
}

#[test]
fn streaming_hblank_writes_hmax() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    expectations.push(w(addr::HMAX, &1100u16.to_le_bytes()));
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    dev.set_hblank(3856).unwrap();
    assert_eq!(dev.hmax(), 1100);
    finish(dev);
}

#[test]
fn failed_control_write_restores_value() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    expectations.push(w(addr::VMAX, &[0xE8, 0x08, 0x00]).with_error(ErrorKind::Other));
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    assert_eq!(dev.set_vblank(100), Err(Error::I2c(ErrorKind::Other)));
    assert_eq!(dev.control(ControlId::VerticalBlank).value(), 70);
    assert_eq!(dev.vmax(), 2250);
    finish(dev);
}

#[test]
fn nonlinear_mode_start_sequence() {
    let pushed = Pushed {
        vmax: 4500,
        hmax: 550,
        shr: 3501,
        gain: 100,
        fdg: 0x00,
    };
    let expectations = start_sequence(&MODES_NONLINEAR_12BIT[0], true, &pushed);
    let mut dev = driver(&expectations);
    let req = FrameFormat {
        width: 3856,
        height: 2180,
        code: MbusCode::Srggb12,
        transfer_function: TransferFunction::GradationCompression,
    };
    dev.set_format(Pad::Image, Which::Active, req).unwrap();
    // HDR modes keep high gains on the low conversion channel.
    dev.set_analogue_gain(100).unwrap();
    dev.start().unwrap();
    finish(dev);
}

#[test]
fn suspend_and_resume_restart_stream() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    expectations.extend(stop_sequence());
    expectations.extend(start_sequence(&MODES_LINEAR_12BIT[0], false, &DEFAULT_4K));
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    dev.suspend().unwrap();
    assert_eq!(dev.stream_state(), StreamState::Suspended);
    assert!(!dev.is_streaming());
    dev.resume().unwrap();
    assert_eq!(dev.stream_state(), StreamState::Streaming);
    finish(dev);
}

#[test]
fn failed_resume_drops_to_standby() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    expectations.extend(stop_sequence());
    let first = &MODES_LINEAR_12BIT[0].regs[0];
    expectations.push(w(first.address, &[first.value]).with_error(ErrorKind::Other));
    expectations.extend(stop_sequence());
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    dev.suspend().unwrap();
    assert_eq!(dev.resume(), Err(Error::I2c(ErrorKind::Other)));
    assert_eq!(dev.stream_state(), StreamState::Standby);
    finish(dev);
}

#[test]
fn start_while_suspended_restarts_sensor() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    expectations.extend(stop_sequence());
    expectations.extend(start_sequence(&MODES_LINEAR_12BIT[0], false, &DEFAULT_4K));
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    dev.suspend().unwrap();
    dev.start().unwrap();
    assert_eq!(dev.stream_state(), StreamState::Streaming);
    // Already running again, nothing left to resume.
    dev.resume().unwrap();
    assert_eq!(dev.stream_state(), StreamState::Streaming);
    finish(dev);
}

#[test]
fn controls_cached_while_suspended() {
    let pushed = Pushed {
        // 2250 - floor((2000 * 550 - 209) / 550)
        shr: 251,
        gain: 49,
        fdg: 0x01,
        ..DEFAULT_4K
    };
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    expectations.extend(stop_sequence());
    expectations.extend(start_sequence(&MODES_LINEAR_12BIT[0], false, &pushed));
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    dev.suspend().unwrap();
    dev.set_exposure(2000).unwrap();
    dev.set_analogue_gain(100).unwrap();
    assert_eq!(dev.set_hflip(true), Err(Error::Busy));
    dev.resume().unwrap();
    finish(dev);
}

#[test]
fn stop_while_suspended_skips_bus() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    expectations.extend(stop_sequence());
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    dev.suspend().unwrap();
    dev.stop().unwrap();
    assert_eq!(dev.stream_state(), StreamState::Standby);
    assert!(!dev.control(ControlId::HorizontalFlip).is_grabbed());
    dev.resume().unwrap();
    assert_eq!(dev.stream_state(), StreamState::Standby);
    finish(dev);
}

#[test]
fn shortest_exposure_keeps_shr_margin() {
    let mut expectations = start_sequence(&MODES_LINEAR_12BIT[0], true, &DEFAULT_4K);
    // VMAX - 4
    expectations.push(w(addr::SHR, &2246u16.to_le_bytes()));
    let mut dev = driver(&expectations);
    dev.start().unwrap();
    let min = dev.control(ControlId::Exposure).min();
    assert_eq!(min, 4);
    dev.set_exposure(min).unwrap();
    finish(dev);
}

#[test]
fn idle_suspend_resume_touch_nothing() {
    let mut dev = driver(&[]);
    dev.suspend().unwrap();
    dev.resume().unwrap();
    finish(dev);
}
