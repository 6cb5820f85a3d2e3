//! Register map and constants for the IMX586.
//! Register addresses are 16-bit; multi-byte values are stored little-endian
//! starting at the listed address.

/// Default 7-bit I2C address.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x1A;

/// Register addresses (16-bit).
pub mod addr {
    /// Standby / streaming select.
    pub const MODE_SELECT: u16 = 0x3000;
    /// Register hold: latches pending writes at the next frame boundary when released.
    pub const REGHOLD: u16 = 0x3001;
    /// Horizontal window mode (flip).
    pub const WINMODEH: u16 = 0x3020;
    /// Vertical window mode (flip).
    pub const WINMODEV: u16 = 0x3021;
    /// Frame length, 20 bits over three bytes.
    pub const VMAX: u16 = 0x3028;
    /// Line length, 16 bits.
    pub const HMAX: u16 = 0x302C;
    /// Conversion gain select (LCG/HCG).
    pub const FDG_SEL0: u16 = 0x3030;
    /// Shutter reference.
    pub const SHR: u16 = 0x3050;
    /// Analog gain, 0.3 dB steps.
    pub const ANALOG_GAIN: u16 = 0x306C;
    /// Chip id (single byte read).
    pub const CHIP_ID: u16 = 0x30DC;
    /// Black level. Shares its address with the chip id register.
    pub const BLKLEVEL: u16 = 0x30DC;
    pub const DIGITAL_CLAMP: u16 = 0x3458;
    /// Clear HDR combining thresholds.
    pub const EXP_TH_H: u16 = 0x36D0;
    pub const EXP_TH_L: u16 = 0x36D4;
    pub const EXP_BK: u16 = 0x36E2;
    /// Gradation compression knee points and slopes.
    pub const CCMP2_EXP: u16 = 0x36E4;
    pub const CCMP1_EXP: u16 = 0x36E8;
    pub const ACMP2_EXP: u16 = 0x36EC;
    pub const ACMP1_EXP: u16 = 0x36EE;
}

/// Value expected in [`addr::CHIP_ID`].
pub const CHIP_ID: u8 = 0x32;

/// Settle time after leaving standby.
pub const STREAM_DELAY_US: u32 = 25_000;

pub const BLKLEVEL_DEFAULT: u16 = 0;

/// HDR threshold settings written when a Clear HDR mode starts.
pub const EXP_TH_H_DEFAULT: u16 = 4095;
pub const EXP_TH_L_DEFAULT: u16 = 512;
pub const EXP_BK_DEFAULT: u8 = 0;

/// Gradation compression curve for non-linear modes.
pub const CCMP1_NONLINEAR: u32 = 500;
pub const ACMP1_NONLINEAR: u8 = 0x02;
pub const CCMP2_NONLINEAR: u32 = 11_500;
pub const ACMP2_NONLINEAR: u8 = 0x06;

/// Native pixel array, including optical border.
pub const NATIVE_WIDTH: u32 = 3856;
pub const NATIVE_HEIGHT: u32 = 2180;
/// Active pixel array inside the native area.
pub const PIXEL_ARRAY_LEFT: u32 = 8;
pub const PIXEL_ARRAY_TOP: u32 = 8;
pub const PIXEL_ARRAY_WIDTH: u32 = 3840;
pub const PIXEL_ARRAY_HEIGHT: u32 = 2160;

/// Embedded metadata stream geometry.
pub const EMBEDDED_LINE_WIDTH: u32 = 16_384;
pub const NUM_EMBEDDED_LINES: u32 = 1;

bitflags::bitflags! {
    /// MODE_SELECT register bits (0x3000).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ModeSelectBits: u8 {
        /// Bit 0: 1 = standby, 0 = streaming.
        const STANDBY = 1 << 0;
    }

    /// REGHOLD register bits (0x3001).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RegHoldBits: u8 {
        const HOLD = 1 << 0;
    }

    /// FDG_SEL0 register bits (0x3030).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FdgSelBits: u8 {
        /// Bit 0: high conversion gain (0 = LCG).
        const HCG = 1 << 0;
    }

    /// Current image flips. The raw bits double as the offset into a
    /// bayer code block (none, h, v, h+v).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct FlipBits: u8 {
        const H = 1 << 0;
        const V = 1 << 1;
    }
}

/// Single byte register write.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reg {
    pub address: u16,
    pub value: u8,
}

impl Reg {
    pub const fn new(address: u16, value: u8) -> Self {
        Self { address, value }
    }
}

/// Mode-independent setup, written once per power cycle before the first
/// mode table. Starts and ends with the master-mode register (0x3002).
pub static COMMON_REGS: &[Reg] = &[
    Reg::new(0x3002, 0x01),
    Reg::new(0x301A, 0x00),
    Reg::new(0x301B, 0x00),
    Reg::new(0x3024, 0x00),
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
    Reg::new(0x3014, 0x04),
    Reg::new(0x3015, 0x02),
    Reg::new(0x3030, 0x00),
    Reg::new(0x3040, 0x03),
    Reg::new(0x3023, 0x01),
    Reg::new(0x30A6, 0x00),
    Reg::new(0x3081, 0x00),
    Reg::new(0x3460, 0x21),
    Reg::new(0x3478, 0xA1),
    Reg::new(0x347C, 0x01),
    Reg::new(0x3480, 0x01),
    Reg::new(0x3A4E, 0x14),
    Reg::new(0x3A52, 0x14),
    Reg::new(0x3A56, 0x00),
    Reg::new(0x3A5A, 0x00),
    Reg::new(0x3A5E, 0x00),
    Reg::new(0x3A62, 0x00),
    Reg::new(0x3A6A, 0x20),
    Reg::new(0x3A6C, 0x42),
    Reg::new(0x3A6E, 0xA0),
    Reg::new(0x3B2C, 0x0C),
    Reg::new(0x3B30, 0x1C),
    Reg::new(0x3B34, 0x0C),
    Reg::new(0x3B38, 0x1C),
    Reg::new(0x3BA0, 0x0C),
    Reg::new(0x3BA4, 0x1C),
    Reg::new(0x3BA8, 0x0C),
    Reg::new(0x3BAC, 0x1C),
    Reg::new(0x3D3C, 0x11),
    Reg::new(0x3D46, 0x0B),
    Reg::new(0x3DE0, 0x3F),
    Reg::new(0x3DE1, 0x08),
    Reg::new(0x3E14, 0x87),
    Reg::new(0x3E16, 0x91),
    Reg::new(0x3E18, 0x91),
    Reg::new(0x3E1A, 0x87),
    Reg::new(0x3E1C, 0x78),
    Reg::new(0x3E1E, 0x50),
    Reg::new(0x3E20, 0x50),
    Reg::new(0x3E22, 0x50),
    Reg::new(0x3E24, 0x87),
    Reg::new(0x3E26, 0x91),
    Reg::new(0x3E28, 0x91),
    Reg::new(0x3E2A, 0x87),
    Reg::new(0x3E2C, 0x78),
    Reg::new(0x3E2E, 0x50),
    Reg::new(0x3E30, 0x50),
    Reg::new(0x3E32, 0x50),
    Reg::new(0x3E34, 0x87),
    Reg::new(0x3E36, 0x91),
    Reg::new(0x3E38, 0x91),
    Reg::new(0x3E3A, 0x87),
    Reg::new(0x3E3C, 0x78),
    Reg::new(0x3E3E, 0x50),
    Reg::new(0x3E40, 0x50),
    Reg::new(0x3E42, 0x50),
    Reg::new(0x4054, 0x64),
    Reg::new(0x4148, 0xFE),
    Reg::new(0x4149, 0x05),
    Reg::new(0x414A, 0xFF),
    Reg::new(0x414B, 0x05),
    Reg::new(0x420A, 0x03),
    Reg::new(0x4231, 0x08),
    Reg::new(0x423D, 0x9C),
    Reg::new(0x4242, 0xB4),
    Reg::new(0x4246, 0xB4),
    Reg::new(0x424E, 0xB4),
    Reg::new(0x425C, 0xB4),
    Reg::new(0x425E, 0xB6),
    Reg::new(0x426C, 0xB4),
    Reg::new(0x426E, 0xB6),
    Reg::new(0x428C, 0xB4),
    Reg::new(0x428E, 0xB6),
    Reg::new(0x4708, 0x00),
    Reg::new(0x4709, 0x00),
    Reg::new(0x470A, 0xFF),
    Reg::new(0x470B, 0x03),
    Reg::new(0x470C, 0x00),
    Reg::new(0x470D, 0x00),
    Reg::new(0x470E, 0xFF),
    Reg::new(0x470F, 0x03),
    Reg::new(0x47EB, 0x1C),
    Reg::new(0x47F0, 0xA6),
    Reg::new(0x47F2, 0xA6),
    Reg::new(0x47F4, 0xA0),
    Reg::new(0x47F6, 0x96),
    Reg::new(0x4808, 0xA6),
    Reg::new(0x480A, 0xA6),
    Reg::new(0x480C, 0xA0),
    Reg::new(0x480E, 0x96),
    Reg::new(0x492C, 0xB2),
    Reg::new(0x4930, 0x03),
    Reg::new(0x4932, 0x03),
    Reg::new(0x4936, 0x5B),
    Reg::new(0x4938, 0x82),
    Reg::new(0x493E, 0x23),
    Reg::new(0x4BA8, 0x1C),
    Reg::new(0x4BA9, 0x03),
    Reg::new(0x4BAC, 0x1C),
    Reg::new(0x4BAD, 0x1C),
    Reg::new(0x4BAE, 0x1C),
    Reg::new(0x4BAF, 0x1C),
    Reg::new(0x4BB0, 0x1C),
    Reg::new(0x4BB1, 0x1C),
    Reg::new(0x4BB2, 0x1C),
    Reg::new(0x4BB3, 0x1C),
    Reg::new(0x4BB4, 0x1C),
    Reg::new(0x4BB8, 0x03),
    Reg::new(0x4BB9, 0x03),
    Reg::new(0x4BBA, 0x03),
    Reg::new(0x4BBB, 0x03),
    Reg::new(0x4BBC, 0x03),
    Reg::new(0x4BBD, 0x03),
    Reg::new(0x4BBE, 0x03),
    Reg::new(0x4BBF, 0x03),
    Reg::new(0x4BC0, 0x03),
    Reg::new(0x4C14, 0x87),
    Reg::new(0x4C16, 0x91),
    Reg::new(0x4C18, 0x91),
    Reg::new(0x4C1A, 0x87),
    Reg::new(0x4C1C, 0x78),
    Reg::new(0x4C1E, 0x50),
    Reg::new(0x4C20, 0x50),
    Reg::new(0x4C22, 0x50),
    Reg::new(0x4C24, 0x87),
    Reg::new(0x4C26, 0x91),
    Reg::new(0x4C28, 0x91),
    Reg::new(0x4C2A, 0x87),
    Reg::new(0x4C2C, 0x78),
    Reg::new(0x4C2E, 0x50),
    Reg::new(0x4C30, 0x50),
    Reg::new(0x4C32, 0x50),
    Reg::new(0x4C34, 0x87),
    Reg::new(0x4C36, 0x91),
    Reg::new(0x4C38, 0x91),
    Reg::new(0x4C3A, 0x87),
    Reg::new(0x4C3C, 0x78),
    Reg::new(0x4C3E, 0x50),
    Reg::new(0x4C40, 0x50),
    Reg::new(0x4C42, 0x50),
    Reg::new(0x4D12, 0x1F),
    Reg::new(0x4D13, 0x1E),
    Reg::new(0x4D26, 0x33),
    Reg::new(0x4E0E, 0x59),
    Reg::new(0x4E14, 0x55),
    Reg::new(0x4E16, 0x59),
    Reg::new(0x4E1E, 0x3B),
    Reg::new(0x4E20, 0x47),
    Reg::new(0x4E22, 0x54),
    Reg::new(0x4E26, 0x81),
    Reg::new(0x4E2C, 0x7D),
    Reg::new(0x4E2E, 0x81),
    Reg::new(0x4E36, 0x63),
    Reg::new(0x4E38, 0x6F),
    Reg::new(0x4E3A, 0x7C),
    Reg::new(0x4F3A, 0x3C),
    Reg::new(0x4F3C, 0x46),
    Reg::new(0x4F3E, 0x59),
    Reg::new(0x4F42, 0x64),
    Reg::new(0x4F44, 0x6E),
    Reg::new(0x4F46, 0x81),
    Reg::new(0x4F4A, 0x82),
    Reg::new(0x4F5A, 0x81),
    Reg::new(0x4F62, 0xAA),
    Reg::new(0x4F72, 0xA9),
    Reg::new(0x4F78, 0x36),
    Reg::new(0x4F7A, 0x41),
    Reg::new(0x4F7C, 0x61),
    Reg::new(0x4F7D, 0x01),
    Reg::new(0x4F7E, 0x7C),
    Reg::new(0x4F7F, 0x01),
    Reg::new(0x4F80, 0x77),
    Reg::new(0x4F82, 0x7B),
    Reg::new(0x4F88, 0x37),
    Reg::new(0x4F8A, 0x40),
    Reg::new(0x4F8C, 0x62),
    Reg::new(0x4F8D, 0x01),
    Reg::new(0x4F8E, 0x76),
    Reg::new(0x4F8F, 0x01),
    Reg::new(0x4F90, 0x5E),
    Reg::new(0x4F91, 0x02),
    Reg::new(0x4F92, 0x69),
    Reg::new(0x4F93, 0x02),
    Reg::new(0x4F94, 0x89),
    Reg::new(0x4F95, 0x02),
    Reg::new(0x4F96, 0xA4),
    Reg::new(0x4F97, 0x02),
    Reg::new(0x4F98, 0x9F),
    Reg::new(0x4F99, 0x02),
    Reg::new(0x4F9A, 0xA3),
    Reg::new(0x4F9B, 0x02),
    Reg::new(0x4FA0, 0x5F),
    Reg::new(0x4FA1, 0x02),
    Reg::new(0x4FA2, 0x68),
    Reg::new(0x4FA3, 0x02),
    Reg::new(0x4FA4, 0x8A),
    Reg::new(0x4FA5, 0x02),
    Reg::new(0x4FA6, 0x9E),
    Reg::new(0x4FA7, 0x02),
    Reg::new(0x519E, 0x79),
    Reg::new(0x51A6, 0xA1),
    Reg::new(0x51F0, 0xAC),
    Reg::new(0x51F2, 0xAA),
    Reg::new(0x51F4, 0xA5),
    Reg::new(0x51F6, 0xA0),
    Reg::new(0x5200, 0x9B),
    Reg::new(0x5202, 0x91),
    Reg::new(0x5204, 0x87),
    Reg::new(0x5206, 0x82),
    Reg::new(0x5208, 0xAC),
    Reg::new(0x520A, 0xAA),
    Reg::new(0x520C, 0xA5),
    Reg::new(0x520E, 0xA0),
    Reg::new(0x5210, 0x9B),
    Reg::new(0x5212, 0x91),
    Reg::new(0x5214, 0x87),
    Reg::new(0x5216, 0x82),
    Reg::new(0x5218, 0xAC),
    Reg::new(0x521A, 0xAA),
    Reg::new(0x521C, 0xA5),
    Reg::new(0x521E, 0xA0),
    Reg::new(0x5220, 0x9B),
    Reg::new(0x5222, 0x91),
    Reg::new(0x5224, 0x87),
    Reg::new(0x5226, 0x82),
    Reg::new(0x3002, 0x00),
];
