/// Number of input registers the sensor exposes.
pub const REGISTER_COUNT: usize = 120;
/// Highest valid register address.
pub const ADDRESS_MAX: u16 = 119;

const _: () = assert!(ADDRESS_MAX as usize + 1 == REGISTER_COUNT);

/// How the 16-bit word at an address is to be read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    /// Unsigned 16-bit word.
    U16,
    /// Signed 16-bit word.
    I16,
    /// Lower half of an unsigned 32-bit value split across two registers.
    U32Lo,
    /// Upper half of an unsigned 32-bit value split across two registers.
    U32Hi,
}

impl ValueKind {
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I16)
    }

    pub const fn is_split(self) -> bool {
        matches!(self, Self::U32Lo | Self::U32Hi)
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32Lo => "u32/lo",
            Self::U32Hi => "u32/hi",
        })
    }
}

/// A raw register word together with its physical interpretation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodedValue {
    pub raw: i16,
    pub adjusted: f64,
}

impl std::fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}", self.adjusted))
    }
}

impl serde::Serialize for DecodedValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.adjusted)
    }
}

/// The nine semantic bands the register map is partitioned into.
///
/// Discriminants are the band start addresses, which is also how the device
/// documentation numbers the bands. `bounds` spans are inclusive and tile the
/// whole address space; the assertions further down hold the tables to that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum, serde::Serialize, strum::Display)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[repr(u16)]
pub enum RegisterBank {
    StatusInformation = 0,
    StandardMetric = 20,
    StandardImperial = 30,
    Distance = 40,
    TemperaturesMetric = 55,
    TemperaturesImperial = 70,
    Angles = 85,
    LogicAndNormalizedValues = 95,
    ServiceChannels = 105,
}

impl RegisterBank {
    pub const ALL: [Self; 9] = [
        Self::StatusInformation,
        Self::StandardMetric,
        Self::StandardImperial,
        Self::Distance,
        Self::TemperaturesMetric,
        Self::TemperaturesImperial,
        Self::Angles,
        Self::LogicAndNormalizedValues,
        Self::ServiceChannels,
    ];

    /// Inclusive address span of the band.
    pub const fn bounds(self) -> (u16, u16) {
        match self {
            Self::StatusInformation => (0, 19),
            Self::StandardMetric => (20, 29),
            Self::StandardImperial => (30, 39),
            Self::Distance => (40, 54),
            Self::TemperaturesMetric => (55, 69),
            Self::TemperaturesImperial => (70, 84),
            Self::Angles => (85, 94),
            Self::LogicAndNormalizedValues => (95, 104),
            Self::ServiceChannels => (105, 119),
        }
    }

    pub const fn start_address(self) -> u16 {
        self.bounds().0
    }

    pub const fn end_address(self) -> u16 {
        self.bounds().1
    }

    pub const fn register_count(self) -> u16 {
        let (start, end) = self.bounds();
        end - start + 1
    }

    /// Parses a band from its start-address code.
    pub fn from_raw(code: u16) -> Option<RegisterBank> {
        Self::ALL.into_iter().find(|bank| bank.start_address() == code)
    }

    /// The band an address falls into. Total: the bands tile the map.
    pub fn containing(address: RegisterAddress) -> RegisterBank {
        let index = Self::ALL.partition_point(|bank| bank.start_address() <= address.raw());
        Self::ALL[index - 1]
    }

    pub fn addresses(self) -> impl Iterator<Item = RegisterAddress> {
        let (start, end) = self.bounds();
        (start..=end).map(RegisterAddress)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterAddress(u16);

impl RegisterAddress {
    pub fn from_raw(address: u16) -> Option<RegisterAddress> {
        (address <= ADDRESS_MAX).then_some(Self(address))
    }

    /// Looks an address up by its mnemonic, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<RegisterAddress> {
        let name = name.to_ascii_uppercase();
        let index = NAMES.into_iter().position(|v| v == name)?;
        Some(Self(index as u16))
    }

    pub fn raw(&self) -> u16 {
        self.0
    }

    fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn name(&self) -> &'static str {
        NAMES[self.index()]
    }

    pub fn kind(&self) -> ValueKind {
        KINDS[self.index()]
    }

    /// Scale divisor for the raw word; `0` means the value is unscaled.
    pub fn scale(&self) -> f64 {
        SCALES[self.index()]
    }

    pub fn minimum(&self) -> i32 {
        MINIMUM_VALUES[self.index()]
    }

    pub fn maximum(&self) -> i32 {
        MAXIMUM_VALUES[self.index()]
    }

    pub fn bank(&self) -> RegisterBank {
        RegisterBank::containing(*self)
    }

    /// The other half of a split 32-bit value, for split registers only.
    pub fn paired_with(&self) -> Option<RegisterAddress> {
        PAIRED_ADDRESSES[self.index()].map(Self)
    }

    pub fn description(&self) -> &'static str {
        DESCRIPTIONS[self.index()]
    }

    /// Interprets a raw word according to this address' metadata.
    ///
    /// Signed registers divide by the scale in floating point; unsigned
    /// registers and split halves reinterpret the word as `u16` first. The
    /// declared valid range is deliberately not applied here: a reading
    /// outside it is diagnostic information about the sensor and is passed
    /// through untouched.
    pub fn decode(&self, raw: i16) -> DecodedValue {
        let magnitude = if self.kind().is_signed() {
            raw as f64
        } else {
            (raw as u16) as f64
        };
        let scale = self.scale();
        let adjusted = if scale == 0.0 || scale == 1.0 {
            magnitude
        } else {
            magnitude / scale
        };
        DecodedValue { raw, adjusted }
    }

    /// Combines both halves of a split 32-bit value. For registers that are
    /// not split halves this is the same as [`Self::decode`].
    pub fn decode_pair(&self, raw: i16, partner_raw: i16) -> DecodedValue {
        let combined = match self.kind() {
            ValueKind::U32Lo => combine_u32(raw, partner_raw),
            ValueKind::U32Hi => combine_u32(partner_raw, raw),
            ValueKind::U16 | ValueKind::I16 => return self.decode(raw),
        };
        DecodedValue {
            raw,
            adjusted: combined as f64,
        }
    }

    /// Scales a physical value back into this register's wire representation.
    pub fn encode(&self, value: f64) -> Result<i16, Error> {
        encode_scale(value, self.scale())
    }
}

impl std::fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}", self.0))
    }
}

impl std::fmt::Debug for RegisterAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{} ({})", self.0, self.name()))
    }
}

pub fn combine_u32(lower: i16, upper: i16) -> u32 {
    ((upper as u16 as u32) << 16) | lower as u16 as u32
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("value {value} does not fit a 16-bit register when scaled by {scale}")]
    EncodeOverflow { value: f64, scale: f64 },
}

/// Multiplies a physical value by the scale and rounds to the nearest wire
/// word. Values that land outside the signed 16-bit domain are an error,
/// never truncated. Scale `0` and `1` both mean "unscaled".
pub fn encode_scale(value: f64, scale: f64) -> Result<i16, Error> {
    let scaled = if scale == 0.0 || scale == 1.0 {
        value
    } else {
        value * scale
    };
    let scaled = scaled.round();
    if !(scaled >= i16::MIN as f64 && scaled <= i16::MAX as f64) {
        return Err(Error::EncodeOverflow { value, scale });
    }
    Ok(scaled as i16)
}

macro_rules! for_each_register {
    ($m:ident) => {
        $m! {
            // 0..=19: status information
            0: U16, "SI_DEVICE_IDENTIFICATION";
            1: U32Lo, "SI_DEVICE_STATUS_LO", pair = 2;
            2: U32Hi, "SI_DEVICE_STATUS_HI", pair = 1;
            3: U16, "SI_BLOCK_HEATING_STATE", min = 0, max = 7;
            4: U16, "SI_WINDOW_HEATING_STATE", min = 0, max = 7;
            5: U16, "SI_BLOCK_TEMPERATURE_STATUS", min = 0, max = 85;
            6: U16, "SI_AMBIENT_TEMPERATURE_STATUS", min = 0, max = 85;
            7: U16, "SI_LASER_TEMPERATURE_STATUS", min = 0, max = 85;
            8: U16, "SI_TILT_ANGLE_STATUS", min = 0, max = 85;
            9: U16, "SI_SNOW_HEIGHT_STATUS", min = 0, max = 85;
            10: U16, "SI_DISTANCE_STATUS", min = 0, max = 85;
            11: U16, "SI_NORMALIZED_SIGNAL_STATUS", min = 0, max = 85;
            12: U16, "SI_RESERVED_12";
            13: U16, "SI_RESERVED_13";
            14: U16, "SI_ERROR_CODE", min = 0, max = 83;
            15: U16, "SI_ERROR_CODE_CURRENT", min = 0, max = 83;
            16: U32Lo, "SI_OPERATING_TIME_LO", pair = 17;
            17: U32Hi, "SI_OPERATING_TIME_HI", pair = 16;
            18: U32Lo, "SI_SYSTEM_TIME_LO", pair = 19;
            19: U32Hi, "SI_SYSTEM_TIME_HI", pair = 18;
            // 20..=29: standard data set, metric
            20: I16, "SDM_SNOW_HEIGHT_MM", min = -16000, max = 16000;
            21: I16, "SDM_BLOCK_TEMPERATURE_C", scale = 10.0, min = -400, max = 1000;
            22: I16, "SDM_AMBIENT_TEMPERATURE_C", scale = 10.0, min = -500, max = 1000;
            23: I16, "SDM_LASER_TEMPERATURE_C", scale = 10.0, min = -600, max = 800;
            24: U16, "SDM_NORMALIZED_SIGNAL", min = 0, max = 255;
            25: I16, "SDM_TILT_ANGLE_DEG", scale = 10.0, min = -1800, max = 1800;
            26: U16, "SDM_ERROR_CODE", min = 0, max = 255;
            27: U16, "SDM_RESERVED_27";
            28: U16, "SDM_RESERVED_28";
            29: U16, "SDM_RESERVED_29";
            // 30..=39: standard data set, imperial
            30: I16, "SDI_SNOW_HEIGHT_IN", scale = 20.0, min = -12598, max = 12598;
            31: I16, "SDI_BLOCK_TEMPERATURE_F", scale = 10.0, min = -400, max = 2120;
            32: I16, "SDI_AMBIENT_TEMPERATURE_F", scale = 10.0, min = -580, max = 2120;
            33: I16, "SDI_LASER_TEMPERATURE_F", scale = 10.0, min = -760, max = 1760;
            34: U16, "SDI_NORMALIZED_SIGNAL", min = 0, max = 255;
            35: I16, "SDI_TILT_ANGLE_DEG", scale = 10.0, min = -1800, max = 1800;
            36: U16, "SDI_ERROR_CODE", min = 0, max = 255;
            37: U16, "SDI_RESERVED_37";
            38: U16, "SDI_RESERVED_38";
            39: U16, "SDI_RESERVED_39";
            // 40..=54: distances
            40: I16, "D_SNOW_HEIGHT_MM", min = -16000, max = 16000;
            41: I16, "D_SNOW_HEIGHT_MM_MIN", min = -16000, max = 16000;
            42: I16, "D_SNOW_HEIGHT_MM_MAX", min = -16000, max = 16000;
            43: I16, "D_SNOW_HEIGHT_MM_AVG", min = -16000, max = 16000;
            44: I16, "D_CALIBRATED_MM", min = -500, max = 21000;
            45: I16, "D_RAW_MM", min = -500, max = 21000;
            46: I16, "D_SNOW_HEIGHT_IN", scale = 20.0, min = -12598, max = 12598;
            47: I16, "D_SNOW_HEIGHT_IN_MIN", scale = 20.0, min = -12598, max = 12598;
            48: I16, "D_SNOW_HEIGHT_IN_MAX", scale = 20.0, min = -12598, max = 12598;
            49: I16, "D_SNOW_HEIGHT_IN_AVG", scale = 20.0, min = -12598, max = 12598;
            50: I16, "D_CALIBRATED_IN", scale = 20.0, min = -394, max = 16536;
            51: I16, "D_RAW_IN", scale = 20.0, min = -394, max = 16536;
            52: I16, "D_REFERENCE_HEIGHT_MM", min = 0, max = 16000;
            53: U16, "D_SNOW_HEIGHT_MM_HIRES", scale = 10.0, min = 0, max = 64000;
            54: U16, "D_RESERVED_54";
            // 55..=69: temperatures, metric
            55: I16, "TM_BLOCK_TEMPERATURE_C", scale = 10.0, min = -400, max = 1000;
            56: I16, "TM_BLOCK_TEMPERATURE_C_MIN", scale = 10.0, min = -400, max = 1000;
            57: I16, "TM_BLOCK_TEMPERATURE_C_MAX", scale = 10.0, min = -400, max = 1000;
            58: I16, "TM_BLOCK_TEMPERATURE_C_AVG", scale = 10.0, min = -400, max = 1000;
            59: I16, "TM_AMBIENT_TEMPERATURE_C", scale = 10.0, min = -500, max = 1000;
            60: I16, "TM_AMBIENT_TEMPERATURE_C_MIN", scale = 10.0, min = -500, max = 1000;
            61: I16, "TM_AMBIENT_TEMPERATURE_C_MAX", scale = 10.0, min = -500, max = 1000;
            62: I16, "TM_AMBIENT_TEMPERATURE_C_AVG", scale = 10.0, min = -500, max = 1000;
            63: I16, "TM_LASER_TEMPERATURE_C", scale = 10.0, min = -600, max = 800;
            64: I16, "TM_LASER_TEMPERATURE_C_MIN", scale = 10.0, min = -600, max = 800;
            65: I16, "TM_LASER_TEMPERATURE_C_MAX", scale = 10.0, min = -600, max = 800;
            66: I16, "TM_LASER_TEMPERATURE_C_AVG", scale = 10.0, min = -600, max = 800;
            67: U16, "TM_RESERVED_67";
            68: U16, "TM_RESERVED_68";
            69: U16, "TM_RESERVED_69";
            // 70..=84: temperatures, imperial
            70: I16, "TI_BLOCK_TEMPERATURE_F", scale = 10.0, min = -400, max = 2120;
            71: I16, "TI_BLOCK_TEMPERATURE_F_MIN", scale = 10.0, min = -400, max = 2120;
            72: I16, "TI_BLOCK_TEMPERATURE_F_MAX", scale = 10.0, min = -400, max = 2120;
            73: I16, "TI_BLOCK_TEMPERATURE_F_AVG", scale = 10.0, min = -400, max = 2120;
            74: I16, "TI_AMBIENT_TEMPERATURE_F", scale = 10.0, min = -580, max = 2120;
            75: I16, "TI_AMBIENT_TEMPERATURE_F_MIN", scale = 10.0, min = -580, max = 2120;
            76: I16, "TI_AMBIENT_TEMPERATURE_F_MAX", scale = 10.0, min = -580, max = 2120;
            77: I16, "TI_AMBIENT_TEMPERATURE_F_AVG", scale = 10.0, min = -580, max = 2120;
            78: I16, "TI_LASER_TEMPERATURE_F", scale = 10.0, min = -760, max = 1760;
            79: I16, "TI_LASER_TEMPERATURE_F_MIN", scale = 10.0, min = -760, max = 1760;
            80: I16, "TI_LASER_TEMPERATURE_F_MAX", scale = 10.0, min = -760, max = 1760;
            81: I16, "TI_LASER_TEMPERATURE_F_AVG", scale = 10.0, min = -760, max = 1760;
            82: U16, "TI_RESERVED_82";
            83: U16, "TI_RESERVED_83";
            84: U16, "TI_RESERVED_84";
            // 85..=94: angles
            85: I16, "A_TILT_ANGLE_DEG", scale = 10.0, min = -1800, max = 1800;
            86: I16, "A_TILT_ANGLE_DEG_MIN", scale = 10.0, min = -1800, max = 1800;
            87: I16, "A_TILT_ANGLE_DEG_MAX", scale = 10.0, min = -1800, max = 1800;
            88: I16, "A_TILT_ANGLE_DEG_AVG", scale = 10.0, min = -1800, max = 1800;
            89: I16, "A_ANGLE_X_DEG", scale = 10.0, min = -1800, max = 1800;
            90: I16, "A_ANGLE_Y_DEG", scale = 10.0, min = -1800, max = 1800;
            91: I16, "A_ANGLE_Z_DEG", scale = 10.0, min = -1800, max = 1800;
            92: I16, "A_TILT_ANGLE_REFERENCE_DEG", scale = 10.0, min = -1800, max = 1800;
            93: U16, "A_RESERVED_93";
            94: U16, "A_RESERVED_94";
            // 95..=104: logic and normalized values
            95: U16, "LNV_SNOW_FLAG", min = 0, max = 1;
            96: U16, "LNV_RESERVED_96";
            97: U16, "LNV_NORMALIZED_SIGNAL", min = 0, max = 255;
            98: U16, "LNV_NORMALIZED_SIGNAL_MIN", min = 0, max = 255;
            99: U16, "LNV_NORMALIZED_SIGNAL_MAX", min = 0, max = 255;
            100: U16, "LNV_NORMALIZED_SIGNAL_AVG", min = 0, max = 255;
            101: U16, "LNV_RESERVED_101";
            102: U16, "LNV_RESERVED_102";
            103: U16, "LNV_RESERVED_103";
            104: U16, "LNV_RESERVED_104";
            // 105..=119: service channels
            105: U16, "SC_BLOCK_HEATING_STATE", min = 0, max = 7;
            106: I16, "SC_INTERNAL_TEMPERATURE_C_NTC", scale = 10.0, min = -400, max = 1000;
            107: U16, "SC_RESERVED_107";
            108: U16, "SC_BLOCK_HEATING_DEFROST_S";
            109: U16, "SC_WINDOW_HEATING_STATE", min = 0, max = 7;
            110: I16, "SC_EXTERNAL_TEMPERATURE_C_NTC", scale = 10.0, min = -500, max = 1000;
            111: U16, "SC_RESERVED_111";
            112: U16, "SC_WINDOW_HEATING_DEFROST_S";
            113: U16, "SC_LASER_GAIN_CODE", min = 0, max = 255;
            // the manual does not state a range for the intensity channel
            114: I16, "SC_LASER_SIGNAL_INTENSITY_UV", scale = 0.1, min = -32768, max = 32767;
            115: U16, "SC_LASER_DISTANCE_MM", min = 0, max = 32000;
            116: I16, "SC_LASER_TEMPERATURE_C", scale = 10.0, min = -600, max = 8000;
            117: I16, "SC_OPERATING_VOLTAGE_V", scale = 10.0, min = -400, max = 400;
            118: U16, "SC_RESERVED_118";
            119: U16, "SC_RESERVED_119";
        }
    };
}

macro_rules! scale_or_unscaled {
    () => {
        0.0
    };
    ($value: literal) => {
        $value
    };
}

macro_rules! min_or_default {
    () => {
        0
    };
    ($value: literal) => {
        $value
    };
}

macro_rules! max_or_default {
    () => {
        65535
    };
    ($value: literal) => {
        $value
    };
}

macro_rules! pair_or_none {
    () => {
        None
    };
    ($value: literal) => {
        Some($value)
    };
}

macro_rules! make_lists {
    ($($address: literal: $kind: ident, $name: literal
        $(, scale = $scale: literal)?
        $(, min = $min: literal)?
        $(, max = $max: literal)?
        $(, pair = $pair: literal)?;)+) => {
        pub static ADDRESSES: [u16; REGISTER_COUNT] = [$($address),+];
        pub static NAMES: [&str; REGISTER_COUNT] = [$($name),+];
        pub static KINDS: [ValueKind; REGISTER_COUNT] = [$(ValueKind::$kind),+];
        pub static SCALES: [f64; REGISTER_COUNT] = [$(scale_or_unscaled!($($scale)?)),+];
        pub static MINIMUM_VALUES: [i32; REGISTER_COUNT] = [$(min_or_default!($($min)?)),+];
        pub static MAXIMUM_VALUES: [i32; REGISTER_COUNT] = [$(max_or_default!($($max)?)),+];
        pub static PAIRED_ADDRESSES: [Option<u16>; REGISTER_COUNT] = [$(pair_or_none!($($pair)?)),+];
    };
}

for_each_register!(make_lists);

pub static DESCRIPTIONS: [&str; REGISTER_COUNT] = const {
    let mut result = [""; REGISTER_COUNT];
    let mut index = 0;
    while index < result.len() {
        result[index] = match index as u16 {
            0 => "Device identification; device subtype in the high byte, software version in the low byte",
            1 => "Device status word, lower 16 bits",
            2 => "Device status word, upper 16 bits",
            3 | 105 => "State of the block heating; value is a heating state code",
            4 | 109 => "State of the window heating; value is a heating state code",
            5 => "Measurement status of the block temperature channel",
            6 => "Measurement status of the ambient temperature channel",
            7 => "Measurement status of the laser temperature channel",
            8 => "Measurement status of the tilt angle channel",
            9 => "Measurement status of the snow height channel",
            10 => "Measurement status of the distance channel",
            11 => "Measurement status of the normalized signal channel",
            14 => "Device error code reported by the evaluation routine",
            15 => "Device error code of the measurement currently in progress",
            16 => "Accumulated operating time in seconds, lower 16 bits",
            17 => "Accumulated operating time in seconds, upper 16 bits",
            18 => "Sensor system time in seconds, lower 16 bits",
            19 => "Sensor system time in seconds, upper 16 bits",
            20 | 40 => "Snow height in millimeters",
            21 | 55 => "Block temperature in °C",
            22 | 59 => "Ambient temperature in °C",
            23 | 63 | 116 => "Laser temperature in °C",
            24 | 34 | 97 => "Normalized signal strength",
            25 | 35 | 85 => "Tilt angle in degrees",
            26 => "Device error code mirrored into the metric data set",
            30 | 46 => "Snow height in inches",
            31 | 70 => "Block temperature in °F",
            32 | 74 => "Ambient temperature in °F",
            33 | 78 => "Laser temperature in °F",
            36 => "Device error code mirrored into the imperial data set",
            41 => "Lowest snow height in millimeters within the averaging interval",
            42 => "Highest snow height in millimeters within the averaging interval",
            43 => "Average snow height in millimeters over the averaging interval",
            44 => "Calibrated distance in millimeters",
            45 => "Raw distance in millimeters",
            47 => "Lowest snow height in inches within the averaging interval",
            48 => "Highest snow height in inches within the averaging interval",
            49 => "Average snow height in inches over the averaging interval",
            50 => "Calibrated distance in inches",
            51 => "Raw distance in inches",
            52 => "Configured reference height in millimeters",
            53 => "High-resolution snow height in millimeters",
            56 => "Lowest block temperature in °C within the averaging interval",
            57 => "Highest block temperature in °C within the averaging interval",
            58 => "Average block temperature in °C over the averaging interval",
            60 => "Lowest ambient temperature in °C within the averaging interval",
            61 => "Highest ambient temperature in °C within the averaging interval",
            62 => "Average ambient temperature in °C over the averaging interval",
            64 => "Lowest laser temperature in °C within the averaging interval",
            65 => "Highest laser temperature in °C within the averaging interval",
            66 => "Average laser temperature in °C over the averaging interval",
            71 => "Lowest block temperature in °F within the averaging interval",
            72 => "Highest block temperature in °F within the averaging interval",
            73 => "Average block temperature in °F over the averaging interval",
            75 => "Lowest ambient temperature in °F within the averaging interval",
            76 => "Highest ambient temperature in °F within the averaging interval",
            77 => "Average ambient temperature in °F over the averaging interval",
            79 => "Lowest laser temperature in °F within the averaging interval",
            80 => "Highest laser temperature in °F within the averaging interval",
            81 => "Average laser temperature in °F over the averaging interval",
            86 => "Smallest tilt angle in degrees within the averaging interval",
            87 => "Largest tilt angle in degrees within the averaging interval",
            88 => "Average tilt angle in degrees over the averaging interval",
            89 => "Angle of the X axis in degrees",
            90 => "Angle of the Y axis in degrees",
            91 => "Angle of the Z axis in degrees",
            92 => "Configured tilt angle reference in degrees",
            95 => "Snow flag; 1 while a snow cover is detected",
            98 => "Lowest normalized signal strength within the averaging interval",
            99 => "Highest normalized signal strength within the averaging interval",
            100 => "Average normalized signal strength over the averaging interval",
            106 => "Internal temperature in °C from the NTC sensor",
            108 => "Accumulated block heating defrost time in seconds",
            110 => "External temperature in °C from the NTC sensor",
            112 => "Accumulated window heating defrost time in seconds",
            113 => "Laser gain code",
            114 => "Laser signal intensity in microvolts",
            115 => "Laser distance in millimeters",
            117 => "Supply voltage in volts",
            12 | 13 | 27..=29 | 37..=39 | 54 | 67..=69 | 82..=84 | 93 | 94 | 96 | 101..=104
            | 107 | 111 | 118 | 119 => "Reserved",
            _ => panic!("every register needs a description"),
        };
        index += 1;
    }
    result
};

const _ASSERT_ROWS_ARE_DENSE: () = {
    let mut index = 0;
    while index < REGISTER_COUNT {
        assert!(
            ADDRESSES[index] == index as u16,
            "register rows must appear exactly once, in address order"
        );
        index += 1;
    }
};

const _ASSERT_BANKS_TILE_THE_MAP: () = {
    let mut expected_start = 0u16;
    let mut index = 0;
    while index < RegisterBank::ALL.len() {
        let (start, end) = RegisterBank::ALL[index].bounds();
        assert!(
            start == expected_start,
            "register banks must tile the address space without gaps or overlap"
        );
        assert!(start <= end);
        expected_start = end + 1;
        index += 1;
    }
    assert!(expected_start as usize == REGISTER_COUNT);
};

const _ASSERT_RANGES_MATCH_KINDS: () = {
    let mut index = 0;
    while index < REGISTER_COUNT {
        let min = MINIMUM_VALUES[index];
        let max = MAXIMUM_VALUES[index];
        assert!(min <= max);
        if KINDS[index].is_signed() {
            assert!(
                min >= i16::MIN as i32 && max <= i16::MAX as i32,
                "signed registers must declare a range inside the i16 domain"
            );
        } else {
            assert!(
                min >= 0 && max <= u16::MAX as i32,
                "unsigned registers must declare a range inside the u16 domain"
            );
        }
        index += 1;
    }
};

const _ASSERT_SPLIT_PAIRS_ARE_COHERENT: () = {
    let mut index = 0;
    while index < REGISTER_COUNT {
        let address = index as u16;
        match PAIRED_ADDRESSES[index] {
            None => assert!(
                !KINDS[index].is_split(),
                "split halves must name their partner register"
            ),
            Some(partner) => {
                assert!(
                    KINDS[index].is_split(),
                    "only split halves may name a partner register"
                );
                assert!(
                    partner == address + 1 || address == partner + 1,
                    "split halves must be adjacent"
                );
                assert!(SCALES[index] == 0.0, "split halves are never scaled");
                match PAIRED_ADDRESSES[partner as usize] {
                    Some(back) => {
                        assert!(back == address, "split partners must reference each other")
                    }
                    None => panic!("split partners must reference each other"),
                }
                assert!(
                    matches!(
                        (KINDS[index], KINDS[partner as usize]),
                        (ValueKind::U32Lo, ValueKind::U32Hi) | (ValueKind::U32Hi, ValueKind::U32Lo)
                    ),
                    "a split pair must consist of one lower and one upper half"
                );
                let mut bank_index = 0;
                while bank_index < RegisterBank::ALL.len() {
                    let (start, end) = RegisterBank::ALL[bank_index].bounds();
                    let address_inside = address >= start && address <= end;
                    let partner_inside = partner >= start && partner <= end;
                    assert!(
                        address_inside == partner_inside,
                        "a split pair must not straddle a band boundary"
                    );
                    bank_index += 1;
                }
            }
        }
        index += 1;
    }
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banks_tile_the_address_space() {
        let mut expected = 0u16;
        for bank in RegisterBank::ALL {
            let (start, end) = bank.bounds();
            assert_eq!(start, expected);
            assert!(end >= start);
            expected = end + 1;
        }
        assert_eq!(expected as usize, REGISTER_COUNT);
        assert!(RegisterAddress::from_raw(ADDRESS_MAX).is_some());
        assert!(RegisterAddress::from_raw(ADDRESS_MAX + 1).is_none());
    }

    #[test]
    fn every_address_belongs_to_exactly_one_bank() {
        for raw in 0..REGISTER_COUNT as u16 {
            let address = RegisterAddress::from_raw(raw).unwrap();
            let bank = address.bank();
            let (start, end) = bank.bounds();
            assert!(raw >= start && raw <= end, "{raw} outside {bank}");
            let holders = RegisterBank::ALL
                .iter()
                .filter(|candidate| {
                    let (start, end) = candidate.bounds();
                    raw >= start && raw <= end
                })
                .count();
            assert_eq!(holders, 1);
        }
    }

    #[test]
    fn bank_codes_parse_by_start_address() {
        assert_eq!(
            RegisterBank::from_raw(95),
            Some(RegisterBank::LogicAndNormalizedValues)
        );
        assert_eq!(RegisterBank::from_raw(90), None);
        for bank in RegisterBank::ALL {
            assert_eq!(RegisterBank::from_raw(bank.start_address()), Some(bank));
        }
    }

    #[test]
    fn block_temperature_decodes_in_tenths() {
        let address = RegisterAddress::from_raw(21).unwrap();
        assert_eq!(address.name(), "SDM_BLOCK_TEMPERATURE_C");
        assert_eq!(address.scale(), 10.0);
        let value = address.decode(215);
        assert_eq!(value.raw, 215);
        assert_eq!(value.adjusted, 21.5);
    }

    #[test]
    fn unsigned_registers_reinterpret_the_word() {
        let address = RegisterAddress::from_raw(0).unwrap();
        assert_eq!(address.decode(-1).adjusted, 65535.0);
        let scaled = RegisterAddress::from_raw(53).unwrap();
        assert_eq!(scaled.decode(-1).adjusted, 6553.5);
    }

    #[test]
    fn out_of_range_readings_pass_through() {
        let address = RegisterAddress::from_raw(95).unwrap();
        assert_eq!(address.maximum(), 1);
        assert_eq!(address.decode(7).adjusted, 7.0);
    }

    #[test]
    fn split_pairs_combine_into_a_u32() {
        let lower = RegisterAddress::from_raw(18).unwrap();
        let upper = RegisterAddress::from_raw(19).unwrap();
        assert_eq!(lower.paired_with(), Some(upper));
        assert_eq!(upper.paired_with(), Some(lower));
        let lo = 0x5678u16 as i16;
        let hi = 0x1234u16 as i16;
        assert_eq!(combine_u32(lo, hi), 0x1234_5678);
        assert_eq!(lower.decode_pair(lo, hi).adjusted, f64::from(0x1234_5678u32));
        assert_eq!(upper.decode_pair(hi, lo).adjusted, f64::from(0x1234_5678u32));
    }

    #[test]
    fn decode_pair_on_a_plain_register_decodes_normally() {
        let address = RegisterAddress::from_raw(21).unwrap();
        assert_eq!(address.decode_pair(215, 9999), address.decode(215));
    }

    #[test]
    fn encode_scale_rejects_values_outside_the_wire_domain() {
        assert!(encode_scale(4000.0, 10.0).is_err());
        assert!(encode_scale(-3300.0, 10.0).is_err());
        assert!(encode_scale(32768.0, 0.0).is_err());
        assert!(encode_scale(3276.8, 10.0).is_err());
        assert_eq!(encode_scale(21.5, 10.0).unwrap(), 215);
        assert_eq!(encode_scale(-40.0, 10.0).unwrap(), -400);
        assert_eq!(encode_scale(3276.7, 10.0).unwrap(), 32767);
        assert_eq!(encode_scale(42.0, 0.0).unwrap(), 42);
    }

    #[test]
    fn round_trip_through_the_codec_is_stable() {
        let address = RegisterAddress::from_raw(21).unwrap();
        for raw in [-400i16, -1, 0, 215, 1000] {
            let decoded = address.decode(raw);
            assert_eq!(address.encode(decoded.adjusted).unwrap(), raw);
        }
    }

    #[test]
    fn names_resolve_back_to_addresses() {
        let address = RegisterAddress::from_name("sdm_block_temperature_c").unwrap();
        assert_eq!(address.raw(), 21);
        let split = RegisterAddress::from_name("SI_DEVICE_STATUS_LO").unwrap();
        assert_eq!(split.raw(), 1);
        assert!(RegisterAddress::from_name("NO_SUCH_REGISTER").is_none());
    }

    #[test]
    fn reserved_rows_read_like_any_other() {
        let address = RegisterAddress::from_raw(54).unwrap();
        assert_eq!(address.kind(), ValueKind::U16);
        assert_eq!(address.bank(), RegisterBank::Distance);
        assert_eq!(address.decode(7).adjusted, 7.0);
        assert_eq!(address.description(), "Reserved");
    }
}
