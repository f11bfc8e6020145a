use num_traits::FromPrimitive;

use crate::registers::{DecodedValue, RegisterAddress};

/// Per-channel measurement status, as reported in the status information
/// band. The codes follow the UMB status vocabulary of the sensor family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, num_derive::FromPrimitive, strum::Display)]
#[strum(serialize_all = "title_case")]
#[repr(u16)]
pub enum StatusCode {
    Success = 0,
    UnknownCommand = 16,
    InvalidParameter = 17,
    InvalidChannel = 36,
    /// Initialization or calibration is still running.
    DeviceBusy = 40,
    /// Measurement variable (plus offset) is above the configured display range.
    DisplayRangeOffsetOverflow = 80,
    /// Measurement variable (plus offset) is below the configured display range.
    DisplayRangeOffsetUnderflow = 81,
    /// Physical value is above the measuring range (e.g. ADC over range).
    MeasurementRangeOverflow = 82,
    /// Physical value is below the measuring range.
    MeasurementRangeUnderflow = 83,
    /// Error in measurement data or no valid data available.
    MeasurementDataReadError = 84,
    /// Ambient conditions prevent a valid measurement.
    AmbientConditionsError = 85,
}

/// Diagnostic codes of the sensor, carried by the error code registers.
/// `0` means "no error" and has no variant here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, num_derive::FromPrimitive, strum::Display)]
#[strum(serialize_all = "title_case")]
#[repr(u16)]
pub enum DeviceErrorCode {
    /// Signal too weak; distance too short.
    LaserSignalTooWeak = 15,
    /// Signal too strong (mirror-like reflection).
    LaserSignalTooStrong = 16,
    LaserBackgroundLight = 17,
    /// Measurement disturbed by precipitation or movement.
    LaserMeasurementDisturbed = 18,
    /// Laser switched off after too many timeouts.
    LaserDisabledByTimeouts = 19,
    LaserCommandUnknown = 20,
    LaserInterfaceError = 21,
    LaserResponseInvalid = 22,
    /// Laser temperature below -15 °C.
    LaserTemperatureTooLow = 23,
    /// Laser temperature above +50 °C.
    LaserTemperatureTooHigh = 24,
    EepromChecksum = 31,
    LaserEepromChecksum = 32,
    /// APD supply failure (scattered light or hardware fault).
    LaserApdSupply = 51,
    /// Laser current too high; the laser is defective.
    LaserCurrentTooHigh = 52,
    DivisionByZero = 53,
    LaserHardware = 54,
    Hardware = 55,
    InterfaceHardware = 61,
    SerialParity = 62,
    SerialOverflow = 63,
    /// Framing error; the serial side is not configured as 8N1.
    SerialFraming = 64,
    /// Measurements in the calculation interval were ignored because they
    /// exceeded the permitted snow height change.
    EvaluationIgnoredMeasurements = 65,
    /// The last valid snow height was held because every measurement in the
    /// interval exceeded the permitted change.
    EvaluationHeldLastValue = 66,
    MeasurementCancelled = 67,
    /// No valid telegram available yet after a measurement start.
    TelegramNotAvailable = 68,
    SettingsReadFailed = 70,
    LaserDataReadFailed = 71,
    LaserTemperatureReadFailed = 72,
    BlockTemperatureReadFailed = 73,
    OutsideTemperatureReadFailed = 74,
    LaserDistanceReadFailed = 75,
    /// Accelerometer vector has an invalid length.
    GyroVectorLength = 76,
    /// Falling back to the reference angle; the measured angle is invalid.
    ReferenceAngleInvalid = 77,
    /// Signal calibration: high reference not above the low reference.
    SignalCalibrationDivision = 78,
    SignalTooSmall = 79,
    SignalTooLarge = 80,
    /// No angle correction applied; the angle exceeds 90 degrees.
    NoAngleCorrection = 81,
    ChannelAverageOverflow = 82,
    /// Ring buffer for the min/max/average channels could not be initialized.
    RingBufferInit = 83,
}

/// Reported state of the block and window heaters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, num_derive::FromPrimitive, strum::Display)]
#[repr(u16)]
pub enum HeatingModeState {
    #[strum(serialize = "off")]
    Off = 0,
    #[strum(serialize = "on (12 V supply)")]
    On12Volts = 1,
    #[strum(serialize = "on (24 V supply)")]
    On24Volts = 2,
    #[strum(serialize = "defrosting (12 V supply)")]
    Defrosting12Volts = 3,
    #[strum(serialize = "defrosting (24 V supply)")]
    Defrosting24Volts = 4,
    #[strum(serialize = "disabled")]
    Disabled = 5,
    #[strum(serialize = "voltage control error")]
    VoltageControlError = 6,
    #[strum(serialize = "unavailable")]
    Unavailable = 7,
}

/// Values accepted by the heating mode set actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, num_derive::FromPrimitive, strum::Display)]
#[strum(serialize_all = "title_case")]
#[repr(u16)]
pub enum HeatingMode {
    Off = 0,
    Automatic = 1,
    StartDefrosting = 2,
    StopDefrosting = 3,
}

/// Renders the meaning of code-valued registers for presentation. Plain
/// measurement registers and split halves have no interpretation.
pub fn interpret(address: RegisterAddress, raw: i16) -> Option<String> {
    let code = raw as u16;
    match address.raw() {
        0 => Some(format!(
            "subtype {}, software version {}",
            code >> 8,
            code & 0xff
        )),
        3 | 4 | 105 | 109 => Some(label_or_code::<HeatingModeState>(code)),
        5..=11 => Some(label_or_code::<StatusCode>(code)),
        14 | 15 | 26 | 36 => Some(device_error_label(code)),
        95 => Some(if code == 0 {
            "no snow".to_owned()
        } else {
            "snow cover detected".to_owned()
        }),
        _ => None,
    }
}

/// Renders the meaning of a decoded reading. On top of the code vocabularies
/// this turns the elapsed-seconds counters into friendly durations, which
/// needs the combined value rather than a single raw word.
pub fn interpret_reading(address: RegisterAddress, value: &DecodedValue) -> Option<String> {
    match address.raw() {
        16 | 18 | 108 | 112 => elapsed_label(value.adjusted),
        _ => interpret(address, value.raw),
    }
}

fn elapsed_label(seconds: f64) -> Option<String> {
    let span = jiff::Span::new().try_seconds(seconds as i64).ok()?;
    // Counters are not calendar quantities, so days are always 24 hours here.
    let round = jiff::SpanRound::new()
        .largest(jiff::Unit::Day)
        .relative(jiff::SpanRelativeTo::days_are_24_hours());
    Some(format!("{:#}", span.round(round).ok()?))
}

fn label_or_code<T: FromPrimitive + std::fmt::Display>(code: u16) -> String {
    match T::from_u16(code) {
        Some(known) => known.to_string(),
        None => format!("unrecognized code {code}"),
    }
}

fn device_error_label(code: u16) -> String {
    if code == 0 {
        return "no error".to_owned();
    }
    label_or_code::<DeviceErrorCode>(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{MAXIMUM_VALUES, MINIMUM_VALUES};

    #[test]
    fn codes_parse_from_raw_words() {
        assert_eq!(StatusCode::from_u16(0), Some(StatusCode::Success));
        assert_eq!(StatusCode::from_u16(16), Some(StatusCode::UnknownCommand));
        assert_eq!(
            StatusCode::from_u16(80),
            Some(StatusCode::DisplayRangeOffsetOverflow)
        );
        assert_eq!(
            StatusCode::from_u16(81),
            Some(StatusCode::DisplayRangeOffsetUnderflow)
        );
        assert_eq!(StatusCode::from_u16(86), None);
        assert_eq!(
            DeviceErrorCode::from_u16(83),
            Some(DeviceErrorCode::RingBufferInit)
        );
        assert_eq!(DeviceErrorCode::from_u16(0), None);
        assert_eq!(DeviceErrorCode::from_u16(84), None);
        assert_eq!(
            HeatingModeState::from_u16(7),
            Some(HeatingModeState::Unavailable)
        );
        assert_eq!(HeatingModeState::from_u16(8), None);
        assert_eq!(HeatingMode::from_u16(3), Some(HeatingMode::StopDefrosting));
        assert_eq!(HeatingMode::from_u16(4), None);
    }

    #[test]
    fn catalog_ranges_agree_with_the_vocabularies() {
        for address in [3u16, 4, 105, 109] {
            assert_eq!(MINIMUM_VALUES[address as usize], 0);
            assert_eq!(
                MAXIMUM_VALUES[address as usize],
                HeatingModeState::Unavailable as i32
            );
        }
        for address in 5u16..=11 {
            assert_eq!(
                MAXIMUM_VALUES[address as usize],
                StatusCode::AmbientConditionsError as i32
            );
        }
        for address in [14u16, 15] {
            assert_eq!(
                MAXIMUM_VALUES[address as usize],
                DeviceErrorCode::RingBufferInit as i32
            );
        }
    }

    #[test]
    fn elapsed_counters_render_as_durations() {
        let operating = RegisterAddress::from_raw(16).unwrap();
        let reading = DecodedValue { raw: 0x5b45, adjusted: 90061.0 };
        assert_eq!(
            interpret_reading(operating, &reading).as_deref(),
            Some("1d 1h 1m 1s")
        );
        let defrost = RegisterAddress::from_raw(108).unwrap();
        let reading = DecodedValue { raw: 3600, adjusted: 3600.0 };
        assert_eq!(
            interpret_reading(defrost, &reading).as_deref(),
            Some("1h")
        );
        let heating = RegisterAddress::from_raw(3).unwrap();
        let reading = DecodedValue { raw: 5, adjusted: 5.0 };
        assert_eq!(
            interpret_reading(heating, &reading).as_deref(),
            Some("disabled")
        );
    }

    #[test]
    fn interpretations_render_human_labels() {
        let heating = RegisterAddress::from_raw(3).unwrap();
        assert_eq!(interpret(heating, 1).as_deref(), Some("on (12 V supply)"));
        let status = RegisterAddress::from_raw(5).unwrap();
        assert_eq!(interpret(status, 0).as_deref(), Some("Success"));
        let error = RegisterAddress::from_raw(14).unwrap();
        assert_eq!(interpret(error, 0).as_deref(), Some("no error"));
        assert_eq!(
            interpret(error, 15).as_deref(),
            Some("Laser Signal Too Weak")
        );
        let snow_flag = RegisterAddress::from_raw(95).unwrap();
        assert_eq!(interpret(snow_flag, 1).as_deref(), Some("snow cover detected"));
        let ident = RegisterAddress::from_raw(0).unwrap();
        assert_eq!(
            interpret(ident, 0x0304).as_deref(),
            Some("subtype 3, software version 4")
        );
        let measurement = RegisterAddress::from_raw(20).unwrap();
        assert_eq!(interpret(measurement, 100), None);
        assert_eq!(
            interpret(status, 80).as_deref(),
            Some("Display Range Offset Overflow")
        );
        let unknown = RegisterAddress::from_raw(8).unwrap();
        assert_eq!(interpret(unknown, 91).as_deref(), Some("unrecognized code 91"));
    }
}
