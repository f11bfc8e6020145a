//! Maintenance and configuration actions exposed through the sensor's
//! writable action registers.
//!
//! The action register space is addressed separately from the measurement
//! register map. Each action occupies the holding register whose address
//! equals the action code. Actions without a payload fire when [`APPLY_CODE`]
//! is written to their register; settable actions take the value itself.

/// Magic word that triggers an action without a payload.
pub const APPLY_CODE: i16 = 12871;

/// How an action register expects to be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Fires when the apply code is written to the action register.
    ApplyOnly,
    /// Carries a value that is written to the action register directly.
    Settable,
}

/// Actions understood by the sensor, in action register order.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    num_derive::FromPrimitive,
    clap::ValueEnum,
    strum::Display,
)]
#[strum(serialize_all = "kebab-case")]
#[repr(u16)]
pub enum SensorAction {
    /// Reboot the sensor.
    InitiateReboot = 0,
    StartMeasurements = 1,
    StopMeasurements = 2,
    /// Turn the laser on permanently, e.g. for installation alignment.
    TurnLaserOn = 3,
    /// Put the laser back on its normal schedule after `turn-laser-on`.
    ResumeLaserSchedule = 4,
    /// Calibrate the height using the tilt angle from the gyroscope.
    CalibrateFull = 5,
    /// Calibrate the height using the reference angle, ignoring the gyroscope.
    CalibrateHeight = 6,
    StartDefrost = 7,
    StopDefrost = 8,
    SetBlockHeatingMode = 9,
    SetWindowHeatingMode = 10,
    /// Enable or disable external heating control.
    SetExternalHeatingMode = 11,
    /// Enable or disable the automatic defrost cycle after power on.
    SetDefrostAfterPowerOn = 12,
    /// Set the reference height, in millimeters.
    SetReferenceHeight = 13,
    /// Set the tilt angle, in degrees.
    SetTiltAngle = 14,
    /// Choose between the reference angle and the accelerometer.
    SetTiltAngleMode = 15,
    /// Set the time window for ignoring excessive snow height changes.
    SetSnowHeightChangeTime = 16,
    /// Set the largest accepted snow height change between two measurements.
    SetSnowHeightChangeMaxDiff = 17,
    SetLaserOperatingMode = 18,
    SetLaserMeasurementInterval = 19,
}

impl SensorAction {
    /// Address of the holding register backing this action.
    pub fn register_address(self) -> u16 {
        self as u16
    }

    pub fn kind(self) -> ActionKind {
        if (self as u16) < Self::SetBlockHeatingMode as u16 {
            ActionKind::ApplyOnly
        } else {
            ActionKind::Settable
        }
    }

    /// True for actions that are written with a value of their own.
    pub fn takes_value(self) -> bool {
        self.kind() == ActionKind::Settable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn every_action_register_has_an_action() {
        for code in 0u16..20 {
            let action = SensorAction::from_u16(code).unwrap();
            assert_eq!(action.register_address(), code);
        }
        assert_eq!(SensorAction::from_u16(20), None);
    }

    #[test]
    fn the_settable_range_starts_at_the_heating_modes() {
        for code in 0u16..20 {
            let action = SensorAction::from_u16(code).unwrap();
            let expected = if code < 9 {
                ActionKind::ApplyOnly
            } else {
                ActionKind::Settable
            };
            assert_eq!(action.kind(), expected, "{action}");
            assert_eq!(action.takes_value(), code >= 9);
        }
    }

    #[test]
    fn actions_render_as_command_line_values() {
        assert_eq!(
            SensorAction::SetReferenceHeight.to_string(),
            "set-reference-height"
        );
        assert_eq!(SensorAction::InitiateReboot.to_string(), "initiate-reboot");
    }
}
