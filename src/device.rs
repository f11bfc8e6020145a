use tracing::{debug, warn};

use crate::actions::{ActionKind, APPLY_CODE, SensorAction};
use crate::connection::{Error, MAX_SAFE_READ_COUNT, ModbusTransport};
use crate::registers::{DecodedValue, REGISTER_COUNT, RegisterAddress, RegisterBank};

/// Settable action values at or above this cannot be encoded on the wire.
pub const SETTABLE_VALUE_LIMIT: u16 = i16::MAX as u16;

/// Register-level interface to a single sensor behind a modbus link.
///
/// The sensor is half duplex, so all operations take `&mut self` and issue
/// their requests one after another.
pub struct Shm31Device<T> {
    link: T,
    device_id: u8,
}

impl<T: ModbusTransport> Shm31Device<T> {
    pub fn new(link: T, device_id: u8) -> Self {
        Self { link, device_id }
    }

    /// Read every register of `bank` with a single request.
    pub async fn read_bank(
        &mut self,
        bank: RegisterBank,
    ) -> Result<Vec<(RegisterAddress, DecodedValue)>, Error> {
        self.read_span(bank.start_address(), bank.register_count()).await
    }

    /// Read the entire register map with a single request.
    pub async fn read_all(&mut self) -> Result<Vec<(RegisterAddress, DecodedValue)>, Error> {
        self.read_span(0, REGISTER_COUNT as u16).await
    }

    async fn read_span(
        &mut self,
        start: u16,
        count: u16,
    ) -> Result<Vec<(RegisterAddress, DecodedValue)>, Error> {
        debug_assert!(
            count <= MAX_SAFE_READ_COUNT,
            "read ranges of > 123 registers aren't universally supported"
        );
        let words = self.link.read_registers(self.device_id, start, count).await?;
        Ok(decode_span(start, &words))
    }

    /// Read one register. Split halves are requested together with their
    /// partner word so the combined value can be decoded.
    pub async fn read_register(
        &mut self,
        address: RegisterAddress,
    ) -> Result<DecodedValue, Error> {
        let Some(partner) = address.paired_with() else {
            let words = self.link.read_registers(self.device_id, address.raw(), 1).await?;
            return Ok(address.decode(words[0]));
        };
        let start = address.raw().min(partner.raw());
        let words = self.link.read_registers(self.device_id, start, 2).await?;
        let own = words[(address.raw() - start) as usize];
        let other = words[(partner.raw() - start) as usize];
        Ok(address.decode_pair(own, other))
    }

    /// Fire an action that carries no payload.
    ///
    /// Returns `false` without touching the device if the action wants a
    /// value instead; use [`Self::perform_with_value`] for those.
    pub async fn perform(&mut self, action: SensorAction) -> Result<bool, Error> {
        if action.kind() != ActionKind::ApplyOnly {
            debug!(message = "action requires a value", %action);
            return Ok(false);
        }
        self.link
            .write_register(self.device_id, action.register_address(), APPLY_CODE)
            .await
    }

    /// Write the value of a settable action.
    ///
    /// Returns `false` without touching the device if the action takes no
    /// value, or if `value` cannot be represented in a register. When the
    /// device rejects the write or the request fails, a reboot is initiated
    /// to bring the sensor back to a known state, and the outcome of that
    /// reboot is returned.
    pub async fn perform_with_value(
        &mut self,
        action: SensorAction,
        value: u16,
    ) -> Result<bool, Error> {
        if !action.takes_value() {
            debug!(message = "action does not take a value", %action);
            return Ok(false);
        }
        if value >= SETTABLE_VALUE_LIMIT {
            debug!(message = "value does not fit the action register", %action, value);
            return Ok(false);
        }
        let written = self
            .link
            .write_register(self.device_id, action.register_address(), value as i16)
            .await;
        match written {
            Ok(true) => Ok(true),
            Ok(false) => {
                warn!(message = "set was rejected, rebooting the sensor", %action, value);
                self.perform(SensorAction::InitiateReboot).await
            }
            Err(e) => {
                warn!(
                    message = "set failed, rebooting the sensor",
                    %action,
                    value,
                    error = (&e as &dyn std::error::Error)
                );
                self.perform(SensorAction::InitiateReboot).await
            }
        }
    }
}

fn decode_span(start: u16, words: &[i16]) -> Vec<(RegisterAddress, DecodedValue)> {
    (start..)
        .map_while(RegisterAddress::from_raw)
        .zip(words)
        .map(|(address, &word)| {
            let value = match address.paired_with() {
                Some(partner)
                    if partner.raw() >= start
                        && usize::from(partner.raw() - start) < words.len() =>
                {
                    address.decode_pair(word, words[usize::from(partner.raw() - start)])
                }
                _ => address.decode(word),
            };
            (address, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct ScriptedLink {
        reads: Vec<(u8, u16, u16)>,
        writes: Vec<(u8, u16, i16)>,
        read_results: VecDeque<Result<Vec<i16>, Error>>,
        write_results: VecDeque<Result<bool, Error>>,
    }

    #[async_trait]
    impl ModbusTransport for ScriptedLink {
        async fn read_registers(
            &mut self,
            device_id: u8,
            start: u16,
            count: u16,
        ) -> Result<Vec<i16>, Error> {
            self.reads.push((device_id, start, count));
            self.read_results.pop_front().expect("unexpected read")
        }

        async fn write_register(
            &mut self,
            device_id: u8,
            address: u16,
            value: i16,
        ) -> Result<bool, Error> {
            self.writes.push((device_id, address, value));
            self.write_results.pop_front().expect("unexpected write")
        }
    }

    fn make_device(link: ScriptedLink) -> Shm31Device<ScriptedLink> {
        Shm31Device::new(link, 1)
    }

    #[tokio::test]
    async fn a_bank_is_read_with_one_request() {
        let mut link = ScriptedLink::default();
        let mut words = vec![0i16; 15];
        words[0] = 780;
        words[6] = 100;
        link.read_results.push_back(Ok(words));
        let mut device = make_device(link);
        let readings = device.read_bank(RegisterBank::Distance).await.unwrap();
        assert_eq!(device.link.reads, vec![(1, 40, 15)]);
        assert_eq!(readings.len(), 15);
        assert_eq!(readings[0].0.raw(), 40);
        assert_eq!(readings[0].1.adjusted, 780.0);
        assert_eq!(readings[6].0.raw(), 46);
        assert_eq!(readings[6].1.adjusted, 5.0);
    }

    #[tokio::test]
    async fn split_halves_resolve_within_the_bank() {
        let mut link = ScriptedLink::default();
        let mut words = vec![0i16; 20];
        words[16] = 0x5678;
        words[17] = 0x1234;
        link.read_results.push_back(Ok(words));
        let mut device = make_device(link);
        let readings = device.read_bank(RegisterBank::StatusInformation).await.unwrap();
        assert_eq!(device.link.reads, vec![(1, 0, 20)]);
        assert_eq!(readings[16].1.adjusted, f64::from(0x1234_5678u32));
        assert_eq!(readings[17].1.adjusted, f64::from(0x1234_5678u32));
    }

    #[tokio::test]
    async fn the_whole_map_is_read_in_one_request() {
        let mut link = ScriptedLink::default();
        link.read_results.push_back(Ok(vec![0i16; 120]));
        let mut device = make_device(link);
        let readings = device.read_all().await.unwrap();
        assert_eq!(device.link.reads, vec![(1, 0, 120)]);
        assert_eq!(readings.len(), 120);
        assert_eq!(readings[119].0.raw(), 119);
    }

    #[tokio::test]
    async fn plain_registers_read_a_single_word() {
        let mut link = ScriptedLink::default();
        link.read_results.push_back(Ok(vec![215]));
        let mut device = make_device(link);
        let address = RegisterAddress::from_raw(21).unwrap();
        let value = device.read_register(address).await.unwrap();
        assert_eq!(device.link.reads, vec![(1, 21, 1)]);
        assert_eq!(value.adjusted, 21.5);
    }

    #[tokio::test]
    async fn split_registers_read_both_halves() {
        let mut link = ScriptedLink::default();
        link.read_results.push_back(Ok(vec![0x5678, 0x1234]));
        link.read_results.push_back(Ok(vec![0x5678, 0x1234]));
        let mut device = make_device(link);
        let lower = RegisterAddress::from_raw(18).unwrap();
        let upper = RegisterAddress::from_raw(19).unwrap();
        let from_lower = device.read_register(lower).await.unwrap();
        let from_upper = device.read_register(upper).await.unwrap();
        assert_eq!(device.link.reads, vec![(1, 18, 2), (1, 18, 2)]);
        assert_eq!(from_lower.adjusted, f64::from(0x1234_5678u32));
        assert_eq!(from_upper.adjusted, f64::from(0x1234_5678u32));
    }

    #[tokio::test]
    async fn apply_only_actions_write_the_apply_code() {
        let mut link = ScriptedLink::default();
        link.write_results.push_back(Ok(true));
        let mut device = make_device(link);
        let done = device.perform(SensorAction::StartDefrost).await.unwrap();
        assert!(done);
        assert_eq!(device.link.writes, vec![(1, 7, APPLY_CODE)]);
    }

    #[tokio::test]
    async fn performing_a_settable_action_without_a_value_does_nothing() {
        let mut device = make_device(ScriptedLink::default());
        let done = device.perform(SensorAction::SetTiltAngle).await.unwrap();
        assert!(!done);
        assert!(device.link.writes.is_empty());
    }

    #[tokio::test]
    async fn giving_a_value_to_an_apply_only_action_does_nothing() {
        let mut device = make_device(ScriptedLink::default());
        let done = device
            .perform_with_value(SensorAction::InitiateReboot, 5)
            .await
            .unwrap();
        assert!(!done);
        assert!(device.link.writes.is_empty());
    }

    #[tokio::test]
    async fn values_that_do_not_fit_a_register_are_rejected_up_front() {
        let mut device = make_device(ScriptedLink::default());
        for value in [32767u16, 40000, u16::MAX] {
            let done = device
                .perform_with_value(SensorAction::SetReferenceHeight, value)
                .await
                .unwrap();
            assert!(!done);
        }
        assert!(device.link.writes.is_empty());

        let mut link = ScriptedLink::default();
        link.write_results.push_back(Ok(true));
        let mut device = make_device(link);
        let done = device
            .perform_with_value(SensorAction::SetReferenceHeight, 32766)
            .await
            .unwrap();
        assert!(done);
        assert_eq!(device.link.writes, vec![(1, 13, 32766)]);
    }

    #[tokio::test]
    async fn a_rejected_set_falls_back_to_a_reboot() {
        let mut link = ScriptedLink::default();
        link.write_results.push_back(Ok(false));
        link.write_results.push_back(Ok(true));
        let mut device = make_device(link);
        let done = device
            .perform_with_value(SensorAction::SetReferenceHeight, 1200)
            .await
            .unwrap();
        assert!(done);
        assert_eq!(device.link.writes, vec![(1, 13, 1200), (1, 0, APPLY_CODE)]);
    }

    #[tokio::test]
    async fn a_transport_failure_also_falls_back_to_a_reboot() {
        let mut link = ScriptedLink::default();
        link.write_results.push_back(Err(Error::Timeout(Duration::from_millis(500))));
        link.write_results.push_back(Ok(true));
        let mut device = make_device(link);
        let done = device
            .perform_with_value(SensorAction::SetTiltAngle, 450)
            .await
            .unwrap();
        assert!(done);
        assert_eq!(device.link.writes, vec![(1, 14, 450), (1, 0, APPLY_CODE)]);
    }

    #[tokio::test]
    async fn the_reboot_fallback_is_not_retried() {
        let mut link = ScriptedLink::default();
        link.write_results.push_back(Ok(false));
        link.write_results.push_back(Ok(false));
        let mut device = make_device(link);
        let done = device
            .perform_with_value(SensorAction::SetLaserOperatingMode, 2)
            .await
            .unwrap();
        assert!(!done);
        assert_eq!(device.link.writes.len(), 2);
    }
}
