use std::collections::BTreeMap;

use crate::domain::utils::id::DeviceId;
use crate::error::{Error, Result};

/// Per-device policy weights. Only `w_local` is stored; `w_offload` is always
/// derived as `1 - w_local`, so the pair sums to one at every observation point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceWeight {
    w_local: f64,
}

impl DeviceWeight {
    pub fn new(w_local: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&w_local) {
            return Err(Error::InvalidConfiguration(format!("w_local must lie in [0, 1], got {}", w_local)));
        }
        Ok(Self { w_local })
    }

    pub fn w_local(&self) -> f64 {
        self.w_local
    }

    pub fn w_offload(&self) -> f64 {
        1.0 - self.w_local
    }

    /// Shifts `w_local` by `delta` and clamps it back into [0, 1].
    pub fn nudge(&mut self, delta: f64) {
        self.w_local = (self.w_local + delta).clamp(0.0, 1.0);
    }
}

/// Weight snapshot taken at the end of a round.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSnapshot {
    pub round: usize,
    pub time_s: f64,
    pub weights: BTreeMap<DeviceId, DeviceWeight>,
}

#[derive(Debug, Clone)]
pub struct DeviceWeights {
    weights: BTreeMap<DeviceId, DeviceWeight>,
    initial: DeviceWeight,
}

impl DeviceWeights {
    pub fn new(devices: &[DeviceId], initial: DeviceWeight) -> Self {
        Self { weights: devices.iter().map(|d| (d.clone(), initial)).collect(), initial }
    }

    pub fn get(&self, device: &DeviceId) -> DeviceWeight {
        self.weights.get(device).copied().unwrap_or(self.initial)
    }

    pub fn contains(&self, device: &DeviceId) -> bool {
        self.weights.contains_key(device)
    }

    pub fn get_or_insert(&mut self, device: &DeviceId) -> &mut DeviceWeight {
        self.weights.entry(device.clone()).or_insert(self.initial)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeviceId, &DeviceWeight)> {
        self.weights.iter()
    }

    pub fn snapshot(&self, round: usize, time_s: f64) -> WeightSnapshot {
        WeightSnapshot { round, time_s, weights: self.weights.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nudge_clamps_and_keeps_the_pair_summing_to_one() {
        let mut weight = DeviceWeight::new(0.98).unwrap();
        weight.nudge(0.05);
        assert_eq!(weight.w_local(), 1.0);
        assert_eq!(weight.w_offload(), 0.0);

        weight.nudge(-1.5);
        assert_eq!(weight.w_local(), 0.0);
        assert_eq!(weight.w_local() + weight.w_offload(), 1.0);
    }

    #[test]
    fn rejects_weights_outside_the_unit_interval() {
        assert!(DeviceWeight::new(-0.1).is_err());
        assert!(DeviceWeight::new(1.1).is_err());
        assert!(DeviceWeight::new(f64::NAN).is_err());
    }

    #[test]
    fn unknown_devices_start_from_the_initial_weight() {
        let initial = DeviceWeight::new(0.7).unwrap();
        let mut weights = DeviceWeights::new(&[DeviceId::new("dev_0")], initial);
        let late = DeviceId::new("dev_9");

        assert_eq!(weights.get(&late), initial);
        weights.get_or_insert(&late).nudge(0.1);
        assert_eq!(weights.len(), 2);
        assert!((weights.get(&late).w_local() - 0.8).abs() < 1e-12);
    }
}
