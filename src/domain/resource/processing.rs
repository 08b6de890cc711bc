use crate::domain::task::BYTES_PER_KB;

/// Cycle-count abstraction of compute cost and the matching energy model.
#[derive(Debug, Clone, Copy)]
pub struct ProcessingModel {
    pub cycles_per_byte: f64,
    pub energy_per_cycle_j: f64,
    pub transmit_power_w: f64,
}

impl ProcessingModel {
    pub fn cycles(&self, size_kb: f64) -> f64 {
        size_kb * BYTES_PER_KB * self.cycles_per_byte
    }

    /// Processing time in milliseconds on a processor clocked at `clock_hz`, together
    /// with the cycle count it was derived from.
    pub fn processing_time_ms(&self, size_kb: f64, clock_hz: f64) -> (f64, f64) {
        let cycles = self.cycles(size_kb);
        (cycles / clock_hz * 1000.0, cycles)
    }

    pub fn compute_energy_j(&self, cycles: f64) -> f64 {
        cycles * self.energy_per_cycle_j
    }

    pub fn transmit_energy_j(&self, transfer_time_s: f64) -> f64 {
        self.transmit_power_w * transfer_time_s
    }
}

/// Clock speeds of both compute tiers together with the shared cost model.
#[derive(Debug, Clone, Copy)]
pub struct ComputeProfile {
    pub model: ProcessingModel,
    pub device_cpu_hz: f64,
    pub fog_cpu_hz: f64,
}

impl ComputeProfile {
    pub fn local_processing_ms(&self, size_kb: f64) -> (f64, f64) {
        self.model.processing_time_ms(size_kb, self.device_cpu_hz)
    }

    pub fn remote_processing_ms(&self, size_kb: f64) -> (f64, f64) {
        self.model.processing_time_ms(size_kb, self.fog_cpu_hz)
    }
}
