use crate::domain::config::{DeadlineCheck, SimulationConfig};
use crate::domain::controller::device_weights::DeviceWeights;
use crate::domain::network::attachment::DeviceAttachments;
use crate::domain::network::network_model::NetworkModel;
use crate::domain::resource::processing::{ComputeProfile, ProcessingModel};
use crate::domain::resource::resource_pool::{DevicePool, FogPool};
use crate::domain::utils::id::{DeviceId, NodeId};
use crate::error::Result;

/// All mutable state of one simulation run.
///
/// Owned by the [`Simulator`](crate::domain::simulator::simulator::Simulator) and lent to
/// the decision policy and the weight controller for the duration of a call.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub network: NetworkModel,
    pub devices: DevicePool,
    pub fog: FogPool,
    pub weights: DeviceWeights,
    pub attachments: DeviceAttachments,
    pub compute: ComputeProfile,
    pub safety_factor: f64,
    pub deadline_check: DeadlineCheck,
}

impl SimulationState {
    pub fn new(config: &SimulationConfig, network: NetworkModel) -> Self {
        Self {
            network,
            devices: DevicePool::new(&config.device_ids),
            fog: FogPool::new(config.fog_workers),
            weights: DeviceWeights::new(&config.device_ids, config.initial_weight),
            attachments: DeviceAttachments::new(config.device_attachments.clone(), config.require_explicit_attachment),
            compute: ComputeProfile {
                model: ProcessingModel {
                    cycles_per_byte: config.cycles_per_byte,
                    energy_per_cycle_j: config.energy_per_cycle,
                    transmit_power_w: config.p_tx,
                },
                device_cpu_hz: config.device_cpu_hz,
                fog_cpu_hz: config.fog_cpu_hz,
            },
            safety_factor: config.safety_factor,
            deadline_check: config.deadline_check,
        }
    }

    /// Makes sure a device seen for the first time has a weight and an execution slot.
    pub fn register_device(&mut self, device: &DeviceId) {
        if !self.weights.contains(device) {
            log::warn!("Device {} is not configured, registering it with the initial weights.", device);
            self.weights.get_or_insert(device);
        }
        self.devices.register(device);
    }

    pub fn attachment_of(&mut self, device: &DeviceId) -> Result<NodeId> {
        self.attachments.resolve(device, self.network.topology())
    }
}
