use slotmap::new_key_type;

use crate::domain::simulator::time::snap_time;
use crate::domain::utils::id::{NodeId, TaskId};

new_key_type! {
    /// Key of a backbone link inside the topology's link store.
    pub struct LinkId;
}

/// A committed bandwidth allocation on a link or access link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkReservation {
    pub start_s: f64,
    pub finish_s: f64,
    pub bits: f64,
    pub task_id: TaskId,
}

impl LinkReservation {
    /// True if the reservation intersects the half-open window `[start_s, end_s)`.
    pub fn overlaps(&self, start_s: f64, end_s: f64) -> bool {
        self.start_s < end_s && self.finish_s > start_s
    }
}

/// Time-windowed bandwidth bookkeeping shared by backbone links and access links.
///
/// Reservations are pruned lazily: every capacity query first drops all entries whose
/// finish time is not after `now`.
#[derive(Debug, Clone)]
pub struct BandwidthSchedule {
    bandwidth_bps: f64,
    reservations: Vec<LinkReservation>,
    reserved_bits_total: f64,
    dropped_bits_total: f64,
    drop_count: u64,
}

impl BandwidthSchedule {
    pub fn new(bandwidth_bps: f64) -> Self {
        Self { bandwidth_bps, reservations: Vec::new(), reserved_bits_total: 0.0, dropped_bits_total: 0.0, drop_count: 0 }
    }

    pub fn bandwidth_bps(&self) -> f64 {
        self.bandwidth_bps
    }

    pub fn transfer_time_s(&self, bits: f64) -> f64 {
        bits / self.bandwidth_bps
    }

    pub fn prune(&mut self, now: f64) {
        self.reservations.retain(|r| r.finish_s > now);
    }

    /// Bits of all stored reservations that intersect `[start_s, end_s)`.
    pub fn reserved_bits_in_window(&self, start_s: f64, end_s: f64) -> f64 {
        self.reservations.iter().filter(|r| r.overlaps(start_s, end_s)).map(|r| r.bits).sum()
    }

    /// Admission check for a transfer of `bits` starting at `now`.
    ///
    /// The check window is the transfer time, widened to `window_floor_s` when that is longer.
    pub fn admits(&mut self, bits: f64, now: f64, window_floor_s: f64, safety_factor: f64) -> bool {
        self.prune(now);

        let transfer_s = self.transfer_time_s(bits);
        let window_s = transfer_s.max(window_floor_s);
        let reserved = self.reserved_bits_in_window(now, now + window_s);

        // bandwidth * transfer time is `bits`; use it directly so an idle link admits an exact fit.
        let window_bits = if window_floor_s > transfer_s { self.bandwidth_bps * window_floor_s } else { bits };
        reserved + bits <= window_bits * safety_factor
    }

    pub fn reserve(&mut self, bits: f64, now: f64, task_id: TaskId) -> LinkReservation {
        let reservation = LinkReservation { start_s: now, finish_s: snap_time(now + self.transfer_time_s(bits)), bits, task_id };

        self.reservations.push(reservation.clone());
        self.reserved_bits_total += bits;
        reservation
    }

    pub fn record_rejection(&mut self, bits: f64) {
        self.dropped_bits_total += bits;
        self.drop_count += 1;
    }

    /// Share of capacity already reserved over `[now, now + window_s)`, capped at 1.
    pub fn utilization(&mut self, now: f64, window_s: f64) -> f64 {
        self.prune(now);
        let capacity = self.bandwidth_bps * window_s;
        if capacity <= 0.0 {
            return 0.0;
        }
        (self.reserved_bits_in_window(now, now + window_s) / capacity).min(1.0)
    }

    pub fn pending(&self) -> usize {
        self.reservations.len()
    }

    pub fn reservations(&self) -> &[LinkReservation] {
        &self.reservations
    }

    pub fn reserved_bits_total(&self) -> f64 {
        self.reserved_bits_total
    }

    pub fn dropped_bits_total(&self) -> f64 {
        self.dropped_bits_total
    }

    pub fn drop_count(&self) -> u64 {
        self.drop_count
    }
}

/// Undirected backbone edge of the topology.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    pub source: NodeId,
    pub target: NodeId,
    /// Propagation delay, used as the routing cost.
    pub delay_ms: f64,
    pub schedule: BandwidthSchedule,
}

impl Link {
    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.source == node {
            Some(&self.target)
        } else if &self.target == node {
            Some(&self.source)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_reservations_are_pruned_before_the_check() {
        let mut schedule = BandwidthSchedule::new(1000.0);
        schedule.reserve(1000.0, 0.0, TaskId::new("t0"));
        assert!(!schedule.admits(500.0, 0.5, 0.0, 1.0));

        // The first reservation finishes at 1.0 and must not count at 1.0.
        assert!(schedule.admits(500.0, 1.0, 0.0, 1.0));
        assert_eq!(schedule.pending(), 0);
        assert_eq!(schedule.reserved_bits_total(), 1000.0);
    }

    #[test]
    fn window_floor_widens_the_admission_window() {
        let mut schedule = BandwidthSchedule::new(1e9);
        schedule.reserve(9e8, 0.0, TaskId::new("bulk"));

        // 9e8 + 5e7 fits into one second of capacity.
        assert!(schedule.admits(5e7, 0.0, 1.0, 1.0));
        // Without the floor the 0.05 s window only holds 5e7 bits.
        assert!(!schedule.admits(5e7, 0.0, 0.0, 1.0));
    }

    #[test]
    fn idle_link_admits_an_exact_fit_without_a_floor() {
        let mut schedule = BandwidthSchedule::new(3e7);
        assert!(schedule.admits(1e7, 0.0, 0.0, 1.0));

        schedule.reserve(1.0, 0.0, TaskId::new("tiny"));
        assert!(!schedule.admits(1e7, 0.0, 0.0, 1.0));
    }

    #[test]
    fn safety_factor_reserves_headroom() {
        let mut schedule = BandwidthSchedule::new(1000.0);
        assert!(schedule.admits(800.0, 0.0, 1.0, 0.9));
        assert!(!schedule.admits(950.0, 0.0, 1.0, 0.9));
    }

    #[test]
    fn utilization_is_capped() {
        let mut schedule = BandwidthSchedule::new(100.0);
        schedule.reserve(500.0, 0.0, TaskId::new("big"));
        assert_eq!(schedule.utilization(0.0, 1.0), 1.0);
        assert_eq!(schedule.utilization(10.0, 1.0), 0.0);
    }
}
