/// Resolution of the simulation time grid: one tick is one microsecond.
pub const TICKS_PER_SECOND: f64 = 1_000_000.0;

/// Snaps a timestamp in seconds onto the tick grid.
///
/// Every timestamp derived from arithmetic goes through here before it is stored,
/// compared or pushed into the event queue, so that equivalent runs order events
/// identically.
pub fn snap_time(time_s: f64) -> f64 {
    (time_s * TICKS_PER_SECOND).round() / TICKS_PER_SECOND
}

/// Integer tick count of a timestamp, used as the event ordering key.
pub fn to_ticks(time_s: f64) -> i64 {
    (time_s * TICKS_PER_SECOND).round() as i64
}

pub fn ms_to_s(ms: f64) -> f64 {
    ms / 1000.0
}

pub fn s_to_ms(s: f64) -> f64 {
    s * 1000.0
}
