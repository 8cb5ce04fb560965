use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct Counters {
    started: AtomicU64,
    succeeded: AtomicU64,
    prevented: AtomicU64,
    timed_out: AtomicU64,
    relaunches: AtomicU64,
}

static COUNTERS: Lazy<Counters> = Lazy::new(Counters::default);

fn increment(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

pub fn record_started() {
    increment(&COUNTERS.started);
}

pub fn record_succeeded() {
    increment(&COUNTERS.succeeded);
}

pub fn record_prevented() {
    increment(&COUNTERS.prevented);
}

pub fn record_timed_out() {
    increment(&COUNTERS.timed_out);
}

pub fn record_relaunch() {
    increment(&COUNTERS.relaunches);
}

#[derive(Clone, Debug, Default)]
pub struct SchedulerMetricsSnapshot {
    pub started: u64,
    pub succeeded: u64,
    pub prevented: u64,
    pub timed_out: u64,
    pub relaunches: u64,
}

pub fn snapshot() -> SchedulerMetricsSnapshot {
    SchedulerMetricsSnapshot {
        started: COUNTERS.started.load(Ordering::Relaxed),
        succeeded: COUNTERS.succeeded.load(Ordering::Relaxed),
        prevented: COUNTERS.prevented.load(Ordering::Relaxed),
        timed_out: COUNTERS.timed_out.load(Ordering::Relaxed),
        relaunches: COUNTERS.relaunches.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_only_grow() {
        let before = snapshot();
        record_started();
        record_timed_out();
        record_relaunch();
        let after = snapshot();
        assert!(after.started > before.started);
        assert!(after.timed_out > before.timed_out);
        assert!(after.relaunches > before.relaunches);
    }
}
