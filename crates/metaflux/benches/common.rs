use std::time::Duration;

use criterion::{Criterion, Throughput};
use glam::Vec3;
use metaflux::field::{BallData, BallSet};

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// `count` balls spread on a ring of `radius` around the origin.
#[allow(dead_code)]
pub fn ring_of_balls(count: usize, radius: f32, power: f32) -> BallSet {
    let balls: Vec<BallData> = (0..count)
        .map(|i| {
            let a = i as f32 / count.max(1) as f32 * std::f32::consts::TAU;
            BallData::new(Vec3::new(a.cos() * radius, a.sin() * radius * 0.5, a.sin() * radius), power)
        })
        .collect();
    BallSet::try_from_slice(&balls).unwrap_or_default()
}
