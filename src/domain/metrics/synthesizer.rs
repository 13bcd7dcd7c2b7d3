//! Placeholder series generation.
//!
//! Values are random; sample count, spacing and bounds are not.

use super::entities::Series;
use super::value_objects::{ChannelShape, ResolvedRange, Sample, StepUnit};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::f64::consts::PI;

pub const BALANCE_BASE: f64 = 80_000.0;
pub const BALANCE_AMPLITUDE: f64 = 20_000.0;
/// Hard lower bound of every synthesized balance
pub const BALANCE_FLOOR: f64 = 40_000.0;
/// Noise spans ±7.5% of the amplitude
const NOISE_SPREAD: f64 = 0.15;

pub const DESKTOP_RANGE: (u32, u32) = (100, 500);
pub const MOBILE_RANGE: (u32, u32) = (100, 400);

/// Single-channel balance series of `count` samples ending at `now`.
pub fn synthesize<R: Rng + ?Sized>(count: usize, unit: StepUnit, now: DateTime<Utc>, rng: &mut R) -> Series {
    let samples = backward_indices(count)
        .map(|i| Sample::balance(timestamp_at(now, unit, i), balance_at(i, count, rng)))
        .collect();
    Series::from_ordered(samples)
}

/// Dual-channel desktop/mobile series; channels are drawn independently.
pub fn synthesize_traffic<R: Rng + ?Sized>(
    count: usize,
    unit: StepUnit,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Series {
    let samples = backward_indices(count)
        .map(|i| {
            let desktop = rng.gen_range(DESKTOP_RANGE.0..=DESKTOP_RANGE.1);
            let mobile = rng.gen_range(MOBILE_RANGE.0..=MOBILE_RANGE.1);
            Sample::traffic(timestamp_at(now, unit, i), desktop, mobile)
        })
        .collect();
    Series::from_ordered(samples)
}

pub fn synthesize_shape<R: Rng + ?Sized>(
    shape: ChannelShape,
    range: ResolvedRange,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Series {
    match shape {
        ChannelShape::Balance => synthesize(range.count, range.unit, now, rng),
        ChannelShape::Traffic => synthesize_traffic(range.count, range.unit, now, rng),
    }
}

fn backward_indices(count: usize) -> impl Iterator<Item = usize> {
    (0..count).rev()
}

fn timestamp_at(now: DateTime<Utc>, unit: StepUnit, i: usize) -> DateTime<Utc> {
    now - unit.step() * (i as i32)
}

fn balance_at<R: Rng + ?Sized>(i: usize, count: usize, rng: &mut R) -> f64 {
    let trend = ((i as f64 / count as f64) * PI * 2.0).sin() * BALANCE_AMPLITUDE * 0.5;
    let noise = (rng.gen_range(0.0_f64..1.0) - 0.5) * BALANCE_AMPLITUDE * NOISE_SPREAD;
    round_cents((BALANCE_BASE + trend + noise).max(BALANCE_FLOOR))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
