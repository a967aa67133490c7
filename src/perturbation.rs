use crate::calendar::DayOffset;
use crate::models::regressor::BasePrediction;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::ops::RangeInclusive;

pub const MAX_VARIATION: RangeInclusive<f64> = -3.0..=3.0;
pub const MIN_VARIATION: RangeInclusive<f64> = -2.0..=2.0;
pub const REPAIR_GAP: RangeInclusive<f64> = 2.0..=5.0;

/// City hashes are folded into this many buckets before the day is added.
pub const CITY_SEED_SPACE: u64 = 1000;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001b3;

/// 64 bit FNV-1a. Pinned so that seeds are identical across runs, builds and
/// platforms.
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

pub fn city_hash(city: &str) -> u64 {
    fnv1a_64(city.to_lowercase().as_bytes()) % CITY_SEED_SPACE
}

pub fn seed(city: &str, day_offset: DayOffset) -> u64 {
    // Two's complement reinterpretation keeps negative offsets deterministic.
    (city_hash(city) as i64).wrapping_add(day_offset) as u64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variation {
    pub max: f64,
    pub min: f64,
}

impl Variation {
    /// Max is drawn before min; both come from the same stream.
    pub fn draw(rng: &mut impl Rng) -> Variation {
        let max = rng.random_range(MAX_VARIATION);
        let min = rng.random_range(MIN_VARIATION);
        Variation { max, min }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustedPrediction {
    pub max: f64,
    pub min: f64,
    /// Set when the minimum had to be pulled below the maximum.
    pub repair_gap: Option<f64>,
}

/// Adds `variation` to `base`. If that leaves min at or above max, min is
/// replaced once by max minus a gap drawn from `rng`. The result is strictly
/// ordered as long as both base values lie within the model prediction limit.
pub fn apply_variation(
    base: BasePrediction,
    variation: Variation,
    rng: &mut impl Rng,
) -> AdjustedPrediction {
    let max = base.max + variation.max;
    let min = base.min + variation.min;
    if min >= max {
        let gap = rng.random_range(REPAIR_GAP);
        AdjustedPrediction {
            max,
            min: max - gap,
            repair_gap: Some(gap),
        }
    } else {
        AdjustedPrediction {
            max,
            min,
            repair_gap: None,
        }
    }
}

/// Deterministic per city and day adjustment of the base prediction.
pub fn perturb(city: &str, day_offset: DayOffset, base: BasePrediction) -> AdjustedPrediction {
    let mut rng = ChaCha8Rng::seed_from_u64(seed(city, day_offset));
    let variation = Variation::draw(&mut rng);
    apply_variation(base, variation, &mut rng)
}
