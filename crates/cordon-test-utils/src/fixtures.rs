//! Grid and configuration builders.

use cordon_core::{Observation, SimConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Parse protocol rows, panicking on malformed input.
pub fn observation(rows: &[&str]) -> Observation {
    Observation::from_rows(rows).expect("fixture rows must form a valid grid")
}

/// A validated config sized to `rows`.
pub fn config(rows: &[&str], med_strength: u32, kill_time: u32, spread_prob: f64) -> SimConfig {
    let obs = observation(rows);
    SimConfig::new(obs.width(), obs.height(), med_strength, kill_time, spread_prob)
        .expect("fixture parameters must be valid")
}

/// A random grid: each cell is infected with probability `infected`,
/// otherwise dead with probability `dead`, otherwise clean.
pub fn random_rows(width: u32, height: u32, infected: f64, dead: f64, seed: u64) -> Vec<String> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..height)
        .map(|_| {
            (0..width)
                .map(|_| {
                    if rng.random::<f64>() < infected {
                        'V'
                    } else if rng.random::<f64>() < dead {
                        'X'
                    } else {
                        'C'
                    }
                })
                .collect()
        })
        .collect()
}
