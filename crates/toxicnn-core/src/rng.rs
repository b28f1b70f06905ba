//! Seeded random streams.
//!
//! Every randomized step draws from its own PCG stream derived from the one
//! run seed, so changing how many numbers one step consumes never shifts the
//! others.

use oorandom::Rand32;

/// Purpose of a random stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Weight initialisation.
    Init,
    /// Train/validation split.
    Split,
    /// Per-epoch batch order.
    Shuffle,
    /// Dropout masks.
    Dropout,
}

impl Stream {
    fn increment(self) -> u64 {
        match self {
            Self::Init => 0x1f2e_3d4c,
            Self::Split => 0x5b6a_7988,
            Self::Shuffle => 0x97a6_b5c4,
            Self::Dropout => 0xd3e2_f100,
        }
    }
}

/// Random generator for `stream` under `seed`.
#[must_use]
pub fn stream(seed: u64, stream: Stream) -> Rand32 {
    Rand32::new_inc(seed, stream.increment())
}

/// Fisher-Yates shuffle driven by `rng`.
pub fn shuffle<T>(items: &mut [T], rng: &mut Rand32) {
    for i in (1..items.len()).rev() {
        let j = rng.rand_range(0..(i as u32 + 1)) as usize;
        items.swap(i, j);
    }
}
