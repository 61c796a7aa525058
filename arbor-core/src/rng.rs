//! Reproducible random streams.
//!
//! Every random choice a tree makes is a pure function of the tick seed,
//! the agent, and a per-node stream id. Not suitable for cryptography.

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

pub trait DeterministicRng {
    fn next_u64(&mut self) -> u64;

    /// High half of [`DeterministicRng::next_u64`].
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// `[0, 1)`, 24 random bits.
    fn next_f32_unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 * (1.0 / (1u32 << 24) as f32)
    }

    /// `[0, 1)`, 53 random bits.
    fn next_f64_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// `[0, bound)` by multiply-shift; 0 when `bound` is 0.
    fn next_below(&mut self, bound: usize) -> usize {
        let wide = u128::from(self.next_u64()) * bound as u128;
        (wide >> 64) as usize
    }
}

/// Weyl-sequence generator finalized with [`mix64`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generator for one `(seed, agent, stream)` triple.
    pub fn for_stream(seed: u64, agent: u64, stream: u64) -> Self {
        Self::new(derive_seed(seed, agent, stream))
    }
}

impl DeterministicRng for SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        mix64(self.state)
    }
}

/// SplitMix64 output finalizer; a bijection on `u64`.
pub fn mix64(x: u64) -> u64 {
    let x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    let x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Fold the parts into one seed. Order matters: `(a, b)` and `(b, a)` give
/// different streams.
pub fn derive_seed(seed: u64, agent: u64, stream: u64) -> u64 {
    [agent, stream]
        .into_iter()
        .fold(mix64(seed ^ GOLDEN_GAMMA), |acc, part| {
            mix64(acc.rotate_left(17) ^ part.wrapping_mul(GOLDEN_GAMMA))
        })
}
