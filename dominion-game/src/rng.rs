//! Deterministic random substrate shared by every resolver.
//!
//! A 31-bit linear congruential generator. The state is a plain value:
//! [`GameRng::step`] is a pure function returning the next state together with
//! the drawn value, and the `&mut self` helpers simply write that next state
//! back in place. Identical seeds and call sequences yield identical streams
//! on every platform because only wrapping `u32` arithmetic is involved.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

const LCG_MASK: u32 = 0x7fff_ffff;
const LCG_MULTIPLIER: u32 = 1_103_515_245;
const LCG_INCREMENT: u32 = 12_345;
const RAW_SPAN: f64 = 2_147_483_648.0;

/// Threaded LCG state. The stored value is always the next one to advance
/// from, never a value that was already handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameRng {
    state: u32,
}

impl GameRng {
    /// Seed a stream. Only the low 31 bits are kept and a zero seed becomes 1.
    #[must_use]
    pub const fn create(seed: u64) -> Self {
        let masked = (seed & LCG_MASK as u64) as u32;
        Self {
            state: if masked == 0 { 1 } else { masked },
        }
    }

    /// Current state, suitable for persisting.
    #[must_use]
    pub const fn state(self) -> u32 {
        self.state
    }

    /// Advance once, returning the successor state and the raw draw in `[0, 2^31)`.
    #[must_use]
    pub const fn step(self) -> (Self, u32) {
        let next = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT)
            & LCG_MASK;
        (Self { state: next }, next)
    }

    /// Draw a raw value and keep the advanced state.
    pub fn next_raw(&mut self) -> u32 {
        let (next, raw) = self.step();
        *self = next;
        raw
    }

    /// Uniform integer in `[min, max]`. Returns `min` when the range is empty.
    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max.abs_diff(min).saturating_add(1);
        let offset = u64::from(self.next_raw()) % span;
        min.saturating_add_unsigned(offset)
    }

    /// Uniform float in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        f64::from(self.next_raw()) / RAW_SPAN
    }

    /// Uniform float in `[lo, hi)`.
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        let unit = self.unit();
        lo + unit * (hi - lo)
    }

    /// Bernoulli draw with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// In-place Fisher-Yates shuffle walking from the tail.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let upper = i64::try_from(i).unwrap_or(i64::MAX);
            let j = usize::try_from(self.int_range(0, upper)).unwrap_or(0);
            items.swap(i, j);
        }
    }

    /// Pick one element uniformly. Empty slices return `None` without drawing.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let upper = i64::try_from(items.len() - 1).unwrap_or(i64::MAX);
        let index = usize::try_from(self.int_range(0, upper)).unwrap_or(0);
        items.get(index)
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::create(1)
    }
}

impl rand::RngCore for GameRng {
    fn next_u32(&mut self) -> u32 {
        self.next_raw()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_raw());
        let lo = u64::from(self.next_raw());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Derive an independent sub-seed from a user-visible seed and a domain tag.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_seed_is_promoted_to_one() {
        assert_eq!(GameRng::create(0), GameRng::create(1));
        assert_eq!(GameRng::create(0).state(), 1);
    }

    #[test]
    fn step_matches_reference_lcg() {
        let rng = GameRng::create(1);
        let (next, raw) = rng.step();
        assert_eq!(raw, 1_103_527_590);
        assert_eq!(next.state(), raw);
        // the input value is untouched
        assert_eq!(rng.state(), 1);
    }

    #[test]
    fn identical_seeds_produce_identical_streams() {
        let mut a = GameRng::create(0xDEAD_BEEF);
        let mut b = GameRng::create(0xDEAD_BEEF);
        for _ in 0..1000 {
            assert_eq!(a.next_raw(), b.next_raw());
        }
    }

    #[test]
    fn raw_values_stay_within_31_bits() {
        let mut rng = GameRng::create(42);
        for _ in 0..10_000 {
            assert!(rng.next_raw() < 0x8000_0000);
        }
    }

    #[test]
    fn int_range_is_inclusive_and_bounded() {
        let mut rng = GameRng::create(7);
        let mut seen = [false; 5];
        for _ in 0..500 {
            let value = rng.int_range(1, 5);
            assert!((1..=5).contains(&value));
            seen[usize::try_from(value - 1).unwrap()] = true;
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(rng.int_range(9, 3), 9);
    }

    #[test]
    fn unit_and_range_stay_in_bounds() {
        let mut rng = GameRng::create(99);
        for _ in 0..1000 {
            let u = rng.unit();
            assert!((0.0..1.0).contains(&u));
            let r = rng.range(0.95, 1.05);
            assert!((0.95..1.05).contains(&r));
        }
    }

    #[test]
    fn shuffle_is_a_permutation_and_reproducible() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        GameRng::create(5).shuffle(&mut a);
        GameRng::create(5).shuffle(&mut b);
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn pick_handles_empty_without_drawing() {
        let mut rng = GameRng::create(3);
        let before = rng;
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
        assert_eq!(rng, before);
        assert!(rng.pick(&[1, 2, 3]).is_some());
    }

    #[test]
    fn stream_seeds_are_domain_separated() {
        let bots = derive_stream_seed(42, b"bots");
        let world = derive_stream_seed(42, b"world");
        assert_ne!(bots, world);
        assert_eq!(bots, derive_stream_seed(42, b"bots"));
    }
}
