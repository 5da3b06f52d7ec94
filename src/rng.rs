/// Source of randomness for score jitter and message selection.
///
/// Implementors only provide `next_f32`; the integer helpers are derived
/// from it so a scripted source in tests stays small.
pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn next_f32(&mut self) -> f32;

    /// Uniform integer in the inclusive range `[min, max]`.
    fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        let value = min + (self.next_f32() * span).floor() as i32;
        value.min(max)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_f32() * len as f32).floor().min((len - 1) as f32) as usize
    }
}

/// Seedable mulberry32 generator.
#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }
}

impl RandomSource for Rng {
    fn next_f32(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        // f32 rounding can push values close to 1.0 up to exactly 1.0
        ((out as f64 / 4_294_967_296.0) as f32).min(0.999_999_94)
    }
}
