//! Randomness collaborator for the RANDOM pattern.

/// Uniform integer source.
pub trait RandomSource {
    /// Returns a value in `0..bound`. `bound` is never zero.
    fn next_below(&mut self, bound: u32) -> u32;
}

impl<T> RandomSource for &mut T
where
    T: RandomSource + ?Sized,
{
    fn next_below(&mut self, bound: u32) -> u32 {
        T::next_below(self, bound)
    }
}

/// Marsaglia xorshift generator.
///
/// Good enough for blinking lights on chips without a hardware RNG.
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    /// A zero seed would lock the generator at zero, so it is replaced.
    pub const fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x9e37_79b9 } else { seed },
        }
    }

    /// Next raw 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

impl RandomSource for XorShift32 {
    fn next_below(&mut self, bound: u32) -> u32 {
        // Multiply-shift range reduction
        ((u64::from(self.next_u32()) * u64::from(bound)) >> 32) as u32
    }
}
