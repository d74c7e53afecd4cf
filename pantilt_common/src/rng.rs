use rand::{Rng, RngCore};

/// Source of uniformly distributed integers.
pub trait RandomSource {
    /// Uniform draw from `[low, high)`. Returns `low` when the interval is
    /// empty.
    fn uniform_int(&mut self, low: u32, high: u32) -> u32;
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        (**self).uniform_int(low, high)
    }
}

/// Adapts any `rand` generator.
pub struct RngSource<R>(pub R);

impl<R: RngCore> RandomSource for RngSource<R> {
    fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.0.gen_range(low..high)
    }
}
