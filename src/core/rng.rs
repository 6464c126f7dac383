const PCG32_DEFAULT_STATE: u64 = 0x853c49e6748fea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e39cb94b95bdb;
const PCG32_MULT: u64 = 0x5851f42d4c957f2d;

const FLOAT_ONE_MINUS_EPSILON: f32 = 0.99999994;

/// PCG32 generator used for seeded tile shuffles and procedural kernels.
#[derive(Debug, PartialEq, Clone)]
pub struct RNG {
    pub state: u64,
    pub inc: u64,
}

impl RNG {
    pub fn new() -> Self {
        RNG {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM,
        }
    }

    pub fn new_sequence(initseq: u64) -> Self {
        let mut r = Self::new();
        r.set_sequence(initseq);
        return r;
    }

    pub fn set_sequence(&mut self, initseq: u64) {
        self.state = 0;
        self.inc = (initseq << 1) | 1;
        self.uniform_uint32();
        self.state = self.state.wrapping_add(PCG32_DEFAULT_STATE);
        self.uniform_uint32();
    }

    #[inline]
    pub fn uniform_uint32(&mut self) -> u32 {
        let oldstate: u64 = self.state;
        self.state = oldstate.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);
        let xorshifted: u32 = ((oldstate.wrapping_shr(18) ^ oldstate).wrapping_shr(27)) as u32;
        let rot: u32 = (oldstate.wrapping_shr(59)) as u32;
        return (xorshifted.wrapping_shr(rot))
            | (xorshifted.wrapping_shl(((!rot).wrapping_add(1)) & 31));
    }

    pub fn uniform_uint32_threshold(&mut self, b: u32) -> u32 {
        let threshold = (!b).wrapping_add(1) % b;
        loop {
            let r = self.uniform_uint32();
            if r >= threshold {
                return r % b;
            }
        }
    }

    pub fn uniform_float32(&mut self) -> f32 {
        let f: f32 = self.uniform_uint32() as f32 * 2.3283064365386963e-10;
        return FLOAT_ONE_MINUS_EPSILON.min(f);
    }

    /// Fisher-Yates shuffle driven by this generator.
    pub fn shuffle<T>(&mut self, values: &mut [T]) {
        let n = values.len();
        for i in (1..n).rev() {
            let j = self.uniform_uint32_threshold((i + 1) as u32) as usize;
            values.swap(i, j);
        }
    }
}

impl Default for RNG {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn hash_final(mut a: u32, mut b: u32, mut c: u32) -> u32 {
    c ^= b;
    c = c.wrapping_sub(b.rotate_left(14));
    a ^= c;
    a = a.wrapping_sub(c.rotate_left(11));
    b ^= a;
    b = b.wrapping_sub(a.rotate_left(25));
    c ^= b;
    c = c.wrapping_sub(b.rotate_left(16));
    a ^= c;
    a = a.wrapping_sub(c.rotate_left(4));
    b ^= a;
    b = b.wrapping_sub(a.rotate_left(14));
    c ^= b;
    c = c.wrapping_sub(b.rotate_left(24));
    return c;
}

/// Seed for the per-pixel random number state of a render buffer.
#[inline]
pub fn hash_int_2d(x: i32, y: i32) -> u32 {
    let seed: u32 = 0xdeadbeef_u32.wrapping_add(2 << 2).wrapping_add(13);
    return hash_final(
        seed.wrapping_add(x as u32),
        seed.wrapping_add(y as u32),
        seed,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let mut rng = RNG::new();
        let a: f32 = rng.uniform_float32();
        let astate = rng.state;
        let b: f32 = rng.uniform_float32();
        let bstate = rng.state;
        assert_ne!(a, b);
        assert_ne!(astate, bstate);
    }

    #[test]
    fn test_002() {
        let mut a: Vec<usize> = (0..32).collect();
        let mut b: Vec<usize> = (0..32).collect();
        RNG::new_sequence(7).shuffle(&mut a);
        RNG::new_sequence(7).shuffle(&mut b);
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, (0..32).collect::<Vec<usize>>());
    }

    #[test]
    fn test_003() {
        assert_eq!(hash_int_2d(3, 4), hash_int_2d(3, 4));
        assert_ne!(hash_int_2d(3, 4), hash_int_2d(4, 3));
    }
}
