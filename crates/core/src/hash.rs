use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Fixed-seed hasher fed only fixed-width values and terminated strings, so a
/// value hashes the same in every run and process built for one target.
#[derive(Clone, Default)]
pub struct StableHasher {
    inner: FxHasher,
}

impl StableHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_f64(&mut self, value: f64) {
        self.inner.write_u64(canonical_bits(value));
    }

    pub fn write_i32(&mut self, value: i32) {
        self.inner.write_u32(value as u32);
    }

    pub fn write_str(&mut self, text: &str) {
        self.inner.write(text.as_bytes());
        self.inner.write_u8(0xff);
    }

    pub fn finish(&self) -> u64 {
        self.inner.finish()
    }
}

/// All NaNs share one bit pattern, and so do both zeros.
fn canonical_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

pub fn stable_hash_str(text: &str) -> u64 {
    let mut hasher = StableHasher::new();
    hasher.write_str(text);
    hasher.finish()
}
