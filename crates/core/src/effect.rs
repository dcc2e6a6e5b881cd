use crate::group::EffectGroup;
use crate::hash::{stable_hash_str, StableHasher};
use serde::{Deserialize, Serialize};

/// Duration value of an explicit `DURATION:instant` line, distinct from the
/// `INSTANT` keyword which leaves the duration unspecified (NaN).
pub const INSTANT_SENTINEL: f64 = -1.0;

/// One modifier clause attached to an affix.
///
/// Numeric fields belong to this instance; everything that identifies the
/// kind of effect lives in [`EffectGroup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub source_file: String,
    /// `+inf` is permanent, NaN is instantaneous or unspecified, `-1` is the
    /// explicit instant sentinel, anything else is seconds.
    pub duration: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub level: i32,
    pub stat_percent: f64,
    pub soak_scale: f64,
    pub resist: f64,
    pub min_per: f64,
    pub max_per: f64,
    pub range: f64,
    pub max_count: f64,
    pub pulse: f64,
    pub group: EffectGroup,
}

impl Effect {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            ..Self::default()
        }
    }

    pub fn effect_type(&self) -> Option<&str> {
        self.group.effect_type.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.group.name.as_deref()
    }

    pub fn has_duration(&self) -> bool {
        self.group.has_duration
    }

    pub fn to_group(&self) -> EffectGroup {
        self.group.clone()
    }

    /// Affix parsing orders effects by this key: the hash of the group first,
    /// so affixes of one group list their effects in the same order, then the
    /// hash of every field.
    pub fn sort_key(&self) -> (u64, u64) {
        (stable_hash_str(&self.group.to_string()), self.stable_hash())
    }

    /// Hash over every field except the source file, stable across runs.
    pub fn stable_hash(&self) -> u64 {
        let mut hasher = StableHasher::new();
        for value in [
            self.duration,
            self.min_value,
            self.max_value,
            self.stat_percent,
            self.soak_scale,
            self.resist,
            self.min_per,
            self.max_per,
            self.range,
            self.max_count,
            self.pulse,
        ] {
            hasher.write_f64(value);
        }
        hasher.write_i32(self.level);
        hasher.write_str(&self.group.to_string());
        hasher.finish()
    }
}

impl Default for Effect {
    fn default() -> Self {
        Self {
            source_file: String::new(),
            duration: f64::NAN,
            min_value: 0.0,
            max_value: 0.0,
            level: -1,
            stat_percent: 0.0,
            soak_scale: 1.0,
            resist: 0.0,
            min_per: 0.0,
            max_per: 0.0,
            range: 0.0,
            max_count: 0.0,
            pulse: 0.0,
            group: EffectGroup::default(),
        }
    }
}
