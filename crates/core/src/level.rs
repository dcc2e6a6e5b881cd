use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

pub const MIN_LEVEL: i32 = 1;
pub const MAX_LEVEL: i32 = 999;

/// Spawn window of an affix.
///
/// Bounds are stored as read from the data file and clamped into
/// `[MIN_LEVEL, MAX_LEVEL]` whenever the range is compared, hashed or
/// formatted. After clamping, a range with `min == 1` has no lower bound and a
/// range with `max == 999` has no upper bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LevelRange {
    pub min_level: i32,
    pub max_level: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Bounds {
    UpperOnly,
    Both,
    LowerOnly,
    Unrestricted,
}

impl LevelRange {
    pub fn new(min_level: i32, max_level: i32) -> Self {
        Self {
            min_level,
            max_level,
        }
    }

    pub fn clamped(&self) -> Self {
        Self {
            min_level: self.min_level.clamp(MIN_LEVEL, MAX_LEVEL),
            max_level: self.max_level.clamp(MIN_LEVEL, MAX_LEVEL),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.no_lower_bound() && self.no_upper_bound()
    }

    pub fn no_lower_bound(&self) -> bool {
        self.min_level <= MIN_LEVEL
    }

    pub fn no_upper_bound(&self) -> bool {
        self.max_level >= MAX_LEVEL
    }

    fn bounds(&self) -> Bounds {
        match (self.no_lower_bound(), self.no_upper_bound()) {
            (true, true) => Bounds::Unrestricted,
            (true, false) => Bounds::UpperOnly,
            (false, true) => Bounds::LowerOnly,
            (false, false) => Bounds::Both,
        }
    }

    fn sort_key(&self) -> (Bounds, i32, i32) {
        let clamped = self.clamped();
        (clamped.bounds(), clamped.min_level, clamped.max_level)
    }
}

impl Default for LevelRange {
    fn default() -> Self {
        Self::new(MIN_LEVEL, MAX_LEVEL)
    }
}

impl PartialEq for LevelRange {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for LevelRange {}

impl Hash for LevelRange {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

impl PartialOrd for LevelRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Ranges with only an upper bound sort first, then fully bounded ranges, then
// ranges with only a lower bound; unrestricted ranges are the maximum.
impl Ord for LevelRange {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for LevelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = self.clamped();
        match range.bounds() {
            Bounds::Unrestricted => write!(f, "No Level Range"),
            Bounds::Both => write!(f, "Level Range: {}-{}", range.min_level, range.max_level),
            Bounds::UpperOnly => write!(f, "Max Level: {}", range.max_level),
            Bounds::LowerOnly => write!(f, "Minimum Level: {}", range.min_level),
        }
    }
}
