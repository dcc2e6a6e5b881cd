use crate::affix::AffixKind;
use crate::hash::stable_hash_str;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The non-numeric identity of an effect.
///
/// Two effects that differ only in magnitude, duration, level or any other
/// number share an `EffectGroup`. No numeric field may be added here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectGroup {
    pub name: Option<String>,
    pub effect_type: Option<String>,
    pub damage_type: String,
    pub has_duration: bool,
    pub stat_name: Option<String>,
    pub is_stat_bonus: bool,
    pub owner_level: bool,
    pub graph_override: Option<String>,
    pub use_graph: bool,
    pub exclusive: bool,
    pub is_transfer: bool,
}

impl Default for EffectGroup {
    fn default() -> Self {
        Self {
            name: None,
            effect_type: None,
            damage_type: "physical".to_string(),
            has_duration: false,
            stat_name: None,
            is_stat_bonus: false,
            owner_level: false,
            graph_override: None,
            use_graph: true,
            exclusive: false,
            is_transfer: false,
        }
    }
}

impl EffectGroup {
    pub fn summary(&self) -> String {
        let mut out = String::new();
        if self.is_transfer {
            out.push_str("Transfer: ");
        }
        out.push_str(self.effect_type.as_deref().unwrap_or("<untyped>"));
        if let Some(name) = non_empty(&self.name) {
            out.push_str(&format!(" (named {})", name));
        }
        if self.has_duration {
            out.push_str(" (timed)");
        }
        if let Some(stat) = non_empty(&self.stat_name) {
            out.push_str(&format!(" (uses stat {}", stat));
            if self.is_stat_bonus {
                out.push_str(" as a bonus");
            }
            out.push(')');
        }
        if self.owner_level {
            out.push_str(" (uses owner level)");
        }
        if self.use_graph {
            let graph = non_empty(&self.graph_override).unwrap_or("default");
            out.push_str(&format!(" (uses {} graph)", graph));
        }
        if self.exclusive {
            out.push_str(" (exclusive)");
        }
        out
    }
}

impl fmt::Display for EffectGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}/{}/{}/{}/{}/{}/{}",
            self.name.as_deref().unwrap_or("-"),
            self.effect_type.as_deref().unwrap_or("-"),
            self.damage_type,
            self.has_duration,
            self.stat_name.as_deref().unwrap_or("-"),
            self.is_stat_bonus,
            self.owner_level,
            self.graph_override.as_deref().unwrap_or("-"),
            self.use_graph,
            self.exclusive,
            self.is_transfer
        )
    }
}

/// The non-numeric identity of an affix: its classification, the item types
/// it applies to and the ordered groups of its effects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AffixGroup {
    pub kind: AffixKind,
    pub equip_types: Vec<String>,
    pub nonequip_types: Vec<String>,
    pub enchant_sources: Vec<String>,
    pub socketable_types: Vec<String>,
    pub effects: Vec<EffectGroup>,
}

impl AffixGroup {
    /// True when the group carries nothing to compare by; such affixes are
    /// kept out of the grouped buckets.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
            && self.equip_types.is_empty()
            && self.nonequip_types.is_empty()
            && self.enchant_sources.is_empty()
            && self.socketable_types.is_empty()
    }

    /// Canonical string form. Empty exactly when [`AffixGroup::is_empty`].
    pub fn canonical(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut out = format!("{:?}", self.kind);
        for effect in &self.effects {
            out.push('{');
            out.push_str(&effect.to_string());
            out.push('}');
        }
        for (tag, list) in [
            ("enchant", &self.enchant_sources),
            ("equip", &self.equip_types),
            ("nonequip", &self.nonequip_types),
            ("socket", &self.socketable_types),
        ] {
            if !list.is_empty() {
                out.push_str(&format!("[{}:{}]", tag, list.join(",")));
            }
        }
        out
    }

    /// Stable identifier derived from the canonical string.
    pub fn id(&self) -> u64 {
        stable_hash_str(&self.canonical())
    }

    pub fn summary(&self) -> String {
        let mut out = format!("{} affix", self.kind.label());
        if !self.equip_types.is_empty() {
            out.push_str(&format!(" on [{}]", self.equip_types.join(", ")));
        }
        if !self.nonequip_types.is_empty() {
            out.push_str(&format!(" not on [{}]", self.nonequip_types.join(", ")));
        }
        if !self.enchant_sources.is_empty() {
            out.push_str(&format!(" from [{}]", self.enchant_sources.join(", ")));
        }
        if !self.socketable_types.is_empty() {
            out.push_str(&format!(" in [{}]", self.socketable_types.join(", ")));
        }
        out.push('\n');
        for effect in &self.effects {
            out.push('\t');
            out.push_str(&effect.summary());
            out.push('\n');
        }
        out
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.is_empty())
}
