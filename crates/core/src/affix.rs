use crate::effect::Effect;
use crate::group::AffixGroup;
use crate::level::LevelRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker that suffix/prefix text uses for the item name.
pub const ITEM_PLACEHOLDER: &str = "[ITEM]";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum AffixKind {
    #[default]
    Item,
    Socketable,
    Personal,
    Enchantment,
}

impl AffixKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Item => "Item",
            Self::Socketable => "Socketable",
            Self::Personal => "Personal",
            Self::Enchantment => "Enchantment",
        }
    }
}

/// Where equip-type tokens go while scanning an affix file. Toggled by the
/// `[UNITTYPES]` and `[NOT_UNITTYPES]` section markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EquipMode {
    #[default]
    Allowed,
    Excluded,
}

/// One spawnable modifier definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affix {
    pub source_name: String,
    pub internal_name: Option<String>,
    /// Either text may actually be a prefix or a suffix; some data files
    /// swap them.
    pub suffix_text: Option<String>,
    pub prefix_text: Option<String>,
    pub spawn_range: LevelRange,
    /// Zero means the affix never spawns.
    pub weight: i32,
    pub slots: i32,
    pub kind: AffixKind,
    pub equip_types: Vec<String>,
    pub nonequip_types: Vec<String>,
    pub enchant_sources: Vec<String>,
    pub socketable_types: Vec<String>,
    pub effects: Vec<Effect>,
}

impl Affix {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            internal_name: None,
            suffix_text: None,
            prefix_text: None,
            spawn_range: LevelRange::default(),
            weight: 0,
            slots: 0,
            kind: AffixKind::default(),
            equip_types: Vec::new(),
            nonequip_types: Vec::new(),
            enchant_sources: Vec::new(),
            socketable_types: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Routes one equip-type token.
    ///
    /// Excluded tokens are recorded as-is. Allowed tokens are classified, first
    /// match wins: socketables, enchanter sources, monster/player, then plain
    /// item types. Every classifying token overwrites `kind`, so the last one
    /// seen decides it.
    pub fn add_equip_type(&mut self, token: &str, mode: EquipMode) {
        if mode == EquipMode::Excluded {
            self.nonequip_types.push(token.to_string());
            return;
        }
        if token == "SOCKETABLE" || token.contains(" EMBER") {
            self.kind = AffixKind::Socketable;
            self.socketable_types.push(token.to_string());
        } else if token.starts_with("ENCHANTER") {
            self.kind = AffixKind::Enchantment;
            self.enchant_sources
                .push(token.get(10..).unwrap_or_default().to_string());
        } else if token == "MONSTER" || token == "PLAYER" {
            self.kind = AffixKind::Personal;
        } else {
            self.kind = AffixKind::Item;
            self.equip_types.push(token.to_string());
        }
    }

    pub fn is_named(&self) -> bool {
        self.suffix_text.is_some() || self.prefix_text.is_some()
    }

    pub fn name(&self) -> &str {
        self.internal_name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn to_group(&self) -> AffixGroup {
        AffixGroup {
            kind: self.kind,
            equip_types: self.equip_types.clone(),
            nonequip_types: self.nonequip_types.clone(),
            enchant_sources: self.enchant_sources.clone(),
            socketable_types: self.socketable_types.clone(),
            effects: self.effects.iter().map(Effect::to_group).collect(),
        }
    }

    /// Same kind of affix, possibly at a different intensity or level.
    pub fn is_in_affix_group(&self, other: &Affix) -> bool {
        self.to_group() == other.to_group()
    }

    /// Puts effects into an order that does not depend on the order they were
    /// written in.
    pub fn sort_effects(&mut self) {
        self.effects.sort_by_cached_key(Effect::sort_key);
    }
}

impl fmt::Display for Affix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_tokens_never_classify() {
        let mut affix = Affix::new("test");
        affix.add_equip_type("MONSTER", EquipMode::Excluded);
        assert_eq!(affix.kind, AffixKind::Item);
        assert_eq!(affix.nonequip_types, vec!["MONSTER".to_string()]);
    }

    #[test]
    fn enchanter_prefix_is_stripped() {
        let mut affix = Affix::new("test");
        affix.add_equip_type("ENCHANTER RUNIC", EquipMode::Allowed);
        assert_eq!(affix.kind, AffixKind::Enchantment);
        assert_eq!(affix.enchant_sources, vec!["RUNIC".to_string()]);
    }

    #[test]
    fn bare_enchanter_token_yields_empty_source() {
        let mut affix = Affix::new("test");
        affix.add_equip_type("ENCHANTER", EquipMode::Allowed);
        assert_eq!(affix.enchant_sources, vec![String::new()]);
    }

    #[test]
    fn last_classifying_token_wins() {
        let mut affix = Affix::new("test");
        affix.add_equip_type("FIRE EMBER", EquipMode::Allowed);
        affix.add_equip_type("PLAYER", EquipMode::Allowed);
        assert_eq!(affix.kind, AffixKind::Personal);
        assert_eq!(affix.socketable_types, vec!["FIRE EMBER".to_string()]);

        affix.add_equip_type("HELMET", EquipMode::Allowed);
        assert_eq!(affix.kind, AffixKind::Item);
    }
}
