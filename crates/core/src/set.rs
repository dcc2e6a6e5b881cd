use crate::affix::Affix;
use crate::group::AffixGroup;
use crate::level::LevelRange;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Where [`AffixSet::add_affix_by_contents`] put an affix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Grouped,
    Ungrouped,
    /// Never spawns; counted but not stored.
    ZeroWeight,
    /// An equal entry was already present and kept.
    Duplicate,
}

/// Affixes bucketed by [`AffixGroup`], iterated in group order.
#[derive(Debug, Clone, Default)]
pub struct AffixSet {
    groups: BTreeMap<AffixGroup, Vec<Affix>>,
    ungrouped: BTreeMap<LevelRange, Affix>,
    zero_weight: usize,
    duplicates: usize,
}

impl AffixSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files an affix under its group. Affixes whose group is empty go to the
    /// ungrouped collection, which holds one affix per level range; the first
    /// one seen for a range stays. Within a group an affix is identified by
    /// its internal and source names.
    pub fn add_affix_by_contents(&mut self, affix: Affix) -> Placement {
        if affix.weight == 0 {
            self.zero_weight += 1;
            return Placement::ZeroWeight;
        }

        let group = affix.to_group();
        if group.canonical().is_empty() {
            return match self.ungrouped.entry(affix.spawn_range) {
                Entry::Vacant(slot) => {
                    slot.insert(affix);
                    Placement::Ungrouped
                }
                Entry::Occupied(_) => {
                    self.duplicates += 1;
                    Placement::Duplicate
                }
            };
        }

        let bucket = self.groups.entry(group).or_default();
        let already = bucket.iter().any(|known| {
            known.internal_name == affix.internal_name && known.source_name == affix.source_name
        });
        if already {
            self.duplicates += 1;
            return Placement::Duplicate;
        }
        bucket.push(affix);
        Placement::Grouped
    }

    pub fn groups(&self) -> impl Iterator<Item = (&AffixGroup, &[Affix])> {
        self.groups
            .iter()
            .map(|(group, affixes)| (group, affixes.as_slice()))
    }

    /// Groups holding more than one affix.
    pub fn similar_groups(&self) -> impl Iterator<Item = (&AffixGroup, &[Affix])> {
        self.groups().filter(|(_, affixes)| affixes.len() > 1)
    }

    pub fn ungrouped(&self) -> impl Iterator<Item = &Affix> {
        self.ungrouped.values()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn ungrouped_count(&self) -> usize {
        self.ungrouped.len()
    }

    pub fn zero_weight_count(&self) -> usize {
        self.zero_weight
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    /// Stored affixes, grouped and ungrouped.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum::<usize>() + self.ungrouped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Extend<Affix> for AffixSet {
    fn extend<I: IntoIterator<Item = Affix>>(&mut self, affixes: I) {
        for affix in affixes {
            self.add_affix_by_contents(affix);
        }
    }
}

pub fn group_affixes<I>(affixes: I) -> AffixSet
where
    I: IntoIterator<Item = Affix>,
{
    let mut set = AffixSet::new();
    set.extend(affixes);
    set
}
