use crate::load::load_affix_file;
use affixlist_core::{Affix, AffixSet, Diagnostic, RenderContext, RenderOptions};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

/// Splits a trailing number off an internal name: `RING_ARMOR_12` belongs to
/// `RING_ARMOR_`.
static NAME_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?_?)\d+$").expect("name group pattern"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameMode {
    #[default]
    All,
    Unnamed,
    Named,
}

impl NameMode {
    fn admits(self, affix: &Affix) -> bool {
        match self {
            Self::All => true,
            Self::Unnamed => !affix.is_named(),
            Self::Named => affix.is_named(),
        }
    }
}

impl FromStr for NameMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "unnamed" => Ok(Self::Unnamed),
            "named" => Ok(Self::Named),
            other => Err(format!("unknown name mode '{}'", other)),
        }
    }
}

impl fmt::Display for NameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Unnamed => "unnamed",
            Self::Named => "named",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListerOptions {
    pub name_mode: NameMode,
    /// Say nothing at all about zero-weight affixes.
    pub omit_zero_weight: bool,
    /// Describe zero-weight affixes like any other.
    pub list_zero_weight: bool,
    pub add_file_name: bool,
    pub similar_report: bool,
}

impl ListerOptions {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            add_file_name: self.add_file_name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingStats {
    pub files: usize,
    pub read_failures: usize,
    pub affixes: usize,
    pub named: usize,
    pub unnamed: usize,
    pub zero_weight: usize,
    pub effects: usize,
    pub diagnostics: usize,
    pub distinct_name_groups: usize,
    pub actual_name_groups: usize,
    pub nongrouped: usize,
}

impl fmt::Display for ListingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} affixes ({} named, {} unnamed, {} zero-weight) ({} effects) \
             ({} distinct groups, {} actual groups, {} nongrouped affixes) \
             out of {} files ({} unreadable, {} diagnostics)",
            self.affixes,
            self.named,
            self.unnamed,
            self.zero_weight,
            self.effects,
            self.distinct_name_groups,
            self.actual_name_groups,
            self.nongrouped,
            self.files,
            self.read_failures,
            self.diagnostics
        )
    }
}

/// One parsed affix file and what the listing says about it.
#[derive(Debug, Clone)]
pub struct ListedAffix {
    pub affix: Affix,
    /// `None` when the affix is filtered out of the listing.
    pub text: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub entries: Vec<ListedAffix>,
    pub set: AffixSet,
    pub stats: ListingStats,
    /// Internal names by their numbered-name prefix.
    pub name_groups: BTreeMap<String, Vec<String>>,
    pub warnings: Vec<String>,
}

impl Listing {
    /// Listed texts in input order, blank-line separated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for text in self.entries.iter().filter_map(|entry| entry.text.as_deref()) {
            out.push('\n');
            out.push_str(text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}

/// Parses and describes every file, collecting them into an [`AffixSet`].
/// Unreadable files become warnings; the pass always completes.
pub fn list_affixes<P: AsRef<Path>>(
    paths: &[P],
    ctx: &RenderContext,
    options: &ListerOptions,
) -> Listing {
    let mut listing = Listing::default();
    let mut seen_groups = BTreeSet::new();

    for path in paths {
        let path = path.as_ref();
        listing.stats.files += 1;
        let parsed = match load_affix_file(path) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(path = %path.display(), "{:#}", err);
                listing.stats.read_failures += 1;
                listing.warnings.push(format!("{:#}", err));
                continue;
            }
        };

        let affix = parsed.affix;
        let mut diagnostics = parsed.diagnostics;
        listing.stats.affixes += 1;
        listing.stats.effects += affix.effects.len();

        if let Some(name) = affix.internal_name.as_deref().filter(|_| affix.weight != 0) {
            let (group, numbered) = match NAME_GROUP.captures(name) {
                Some(caps) => (caps[1].to_string(), true),
                None => (name.to_string(), false),
            };
            seen_groups.insert(group.clone());
            if numbered {
                listing
                    .name_groups
                    .entry(group)
                    .or_default()
                    .push(name.to_string());
            } else {
                listing.stats.nongrouped += 1;
            }
        }

        let text = if affix.weight == 0 && !options.list_zero_weight {
            (!options.omit_zero_weight)
                .then(|| format!("Affix {} has zero spawn weight", affix.name()))
        } else {
            if affix.is_named() {
                listing.stats.named += 1;
            } else {
                listing.stats.unnamed += 1;
            }
            options
                .name_mode
                .admits(&affix)
                .then(|| ctx.describe_affix(&affix, &mut diagnostics))
        };

        for diagnostic in &diagnostics {
            tracing::warn!(source = %affix.source_name, "{}", diagnostic);
        }
        listing.stats.diagnostics += diagnostics.len();

        listing.set.add_affix_by_contents(affix.clone());
        listing.entries.push(ListedAffix {
            affix,
            text,
            diagnostics,
        });
    }

    listing.stats.zero_weight = listing.set.zero_weight_count();
    listing.stats.distinct_name_groups = seen_groups.len();
    listing.stats.actual_name_groups = listing.name_groups.len();
    for (group, members) in &listing.name_groups {
        tracing::debug!(group = %group, members = ?members, "name group");
    }
    listing
}
