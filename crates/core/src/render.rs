use crate::affix::{Affix, AffixKind};
use crate::diagnostics::Diagnostic;
use crate::effect::Effect;
use crate::format::{format_fixed, format_template, pin_ordinary_indices, FormatArg, FormatError};
use crate::replace::ReplacementRuleSet;
use crate::templates::TemplateRepository;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::LazyLock;

/// `<C|A|B>`: `A` for non-positive magnitudes, `B` for non-negative ones.
static CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<C\|([^|>]+)\|([^|>]+)>").expect("clause pattern"));
/// `<MC|A|B>`: the same choice made on the per-target magnitudes.
static PER_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<MC\|([^|>]+)\|([^|>]+)>").expect("per-target clause pattern"));

const UNTYPED: &str = "<untyped>";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Append the source file to effects that have no template.
    pub add_file_name: bool,
}

/// Everything rendering needs, loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub templates: TemplateRepository,
    pub rules: ReplacementRuleSet,
    pub options: RenderOptions,
}

impl RenderContext {
    pub fn new(
        templates: TemplateRepository,
        rules: ReplacementRuleSet,
        options: RenderOptions,
    ) -> Self {
        Self {
            templates,
            rules,
            options,
        }
    }

    /// Renders one effect to prose. Problems are pushed to `sink`; the text
    /// falls back to a summary of the raw parameters when no usable template
    /// exists.
    pub fn render_effect(&self, effect: &Effect, sink: &mut Vec<Diagnostic>) -> String {
        let mut out = String::new();
        if effect.group.is_transfer {
            out.push_str("Inflict on Hit: ");
        }

        let effect_type = effect.effect_type().unwrap_or(UNTYPED);
        let timed = effect.has_duration();
        let lookup = effect
            .effect_type()
            .and_then(|key| self.templates.lookup(key, timed));

        match lookup {
            Some(lookup) => {
                if lookup.improvised {
                    sink.push(Diagnostic::ImprovisedTemplate {
                        effect_type: effect_type.to_string(),
                    });
                }
                match self.interpolate(effect, &lookup.text, sink) {
                    Ok(text) => out.push_str(&text),
                    Err(err) => {
                        sink.push(Diagnostic::BadFormat {
                            effect_type: effect_type.to_string(),
                            message: err.to_string(),
                        });
                        out.push_str(&self.parameter_summary(effect));
                    }
                }
            }
            None => {
                out.push_str(&self.parameter_summary(effect));
                sink.push(Diagnostic::MissingTemplate {
                    effect_type: effect_type.to_string(),
                    timed,
                    summary: out.clone(),
                });
            }
        }

        push_descriptors(&mut out, effect);
        out
    }

    /// Every effect of the affix, one rendering per line.
    pub fn render_affix(&self, affix: &Affix, sink: &mut Vec<Diagnostic>) -> String {
        affix
            .effects
            .iter()
            .map(|effect| self.render_effect(effect, sink))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full multi-line description of an affix.
    pub fn describe_affix(&self, affix: &Affix, sink: &mut Vec<Diagnostic>) -> String {
        let name = affix.internal_name.as_deref();
        let mut out = String::new();

        if affix.kind == AffixKind::Socketable {
            out.push_str("Socketable ");
        } else if affix.kind == AffixKind::Personal
            || name.is_some_and(|name| name.starts_with("HERO_"))
        {
            out.push_str("Personal ");
        } else if name.is_some_and(|name| name.starts_with("MAP_")) {
            out.push_str("Area ");
        }
        if affix.kind == AffixKind::Enchantment {
            out.push_str("Enchantment: ");
        } else {
            out.push_str("Affix: ");
        }
        out.push_str(affix.name());
        out.push('\n');

        if let Some(suffix) = &affix.suffix_text {
            out.push_str(&format!("\tSuffix: {}\n", suffix));
        }
        if let Some(prefix) = &affix.prefix_text {
            out.push_str(&format!("\tPrefix: {}\n", prefix));
        }
        out.push_str(&format!("\t{}\n", affix.spawn_range));
        out.push_str(&format!("\tSpawn Weight: {}\n", affix.weight));
        if affix.slots == 0 {
            out.push_str("\tOccupies no slots\n");
        } else {
            out.push_str(&format!("\tSlots: {}\n", affix.slots));
        }

        if !affix.equip_types.is_empty() {
            let label = match affix.kind {
                AffixKind::Socketable => "Socketable Into",
                AffixKind::Enchantment => "Enchants Onto",
                _ => "Spawns On",
            };
            push_list(&mut out, label, &affix.equip_types);
        }
        if !matches!(affix.kind, AffixKind::Socketable | AffixKind::Enchantment) {
            push_list(&mut out, "Can't Spawn On", &affix.nonequip_types);
        }
        push_list(&mut out, "Enchantment Sources", &affix.enchant_sources);
        push_list(&mut out, "Socketable Types", &affix.socketable_types);

        if !affix.effects.is_empty() {
            out.push_str("\tEffects: ");
            for effect in &affix.effects {
                out.push_str("\n\t\t");
                out.push_str(&self.render_effect(effect, sink));
            }
            out.push('\n');
        }
        out
    }

    /// Name, spawn window, weight and one line per effect.
    pub fn describe_affix_short(&self, affix: &Affix, sink: &mut Vec<Diagnostic>) -> String {
        let mut out = format!(
            "{} ({}, weight {})\n",
            affix.name(),
            affix.spawn_range,
            affix.weight
        );
        for effect in &affix.effects {
            out.push('\t');
            out.push_str(&self.render_effect(effect, sink));
            out.push('\n');
        }
        out
    }

    /// Runs the rule set over every loaded template and reports the ones that
    /// still carry stray `<` or `>` once clause markers are discounted.
    pub fn sanity_check(&self) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        for (timed, table) in [(false, &self.templates.instant), (true, &self.templates.timed)] {
            for (key, body) in table.iter() {
                let replaced = self.rules.apply_traced(key, body);
                let without_clauses = CLAUSE.replace_all(&replaced, "");
                let without_clauses = PER_CLAUSE.replace_all(&without_clauses, "");
                if without_clauses.contains(['<', '>']) {
                    found.push(Diagnostic::MalformedTemplate {
                        effect_type: key.to_string(),
                        timed,
                        text: replaced,
                    });
                }
            }
        }
        found
    }

    fn interpolate(
        &self,
        effect: &Effect,
        template: &str,
        sink: &mut Vec<Diagnostic>,
    ) -> Result<String, FormatError> {
        let effect_type = effect.effect_type().unwrap_or(UNTYPED);
        let expanded = self.rules.apply(template);
        let pinned = pin_ordinary_indices(&expanded);
        let resolved = resolve_clauses(&pinned, &CLAUSE, effect.min_value, effect.max_value);
        let resolved = resolve_clauses(&resolved, &PER_CLAUSE, effect.min_per, effect.max_per);

        if CLAUSE.is_match(&resolved) || PER_CLAUSE.is_match(&resolved) {
            sink.push(Diagnostic::UnresolvedClause {
                effect_type: effect_type.to_string(),
                text: resolved.to_string(),
            });
        } else if resolved.contains(['<', '>']) {
            sink.push(Diagnostic::MalformedTemplate {
                effect_type: effect_type.to_string(),
                timed: effect.has_duration(),
                text: resolved.to_string(),
            });
        }

        format_template(&resolved, &format_args(effect))
    }

    fn parameter_summary(&self, effect: &Effect) -> String {
        let mut out = format!(
            "No effect details for effect {} with parameters (min {}, max {}, dur {}, type {}, level {})",
            effect.effect_type().unwrap_or(UNTYPED),
            format_fixed(effect.min_value, 2),
            format_fixed(effect.max_value, 2),
            format_fixed(effect.duration, 2),
            effect.group.damage_type.to_lowercase(),
            effect.level
        );
        if self.options.add_file_name {
            out.push_str(" from file ");
            out.push_str(&effect.source_file);
        }
        out
    }
}

fn resolve_clauses<'a>(text: &'a str, pattern: &Regex, low: f64, high: f64) -> Cow<'a, str> {
    if low <= 0.0 && high <= 0.0 {
        pattern.replace_all(text, "${1}")
    } else if low >= 0.0 && high >= 0.0 {
        pattern.replace_all(text, "${2}")
    } else {
        Cow::Borrowed(text)
    }
}

/// The positional parameters every template is written against.
fn format_args(effect: &Effect) -> [FormatArg; 12] {
    [
        FormatArg::Float(effect.min_value.abs()),
        FormatArg::Float(effect.max_value.abs()),
        FormatArg::Float(effect.duration),
        FormatArg::Text(Some(effect.group.damage_type.to_lowercase())),
        FormatArg::Int(i64::from(effect.level)),
        FormatArg::Float(effect.resist),
        FormatArg::Text(effect.group.name.clone()),
        FormatArg::Float(effect.min_per.abs()),
        FormatArg::Float(effect.max_per.abs()),
        FormatArg::Float(effect.range),
        FormatArg::Float(effect.max_count),
        FormatArg::Float(effect.pulse),
    ]
}

fn push_descriptors(out: &mut String, effect: &Effect) {
    let group = &effect.group;
    if let Some(name) = &group.name {
        out.push_str(&format!(" (named {})", name));
    }
    if group.exclusive {
        out.push_str(" (Exclusive)");
    }
    if let Some(graph) = &group.graph_override {
        out.push_str(&format!(" (Uses {} graph)", graph));
    }
    if group.owner_level {
        out.push_str(" (Uses owner level for graph)");
    }
    if effect.soak_scale != 1.0 {
        let reduced = format_fixed((1.0 - effect.soak_scale) * 100.0, 2);
        out.push_str(&format!(" ({}% reduced effectiveness of armor)", reduced));
    }
    if effect.level != -1 {
        out.push_str(&format!(" (Level {})", effect.level));
    }
    if let Some(stat) = &group.stat_name {
        out.push_str(&format!(" ({}% of stat {}", format_fixed(effect.stat_percent, 2), stat));
        out.push_str(if group.is_stat_bonus { ", as bonus)" } else { ")" });
    }
    if !group.use_graph {
        out.push_str(" (Ignoring graph)");
    }
}

fn push_list(out: &mut String, label: &str, items: &[String]) {
    if !items.is_empty() {
        out.push_str(&format!("\t{}: [{}]\n", label, items.join(", ")));
    }
}
