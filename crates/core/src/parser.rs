//! Line-oriented affix and effect records.
//!
//! Keys are matched by substring, top to bottom, first match wins. The
//! ordering of the field tables below is therefore part of the format: keys
//! that contain other keys (`STATNAME` contains `NAME`, `USEOWNERLEVEL`
//! contains `LEVEL:`) must come first.

use crate::affix::{Affix, EquipMode};
use crate::diagnostics::Diagnostic;
use crate::effect::{Effect, INSTANT_SENTINEL};

const TRANSLATE_TAG_LEN: usize = "<TRANSLATE>".len();

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAffix {
    pub affix: Affix,
    pub diagnostics: Vec<Diagnostic>,
}

/// One input line after control characters are removed.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    text: &'a str,
    key: &'a str,
    /// Everything after the first `:`, trimmed; `None` when empty.
    value: Option<&'a str>,
}

impl<'a> Line<'a> {
    fn split(text: &'a str) -> Self {
        match text.split_once(':') {
            Some((key, value)) => {
                let value = value.trim();
                Self {
                    text,
                    key: key.trim(),
                    value: (!value.is_empty()).then_some(value),
                }
            }
            None => Self {
                text,
                key: text.trim(),
                value: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Contains(&'static str),
    Either(&'static str, &'static str),
    ContainsWithout(&'static str, char),
    Key(&'static str),
}

impl Pattern {
    fn matches(self, line: &Line<'_>) -> bool {
        match self {
            Self::Contains(needle) => line.text.contains(needle),
            Self::Either(a, b) => line.text.contains(a) || line.text.contains(b),
            Self::ContainsWithout(needle, banned) => {
                line.text.contains(needle) && !line.text.contains(banned)
            }
            Self::Key(key) => line.key == key,
        }
    }
}

type AffixHandler = fn(&mut Affix, EquipMode, &Line<'_>, &str) -> Option<Diagnostic>;
type EffectHandler = fn(&mut Effect, &str, &str) -> Option<Diagnostic>;

const AFFIX_FIELDS: &[(Pattern, AffixHandler)] = &[
    (Pattern::Contains("<TRANSLATE>"), translation),
    (Pattern::Contains("MIN_SPAWN_RANGE"), |affix, _, line, source| {
        int_field(&mut affix.spawn_range.min_level, "MIN_SPAWN_RANGE", line, source)
    }),
    (Pattern::Contains("MAX_SPAWN_RANGE"), |affix, _, line, source| {
        int_field(&mut affix.spawn_range.max_level, "MAX_SPAWN_RANGE", line, source)
    }),
    (Pattern::Contains("WEIGHT:"), |affix, _, line, source| {
        int_field(&mut affix.weight, "WEIGHT", line, source)
    }),
    (Pattern::Contains("SLOTS_OCCUPY"), |affix, _, line, source| {
        int_field(&mut affix.slots, "SLOTS_OCCUPY", line, source)
    }),
    (Pattern::ContainsWithout("UNITTYPE", '/'), |affix, mode, line, source| {
        match line.value {
            Some(token) => {
                affix.add_equip_type(token, mode);
                None
            }
            None => Some(missing(line, source)),
        }
    }),
    (Pattern::Key("<STRING>NAME"), |affix, _, line, source| match line.value {
        Some(name) => {
            affix.internal_name = Some(name.to_string());
            None
        }
        None => Some(missing(line, source)),
    }),
];

const EFFECT_FIELDS: &[(Pattern, EffectHandler)] = &[
    (Pattern::Contains("STATNAME"), |effect, value, _| {
        effect.group.stat_name = Some(value.to_string());
        None
    }),
    (Pattern::Contains("DAMAGE_TYPE"), |effect, value, _| {
        effect.group.damage_type = value.to_string();
        None
    }),
    (Pattern::Contains("NAME"), |effect, value, _| {
        effect.group.name = Some(value.to_string());
        None
    }),
    (Pattern::Contains("TYPE"), |effect, value, _| {
        effect.group.effect_type = Some(value.to_string());
        None
    }),
    (Pattern::Contains("ACTIVATION"), activation),
    (Pattern::Contains("DURATION"), duration),
    (Pattern::Contains("<FLOAT>MIN:"), |effect, value, source| {
        float_field(&mut effect.min_value, "MIN", value, source)
    }),
    (Pattern::Contains("<FLOAT>MAX:"), |effect, value, source| {
        float_field(&mut effect.max_value, "MAX", value, source)
    }),
    (Pattern::Contains("USEOWNERLEVEL"), |effect, value, _| {
        effect.group.owner_level = parse_bool(value);
        None
    }),
    (Pattern::Contains("LEVEL:"), |effect, value, source| {
        match value.parse() {
            Ok(level) => {
                effect.level = level;
                None
            }
            Err(_) => Some(invalid("LEVEL", value, source)),
        }
    }),
    (Pattern::Contains("EXCLUSIVE"), |effect, value, _| {
        effect.group.exclusive = parse_bool(value);
        None
    }),
    (Pattern::Contains("GRAPHOVERRIDE"), |effect, value, _| {
        effect.group.graph_override = Some(value.to_string());
        None
    }),
    (Pattern::Contains("NOGRAPH"), |effect, value, _| {
        effect.group.use_graph = !parse_bool(value);
        None
    }),
    (Pattern::Contains("STATPERCENT"), |effect, value, source| {
        float_field(&mut effect.stat_percent, "STATPERCENT", value, source)
    }),
    (Pattern::Contains("STATMODIFIERISBONUS"), |effect, value, _| {
        effect.group.is_stat_bonus = parse_bool(value);
        None
    }),
    (Pattern::Contains("RESISTANCE:"), |effect, value, source| {
        float_field(&mut effect.resist, "RESISTANCE", value, source)
    }),
    (Pattern::Contains("FORCE:"), |effect, value, source| {
        float_field(&mut effect.resist, "FORCE", value, source)
    }),
    (Pattern::Contains("MIN_PER"), |effect, value, source| {
        float_field(&mut effect.min_per, "MIN_PER", value, source)
    }),
    (Pattern::Contains("MAX_PER"), |effect, value, source| {
        float_field(&mut effect.max_per, "MAX_PER", value, source)
    }),
    (Pattern::Either("RANGE:", "RADIUS"), |effect, value, source| {
        float_field(&mut effect.range, "RANGE", value, source)
    }),
    (Pattern::Either("MAX_COUNT:", "MAX_TARGETS"), |effect, value, source| {
        float_field(&mut effect.max_count, "MAX_COUNT", value, source)
    }),
    (Pattern::Contains("PULSE_RATE"), |effect, value, source| {
        float_field(&mut effect.pulse, "PULSE_RATE", value, source)
    }),
    (Pattern::Contains("SOAK"), |effect, value, source| {
        float_field(&mut effect.soak_scale, "SOAKSCALE", value, source)
    }),
    // TODO: CHANCE shares the resist slot with RESISTANCE and FORCE; give it
    // its own field once grouping output can change.
    (Pattern::Contains("CHANCE:"), |effect, value, source| {
        float_field(&mut effect.resist, "CHANCE", value, source)
    }),
];

/// Parses one affix definition. Never fails: unusable lines are reported in
/// the returned diagnostics and the affix keeps whatever was read.
pub fn parse_affix<I>(lines: I, source_name: &str) -> ParsedAffix
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut lines = lines.into_iter().map(|line| strip_control(line.as_ref()));
    let mut affix = Affix::new(source_name);
    let mut diagnostics = Vec::new();
    let mut mode = EquipMode::Allowed;

    while let Some(text) = lines.next() {
        if text.contains("[NOT_UNITTYPES]") {
            mode = EquipMode::Excluded;
            continue;
        }
        if text.contains("[UNITTYPES]") {
            mode = EquipMode::Allowed;
            continue;
        }

        let line = Line::split(&text);
        if let Some((_, handler)) = AFFIX_FIELDS
            .iter()
            .find(|(pattern, _)| pattern.matches(&line))
        {
            diagnostics.extend(handler(&mut affix, mode, &line, source_name));
        } else if text.contains("[EFFECT]") {
            let effect = parse_effect(&mut lines, source_name, &mut diagnostics);
            affix.effects.push(effect);
        }
    }

    if let Some(name) = affix.internal_name.clone() {
        for diagnostic in &mut diagnostics {
            diagnostic.attach_affix(&name);
        }
    }
    affix.sort_effects();
    tracing::debug!(
        source = source_name,
        affix = affix.name(),
        effects = affix.effects.len(),
        diagnostics = diagnostics.len(),
        "parsed affix"
    );

    ParsedAffix { affix, diagnostics }
}

/// Convenience wrapper over [`parse_affix`] for a whole file's text.
pub fn parse_affix_text(text: &str, source_name: &str) -> ParsedAffix {
    parse_affix(text.lines(), source_name)
}

fn parse_effect<I>(lines: &mut I, source_name: &str, diagnostics: &mut Vec<Diagnostic>) -> Effect
where
    I: Iterator<Item = String>,
{
    let mut effect = Effect::new(source_name);
    for text in lines.by_ref() {
        if text.contains("[/EFFECT]") {
            return effect;
        }
        let line = Line::split(&text);
        let Some(value) = line.value else {
            continue;
        };
        if let Some((_, handler)) = EFFECT_FIELDS
            .iter()
            .find(|(pattern, _)| pattern.matches(&line))
        {
            diagnostics.extend(handler(&mut effect, value, source_name));
        }
    }
    diagnostics.push(Diagnostic::UnterminatedEffect {
        source_name: source_name.to_string(),
    });
    effect
}

fn translation(affix: &mut Affix, _: EquipMode, line: &Line<'_>, source: &str) -> Option<Diagnostic> {
    let slot = line.key.get(TRANSLATE_TAG_LEN..).unwrap_or_default();
    let Some(value) = line.value else {
        return Some(missing(line, source));
    };
    match slot {
        "SUFFIX" => affix.suffix_text = Some(value.to_string()),
        "PREFIX" => affix.prefix_text = Some(value.to_string()),
        _ => {
            return Some(Diagnostic::UnknownTranslation {
                key: slot.to_string(),
                value: value.to_string(),
                source_name: source.to_string(),
            })
        }
    }
    None
}

fn activation(effect: &mut Effect, value: &str, _: &str) -> Option<Diagnostic> {
    match value {
        "DYNAMIC" | "PASSIVE" => None,
        "TRANSFER" => {
            effect.group.is_transfer = true;
            None
        }
        _ => Some(Diagnostic::UnknownActivation {
            value: value.to_string(),
            effect: effect.group.name.clone(),
            affix: None,
        }),
    }
}

fn duration(effect: &mut Effect, value: &str, source: &str) -> Option<Diagnostic> {
    let (duration, timed) = match value {
        "ALWAYS" => (f64::INFINITY, false),
        "INSTANT" => (f64::NAN, false),
        "PERCENT" => {
            effect.duration = f64::NAN;
            effect.group.has_duration = false;
            return Some(Diagnostic::PercentDuration {
                source_name: source.to_string(),
            });
        }
        "0" => (0.0, false),
        other if other.eq_ignore_ascii_case("instant") => (INSTANT_SENTINEL, true),
        // Only finite values count as timed.
        other => match parse_double(other) {
            Some(seconds) => (seconds, seconds.is_finite()),
            None => return Some(invalid("DURATION", other, source)),
        },
    };
    effect.duration = duration;
    effect.group.has_duration = timed;
    None
}

fn int_field(slot: &mut i32, field: &'static str, line: &Line<'_>, source: &str) -> Option<Diagnostic> {
    let Some(value) = line.value else {
        return Some(missing(line, source));
    };
    match value.parse() {
        Ok(parsed) => {
            *slot = parsed;
            None
        }
        Err(_) => Some(invalid(field, value, source)),
    }
}

fn float_field(slot: &mut f64, field: &'static str, value: &str, source: &str) -> Option<Diagnostic> {
    match parse_double(value) {
        Some(parsed) => {
            *slot = parsed;
            None
        }
        None => Some(invalid(field, value, source)),
    }
}

/// Decimal floats as they appear in data files, including the `f`/`d`
/// type suffixes and the `Infinity`/`NaN` spellings.
fn parse_double(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let unsuffixed = trimmed
        .strip_suffix(['f', 'F', 'd', 'D'])
        .filter(|rest| !rest.is_empty() && !rest.ends_with(|c: char| c.is_ascii_alphabetic()))
        .unwrap_or(trimmed);
    unsuffixed.parse().ok()
}

/// True only for a case-insensitive `true`.
fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn strip_control(line: &str) -> String {
    line.chars().filter(|c| !c.is_control()).collect()
}

fn invalid(field: &'static str, value: &str, source: &str) -> Diagnostic {
    Diagnostic::InvalidNumber {
        field,
        value: value.to_string(),
        affix: None,
        source_name: source.to_string(),
    }
}

fn missing(line: &Line<'_>, source: &str) -> Diagnostic {
    Diagnostic::MissingValue {
        key: line.key.to_string(),
        source_name: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_colon_only() {
        let line = Line::split("<TRANSLATE>SUFFIX:[ITEM] of Time: Past ");
        assert_eq!(line.key, "<TRANSLATE>SUFFIX");
        assert_eq!(line.value, Some("[ITEM] of Time: Past"));
        assert_eq!(Line::split("<STRING>NAME:").value, None);
    }

    #[test]
    fn doubles_accept_type_suffixes() {
        assert_eq!(parse_double("1.5f"), Some(1.5));
        assert_eq!(parse_double("2D"), Some(2.0));
        assert_eq!(parse_double("-3"), Some(-3.0));
        assert_eq!(parse_double("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_double("ten"), None);
    }

    #[test]
    fn booleans_are_true_only_when_spelled_true() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("true"));
        assert!(!parse_bool("1"));
        assert!(!parse_bool("yes"));
    }

    #[test]
    fn control_characters_are_removed() {
        assert_eq!(strip_control("\t<STRING>NAME:FOO\r"), "<STRING>NAME:FOO");
    }
}
