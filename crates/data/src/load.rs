use crate::listing::ListerOptions;
use affixlist_core::{
    parse_affix_text, ParsedAffix, RenderContext, RenderOptions, ReplacementRuleSet,
    TemplateRepository, TemplateTable,
};
use anyhow::Context;
use std::fs;
use std::path::Path;

pub const INSTANT_TEMPLATES_FILE: &str = "affix-detals.txt";
pub const TIMED_TEMPLATES_FILE: &str = "timed-affix-detals.txt";
pub const REPLACEMENTS_FILE: &str = "replace-list.txt";

/// Reads a text file, honouring a UTF-8 or UTF-16 byte order mark. Without a
/// mark the bytes are taken as UTF-8, with invalid sequences replaced.
pub fn read_text(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let (text, encoding, had_errors) = encoding_rs::UTF_8.decode(&bytes);
    if had_errors {
        tracing::warn!(
            path = %path.display(),
            encoding = encoding.name(),
            "replaced malformed byte sequences"
        );
    }
    Ok(text.into_owned())
}

pub fn load_template_table(path: &Path) -> anyhow::Result<TemplateTable> {
    let raw = read_text(path)?;
    let table = TemplateTable::parse(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(table)
}

pub fn load_rule_set(path: &Path) -> anyhow::Result<ReplacementRuleSet> {
    let raw = read_text(path)?;
    let rules =
        ReplacementRuleSet::parse(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(rules)
}

/// Loads the instant and timed template tables and the rule list from `dir`.
/// A missing timed table is treated as empty; the other two are required.
pub fn load_render_context(dir: &Path, options: RenderOptions) -> anyhow::Result<RenderContext> {
    let instant = load_template_table(&dir.join(INSTANT_TEMPLATES_FILE))?;
    let timed_path = dir.join(TIMED_TEMPLATES_FILE);
    let timed = if timed_path.exists() {
        load_template_table(&timed_path)?
    } else {
        tracing::warn!(path = %timed_path.display(), "no timed templates");
        TemplateTable::new()
    };
    let rules = load_rule_set(&dir.join(REPLACEMENTS_FILE))?;
    tracing::debug!(
        dir = %dir.display(),
        instant = instant.len(),
        timed = timed.len(),
        rules = rules.len(),
        "loaded render tables"
    );
    Ok(RenderContext::new(
        TemplateRepository::new(instant, timed),
        rules,
        options,
    ))
}

pub fn load_affix_file(path: &Path) -> anyhow::Result<ParsedAffix> {
    let raw = read_text(path)?;
    Ok(parse_affix_text(&raw, &path.display().to_string()))
}

pub fn load_lister_options(path: &Path) -> anyhow::Result<ListerOptions> {
    let raw = read_text(path)?;
    let options =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(options)
}
