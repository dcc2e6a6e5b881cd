use std::borrow::Cow;
use std::collections::BTreeMap;
use thiserror::Error;

/// Appended to an instant template when a timed effect has no timed template
/// of its own. A space is put in front of it unless the template already ends
/// in whitespace, so `Slows` becomes `Slows for <DUR> seconds`.
pub const IMPROVISED_TIMED_SUFFIX: &str = "for <DUR> seconds";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("line {line}: no template body for '{key}' before end of input")]
    MissingBody { line: usize, key: String },
    #[error("line {line}: malformed alias line '{text}'")]
    MalformedAlias { line: usize, text: String },
    #[error("line {line}: alias '{alias}' refers to unknown template '{target}'")]
    UnknownAlias {
        line: usize,
        alias: String,
        target: String,
    },
}

/// Mapping from effect-type token to its raw format template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateTable {
    entries: BTreeMap<String, String>,
}

impl TemplateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(src: &str) -> Result<Self, TemplateError> {
        let mut table = Self::new();
        table.extend_from(src)?;
        Ok(table)
    }

    /// Reads key/body line pairs. Blank lines and `#` comments are skipped
    /// before a key; comments are skipped before a body. A line
    /// `alias NEW OLD` reuses the body already loaded for `OLD` and has no
    /// body line of its own.
    pub fn extend_from(&mut self, src: &str) -> Result<(), TemplateError> {
        let mut lines = src.lines().enumerate();
        while let Some((idx, raw)) = lines.next() {
            let key = raw.trim();
            if key.is_empty() || key.starts_with('#') {
                continue;
            }
            if key.starts_with("alias ") || key.starts_with("alias\t") {
                self.add_alias(idx + 1, key)?;
                continue;
            }
            let body = lines
                .by_ref()
                .map(|(_, line)| line.trim())
                .find(|line| !line.starts_with('#'))
                .ok_or_else(|| TemplateError::MissingBody {
                    line: idx + 1,
                    key: key.to_string(),
                })?;
            self.entries.insert(key.to_string(), body.to_string());
        }
        Ok(())
    }

    fn add_alias(&mut self, line: usize, text: &str) -> Result<(), TemplateError> {
        let parts: Vec<&str> = text.split_whitespace().collect();
        let [_, alias, target] = parts.as_slice() else {
            return Err(TemplateError::MalformedAlias {
                line,
                text: text.to_string(),
            });
        };
        let body = self
            .entries
            .get(*target)
            .cloned()
            .ok_or_else(|| TemplateError::UnknownAlias {
                line,
                alias: alias.to_string(),
                target: target.to_string(),
            })?;
        self.entries.insert(alias.to_string(), body);
        Ok(())
    }

    pub fn insert(&mut self, key: impl Into<String>, body: impl Into<String>) {
        self.entries.insert(key.into(), body.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, body)| (key.as_str(), body.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLookup<'a> {
    pub text: Cow<'a, str>,
    /// Built from the instant template because no timed one exists.
    pub improvised: bool,
}

/// Instant and timed template tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateRepository {
    pub instant: TemplateTable,
    pub timed: TemplateTable,
}

impl TemplateRepository {
    pub fn new(instant: TemplateTable, timed: TemplateTable) -> Self {
        Self { instant, timed }
    }

    pub fn lookup(&self, effect_type: &str, timed: bool) -> Option<TemplateLookup<'_>> {
        if !timed {
            return self.instant.get(effect_type).map(|text| TemplateLookup {
                text: Cow::Borrowed(text),
                improvised: false,
            });
        }
        if let Some(text) = self.timed.get(effect_type) {
            return Some(TemplateLookup {
                text: Cow::Borrowed(text),
                improvised: false,
            });
        }
        self.instant.get(effect_type).map(|text| TemplateLookup {
            text: Cow::Owned(improvise_timed(text)),
            improvised: true,
        })
    }
}

fn improvise_timed(instant: &str) -> String {
    if instant.is_empty() || instant.ends_with(char::is_whitespace) {
        format!("{}{}", instant, IMPROVISED_TIMED_SUFFIX)
    } else {
        format!("{} {}", instant, IMPROVISED_TIMED_SUFFIX)
    }
}
