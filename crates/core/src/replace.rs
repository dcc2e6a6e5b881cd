use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_PRIORITY: i32 = 1;
pub const DEFAULT_STAGE: u32 = 1;

/// A regex find/replace applied to raw templates before clause resolution.
///
/// Replacement text uses `$n` / `${name}` group references and `\` escapes.
#[derive(Debug, Clone)]
pub struct ReplacementRule {
    pub name: String,
    pub find: String,
    pub replace: String,
    /// Lower priorities apply first.
    pub priority: i32,
    pub stage: u32,
    /// Part of the final rule list when more than one stage exists.
    pub external: bool,
    /// Source line of the find pattern, 0 when built in code.
    pub line: usize,
    regex: Regex,
    replacement: String,
}

impl ReplacementRule {
    pub fn new(find: &str, replace: &str) -> Result<Self, String> {
        let regex = Regex::new(find).map_err(|err| err.to_string())?;
        let replacement = translate_replacement(replace, regex.captures_len() - 1)?;
        Ok(Self {
            name: find.to_string(),
            find: find.to_string(),
            replace: replace.to_string(),
            priority: DEFAULT_PRIORITY,
            stage: DEFAULT_STAGE,
            external: true,
            line: 0,
            regex,
            replacement,
        })
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_stage(mut self, stage: u32) -> Self {
        self.stage = stage;
        self
    }

    pub fn internal(mut self) -> Self {
        self.external = false;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn set_replacement(&mut self, replace: String) -> Result<(), String> {
        self.replacement = translate_replacement(&replace, self.regex.captures_len() - 1)?;
        self.replace = replace;
        Ok(())
    }

    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.regex.replace_all(text, self.replacement.as_str())
    }
}

impl fmt::Display for ReplacementRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s/{}/{}/p{}", self.find, self.replace, self.priority)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, rule {rule}: {message}\n\t{}", describe_text(.text))]
pub struct RuleError {
    pub line: usize,
    /// Number of rules started when the error was found.
    pub rule: usize,
    pub message: String,
    pub text: Option<String>,
}

fn describe_text(text: &Option<String>) -> String {
    match text.as_deref() {
        None => "No associated line".to_string(),
        Some("") => "Text of line was empty".to_string(),
        Some(text) => format!("Text of line was: {}", text),
    }
}

/// Every problem found while loading a rule list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} occurred parsing replacement rules:\n{}", plural(.errors), join_errors(.errors))]
pub struct RuleSetError {
    pub errors: Vec<RuleError>,
}

fn plural(errors: &[RuleError]) -> &'static str {
    if errors.len() == 1 {
        "An error"
    } else {
        "Errors"
    }
}

fn join_errors(errors: &[RuleError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The merged, priority-ordered rule list consulted while rendering.
#[derive(Debug, Clone, Default)]
pub struct ReplacementRuleSet {
    rules: Vec<ReplacementRule>,
}

impl ReplacementRuleSet {
    /// Compiles rules stage by stage. Each stage's replacement text is first
    /// rewritten by every rule of the earlier stages. With a single stage all
    /// rules are kept; otherwise only external ones. Ties in priority keep
    /// stage order, then input order.
    pub fn new(rules: Vec<ReplacementRule>) -> Result<Self, RuleSetError> {
        let (set, errors) = Self::compile(rules);
        if errors.is_empty() {
            Ok(set)
        } else {
            Err(RuleSetError { errors })
        }
    }

    /// Parses a rule list, failing with every error found.
    pub fn parse(src: &str) -> Result<Self, RuleSetError> {
        let (set, errors) = Self::parse_lenient(src);
        if errors.is_empty() {
            Ok(set)
        } else {
            Err(RuleSetError { errors })
        }
    }

    /// Parses a rule list, keeping every rule that could be built.
    pub fn parse_lenient(src: &str) -> (Self, Vec<RuleError>) {
        let (rules, mut errors) = read_rules(src);
        let (set, compile_errors) = Self::compile(rules);
        errors.extend(compile_errors);
        (set, errors)
    }

    fn compile(rules: Vec<ReplacementRule>) -> (Self, Vec<RuleError>) {
        let mut errors = Vec::new();
        let mut stages: BTreeMap<u32, Vec<ReplacementRule>> = BTreeMap::new();
        for rule in rules {
            stages.entry(rule.stage).or_default().push(rule);
        }
        let single_stage = stages.len() <= 1;

        let mut pool: Vec<ReplacementRule> = Vec::new();
        for (_, mut stage_rules) in stages {
            if !pool.is_empty() {
                for (idx, rule) in stage_rules.iter_mut().enumerate() {
                    let rewritten = apply_rules(&pool, &rule.replace).into_owned();
                    if rewritten == rule.replace {
                        continue;
                    }
                    if let Err(message) = rule.set_replacement(rewritten) {
                        errors.push(RuleError {
                            line: rule.line,
                            rule: idx + 1,
                            message,
                            text: Some(rule.to_string()),
                        });
                    }
                }
            }
            pool.extend(stage_rules);
            pool.sort_by_key(|rule| rule.priority);
        }

        let rules = if single_stage {
            pool
        } else {
            pool.into_iter().filter(|rule| rule.external).collect()
        };
        (Self { rules }, errors)
    }

    pub fn rules(&self) -> &[ReplacementRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        apply_rules(&self.rules, text)
    }

    /// Same as [`ReplacementRuleSet::apply`], logging every rule that changes
    /// the text.
    pub fn apply_traced(&self, key: &str, text: &str) -> String {
        let mut current = text.to_string();
        for rule in &self.rules {
            let next = rule.apply(&current).into_owned();
            if next != current {
                tracing::trace!(template = key, rule = %rule, before = %current, after = %next, "applied replacement");
                current = next;
            }
        }
        current
    }
}

fn apply_rules<'a>(rules: &[ReplacementRule], text: &'a str) -> Cow<'a, str> {
    let mut out = Cow::Borrowed(text);
    for rule in rules {
        let replaced = match rule.apply(&out) {
            Cow::Owned(text) => Some(text),
            Cow::Borrowed(_) => None,
        };
        if let Some(text) = replaced {
            out = Cow::Owned(text);
        }
    }
    out
}

#[derive(Debug)]
struct Directives {
    priority: i32,
    stage: u32,
    external: bool,
    name: Option<String>,
}

impl Default for Directives {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            stage: DEFAULT_STAGE,
            external: true,
            name: None,
        }
    }
}

impl Directives {
    fn apply(&mut self, directive: &str) -> Result<(), String> {
        let mut parts = directive.trim().splitn(2, char::is_whitespace);
        let keyword = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).unwrap_or_default();
        match keyword {
            "priority" => {
                self.priority = arg
                    .parse()
                    .map_err(|_| format!("invalid priority '{}'", arg))?;
            }
            "stage" => {
                self.stage = arg.parse().map_err(|_| format!("invalid stage '{}'", arg))?;
            }
            "external" => self.external = true,
            "internal" => self.external = false,
            "name" => {
                if arg.is_empty() {
                    return Err("name directive requires a name".to_string());
                }
                self.name = Some(arg.to_string());
            }
            other => return Err(format!("unknown directive '{}'", other)),
        }
        Ok(())
    }
}

fn read_rules(src: &str) -> (Vec<ReplacementRule>, Vec<RuleError>) {
    let mut rules = Vec::new();
    let mut errors = Vec::new();
    let mut directives = Directives::default();
    let mut started = 0;
    let mut lines = src.lines().enumerate();

    while let Some((idx, raw)) = lines.next() {
        let find = raw.trim();
        if find.is_empty() {
            continue;
        }
        if let Some(directive) = find.strip_prefix("#!") {
            if let Err(message) = directives.apply(directive) {
                errors.push(RuleError {
                    line: idx + 1,
                    rule: started,
                    message,
                    text: Some(find.to_string()),
                });
            }
            continue;
        }
        if find.starts_with('#') {
            continue;
        }

        started += 1;
        let body = lines
            .by_ref()
            .map(|(_, line)| line.trim())
            .find(|line| !line.starts_with('#'));
        let Some(body) = body else {
            errors.push(RuleError {
                line: idx + 1,
                rule: started,
                message: format!(
                    "ran out of input looking for replacement body for raw name {}",
                    find
                ),
                text: None,
            });
            break;
        };

        match ReplacementRule::new(find, body) {
            Ok(rule) => {
                let mut rule = rule
                    .with_priority(directives.priority)
                    .with_stage(directives.stage);
                rule.external = directives.external;
                rule.line = idx + 1;
                if let Some(name) = directives.name.take() {
                    rule.name = name;
                }
                rules.push(rule);
            }
            Err(message) => errors.push(RuleError {
                line: idx + 1,
                rule: started,
                message,
                text: Some(find.to_string()),
            }),
        }
    }

    (rules, errors)
}

/// Converts `$n`, `${name}` and `\x` replacement syntax into the form the
/// regex engine expects, checking group references against `groups`.
fn translate_replacement(raw: &str, groups: usize) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('$') => out.push_str("$$"),
                Some(other) => out.push(other),
                None => return Err("character to be escaped is missing".to_string()),
            },
            '$' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) if c.is_ascii_alphanumeric() || c == '_' => name.push(c),
                            _ => {
                                return Err(
                                    "named capturing group is missing trailing '}'".to_string()
                                )
                            }
                        }
                    }
                    if name.is_empty() {
                        return Err("named capturing group has 0 length name".to_string());
                    }
                    out.push_str(&format!("${{{}}}", name));
                    continue;
                }
                let Some(first) = chars.peek().and_then(|c| c.to_digit(10)) else {
                    return Err("illegal group reference".to_string());
                };
                chars.next();
                let mut group = first as usize;
                while let Some(next) = chars.peek().and_then(|c| c.to_digit(10)) {
                    let candidate = group * 10 + next as usize;
                    if candidate > groups {
                        break;
                    }
                    group = candidate;
                    chars.next();
                }
                if group > groups {
                    return Err(format!("no group {}", group));
                }
                out.push_str(&format!("${{{}}}", group));
            }
            other => out.push(other),
        }
    }
    Ok(out)
}
