use thiserror::Error;

/// A recoverable problem found while parsing an affix or rendering an effect.
///
/// Nothing here aborts a batch: the offending field keeps its default and the
/// diagnostic is handed back to the caller next to the partial record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    #[error("malformed {field} value '{value}' in {source_name} (affix {})", display_affix(.affix))]
    InvalidNumber {
        field: &'static str,
        value: String,
        affix: Option<String>,
        source_name: String,
    },
    #[error("missing value for {key} in {source_name}")]
    MissingValue { key: String, source_name: String },
    #[error("malformed affix translation: ({key}) ({value}) ({source_name})")]
    UnknownTranslation {
        key: String,
        value: String,
        source_name: String,
    },
    #[error("malformed activation type: ({value}) ({}) ({})", display_affix(.effect), display_affix(.affix))]
    UnknownActivation {
        value: String,
        effect: Option<String>,
        affix: Option<String>,
    },
    #[error("punting on DURATION:PERCENT for {source_name}")]
    PercentDuration { source_name: String },
    #[error("unterminated effect block in {source_name}")]
    UnterminatedEffect { source_name: String },
    #[error("unresolved clause marker in details for effect {effect_type}: {text}")]
    UnresolvedClause { effect_type: String, text: String },
    #[error("details for {}effect {effect_type} are malformatted (contains < or >): {text}", timed_label(.timed))]
    MalformedTemplate {
        effect_type: String,
        timed: bool,
        text: String,
    },
    #[error("improvised details for timed {effect_type}")]
    ImprovisedTemplate { effect_type: String },
    #[error("{}{summary}", timed_prefix(.timed))]
    MissingTemplate {
        effect_type: String,
        timed: bool,
        summary: String,
    },
    #[error("bad format string for effect {effect_type}: {message}")]
    BadFormat {
        effect_type: String,
        message: String,
    },
}

impl Diagnostic {
    /// Fills in the affix name on diagnostics raised before the name line was
    /// seen.
    pub fn attach_affix(&mut self, name: &str) {
        match self {
            Diagnostic::InvalidNumber { affix, .. } | Diagnostic::UnknownActivation { affix, .. } => {
                if affix.is_none() {
                    *affix = Some(name.to_string());
                }
            }
            _ => {}
        }
    }

    pub fn is_render_problem(&self) -> bool {
        matches!(
            self,
            Diagnostic::UnresolvedClause { .. }
                | Diagnostic::MalformedTemplate { .. }
                | Diagnostic::ImprovisedTemplate { .. }
                | Diagnostic::MissingTemplate { .. }
                | Diagnostic::BadFormat { .. }
        )
    }
}

fn display_affix(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("<unnamed>")
}

fn timed_label(timed: &bool) -> &'static str {
    if *timed {
        "timed "
    } else {
        ""
    }
}

fn timed_prefix(timed: &bool) -> &'static str {
    if *timed {
        "TIMED: "
    } else {
        ""
    }
}
