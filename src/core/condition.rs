//! Loop termination conditions

use crate::core::context::{PipelineContext, StateView};
use regex::Regex;
use std::sync::Arc;

/// Pattern for matching agent output text
#[derive(Debug, Clone)]
pub enum ConditionPattern {
    /// Simple string contains match
    Simple(String),
    /// Regular expression match
    Regex(Regex),
}

impl ConditionPattern {
    /// Build a pattern, compiling it as a regex when asked.
    ///
    /// An invalid regex falls back to a plain substring match.
    pub fn new(pattern: &str, use_regex: bool) -> Self {
        if use_regex {
            match Regex::new(pattern) {
                Ok(regex) => ConditionPattern::Regex(regex),
                Err(_) => ConditionPattern::Simple(pattern.to_string()),
            }
        } else {
            ConditionPattern::Simple(pattern.to_string())
        }
    }

    /// Check if the pattern matches the given text
    pub fn matches(&self, text: &str) -> bool {
        match self {
            ConditionPattern::Simple(pattern) => text.contains(pattern),
            ConditionPattern::Regex(regex) => regex.is_match(text),
        }
    }

    fn display(&self) -> String {
        match self {
            ConditionPattern::Simple(s) => s.clone(),
            ConditionPattern::Regex(r) => format!("[regex: {}]", r.as_str()),
        }
    }
}

type Predicate = Arc<dyn Fn(&StateView<'_>) -> bool + Send + Sync>;

/// Convergence check evaluated against the context after every loop pass.
///
/// The predicate only sees the units named in `watched`.
#[derive(Clone)]
pub struct TerminationCondition {
    watched: Vec<String>,
    predicate: Predicate,
    description: String,
}

impl TerminationCondition {
    pub fn new<I, S, F>(watched: I, description: impl Into<String>, predicate: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&StateView<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            watched: watched.into_iter().map(Into::into).collect(),
            predicate: Arc::new(predicate),
            description: description.into(),
        }
    }

    /// Converged once `unit`'s last output carries a truthy `key`
    pub fn flag(unit: impl Into<String>, key: impl Into<String>) -> Self {
        let unit = unit.into();
        let key = key.into();
        let description = format!("{}.{}", unit, key);
        let watched = unit.clone();
        Self::new([watched], description, move |view| view.flag(&unit, &key))
    }

    /// Converged once `unit`'s output text matches `pattern`
    pub fn output_matches(unit: impl Into<String>, pattern: ConditionPattern) -> Self {
        let unit = unit.into();
        let description = format!("{} ~ {}", unit, pattern.display());
        let watched = unit.clone();
        Self::new([watched], description, move |view| {
            view.text(&unit).is_some_and(|text| pattern.matches(&text))
        })
    }

    /// Never converges; the loop always runs to its bound
    pub fn never() -> Self {
        Self::new(Vec::<String>::new(), "never", |_| false)
    }

    pub fn watched(&self) -> &[String] {
        &self.watched
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_met(&self, ctx: &PipelineContext) -> bool {
        (self.predicate)(&ctx.view(&self.watched))
    }
}

impl std::fmt::Debug for TerminationCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminationCondition")
            .field("watched", &self.watched)
            .field("description", &self.description)
            .finish()
    }
}
