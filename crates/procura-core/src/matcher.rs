//! Label matching: map a raw label string to a canonical field.
//!
//! Scoring per alias (both sides canonicalized with [`normalize_label`]):
//!
//! | relation | score |
//! |---|---|
//! | label == alias | `len(alias) + 100` |
//! | alias ⊂ label | `len(alias)` |
//! | label ⊂ alias | `len(label)`, address fields only with a qualifying raw label |
//!
//! The highest score wins; on ties the field evaluated first keeps it.

use crate::schema::{FieldName, FieldSchema};
use crate::text::normalize_label;

const EXACT_MATCH_BONUS: usize = 100;

/// Resolves labels against a schema.
///
/// Aliases are canonicalized once at construction.
#[derive(Debug, Clone)]
pub struct LabelMatcher {
    aliases: Vec<(FieldName, Vec<String>)>,
}

impl LabelMatcher {
    /// Build a matcher for `schema`.
    #[must_use]
    pub fn new(schema: &FieldSchema) -> Self {
        let aliases = schema
            .iter()
            .map(|definition| {
                let normalized = definition
                    .aliases
                    .iter()
                    .map(|alias| normalize_label(alias))
                    .filter(|alias| !alias.is_empty())
                    .collect();
                (definition.name, normalized)
            })
            .collect();
        Self { aliases }
    }

    /// Resolve `label` to a field, or `None` if nothing scores above zero.
    #[must_use]
    pub fn resolve(&self, label: &str) -> Option<FieldName> {
        let normalized = normalize_label(label);
        if normalized.is_empty() {
            return None;
        }
        let label_len = normalized.chars().count();

        let mut best: Option<FieldName> = None;
        let mut best_score = 0;
        for (field, aliases) in &self.aliases {
            for alias in aliases {
                let score = if normalized == *alias {
                    alias.chars().count() + EXACT_MATCH_BONUS
                } else if normalized.contains(alias.as_str()) {
                    alias.chars().count()
                } else if alias.contains(normalized.as_str()) {
                    if !Self::allows_partial_label(*field, label) {
                        continue;
                    }
                    label_len
                } else {
                    continue;
                };

                if score > best_score {
                    best = Some(*field);
                    best_score = score;
                }
            }
        }

        if let Some(field) = best {
            log::trace!("label '{label}' -> {field} (score {best_score})");
        }
        best
    }

    /// A bare "地址" must not resolve to an address field unless the raw
    /// label names the owning entity.
    fn allows_partial_label(field: FieldName, raw_label: &str) -> bool {
        let required = field.required_label_prefixes();
        required.is_empty() || required.iter().any(|token| raw_label.contains(token))
    }
}
