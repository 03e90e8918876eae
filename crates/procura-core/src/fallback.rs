//! Document-wide pattern pass for fields the walk left empty.

use crate::schema::FieldSchema;
use crate::store::FieldStores;
use regex::Captures;

/// Run every empty field's fallback patterns over `full_text`.
///
/// The last capture group that took part in a match is the raw value. A
/// single-value field stops at the first match that produced a value.
pub fn apply_fallback_patterns(schema: &FieldSchema, stores: &mut FieldStores<'_>, full_text: &str) {
    for definition in schema.iter() {
        let field = definition.name;
        if stores.has_value(field) {
            continue;
        }
        'patterns: for pattern in &definition.fallback_patterns {
            for caps in pattern.captures_iter(full_text) {
                let value = last_group(&caps);
                log::debug!("fallback {field}: '{value}'");
                stores.add_candidate(field, value);
                if !definition.multi && stores.has_value(field) {
                    break 'patterns;
                }
            }
        }
    }
}

fn last_group<'h>(caps: &Captures<'h>) -> &'h str {
    (1..caps.len())
        .rev()
        .find_map(|idx| caps.get(idx))
        .or_else(|| caps.get(0))
        .map_or("", |found| found.as_str())
}
