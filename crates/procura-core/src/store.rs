//! Per-document candidate storage.
//!
//! One [`FieldValueStore`] per field holds `(order, text)` entries. Multi-value
//! fields accumulate distinct values in discovery order; single-value fields
//! keep exactly one entry and replace it only when [`accept`] prefers the
//! candidate. [`FieldStores`] bundles the nine stores of one document with the
//! order counter they share.

use crate::record::Record;
use crate::schema::{FieldName, FieldSchema};
use crate::scorer::score;
use crate::values::normalize_value;

/// Delimiter between the values of a multi-value field.
pub const MULTI_VALUE_DELIMITER: &str = "|";

/// Outcome of comparing a stored single value against a new candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    KeepCurrent,
    TakeCandidate,
}

/// Decide between the stored value and a candidate for a single-value field.
///
/// The candidate wins only with a strictly higher score, so among equals the
/// earliest evidence stays.
///
/// ```rust
/// use procura_core::store::{accept, Verdict};
/// use procura_core::FieldName;
///
/// let verdict = accept(FieldName::SupplierAddress, "详见公告", "杭州市西湖区文三路8号", "");
/// assert_eq!(verdict, Verdict::TakeCandidate);
/// ```
pub fn accept(field: FieldName, current: &str, candidate: &str, reference: &str) -> Verdict {
    let current_score = score(field, current, reference);
    let candidate_score = score(field, candidate, reference);
    if candidate_score > current_score {
        log::debug!(
            "{field}: '{candidate}' ({candidate_score}) replaces '{current}' ({current_score})"
        );
        Verdict::TakeCandidate
    } else {
        log::trace!(
            "{field}: keeping '{current}' ({current_score}) over '{candidate}' ({candidate_score})"
        );
        Verdict::KeepCurrent
    }
}

/// Candidate entries of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValueStore {
    multi: bool,
    entries: Vec<(u64, String)>,
}

impl FieldValueStore {
    pub fn new(multi: bool) -> Self {
        Self {
            multi,
            entries: Vec::new(),
        }
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(order, text)` entries in discovery order.
    pub fn entries(&self) -> &[(u64, String)] {
        &self.entries
    }

    /// First stored value, the single value for single-value fields.
    pub fn current(&self) -> Option<&str> {
        self.entries.first().map(|(_, text)| text.as_str())
    }

    /// Append a value to a multi-value store unless already present.
    fn push_distinct(&mut self, order: u64, value: String) {
        if !self.entries.iter().any(|(_, existing)| *existing == value) {
            self.entries.push((order, value));
        }
    }

    /// Final output: the single value, or distinct values joined by
    /// [`MULTI_VALUE_DELIMITER`] in order of discovery.
    pub fn resolve(&self) -> String {
        if self.multi {
            let mut ordered: Vec<&(u64, String)> = self.entries.iter().collect();
            ordered.sort_by_key(|(order, _)| *order);
            ordered
                .into_iter()
                .map(|(_, text)| text.as_str())
                .collect::<Vec<_>>()
                .join(MULTI_VALUE_DELIMITER)
        } else {
            self.current().unwrap_or_default().to_string()
        }
    }
}

/// The stores of one document plus their shared order counter.
#[derive(Debug)]
pub struct FieldStores<'s> {
    schema: &'s FieldSchema,
    stores: Vec<FieldValueStore>,
    counter: u64,
}

impl<'s> FieldStores<'s> {
    /// Empty stores for every field of `schema`.
    pub fn new(schema: &'s FieldSchema) -> Self {
        Self {
            schema,
            stores: schema
                .iter()
                .map(|definition| FieldValueStore::new(definition.multi))
                .collect(),
            counter: 0,
        }
    }

    fn next_order(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    /// Normalize `raw` for `field` and merge the resulting values.
    ///
    /// Address candidates are scored against the current value of the
    /// matching entity-name field.
    pub fn add_candidate(&mut self, field: FieldName, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        let values = normalize_value(self.schema.get(field), raw);
        if values.is_empty() {
            return;
        }

        let reference = field
            .reference_field()
            .and_then(|name_field| self.store(name_field).current())
            .unwrap_or_default()
            .to_string();

        for value in values {
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            let order = self.next_order();
            let store = &mut self.stores[field.index()];
            if store.multi {
                store.push_distinct(order, value);
                continue;
            }
            match store.current() {
                None => {
                    log::debug!("{field}: first candidate '{value}'");
                    store.entries.push((order, value));
                }
                Some(current) => {
                    if accept(field, current, &value, &reference) == Verdict::TakeCandidate {
                        store.entries[0] = (order, value);
                    }
                }
            }
        }
    }

    pub fn store(&self, field: FieldName) -> &FieldValueStore {
        &self.stores[field.index()]
    }

    pub fn has_value(&self, field: FieldName) -> bool {
        !self.store(field).is_empty()
    }

    /// Resolved values of every field.
    pub fn to_record(&self) -> Record {
        let mut record = Record::default();
        for field in FieldName::ALL {
            record.set(field, self.store(field).resolve());
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldOverride, SchemaOverrides};

    #[test]
    fn test_accept_prefers_strictly_higher() {
        assert_eq!(
            accept(FieldName::SubjectMatter, "服务器", "交换机", ""),
            Verdict::KeepCurrent
        );
        assert_eq!(
            accept(FieldName::SubjectMatter, "服务器", "服务器及存储设备", ""),
            Verdict::TakeCandidate
        );
    }

    #[test]
    fn test_single_value_keeps_one_entry() {
        let schema = FieldSchema::default();
        let mut stores = FieldStores::new(&schema);
        stores.add_candidate(FieldName::SupplierName, "甲公司");
        stores.add_candidate(FieldName::SupplierName, "乙科技有限公司");
        stores.add_candidate(FieldName::SupplierName, "丙");
        let store = stores.store(FieldName::SupplierName);
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.resolve(), "乙科技有限公司");
        assert_eq!(store.entries()[0].0, 2);
    }

    #[test]
    fn test_rejected_candidate_consumes_order_but_keeps_entry() {
        let schema = FieldSchema::default();
        let mut stores = FieldStores::new(&schema);
        stores.add_candidate(FieldName::PurchaserName, "某市财政局");
        stores.add_candidate(FieldName::PurchaserName, "某局");
        assert_eq!(stores.store(FieldName::PurchaserName).entries()[0], (1, "某市财政局".into()));
    }

    #[test]
    fn test_empty_and_unparsable_candidates_are_ignored() {
        let schema = FieldSchema::default();
        let mut stores = FieldStores::new(&schema);
        stores.add_candidate(FieldName::ProjectName, "   ");
        stores.add_candidate(FieldName::AnnouncementDate, "另行通知");
        assert!(!stores.has_value(FieldName::ProjectName));
        assert!(!stores.has_value(FieldName::AnnouncementDate));
    }

    #[test]
    fn test_address_scored_against_entity_name() {
        let schema = FieldSchema::default();
        let mut stores = FieldStores::new(&schema);
        stores.add_candidate(FieldName::PurchaserName, "杭州市西湖区教育局");
        stores.add_candidate(FieldName::PurchaserAddress, "宁波市鄞州区文三路8号");
        stores.add_candidate(FieldName::PurchaserAddress, "杭州市西湖区文三路9号");
        assert_eq!(
            stores.store(FieldName::PurchaserAddress).resolve(),
            "杭州市西湖区文三路9号"
        );
    }

    #[test]
    fn test_multi_value_dedup_in_discovery_order() {
        let mut overrides = SchemaOverrides::new();
        overrides.insert(
            "采购类别".to_string(),
            FieldOverride {
                multi: Some(true),
                ..Default::default()
            },
        );
        let schema = FieldSchema::with_overrides(&overrides).unwrap();
        let mut stores = FieldStores::new(&schema);
        stores.add_candidate(FieldName::Category, "设备维护");
        stores.add_candidate(FieldName::Category, "服务");
        stores.add_candidate(FieldName::Category, "施工");
        assert_eq!(stores.store(FieldName::Category).resolve(), "货物|服务|工程");
    }

    #[test]
    fn test_to_record_fills_every_field() {
        let schema = FieldSchema::default();
        let mut stores = FieldStores::new(&schema);
        stores.add_candidate(FieldName::AwardAmount, "50万元");
        let record = stores.to_record();
        assert_eq!(record.get(FieldName::AwardAmount), "500000.00");
        assert_eq!(record.get(FieldName::ProjectName), "");
    }
}
