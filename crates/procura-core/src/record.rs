//! The extraction result for one document.

use crate::schema::FieldName;
use serde::{Deserialize, Serialize};

/// Resolved values of the nine fields of one document.
///
/// Serializes with the canonical Chinese field names as keys, in output order.
/// Unresolved fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "公告时间")]
    pub announcement_date: String,
    #[serde(rename = "项目名称")]
    pub project_name: String,
    #[serde(rename = "采购单位名称")]
    pub purchaser_name: String,
    #[serde(rename = "采购单位地址")]
    pub purchaser_address: String,
    #[serde(rename = "供应商名称")]
    pub supplier_name: String,
    #[serde(rename = "供应商地址")]
    pub supplier_address: String,
    #[serde(rename = "中标金额")]
    pub award_amount: String,
    #[serde(rename = "采购类别")]
    pub category: String,
    #[serde(rename = "采购标的")]
    pub subject_matter: String,
}

impl Record {
    #[must_use]
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::AnnouncementDate => &self.announcement_date,
            FieldName::ProjectName => &self.project_name,
            FieldName::PurchaserName => &self.purchaser_name,
            FieldName::PurchaserAddress => &self.purchaser_address,
            FieldName::SupplierName => &self.supplier_name,
            FieldName::SupplierAddress => &self.supplier_address,
            FieldName::AwardAmount => &self.award_amount,
            FieldName::Category => &self.category,
            FieldName::SubjectMatter => &self.subject_matter,
        }
    }

    pub fn set(&mut self, field: FieldName, value: impl Into<String>) {
        let slot = match field {
            FieldName::AnnouncementDate => &mut self.announcement_date,
            FieldName::ProjectName => &mut self.project_name,
            FieldName::PurchaserName => &mut self.purchaser_name,
            FieldName::PurchaserAddress => &mut self.purchaser_address,
            FieldName::SupplierName => &mut self.supplier_name,
            FieldName::SupplierAddress => &mut self.supplier_address,
            FieldName::AwardAmount => &mut self.award_amount,
            FieldName::Category => &mut self.category,
            FieldName::SubjectMatter => &mut self.subject_matter,
        };
        *slot = value.into();
    }

    /// `(field, value)` pairs in output order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> + '_ {
        FieldName::ALL.into_iter().map(move |field| (field, self.get(field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_cover_every_field() {
        let mut record = Record::default();
        for field in FieldName::ALL {
            record.set(field, field.as_str());
        }
        for (field, value) in record.iter() {
            assert_eq!(value, field.as_str());
        }
    }

    #[test]
    fn test_serializes_with_canonical_keys_in_order() {
        let mut record = Record::default();
        record.set(FieldName::AwardAmount, "500000.00");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with("{\"公告时间\":\"\",\"项目名称\":\"\""));
        assert!(json.contains("\"中标金额\":\"500000.00\""));
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
