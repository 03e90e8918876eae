//! Field schema: the declarative definition of the nine output fields.
//!
//! A [`FieldSchema`] is built once and shared read-only (usually behind an
//! `Arc`) by every extraction. Nothing in it changes while documents are being
//! processed, which is what lets the batch runner hand it to many workers.

use crate::error::{ExtractError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The nine canonical output fields, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldName {
    /// 公告时间
    AnnouncementDate,
    /// 项目名称
    ProjectName,
    /// 采购单位名称
    PurchaserName,
    /// 采购单位地址
    PurchaserAddress,
    /// 供应商名称
    SupplierName,
    /// 供应商地址
    SupplierAddress,
    /// 中标金额
    AwardAmount,
    /// 采购类别
    Category,
    /// 采购标的
    SubjectMatter,
}

impl FieldName {
    /// All fields in output order.
    pub const ALL: [Self; 9] = [
        Self::AnnouncementDate,
        Self::ProjectName,
        Self::PurchaserName,
        Self::PurchaserAddress,
        Self::SupplierName,
        Self::SupplierAddress,
        Self::AwardAmount,
        Self::Category,
        Self::SubjectMatter,
    ];

    /// Canonical (Chinese) label, used as the output column name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnnouncementDate => "公告时间",
            Self::ProjectName => "项目名称",
            Self::PurchaserName => "采购单位名称",
            Self::PurchaserAddress => "采购单位地址",
            Self::SupplierName => "供应商名称",
            Self::SupplierAddress => "供应商地址",
            Self::AwardAmount => "中标金额",
            Self::Category => "采购类别",
            Self::SubjectMatter => "采购标的",
        }
    }

    /// Parse a canonical label back into a field.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == label.trim())
    }

    /// Position in [`FieldName::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Address fields get the stricter reverse-containment rule and the
    /// location-aware scoring.
    #[must_use]
    pub const fn is_address(self) -> bool {
        matches!(self, Self::PurchaserAddress | Self::SupplierAddress)
    }

    /// Free-text titles keep their full content: no stopword truncation and
    /// no colon splitting.
    #[must_use]
    pub const fn keeps_full_text(self) -> bool {
        matches!(self, Self::ProjectName | Self::SubjectMatter)
    }

    /// The entity-name field whose resolved value cross-checks this field.
    #[must_use]
    pub const fn reference_field(self) -> Option<Self> {
        match self {
            Self::PurchaserAddress => Some(Self::PurchaserName),
            Self::SupplierAddress => Some(Self::SupplierName),
            _ => None,
        }
    }

    /// Tokens the raw label must contain before a label that is merely a
    /// substring of one of this field's aliases may resolve to it.
    #[must_use]
    pub const fn required_label_prefixes(self) -> &'static [&'static str] {
        match self {
            Self::PurchaserAddress => &["采购", "采购人"],
            Self::SupplierAddress => &["供应商", "中标供应商", "成交供应商"],
            _ => &[],
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of one canonical field.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: FieldName,
    /// Label strings treated as equivalent, in priority order.
    pub aliases: Vec<String>,
    /// Accepts several independent values (joined with `|` on output).
    pub multi: bool,
    /// Substrings whose first occurrence truncates a cleaned value.
    pub stopwords: Vec<String>,
    /// Document-wide patterns; the last capture group is the raw value.
    pub fallback_patterns: Vec<Regex>,
}

impl FieldDefinition {
    fn builtin(
        name: FieldName,
        aliases: &[&str],
        stopwords: &[&str],
        fallback: &[&str],
    ) -> Result<Self> {
        Ok(Self {
            name,
            aliases: aliases.iter().map(ToString::to_string).collect(),
            multi: false,
            stopwords: stopwords.iter().map(ToString::to_string).collect(),
            fallback_patterns: fallback
                .iter()
                .map(|pattern| Regex::new(pattern))
                .collect::<std::result::Result<_, _>>()?,
        })
    }
}

/// Per-field additions loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOverride {
    /// Extra aliases, appended after the built-in ones.
    pub aliases: Vec<String>,
    /// Extra stopwords.
    pub stopwords: Vec<String>,
    /// Extra fallback patterns, tried after the built-in ones.
    pub fallback: Vec<String>,
    /// Replace the field's multi-value flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi: Option<bool>,
}

/// Schema overrides keyed by canonical field name (e.g. `"供应商名称"`).
pub type SchemaOverrides = BTreeMap<String, FieldOverride>;

/// The full, immutable field table.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    definitions: Vec<FieldDefinition>,
}

impl FieldSchema {
    /// Built-in definitions with `overrides` applied on top.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Schema`] when an override names an unknown
    /// field or a fallback pattern does not compile.
    pub fn with_overrides(overrides: &SchemaOverrides) -> Result<Self> {
        let mut schema = Self::builtin()?;
        for (label, extra) in overrides {
            let field = FieldName::from_label(label)
                .ok_or_else(|| ExtractError::Schema(format!("unknown field '{label}'")))?;
            let definition = &mut schema.definitions[field.index()];
            definition.aliases.extend(extra.aliases.iter().cloned());
            definition.stopwords.extend(extra.stopwords.iter().cloned());
            for pattern in &extra.fallback {
                let regex = Regex::new(pattern).map_err(|e| {
                    ExtractError::Schema(format!("bad fallback pattern for {field}: {e}"))
                })?;
                definition.fallback_patterns.push(regex);
            }
            if let Some(multi) = extra.multi {
                definition.multi = multi;
            }
        }
        Ok(schema)
    }

    /// Definition of `field`.
    #[must_use]
    pub fn get(&self, field: FieldName) -> &FieldDefinition {
        &self.definitions[field.index()]
    }

    /// All definitions in output order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.definitions.iter()
    }

    fn builtin() -> Result<Self> {
        use FieldName::*;

        let definitions = vec![
            FieldDefinition::builtin(
                AnnouncementDate,
                &["公告时间", "发布日期", "发布时间", "发布公告时间", "信息时间"],
                &[],
                &[r"(公告时间|发布日期|发布时间|信息时间)[:：]?\s*(\d{4}[年/\-]\d{1,2}[月/\-]\d{1,2})"],
            )?,
            FieldDefinition::builtin(
                ProjectName,
                &["项目名称", "采购项目名称"],
                &["采购单位", "采购人名称", "公告时间", "供应商名称", "中标金额"],
                &[r"(项目名称|采购项目名称)[:：]?\s*([^\n\r]{2,120})"],
            )?,
            FieldDefinition::builtin(
                PurchaserName,
                &["采购人名称", "采购单位"],
                &[
                    "采购单位地址",
                    "采购人地址",
                    "供应商名称",
                    "中标金额",
                    "成交金额",
                    "采购人联系人",
                    "采购人联系电话",
                    "采购单位联系方式",
                    "采购人联系方式",
                    "联系方式",
                    "联系电话",
                    "项目联系人",
                    "项目联系电话",
                    "遴选专家名单",
                    "行政区域",
                ],
                &[r"(采购人名称|采购单位)[:：]?\s*([^\n\r]{2,120})"],
            )?,
            FieldDefinition::builtin(
                PurchaserAddress,
                &["采购人地址", "采购单位地址"],
                &[
                    "采购单位名称",
                    "供应商名称",
                    "中标金额",
                    "成交金额",
                    "采购单位联系方式",
                    "采购人联系方式",
                    "代理机构名称",
                    "代理机构地址",
                    "代理机构",
                    "附件",
                ],
                &[r"(采购人地址|采购单位地址)[:：]?\s*([^\n\r]{2,160})"],
            )?,
            FieldDefinition::builtin(
                SupplierName,
                &["供应商名称", "中标供应商", "成交供应商", "供应商", "中标人", "成交人"],
                &[
                    "供应商地址",
                    "中标金额",
                    "成交金额",
                    "采购类别",
                    "采购方式",
                    "综合评分",
                    "最终得分",
                ],
                &[r"(供应商名称|中标供应商|成交供应商|中标人|成交人)[:：]?\s*([^\n\r]{2,160})"],
            )?,
            FieldDefinition::builtin(
                SupplierAddress,
                &["供应商地址", "中标供应商地址", "成交供应商地址"],
                &["供应商名称", "中标金额", "成交金额", "采购类别"],
                &[r"(供应商地址|中标供应商地址|成交供应商地址)[:：]?\s*([^\n\r]{2,200})"],
            )?,
            FieldDefinition::builtin(
                AwardAmount,
                &["中标金额", "中标（成交）金额", "成交金额", "合同金额"],
                &[],
                &[r"(中标金额|成交金额|合同金额)[:：]?\s*([^\n\r]{1,80})"],
            )?,
            FieldDefinition::builtin(
                Category,
                &["采购类别", "采购类型", "采购方式", "项目类别", "品目"],
                &[],
                &[r"(采购类别|采购方式|项目类别|品目)[:：]?\s*([^\n\r]{1,80})"],
            )?,
            FieldDefinition::builtin(
                SubjectMatter,
                &["采购标的", "标的名称", "采购内容", "标的"],
                &["品牌", "规格型号", "数量", "总价"],
                &[r"(采购标的|标的名称|采购内容)[:：]?\s*([^\n\r]{2,120})"],
            )?,
        ];

        Ok(Self { definitions })
    }
}

impl Default for FieldSchema {
    /// The nine built-in definitions.
    ///
    /// The built-in patterns are constants; a failure here is a programming
    /// error caught by the unit tests, so it panics.
    fn default() -> Self {
        Self::builtin().expect("built-in field definitions are valid")
    }
}
