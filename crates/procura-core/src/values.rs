//! Per-field value normalizers.
//!
//! Each normalizer turns one raw matched substring into zero or more canonical
//! values. An empty result is how a normalizer says "nothing usable here"; it
//! is never an error.
//!
//! - dates become `YYYY年MM月DD日`
//! - amounts become yuan strings with two decimals (`"1955000.00"`)
//! - categories become one of `货物` / `服务` / `工程`
//! - everything else goes through [`cleanup_value`]

use crate::schema::{FieldDefinition, FieldName};
use crate::text::{
    fold_fullwidth_digits, normalize_whitespace, strip_all_whitespace, trim_boundary,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Category assigned when no evidence is found anywhere in a document.
pub const CATEGORY_OTHER: &str = "其他";

/// Explicit "<category>类" markers; the first one present wins outright.
pub const CATEGORY_SUFFIXES: [(&str, &str); 3] =
    [("货物类", "货物"), ("服务类", "服务"), ("工程类", "工程")];

const CATEGORY_KEYWORDS: [(&str, &[&str]); 3] = [
    ("货物", &["货物", "设备", "物资", "用品", "耗材"]),
    ("服务", &["服务", "咨询", "保障", "培训", "运营", "维护"]),
    ("工程", &["工程", "施工", "改造", "维修", "建设"]),
];

/// Tokens that mark an organisation name.
pub const ORGANIZATION_TOKENS: &[&str] = &[
    "公司", "有限", "集团", "中心", "医院", "大学", "学院", "学校", "研究", "科技", "股份", "合作社",
    "政府", "委员会", "事务所", "厂", "站", "局",
];

const SCORING_TABLE_TOKENS: &[&str] = &["比例", "权重", "得分", "%"];

/// Yuan per 万元.
const TEN_THOUSAND: u32 = 10_000;

static DATE_TRIPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})").expect("valid date regex"));
static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid dash regex"));
static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9.]+)(万元|元)?").expect("valid amount regex"));
static AGENCY_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(代理机构|招标代理|采购代理|中介机构)").expect("valid agency regex")
});
static PHONE_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\-\s]+$").expect("valid phone regex"));
static LANDLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0\d{2,3}[-\s]?\d{7,8}$").expect("valid landline regex"));
static LONG_DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{7,}").expect("valid digit-run regex"));
static HAN_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[一-龥]{2,}").expect("valid han regex"));

/// Route `raw` through the normalizer for `definition`'s field.
pub fn normalize_value(definition: &FieldDefinition, raw: &str) -> Vec<String> {
    match definition.name {
        FieldName::AnnouncementDate => normalize_date(raw).into_iter().collect(),
        FieldName::AwardAmount => normalize_amounts(raw),
        FieldName::Category => extract_categories(raw),
        _ => {
            let cleaned = cleanup_value(definition, &normalize_whitespace(raw));
            if cleaned.is_empty() {
                Vec::new()
            } else {
                vec![cleaned]
            }
        }
    }
}

/// Normalize a date mention to `YYYY年MM月DD日`.
///
/// ```rust
/// use procura_core::values::normalize_date;
///
/// assert_eq!(normalize_date("发布时间:2021/5/4").as_deref(), Some("2021年05月04日"));
/// assert_eq!(normalize_date("2021年5月4日 10:30").as_deref(), Some("2021年05月04日"));
/// assert_eq!(normalize_date("详见公告"), None);
/// ```
pub fn normalize_date(value: &str) -> Option<String> {
    let text = value.trim();
    if text.is_empty() {
        return None;
    }
    let text = fold_fullwidth_digits(text)
        .replace(['年', '月'], "-")
        .replace('日', "")
        .replace(['/', '.'], "-");
    let text = DASH_RUN.replace_all(&text, "-");

    let date = match DATE_TRIPLE.captures(&text) {
        Some(caps) => {
            let year = caps[1].parse().ok()?;
            let month = caps[2].parse().ok()?;
            let day = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)?
        }
        None => parse_full_date(text.trim())?,
    };
    Some(date.format("%Y年%m月%d日").to_string())
}

/// Whole-string date formats tried when no `YYYY-M-D` triple is present.
fn parse_full_date(text: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y%m%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];
    const DATETIME_FORMATS: &[&str] = &["%Y%m%d%H%M%S", "%Y%m%dT%H%M%S"];

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
}

/// Every amount mentioned in `raw`, converted to yuan, de-duplicated, in order.
///
/// ```rust
/// use procura_core::values::normalize_amounts;
///
/// assert_eq!(normalize_amounts("中标金额：195.5万元"), vec!["1955000.00"]);
/// assert_eq!(normalize_amounts("1,980,000元"), vec!["1980000.00"]);
/// ```
pub fn normalize_amounts(raw: &str) -> Vec<String> {
    let text = fold_fullwidth_digits(raw)
        .replace([',', ' '], "")
        .replace("人民币", "")
        .replace("万元整", "万元");

    let mut results: Vec<String> = Vec::new();
    for caps in AMOUNT.captures_iter(&text) {
        let Some(amount) = parse_amount(&caps[1]) else {
            continue;
        };
        let amount = match caps.get(2).map(|m| m.as_str()) {
            Some("万元") => amount.checked_mul(Decimal::from(TEN_THOUSAND)),
            _ => Some(amount),
        };
        let Some(amount) = amount else {
            continue;
        };
        let rendered = render_amount(amount);
        if !results.contains(&rendered) {
            results.push(rendered);
        }
    }
    results
}

/// Categories named by `raw`.
///
/// An explicit "货物类"/"服务类"/"工程类" marker returns that single category;
/// otherwise every category whose keyword set matches is returned, in
/// goods/services/engineering order.
pub fn extract_categories(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    if let Some(category) = explicit_category(raw) {
        return vec![category.to_string()];
    }

    let text = normalize_whitespace(raw).to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| (*category).to_string())
        .collect()
}

/// The explicit category marker in `text`, ignoring whitespace (the marker is
/// often split across inline elements: "货物 类").
pub fn explicit_category(text: &str) -> Option<&'static str> {
    let compact = strip_all_whitespace(text).to_lowercase();
    CATEGORY_SUFFIXES
        .iter()
        .find(|(marker, _)| compact.contains(marker))
        .map(|(_, category)| *category)
}

/// Generic cleanup for free-text fields.
///
/// Models "the label line captured trailing unrelated content": truncate at
/// stopwords, keep the left side of a `label：value` split, then apply the
/// field-specific rules.
pub fn cleanup_value(definition: &FieldDefinition, value: &str) -> String {
    let field = definition.name;
    let mut cleaned = trim_boundary(value).to_string();

    if field == FieldName::PurchaserAddress && AGENCY_MARKERS.is_match(&cleaned) {
        return String::new();
    }

    if !field.keeps_full_text() {
        for stopword in &definition.stopwords {
            if let Some(idx) = cleaned.find(stopword.as_str()) {
                cleaned.truncate(idx);
            }
        }
        for separator in ['：', ':'] {
            if let Some((left, right)) = cleaned.split_once(separator) {
                if !left.trim().is_empty() && !right.trim().is_empty() {
                    cleaned = left.to_string();
                    break;
                }
            }
        }
    }

    match field {
        FieldName::SupplierName => {
            let looks_like_scores = SCORING_TABLE_TOKENS.iter().any(|t| cleaned.contains(t));
            let names_organization = ORGANIZATION_TOKENS.iter().any(|t| cleaned.contains(t));
            if looks_like_scores && !names_organization {
                cleaned.clear();
            }
        }
        FieldName::PurchaserAddress | FieldName::SupplierAddress => {
            if let Some(idx) = cleaned.find(['；', ';']) {
                cleaned.truncate(idx);
            }
        }
        FieldName::PurchaserName => {
            if let Some(idx) = cleaned.find("联系方式") {
                cleaned.truncate(idx);
            }
            if looks_like_phone_number(&cleaned) {
                cleaned.clear();
            }
        }
        _ => {}
    }

    trim_boundary(&cleaned).to_string()
}

fn looks_like_phone_number(text: &str) -> bool {
    if PHONE_ONLY.is_match(text) || LANDLINE.is_match(text) {
        return true;
    }
    !text.is_empty()
        && text.chars().count() < 20
        && LONG_DIGIT_RUN.is_match(text)
        && !HAN_PAIR.is_match(text)
}

/// Parse `[0-9]*(.[0-9]*)?` with at least one digit.
fn parse_amount(text: &str) -> Option<Decimal> {
    if text.matches('.').count() > 1 {
        return None;
    }
    let text = text.trim_end_matches('.');
    if text.is_empty() {
        return None;
    }
    if text.starts_with('.') {
        Decimal::from_str(&format!("0{text}")).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}

/// Exactly two decimals, rounding half to even.
fn render_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded.to_string()
}
