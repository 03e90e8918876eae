//! Candidate scoring for single-valued fields.
//!
//! A score starts at the character length of the value and is adjusted by
//! field-specific lexical signals. The store keeps whichever candidate scores
//! strictly higher, so a short, generic fragment found next to a label loses
//! to a longer, well-formed value found later in the document.

use crate::schema::FieldName;
use crate::values::ORGANIZATION_TOKENS;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

const PLACEHOLDER_PENALTY: i64 = 20;
const PROJECT_NUMBER_BONUS: i64 = 50;
const RESULT_NOTICE_BONUS: i64 = 30;
const SPEC_STRING_PENALTY: i64 = 100;
const ADDRESS_TOKEN_BONUS: i64 = 3;
const PURCHASER_SHARED_LOCATION_BONUS: i64 = 20;
const SUPPLIER_SHARED_LOCATION_BONUS: i64 = 10;
const ADMIN_MISMATCH_PENALTY: i64 = 6;
const ORGANIZATION_TOKEN_BONUS: i64 = 4;
const INSTITUTION_TOKEN_BONUS: i64 = 2;

const ADDRESS_TOKENS: &[&str] = &[
    "省", "市", "区", "县", "镇", "乡", "街", "路", "道", "大道", "村", "楼", "栋", "层", "单元", "室", "号",
];
const LOCATION_SUFFIXES: &[&str] = &["省", "市", "区", "县", "镇", "乡", "街", "道", "大道", "办", "园"];
const ADMIN_SUFFIXES: &[char] = &['省', '市', '区', '县', '镇', '乡'];
const INSTITUTION_TOKENS: &[&str] = &[
    "局", "委", "院", "中心", "办", "公司", "集团", "学校", "医院", "大学", "政府", "管理",
];

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(详见|另行|暂未|待定|--|见公告|见附件|无)").expect("valid placeholder regex")
});
static RESULT_NOTICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(中标|成交|结果)公告").expect("valid notice regex"));
static SPEC_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(V\d+\.\d+|版本|型号|简称[:：]|规格[:：]|\[|\]|（.*?版.*?）)")
        .expect("valid spec-string regex")
});
static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid digit regex"));
static LOCATION_PATTERNS: Lazy<Vec<(usize, Regex)>> = Lazy::new(|| {
    LOCATION_SUFFIXES
        .iter()
        .map(|suffix| {
            let regex = Regex::new(&format!(r"[^\s\d]{{1,6}}{suffix}"))
                .expect("valid location regex");
            (suffix.chars().count(), regex)
        })
        .collect()
});

/// Heuristic score of `value` as a candidate for `field`.
///
/// `reference` is the already-resolved entity name of the same record
/// (purchaser name for the purchaser address, supplier name for the supplier
/// address) and may be empty.
///
/// ```rust
/// use procura_core::{scorer::score, FieldName};
///
/// let vague = score(FieldName::SupplierAddress, "详见附件一的地址说明", "");
/// let real = score(FieldName::SupplierAddress, "杭州市西湖区文三路8号", "");
/// assert!(real > vague);
/// ```
pub fn score(field: FieldName, value: &str, reference: &str) -> i64 {
    let cleaned = value.trim();
    if cleaned.is_empty() {
        return 0;
    }
    let mut score = char_len(cleaned);

    if field == FieldName::ProjectName {
        if cleaned.contains("编号") {
            score += PROJECT_NUMBER_BONUS;
        }
        if RESULT_NOTICE.is_match(cleaned) {
            score += RESULT_NOTICE_BONUS;
        }
    }

    if PLACEHOLDER.is_match(cleaned) {
        score -= PLACEHOLDER_PENALTY;
    }

    if field == FieldName::SubjectMatter && SPEC_STRING.is_match(cleaned) {
        score -= SPEC_STRING_PENALTY;
    }

    if field.is_address() {
        score += ADDRESS_TOKEN_BONUS * count_present(cleaned, ADDRESS_TOKENS);
        if DIGIT.is_match(cleaned) {
            score += ADDRESS_TOKEN_BONUS;
        }
        if !reference.is_empty() {
            score += location_adjustment(field, cleaned, reference);
        }
    }

    match field {
        FieldName::SupplierName => {
            score += ORGANIZATION_TOKEN_BONUS * count_present(cleaned, ORGANIZATION_TOKENS);
        }
        FieldName::PurchaserName => {
            score += INSTITUTION_TOKEN_BONUS * count_present(cleaned, INSTITUTION_TOKENS);
        }
        _ => {}
    }

    score
}

/// Bonus for location tokens shared with the reference, minus a penalty (for
/// the purchaser address) for administrative units the reference never names.
fn location_adjustment(field: FieldName, candidate: &str, reference: &str) -> i64 {
    let reference_tokens = location_tokens(reference);
    if reference_tokens.is_empty() {
        return 0;
    }
    let candidate_tokens = location_tokens(candidate);

    let shared = candidate_tokens.intersection(&reference_tokens).count() as i64;
    let bonus = if field == FieldName::PurchaserAddress {
        PURCHASER_SHARED_LOCATION_BONUS
    } else {
        SUPPLIER_SHARED_LOCATION_BONUS
    };
    let mut adjustment = bonus * shared;

    if field == FieldName::PurchaserAddress {
        let mismatched = candidate_tokens
            .iter()
            .filter(|token| !reference_tokens.contains(*token))
            .filter(|token| token.ends_with(ADMIN_SUFFIXES))
            .count() as i64;
        adjustment -= ADMIN_MISMATCH_PENALTY * mismatched;
    }

    log::trace!("location adjustment for {field} '{candidate}' vs '{reference}': {adjustment}");
    adjustment
}

/// Short place tokens: a location suffix plus at most two characters before
/// it, so "浙江省杭州市西湖区" yields "浙江省", "杭州市" and "西湖区".
///
/// ```rust
/// use procura_core::scorer::location_tokens;
///
/// let tokens = location_tokens("浙江省杭州市西湖区");
/// assert!(tokens.contains("浙江省"));
/// assert!(tokens.contains("杭州市"));
/// assert!(tokens.contains("西湖区"));
/// ```
pub fn location_tokens(text: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    if text.is_empty() {
        return tokens;
    }
    for (suffix_len, pattern) in LOCATION_PATTERNS.iter() {
        for found in pattern.find_iter(text) {
            let chars: Vec<char> = found.as_str().chars().collect();
            let prefix_len = chars.len().saturating_sub(*suffix_len).clamp(1, 2);
            let keep = (suffix_len + prefix_len).min(chars.len());
            tokens.insert(chars[chars.len() - keep..].iter().collect());
        }
    }
    tokens
}

fn count_present(text: &str, tokens: &[&str]) -> i64 {
    tokens.iter().filter(|token| text.contains(*token)).count() as i64
}

fn char_len(text: &str) -> i64 {
    text.chars().count() as i64
}
