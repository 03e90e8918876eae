//! Agency-section tracking.
//!
//! Announcements usually describe the purchaser and the procurement agency in
//! separate sections with the same labels ("地址：…"). While the reader is in
//! the agency's section, a purchaser-address match almost certainly belongs to
//! the agency and is dropped.

use crate::schema::FieldName;
use once_cell::sync::Lazy;
use regex::Regex;

static AGENCY_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(代理机构|采购代理|招标代理|中介机构)").expect("valid agency regex"));
static PURCHASER_CONTEXT_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(采购人信息|采购单位信息|项目联系|其他补充|附件)").expect("valid purchaser regex")
});

const AGENCY_TOKEN: &str = "代理";

/// Which entity the surrounding text is about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AgencyContext {
    #[default]
    Neutral,
    InAgencyContext,
}

impl AgencyContext {
    /// Text segments: agency wording enters the agency section; purchaser,
    /// project-contact or attachment wording without 代理 leaves it. Both are
    /// checked on the same segment, leaving last.
    #[must_use]
    pub fn after_segment(self, segment: &str) -> Self {
        let mut next = self;
        if enters_agency_section(segment) {
            next = Self::InAgencyContext;
        }
        if leaves_agency_section(segment) {
            next = Self::Neutral;
        }
        if next != self {
            log::debug!("agency context {self:?} -> {next:?} at '{segment}'");
        }
        next
    }

    /// Table label cells: any label mentioning 代理 enters the agency context,
    /// resolved or not; only a purchaser-name label without 代理 leaves it.
    #[must_use]
    pub fn after_label(self, label: &str, field: Option<FieldName>) -> Self {
        let next = if label.contains(AGENCY_TOKEN) {
            Self::InAgencyContext
        } else if field == Some(FieldName::PurchaserName) {
            Self::Neutral
        } else {
            self
        };
        if next != self {
            log::debug!("table agency context {self:?} -> {next:?} at label '{label}'");
        }
        next
    }

    /// True if a `field` value found in this context must be dropped.
    #[must_use]
    pub fn suppresses(self, field: FieldName) -> bool {
        self == Self::InAgencyContext && field == FieldName::PurchaserAddress
    }
}

/// Segment mentions an agency or intermediary.
pub fn enters_agency_section(segment: &str) -> bool {
    AGENCY_MARKERS.is_match(segment)
}

/// Segment returns to the purchaser's own information.
pub fn leaves_agency_section(segment: &str) -> bool {
    PURCHASER_CONTEXT_MARKERS.is_match(segment) && !segment.contains(AGENCY_TOKEN)
}
