//! The per-document pipeline.
//!
//! `meta tags -> DOM walk (text blocks and tables) -> fallback patterns ->
//! category default -> Record`. Every call builds fresh stores; an
//! [`Extractor`] holds only the shared schema and the matcher derived from it,
//! so one instance can serve any number of threads.

use crate::error::{ExtractError, Result};
use crate::fallback::apply_fallback_patterns;
use crate::matcher::LabelMatcher;
use crate::record::Record;
use crate::schema::{FieldName, FieldSchema};
use crate::store::FieldStores;
use crate::text::document_text;
use crate::values::{explicit_category, CATEGORY_OTHER};
use crate::walker::DocumentWalker;
use scraper::{ElementRef, Html};
use std::sync::Arc;

/// `<meta name=...>` shortcuts read before the walk.
const META_FIELDS: [(&str, FieldName); 2] = [
    ("ArticleTitle", FieldName::ProjectName),
    ("PubDate", FieldName::AnnouncementDate),
];

/// Extracts procurement records from HTML documents.
///
/// ```rust
/// use procura_core::{Extractor, FieldName};
///
/// let html = "<html><body><p>项目名称：测试采购项目</p>\
///             <p>中标金额：195.5万元</p></body></html>";
/// let record = Extractor::default().extract_html(html).unwrap();
/// assert_eq!(record.get(FieldName::ProjectName), "测试采购项目");
/// assert_eq!(record.get(FieldName::AwardAmount), "1955000.00");
/// assert_eq!(record.get(FieldName::Category), "其他");
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    schema: Arc<FieldSchema>,
    matcher: LabelMatcher,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Arc::new(FieldSchema::default()))
    }
}

impl Extractor {
    #[must_use]
    pub fn new(schema: Arc<FieldSchema>) -> Self {
        let matcher = LabelMatcher::new(&schema);
        Self { schema, matcher }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Parse and extract one HTML document.
    ///
    /// Empty input is an empty document: every field empty, category `其他`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`] if the input yields no element tree.
    pub fn extract_html(&self, html: &str) -> Result<Record> {
        if html.trim().is_empty() {
            log::debug!("empty input, extracting an empty document");
        }
        let document = Html::parse_document(html);
        self.extract_document(&document)
    }

    /// Extract from an already parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`] if the tree has no root element.
    pub fn extract_document(&self, document: &Html) -> Result<Record> {
        let root = document
            .tree
            .root()
            .children()
            .find_map(ElementRef::wrap)
            .ok_or_else(|| ExtractError::Parse("document has no root element".to_string()))?;

        let mut stores = FieldStores::new(&self.schema);
        read_meta_fields(root, &mut stores);

        let body = root
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().name() == "body")
            .unwrap_or(root);
        DocumentWalker::new(&self.matcher, &mut stores).walk(body);

        let full_text = document_text(document);
        apply_fallback_patterns(&self.schema, &mut stores, &full_text);

        let mut record = stores.to_record();
        resolve_category(&mut record, &full_text);
        Ok(record)
    }
}

/// Feed the first `ArticleTitle` and `PubDate` meta tags into their fields.
fn read_meta_fields(root: ElementRef<'_>, stores: &mut FieldStores<'_>) {
    for (meta_name, field) in META_FIELDS {
        let meta = root
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| element.value().name() == "meta")
            .find(|element| {
                element
                    .value()
                    .attr("name")
                    .is_some_and(|name| name.eq_ignore_ascii_case(meta_name))
            });
        let Some(meta) = meta else {
            continue;
        };
        let value = [meta.value().attr("content"), meta.value().attr("value")]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty());
        if let Some(value) = value {
            log::debug!("meta {meta_name}: '{value}'");
            stores.add_candidate(field, value);
        }
    }
}

/// An empty or "其他" category falls back to an explicit marker anywhere in
/// the document, and an empty one ends up as "其他".
fn resolve_category(record: &mut Record, full_text: &str) {
    if !record.category.is_empty() && record.category != CATEGORY_OTHER {
        return;
    }
    if let Some(category) = explicit_category(full_text) {
        record.category = category.to_string();
    } else if record.category.is_empty() {
        record.category = CATEGORY_OTHER.to_string();
    }
}
