//! # Procura Core - Procurement Announcement Extraction
//!
//! Pulls nine business fields out of government procurement announcements
//! published as loosely structured HTML: announcement date, project name,
//! purchaser name and address, supplier name and address, award amount,
//! procurement category and subject matter.
//!
//! ## Quick Start
//!
//! ```rust
//! use procura_core::{Extractor, FieldName, Result};
//!
//! fn main() -> Result<()> {
//!     let html = r#"
//!         <p>项目名称：测试采购项目</p>
//!         <p>采购人名称：某市财政局</p>
//!         <table>
//!           <tr><th>供应商名称</th><th>中标金额</th></tr>
//!           <tr><td>某某科技有限公司</td><td>50万元</td></tr>
//!         </table>"#;
//!
//!     let record = Extractor::default().extract_html(html)?;
//!     assert_eq!(record.get(FieldName::SupplierName), "某某科技有限公司");
//!     assert_eq!(record.get(FieldName::AwardAmount), "500000.00");
//!     Ok(())
//! }
//! ```
//!
//! ## How a document is read
//!
//! | step | module |
//! |------|--------|
//! | `<meta name="ArticleTitle">`, `<meta name="PubDate">` | [`extractor`] |
//! | block text as `label：value` clauses | [`walker`], [`context`] |
//! | tables, spans expanded, header or pairwise rows | [`table`], [`walker`] |
//! | label to field | [`matcher`] |
//! | value cleanup, dates, amounts, categories | [`values`] |
//! | best single value among mentions | [`scorer`], [`store`] |
//! | document-wide patterns for what is still empty | [`fallback`] |
//!
//! Every field is always present in the [`Record`]; unresolved fields are
//! empty, except the category, which defaults to `其他`.
//!
//! ## Configuration
//!
//! The field table is a [`FieldSchema`], built once and shared behind an
//! `Arc`. [`FieldSchema::with_overrides`] adds aliases, stopwords and
//! fallback patterns, or makes a field multi-valued.

pub mod batch;
pub mod context;
pub mod error;
pub mod extractor;
pub mod fallback;
pub mod matcher;
pub mod record;
pub mod schema;
pub mod scorer;
pub mod store;
pub mod table;
pub mod text;
pub mod values;
pub mod walker;

pub use batch::{extract_batch, BatchItem, BatchReport, BatchStats};
pub use error::{ExtractError, Result};
pub use extractor::Extractor;
pub use matcher::LabelMatcher;
pub use record::Record;
pub use schema::{FieldDefinition, FieldName, FieldOverride, FieldSchema, SchemaOverrides};
pub use table::TableMatrix;
