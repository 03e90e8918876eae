//! Text canonicalization shared by every component.
//!
//! Three flavours of normalization live here:
//! - [`normalize_whitespace`] for values (collapse runs, map full-width and
//!   non-breaking spaces to ASCII space)
//! - [`normalize_label`] for label comparison (no whitespace, no colons or
//!   parentheses, no leading enumerator, lower-cased)
//! - [`normalize_for_regex`] for the single-line document text the fallback
//!   patterns run against
//!
//! It also hosts the two whole-document renderings: [`document_text`] (input
//! of the fallback pass) and [`render_plain_text`] (readable text with tables
//! flattened to `a | b | c` rows).

use once_cell::sync::Lazy;
use regex::Regex;
use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node};

/// Leading "一、", "2.", "10-" style enumerators in front of a label.
static ENUMERATOR_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[一二三四五六七八九十\d]{1,3}[、.\-]").expect("valid enumerator regex")
});

/// Characters trimmed from both ends of a cleaned value.
pub const BOUNDARY_PUNCTUATION: &[char] = &[' ', '、', '。', '，', '；', ':'];

/// Elements whose text never counts as document content.
pub(crate) const NON_CONTENT_TAGS: &[&str] = &["script", "style", "template", "noscript"];

/// Collapse whitespace runs to one ASCII space and trim.
///
/// Full-width (U+3000) and non-breaking (U+00A0) spaces count as whitespace.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical form of a label used for alias comparison.
///
/// ```rust
/// use procura_core::text::normalize_label;
///
/// assert_eq!(normalize_label("一、项目名称："), "项目名称");
/// assert_eq!(normalize_label("中标（成交）金额"), "中标成交金额");
/// assert_eq!(normalize_label(" Supplier Name: "), "suppliername");
/// ```
pub fn normalize_label(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let cleaned = normalize_whitespace(text).replace(['：', ':', '（', '）', '(', ')'], "");
    let cleaned = ENUMERATOR_PREFIX.replace(&cleaned, "");
    cleaned
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Single-line form of the whole document used by the fallback patterns.
///
/// Full-width colons become ASCII colons so one pattern covers both.
pub fn normalize_for_regex(text: &str) -> String {
    normalize_whitespace(&text.replace('：', ":"))
}

/// Remove every whitespace character.
pub fn strip_all_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Full-width digits (`０`-`９`) and full stops (`．`) as their ASCII forms.
///
/// ```rust
/// use procura_core::text::fold_fullwidth_digits;
///
/// assert_eq!(fold_fullwidth_digits("１９５．５万元"), "195.5万元");
/// ```
pub fn fold_fullwidth_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (u32::from(c) - u32::from('０')) as u8),
            '．' => '.',
            _ => c,
        })
        .collect()
}

/// Trim [`BOUNDARY_PUNCTUATION`] from both ends.
pub fn trim_boundary(text: &str) -> &str {
    text.trim_matches(BOUNDARY_PUNCTUATION)
}

/// Text nodes below `node` in document order, skipping non-content subtrees.
///
/// Iterative, so arbitrarily deep markup cannot exhaust the call stack.
fn content_text_nodes<'a>(node: NodeRef<'a, Node>) -> Vec<&'a str> {
    let mut texts = Vec::new();
    let mut pending = vec![node];
    while let Some(current) = pending.pop() {
        match current.value() {
            Node::Text(text) => texts.push(&**text),
            Node::Element(element) if NON_CONTENT_TAGS.contains(&element.name()) => {}
            _ => pending.extend(current.children().rev()),
        }
    }
    texts
}

/// Text of an element with its text nodes trimmed, emptied ones dropped, and
/// the rest joined by `separator`.
pub fn element_text(element: ElementRef<'_>, separator: &str) -> String {
    content_text_nodes(*element)
        .into_iter()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Whole-document text as seen by the fallback pass.
///
/// Every text node outside non-content elements, joined by newlines and then
/// passed through [`normalize_for_regex`].
pub fn document_text(document: &Html) -> String {
    let joined = content_text_nodes(document.tree.root()).join("\n");
    normalize_for_regex(&joined)
}

/// Readable plain text of a parsed document.
///
/// Tables are flattened to one line per row with cells joined by `" | "`;
/// whitespace is normalized per line and empty lines are dropped.
pub fn render_plain_text(document: &Html) -> String {
    let mut lines = Vec::new();
    for root in document.tree.root().children().filter_map(ElementRef::wrap) {
        render_node(root, &mut lines);
    }

    lines
        .iter()
        .flat_map(|chunk| chunk.lines())
        .map(normalize_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// [`render_plain_text`] of an HTML string.
///
/// ```rust
/// use procura_core::text::html_to_plain_text;
///
/// let text = html_to_plain_text(
///     "<p>中标结果</p><table><tr><td>供应商</td><td>某公司</td></tr></table>",
/// );
/// assert_eq!(text, "中标结果\n供应商 | 某公司");
/// ```
pub fn html_to_plain_text(html: &str) -> String {
    render_plain_text(&Html::parse_document(html))
}

fn render_node(element: ElementRef<'_>, out: &mut Vec<String>) {
    let mut pending: Vec<NodeRef<'_, Node>> = element.children().rev().collect();
    while let Some(node) = pending.pop() {
        if let Some(child_element) = ElementRef::wrap(node) {
            let name = child_element.value().name();
            if NON_CONTENT_TAGS.contains(&name) {
                continue;
            }
            if name == "table" {
                out.extend(render_table_rows(child_element));
                continue;
            }
            pending.extend(node.children().rev());
        } else if let Some(text) = node.value().as_text() {
            out.push(text.to_string());
        }
    }
}

fn render_table_rows(table: ElementRef<'_>) -> Vec<String> {
    let mut rows = Vec::new();
    for row in crate::table::direct_rows(table) {
        let values: Vec<String> = crate::table::direct_cells(row)
            .into_iter()
            .map(|cell| normalize_whitespace(&element_text(cell, " ")))
            .collect();
        if values.iter().all(String::is_empty) {
            continue;
        }
        rows.push(values.join(" | "));
    }
    rows
}
