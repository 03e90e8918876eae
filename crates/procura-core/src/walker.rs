//! Document traversal: `label：value` text blocks and tables.
//!
//! The walker visits the element descendants of the body in document order.
//! Tables are expanded with [`TableMatrix`] and interpreted once, and nothing
//! below them is walked. Block-level elements have their text (line breaks preserved)
//! read as `label：value` clauses, and the walk continues into their children
//! so nested blocks are seen too.

use crate::context::AgencyContext;
use crate::matcher::LabelMatcher;
use crate::schema::FieldName;
use crate::store::FieldStores;
use crate::table::TableMatrix;
use crate::text::{element_text, normalize_label, NON_CONTENT_TAGS};
use ego_tree::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

/// Elements whose text is read as a block.
pub const BLOCK_TAGS: &[&str] = &[
    "p", "li", "span", "strong", "em", "b", "div", "td", "th", "dd", "dt", "h1", "h2", "h3", "h4",
    "h5", "h6",
];

/// Header cells that mark a bidder-ranking column.
pub const RANK_HEADERS: &[&str] = &["得分排名", "得分排位", "得分排名情况", "排名", "综合排名"];

/// Rank cell values of the winning row.
pub const RANK_WINNERS: &[&str] = &["1", "第一名", "第一", "冠军"];

static LABEL_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.{1,40}?)[：:]\s*(.+)").expect("valid label regex"));
static NUMBERED_LABEL_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.{1,40}?)(供应商名称|供应商地址|采购单位名称|采购单位地址)[：:\s]+(.+)")
        .expect("valid numbered label regex")
});
static NESTED_LABEL_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.{1,40}?)[：:\s]+(.+)").expect("valid nested label regex"));
static GENERIC_SUBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"按.*[《<].*招标.*文件.*[》>].*要求.*执行|按.*[《<].*投标.*文件.*[》>].*执行|详见.*文件|详见.*公告|见.*附件",
    )
    .expect("valid generic subject regex")
});
static SUBJECT_CORE_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(系统|设备|服务|工程|项目|采购|建设)").expect("valid token regex"));
static PROJECT_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(系统|设备|服务|工程|项目|采购|建设|平台|软件|硬件)").expect("valid token regex")
});

const SHORT_SUBJECT_CHARS: usize = 4;
const PROJECT_TOKEN_BONUS: usize = 20;

/// Walks one document, feeding every candidate into `stores`.
pub struct DocumentWalker<'a, 's> {
    matcher: &'a LabelMatcher,
    stores: &'a mut FieldStores<'s>,
    processed_tables: HashSet<NodeId>,
}

impl<'a, 's> DocumentWalker<'a, 's> {
    pub fn new(matcher: &'a LabelMatcher, stores: &'a mut FieldStores<'s>) -> Self {
        Self {
            matcher,
            stores,
            processed_tables: HashSet::new(),
        }
    }

    /// Visit the element descendants of `element` in document order.
    ///
    /// The walk keeps its own stack, so nesting depth is bounded by memory
    /// rather than by the thread's stack. A wrapper whose only content is one
    /// child element has exactly that child's text, which is handed down
    /// instead of being read again.
    pub fn walk<'d>(&mut self, element: ElementRef<'d>) {
        let mut pending: Vec<(ElementRef<'d>, Option<Rc<str>>)> = element
            .children()
            .filter_map(ElementRef::wrap)
            .rev()
            .map(|child| (child, None))
            .collect();

        while let Some((current, known_text)) = pending.pop() {
            let name = current.value().name();
            if name == "table" {
                if self.processed_tables.insert(current.id()) {
                    self.process_table(current);
                }
                continue;
            }

            let is_block = BLOCK_TAGS.contains(&name);
            let text = match known_text {
                Some(text) => Some(text),
                None if is_block => Some(Rc::from(element_text(current, "\n"))),
                None => None,
            };
            if is_block {
                if let Some(block) = text.as_deref().filter(|block| !block.is_empty()) {
                    self.process_text_block(block);
                }
            }

            let children: Vec<ElementRef<'d>> =
                current.children().filter_map(ElementRef::wrap).collect();
            let inherited = text.filter(|_| passes_text_to_sole_child(current, &children));
            for child in children.into_iter().rev() {
                pending.push((child, inherited.clone()));
            }
        }
    }

    /// Read `label：value` clauses from a block of text.
    ///
    /// A line ending in a semicolon is joined with the next one, then each
    /// line is split into clauses on semicolons.
    pub fn process_text_block(&mut self, text: &str) {
        let mut context = AgencyContext::default();
        for segment in merge_continued_lines(text) {
            context = context.after_segment(&segment);

            for clause in segment.split(['；', ';']).map(str::trim) {
                if clause.is_empty() {
                    continue;
                }
                let Some((field, value)) = self.resolve_clause(clause) else {
                    continue;
                };
                if context.suppresses(field) {
                    log::debug!("dropping {field} '{value}' inside agency section");
                    continue;
                }
                self.stores.add_candidate(field, value);
            }
        }
    }

    fn resolve_clause<'c>(&self, clause: &'c str) -> Option<(FieldName, &'c str)> {
        let (label, value) = split_clause(clause)?;
        if let Some(field) = self.matcher.resolve(label) {
            return Some((field, value));
        }
        // "一、中标信息：供应商名称：某公司" keeps its real label one level in.
        let nested = NESTED_LABEL_VALUE.captures(value)?;
        let (inner_label, inner_value) = (nested.get(1)?.as_str(), nested.get(2)?.as_str());
        self.matcher.resolve(inner_label).map(|field| (field, inner_value))
    }

    fn process_table(&mut self, table: ElementRef<'_>) {
        let matrix = TableMatrix::from_table(table);
        log::trace!("table {}x{}", matrix.rows(), matrix.cols());
        self.interpret_table(&matrix);
    }

    /// Interpret an expanded table.
    ///
    /// The first row with two resolvable cells (or one, in a row wider than
    /// two) becomes the header, and later rows are read column by column
    /// under it. With a ranking column, only the winning rows count. Every
    /// row is also read as `label | value | label | value` pairs.
    pub fn interpret_table(&mut self, matrix: &TableMatrix) {
        let mut header: BTreeMap<usize, FieldName> = BTreeMap::new();
        let mut rank_col: Option<usize> = None;
        let mut context = AgencyContext::default();

        for r in 0..matrix.rows() {
            let row = matrix.row_texts(r);

            if header.is_empty() {
                let candidates: BTreeMap<usize, FieldName> = row
                    .iter()
                    .enumerate()
                    .filter_map(|(col, cell)| self.matcher.resolve(cell).map(|f| (col, f)))
                    .collect();
                if !candidates.is_empty() && (candidates.len() >= 2 || row.len() > 2) {
                    rank_col = row.iter().position(|cell| is_rank_header(cell));
                    log::debug!(
                        "header row {r} (from source row {:?}): {candidates:?}, rank column {rank_col:?}",
                        matrix.source_row(r, 0)
                    );
                    header = candidates;
                    continue;
                }
            }

            if let Some(col) = rank_col {
                if col < row.len() && !is_rank_winner(row[col]) {
                    log::debug!("skipping row {r}: rank '{}'", row[col]);
                    continue;
                }
            }

            if !header.is_empty() {
                self.read_data_row(&row, &header);
            }
            if row.len() >= 2 {
                self.read_pairs(&row, &mut context);
            }
        }
    }

    fn read_data_row(&mut self, row: &[&str], header: &BTreeMap<usize, FieldName>) {
        for (&col, &field) in header {
            let Some(&cell) = row.get(col) else {
                continue;
            };
            if self.matcher.resolve(cell).is_some() {
                continue;
            }
            let mut value = cell;
            if field == FieldName::SubjectMatter && looks_generic_subject(value) {
                if let Some(better) = better_subject_cell(row, col, header) {
                    log::debug!("subject '{value}' replaced by '{better}' from the same row");
                    value = better;
                }
            }
            self.stores.add_candidate(field, value);
        }
    }

    fn read_pairs(&mut self, row: &[&str], context: &mut AgencyContext) {
        for pair in row.chunks_exact(2) {
            let (label, value) = (pair[0], pair[1]);
            let field = self.matcher.resolve(label);
            *context = context.after_label(label, field);
            let Some(field) = field else {
                continue;
            };
            if context.suppresses(field) {
                log::debug!("dropping {field} '{value}' after agency label");
                continue;
            }
            self.stores.add_candidate(field, value);
        }
    }
}

/// Lines of a block, with a line ending in a semicolon joined to the next.
fn merge_continued_lines(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut merged = Vec::with_capacity(lines.len());
    let mut idx = 0;
    while idx < lines.len() {
        let line = lines[idx];
        if line.ends_with(['；', ';']) && idx + 1 < lines.len() {
            merged.push(format!("{line} {}", lines[idx + 1]));
            idx += 2;
        } else {
            merged.push(line.to_string());
            idx += 1;
        }
    }
    merged
}

/// Split a clause into label and value.
///
/// Without a colon, an exact party label preceded by a bare number
/// ("1 供应商名称 某公司") still counts.
fn split_clause(clause: &str) -> Option<(&str, &str)> {
    if let Some(caps) = LABEL_VALUE.captures(clause) {
        return Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()));
    }
    let caps = NUMBERED_LABEL_VALUE.captures(clause)?;
    let prefix = caps.get(1)?.as_str().trim();
    if prefix.is_empty() || !prefix.chars().all(char::is_numeric) {
        return None;
    }
    Some((caps.get(2)?.as_str(), caps.get(3)?.as_str()))
}

/// `element` has no text of its own and a single content child, so both
/// have the same [`element_text`].
fn passes_text_to_sole_child(element: ElementRef<'_>, children: &[ElementRef<'_>]) -> bool {
    let [child] = children else {
        return false;
    };
    !NON_CONTENT_TAGS.contains(&child.value().name())
        && element
            .children()
            .filter_map(|node| node.value().as_text())
            .all(|text| text.trim().is_empty())
}

fn is_rank_header(cell: &str) -> bool {
    let normalized = normalize_label(cell);
    RANK_HEADERS.iter().any(|header| normalize_label(header) == normalized)
}

fn is_rank_winner(cell: &str) -> bool {
    let normalized = normalize_label(cell);
    RANK_WINNERS.iter().any(|winner| normalize_label(winner) == normalized)
}

/// Boilerplate ("详见招标文件") or too short to name a project.
fn looks_generic_subject(value: &str) -> bool {
    GENERIC_SUBJECT.is_match(value)
        || (value.trim().chars().count() <= SHORT_SUBJECT_CHARS
            && !SUBJECT_CORE_TOKENS.is_match(value))
}

/// Best non-header cell of the row to stand in for a generic subject.
fn better_subject_cell<'r>(
    row: &[&'r str],
    subject_col: usize,
    header: &BTreeMap<usize, FieldName>,
) -> Option<&'r str> {
    let original = row[subject_col];
    let mut best: Option<(usize, &str)> = None;

    for (col, cell) in row.iter().enumerate() {
        if col == subject_col || header.contains_key(&col) {
            continue;
        }
        let candidate = cell.trim();
        if candidate.is_empty() || candidate == original {
            continue;
        }
        let score = if GENERIC_SUBJECT.is_match(candidate) {
            0
        } else {
            let bonus = if PROJECT_TOKENS.is_match(candidate) {
                PROJECT_TOKEN_BONUS
            } else {
                0
            };
            candidate.chars().count() + bonus
        };
        if score > best.map_or(0, |(best_score, _)| best_score) {
            best = Some((score, candidate));
        }
    }

    best.map(|(_, cell)| cell)
}
