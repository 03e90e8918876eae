//! Many documents at once.
//!
//! Documents share nothing but the schema, so the runner hands them to a
//! rayon pool when more than one worker is requested and walks them in order
//! otherwise. A failing document is logged and counted; it never stops the
//! batch.

use crate::error::Result;
use crate::extractor::Extractor;
use crate::record::Record;
use crate::schema::FieldSchema;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Aggregate counts of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Outcome for one input.
#[derive(Debug)]
pub struct BatchItem {
    pub id: String,
    pub outcome: Result<Record>,
}

/// All outcomes, in input order, plus their counts.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// Records of the documents that succeeded, in input order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.items.iter().filter_map(|item| item.outcome.as_ref().ok())
    }
}

/// Extract every `(id, html)` input with a shared schema.
///
/// ```rust
/// use std::sync::Arc;
/// use procura_core::batch::extract_batch;
/// use procura_core::FieldSchema;
///
/// let inputs = vec![
///     ("a.html".to_string(), "<p>中标金额：50万元</p>".to_string()),
///     ("b.html".to_string(), String::new()),
/// ];
/// let report = extract_batch(Arc::new(FieldSchema::default()), &inputs, 2);
/// assert_eq!(report.stats.total, 2);
/// assert_eq!(report.stats.succeeded, 2);
/// let amounts: Vec<_> = report.records().map(|r| r.award_amount.as_str()).collect();
/// assert_eq!(amounts, vec!["500000.00", ""]);
/// ```
pub fn extract_batch(
    schema: Arc<FieldSchema>,
    inputs: &[(String, String)],
    workers: usize,
) -> BatchReport {
    let extractor = Extractor::new(schema);
    run_batch(
        inputs,
        workers,
        |(id, html)| BatchItem {
            id: id.clone(),
            outcome: extractor.extract_html(html),
        },
        |_| {},
    )
}

/// Run `job` over `inputs` on up to `workers` threads.
///
/// `on_item` sees every finished item (from worker threads when parallel),
/// which is where a caller ticks a progress bar. Items come back in input
/// order regardless of completion order.
pub fn run_batch<T, F, P>(inputs: &[T], workers: usize, job: F, on_item: P) -> BatchReport
where
    T: Sync,
    F: Fn(&T) -> BatchItem + Sync + Send,
    P: Fn(&BatchItem) + Sync + Send,
{
    let succeeded = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let process = |input: &T| -> BatchItem {
        let item = job(input);
        match &item.outcome {
            Ok(_) => {
                succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                failed.fetch_add(1, Ordering::Relaxed);
                log::warn!("{}: {e}", item.id);
            }
        }
        on_item(&item);
        item
    };

    let items: Vec<BatchItem> = if workers > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(|| inputs.par_iter().map(&process).collect()),
            Err(e) => {
                log::warn!("could not start {workers} workers ({e}), using the global pool");
                inputs.par_iter().map(&process).collect()
            }
        }
    } else {
        inputs.iter().map(&process).collect()
    };

    let stats = BatchStats {
        total: items.len(),
        succeeded: succeeded.into_inner(),
        failed: failed.into_inner(),
    };
    log::debug!("batch finished: {stats:?}");
    BatchReport { items, stats }
}
