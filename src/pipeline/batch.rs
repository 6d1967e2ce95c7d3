//! Bucketing and batch partitioning.
//!
//! [`Buckets`] groups classified page indices by courier; [`split`] cuts one
//! courier's pages into bounded, numbered batches; [`materialize`] turns a
//! batch into PDF bytes through a [`PageSource`].
//!
//! ```text
//! pages  0 1 2 3 4 5 6 7 8
//! label  D D O G D O O G D
//!
//! DHL    [0 1 4 8]  ──max 3──▶  #1 [0 1 4]  #2 [8]
//! GDEX   [3 7]      ──max 3──▶  #1 [3 7]
//! OTHERS [2 5 6]    ──max 3──▶  #1 [2 5 6]
//! ```

use crate::error::BatchError;
use crate::pipeline::classify::Courier;
use crate::pipeline::extract::PageSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default maximum number of pages per output file.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 20;

/// Courier → page indices, each list in original page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buckets {
    pages: BTreeMap<Courier, Vec<usize>>,
}

impl Buckets {
    /// Build buckets from `(page index, courier)` pairs in any order.
    ///
    /// Pairs are stably sorted by page index first, so each bucket comes out
    /// in original page order even when classification ran out of order.
    pub fn from_classified(mut classified: Vec<(usize, Courier)>) -> Self {
        classified.sort_by_key(|(idx, _)| *idx);
        let mut buckets = Self::default();
        for (idx, courier) in classified {
            buckets.pages.entry(courier).or_default().push(idx);
        }
        buckets
    }

    /// All `page_count` pages routed to one courier.
    pub fn whole_document(courier: Courier, page_count: usize) -> Self {
        let mut buckets = Self::default();
        if page_count > 0 {
            buckets.pages.insert(courier, (0..page_count).collect());
        }
        buckets
    }

    pub fn get(&self, courier: Courier) -> &[usize] {
        self.pages.get(&courier).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-empty buckets in courier declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Courier, &[usize])> {
        self.pages
            .iter()
            .filter(|(_, pages)| !pages.is_empty())
            .map(|(courier, pages)| (*courier, pages.as_slice()))
    }

    pub fn counts(&self) -> BTreeMap<Courier, usize> {
        self.iter().map(|(c, pages)| (c, pages.len())).collect()
    }

    pub fn total_pages(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }
}

/// One bounded group of pages for one courier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub courier: Courier,
    /// 1-based, contiguous per courier.
    pub number: usize,
    /// Source page indices (0-based) in output order.
    pub pages: Vec<usize>,
}

/// Partition `pages` into consecutive batches of at most `max_size` pages.
///
/// Every batch except possibly the last holds exactly `max_size` pages.
/// Concatenating the batches in number order reproduces `pages`. An empty
/// input yields no batches.
///
/// # Panics
/// Panics if `max_size` is zero; [`crate::config::SplitConfigBuilder::build`]
/// rejects that value.
pub fn split(courier: Courier, pages: &[usize], max_size: usize) -> Vec<Batch> {
    assert!(max_size > 0, "max_size must be at least 1");
    pages
        .chunks(max_size)
        .enumerate()
        .map(|(i, chunk)| Batch {
            courier,
            number: i + 1,
            pages: chunk.to_vec(),
        })
        .collect()
}

/// Split every non-empty bucket.
pub fn split_buckets(buckets: &Buckets, max_size: usize) -> Vec<Batch> {
    buckets
        .iter()
        .flat_map(|(courier, pages)| split(courier, pages, max_size))
        .collect()
}

/// Assemble the batch's pages into a new PDF document.
pub fn materialize<S>(source: &S, batch: &Batch) -> Result<Vec<u8>, BatchError>
where
    S: PageSource + ?Sized,
{
    source
        .assemble(&batch.pages)
        .map_err(|detail| BatchError::AssembleFailed {
            courier: batch.courier,
            batch: batch.number,
            detail,
        })
}
