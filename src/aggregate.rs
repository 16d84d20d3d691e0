//! Merging of leaf buckets from several trees into one candidate set.
use crate::metric::Scalar;
use crate::vptree::BucketEntry;

/// Concatenate `buckets` and keep one entry per training index.
///
/// The result is ordered by index. When an index occurs in several
/// buckets the entry from the earliest bucket is kept; its placeholder
/// distance is not meaningful either way.
pub fn collect<'b, F, I>(buckets: I) -> Vec<BucketEntry<F>>
where
    F: Scalar + 'b,
    I: IntoIterator<Item = &'b [BucketEntry<F>]>,
{
    let mut found: Vec<BucketEntry<F>> = Vec::new();
    for bucket in buckets {
        found.extend_from_slice(bucket);
    }

    // stable, so the first occurrence of each index survives dedup
    found.sort_by_key(|e| e.index);
    found.dedup_by_key(|e| e.index);
    found
}
