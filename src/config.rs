// tunables for a sort call. callers with topology information should
// prefer NumaTopology over hand-tuning num_threads/num_partitions here.
#[derive(Clone, Debug)]
pub struct SortConfig {
    // elements a work-sharing chunk writes before re-checking whether to
    // keep running or hand off the remainder
    pub merge_bulk_size: usize,
    // a running merge only offers to split when its remaining length is
    // at least this many elements
    pub share_work_threshold: usize,
    pub use_work_sharing: bool,
    // initial packed-key width in bytes; clamped to <= 8 (the packed key
    // is a u64) wherever it's read, since key_mask/packed_key can't
    // resolve anything wider
    pub initial_key_width: usize,
    pub num_threads: Option<usize>,
    pub num_partitions: Option<usize>,
}

impl Default for SortConfig {
    fn default() -> Self {
        SortConfig {
            merge_bulk_size: 3000,
            share_work_threshold: 3 * 3000,
            use_work_sharing: true,
            initial_key_width: crate::text::KEY_BYTES,
            num_threads: None,
            num_partitions: None,
        }
    }
}
