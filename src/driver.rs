// top-level entry points: partition, locally sort each partition in
// parallel, then drive the bucket-splitter/job-queue merge to quiescence.

use std::ops::Range;

use log::debug;

use crate::annotated_string::AnnotatedString;
use crate::config::SortConfig;
use crate::error::SortError;
use crate::job_queue::run_to_quiescence;
use crate::jobs::{InitialSplitJob, Job};
use crate::local_sort::{ConcurrentLocalSorter, LocalSorter};
use crate::merge_context::MergeContext;
use crate::merge_sort::concurrent_merge_sort::{RangePartition, SendablePtrWrapper};
use crate::numa::{NumaTopology, SingleNodeTopology};
use crate::text::StringHandle;

// sorts strings in place using the default local sorter and a single-node
// topology sized from the available CPU count.
pub fn sort(strings: &mut [StringHandle]) -> Result<(), SortError> {
    sort_default(strings, &SortConfig::default())
}

// like sort, but with an explicit SortConfig.
pub fn sort_default(strings: &mut [StringHandle], config: &SortConfig) -> Result<(), SortError> {
    sort_with(strings, config, &ConcurrentLocalSorter, &SingleNodeTopology::new())
}

// fully pluggable entry point: supply the local sorter and topology
// implementations yourself.
pub fn sort_with<L, N>(strings: &mut [StringHandle], config: &SortConfig, local_sorter: &L, topology: &N) -> Result<(), SortError>
where
    L: LocalSorter,
    N: NumaTopology,
{
    let n = strings.len();
    if n <= 1 {
        return Ok(());
    }

    let num_partitions = config.num_partitions.unwrap_or_else(|| topology.partition_count()).clamp(1, n);
    let num_threads = config.num_threads.unwrap_or_else(|| topology.worker_count()).max(1);
    let threads_per_partition = (num_threads / num_partitions).max(1);

    debug!(
        "starting sort of {} strings across {} partitions with {} worker threads",
        n, num_partitions, num_threads
    );

    let partition = RangePartition::evenly_partition(0..n, num_partitions);

    let mut tmp: Vec<AnnotatedString> = Vec::new();
    tmp.try_reserve_exact(n).map_err(|_| SortError::OutOfMemory)?;
    tmp.resize(n, AnnotatedString::default());

    {
        let tmp_ptr = SendablePtrWrapper::new(tmp.as_mut_ptr());
        let parts = partition.split_borrow(strings);

        crossbeam::thread::scope(|scope| {
            for (part_index, part) in parts.into_iter().enumerate() {
                let start = partition.part_start(part_index);
                scope.spawn(move |_| {
                    let handles: Vec<StringHandle> = part.to_vec();
                    let annotated = local_sorter.sort_and_annotate(handles, threads_per_partition);
                    unsafe {
                        std::ptr::copy_nonoverlapping(annotated.as_ptr(), tmp_ptr.as_mut_ptr().add(start), annotated.len());
                    }
                });
            }
        })
        .unwrap();
    }

    let ranges: Vec<Range<usize>> = (0..partition.part_num()).map(|i| partition.part_at(i)).collect();

    let ctx = MergeContext::new(config.clone());
    let initial_job = Job::InitialSplit(InitialSplitJob {
        input: SendablePtrWrapper::new(tmp.as_mut_ptr()),
        output: SendablePtrWrapper::new(strings.as_mut_ptr()),
        ranges,
        length: n,
    });

    run_to_quiescence(&ctx, topology, vec![initial_job], num_threads)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leak(s: &str) -> StringHandle {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        StringHandle::from_nul_terminated(Box::leak(bytes.into_boxed_slice()))
    }

    fn as_str(h: StringHandle) -> String {
        let mut v = Vec::new();
        let mut i = 0usize;
        loop {
            let b = unsafe { h.byte(i) };
            if b == 0 {
                break;
            }
            v.push(b);
            i += 1;
        }
        String::from_utf8(v).unwrap()
    }

    #[test]
    fn sorts_small_random_input() {
        let words = [
            "pear", "apple", "kiwi", "banana", "apricot", "fig", "date", "grape", "plum", "mango", "pear", "apple",
        ];
        let mut handles: Vec<StringHandle> = words.iter().map(|w| leak(w)).collect();

        sort(&mut handles).unwrap();

        let result: Vec<String> = handles.iter().map(|h| as_str(*h)).collect();
        let mut expected: Vec<String> = words.iter().map(|s| s.to_string()).collect();
        expected.sort();

        assert_eq!(result, expected);
    }

    #[test]
    fn sorts_empty_and_singleton() {
        let mut empty: Vec<StringHandle> = Vec::new();
        sort(&mut empty).unwrap();
        assert!(empty.is_empty());

        let mut one = vec![leak("solo")];
        sort(&mut one).unwrap();
        assert_eq!(as_str(one[0]), "solo");
    }

    #[test]
    fn sorts_all_duplicates() {
        let mut handles: Vec<StringHandle> = (0..50).map(|_| leak("same")).collect();
        sort(&mut handles).unwrap();
        for h in handles {
            assert_eq!(as_str(h), "same");
        }
    }

    #[test]
    fn sorts_long_shared_prefixes() {
        let mut words: Vec<String> = (0..200).map(|i| format!("common_prefix_value_{:04}", 199 - i)).collect();
        let handles: Vec<StringHandle> = words.iter().map(|w| leak(w)).collect();
        let mut handles = handles;

        sort(&mut handles).unwrap();

        words.sort();
        let result: Vec<String> = handles.iter().map(|h| as_str(*h)).collect();
        assert_eq!(result, words);
    }

    #[test]
    fn sorts_with_forced_multi_partition_self_split() {
        let mut config = SortConfig::default();
        config.merge_bulk_size = 4;
        config.share_work_threshold = 8;
        config.num_partitions = Some(4);
        config.num_threads = Some(4);

        let mut words: Vec<String> = (0..500).map(|i| format!("item-{:05}", (i * 7919) % 500)).collect();
        let handles: Vec<StringHandle> = words.iter().map(|w| leak(w)).collect();
        let mut handles = handles;

        sort_default(&mut handles, &config).unwrap();

        words.sort();
        let result: Vec<String> = handles.iter().map(|h| as_str(*h)).collect();
        assert_eq!(result, words);
    }
}
