// the job variants the bucket-splitter emits and the queue runs. each
// variant owns raw pointers into the shared input/output buffers; the
// bucket-splitter guarantees their regions never overlap with a
// concurrently running job's, so no locking is needed here.

use std::ops::Range;
use std::sync::atomic::Ordering;

use log::debug;

use crate::annotated_string::AnnotatedString;
use crate::bucket_splitter::create_jobs;
use crate::error::SortError;
use crate::loser_tree::LoserTree;
use crate::merge_context::MergeContext;
use crate::merge_sort::concurrent_merge_sort::SendablePtrWrapper;
use crate::text::{lcp_and_cmp, StringHandle};

// copies a single already-sorted run straight to its output slot; emitted
// when a bucket-splitter pass finds only one live stream in a bucket.
pub(crate) struct CopyJob {
    pub input: SendablePtrWrapper<AnnotatedString>,
    pub output: SendablePtrWrapper<StringHandle>,
    pub length: usize,
}

impl CopyJob {
    fn run(self) {
        let input = self.input.as_mut_ptr();
        let output = self.output.as_mut_ptr();
        for i in 0..self.length {
            unsafe {
                *output.add(i) = (*input.add(i)).text;
            }
        }
    }
}

// merges exactly two sorted runs; emitted when a bucket-splitter pass
// finds exactly two live streams in a bucket.
pub(crate) struct BinaryMergeJob {
    pub input1: SendablePtrWrapper<AnnotatedString>,
    pub length1: usize,
    pub input2: SendablePtrWrapper<AnnotatedString>,
    pub length2: usize,
    pub output: SendablePtrWrapper<StringHandle>,
}

impl BinaryMergeJob {
    fn run(self) {
        let in1 = self.input1.as_mut_ptr();
        let in2 = self.input2.as_mut_ptr();
        let out = self.output.as_mut_ptr();

        // the streams are compared from scratch at this bucket boundary
        unsafe {
            if self.length1 > 0 {
                (*in1).lcp = 0;
            }
            if self.length2 > 0 {
                (*in2).lcp = 0;
            }
        }

        let mut i1 = 0usize;
        let mut i2 = 0usize;
        let mut written = 0usize;
        // common prefix between the current heads of the two streams,
        // bounded the same way the loser tree bounds its comparisons: the
        // new head of whichever stream just advanced shares at most its
        // own in-stream lcp with its predecessor, so the mutual lcp with
        // the other stream can never exceed that.
        let mut mutual_lcp: u32 = 0;

        while i1 < self.length1 && i2 < self.length2 {
            let a = unsafe { *in1.add(i1) };
            let b = unsafe { *in2.add(i2) };
            let (new_lcp, ord) = unsafe { lcp_and_cmp(a.text, b.text, mutual_lcp) };

            if ord != std::cmp::Ordering::Greater {
                unsafe { *out.add(written) = a.text };
                written += 1;
                i1 += 1;
                mutual_lcp = if i1 < self.length1 {
                    new_lcp.min(unsafe { (*in1.add(i1)).lcp })
                } else {
                    new_lcp
                };
            } else {
                unsafe { *out.add(written) = b.text };
                written += 1;
                i2 += 1;
                mutual_lcp = if i2 < self.length2 {
                    new_lcp.min(unsafe { (*in2.add(i2)).lcp })
                } else {
                    new_lcp
                };
            }
        }

        while i1 < self.length1 {
            unsafe {
                *out.add(written) = (*in1.add(i1)).text;
            }
            written += 1;
            i1 += 1;
        }
        while i2 < self.length2 {
            unsafe {
                *out.add(written) = (*in2.add(i2)).text;
            }
            written += 1;
            i2 += 1;
        }
    }
}

// merges K (one of 4, 8, 16, 32, 64) sorted runs through a loser tree,
// voluntarily splitting itself if work-sharing is enabled, idle workers
// exist, and enough of the job remains.
pub(crate) struct KWayMergeJob {
    pub input: SendablePtrWrapper<AnnotatedString>,
    pub output: SendablePtrWrapper<StringHandle>,
    pub ranges: Vec<Range<usize>>,
    pub length: usize,
    pub base_lcp: u32,
    pub next_base_lcp: u32,
}

impl KWayMergeJob {
    fn run(self, ctx: &MergeContext) -> Result<(), SortError> {
        match self.ranges.len() {
            4 => run_kway::<4>(self, ctx),
            8 => run_kway::<8>(self, ctx),
            16 => run_kway::<16>(self, ctx),
            32 => run_kway::<32>(self, ctx),
            64 => run_kway::<64>(self, ctx),
            k => Err(SortError::UnsupportedWidth(k)),
        }
    }
}

fn run_kway<const K: usize>(job: KWayMergeJob, ctx: &MergeContext) -> Result<(), SortError> {
    let input = job.input.as_mut_ptr();
    let length = job.length;
    let base_lcp = job.base_lcp;
    let next_base_lcp = job.next_base_lcp;
    let output = job.output;
    let ranges: [Range<usize>; K] = job
        .ranges
        .try_into()
        .map_err(|v: Vec<Range<usize>>| SortError::UnsupportedWidth(v.len()))?;

    // all K heads must be equally comparable at the starting depth; empty
    // placeholder ranges are left untouched so a padding range never
    // clobbers an unrelated position-0 record belonging to another job.
    for r in ranges.iter() {
        if !r.is_empty() {
            unsafe {
                (*input.add(r.start)).lcp = base_lcp;
            }
        }
    }

    let mut tree = LoserTree::<K>::new(input, &ranges);

    if merge_to_output(&mut tree, length, output.as_mut_ptr(), ctx) {
        return Ok(());
    }

    // ran out of bulk quota while idle workers were waiting: hand off the
    // remainder as fresh jobs instead of finishing it alone.
    let remaining = tree.ranges_of_remaining();
    let remaining_len: usize = remaining.iter().map(|r| r.len()).sum();
    let offset = length - remaining_len;

    debug!("k={} merge self-split at base_lcp {}: remaining_len={}", K, next_base_lcp, remaining_len);

    create_jobs(
        ctx,
        SendablePtrWrapper::new(input),
        SendablePtrWrapper::new(unsafe { output.as_mut_ptr().add(offset) }),
        &remaining[..],
        next_base_lcp,
    );

    if ctx.length_of_longest_job.load(Ordering::Relaxed) == length {
        ctx.length_of_longest_job.store(0, Ordering::Relaxed);
    }

    Ok(())
}

// drains the loser tree in merge_bulk_size chunks, checking after each
// chunk whether this job is the longest running one and, if so, whether
// it should give up the rest of its work to idle workers. returns false
// if it split off early.
fn merge_to_output<const K: usize>(
    tree: &mut LoserTree<K>,
    mut length: usize,
    mut output: *mut StringHandle,
    ctx: &MergeContext,
) -> bool {
    let bulk = ctx.config.merge_bulk_size;
    let mut last_length = length;

    while length >= bulk {
        if ctx.length_of_longest_job.load(Ordering::Relaxed) == last_length {
            ctx.length_of_longest_job.store(length, Ordering::Relaxed);
        }

        if ctx.length_of_longest_job.load(Ordering::Relaxed) < length {
            ctx.length_of_longest_job.store(length, Ordering::Relaxed);
        } else if ctx.config.use_work_sharing
            && ctx.queue.has_idle()
            && length > ctx.config.share_work_threshold
            && ctx.length_of_longest_job.load(Ordering::Relaxed) == length
        {
            return false;
        }

        tree.write_elements_to_stream(output, bulk);
        last_length = length;
        length -= bulk;
        output = unsafe { output.add(bulk) };
    }

    tree.write_elements_to_stream(output, length);
    true
}

// kicks off a partition's worth of work: runs the bucket-splitter over
// the whole range once, at base_lcp = 0.
pub(crate) struct InitialSplitJob {
    pub input: SendablePtrWrapper<AnnotatedString>,
    pub output: SendablePtrWrapper<StringHandle>,
    pub ranges: Vec<Range<usize>>,
    pub length: usize,
}

impl InitialSplitJob {
    fn run(self, ctx: &MergeContext) -> Result<(), SortError> {
        // prevents the very first merge job from immediately offering to split
        ctx.length_of_longest_job.store(self.length, Ordering::Relaxed);
        create_jobs(ctx, self.input, self.output, &self.ranges, 0);
        ctx.length_of_longest_job.store(0, Ordering::Relaxed);
        Ok(())
    }
}

pub(crate) enum Job {
    Copy(CopyJob),
    BinaryMerge(BinaryMergeJob),
    KWayMerge(KWayMergeJob),
    InitialSplit(InitialSplitJob),
}

impl Job {
    pub(crate) fn run(self, ctx: &MergeContext) -> Result<(), SortError> {
        match self {
            Job::Copy(j) => {
                j.run();
                Ok(())
            }
            Job::BinaryMerge(j) => {
                j.run();
                Ok(())
            }
            Job::KWayMerge(j) => j.run(ctx),
            Job::InitialSplit(j) => j.run(ctx),
        }
    }
}

// Safety: every raw pointer a job carries is into a region the
// bucket-splitter guarantees is exclusively owned by that job until it
// either finishes or hands the region off (as fresh jobs) to the queue.
unsafe impl Send for Job {}
