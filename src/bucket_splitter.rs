// the adaptive bucket-splitter. scans every live stream's current head in
// lockstep, groups streams by the packed key at the current depth, and
// emits one job per group: a copy for a singleton group, a binary merge
// for a pair, or a k-way merge (padded up to the next power of two)
// otherwise. the key width shrinks adaptively when too many groups turn
// out shorter than a bulk chunk.

use std::ops::Range;

use log::{debug, trace};

use crate::annotated_string::AnnotatedString;
use crate::jobs::{BinaryMergeJob, CopyJob, Job, KWayMergeJob};
use crate::merge_context::MergeContext;
use crate::merge_sort::concurrent_merge_sort::SendablePtrWrapper;
use crate::text::{key_mask, packed_key, StringHandle};

// scans forward from start (exclusive) for the first element whose packed
// key, at key_mask resolution, differs from last_character. an element
// whose own lcp exceeds max_allowed_lcp still shares the bucket's prefix
// and is skipped without repacking. returns the bucket length and the
// packed key that ended it (or u64::MAX if the stream was exhausted).
fn find_next_splitter(
    input: *const AnnotatedString,
    start: usize,
    end: usize,
    base_lcp: u32,
    max_allowed_lcp: u32,
    key_mask: u64,
    last_character: u64,
) -> (usize, u64) {
    let mut i = start + 1;
    while i < end {
        let lcp = unsafe { (*input.add(i)).lcp };
        if lcp <= max_allowed_lcp {
            let text = unsafe { (*input.add(i)).text };
            let character = packed_key(text, base_lcp as usize);
            if (character & key_mask) != (last_character & key_mask) {
                return (i - start, character);
            }
        }
        i += 1;
    }
    (i - start, u64::MAX)
}

fn enqueue_merge_job(
    ctx: &MergeContext,
    input: SendablePtrWrapper<AnnotatedString>,
    output: SendablePtrWrapper<StringHandle>,
    ranges: Vec<Range<usize>>,
    length: usize,
    base_lcp: u32,
    next_base_lcp: u32,
) {
    debug_assert!(matches!(ranges.len(), 4 | 8 | 16 | 32 | 64));
    ctx.queue.push(Job::KWayMerge(KWayMergeJob {
        input,
        output,
        ranges,
        length,
        base_lcp,
        next_base_lcp,
    }));
}

pub(crate) fn create_jobs(
    ctx: &MergeContext,
    input: SendablePtrWrapper<AnnotatedString>,
    output: SendablePtrWrapper<StringHandle>,
    ranges: &[Range<usize>],
    base_lcp: u32,
) {
    let num_streams = ranges.len();
    debug!("bucket-splitter invoked at base_lcp {} over {} streams", base_lcp, num_streams);
    let input_ptr = input.as_mut_ptr();

    let mut cursor: Vec<usize> = ranges.iter().map(|r| r.start).collect();
    let ends: Vec<usize> = ranges.iter().map(|r| r.end).collect();
    let mut splitter_character: Vec<u64> = (0..num_streams)
        .map(|k| {
            if ranges[k].is_empty() {
                u64::MAX
            } else {
                packed_key(unsafe { (*input_ptr.add(cursor[k])).text }, base_lcp as usize)
            }
        })
        .collect();

    // key_mask/packed_key only resolve KEY_BYTES (8) bytes of a packed u64
    // key; anything wider would silently collapse back to the 8-byte mask.
    let mut key_width = ctx.config.initial_key_width.min(crate::text::KEY_BYTES);
    let mut too_short: u32 = 0;
    let mut not_too_short: u32 = 0;
    let output_base = output.as_mut_ptr();
    let mut output_ptr = output_base;
    let mut created_jobs = 0usize;

    loop {
        let max_allowed_lcp = base_lcp + key_width as u32 - 1;
        let mask = key_mask(key_width);

        let mut curr_bucket = u64::MAX;
        let mut found: Vec<usize> = Vec::with_capacity(num_streams);

        for k in 0..num_streams {
            let splitter = splitter_character[k] & mask;
            if splitter < curr_bucket {
                curr_bucket = splitter;
                found.clear();
                found.push(k);
            } else if splitter == curr_bucket {
                found.push(k);
            }
        }

        if curr_bucket == (u64::MAX & mask) {
            break;
        }

        let length;

        match found.len() {
            1 => {
                let k = found[0];
                let start = cursor[k];
                let (advance, new_char) =
                    find_next_splitter(input_ptr, start, ends[k], base_lcp, max_allowed_lcp, mask, splitter_character[k]);
                cursor[k] += advance;
                splitter_character[k] = new_char;
                length = advance;

                trace!(
                    "enqueue copy job: output_offset={} length={}",
                    unsafe { output_ptr.offset_from(output_base) },
                    length
                );
                ctx.queue.push(Job::Copy(CopyJob {
                    input: SendablePtrWrapper::new(unsafe { input_ptr.add(start) }),
                    output: SendablePtrWrapper::new(output_ptr),
                    length,
                }));
            }
            2 => {
                let k1 = found[0];
                let start1 = cursor[k1];
                let (advance1, new_char1) =
                    find_next_splitter(input_ptr, start1, ends[k1], base_lcp, max_allowed_lcp, mask, splitter_character[k1]);
                cursor[k1] += advance1;
                splitter_character[k1] = new_char1;

                let k2 = found[1];
                let start2 = cursor[k2];
                let (advance2, new_char2) =
                    find_next_splitter(input_ptr, start2, ends[k2], base_lcp, max_allowed_lcp, mask, splitter_character[k2]);
                cursor[k2] += advance2;
                splitter_character[k2] = new_char2;

                length = advance1 + advance2;

                trace!(
                    "enqueue binary merge job: output_offset={} length={}",
                    unsafe { output_ptr.offset_from(output_base) },
                    length
                );
                ctx.queue.push(Job::BinaryMerge(BinaryMergeJob {
                    input1: SendablePtrWrapper::new(unsafe { input_ptr.add(start1) }),
                    length1: advance1,
                    input2: SendablePtrWrapper::new(unsafe { input_ptr.add(start2) }),
                    length2: advance2,
                    output: SendablePtrWrapper::new(output_ptr),
                }));
            }
            n => {
                let num_new_streams = n.next_power_of_two();
                let mut new_ranges: Vec<Range<usize>> = Vec::with_capacity(num_new_streams);
                let mut total_length = 0usize;

                for &k in &found {
                    let start = cursor[k];
                    let (advance, new_char) =
                        find_next_splitter(input_ptr, start, ends[k], base_lcp, max_allowed_lcp, mask, splitter_character[k]);
                    cursor[k] += advance;
                    splitter_character[k] = new_char;
                    new_ranges.push(start..start + advance);
                    total_length += advance;
                }
                for _ in n..num_new_streams {
                    new_ranges.push(0..0); // unused padding stream
                }

                length = total_length;
                trace!(
                    "enqueue k-way merge job: k={} output_offset={} length={}",
                    num_new_streams,
                    unsafe { output_ptr.offset_from(output_base) },
                    length
                );
                enqueue_merge_job(ctx, input, SendablePtrWrapper::new(output_ptr), new_ranges, length, base_lcp, max_allowed_lcp + 1);
            }
        }

        output_ptr = unsafe { output_ptr.add(length) };
        created_jobs += 1;

        if key_width > 1 {
            if length < ctx.config.merge_bulk_size {
                too_short += 1;
            } else {
                not_too_short += 1;
            }

            if too_short + not_too_short > 30 {
                if (too_short as f32 / (too_short + not_too_short) as f32) > 0.5 {
                    key_width = (key_width - 1).max(1);
                    debug!("bucket-splitter shrank key width to {} bytes at base_lcp {}", key_width, base_lcp);
                    too_short = 0;
                    not_too_short = 0;
                }
            }
        }
    }

    debug!("bucket-splitter pass at base_lcp {} created {} jobs", base_lcp, created_jobs);
}
