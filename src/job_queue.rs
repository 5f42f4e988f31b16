// the lock-free job queue and its drive-to-quiescence loop. Ported from the
// reference's JobQueueT::executeThreadWork: a SegQueue of jobs plus an idle
// counter. a worker spins trying to pop work; once the queue looks empty
// it marks itself idle and keeps checking -- either the queue gets fed
// again, or every worker ends up idle simultaneously, the only
// termination signal.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crossbeam::queue::SegQueue;

use crate::error::SortError;
use crate::jobs::Job;
use crate::merge_context::MergeContext;
use crate::numa::NumaTopology;

pub(crate) struct JobQueue {
    queue: SegQueue<Job>,
    idle_count: AtomicUsize,
    failure: Mutex<Option<SortError>>,
}

impl JobQueue {
    pub fn new() -> Self {
        JobQueue {
            queue: SegQueue::new(),
            idle_count: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    pub fn push(&self, job: Job) {
        self.queue.push(job);
    }

    pub fn push_all(&self, jobs: impl IntoIterator<Item = Job>) {
        for job in jobs {
            self.push(job);
        }
    }

    // whether at least one worker is idle -- the signal a running merge
    // uses to decide whether offering to split is worth it.
    pub fn has_idle(&self) -> bool {
        self.idle_count.load(Ordering::SeqCst) != 0
    }

    fn report_failure(&self, err: SortError) {
        let mut slot = self.failure.lock().unwrap();
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}

#[cfg(test)]
impl JobQueue {
    // test-only: lets bucket_splitter's tests inspect what create_jobs
    // pushed without going through a full worker pool.
    pub(crate) fn try_pop(&self) -> Option<Job> {
        self.queue.pop()
    }
}

// seeds the queue with initial_jobs, then runs num_workers worker threads
// until every one of them is simultaneously idle with an empty queue.
pub(crate) fn run_to_quiescence(
    ctx: &MergeContext,
    topology: &dyn NumaTopology,
    initial_jobs: Vec<Job>,
    num_workers: usize,
) -> Result<(), SortError> {
    ctx.queue.push_all(initial_jobs);

    crossbeam::thread::scope(|scope| {
        for worker_index in 0..num_workers {
            scope.spawn(move |_| {
                topology.pin_current_thread(worker_index);
                worker_loop(ctx, num_workers);
            });
        }
    })
    .unwrap();

    let failure = ctx.queue.failure.lock().unwrap();
    match &*failure {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

fn worker_loop(ctx: &MergeContext, num_workers: usize) {
    let queue = &ctx.queue;

    while queue.idle_count.load(Ordering::SeqCst) != num_workers {
        while let Some(job) = queue.queue.pop() {
            if let Err(err) = job.run(ctx) {
                queue.report_failure(err);
            }
        }

        queue.idle_count.fetch_add(1, Ordering::SeqCst);

        loop {
            if let Some(job) = queue.queue.pop() {
                queue.idle_count.fetch_sub(1, Ordering::SeqCst);
                if let Err(err) = job.run(ctx) {
                    queue.report_failure(err);
                }
                break;
            }
            if queue.idle_count.load(Ordering::SeqCst) == num_workers {
                return;
            }
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::prelude::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::annotated_string::AnnotatedString;
    use crate::config::SortConfig;
    use crate::jobs::CopyJob;
    use crate::merge_sort::concurrent_merge_sort::SendablePtrWrapper;
    use crate::numa::SingleNodeTopology;
    use crate::text::StringHandle;

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
    fn run_to_quiescence_terminates_and_runs_every_job() {
        let words = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta"];
        let input: Vec<AnnotatedString> = words
            .iter()
            .map(|w| AnnotatedString { text: leak(w), lcp: 0 })
            .collect();
        let mut output = vec![StringHandle(std::ptr::null()); words.len()];

        let ctx = MergeContext::new(SortConfig::default());
        let input_wrapper = SendablePtrWrapper::new(input.as_ptr() as *mut AnnotatedString);
        let output_wrapper = SendablePtrWrapper::new(output.as_mut_ptr());

        // four independent copy jobs, two words each, so more than one
        // worker has something to pick up.
        let jobs: Vec<Job> = (0..4)
            .map(|i| {
                Job::Copy(CopyJob {
                    input: SendablePtrWrapper::new(unsafe { input_wrapper.as_mut_ptr().add(i * 2) }),
                    output: SendablePtrWrapper::new(unsafe { output_wrapper.as_mut_ptr().add(i * 2) }),
                    length: 2,
                })
            })
            .collect();

        run_to_quiescence(&ctx, &SingleNodeTopology::new(), jobs, 3).unwrap();

        let result: Vec<String> = output.into_iter().map(as_str).collect();
        let expected: Vec<String> = words.iter().map(|s| s.to_string()).collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn randomized_job_graph_conserves_every_element_exactly_once() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(99);

        for _trial in 0..20 {
            let total: usize = rng.gen_range(1..200);
            let words: Vec<String> = (0..total).map(|i| format!("w{:04}", i)).collect();
            let input: Vec<AnnotatedString> = words.iter().map(|w| AnnotatedString { text: leak(w), lcp: 0 }).collect();
            let mut output = vec![StringHandle(std::ptr::null()); total];

            let ctx = MergeContext::new(SortConfig::default());
            let input_wrapper = SendablePtrWrapper::new(input.as_ptr() as *mut AnnotatedString);
            let output_wrapper = SendablePtrWrapper::new(output.as_mut_ptr());

            // carve the range into randomly sized, non-overlapping copy jobs
            let mut jobs = Vec::new();
            let mut pos = 0usize;
            while pos < total {
                let remaining = total - pos;
                let len = rng.gen_range(1..=remaining.min(5));
                jobs.push(Job::Copy(CopyJob {
                    input: SendablePtrWrapper::new(unsafe { input_wrapper.as_mut_ptr().add(pos) }),
                    output: SendablePtrWrapper::new(unsafe { output_wrapper.as_mut_ptr().add(pos) }),
                    length: len,
                }));
                pos += len;
            }

            let num_workers = rng.gen_range(1..6);
            run_to_quiescence(&ctx, &SingleNodeTopology::new(), jobs, num_workers).unwrap();

            let result: Vec<String> = output.into_iter().map(as_str).collect();
            assert_eq!(result, words, "trial with {} elements and {} workers", total, num_workers);
        }
    }
}
