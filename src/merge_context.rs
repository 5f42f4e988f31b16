// cookie threaded through every job's run: the queue, the work-sharing
// hint, and the active config.

use std::sync::atomic::AtomicUsize;

use crate::config::SortConfig;
use crate::job_queue::JobQueue;

pub(crate) struct MergeContext {
    pub queue: JobQueue,
    // length of the longest merge job currently running; used to decide
    // whether a running merge should self-split for idle threads.
    pub length_of_longest_job: AtomicUsize,
    pub config: SortConfig,
}

impl MergeContext {
    pub fn new(config: SortConfig) -> Self {
        MergeContext {
            queue: JobQueue::new(),
            length_of_longest_job: AtomicUsize::new(0),
            config,
        }
    }
}
