// the sort itself has no idea what a NUMA node is; it only asks its
// topology for a partition count, a worker count, and optionally to pin
// the calling thread before it starts touching memory. Multi-socket
// pinning is left to the caller's own topology implementation -- this
// crate ships only the trivial single-node default.

pub trait NumaTopology: Send + Sync {
    fn partition_count(&self) -> usize;

    fn worker_count(&self) -> usize;

    // called once by a worker thread right after it is spawned
    fn pin_current_thread(&self, _worker_index: usize) {}
}

// treats the machine as one flat node, sized from the available CPU count.
pub struct SingleNodeTopology {
    cpu_count: usize,
}

impl SingleNodeTopology {
    pub fn new() -> Self {
        SingleNodeTopology {
            cpu_count: num_cpus::get().max(1),
        }
    }
}

impl Default for SingleNodeTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl NumaTopology for SingleNodeTopology {
    fn partition_count(&self) -> usize {
        self.cpu_count
    }

    fn worker_count(&self) -> usize {
        self.cpu_count
    }
}
