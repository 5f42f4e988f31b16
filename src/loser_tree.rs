// the LCP-aware loser tree. Ported from the reference's
// LcpStringLoserTree<K>: an implicit tournament tree of K internal nodes,
// each storing the index of the stream that lost the corresponding match.
// node 0 holds the overall winner. comparisons reuse cached per-stream
// LCPs so a string's shared prefix with the current winner is never
// rescanned.

use std::ops::Range;

use crate::annotated_string::AnnotatedString;
use crate::text::lcp_and_cmp;

#[derive(Clone, Copy)]
struct StreamCursor {
    head: *mut AnnotatedString,
    remaining: usize,
}

impl StreamCursor {
    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.remaining == 0
    }
}

// K must be one of {4, 8, 16, 32, 64}; only instantiated through
// jobs::run_kway's dispatch, which enforces that.
pub(crate) struct LoserTree<const K: usize> {
    streams: [StreamCursor; K],
    lcps: [u32; K],
    // nodes[0] is the overall winner; nodes[1..] are internal match nodes.
    nodes: [usize; K],
    input_base: *mut AnnotatedString,
}

impl<const K: usize> LoserTree<K> {
    // each stream's initial cached LCP comes from its head element's lcp
    // field -- the bucket-splitter guarantees all K heads agree on at
    // least base_lcp bytes, and run_kway stamps that depth into each head
    // before calling this constructor.
    pub(crate) fn new(input_base: *mut AnnotatedString, ranges: &[Range<usize>; K]) -> Self {
        let streams: [StreamCursor; K] = std::array::from_fn(|i| {
            let r = &ranges[i];
            StreamCursor {
                head: unsafe { input_base.add(r.start) },
                remaining: r.len(),
            }
        });

        let lcps: [u32; K] = std::array::from_fn(|i| {
            if streams[i].is_empty() {
                0
            } else {
                unsafe { (*streams[i].head).lcp }
            }
        });

        let mut tree = LoserTree {
            streams,
            lcps,
            nodes: [0usize; K],
            input_base,
        };
        tree.init_tree();
        tree
    }

    // plays each leaf stream up the tree, leaving the loser at each node,
    // until the overall winner reaches node 0.
    fn init_tree(&mut self) {
        for i in 0..K {
            let mut node_idx = K + i;
            let mut contender_idx = i;
            while node_idx % 2 == 1 && node_idx > 1 {
                node_idx >>= 1;
                contender_idx = self.update_node(node_idx, contender_idx);
            }
            self.nodes[node_idx >> 1] = contender_idx;
        }
    }

    // plays contender_idx against whatever is stored at node_idx, returning
    // the winner; the node is overwritten only when the defender wins.
    fn update_node(&mut self, node_idx: usize, contender_idx: usize) -> usize {
        let defender_idx = self.nodes[node_idx];

        if self.streams[defender_idx].is_empty() {
            return contender_idx;
        }
        if self.streams[contender_idx].is_empty() {
            self.nodes[node_idx] = contender_idx;
            return defender_idx;
        }

        let lcp_d = self.lcps[defender_idx];
        let lcp_c = self.lcps[contender_idx];

        if lcp_d > lcp_c {
            // defender shares more with the current winner position: defender < contender
            self.nodes[node_idx] = contender_idx;
            return defender_idx;
        }
        if lcp_d < lcp_c {
            return contender_idx;
        }

        let defender_text = unsafe { (*self.streams[defender_idx].head).text };
        let contender_text = unsafe { (*self.streams[contender_idx].head).text };
        let (new_lcp, ord) = unsafe { lcp_and_cmp(defender_text, contender_text, lcp_d) };

        if ord == std::cmp::Ordering::Less {
            self.lcps[contender_idx] = new_lcp;
            self.nodes[node_idx] = contender_idx;
            defender_idx
        } else {
            self.lcps[defender_idx] = new_lcp;
            contender_idx
        }
    }

    // advances the winning stream by one, reloads its cached LCP, and
    // returns the removed record with lcp set to the true LCP vs. the
    // last emitted string.
    fn remove_top_from_stream(&mut self, stream_idx: usize) -> AnnotatedString {
        let lcp = self.lcps[stream_idx];
        let stream = &mut self.streams[stream_idx];
        let mut top = unsafe { *stream.head };
        top.lcp = lcp;

        stream.remaining -= 1;
        stream.head = unsafe { stream.head.add(1) };

        if !stream.is_empty() {
            self.lcps[stream_idx] = unsafe { (*stream.head).lcp };
        }

        top
    }

    pub(crate) fn delete_min(&mut self) -> AnnotatedString {
        let mut contender_idx = self.nodes[0];
        let min = self.remove_top_from_stream(contender_idx);

        let mut node_idx = (K + contender_idx) >> 1;
        while node_idx >= 1 {
            contender_idx = self.update_node(node_idx, contender_idx);
            node_idx >>= 1;
        }
        self.nodes[0] = contender_idx;

        min
    }

    // fused loop of n delete_min calls, writing each text handle into dst.
    pub(crate) fn write_elements_to_stream(&mut self, dst: *mut crate::text::StringHandle, n: usize) {
        for i in 0..n {
            let element = self.delete_min();
            unsafe { *dst.add(i) = element.text };
        }
    }

    // snapshots each stream's remaining (offset, length), for self-split.
    pub(crate) fn ranges_of_remaining(&self) -> [Range<usize>; K] {
        std::array::from_fn(|k| {
            let stream = &self.streams[k];
            let offset = unsafe { stream.head.offset_from(self.input_base) } as usize;
            offset..offset + stream.remaining
        })
    }
}
