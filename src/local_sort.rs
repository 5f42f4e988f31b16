// sorting and LCP-annotating a single partition. the seam the top-level
// merge treats as a black box: give it an unordered run of strings, get
// back the same strings in order with lcp set to each one's shared
// prefix length with its predecessor.

use crate::annotated_string::AnnotatedString;
use crate::merge_sort::concurrent_merge_sort::concurrent_merge_sort;
use crate::text::{byte_cmp, lcp_and_cmp, StringHandle};

pub trait LocalSorter: Send + Sync {
    fn sort_and_annotate(&self, handles: Vec<StringHandle>, parallelism: usize) -> Vec<AnnotatedString>;
}

// the donor's concurrent_merge_sort over a byte-lexicographic comparator,
// followed by a single linear LCP pass.
pub struct ConcurrentLocalSorter;

impl LocalSorter for ConcurrentLocalSorter {
    fn sort_and_annotate(&self, mut handles: Vec<StringHandle>, parallelism: usize) -> Vec<AnnotatedString> {
        concurrent_merge_sort(
            handles.as_mut_slice(),
            &|a: &StringHandle, b: &StringHandle| unsafe { byte_cmp(*a, *b) },
            parallelism.max(1),
        );

        let mut out = Vec::with_capacity(handles.len());
        let mut prev: Option<StringHandle> = None;
        for text in handles {
            let lcp = match prev {
                None => 0,
                Some(p) => unsafe { lcp_and_cmp(p, text, 0).0 },
            };
            out.push(AnnotatedString { text, lcp });
            prev = Some(text);
        }
        out
    }
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
    fn sorts_and_annotates_correctly() {
        let words = ["banana", "apple", "apricot", "band", "a"];
        let handles: Vec<StringHandle> = words.iter().map(|w| leak(w)).collect();

        let sorter = ConcurrentLocalSorter;
        let result = sorter.sort_and_annotate(handles, 2);

        let strings: Vec<String> = result.iter().map(|r| as_str(r.text)).collect();
        assert_eq!(strings, vec!["a", "apple", "apricot", "banana", "band"]);

        assert_eq!(result[0].lcp, 0);
        assert_eq!(result[1].lcp, 1); // "a" vs "apple"
        assert_eq!(result[2].lcp, 2); // "apple" vs "apricot" -> "ap"
        assert_eq!(result[3].lcp, 0); // "apricot" vs "banana"
        assert_eq!(result[4].lcp, 3); // "banana" vs "band" -> "ban"
    }

    #[test]
    fn empty_input_produces_empty_output() {
        let sorter = ConcurrentLocalSorter;
        let result = sorter.sort_and_annotate(Vec::new(), 4);
        assert!(result.is_empty());
    }
}
