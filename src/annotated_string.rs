use crate::text::StringHandle;

// a string handle paired with the length of the common prefix it shares
// with its predecessor in whichever stream currently owns it. all ordering
// invariants live in the owning stream, not on the record itself.
#[derive(Clone, Copy, Debug)]
pub struct AnnotatedString {
    pub text: StringHandle,
    pub lcp: u32,
}

impl Default for AnnotatedString {
    fn default() -> Self {
        AnnotatedString {
            text: StringHandle(std::ptr::null()),
            lcp: 0,
        }
    }
}
