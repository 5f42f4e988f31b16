use thiserror::Error;

// everything that can make a sort fail to complete.
#[derive(Error, Debug, Clone)]
pub enum SortError {
    // the loser-tree dispatch only supports widths in {4, 8, 16, 32, 64}
    #[error("unsupported k-way merge width: {0}")]
    UnsupportedWidth(usize),

    #[error("allocation failed while sorting")]
    OutOfMemory,
}
