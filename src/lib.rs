//! Parallel LCP-aware top-level merge for sorting large collections of
//! byte strings.
//!
//! The sort runs in two phases: each of the input's partitions is sorted
//! locally and annotated with longest-common-prefix (LCP) information
//! (see [`local_sort`]), then every partition's sorted run is merged back
//! together by an adaptively-bucketed, work-sharing job queue (see
//! [`bucket_splitter`] and [`job_queue`]) driving a family of LCP-aware
//! loser trees (see [`loser_tree`]).

pub mod annotated_string;
mod bucket_splitter;
pub mod config;
mod data_structure;
mod driver;
pub mod error;
mod job_queue;
mod jobs;
mod loser_tree;
pub mod local_sort;
mod merge_context;
mod merge_sort;
pub mod numa;
pub mod text;

pub use annotated_string::AnnotatedString;
pub use config::SortConfig;
pub use driver::{sort, sort_default, sort_with};
pub use error::SortError;
pub use local_sort::{ConcurrentLocalSorter, LocalSorter};
pub use numa::{NumaTopology, SingleNodeTopology};
pub use text::StringHandle;
