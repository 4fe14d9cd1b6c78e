pub mod binary_search;
pub mod index_range;

pub use binary_search::{
    binary_search,
    binary_search_by_index,
    DefaultTo,
};
pub use index_range::{
    index_range,
    index_range_by_index,
    IndexRange,
};
