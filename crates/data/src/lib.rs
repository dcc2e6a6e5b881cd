//! Loading of template tables, rule lists and affix files, and the listing
//! pass over a batch of affix files.

pub mod listing;
pub mod load;
pub mod report;

pub use listing::*;
pub use load::*;
pub use report::*;
