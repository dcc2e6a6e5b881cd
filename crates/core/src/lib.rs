//! Affix and effect records, their rendering and grouping. Keep this crate
//! free of IO; callers hand in lines and loaded tables.

pub mod affix;
pub mod diagnostics;
pub mod effect;
pub mod format;
pub mod group;
pub mod hash;
pub mod level;
pub mod parser;
pub mod render;
pub mod replace;
pub mod set;
pub mod templates;

pub use affix::*;
pub use diagnostics::*;
pub use effect::*;
pub use format::*;
pub use group::*;
pub use hash::*;
pub use level::*;
pub use parser::*;
pub use render::*;
pub use replace::*;
pub use set::*;
pub use templates::*;
