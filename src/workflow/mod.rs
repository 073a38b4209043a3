pub mod conversion;
pub mod definition;
pub mod graph;

pub use conversion::*;
pub use definition::*;
pub use graph::*;
