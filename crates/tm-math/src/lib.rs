//! Topic-model math utilities.

pub mod categorical;
pub mod lbfgs;
pub mod stable;

pub use categorical::*;
pub use lbfgs::*;
pub use stable::*;
