//! Query model shared by rewriters and the final query composition step.

pub mod compose;
pub mod msm;
pub mod query;

mod error;

pub use compose::{BoostQuery, ComposedQuery, FilterQuery, Polarity};
pub use error::{Error, Result};
pub use msm::MinimumShouldMatch;
pub use query::{BooleanQuery, Clause, Occur, Query};
