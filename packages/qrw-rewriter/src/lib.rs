pub mod builtin;
pub mod definition;
pub mod factory;
pub mod loader;
pub mod params;
pub mod registry;

mod error;

pub use definition::{
	CURRENT_SCHEMA_VERSION, LEGACY_SCHEMA_VERSION, LogPayload, LoggingConfig, RewriterDefinition,
	TRACING_SINK, validate_rewriter_id,
};
pub use error::{Error, Result};
pub use factory::{ExpandedQuery, PartitionId, QueryRewriter, RewriteContext, RewriterFactory};
pub use loader::FactoryLoader;
pub use params::RequestParams;
pub use registry::{Constructor, KindRegistry};
