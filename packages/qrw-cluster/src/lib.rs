pub mod command;
pub mod coordinator;
pub mod local;
pub mod transport;

mod error;

pub use command::{NodeCommand, NodeReply};
pub use coordinator::{AggregatedResult, Coordinator, FailureKind, NodeFailure};
pub use error::{Error, Result};
pub use local::LocalNode;
pub use transport::{HttpTransport, NodeTransport};

use std::{future::Future, pin::Pin};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
