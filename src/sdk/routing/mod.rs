pub mod error;
pub mod provider;
pub mod route;
pub mod service;

pub use error::{RouteError, RoutingError};
pub use provider::{LocalOrsProvider, RemoteOrsProvider};
pub use route::{RouteResult, RouteSummary};
pub use service::RoutingProvider;
