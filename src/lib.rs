pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infrastructure;

use std::sync::Arc;

pub use application::{
    AreaAvailabilityChecker, AreaCache, ComposerState, EntryPoint, OrderComposer,
};
pub use config::Config;
pub use domain::clock::{BusinessClock, FrozenClock, OffsetClock};
pub use domain::draft::{DraftLine, OrderDraft};
pub use domain::errors::{GatewayError, ValidationError};
pub use errors::ComposeError;
pub use infrastructure::HttpOrderGateway;

/// Build the HTTP gateway described by `config`.
pub fn connect(config: &Config) -> Result<Arc<HttpOrderGateway>, GatewayError> {
    HttpOrderGateway::new(&config.api_url, config.request_timeout).map(Arc::new)
}

/// Open a composer for a new order against the configured backend.
pub fn open_composer(
    gateway: Arc<HttpOrderGateway>,
    config: &Config,
    entry_point: EntryPoint,
    draft: OrderDraft,
) -> OrderComposer<HttpOrderGateway, OffsetClock> {
    OrderComposer::new(gateway, config.clock(), config, entry_point, draft)
}
