//! Domain types shared by every Tether crate

pub mod connection;
pub mod endpoint;
pub mod events;
pub mod health;
pub mod outcome;
pub mod request;

pub use connection::{BackendAvailability, ConnectionState};
pub use endpoint::{Endpoint, EndpointRegistry, EndpointRole};
pub use events::ClientEvent;
pub use health::HealthCheckResult;
pub use outcome::{FallbackResponse, QueuedAcknowledgement};
pub use request::{HttpMethod, PendingRequest, RequestDescriptor};
