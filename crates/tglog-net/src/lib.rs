// Remote session over the JSON/HTTP gateway that fronts the messaging service.

pub mod gateway;

pub use gateway::{GatewayConfig, GatewaySession};
