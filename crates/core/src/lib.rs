// Switchboard Core - Dispatch Pipeline & Ports
// NO infrastructure dependencies: services, authentication and entity storage arrive through ports

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{
    ConverterRegistry, DispatchRequest, DispatchResponse, Dispatcher, OutputFormat,
};
pub use error::{DispatchError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
