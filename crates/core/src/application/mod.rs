// Application Layer - The dispatch pipeline

pub mod access;
pub mod arguments;
pub mod binder;
pub mod convert;
pub mod dispatcher;
pub mod invoker;
pub mod translate;

// Re-exports
pub use convert::{
    Converter, ConverterChain, ConverterRegistry, ConverterTable, EnvelopeConverter, OutputFormat,
};
pub use dispatcher::{service_key, DispatchRequest, DispatchResponse, Dispatcher};
pub use translate::ErrorBody;
