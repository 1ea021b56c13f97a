// Method Invoker

use crate::domain::{Argument, BoundArgs, MethodDescriptor, ParamType, Value};
use crate::error::{DispatchError, Result};
use crate::port::{CallContext, WebService};
use tracing::debug;

/// Look up `method` on `service`, failing with the dispatcher's standard message
pub fn resolve_method<'s>(service: &'s dyn WebService, method: &str) -> Result<&'s MethodDescriptor> {
    service.describe(method).ok_or_else(|| {
        DispatchError::internal(format!(
            "Method {} does not exist on {}",
            method,
            service.name()
        ))
    })
}

/// Coerce each bound value to its declared scalar kind
pub fn coerce_arguments(descriptor: &MethodDescriptor, bound: Vec<Argument>) -> Result<BoundArgs> {
    let mut coerced = Vec::with_capacity(bound.len());

    for (param, arg) in descriptor.params().iter().zip(bound) {
        let value = match param.param_type() {
            ParamType::Scalar(kind) => arg.coerce(*kind).map_err(|rejected| {
                DispatchError::internal(format!(
                    "Parameter {} of {} expects {}, got {}",
                    param.name(),
                    descriptor.name(),
                    kind,
                    rejected.kind_name()
                ))
            })?,
            ParamType::Untyped | ParamType::Entity(_) => arg,
        };
        coerced.push(value);
    }

    Ok(BoundArgs::new(coerced))
}

/// Coerce and call. Handler errors come back unchanged.
pub async fn invoke(
    service: &dyn WebService,
    descriptor: &MethodDescriptor,
    bound: Vec<Argument>,
    ctx: &CallContext,
) -> Result<Value> {
    let args = coerce_arguments(descriptor, bound)?;
    debug!(
        service = service.name(),
        method = descriptor.name(),
        args = args.len(),
        "Invoking service method"
    );
    service.invoke(descriptor.name(), args, ctx).await
}
