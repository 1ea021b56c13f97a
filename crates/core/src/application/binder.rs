// Parameter Binder
//
// Maps a method's declared parameters to positional arguments:
// entity lookup -> exact-name argument -> implicit `file` upload -> default -> error.

use crate::domain::{
    ArgValue, Argument, ArgumentMap, Caller, Entity, EntityId, MethodDescriptor, ParamDescriptor,
    ParamType, TypeHierarchy, Verb,
};
use crate::error::{DispatchError, Result};
use crate::port::EntityRepository;
use bytes::Bytes;
use tracing::debug;

/// Parameter name that receives the raw request body on POST
pub const FILE_PARAM: &str = "file";

pub struct ParameterBinder<'a> {
    repository: &'a dyn EntityRepository,
    types: &'a TypeHierarchy,
}

impl<'a> ParameterBinder<'a> {
    pub fn new(repository: &'a dyn EntityRepository, types: &'a TypeHierarchy) -> Self {
        Self { repository, types }
    }

    /// Produce the positional argument list, stopping at the first missing required parameter
    pub async fn bind(
        &self,
        method: &MethodDescriptor,
        args: &ArgumentMap,
        body: &Bytes,
        verb: Verb,
        caller: &Caller,
    ) -> Result<Vec<Argument>> {
        let mut bound = Vec::with_capacity(method.params().len());

        for param in method.params() {
            let value = match param.param_type() {
                ParamType::Entity(declared) if self.types.is_entity_type(declared) => self
                    .resolve_entity(param, declared, args, caller)
                    .await?
                    .map(Argument::Entity),
                _ => bind_raw(param, args, body, verb),
            };

            match value {
                Some(arg) => bound.push(arg),
                None if param.is_optional() => bound.push(param.default_value().clone()),
                None => {
                    return Err(DispatchError::internal(format!(
                        "Service method {} expects parameter {}",
                        method.name(),
                        param.name()
                    )))
                }
            }
        }

        Ok(bound)
    }

    /// Resolve `<param>ID` + `<param>Type` against the repository.
    ///
    /// Any reason the entity cannot be bound yields `Ok(None)`; only repository
    /// errors propagate.
    async fn resolve_entity(
        &self,
        param: &ParamDescriptor,
        declared: &str,
        args: &ArgumentMap,
        caller: &Caller,
    ) -> Result<Option<Entity>> {
        let (Some(raw_id), Some(raw_type)) = (
            lookup_suffixed(args, param.name(), "ID"),
            lookup_suffixed(args, param.name(), "Type"),
        ) else {
            return Ok(None);
        };

        let Some(type_name) = raw_type.as_text() else {
            return Ok(None);
        };
        if !self.types.is_entity_type(type_name) || !self.types.is_a(type_name, declared) {
            debug!(param = param.name(), type_name, declared, "Entity type does not fit parameter");
            return Ok(None);
        }

        let Some(id) = parse_id(raw_id) else {
            debug!(param = param.name(), "Entity id is not numeric");
            return Ok(None);
        };

        let Some(entity) = self.repository.by_type_and_id(type_name, id).await? else {
            debug!(param = param.name(), type_name, id, "Entity not found");
            return Ok(None);
        };

        if !self.repository.can_view(&entity, caller).await? {
            debug!(param = param.name(), type_name, id, caller = %caller, "Entity not viewable");
            return Ok(None);
        }

        // The repository may hand back a subtype; it still has to fit the declaration
        if !self.types.is_a(entity.type_name(), declared) {
            return Ok(None);
        }

        Ok(Some(entity))
    }
}

fn bind_raw(param: &ParamDescriptor, args: &ArgumentMap, body: &Bytes, verb: Verb) -> Option<Argument> {
    if let Some(raw) = args.get(param.name()) {
        return Some(Argument::from(raw.clone()));
    }
    if param.name() == FILE_PARAM && verb == Verb::Post {
        return Some(Argument::Blob(body.clone()));
    }
    None
}

/// `widgetID` first, then the capitalised `WidgetID`
fn lookup_suffixed<'m>(args: &'m ArgumentMap, name: &str, suffix: &str) -> Option<&'m ArgValue> {
    args.get(&format!("{}{}", name, suffix))
        .or_else(|| args.get(&format!("{}{}", capitalize(name), suffix)))
}

fn parse_id(raw: &ArgValue) -> Option<EntityId> {
    match raw {
        ArgValue::Text(s) => s.trim().parse().ok(),
        ArgValue::Structured(v) => v.as_i64(),
        ArgValue::Blob(_) => None,
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
