// Domain Layer - Values flowing through the dispatch pipeline

pub mod argument;
pub mod caller;
pub mod entity;
pub mod method;
pub mod types;
pub mod value;

// Re-exports
pub use argument::{ArgValue, Argument, ArgumentMap, BoundArgs};
pub use caller::{Caller, MemberId, Principal};
pub use entity::{Entity, EntityId};
pub use method::{
    AccessRule, AllowedMethodTable, MethodDescriptor, ParamDescriptor, ParamType,
    PublicMethodSet, ScalarKind, Verb,
};
pub use types::{TypeHierarchy, TypeHierarchyBuilder};
pub use value::{Collection, Record, Scalar, Value};
