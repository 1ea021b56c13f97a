// Method Metadata
//
// What a service declares about its web-callable methods: parameter lists
// for the binder, the allow-list for the access gate, and the set of
// methods open to anonymous callers.

use super::argument::Argument;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// HTTP request verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Head => "HEAD",
            Verb::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            "DELETE" => Ok(Verb::Delete),
            "HEAD" => Ok(Verb::Head),
            "OPTIONS" => Ok(Verb::Options),
            other => Err(format!("unsupported request verb: {}", other)),
        }
    }
}

/// Declared scalar type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Text,
    Int,
    Float,
    Bool,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Text => write!(f, "string"),
            ScalarKind::Int => write!(f, "int"),
            ScalarKind::Float => write!(f, "float"),
            ScalarKind::Bool => write!(f, "bool"),
        }
    }
}

/// Declared type of a parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Untyped,
    Scalar(ScalarKind),
    /// Resolved from `<name>ID` / `<name>Type` arguments against the entity repository
    Entity(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    name: String,
    param_type: ParamType,
    optional: bool,
    default: Argument,
}

impl ParamDescriptor {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: ParamType::Untyped,
            optional: false,
            default: Argument::Null,
        }
    }

    pub fn optional(name: impl Into<String>, default: impl Into<Argument>) -> Self {
        Self {
            name: name.into(),
            param_type: ParamType::Untyped,
            optional: true,
            default: default.into(),
        }
    }

    pub fn typed(mut self, kind: ScalarKind) -> Self {
        self.param_type = ParamType::Scalar(kind);
        self
    }

    pub fn entity(mut self, type_name: impl Into<String>) -> Self {
        self.param_type = ParamType::Entity(type_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> &ParamType {
        &self.param_type
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> &Argument {
        &self.default
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    name: String,
    params: Vec<ParamDescriptor>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }
}

/// Allow-list entry for one method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// Bare request-type tag
    Verb(Verb),
    /// Structured rule with an optional permission requirement
    Restricted {
        verb: Verb,
        permission: Option<String>,
    },
}

impl AccessRule {
    pub fn with_permission(verb: Verb, permission: impl Into<String>) -> Self {
        AccessRule::Restricted {
            verb,
            permission: Some(permission.into()),
        }
    }

    pub fn verb(&self) -> Verb {
        match self {
            AccessRule::Verb(v) | AccessRule::Restricted { verb: v, .. } => *v,
        }
    }

    pub fn permission(&self) -> Option<&str> {
        match self {
            AccessRule::Restricted { permission, .. } => permission.as_deref(),
            AccessRule::Verb(_) => None,
        }
    }
}

impl From<Verb> for AccessRule {
    fn from(verb: Verb) -> Self {
        AccessRule::Verb(verb)
    }
}

/// Which methods are web-callable, under which verb, behind which permission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedMethodTable {
    rules: HashMap<String, AccessRule>,
}

impl AllowedMethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, method: impl Into<String>, rule: impl Into<AccessRule>) -> Self {
        self.rules.insert(method.into(), rule.into());
        self
    }

    pub fn get(&self, method: &str) -> Option<&AccessRule> {
        self.rules.get(method)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

/// Methods callable without an authenticated member
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicMethodSet {
    methods: HashSet<String>,
}

impl PublicMethodSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, method: impl Into<String>) -> Self {
        self.methods.insert(method.into());
        self
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains(method)
    }
}

impl<S: Into<String>> FromIterator<S> for PublicMethodSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            methods: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_parse_is_case_insensitive() {
        assert_eq!("post".parse::<Verb>().unwrap(), Verb::Post);
        assert_eq!("GET".parse::<Verb>().unwrap(), Verb::Get);
        assert!("PURGE".parse::<Verb>().is_err());
    }

    #[test]
    fn test_access_rule_accessors() {
        let bare = AccessRule::from(Verb::Get);
        assert_eq!(bare.verb(), Verb::Get);
        assert_eq!(bare.permission(), None);

        let guarded = AccessRule::with_permission(Verb::Post, "EDIT_WIDGETS");
        assert_eq!(guarded.verb(), Verb::Post);
        assert_eq!(guarded.permission(), Some("EDIT_WIDGETS"));
    }

    #[test]
    fn test_param_descriptor_builders() {
        let p = ParamDescriptor::optional("limit", 20i64).typed(ScalarKind::Int);
        assert!(p.is_optional());
        assert_eq!(p.param_type(), &ParamType::Scalar(ScalarKind::Int));
        assert_eq!(p.default_value(), &Argument::Int(20));

        let w = ParamDescriptor::required("widget").entity("Widget");
        assert!(!w.is_optional());
        assert_eq!(w.param_type(), &ParamType::Entity("Widget".to_string()));
    }
}
