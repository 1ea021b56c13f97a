// Web Service Port (Interface)
//
// Backend objects reachable through the dispatcher, and the locator that finds them.

use crate::domain::{
    AllowedMethodTable, BoundArgs, Caller, MethodDescriptor, PublicMethodSet, Value, Verb,
};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Which optional declarations a service provides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub has_allowed_methods: bool,
    pub has_public_methods: bool,
}

/// Per-call information a service method may need
#[derive(Debug, Clone)]
pub struct CallContext {
    pub caller: Caller,
    /// Effective verb (POST whenever a body was sent)
    pub verb: Verb,
}

/// A backend object exposing methods over the dispatcher
#[async_trait]
pub trait WebService: Send + Sync {
    /// Registry key, e.g. `EchoService`
    fn name(&self) -> &str;

    /// Every method the service can be asked to invoke
    fn methods(&self) -> &[MethodDescriptor];

    /// Allow-list; `None` (or an empty table) leaves verbs and permissions unrestricted
    fn allowed_methods(&self) -> Option<&AllowedMethodTable> {
        None
    }

    /// Methods open to anonymous callers; `None` means none are
    fn public_methods(&self) -> Option<&PublicMethodSet> {
        None
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            has_allowed_methods: self.allowed_methods().is_some(),
            has_public_methods: self.public_methods().is_some(),
        }
    }

    fn describe(&self, method: &str) -> Option<&MethodDescriptor> {
        self.methods().iter().find(|m| m.name() == method)
    }

    /// Run `method` with positional arguments already bound and coerced
    async fn invoke(&self, method: &str, args: BoundArgs, ctx: &CallContext) -> Result<Value>;
}

/// Finds a service instance by registry key
pub trait ServiceLocator: Send + Sync {
    fn get(&self, name: &str) -> Option<Arc<dyn WebService>>;
}

/// Map-backed locator, filled once at startup
#[derive(Default)]
pub struct InMemoryServiceLocator {
    services: HashMap<String, Arc<dyn WebService>>,
}

impl InMemoryServiceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the service's own name
    pub fn register(mut self, service: Arc<dyn WebService>) -> Self {
        self.services.insert(service.name().to_string(), service);
        self
    }

    /// Registered service names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceLocator for InMemoryServiceLocator {
    fn get(&self, name: &str) -> Option<Arc<dyn WebService>> {
        self.services.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare {
        methods: Vec<MethodDescriptor>,
    }

    #[async_trait]
    impl WebService for Bare {
        fn name(&self) -> &str {
            "BareService"
        }

        fn methods(&self) -> &[MethodDescriptor] {
            &self.methods
        }

        async fn invoke(&self, _method: &str, _args: BoundArgs, _ctx: &CallContext) -> Result<Value> {
            Ok(Value::null())
        }
    }

    #[test]
    fn test_capabilities_default_to_none() {
        let svc = Bare {
            methods: vec![MethodDescriptor::new("noop")],
        };
        assert_eq!(svc.capabilities(), Capabilities::default());
        assert!(svc.describe("noop").is_some());
        assert!(svc.describe("missing").is_none());
    }

    #[test]
    fn test_locator_registers_by_name() {
        let locator = InMemoryServiceLocator::new().register(Arc::new(Bare { methods: vec![] }));
        assert!(locator.get("BareService").is_some());
        assert!(locator.get("bare").is_none());
        assert_eq!(locator.len(), 1);
        assert_eq!(locator.names(), vec!["BareService"]);
    }
}
