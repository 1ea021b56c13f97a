// Access Control Gate
//
// Two independent tiers:
// 1. the allow-list (method listed, permission held, verb matches)
// 2. anonymous callers may only reach methods the service declares public

use crate::domain::{AllowedMethodTable, Caller, PublicMethodSet, Verb};
use crate::error::{DispatchError, Result};
use crate::port::{Authorizer, WebService};
use tracing::debug;

/// Decide whether `caller` may invoke `method` on `service` with `verb`
pub async fn check_access(
    service: &dyn WebService,
    method: &str,
    caller: &Caller,
    verb: Verb,
    authorizer: &dyn Authorizer,
) -> Result<()> {
    match service.allowed_methods() {
        Some(table) if !table.is_empty() => {
            check_allowed_methods(table, method, caller, verb, authorizer).await?;
        }
        _ => {
            // No allow-list: verbs and permissions are not restricted here
            debug!(service = service.name(), method, "No allow-list declared");
        }
    }

    check_public_access(service.public_methods(), method, caller)
}

async fn check_allowed_methods(
    table: &AllowedMethodTable,
    method: &str,
    caller: &Caller,
    verb: Verb,
    authorizer: &dyn Authorizer,
) -> Result<()> {
    let rule = table.get(method).ok_or_else(|| {
        DispatchError::forbidden(format!("You do not have permission to {}", method))
    })?;

    if let Some(permission) = rule.permission() {
        if !authorizer.has_permission(caller, permission).await? {
            return Err(DispatchError::forbidden(format!(
                "You do not have permission to {}",
                method
            )));
        }
    }

    if rule.verb() != verb {
        return Err(DispatchError::method_not_allowed(format!(
            "{} does not support {}",
            method, verb
        )));
    }

    Ok(())
}

fn check_public_access(
    public: Option<&PublicMethodSet>,
    method: &str,
    caller: &Caller,
) -> Result<()> {
    if caller.is_authenticated() {
        return Ok(());
    }

    match public {
        Some(methods) if methods.contains(method) => Ok(()),
        Some(_) => Err(DispatchError::forbidden(format!(
            "Public method {} not allowed",
            method
        ))),
        None => Err(DispatchError::forbidden(format!(
            "Method {} not allowed; no public methods defined",
            method
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccessRule, BoundArgs, MethodDescriptor, Value};
    use crate::port::authorizer::MockAuthorizer;
    use crate::port::CallContext;
    use async_trait::async_trait;

    struct Guarded {
        allowed: Option<AllowedMethodTable>,
        public: Option<PublicMethodSet>,
    }

    #[async_trait]
    impl WebService for Guarded {
        fn name(&self) -> &str {
            "GuardedService"
        }

        fn methods(&self) -> &[MethodDescriptor] {
            &[]
        }

        fn allowed_methods(&self) -> Option<&AllowedMethodTable> {
            self.allowed.as_ref()
        }

        fn public_methods(&self) -> Option<&PublicMethodSet> {
            self.public.as_ref()
        }

        async fn invoke(&self, _: &str, _: BoundArgs, _: &CallContext) -> Result<Value> {
            Ok(Value::null())
        }
    }

    fn member() -> Caller {
        Caller::member(1, "admin@example.com")
    }

    fn no_permission_checks() -> MockAuthorizer {
        let mut authorizer = MockAuthorizer::new();
        authorizer.expect_has_permission().never();
        authorizer
    }

    fn allow_list() -> AllowedMethodTable {
        AllowedMethodTable::new()
            .allow("read", Verb::Get)
            .allow("write", AccessRule::with_permission(Verb::Post, "EDIT"))
    }

    #[tokio::test]
    async fn test_listed_method_with_matching_verb_passes() {
        let svc = Guarded {
            allowed: Some(allow_list()),
            public: None,
        };
        let result = check_access(&svc, "read", &member(), Verb::Get, &no_permission_checks()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unlisted_method_forbidden() {
        let svc = Guarded {
            allowed: Some(allow_list()),
            public: None,
        };
        let err = check_access(&svc, "drop", &member(), Verb::Get, &no_permission_checks())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Forbidden(_)));
        assert_eq!(err.to_string(), "You do not have permission to drop");
    }

    #[tokio::test]
    async fn test_verb_mismatch_is_method_not_allowed() {
        let svc = Guarded {
            allowed: Some(allow_list()),
            public: None,
        };
        let err = check_access(&svc, "read", &member(), Verb::Post, &no_permission_checks())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 405);
        assert_eq!(err.to_string(), "read does not support POST");
    }

    #[tokio::test]
    async fn test_missing_permission_forbidden() {
        let svc = Guarded {
            allowed: Some(allow_list()),
            public: None,
        };
        let mut authorizer = MockAuthorizer::new();
        authorizer
            .expect_has_permission()
            .withf(|_, perm| perm == "EDIT")
            .times(1)
            .returning(|_, _| Ok(false));

        let err = check_access(&svc, "write", &member(), Verb::Post, &authorizer)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_permission_checked_before_verb() {
        let svc = Guarded {
            allowed: Some(allow_list()),
            public: None,
        };
        let mut authorizer = MockAuthorizer::new();
        authorizer
            .expect_has_permission()
            .returning(|_, _| Ok(true));

        let err = check_access(&svc, "write", &member(), Verb::Get, &authorizer)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 405);
    }

    #[tokio::test]
    async fn test_empty_table_imposes_no_verb_restriction() {
        let svc = Guarded {
            allowed: Some(AllowedMethodTable::new()),
            public: None,
        };
        for verb in [Verb::Get, Verb::Post, Verb::Delete] {
            assert!(check_access(&svc, "anything", &member(), verb, &no_permission_checks())
                .await
                .is_ok());
        }
    }

    #[tokio::test]
    async fn test_anonymous_needs_public_declaration() {
        let svc = Guarded {
            allowed: None,
            public: None,
        };
        let err = check_access(&svc, "ping", &Caller::Anonymous, Verb::Get, &no_permission_checks())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Method ping not allowed; no public methods defined"
        );
    }

    #[tokio::test]
    async fn test_anonymous_method_not_in_public_set() {
        let svc = Guarded {
            allowed: None,
            public: Some(PublicMethodSet::new().with("ping")),
        };
        let authorizer = no_permission_checks();
        assert!(check_access(&svc, "ping", &Caller::Anonymous, Verb::Get, &authorizer)
            .await
            .is_ok());

        let err = check_access(&svc, "secret", &Caller::Anonymous, Verb::Get, &authorizer)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Public method secret not allowed");
    }

    #[tokio::test]
    async fn test_public_method_still_subject_to_allow_list() {
        let svc = Guarded {
            allowed: Some(allow_list()),
            public: Some(PublicMethodSet::new().with("read")),
        };
        let err = check_access(&svc, "read", &Caller::Anonymous, Verb::Post, &no_permission_checks())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 405);
    }
}
