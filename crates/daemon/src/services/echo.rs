// Echo Service
//
// Connectivity checks and argument round-trips.

use async_trait::async_trait;
use switchboard_core::domain::{
    AllowedMethodTable, BoundArgs, MethodDescriptor, ParamDescriptor, PublicMethodSet, Record,
    ScalarKind, Value, Verb,
};
use switchboard_core::error::{DispatchError, Result};
use switchboard_core::port::{CallContext, WebService};

pub struct EchoService {
    methods: Vec<MethodDescriptor>,
    allowed: AllowedMethodTable,
    public: PublicMethodSet,
}

impl EchoService {
    pub fn new() -> Self {
        Self {
            methods: vec![
                MethodDescriptor::new("ping").param(ParamDescriptor::optional("name", "world")),
                MethodDescriptor::new("echo").param(ParamDescriptor::required("message")),
                MethodDescriptor::new("sum")
                    .param(ParamDescriptor::required("a").typed(ScalarKind::Int))
                    .param(ParamDescriptor::optional("b", 0i64).typed(ScalarKind::Int)),
                MethodDescriptor::new("whoami"),
            ],
            allowed: AllowedMethodTable::new()
                .allow("ping", Verb::Get)
                .allow("echo", Verb::Get)
                .allow("sum", Verb::Get)
                .allow("whoami", Verb::Get),
            public: ["ping", "sum", "whoami"].into_iter().collect(),
        }
    }
}

impl Default for EchoService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebService for EchoService {
    fn name(&self) -> &str {
        "EchoService"
    }

    fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    fn allowed_methods(&self) -> Option<&AllowedMethodTable> {
        Some(&self.allowed)
    }

    fn public_methods(&self) -> Option<&PublicMethodSet> {
        Some(&self.public)
    }

    async fn invoke(&self, method: &str, args: BoundArgs, ctx: &CallContext) -> Result<Value> {
        match method {
            "ping" | "echo" => Ok(Value::from(args.text(0)?)),
            "sum" => {
                let total = args
                    .int(0)?
                    .checked_add(args.int(1)?)
                    .ok_or_else(|| DispatchError::internal("sum overflows"))?;
                Ok(Value::from(total))
            }
            "whoami" => {
                let principal = ctx.caller.principal();
                Ok(Record::std_class()
                    .with("Authenticated", ctx.caller.is_authenticated())
                    .with("ID", principal.map(|p| p.id))
                    .with("Email", principal.map(|p| p.email.clone()))
                    .into())
            }
            other => Err(DispatchError::internal(format!(
                "Method {} does not exist on {}",
                other,
                self.name()
            ))),
        }
    }
}
