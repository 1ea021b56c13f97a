// Widget Service
//
// Stored entities behind entity-typed parameters, permissions and uploads.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use switchboard_core::domain::{
    AccessRule, AllowedMethodTable, BoundArgs, Collection, MethodDescriptor, ParamDescriptor,
    PublicMethodSet, Value, Verb,
};
use switchboard_core::error::{DispatchError, Result};
use switchboard_core::port::{CallContext, WebService};
use switchboard_infra_sqlite::{NewEntity, SqliteEntityRepository};
use tracing::info;

pub const WIDGET_TYPE: &str = "Widget";
pub const GADGET_TYPE: &str = "Gadget";
pub const EDIT_WIDGETS_PERMISSION: &str = "EDIT_WIDGETS";

pub struct WidgetService {
    entities: Arc<SqliteEntityRepository>,
    methods: Vec<MethodDescriptor>,
    allowed: AllowedMethodTable,
    public: PublicMethodSet,
}

impl WidgetService {
    pub fn new(entities: Arc<SqliteEntityRepository>) -> Self {
        Self {
            entities,
            methods: vec![
                MethodDescriptor::new("show")
                    .param(ParamDescriptor::required("widget").entity(WIDGET_TYPE)),
                MethodDescriptor::new("list"),
                MethodDescriptor::new("upload")
                    .param(ParamDescriptor::required("file"))
                    .param(ParamDescriptor::optional("title", "Untitled")),
                MethodDescriptor::new("rename")
                    .param(ParamDescriptor::required("widget").entity(WIDGET_TYPE))
                    .param(ParamDescriptor::required("title")),
            ],
            allowed: AllowedMethodTable::new()
                .allow("show", Verb::Get)
                .allow("list", Verb::Get)
                .allow("upload", Verb::Post)
                .allow(
                    "rename",
                    AccessRule::with_permission(Verb::Post, EDIT_WIDGETS_PERMISSION),
                ),
            public: ["show", "list"].into_iter().collect(),
        }
    }

    async fn upload(&self, args: &BoundArgs, ctx: &CallContext) -> Result<Value> {
        let owner = ctx
            .caller
            .member_id()
            .ok_or_else(|| DispatchError::forbidden("Uploads need a member"))?;
        let file = args.blob(0)?;
        let checksum = hex::encode(Sha256::digest(file));

        let stored = self
            .entities
            .insert(
                NewEntity::new(WIDGET_TYPE)
                    .owned_by(owner)
                    .field("Title", args.text(1)?)
                    .field("Size", file.len() as i64)
                    .field("Checksum", checksum),
            )
            .await?;
        info!(entity_id = stored.id(), size = file.len(), "Widget uploaded");
        Ok(stored.into())
    }
}

#[async_trait]
impl WebService for WidgetService {
    fn name(&self) -> &str {
        "WidgetService"
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
            "show" => Ok(args.entity(0)?.cloned().into()),
            "list" => {
                let widgets = self.entities.list_viewable(WIDGET_TYPE, &ctx.caller).await?;
                Ok(Collection::data_list(widgets).into())
            }
            "upload" => self.upload(&args, ctx).await,
            "rename" => {
                let Some(widget) = args.entity(0)? else {
                    return Ok(Value::null());
                };
                let renamed = self
                    .entities
                    .update_field(widget.id(), "Title", args.text(1)?)
                    .await?;
                Ok(renamed.into())
            }
            other => Err(DispatchError::internal(format!(
                "Method {} does not exist on {}",
                other,
                self.name()
            ))),
        }
    }
}
