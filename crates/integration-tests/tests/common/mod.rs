//! Shared fixtures: a SQLite-backed library service wired through the real dispatcher

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use switchboard_core::domain::{
    AccessRule, AllowedMethodTable, BoundArgs, Collection, MethodDescriptor, ParamDescriptor,
    PublicMethodSet, Record, TypeHierarchy, Value, Verb,
};
use switchboard_core::error::{DispatchError, Result};
use switchboard_core::port::time_provider::SystemTimeProvider;
use switchboard_core::port::{CallContext, InMemoryServiceLocator, TimeProvider, WebService};
use switchboard_core::{ConverterRegistry, Dispatcher};
use switchboard_infra_sqlite::{
    create_pool, run_migrations, NewEntity, SqliteAuthorizer, SqliteEntityRepository,
    SqliteMemberRepository,
};

pub const BOOK: &str = "Book";
pub const NOVEL: &str = "Novel";
pub const RETIRE_BOOKS: &str = "RETIRE_BOOKS";

pub struct BookService {
    entities: Arc<SqliteEntityRepository>,
    methods: Vec<MethodDescriptor>,
    allowed: AllowedMethodTable,
    public: PublicMethodSet,
}

impl BookService {
    pub fn new(entities: Arc<SqliteEntityRepository>) -> Self {
        Self {
            entities,
            methods: vec![
                MethodDescriptor::new("show").param(ParamDescriptor::required("book").entity(BOOK)),
                MethodDescriptor::new("titles"),
                MethodDescriptor::new("mine"),
                MethodDescriptor::new("import")
                    .param(ParamDescriptor::required("file"))
                    .param(ParamDescriptor::optional("title", "Untitled")),
                MethodDescriptor::new("retire")
                    .param(ParamDescriptor::required("book").entity(BOOK)),
                MethodDescriptor::new("summary"),
            ],
            allowed: AllowedMethodTable::new()
                .allow("show", Verb::Get)
                .allow("titles", Verb::Get)
                .allow("mine", Verb::Get)
                .allow("import", Verb::Post)
                .allow("retire", AccessRule::with_permission(Verb::Post, RETIRE_BOOKS))
                .allow("summary", Verb::Get),
            public: ["show", "titles", "summary"].into_iter().collect(),
        }
    }
}

#[async_trait]
impl WebService for BookService {
    fn name(&self) -> &str {
        "BookService"
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
            "titles" => {
                let books = self.entities.list_viewable(BOOK, &ctx.caller).await?;
                Ok(Collection::data_list(books).into())
            }
            "mine" => {
                let email = ctx
                    .caller
                    .principal()
                    .map(|p| p.email.clone())
                    .unwrap_or_default();
                Ok(Value::from(email))
            }
            "import" => {
                let owner = ctx
                    .caller
                    .member_id()
                    .ok_or_else(|| DispatchError::forbidden("members only"))?;
                let file = args.blob(0)?;
                let book = self
                    .entities
                    .insert(
                        NewEntity::new(BOOK)
                            .owned_by(owner)
                            .field("Title", args.text(1)?)
                            .field("Size", file.len() as i64),
                    )
                    .await?;
                Ok(book.into())
            }
            "retire" => {
                let Some(book) = args.entity(0)? else {
                    return Ok(Value::null());
                };
                Ok(self
                    .entities
                    .update_field(book.id(), "Status", "retired")
                    .await?
                    .into())
            }
            "summary" => Ok(Record::std_class()
                .with("Shelves", vec![Value::from("fiction"), Value::from("poetry")])
                .with("Open", true)
                .into()),
            other => Err(DispatchError::internal(format!("no method {}", other))),
        }
    }
}

pub struct Library {
    pub pool: sqlx::SqlitePool,
    pub entities: Arc<SqliteEntityRepository>,
    pub members: SqliteMemberRepository,
    pub dispatcher: Arc<Dispatcher>,
}

impl Library {
    pub async fn open() -> Self {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let time: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
        let types = Arc::new(
            TypeHierarchy::builder()
                .entity(BOOK)
                .declare(NOVEL, BOOK)
                .entity("Magazine")
                .build()
                .unwrap(),
        );
        let entities = Arc::new(SqliteEntityRepository::new(
            pool.clone(),
            types.clone(),
            time.clone(),
        ));
        let members = SqliteMemberRepository::new(pool.clone(), time);

        let locator = InMemoryServiceLocator::new()
            .register(Arc::new(BookService::new(entities.clone())));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(locator),
            Arc::new(SqliteAuthorizer::new(pool.clone())),
            entities.clone(),
            types,
            Arc::new(ConverterRegistry::defaults(true)),
        ));

        Self {
            pool,
            entities,
            members,
            dispatcher,
        }
    }

    pub async fn book(&self, entity: NewEntity) -> i64 {
        self.entities.insert(entity).await.unwrap().id()
    }

    /// Member with token `secret`, returned as the full `<id>:<token>` credential
    pub async fn member(&self, email: &str, grants: &[&str]) -> (i64, String) {
        let id = self.members.create(email).await.unwrap();
        self.members.set_token(id, "secret").await.unwrap();
        for code in grants {
            self.members.grant(id, code).await.unwrap();
        }
        (id, format!("{}:secret", id))
    }
}

/// Parse a JSON response body and return its `response` member
pub fn json_response(body: &str) -> serde_json::Value {
    let parsed: serde_json::Value = serde_json::from_str(body).unwrap();
    parsed["response"].clone()
}

/// Name of the root element of a well-formed XML document
pub fn xml_root(body: &str) -> String {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(body);
    let mut root = None;
    let mut depth = 0usize;
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) => {
                if depth == 0 {
                    root = Some(String::from_utf8(e.name().as_ref().to_vec()).unwrap());
                }
                depth += 1;
            }
            Event::End(_) => depth -= 1,
            Event::Eof => break,
            _ => {}
        }
    }
    assert_eq!(depth, 0, "unbalanced XML: {}", body);
    root.unwrap()
}
