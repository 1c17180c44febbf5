use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use gridform_core::{AppError, AppResult, UserIdentity};
use gridform_domain::{
    Breadcrumb, BreadcrumbTrail, Collection, CollectionKind, FieldDefinition, FieldKind,
    FormMessage, Record, RecordCapabilities, RecordId, RecordTypeDefinition, RecordTypeRegistry,
    RelationDefinition, Validator,
};
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;

use crate::{
    DetailFormComponent, DetailFormConfiguration, DetailFormServices, EnclosingHandler,
    FormMessageStore, ItemRequest, PageContent, PageController, RecordPolicy, RecordStore,
    TemplateRenderer,
};

pub const SECTION_LINK: &str = "/admin/security";

pub fn id(value: u64) -> RecordId {
    RecordId::new(value).unwrap_or_else(|_| unreachable!())
}

pub fn registry() -> RecordTypeRegistry {
    let field = |name: &str, kind: FieldKind| {
        FieldDefinition::new(name, name, kind, false, None).unwrap_or_else(|_| unreachable!())
    };

    let role = RecordTypeDefinition::new(
        "PermissionRole",
        "Role",
        vec![
            field("Title", FieldKind::Text),
            field("OnlyAdminCanApply", FieldKind::Checkbox),
        ],
    )
    .and_then(|definition| {
        definition.with_relation(RelationDefinition::has_many(
            "Codes",
            "PermissionRoleCode",
            "RoleID",
            true,
        )?)
    })
    .and_then(|definition| {
        definition.with_relation(RelationDefinition::many_many(
            "Groups",
            "Group",
            vec!["Sort".to_owned()],
        )?)
    })
    .unwrap_or_else(|_| unreachable!())
    .with_validator(Validator::RequiredFields(vec!["Title".to_owned()]));

    let code = RecordTypeDefinition::new(
        "PermissionRoleCode",
        "Role Code",
        vec![field("Code", FieldKind::Text), field("RoleID", FieldKind::Number)],
    )
    .unwrap_or_else(|_| unreachable!());
    let group = RecordTypeDefinition::new("Group", "Group", vec![field("Title", FieldKind::Text)])
        .unwrap_or_else(|_| unreachable!());
    let restricted_role = RecordTypeDefinition::new("RestrictedRole", "Restricted Role", Vec::new())
        .and_then(|definition| definition.with_parent("PermissionRole"))
        .unwrap_or_else(|_| unreachable!());

    let mut registry = RecordTypeRegistry::new();
    for definition in [role, code, group, restricted_role] {
        assert!(registry.register(definition).is_ok());
    }
    registry
}

pub fn roles() -> Collection {
    Collection::filtered("Roles", "PermissionRole", Vec::new()).unwrap_or_else(|_| unreachable!())
}

pub fn record(id_value: u64, record_type: &str, fields: Value) -> Record {
    let fields = match fields {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    Record::persisted(id(id_value), record_type, fields).unwrap_or_else(|_| unreachable!())
}

#[derive(Default)]
pub struct FakeRecordStore {
    records: Mutex<BTreeMap<u64, Record>>,
    memberships: Mutex<BTreeMap<u64, Map<String, Value>>>,
    reject_writes: Mutex<Option<String>>,
    pub delete_calls: Mutex<usize>,
}

impl FakeRecordStore {
    pub async fn insert(&self, record: Record) {
        if let Some(id) = record.id() {
            self.records.lock().await.insert(id.get(), record);
        }
    }

    pub async fn insert_member(&self, record: Record, extra_data: Map<String, Value>) {
        if let Some(id) = record.id() {
            self.memberships.lock().await.insert(id.get(), extra_data);
        }
        self.insert(record).await;
    }

    pub async fn reject_writes(&self, message: &str) {
        *self.reject_writes.lock().await = Some(message.to_owned());
    }

    pub async fn stored(&self, id_value: u64) -> Option<Record> {
        self.records.lock().await.get(&id_value).cloned()
    }

    pub async fn membership(&self, id_value: u64) -> Option<Map<String, Value>> {
        self.memberships.lock().await.get(&id_value).cloned()
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn find_in_collection(
        &self,
        collection: &Collection,
        id: RecordId,
    ) -> AppResult<Option<Record>> {
        if collection.is_many_many() && !self.memberships.lock().await.contains_key(&id.get()) {
            return Ok(None);
        }

        Ok(self
            .records
            .lock()
            .await
            .get(&id.get())
            .filter(|record| collection.matches_fields(record))
            .cloned())
    }

    async fn write(&self, record: Record) -> AppResult<Record> {
        if let Some(message) = self.reject_writes.lock().await.clone() {
            return Err(AppError::Validation(message));
        }

        let mut records = self.records.lock().await;
        let record_id = match record.id() {
            Some(existing) => existing,
            None => id(records.keys().next_back().copied().unwrap_or(0) + 1),
        };
        let written = record.into_written(record_id);
        records.insert(record_id.get(), written.clone());
        Ok(written)
    }

    async fn delete(&self, record: &Record) -> AppResult<()> {
        *self.delete_calls.lock().await += 1;
        let id = record
            .id()
            .ok_or_else(|| AppError::Validation("unsaved records cannot be deleted".to_owned()))?;
        self.records.lock().await.remove(&id.get());
        Ok(())
    }

    async fn add_to_collection(
        &self,
        collection: &Collection,
        record: &Record,
        extra_data: Option<Map<String, Value>>,
    ) -> AppResult<()> {
        if let (CollectionKind::ManyMany { .. }, Some(id)) = (collection.kind(), record.id()) {
            self.memberships
                .lock()
                .await
                .insert(id.get(), extra_data.unwrap_or_default());
        }
        Ok(())
    }

    async fn extra_data(
        &self,
        _collection: &Collection,
        id: RecordId,
    ) -> AppResult<Map<String, Value>> {
        Ok(self
            .memberships
            .lock()
            .await
            .get(&id.get())
            .cloned()
            .unwrap_or_default())
    }
}

pub struct FakeRecordPolicy {
    pub capabilities: RecordCapabilities,
}

#[async_trait]
impl RecordPolicy for FakeRecordPolicy {
    async fn capabilities(
        &self,
        _actor: &UserIdentity,
        _record: &Record,
    ) -> AppResult<RecordCapabilities> {
        Ok(self.capabilities)
    }
}

pub struct FakeRenderer;

impl TemplateRenderer for FakeRenderer {
    fn render(&self, template: &str, context: &Value) -> AppResult<String> {
        Ok(format!("[{template}] {context}"))
    }
}

pub struct FakeController {
    pub page_chrome: bool,
    pub back_link: Option<String>,
}

impl PageController for FakeController {
    fn link(&self) -> String {
        SECTION_LINK.to_owned()
    }

    fn back_link(&self) -> Option<String> {
        self.back_link.clone()
    }

    fn breadcrumbs(&self) -> Option<BreadcrumbTrail> {
        Some(BreadcrumbTrail::from(vec![Breadcrumb::new(
            "Security",
            Some(SECTION_LINK.to_owned()),
        )]))
    }

    fn is_page_chrome(&self) -> bool {
        self.page_chrome
    }

    fn customise(&self, content: PageContent) -> AppResult<String> {
        Ok(format!("<page title=\"{}\">{}</page>", content.title, content.content))
    }
}

pub fn controller(page_chrome: bool) -> EnclosingHandler {
    EnclosingHandler::Controller(Arc::new(FakeController {
        page_chrome,
        back_link: None,
    }))
}

#[derive(Default)]
pub struct FakeMessages {
    messages: Mutex<BTreeMap<String, FormMessage>>,
}

impl FakeMessages {
    pub async fn peek(&self, form_key: &str) -> Option<FormMessage> {
        self.messages.lock().await.get(form_key).cloned()
    }
}

#[async_trait]
impl FormMessageStore for FakeMessages {
    async fn set(&self, form_key: &str, message: FormMessage) -> AppResult<()> {
        self.messages
            .lock()
            .await
            .insert(form_key.to_owned(), message);
        Ok(())
    }

    async fn take(&self, form_key: &str) -> AppResult<Option<FormMessage>> {
        Ok(self.messages.lock().await.remove(form_key))
    }
}

pub struct Fixture {
    pub store: Arc<FakeRecordStore>,
    pub messages: Arc<FakeMessages>,
    pub component: DetailFormComponent,
}

impl Fixture {
    pub fn new(capabilities: RecordCapabilities) -> Self {
        Self::with_configuration(
            capabilities,
            DetailFormConfiguration::new().unwrap_or_else(|_| unreachable!()),
        )
    }

    pub fn with_configuration(
        capabilities: RecordCapabilities,
        configuration: DetailFormConfiguration,
    ) -> Self {
        let store = Arc::new(FakeRecordStore::default());
        let services = DetailFormServices::new(
            store.clone(),
            Arc::new(FakeRecordPolicy { capabilities }),
            Arc::new(FakeRenderer),
            Arc::new(registry()),
        );

        Self {
            store,
            messages: Arc::new(FakeMessages::default()),
            component: DetailFormComponent::new(configuration, services),
        }
    }

    pub fn request(&self) -> ItemRequest {
        ItemRequest::new(
            UserIdentity::new("alice", "Alice", None),
            self.messages.clone(),
        )
    }

    pub fn fragment_request(&self) -> ItemRequest {
        self.request().as_fragment(Vec::new())
    }
}

pub fn title_data(title: &str) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("Title".to_owned(), json!(title));
    data.insert(crate::SAVE_ACTION_FIELD.to_owned(), json!("Save"));
    data
}
