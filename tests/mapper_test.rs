//! 文档映射器集成测试（内存存储）

use rat_docmap::*;
use mongodb::bson::oid as bson_oid;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn data(pairs: Vec<(&str, DataValue)>) -> HashMap<String, DataValue> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn users() -> ModelDefinition {
    ModelDefinition::new(
        ModelMeta::new("users")
            .collection("Users")
            .field("name", string_field()),
    )
}

fn articles() -> ModelDefinition {
    ModelDefinition::new(
        ModelMeta::new("articles")
            .field("title", string_field().default_value("untitled"))
            .field("body", string_field())
            .field("status", string_field())
            .field("published", boolean_field().default_value(false))
            .field("views", integer_field())
            .field("author", id_field())
            .relation(RelationDefinition::new("author", "author", "users"))
            .search_fields(vec!["title".to_string(), "body".to_string()])
            .sort_order(vec![SortConfig::asc("title")])
            .index(IndexDefinition::new(vec!["title".to_string()]).unique()),
    )
}

fn setup() -> (Arc<MemoryStore>, DocumentMapper) {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(ModelRegistry::new());
    registry.register(users());
    registry.register(articles());
    let mapper = DocumentMapper::new(
        store.clone(),
        registry,
        Arc::new(SingleDatabaseResolver::new("app")),
    )
    .with_identity(Arc::new(StaticIdentity::new("ada")));
    (store, mapper)
}

#[tokio::test]
async fn test_create_casts_tracks_and_runs_hooks_once() {
    println!("🔍 测试创建文档");
    let before = Arc::new(AtomicUsize::new(0));
    let after = Arc::new(AtomicUsize::new(0));
    let (b, a) = (before.clone(), after.clone());

    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(ModelRegistry::new());
    registry.register(
        ModelDefinition::new(
            ModelMeta::new("items")
                .field("name", string_field())
                .field("count", integer_field()),
        )
        .on(HookKind::BeforeCreate, move |_, _| {
            b.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .on(HookKind::AfterCreate, move |doc, _| {
            assert!(doc.id().is_some());
            a.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    );
    let mapper = DocumentMapper::new(store.clone(), registry, Arc::new(SingleDatabaseResolver::new("app")));

    let doc = mapper
        .create("items", data(vec![("name", "a".into()), ("count", "3".into())]))
        .await
        .unwrap();

    assert_eq!(doc.get("count"), Some(DataValue::Int(3)));
    assert!(doc.is_changed("count"));
    assert!(doc.is_changed("name"));
    assert!(doc.id().is_some());
    assert!(matches!(doc.get(hooks::CREATED_AT), Some(DataValue::DateTime(_))));
    // 匿名身份不写操作者字段
    assert!(!doc.contains(hooks::ENTRY_CREATED_BY));
    assert_eq!(before.load(Ordering::SeqCst), 1);
    assert_eq!(after.load(Ordering::SeqCst), 1);

    let stored = mapper.get_by_id("items", &doc.id().unwrap().to_hex()).await.unwrap();
    assert_eq!(stored.get("count"), Some(DataValue::Int(3)));
    assert_eq!(store.count(&CollectionTarget::new("app", "items")), 1);
    println!("✅ 创建文档测试完成");
}

#[tokio::test]
async fn test_get_by_id_reports_id_and_collection() {
    let (_, mapper) = setup();
    let err = mapper
        .get_by_id("articles", "000000000000000000000000")
        .await
        .unwrap_err();

    match &err {
        OdmError::NotFound { id, collection } => {
            assert_eq!(id, "000000000000000000000000");
            assert_eq!(collection, "articles");
        }
        other => panic!("期望 NotFound，实际: {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("000000000000000000000000"));
    assert!(message.contains("articles"));

    // 无法解析的标识同样报告 NotFound
    assert!(matches!(
        mapper.get_by_id("articles", "not-an-id").await,
        Err(OdmError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_unregistered_model_is_an_error() {
    let (_, mapper) = setup();
    assert!(matches!(
        mapper.create("ghosts", HashMap::new()).await,
        Err(OdmError::ModelNotRegistered { .. })
    ));
}

#[tokio::test]
async fn test_hook_failure_aborts_before_insert() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(ModelRegistry::new());
    registry.register(
        ModelDefinition::bare(ModelMeta::new("locked"))
            .on(HookKind::BeforeCreate, |_, _| Err(anyhow::anyhow!("只读集合"))),
    );
    let mapper = DocumentMapper::new(store.clone(), registry, Arc::new(SingleDatabaseResolver::new("app")));

    let err = mapper.create("locked", HashMap::new()).await.unwrap_err();
    assert!(matches!(err, OdmError::Hook { ref hook, .. } if hook == "beforeCreate"));
    assert_eq!(store.count(&CollectionTarget::new("app", "locked")), 0);
}

#[tokio::test]
async fn test_duplicate_key_becomes_insert_error() {
    let after_create = Arc::new(AtomicUsize::new(0));
    let after_save = Arc::new(AtomicUsize::new(0));
    let (c, v) = (after_create.clone(), after_save.clone());

    let registry = Arc::new(ModelRegistry::new());
    registry.register(
        articles()
            .on(HookKind::AfterCreate, move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .on(HookKind::AfterSave, move |_, _| {
                v.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
    );
    let mapper = DocumentMapper::new(
        Arc::new(MemoryStore::new()),
        registry,
        Arc::new(SingleDatabaseResolver::new("app")),
    );
    let names = mapper.ensure_indexes("articles").await.unwrap();
    assert_eq!(names, vec!["title_1".to_string()]);

    mapper
        .create("articles", data(vec![("title", "same".into())]))
        .await
        .unwrap();
    assert_eq!(after_create.load(Ordering::SeqCst), 1);

    let err = mapper
        .create("articles", data(vec![("title", "same".into())]))
        .await
        .unwrap_err();
    assert!(matches!(err, OdmError::Insert { ref collection, .. } if collection == "articles"));

    let mut duplicate = mapper.instantiate("articles").unwrap();
    duplicate.set("title", "same").unwrap();
    assert!(matches!(mapper.save(&mut duplicate).await, Err(OdmError::Insert { .. })));
    assert!(duplicate.id().is_none());

    // 驱动失败之后的钩子都不执行
    assert_eq!(after_create.load(Ordering::SeqCst), 1);
    assert_eq!(after_save.load(Ordering::SeqCst), 0);
}

fn recording_model(name: &str, log: Arc<parking_lot::Mutex<Vec<&'static str>>>) -> ModelDefinition {
    let kinds = [
        HookKind::BeforeCreate,
        HookKind::AfterCreate,
        HookKind::BeforeUpdate,
        HookKind::AfterUpdate,
        HookKind::BeforeSave,
        HookKind::AfterSave,
        HookKind::BeforeDelete,
        HookKind::AfterDelete,
    ];
    kinds.into_iter().fold(
        ModelDefinition::bare(ModelMeta::new(name).field("title", string_field())),
        |definition, kind| {
            let log = log.clone();
            definition.on(kind, move |_, _| {
                log.lock().push(kind.as_str());
                Ok(())
            })
        },
    )
}

#[tokio::test]
async fn test_hooks_run_in_lifecycle_order() {
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let registry = Arc::new(ModelRegistry::new());
    registry.register(recording_model("journal", log.clone()));
    let mapper = DocumentMapper::new(
        Arc::new(MemoryStore::new()),
        registry,
        Arc::new(SingleDatabaseResolver::new("app")),
    );

    let mut doc = mapper.instantiate("journal").unwrap();
    doc.set("title", "first").unwrap();
    mapper.save(&mut doc).await.unwrap();
    assert_eq!(
        std::mem::take(&mut *log.lock()),
        vec!["beforeSave", "beforeCreate", "afterCreate", "afterSave"]
    );

    doc.mark_changed("title", "second").unwrap();
    mapper.save(&mut doc).await.unwrap();
    assert_eq!(
        std::mem::take(&mut *log.lock()),
        vec!["beforeSave", "beforeUpdate", "afterUpdate", "afterSave"]
    );

    mapper.create("journal", HashMap::new()).await.unwrap();
    assert_eq!(std::mem::take(&mut *log.lock()), vec!["beforeCreate", "afterCreate"]);

    let id = doc.id().unwrap().to_hex();
    assert_eq!(mapper.delete_by_id("journal", &id).await.unwrap(), 1);
    assert_eq!(std::mem::take(&mut *log.lock()), vec!["beforeDelete", "afterDelete"]);

    // 已不存在的文档不触发钩子
    assert_eq!(mapper.delete_by_id("journal", &id).await.unwrap(), 0);
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_save_updates_existing_document() {
    let (_, mapper) = setup();
    let mut doc = mapper
        .create("articles", data(vec![("title", "draft".into())]))
        .await
        .unwrap();
    let id = doc.id().unwrap();

    doc.mark_changed("title", "final").unwrap();
    mapper.save(&mut doc).await.unwrap();

    assert_eq!(doc.id(), Some(id));
    assert!(matches!(doc.get(hooks::UPDATED_AT), Some(DataValue::DateTime(_))));
    assert_eq!(doc.get(hooks::ENTRY_LAST_MODIFIED_BY), Some(DataValue::from("ada")));
    // 保存开始时清空变更字段，保存期间钩子重新记录
    assert!(!doc.is_changed("title"));

    let stored = mapper.get_by_id("articles", &id.to_hex()).await.unwrap();
    assert_eq!(stored.get("title"), Some(DataValue::from("final")));
    assert!(stored.contains(hooks::TIMESTAMP_ENTRY_LAST_MODIFIED));
    assert_eq!(stored.get(hooks::ENTRY_CREATED_BY), Some(DataValue::from("ada")));
}

#[tokio::test]
async fn test_save_of_deleted_document_is_not_found() {
    let (_, mapper) = setup();
    let mut doc = mapper.create("articles", HashMap::new()).await.unwrap();
    let id = doc.id().unwrap().to_hex();
    assert_eq!(mapper.delete_by_id("articles", &id).await.unwrap(), 1);
    assert!(matches!(mapper.save(&mut doc).await, Err(OdmError::NotFound { .. })));
}

#[tokio::test]
async fn test_assign_ignores_undeclared_fields() {
    let (_, mapper) = setup();
    let mut doc = mapper.instantiate("articles").unwrap();
    let input = data(vec![
        ("title", "hello".into()),
        ("views", "12".into()),
        ("is_admin", true.into()),
    ]);

    mapper.update(&mut doc, &input).await.unwrap();

    assert!(!doc.contains("is_admin"));
    assert_eq!(doc.get("views"), Some(DataValue::Int(12)));
    assert_eq!(doc.get("published"), Some(DataValue::Bool(false)));
    assert!(!doc.contains("body"));

    let stored = mapper.get_by_id("articles", &doc.id().unwrap().to_hex()).await.unwrap();
    assert!(!stored.contains("is_admin"));
    assert_eq!(stored.get("title"), Some(DataValue::from("hello")));
}

#[tokio::test]
async fn test_replace_by_id_is_full_replace() {
    let (_, mapper) = setup();
    let doc = mapper
        .create("articles", data(vec![("title", "old".into()), ("body", "text".into())]))
        .await
        .unwrap();
    let id = doc.id().unwrap().to_hex();

    let outcome = mapper
        .replace_by_id("articles", &id, data(vec![("title", "new".into()), ("views", "5".into())]))
        .await
        .unwrap();
    assert_eq!(outcome.matched, 1);

    let stored = mapper.get_by_id("articles", &id).await.unwrap();
    assert_eq!(stored.get("title"), Some(DataValue::from("new")));
    assert_eq!(stored.get("views"), Some(DataValue::Int(5)));
    assert!(!stored.contains("body"));
    assert!(!stored.contains(hooks::CREATED_AT));

    let missing = mapper
        .replace_by_id("articles", "000000000000000000000000", HashMap::new())
        .await
        .unwrap();
    assert_eq!(missing.matched, 0);
}

#[tokio::test]
async fn test_concurrent_increments_are_not_lost() {
    let (_, mapper) = setup();
    let doc = mapper
        .create("articles", data(vec![("views", 0.into())]))
        .await
        .unwrap();
    let id = doc.id().unwrap().to_hex();

    let first = {
        let (mapper, id) = (mapper.clone(), id.clone());
        tokio::spawn(async move { mapper.increment_by_id("articles", &id, "views", 1).await })
    };
    let second = {
        let (mapper, id) = (mapper.clone(), id.clone());
        tokio::spawn(async move { mapper.increment_by_id("articles", &id, "views", 1).await })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let stored = mapper.get_by_id("articles", &id).await.unwrap();
    assert_eq!(stored.get("views"), Some(DataValue::Int(2)));

    mapper.decrement_by_id("articles", &id, "views", 2).await.unwrap();
    let stored = mapper.get_by_id("articles", &id).await.unwrap();
    assert_eq!(stored.get("views"), Some(DataValue::Int(0)));
}

#[tokio::test]
async fn test_increment_rejects_array_index_past_end() {
    let (_, mapper) = setup();
    let tags = DataValue::Array(vec![DataValue::Int(1), DataValue::Int(2)]);
    let doc = mapper
        .create("articles", data(vec![("tags", tags.clone())]))
        .await
        .unwrap();
    let id = doc.id().unwrap().to_hex();

    for path in ["tags.18446744073709551615", "tags.99999999999"] {
        assert!(matches!(
            mapper.increment_by_id("articles", &id, path, 1).await,
            Err(OdmError::Driver { .. })
        ));
    }
    mapper.increment_by_id("articles", &id, "tags.1", 1).await.unwrap();

    let stored = mapper.get_by_id("articles", &id).await.unwrap();
    assert_eq!(stored.get("tags"), Some(DataValue::Array(vec![DataValue::Int(1), DataValue::Int(3)])));
}

#[tokio::test]
async fn test_instance_increment_syncs_memory() {
    let (_, mapper) = setup();
    let mut doc = mapper
        .create("articles", data(vec![("views", 10.into())]))
        .await
        .unwrap();

    mapper.increment(&mut doc, "views", 5).await.unwrap();
    mapper.decrement(&mut doc, "views", 1).await.unwrap();
    assert_eq!(doc.get("views"), Some(DataValue::Int(14)));

    let stored = mapper.get_by_id("articles", &doc.id().unwrap().to_hex()).await.unwrap();
    assert_eq!(stored.get("views"), Some(DataValue::Int(14)));

    let mut unsaved = mapper.instantiate("articles").unwrap();
    assert!(mapper.increment(&mut unsaved, "views", 1).await.is_err());

    // 内存值不是数值时不写入存储
    let mut labelled = mapper
        .create("articles", data(vec![("label", "text".into())]))
        .await
        .unwrap();
    assert!(matches!(
        mapper.increment(&mut labelled, "label", 1).await,
        Err(OdmError::Validation { .. })
    ));
    let stored = mapper.get_by_id("articles", &labelled.id().unwrap().to_hex()).await.unwrap();
    assert_eq!(stored.get("label"), Some(DataValue::from("text")));
}

#[tokio::test]
async fn test_unset_field_removes_path() {
    let (_, mapper) = setup();
    let settings = DataValue::from(serde_json::json!({ "theme": "dark", "lang": "zh" }));
    let mut doc = mapper
        .create("articles", data(vec![("settings", settings)]))
        .await
        .unwrap();

    assert!(mapper.unset_field(&mut doc, "settings.theme").await.unwrap());
    assert!(doc.get_path("settings.theme").is_none());

    let before = doc.fields().clone();
    assert!(!mapper.unset_field(&mut doc, "settings.missing.deep").await.unwrap());
    assert_eq!(doc.fields(), &before);

    let stored = mapper.get_by_id("articles", &doc.id().unwrap().to_hex()).await.unwrap();
    assert!(stored.get_path("settings.theme").is_none());
    assert_eq!(stored.get_path("settings.lang"), Some(&DataValue::from("zh")));
}

#[tokio::test]
async fn test_find_sorts_and_paginates() {
    let (_, mapper) = setup();
    for (title, views) in [("b", 2), ("a", 1), ("d", 4), ("c", 3)] {
        mapper
            .create("articles", data(vec![("title", title.into()), ("views", views.into())]))
            .await
            .unwrap();
    }

    let cursor = mapper
        .find(
            "articles",
            vec![QueryCondition::new("views", QueryOperator::Gt, 1).into()],
            QueryOptions::new()
                .with_sort(vec![SortConfig::desc("views")])
                .paginate(2, 1),
        )
        .unwrap();

    let titles = |docs: Vec<Document>| -> Vec<DataValue> {
        docs.iter().filter_map(|doc| doc.get("title")).collect()
    };
    assert_eq!(titles(cursor.collect().await.unwrap()), vec![DataValue::from("c"), DataValue::from("b")]);
    // 游标可以重复遍历
    assert_eq!(titles(cursor.collect().await.unwrap()).len(), 2);
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_literal() {
    let (_, mapper) = setup();
    for (title, body) in [("Rust 入门", "hello world"), ("Go tips", "HELLO again"), ("C++ notes", "misc")] {
        mapper
            .create("articles", data(vec![("title", title.into()), ("body", body.into())]))
            .await
            .unwrap();
    }

    let found = mapper.search("articles", "hello").unwrap().collect().await.unwrap();
    let titles: Vec<DataValue> = found.iter().filter_map(|doc| doc.get("title")).collect();
    assert_eq!(titles, vec![DataValue::from("Go tips"), DataValue::from("Rust 入门")]);

    let literal = mapper.search("articles", "c++").unwrap().collect().await.unwrap();
    assert_eq!(literal.len(), 1);

    let query = mapper.full_text_query("articles", "x", None).unwrap();
    assert_eq!(query.options.pagination.map(|p| p.limit), Some(DEFAULT_SEARCH_LIMIT));
    assert!(mapper.full_text_query("users", "x", None).is_err());
}

#[tokio::test]
async fn test_relations_resolve_and_serialize() {
    let (_, mapper) = setup();
    let author = mapper
        .create("users", data(vec![("name", "ada".into())]))
        .await
        .unwrap();
    let author_id = author.id().unwrap().to_hex();
    let published = mapper
        .create(
            "articles",
            data(vec![
                ("title", "one".into()),
                ("status", "published".into()),
                ("author", author_id.clone().into()),
            ]),
        )
        .await
        .unwrap();
    mapper
        .create("articles", data(vec![("title", "two".into()), ("status", "draft".into())]))
        .await
        .unwrap();

    let cursor = mapper
        .find_with_relations(
            "articles",
            vec![QueryCondition::eq("status", "published").into()],
            QueryOptions::new(),
        )
        .unwrap();
    assert_eq!(cursor.pipeline().map(|stages| stages.len()), Some(2));
    let docs = cursor.collect().await.unwrap();
    assert_eq!(docs.len(), 1);
    let related = docs[0].related("author").unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].get("name"), Some(DataValue::from("ada")));
    assert!(!docs[0].contains("local_author"));

    let entry = mapper
        .get_entry_with_relations("articles", &published.id().unwrap().to_hex())
        .await
        .unwrap();
    let output = serialize(&entry, &SerializeOptions::new().exclude(["entry_created_by"]));
    assert!(!output.contains_key("entry_created_by"));
    assert_eq!(output["id"], serde_json::json!(published.id().unwrap().to_hex()));
    assert_eq!(output["author"], serde_json::json!(author_id));
    assert_eq!(output["local_author"][0]["name"], serde_json::json!("ada"));

    assert!(matches!(
        mapper.get_entry_with_relations("articles", "000000000000000000000000").await,
        Err(OdmError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_add_or_update_entry() {
    let (_, mapper) = setup();
    let created = mapper
        .add_or_update_entry("articles", data(vec![("title", "first".into())]))
        .await
        .unwrap();
    let id = created.id().unwrap().to_hex();

    let updated = mapper
        .add_or_update_entry("articles", data(vec![("id", id.clone().into()), ("title", "second".into())]))
        .await
        .unwrap();
    assert_eq!(updated.id().unwrap().to_hex(), id);
    let stored = mapper.get_by_id("articles", &id).await.unwrap();
    assert_eq!(stored.get("title"), Some(DataValue::from("second")));

    // 标识合法但不存在、或无法转换时都新建文档
    let fresh = mapper
        .add_or_update_entry(
            "articles",
            data(vec![("id", "000000000000000000000000".into()), ("title", "third".into())]),
        )
        .await
        .unwrap();
    assert_ne!(fresh.id().unwrap().to_hex(), id);
    let garbage = mapper
        .add_or_update_entry("articles", data(vec![("id", "xyz".into()), ("title", "fourth".into())]))
        .await
        .unwrap();
    assert!(garbage.id().is_some());
}

#[tokio::test]
async fn test_delete_runs_hooks() {
    let deleted = Arc::new(AtomicUsize::new(0));
    let (before, after) = (deleted.clone(), deleted.clone());
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(ModelRegistry::new());
    registry.register(
        ModelDefinition::new(ModelMeta::new("notes"))
            .on(HookKind::BeforeDelete, move |_, _| {
                before.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .on(HookKind::AfterDelete, move |_, _| {
                after.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
    );
    let mapper = DocumentMapper::new(store.clone(), registry, Arc::new(SingleDatabaseResolver::new("app")));

    let mut doc = mapper.create("notes", HashMap::new()).await.unwrap();
    assert_eq!(mapper.delete(&mut doc).await.unwrap(), 1);
    assert_eq!(deleted.load(Ordering::SeqCst), 2);
    assert_eq!(store.count(&CollectionTarget::new("app", "notes")), 0);

    let other = mapper.create("notes", HashMap::new()).await.unwrap();
    assert_eq!(mapper.delete_by_id("notes", &other.id().unwrap().to_hex()).await.unwrap(), 1);
    assert_eq!(deleted.load(Ordering::SeqCst), 4);
    assert_eq!(store.count(&CollectionTarget::new("app", "notes")), 0);

    let mut unsaved = mapper.instantiate("notes").unwrap();
    assert!(matches!(mapper.delete(&mut unsaved).await, Err(OdmError::Validation { .. })));
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(ModelRegistry::new());
    registry.register(articles());
    let mapper = DocumentMapper::new(store.clone(), registry, Arc::new(TenantDatabaseResolver::new("app")));

    let acme = mapper.for_tenant("acme");
    let doc = acme
        .create("articles", data(vec![("title", "acme only".into())]))
        .await
        .unwrap();
    let id = doc.id().unwrap().to_hex();

    assert!(acme.get_by_id("articles", &id).await.is_ok());
    assert!(matches!(
        mapper.for_tenant("globex").get_by_id("articles", &id).await,
        Err(OdmError::NotFound { .. })
    ));
    assert!(store.database_names().contains(&"app_acme".to_string()));

    acme.drop_database().await.unwrap();
    assert!(!store.database_names().contains(&"app_acme".to_string()));
}

/// 更新操作总是失败的存储，其余操作交给内存存储
struct RejectingUpdates(MemoryStore);

#[async_trait::async_trait]
impl DocumentStore for RejectingUpdates {
    async fn insert_one(&self, target: &CollectionTarget, document: adapter::RawDocument) -> OdmResult<bson_oid::ObjectId> {
        self.0.insert_one(target, document).await
    }

    async fn find_one(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
    ) -> OdmResult<Option<adapter::RawDocument>> {
        self.0.find_one(target, filter).await
    }

    async fn find(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
        options: &QueryOptions,
    ) -> OdmResult<adapter::DocumentStream> {
        self.0.find(target, filter, options).await
    }

    async fn update_one(
        &self,
        _target: &CollectionTarget,
        _filter: &[QueryConditionGroup],
        _update: &[UpdateOperation],
    ) -> OdmResult<UpdateOutcome> {
        Err(OdmError::Driver { message: "写入被拒绝".to_string() })
    }

    async fn replace_one(
        &self,
        target: &CollectionTarget,
        filter: &[QueryConditionGroup],
        replacement: adapter::RawDocument,
    ) -> OdmResult<UpdateOutcome> {
        self.0.replace_one(target, filter, replacement).await
    }

    async fn delete_one(&self, target: &CollectionTarget, filter: &[QueryConditionGroup]) -> OdmResult<u64> {
        self.0.delete_one(target, filter).await
    }

    async fn aggregate(&self, target: &CollectionTarget, pipeline: &[PipelineStage]) -> OdmResult<adapter::DocumentStream> {
        self.0.aggregate(target, pipeline).await
    }

    async fn create_index(&self, target: &CollectionTarget, index: &IndexDefinition) -> OdmResult<String> {
        self.0.create_index(target, index).await
    }

    async fn drop_database(&self, database: &str) -> OdmResult<()> {
        self.0.drop_database(database).await
    }
}

#[tokio::test]
async fn test_failed_unset_keeps_memory_state() {
    let registry = Arc::new(ModelRegistry::new());
    registry.register(articles());
    let mapper = DocumentMapper::new(
        Arc::new(RejectingUpdates(MemoryStore::new())),
        registry,
        Arc::new(SingleDatabaseResolver::new("app")),
    );
    let settings = DataValue::from(serde_json::json!({ "theme": "dark" }));
    let mut doc = mapper
        .create("articles", data(vec![("settings", settings), ("views", 1.into())]))
        .await
        .unwrap();

    assert!(matches!(
        mapper.unset_field(&mut doc, "settings.theme").await,
        Err(OdmError::Driver { .. })
    ));
    assert_eq!(doc.get_path("settings.theme"), Some(&DataValue::from("dark")));

    assert!(mapper.increment(&mut doc, "views", 1).await.is_err());
    assert_eq!(doc.get("views"), Some(DataValue::Int(1)));
}
