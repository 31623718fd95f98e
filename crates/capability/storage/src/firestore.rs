//! Firestore REST 文档存储
//!
//! 集合布局：
//! - `transactions/{tid}`，子集合 `payments/{pid}`
//! - `reports/{rid}`，子集合 `chats/{自动 ID}`
//! - `staffs/{email}`
//! - `customers/{uid}`，子集合 `cars/{车牌}`
//!
//! 字段在 Firestore 类型值与 JSON 之间转换：时间字段写成 `timestampValue`，
//! 关联字段（customer / staff / t_ref / paid_by）写成 `referenceValue`，读取时还原为文档 ID。
//! 条件写入走 `beginTransaction`，事务内读取判定后 `commit`，提交冲突时重试。

use crate::error::StorageError;
use crate::models::{
    CarRecord, ChatRecord, CustomerRecord, PaymentRecord, PaymentStatus, ReportRecord, ReportStatus, StaffRecord,
    TransactionCreate, TransactionRecord, TransactionStatus, TransactionUpdate,
};
use crate::traits::{
    ClaimOutcome, ConditionalWrite, CustomerStore, PaymentStore, ReportStore, StaffStore, TransactionStore,
};
use crate::validation::ensure_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
const PAGE_SIZE: &str = "300";
const COMMIT_ATTEMPTS: usize = 5;

const TIMESTAMP_FIELDS: &[&str] = &[
    "timestamp_in",
    "timestamp_out",
    "timestamp",
    "created_timestamp",
    "closed_timestamp",
];

fn reference_collection(field: &str) -> Option<&'static str> {
    match field {
        "customer" | "paid_by" => Some("customers"),
        "staff" => Some("staffs"),
        "t_ref" => Some("transactions"),
        _ => None,
    }
}

/// Firestore 连接信息
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project: String,
    /// Bearer token；本地模拟器可省略
    pub auth: Option<String>,
    /// 默认 `https://firestore.googleapis.com`
    pub base_url: Option<String>,
}

/// 一个解码后的文档：相对 `documents/` 的路径与普通 JSON 字段
#[derive(Debug, Clone, PartialEq)]
struct Document {
    path: String,
    fields: Map<String, Value>,
}

impl Document {
    fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// 子集合文档的上级文档 ID
    fn parent_id(&self) -> Option<&str> {
        self.path.rsplit('/').nth(2)
    }
}

/// 字段编解码与查询构造，只依赖数据库名
#[derive(Debug, Clone)]
struct DocumentCodec {
    database: String,
}

impl DocumentCodec {
    fn new(project: &str) -> Self {
        Self {
            database: format!("projects/{project}/databases/(default)"),
        }
    }

    fn documents_root(&self) -> String {
        format!("{}/documents", self.database)
    }

    fn document_name(&self, path: &str) -> String {
        format!("{}/{}", self.documents_root(), path.trim_matches('/'))
    }

    fn encode_map(&self, fields: &Map<String, Value>) -> Value {
        let encoded: Map<String, Value> = fields
            .iter()
            .map(|(key, value)| (key.clone(), self.encode_value(Some(key), value)))
            .collect();
        Value::Object(encoded)
    }

    fn encode_value(&self, key: Option<&str>, value: &Value) -> Value {
        match value {
            Value::Null => json!({ "nullValue": null }),
            Value::Bool(flag) => json!({ "booleanValue": flag }),
            Value::Number(number) => match number.as_i64() {
                Some(int) => json!({ "integerValue": int.to_string() }),
                None => json!({ "doubleValue": number.as_f64().unwrap_or_default() }),
            },
            Value::String(text) => match key {
                Some(key) if TIMESTAMP_FIELDS.contains(&key) => json!({ "timestampValue": text }),
                Some(key) => match reference_collection(key) {
                    Some(collection) => json!({
                        "referenceValue": self.document_name(&format!("{collection}/{text}"))
                    }),
                    None => json!({ "stringValue": text }),
                },
                None => json!({ "stringValue": text }),
            },
            Value::Array(items) => {
                let values: Vec<Value> = items.iter().map(|item| self.encode_value(None, item)).collect();
                json!({ "arrayValue": { "values": values } })
            }
            Value::Object(map) => {
                if key == Some("location") {
                    if let (Some(latitude), Some(longitude)) = (map.get("latitude"), map.get("longitude")) {
                        return json!({
                            "geoPointValue": { "latitude": latitude, "longitude": longitude }
                        });
                    }
                }
                json!({ "mapValue": { "fields": self.encode_map(map) } })
            }
        }
    }

    fn decode_document(&self, raw: &Value) -> Result<Document, StorageError> {
        let name = raw
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| StorageError::new("codec: document without name"))?;
        let prefix = format!("{}/", self.documents_root());
        let path = name
            .strip_prefix(&prefix)
            .ok_or_else(|| StorageError::new(format!("codec: foreign document {name}")))?;
        Ok(Document {
            path: path.to_string(),
            fields: decode_fields(raw.get("fields")),
        })
    }

    fn update_write(&self, path: &str, fields: &Map<String, Value>) -> Value {
        let mask: Vec<&String> = fields.keys().collect();
        json!({
            "update": { "name": self.document_name(path), "fields": self.encode_map(fields) },
            "updateMask": { "fieldPaths": mask },
            "currentDocument": { "exists": true }
        })
    }

    fn license_query(&self, license_number: &str) -> Value {
        json!({
            "from": [{ "collectionId": "transactions" }],
            "where": field_equal("license_number", json!({ "stringValue": license_number }))
        })
    }

    fn pending_payments_query(&self) -> Value {
        json!({
            "from": [{ "collectionId": "payments", "allDescendants": true }],
            "where": field_equal("status", json!({ "stringValue": "Pending" })),
            "orderBy": [{ "field": { "fieldPath": "timestamp" }, "direction": "DESCENDING" }]
        })
    }

    fn open_reports_query(&self, customer: &str) -> Value {
        let customer = self.document_name(&format!("customers/{customer}"));
        json!({
            "from": [{ "collectionId": "reports" }],
            "where": {
                "compositeFilter": {
                    "op": "AND",
                    "filters": [
                        field_equal("customer", json!({ "referenceValue": customer })),
                        field_equal("status", json!({ "stringValue": "Open" }))
                    ]
                }
            }
        })
    }
}

fn field_equal(field: &str, value: Value) -> Value {
    json!({
        "fieldFilter": { "field": { "fieldPath": field }, "op": "EQUAL", "value": value }
    })
}

fn decode_fields(fields: Option<&Value>) -> Map<String, Value> {
    fields
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(key, value)| (key.clone(), decode_value(value)))
                .collect()
        })
        .unwrap_or_default()
}

fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|map| map.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "integerValue" => inner
            .as_str()
            .and_then(|text| text.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "doubleValue" | "booleanValue" | "stringValue" | "timestampValue" | "geoPointValue" => inner.clone(),
        "referenceValue" => inner
            .as_str()
            .and_then(|name| name.rsplit('/').next())
            .map(Value::from)
            .unwrap_or(Value::Null),
        "mapValue" => Value::Object(decode_fields(inner.get("fields"))),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

fn rename(map: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = map.remove(from) {
        map.insert(to.to_string(), value);
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn record_fields<T: Serialize>(record: &T) -> Result<Map<String, Value>, StorageError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Err(StorageError::new("codec: record is not an object")),
    }
}

/// 文档 ID 补回到字段后反序列化
fn into_record<T: DeserializeOwned>(
    mut fields: Map<String, Value>,
    id_key: &str,
    id: &str,
) -> Result<T, StorageError> {
    fields
        .entry(id_key.to_string())
        .or_insert_with(|| Value::from(id));
    Ok(serde_json::from_value(Value::Object(fields))?)
}

fn transaction_from(doc: Document) -> Result<TransactionRecord, StorageError> {
    let id = doc.id().to_string();
    into_record(doc.fields, "tid", &id)
}

fn payment_from(doc: Document) -> Result<PaymentRecord, StorageError> {
    let id = doc.id().to_string();
    let tid = doc.parent_id().unwrap_or_default().to_string();
    let mut fields = doc.fields;
    fields.insert("tid".to_string(), Value::from(tid));
    into_record(fields, "pid", &id)
}

fn report_from(doc: Document) -> Result<ReportRecord, StorageError> {
    let id = doc.id().to_string();
    into_record(doc.fields, "rid", &id)
}

fn staff_from(doc: Document) -> Result<StaffRecord, StorageError> {
    let id = doc.id().to_string();
    let mut fields = doc.fields;
    rename(&mut fields, "displayName", "name");
    into_record(fields, "email", &id)
}

fn staff_fields(record: &StaffRecord) -> Result<Map<String, Value>, StorageError> {
    let mut fields = record_fields(record)?;
    rename(&mut fields, "name", "displayName");
    Ok(fields)
}

/// Firestore 聊天文档转成 [`ChatRecord`] 的 JSON 形状：
/// 发送者在 `message.sender` 下，媒体地址与消息 ID 是驼峰命名，位置是地理点。
fn chat_from_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    rename(&mut fields, "messageId", "message_id");
    if let Some(Value::Object(mut message)) = fields.remove("message") {
        rename(&mut message, "contentUrl", "content_url");
        rename(&mut message, "previewUrl", "preview_url");
        rename(&mut message, "originalContentUrl", "content_url");
        rename(&mut message, "previewImageUrl", "preview_url");
        if matches!(
            message.get("type").and_then(Value::as_str),
            Some("image" | "video" | "audio")
        ) {
            message
                .entry("provider".to_string())
                .or_insert_with(|| Value::from("external"));
        }
        if let Some(Value::Object(location)) = message.remove("location") {
            for key in ["latitude", "longitude"] {
                if let Some(value) = location.get(key) {
                    message.insert(key.to_string(), value.clone());
                }
            }
        }
        if let Some(Value::Object(mut sender)) = message.remove("sender") {
            rename(&mut sender, "iconUrl", "icon_url");
            fields.insert("sender".to_string(), Value::Object(sender));
        }
        fields.insert("message".to_string(), Value::Object(message));
    }
    fields
}

fn chat_to_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    rename(&mut fields, "message_id", "messageId");
    let sender = fields.remove("sender");
    if let Some(Value::Object(mut message)) = fields.remove("message") {
        rename(&mut message, "content_url", "contentUrl");
        rename(&mut message, "preview_url", "previewUrl");
        if let (Some(latitude), Some(longitude)) = (message.remove("latitude"), message.remove("longitude")) {
            message.insert(
                "location".to_string(),
                json!({ "latitude": latitude, "longitude": longitude }),
            );
        }
        if let Some(Value::Object(mut sender)) = sender {
            rename(&mut sender, "icon_url", "iconUrl");
            message.insert("sender".to_string(), Value::Object(sender));
        }
        fields.insert("message".to_string(), Value::Object(message));
    }
    fields
}

fn transaction_update_fields(update: &TransactionUpdate) -> Result<Map<String, Value>, StorageError> {
    let mut fields = Map::new();
    let mut put = |key: &str, value: Value| {
        fields.insert(key.to_string(), value);
    };
    if let Some(value) = &update.license_number {
        put("license_number", Value::from(value.as_str()));
    }
    if let Some(value) = update.timestamp_in {
        put("timestamp_in", serde_json::to_value(value)?);
    }
    if let Some(value) = update.timestamp_out {
        put("timestamp_out", serde_json::to_value(value)?);
    }
    if let Some(value) = update.status {
        put("status", serde_json::to_value(value)?);
    }
    if let Some(value) = update.fee {
        put("fee", serde_json::to_value(value)?);
    }
    if let Some(value) = update.paid {
        put("paid", serde_json::to_value(value)?);
    }
    if let Some(value) = &update.image_in {
        put("image_in", Value::from(value.as_str()));
    }
    if let Some(value) = &update.image_out {
        put("image_out", Value::from(value.as_str()));
    }
    if let Some(value) = update.is_cancel {
        put("is_cancel", Value::from(value));
    }
    if let Some(value) = update.is_edit {
        put("is_edit", Value::from(value));
    }
    Ok(fields)
}

/// 事务内的判定结果
enum Decision<T> {
    /// 提交这些写入，成功后返回结果
    Write(Vec<Value>, T),
    /// 无需写入，直接返回
    Done(T),
}

#[derive(Deserialize)]
struct ListPage {
    #[serde(default)]
    documents: Vec<Value>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct QueryRow {
    #[serde(default)]
    document: Option<Value>,
}

#[derive(Deserialize)]
struct BeginResponse {
    transaction: String,
}

/// Firestore 文档存储，实现全部文档存储接口
pub struct FirestoreDocuments {
    client: reqwest::Client,
    auth: Option<String>,
    codec: DocumentCodec,
    root_url: String,
}

impl FirestoreDocuments {
    pub fn connect(config: FirestoreConfig) -> Result<Self, StorageError> {
        ensure_id("project", &config.project)?;
        let client = reqwest::Client::builder()
            .user_agent("park-api/0.1.0")
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let codec = DocumentCodec::new(config.project.trim());
        let base = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        let root_url = format!("{base}/v1/{}", codec.documents_root());
        Ok(Self {
            client,
            auth: config.auth,
            codec,
            root_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.root_url, path.trim_matches('/'))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_document(&self, path: &str, transaction: Option<&str>) -> Result<Option<Document>, StorageError> {
        let mut builder = self.client.get(self.url(path));
        if let Some(transaction) = transaction {
            builder = builder.query(&[("transaction", transaction)]);
        }
        let response = self.request(builder).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: Value = response.error_for_status()?.json().await?;
        Ok(Some(self.codec.decode_document(&raw)?))
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, StorageError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut builder = self
                .client
                .get(self.url(collection))
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = page_token.as_deref() {
                builder = builder.query(&[("pageToken", token)]);
            }
            let page: ListPage = self
                .request(builder)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            for raw in &page.documents {
                documents.push(self.codec.decode_document(raw)?);
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(documents)
    }

    async fn run_query(&self, query: Value, transaction: Option<&str>) -> Result<Vec<Document>, StorageError> {
        let mut body = json!({ "structuredQuery": query });
        if let Some(transaction) = transaction {
            body["transaction"] = Value::from(transaction);
        }
        let rows: Vec<QueryRow> = self
            .request(self.client.post(format!("{}:runQuery", self.root_url)).json(&body))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        rows.iter()
            .filter_map(|row| row.document.as_ref())
            .map(|raw| self.codec.decode_document(raw))
            .collect()
    }

    /// `id` 为空时由 Firestore 分配
    async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: &Map<String, Value>,
    ) -> Result<Document, StorageError> {
        let mut builder = self
            .client
            .post(self.url(collection))
            .json(&json!({ "fields": self.codec.encode_map(fields) }));
        if let Some(id) = id {
            builder = builder.query(&[("documentId", id)]);
        }
        let response = self.request(builder).send().await?;
        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(StorageError::new(format!("document exists: {collection}/{}", id.unwrap_or_default())));
        }
        let raw: Value = response.error_for_status()?.json().await?;
        self.codec.decode_document(&raw)
    }

    /// `must_exist` 时只更新已有文档，不存在返回 `None`；否则整篇写入（不存在则创建）
    async fn patch_document(
        &self,
        path: &str,
        fields: &Map<String, Value>,
        must_exist: bool,
    ) -> Result<Option<Document>, StorageError> {
        let mut builder = self
            .client
            .patch(self.url(path))
            .json(&json!({ "fields": self.codec.encode_map(fields) }));
        if must_exist {
            let mask: Vec<(&str, &str)> = fields
                .keys()
                .map(|key| ("updateMask.fieldPaths", key.as_str()))
                .collect();
            builder = builder
                .query(&mask)
                .query(&[("currentDocument.exists", "true")]);
        }
        let response = self.request(builder).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: Value = response.error_for_status()?.json().await?;
        Ok(Some(self.codec.decode_document(&raw)?))
    }

    async fn begin(&self) -> Result<String, StorageError> {
        let response: BeginResponse = self
            .request(
                self.client
                    .post(format!("{}:beginTransaction", self.root_url))
                    .json(&json!({})),
            )
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.transaction)
    }

    /// 按判定结果提交或回滚；提交冲突返回 `None`，由调用方重试
    async fn finish<T>(&self, transaction: &str, decision: Decision<T>) -> Result<Option<T>, StorageError> {
        match decision {
            Decision::Done(value) => {
                let rollback = self
                    .request(
                        self.client
                            .post(format!("{}:rollback", self.root_url))
                            .json(&json!({ "transaction": transaction })),
                    )
                    .send()
                    .await;
                if let Err(err) = rollback {
                    debug!(target: "park.storage", error = %err, "firestore_rollback_failed");
                }
                Ok(Some(value))
            }
            Decision::Write(writes, value) => {
                let response = self
                    .request(
                        self.client
                            .post(format!("{}:commit", self.root_url))
                            .json(&json!({ "writes": writes, "transaction": transaction })),
                    )
                    .send()
                    .await?;
                if response.status() == reqwest::StatusCode::CONFLICT {
                    warn!(target: "park.storage", "firestore_commit_aborted");
                    return Ok(None);
                }
                response.error_for_status()?;
                Ok(Some(value))
            }
        }
    }

    async fn open_reports(&self, customer: &str, transaction: Option<&str>) -> Result<Vec<ReportRecord>, StorageError> {
        self.run_query(self.codec.open_reports_query(customer), transaction)
            .await?
            .into_iter()
            .map(report_from)
            .collect()
    }
}

fn contention() -> StorageError {
    StorageError::new("transaction contention")
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
}

#[async_trait::async_trait]
impl TransactionStore for FirestoreDocuments {
    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, StorageError> {
        let mut items = self
            .list_documents("transactions")
            .await?
            .into_iter()
            .map(transaction_from)
            .collect::<Result<Vec<_>, _>>()?;
        newest_first(&mut items, |record| record.timestamp_in);
        Ok(items)
    }

    async fn find_transaction(&self, tid: &str) -> Result<Option<TransactionRecord>, StorageError> {
        ensure_id("tid", tid)?;
        self.get_document(&format!("transactions/{tid}"), None)
            .await?
            .map(transaction_from)
            .transpose()
    }

    async fn find_active_by_license(
        &self,
        license_number: &str,
    ) -> Result<Option<TransactionRecord>, StorageError> {
        let documents = self
            .run_query(self.codec.license_query(license_number), None)
            .await?;
        for doc in documents {
            let record = transaction_from(doc)?;
            if record.is_active() {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    async fn create_transaction(&self, input: TransactionCreate) -> Result<TransactionRecord, StorageError> {
        ensure_id("license_number", &input.license_number)?;
        let record = TransactionRecord {
            tid: uuid::Uuid::new_v4().simple().to_string(),
            license_number: input.license_number,
            timestamp_in: input.timestamp_in,
            timestamp_out: None,
            status: TransactionStatus::Unpaid,
            fee: 0.0,
            paid: 0.0,
            image_in: input.image_in,
            image_out: None,
            is_cancel: false,
            is_edit: false,
            add_by: Some(input.add_by),
        };
        let mut fields = record_fields(&record)?;
        fields.remove("tid");
        self.create_document("transactions", Some(&record.tid), &fields)
            .await?;
        debug!(target: "park.storage", tid = %record.tid, "firestore_transaction_created");
        Ok(record)
    }

    async fn update_transaction(
        &self,
        tid: &str,
        update: TransactionUpdate,
    ) -> Result<Option<TransactionRecord>, StorageError> {
        ensure_id("tid", tid)?;
        let fields = transaction_update_fields(&update)?;
        if fields.is_empty() {
            return self.find_transaction(tid).await;
        }
        self.patch_document(&format!("transactions/{tid}"), &fields, true)
            .await?
            .map(transaction_from)
            .transpose()
    }
}

#[async_trait::async_trait]
impl PaymentStore for FirestoreDocuments {
    async fn list_payments(&self, tid: &str) -> Result<Vec<PaymentRecord>, StorageError> {
        ensure_id("tid", tid)?;
        let mut items = self
            .list_documents(&format!("transactions/{tid}/payments"))
            .await?
            .into_iter()
            .map(payment_from)
            .collect::<Result<Vec<_>, _>>()?;
        newest_first(&mut items, |record| record.timestamp);
        Ok(items)
    }

    async fn list_pending_payments(&self) -> Result<Vec<PaymentRecord>, StorageError> {
        let mut items = self
            .run_query(self.codec.pending_payments_query(), None)
            .await?
            .into_iter()
            .map(payment_from)
            .collect::<Result<Vec<_>, _>>()?;
        newest_first(&mut items, |record| record.timestamp);
        Ok(items)
    }

    async fn create_payment(&self, record: PaymentRecord) -> Result<PaymentRecord, StorageError> {
        ensure_id("tid", &record.tid)?;
        ensure_id("pid", &record.pid)?;
        let mut fields = record_fields(&record)?;
        fields.remove("tid");
        self.create_document(&format!("transactions/{}/payments", record.tid), Some(&record.pid), &fields)
            .await?;
        Ok(record)
    }

    async fn transition_payment(
        &self,
        tid: &str,
        pid: &str,
        allowed_from: &[PaymentStatus],
        to: PaymentStatus,
    ) -> Result<ConditionalWrite<PaymentRecord>, StorageError> {
        ensure_id("tid", tid)?;
        ensure_id("pid", pid)?;
        let path = format!("transactions/{tid}/payments/{pid}");
        for _ in 0..COMMIT_ATTEMPTS {
            let transaction = self.begin().await?;
            let decision = match self.get_document(&path, Some(&transaction)).await? {
                None => Decision::Done(ConditionalWrite::NotFound),
                Some(doc) => {
                    let mut record = payment_from(doc)?;
                    if allowed_from.contains(&record.status) {
                        record.status = to;
                        record.is_edit = true;
                        let fields = object(json!({
                            "status": serde_json::to_value(to)?,
                            "is_edit": true,
                        }));
                        Decision::Write(
                            vec![self.codec.update_write(&path, &fields)],
                            ConditionalWrite::Applied(record),
                        )
                    } else {
                        Decision::Done(ConditionalWrite::Rejected(record))
                    }
                }
            };
            if let Some(outcome) = self.finish(&transaction, decision).await? {
                return Ok(outcome);
            }
        }
        Err(contention())
    }
}

#[async_trait::async_trait]
impl ReportStore for FirestoreDocuments {
    async fn list_reports(&self) -> Result<Vec<ReportRecord>, StorageError> {
        let mut items = self
            .list_documents("reports")
            .await?
            .into_iter()
            .map(report_from)
            .collect::<Result<Vec<_>, _>>()?;
        newest_first(&mut items, |record| record.created_timestamp);
        Ok(items)
    }

    async fn find_report(&self, rid: &str) -> Result<Option<ReportRecord>, StorageError> {
        ensure_id("rid", rid)?;
        self.get_document(&format!("reports/{rid}"), None)
            .await?
            .map(report_from)
            .transpose()
    }

    async fn create_report(&self, record: ReportRecord) -> Result<ReportRecord, StorageError> {
        ensure_id("rid", &record.rid)?;
        let mut fields = record_fields(&record)?;
        fields.remove("rid");
        self.create_document("reports", Some(&record.rid), &fields)
            .await?;
        Ok(record)
    }

    async fn claim_report(&self, rid: &str, staff: &str) -> Result<ClaimOutcome, StorageError> {
        ensure_id("rid", rid)?;
        ensure_id("staff", staff)?;
        let path = format!("reports/{rid}");
        for _ in 0..COMMIT_ATTEMPTS {
            let transaction = self.begin().await?;
            let decision = match self.get_document(&path, Some(&transaction)).await? {
                None => Decision::Done(ClaimOutcome::NotFound),
                Some(doc) => {
                    let mut record = report_from(doc)?;
                    let conflict = if record.status == ReportStatus::Closed {
                        Some(ClaimOutcome::Unavailable(record.clone()))
                    } else if record.staff.is_none() {
                        self.open_reports(&record.customer, Some(&transaction))
                            .await?
                            .into_iter()
                            .find(|open| open.rid != rid)
                            .map(|open| ClaimOutcome::CustomerHasOpenReport { rid: open.rid })
                    } else {
                        None
                    };
                    match conflict {
                        Some(outcome) => Decision::Done(outcome),
                        None => {
                            record.staff = Some(staff.to_string());
                            record.status = ReportStatus::Open;
                            record.is_edit = true;
                            let fields = object(json!({
                                "staff": staff,
                                "status": serde_json::to_value(ReportStatus::Open)?,
                                "is_edit": true,
                            }));
                            Decision::Write(
                                vec![self.codec.update_write(&path, &fields)],
                                ClaimOutcome::Claimed(record),
                            )
                        }
                    }
                }
            };
            if let Some(outcome) = self.finish(&transaction, decision).await? {
                return Ok(outcome);
            }
        }
        Err(contention())
    }

    async fn unclaim_report(&self, rid: &str, staff: &str) -> Result<ConditionalWrite<ReportRecord>, StorageError> {
        ensure_id("rid", rid)?;
        ensure_id("staff", staff)?;
        let path = format!("reports/{rid}");
        for _ in 0..COMMIT_ATTEMPTS {
            let transaction = self.begin().await?;
            let decision = match self.get_document(&path, Some(&transaction)).await? {
                None => Decision::Done(ConditionalWrite::NotFound),
                Some(doc) => {
                    let mut record = report_from(doc)?;
                    if record.status == ReportStatus::Closed || record.staff.as_deref() != Some(staff) {
                        Decision::Done(ConditionalWrite::Rejected(record))
                    } else {
                        record.staff = None;
                        record.status = ReportStatus::Pending;
                        record.is_edit = true;
                        let fields = object(json!({
                            "staff": null,
                            "status": serde_json::to_value(ReportStatus::Pending)?,
                            "is_edit": true,
                        }));
                        Decision::Write(
                            vec![self.codec.update_write(&path, &fields)],
                            ConditionalWrite::Applied(record),
                        )
                    }
                }
            };
            if let Some(outcome) = self.finish(&transaction, decision).await? {
                return Ok(outcome);
            }
        }
        Err(contention())
    }

    async fn close_report(
        &self,
        rid: &str,
        response: &str,
        closed_at: DateTime<Utc>,
    ) -> Result<ConditionalWrite<ReportRecord>, StorageError> {
        ensure_id("rid", rid)?;
        let path = format!("reports/{rid}");
        for _ in 0..COMMIT_ATTEMPTS {
            let transaction = self.begin().await?;
            let decision = match self.get_document(&path, Some(&transaction)).await? {
                None => Decision::Done(ConditionalWrite::NotFound),
                Some(doc) => {
                    let mut record = report_from(doc)?;
                    if record.status != ReportStatus::Open {
                        Decision::Done(ConditionalWrite::Rejected(record))
                    } else {
                        record.status = ReportStatus::Closed;
                        record.response = Some(response.to_string());
                        record.closed_timestamp = Some(closed_at);
                        record.is_edit = true;
                        let fields = object(json!({
                            "status": serde_json::to_value(ReportStatus::Closed)?,
                            "response": response,
                            "closed_timestamp": serde_json::to_value(closed_at)?,
                            "is_edit": true,
                        }));
                        Decision::Write(
                            vec![self.codec.update_write(&path, &fields)],
                            ConditionalWrite::Applied(record),
                        )
                    }
                }
            };
            if let Some(outcome) = self.finish(&transaction, decision).await? {
                return Ok(outcome);
            }
        }
        Err(contention())
    }

    async fn list_chats(&self, rid: &str) -> Result<Vec<ChatRecord>, StorageError> {
        ensure_id("rid", rid)?;
        let mut items = self
            .list_documents(&format!("reports/{rid}/chats"))
            .await?
            .into_iter()
            .map(|doc| {
                serde_json::from_value::<ChatRecord>(Value::Object(chat_from_fields(doc.fields)))
                    .map_err(StorageError::from)
            })
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by_key(ChatRecord::timestamp);
        Ok(items)
    }

    async fn add_chat(&self, rid: &str, chat: ChatRecord) -> Result<(), StorageError> {
        ensure_id("rid", rid)?;
        let fields = chat_to_fields(record_fields(&chat)?);
        self.create_document(&format!("reports/{rid}/chats"), None, &fields)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl StaffStore for FirestoreDocuments {
    async fn list_staffs(&self) -> Result<Vec<StaffRecord>, StorageError> {
        let mut items = self
            .list_documents("staffs")
            .await?
            .into_iter()
            .map(staff_from)
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(items)
    }

    async fn find_staff(&self, email: &str) -> Result<Option<StaffRecord>, StorageError> {
        ensure_id("email", email)?;
        self.get_document(&format!("staffs/{email}"), None)
            .await?
            .map(staff_from)
            .transpose()
    }

    async fn upsert_staff(&self, record: StaffRecord) -> Result<StaffRecord, StorageError> {
        ensure_id("email", &record.email)?;
        let fields = staff_fields(&record)?;
        self.patch_document(&format!("staffs/{}", record.email), &fields, false)
            .await?;
        Ok(record)
    }
}

#[async_trait::async_trait]
impl CustomerStore for FirestoreDocuments {
    async fn list_customers(&self) -> Result<Vec<CustomerRecord>, StorageError> {
        let mut items = self
            .list_documents("customers")
            .await?
            .into_iter()
            .map(|doc| {
                let id = doc.id().to_string();
                into_record::<CustomerRecord>(doc.fields, "uid", &id)
            })
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by(|a, b| a.display_name.cmp(&b.display_name).then_with(|| a.uid.cmp(&b.uid)));
        Ok(items)
    }

    async fn find_customer(&self, uid: &str) -> Result<Option<CustomerRecord>, StorageError> {
        ensure_id("uid", uid)?;
        self.get_document(&format!("customers/{uid}"), None)
            .await?
            .map(|doc| {
                let id = doc.id().to_string();
                into_record(doc.fields, "uid", &id)
            })
            .transpose()
    }

    async fn list_cars(&self, uid: &str) -> Result<Vec<CarRecord>, StorageError> {
        ensure_id("uid", uid)?;
        let mut items = self
            .list_documents(&format!("customers/{uid}/cars"))
            .await?
            .into_iter()
            .map(|doc| {
                let id = doc.id().to_string();
                into_record::<CarRecord>(doc.fields, "license_number", &id)
            })
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by(|a, b| a.license_number.cmp(&b.license_number));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatMessage, ChatSender, ReportTopic};

    fn codec() -> DocumentCodec {
        DocumentCodec::new("park-test")
    }

    fn document(codec: &DocumentCodec, path: &str, fields: &Map<String, Value>) -> Value {
        json!({ "name": codec.document_name(path), "fields": codec.encode_map(fields) })
    }

    #[test]
    fn builds_document_urls() {
        let store = FirestoreDocuments::connect(FirestoreConfig {
            project: "park-test".to_string(),
            auth: None,
            base_url: Some("http://127.0.0.1:8088/".to_string()),
        })
        .unwrap();
        assert_eq!(
            store.url("/transactions/T1/payments"),
            "http://127.0.0.1:8088/v1/projects/park-test/databases/(default)/documents/transactions/T1/payments"
        );
        assert!(
            FirestoreDocuments::connect(FirestoreConfig {
                project: " ".to_string(),
                auth: None,
                base_url: None,
            })
            .is_err()
        );
    }

    #[test]
    fn report_fields_use_references_and_timestamps() {
        let codec = codec();
        let record = ReportRecord {
            rid: "R1".to_string(),
            topic: ReportTopic::SystemFault,
            description: "gate stuck".to_string(),
            customer: "U1".to_string(),
            created_timestamp: "2024-03-01T08:00:00Z".parse().unwrap(),
            status: ReportStatus::Open,
            t_ref: Some("T1".to_string()),
            staff: Some("a@park.test".to_string()),
            closed_timestamp: None,
            response: None,
            is_edit: false,
        };
        let fields = record_fields(&record).unwrap();
        let encoded = codec.encode_map(&fields);
        assert_eq!(
            encoded["customer"]["referenceValue"],
            "projects/park-test/databases/(default)/documents/customers/U1"
        );
        assert_eq!(
            encoded["staff"]["referenceValue"],
            "projects/park-test/databases/(default)/documents/staffs/a@park.test"
        );
        assert_eq!(
            encoded["t_ref"]["referenceValue"],
            "projects/park-test/databases/(default)/documents/transactions/T1"
        );
        assert!(encoded["created_timestamp"]["timestampValue"].is_string());
        assert_eq!(encoded["closed_timestamp"], json!({ "nullValue": null }));
        assert_eq!(encoded["topic"], json!({ "stringValue": "System Fault" }));

        let raw = document(&codec, "reports/R1", &fields);
        let decoded = report_from(codec.decode_document(&raw).unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn numbers_keep_integer_and_double_kinds() {
        let codec = codec();
        assert_eq!(
            codec.encode_value(Some("fee"), &json!(30)),
            json!({ "integerValue": "30" })
        );
        assert_eq!(
            codec.encode_value(Some("fee"), &json!(12.5)),
            json!({ "doubleValue": 12.5 })
        );
        assert_eq!(decode_value(&json!({ "integerValue": "30" })), json!(30));
    }

    #[test]
    fn payment_takes_tid_from_parent_document() {
        let codec = codec();
        let raw = json!({
            "name": codec.document_name("transactions/T1/payments/P1"),
            "fields": {
                "pid": { "stringValue": "P1" },
                "amount": { "integerValue": "40" },
                "timestamp": { "timestampValue": "2024-03-01T08:05:00.123456Z" },
                "status": { "stringValue": "Approve" },
                "paid_by": { "referenceValue": codec.document_name("customers/U1") },
                "client_secret": { "stringValue": "pi_secret" }
            }
        });
        let payment = payment_from(codec.decode_document(&raw).unwrap()).unwrap();
        assert_eq!(payment.tid, "T1");
        assert_eq!(payment.pid, "P1");
        assert_eq!(payment.amount, 40.0);
        assert_eq!(payment.status, PaymentStatus::Success);
        assert_eq!(payment.paid_by.as_deref(), Some("U1"));
        assert!(!payment.is_edit);
    }

    #[test]
    fn rejects_documents_from_other_projects() {
        let raw = json!({ "name": "projects/other/databases/(default)/documents/reports/R1" });
        assert!(codec().decode_document(&raw).is_err());
    }

    #[test]
    fn chats_map_sender_and_media_fields() {
        let codec = codec();
        let raw = json!({
            "name": codec.document_name("reports/R1/chats/C1"),
            "fields": {
                "source": { "stringValue": "received" },
                "messageId": { "stringValue": "m-1" },
                "timestamp": { "timestampValue": "2024-03-01T08:01:00Z" },
                "message": { "mapValue": { "fields": {
                    "type": { "stringValue": "location" },
                    "title": { "stringValue": "Gate" },
                    "address": { "stringValue": "Exit lane" },
                    "location": { "geoPointValue": { "latitude": 13.7, "longitude": 100.5 } }
                } } }
            }
        });
        let doc = codec.decode_document(&raw).unwrap();
        let chat: ChatRecord = serde_json::from_value(Value::Object(chat_from_fields(doc.fields))).unwrap();
        match chat {
            ChatRecord::Received {
                message_id,
                message: ChatMessage::Location { latitude, longitude, .. },
                ..
            } => {
                assert_eq!(message_id, "m-1");
                assert_eq!(latitude, 13.7);
                assert_eq!(longitude, 100.5);
            }
            other => panic!("unexpected chat: {other:?}"),
        }

        let reply = ChatRecord::Response {
            message_id: None,
            timestamp: "2024-03-01T08:02:00Z".parse().unwrap(),
            is_send: false,
            sender: Some(ChatSender {
                name: "Alice".to_string(),
                icon_url: Some("https://park.test/a.png".to_string()),
            }),
            message: ChatMessage::Text {
                text: "on my way".to_string(),
            },
        };
        let fields = chat_to_fields(record_fields(&reply).unwrap());
        assert!(fields.get("sender").is_none());
        assert_eq!(fields["message"]["sender"]["iconUrl"], "https://park.test/a.png");
        let encoded = codec.encode_map(&fields);
        assert!(encoded["timestamp"]["timestampValue"].is_string());

        let back: ChatRecord = serde_json::from_value(Value::Object(chat_from_fields(fields))).unwrap();
        assert_eq!(back, reply);
    }

    #[test]
    fn staff_display_name_maps_to_name() {
        let codec = codec();
        let raw = json!({
            "name": codec.document_name("staffs/a@park.test"),
            "fields": {
                "displayName": { "stringValue": "Alice" },
                "role": { "stringValue": "Administrator" }
            }
        });
        let staff = staff_from(codec.decode_document(&raw).unwrap()).unwrap();
        assert_eq!(staff.email, "a@park.test");
        assert_eq!(staff.name, "Alice");
        assert!(!staff.disabled);
        assert_eq!(staff_fields(&staff).unwrap()["displayName"], "Alice");
    }

    #[test]
    fn queries_target_expected_fields() {
        let codec = codec();
        let pending = codec.pending_payments_query();
        assert_eq!(pending["from"][0]["allDescendants"], true);
        assert_eq!(pending["where"]["fieldFilter"]["value"]["stringValue"], "Pending");

        let open = codec.open_reports_query("U1");
        let filters = &open["where"]["compositeFilter"]["filters"];
        assert_eq!(
            filters[0]["fieldFilter"]["value"]["referenceValue"],
            "projects/park-test/databases/(default)/documents/customers/U1"
        );
        assert_eq!(filters[1]["fieldFilter"]["value"]["stringValue"], "Open");

        let write = codec.update_write("reports/R1", &object(json!({ "staff": null, "is_edit": true })));
        assert_eq!(write["currentDocument"]["exists"], true);
        assert_eq!(write["update"]["fields"]["staff"], json!({ "nullValue": null }));
    }

    #[test]
    fn transaction_updates_only_carry_changed_fields() {
        let update = TransactionUpdate {
            is_cancel: Some(true),
            status: Some(TransactionStatus::Cancel),
            ..TransactionUpdate::default()
        };
        let fields = transaction_update_fields(&update).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["status"], "Cancel");
        assert!(transaction_update_fields(&TransactionUpdate::default()).unwrap().is_empty());
    }
}
