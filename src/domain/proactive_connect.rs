use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::validation::ValidationError;
use crate::domain::value::{ListId, ListItemId, check_length, check_range};
use crate::transport::MergeResponse;

pub const LIST_NAME_MAX_LEN: usize = 255;
pub const LIST_DESCRIPTION_MAX_LEN: usize = 1024;
pub const LIST_MAX_TAGS: usize = 10;
pub const LIST_TAG_MAX_LEN: usize = 15;
pub const LIST_MAX_ATTRIBUTES: usize = 50;
pub const PAGE_SIZE_MAX: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAttribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Whether this attribute identifies an item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<bool>,
}

impl ListAttribute {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "attributes.name",
            });
        }
        Ok(Self {
            name,
            alias: None,
            key: None,
        })
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn key(mut self, key: bool) -> Self {
        self.key = Some(key);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ListDatasource {
    Manual,
    Salesforce {
        integration_id: String,
        soql: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListSyncStatus {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub metadata_modified: Option<bool>,
    #[serde(default)]
    pub data_modified: Option<bool>,
    #[serde(default)]
    pub dirty: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A Proactive Connect contact list.
///
/// Server-assigned fields (`id`, counts, sync status, timestamps) are read-only and
/// never sent. Create and update echo the list back; the client merges the echo
/// into a copy of what was sent.
pub struct ContactsList {
    #[serde(default, skip_serializing)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    attributes: Vec<ListAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    datasource: Option<ListDatasource>,
    #[serde(default, skip_serializing)]
    items_count: Option<u64>,
    #[serde(default, skip_serializing)]
    sync_status: Option<ListSyncStatus>,
    #[serde(default, skip_serializing)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    updated_at: Option<DateTime<Utc>>,
}

impl ContactsList {
    pub fn builder(name: impl Into<String>) -> ContactsListBuilder {
        ContactsListBuilder {
            name: name.into(),
            description: None,
            tags: Vec::new(),
            attributes: Vec::new(),
            datasource: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn attributes(&self) -> &[ListAttribute] {
        &self.attributes
    }

    pub fn datasource(&self) -> Option<&ListDatasource> {
        self.datasource.as_ref()
    }

    pub fn items_count(&self) -> Option<u64> {
        self.items_count
    }

    pub fn sync_status(&self) -> Option<&ListSyncStatus> {
        self.sync_status.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
    }

    pub fn set_attributes(&mut self, attributes: Vec<ListAttribute>) {
        self.attributes = attributes;
    }

    pub fn set_datasource(&mut self, datasource: Option<ListDatasource>) {
        self.datasource = datasource;
    }

    /// Copy without server-assigned fields, for creating a new list from this one.
    pub fn without_server_fields(&self) -> Self {
        Self {
            id: None,
            items_count: None,
            sync_status: None,
            created_at: None,
            updated_at: None,
            ..self.clone()
        }
    }

    /// Re-run every field check; lists deserialized from the server skip them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.name.as_deref().unwrap_or_default();
        check_length("name", name, 1, LIST_NAME_MAX_LEN)?;
        if name.trim().is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }
        if let Some(description) = &self.description {
            check_length("description", description, 0, LIST_DESCRIPTION_MAX_LEN)?;
        }
        if self.tags.len() > LIST_MAX_TAGS {
            return Err(ValidationError::TooMany {
                field: "tags",
                max: LIST_MAX_TAGS,
                actual: self.tags.len(),
            });
        }
        for tag in &self.tags {
            check_length("tags", tag, 1, LIST_TAG_MAX_LEN)?;
        }
        if self.attributes.len() > LIST_MAX_ATTRIBUTES {
            return Err(ValidationError::TooMany {
                field: "attributes",
                max: LIST_MAX_ATTRIBUTES,
                actual: self.attributes.len(),
            });
        }
        if self.attributes.iter().any(|a| a.name.trim().is_empty()) {
            return Err(ValidationError::Empty {
                field: "attributes.name",
            });
        }
        if let Some(ListDatasource::Salesforce {
            integration_id,
            soql,
        }) = &self.datasource
        {
            if integration_id.trim().is_empty() {
                return Err(ValidationError::Empty {
                    field: "datasource.integration_id",
                });
            }
            if soql.trim().is_empty() {
                return Err(ValidationError::Empty {
                    field: "datasource.soql",
                });
            }
        }
        Ok(())
    }
}

impl MergeResponse for ContactsList {
    const IDENTITY_FIELD: &'static str = "id";

    fn identity(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn merged_with(&self, server: Self) -> Self {
        Self {
            id: server.id.or_else(|| self.id.clone()),
            name: server.name.or_else(|| self.name.clone()),
            description: server.description.or_else(|| self.description.clone()),
            tags: if server.tags.is_empty() {
                self.tags.clone()
            } else {
                server.tags
            },
            attributes: if server.attributes.is_empty() {
                self.attributes.clone()
            } else {
                server.attributes
            },
            datasource: server.datasource.or_else(|| self.datasource.clone()),
            items_count: server.items_count.or(self.items_count),
            sync_status: server.sync_status.or_else(|| self.sync_status.clone()),
            created_at: server.created_at.or(self.created_at),
            updated_at: server.updated_at.or(self.updated_at),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContactsListBuilder {
    name: String,
    description: Option<String>,
    tags: Vec<String>,
    attributes: Vec<ListAttribute>,
    datasource: Option<ListDatasource>,
}

impl ContactsListBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn attribute(mut self, attribute: ListAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn datasource(mut self, datasource: ListDatasource) -> Self {
        self.datasource = Some(datasource);
        self
    }

    pub fn build(self) -> Result<ContactsList, ValidationError> {
        let list = ContactsList {
            id: None,
            name: Some(self.name),
            description: self.description,
            tags: self.tags,
            attributes: self.attributes,
            datasource: self.datasource,
            items_count: None,
            sync_status: None,
            created_at: None,
            updated_at: None,
        };
        list.validate()?;
        Ok(list)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
/// Page selection shared by every paged listing.
pub struct PageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<SortOrder>,
}

impl PageRequest {
    /// `page` starts at 1; `page_size` is `1..=1000`.
    pub fn new(
        page: Option<u32>,
        page_size: Option<u32>,
        order: Option<SortOrder>,
    ) -> Result<Self, ValidationError> {
        if let Some(page) = page {
            check_range("page", i64::from(page), 1, i64::from(u32::MAX))?;
        }
        if let Some(page_size) = page_size {
            check_range("page_size", i64::from(page_size), 1, i64::from(PAGE_SIZE_MAX))?;
        }
        Ok(Self {
            page,
            page_size,
            order,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Path-only request naming one list.
pub struct ListPath {
    #[serde(skip)]
    pub list_id: ListId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Path-only request naming one list item.
pub struct ListItemPath {
    #[serde(skip)]
    pub list_id: ListId,
    #[serde(skip)]
    pub item_id: ListItemId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItemsQuery {
    #[serde(skip)]
    pub list_id: ListId,
    #[serde(flatten)]
    pub page: PageRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Item payload for create and update.
pub struct ListItemRequest {
    #[serde(skip)]
    list_id: ListId,
    #[serde(skip)]
    item_id: Option<ListItemId>,
    data: serde_json::Map<String, serde_json::Value>,
}

impl ListItemRequest {
    pub fn new(
        list_id: ListId,
        data: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, ValidationError> {
        if data.is_empty() {
            return Err(ValidationError::Empty { field: "data" });
        }
        Ok(Self {
            list_id,
            item_id: None,
            data,
        })
    }

    pub fn for_item(mut self, item_id: ListItemId) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn list_id(&self) -> &ListId {
        &self.list_id
    }

    /// Item id segment; empty for creation.
    pub fn item_segment(&self) -> &str {
        self.item_id.as_ref().map(ListItemId::as_str).unwrap_or_default()
    }

    pub fn item_id(&self) -> Option<&ListItemId> {
        self.item_id.as_ref()
    }

    pub fn data(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.data
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListItem {
    pub id: String,
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// HAL page envelope shared by the list, item and event listings.
pub struct Page<T> {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub total_items: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(rename = "_embedded", default = "Embedded::empty")]
    embedded: Embedded<T>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Embedded<T> {
    #[serde(alias = "lists", alias = "items", alias = "events")]
    entries: Vec<T>,
}

impl<T> Embedded<T> {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Page<T> {
    pub fn entries(&self) -> &[T] {
        &self.embedded.entries
    }

    pub fn into_entries(self) -> Vec<T> {
        self.embedded.entries
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub run_item_id: Option<String>,
    #[serde(default)]
    pub action_id: Option<String>,
    #[serde(default)]
    pub invocation_id: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub src_ctx: Option<String>,
    #[serde(default)]
    pub src_type: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
/// Event listing filters.
pub struct ListEventsQuery {
    #[serde(flatten)]
    page: PageRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    invocation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recipient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    src_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    src_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_end: Option<DateTime<Utc>>,
}

impl ListEventsQuery {
    pub fn builder() -> ListEventsQueryBuilder {
        ListEventsQueryBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListEventsQueryBuilder {
    query: ListEventsQuery,
}

macro_rules! filter_setters {
    ($($field:ident),* $(,)?) => {
        $(
            pub fn $field(mut self, value: impl Into<String>) -> Self {
                self.query.$field = Some(value.into());
                self
            }
        )*
    };
}

impl ListEventsQueryBuilder {
    filter_setters!(
        run_id,
        run_item_id,
        invocation_id,
        action_id,
        trace_id,
        recipient_id,
        src_context,
        src_type,
    );

    pub fn page(mut self, page: PageRequest) -> Self {
        self.query.page = page;
        self
    }

    pub fn date_start(mut self, start: DateTime<Utc>) -> Self {
        self.query.date_start = Some(start);
        self
    }

    pub fn date_end(mut self, end: DateTime<Utc>) -> Self {
        self.query.date_end = Some(end);
        self
    }

    pub fn build(self) -> Result<ListEventsQuery, ValidationError> {
        if let (Some(start), Some(end)) = (self.query.date_start, self.query.date_end) {
            if start > end {
                return Err(ValidationError::InvertedRange {
                    start: "date_start",
                    end: "date_end",
                });
            }
        }
        Ok(self.query)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn list_builder_enforces_limits() {
        assert!(ContactsList::builder("").build().is_err());
        assert!(ContactsList::builder("   ").build().is_err());
        assert!(
            ContactsList::builder("x".repeat(LIST_NAME_MAX_LEN + 1))
                .build()
                .is_err()
        );

        let err = ContactsList::builder("ok")
            .tags((0..11).map(|i| format!("t{i}")))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooMany { field: "tags", .. }));

        let err = ContactsList::builder("ok")
            .tags(["this-tag-is-too-long"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::Length { field: "tags", .. }));

        let err = ContactsList::builder("ok")
            .datasource(ListDatasource::Salesforce {
                integration_id: "sf".to_owned(),
                soql: " ".to_owned(),
            })
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Empty {
                field: "datasource.soql"
            }
        );
    }

    #[test]
    fn list_serializes_without_server_fields() {
        let list = ContactsList::builder("Customers")
            .description("all of them")
            .tags(["vip"])
            .attribute(ListAttribute::new("phone").unwrap().key(true))
            .datasource(ListDatasource::Manual)
            .build()
            .unwrap();
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Customers",
                "description": "all of them",
                "tags": ["vip"],
                "attributes": [{"name": "phone", "key": true}],
                "datasource": {"type": "manual"}
            })
        );
    }

    #[test]
    fn server_list_deserializes_read_only_fields() {
        let json = r#"{
            "id": "29192c4a-4058-49da-86c2-3e349d1065b7",
            "name": "Recipients",
            "items_count": 42,
            "sync_status": {"value": "configured", "dirty": false},
            "created_at": "2022-06-23T13:13:16.491Z",
            "datasource": {"type": "salesforce", "integration_id": "sf", "soql": "SELECT 1"}
        }"#;
        let list: ContactsList = serde_json::from_str(json).unwrap();
        assert_eq!(list.id(), Some("29192c4a-4058-49da-86c2-3e349d1065b7"));
        assert_eq!(list.items_count(), Some(42));
        assert_eq!(
            list.sync_status().and_then(|s| s.value.as_deref()),
            Some("configured")
        );
        assert!(list.created_at().is_some());
        assert!(matches!(
            list.datasource(),
            Some(ListDatasource::Salesforce { .. })
        ));

        let copy = list.without_server_fields();
        assert!(copy.id().is_none());
        assert!(copy.created_at().is_none());
        assert_eq!(copy.name(), Some("Recipients"));
    }

    #[test]
    fn merge_prefers_server_fields() {
        let sent = ContactsList::builder("Customers")
            .tags(["vip"])
            .build()
            .unwrap();
        let echoed: ContactsList =
            serde_json::from_str(r#"{"id": "l1", "name": "Customers", "items_count": 0}"#)
                .unwrap();
        let merged = sent.merged_with(echoed);
        assert_eq!(merged.id(), Some("l1"));
        assert_eq!(merged.tags(), ["vip".to_owned()]);
        assert_eq!(merged.items_count(), Some(0));
        assert!(sent.id().is_none());
    }

    #[test]
    fn page_request_ranges() {
        assert!(PageRequest::new(Some(0), None, None).is_err());
        assert!(PageRequest::new(None, Some(0), None).is_err());
        assert!(PageRequest::new(None, Some(PAGE_SIZE_MAX + 1), None).is_err());
        let page = PageRequest::new(Some(2), Some(100), Some(SortOrder::Desc)).unwrap();
        assert_eq!(
            serde_json::to_value(page).unwrap(),
            serde_json::json!({"page": 2, "page_size": 100, "order": "desc"})
        );
    }

    #[test]
    fn event_dates_must_be_ordered() {
        let start = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let err = ListEventsQuery::builder()
            .date_start(start)
            .date_end(end)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvertedRange {
                start: "date_start",
                end: "date_end"
            }
        );

        let query = ListEventsQuery::builder()
            .date_start(end)
            .date_end(start)
            .run_id("run-1")
            .build()
            .unwrap();
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["run_id"], "run-1");
        assert_eq!(json["date_start"], "2024-05-01T00:00:00Z");
    }

    #[test]
    fn page_envelope_reads_any_embedded_collection() {
        let json = r#"{
            "page": 1, "page_size": 10, "total_items": 1, "total_pages": 1,
            "_embedded": {"items": [{"id": "i1", "list_id": "l1", "data": {"phone": "447700900000"}}]}
        }"#;
        let page: Page<ListItem> = serde_json::from_str(json).unwrap();
        assert_eq!(page.entries().len(), 1);
        assert_eq!(page.entries()[0].data["phone"], "447700900000");

        let empty: Page<ListItem> = serde_json::from_str(r#"{"page": 1}"#).unwrap();
        assert!(empty.entries().is_empty());
    }

    #[test]
    fn list_item_requires_data() {
        let err = ListItemRequest::new(ListId::new("l1").unwrap(), serde_json::Map::new())
            .unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "data" });
    }
}
