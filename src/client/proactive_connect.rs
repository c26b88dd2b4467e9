use reqwest::Method;
use url::Url;

use crate::auth::AuthMethodType;
use crate::domain::proactive_connect::{
    Event, ListItemPath, ListItemRequest, ListItemsQuery, ListPath, Page,
};
use crate::domain::{
    ContactsList, ListEventsQuery, ListId, ListItem, ListItemId, PageRequest, ValidationError,
};
use crate::endpoint::{Dispatcher, Download, Endpoint, EndpointSpec};
use crate::error::{ApiDomain, VonageError};
use crate::transport::encode::JSON;
use crate::transport::path::join;
use crate::transport::{
    BodyFormat, DownloadTarget, Downloaded, HttpConfig, Json, Merge, NoContent,
};

const AUTH: &[AuthMethodType] = &[AuthMethodType::Jwt];
const CSV: &str = "text/csv";

fn bulk(config: &HttpConfig, segments: &[&str]) -> Url {
    let mut path = vec!["v0.1", "bulk"];
    path.extend_from_slice(segments);
    join(config.api_eu_base_uri(), &path)
}

fn lists<R>(config: &HttpConfig, _request: &R) -> Url {
    bulk(config, &["lists"])
}

fn list_by_id(config: &HttpConfig, request: &ListPath) -> Url {
    bulk(config, &["lists", request.list_id.as_str()])
}

fn list_by_body(config: &HttpConfig, request: &ContactsList) -> Url {
    bulk(config, &["lists", request.id().unwrap_or_default()])
}

fn list_clear(config: &HttpConfig, request: &ListPath) -> Url {
    bulk(config, &["lists", request.list_id.as_str(), "clear"])
}

fn list_fetch(config: &HttpConfig, request: &ListPath) -> Url {
    bulk(config, &["lists", request.list_id.as_str(), "fetch"])
}

fn items(config: &HttpConfig, request: &ListItemsQuery) -> Url {
    bulk(config, &["lists", request.list_id.as_str(), "items"])
}

fn items_download(config: &HttpConfig, request: &ListPath) -> Url {
    bulk(config, &["lists", request.list_id.as_str(), "items", "download"])
}

fn item_create(config: &HttpConfig, request: &ListItemRequest) -> Url {
    bulk(config, &["lists", request.list_id().as_str(), "items"])
}

fn item_update(config: &HttpConfig, request: &ListItemRequest) -> Url {
    bulk(
        config,
        &["lists", request.list_id().as_str(), "items", request.item_segment()],
    )
}

fn item_by_id(config: &HttpConfig, request: &ListItemPath) -> Url {
    bulk(
        config,
        &[
            "lists",
            request.list_id.as_str(),
            "items",
            request.item_id.as_str(),
        ],
    )
}

fn events(config: &HttpConfig, _request: &ListEventsQuery) -> Url {
    bulk(config, &["events"])
}

fn spec<Req, D>(
    name: &'static str,
    method: Method,
    path: fn(&HttpConfig, &Req) -> Url,
    format: BodyFormat,
    decoder: D,
) -> EndpointSpec<Req, D> {
    EndpointSpec {
        name,
        domain: ApiDomain::ProactiveConnect,
        method,
        auth: AUTH,
        path,
        format,
        accept: JSON,
        decoder,
    }
}

#[derive(Clone)]
/// Proactive Connect API: contact lists, their items and the event log.
pub struct ProactiveConnectClient {
    create_list: Endpoint<ContactsList, Merge>,
    get_list: Endpoint<ListPath, Json<ContactsList>>,
    update_list: Endpoint<ContactsList, Merge>,
    delete_list: Endpoint<ListPath, NoContent>,
    clear_list: Endpoint<ListPath, NoContent>,
    fetch_list: Endpoint<ListPath, NoContent>,
    list_lists: Endpoint<PageRequest, Json<Page<ContactsList>>>,
    create_item: Endpoint<ListItemRequest, Json<ListItem>>,
    get_item: Endpoint<ListItemPath, Json<ListItem>>,
    update_item: Endpoint<ListItemRequest, Json<ListItem>>,
    delete_item: Endpoint<ListItemPath, NoContent>,
    list_items: Endpoint<ListItemsQuery, Json<Page<ListItem>>>,
    download_items: Endpoint<ListPath, Download>,
    list_events: Endpoint<ListEventsQuery, Json<Page<Event>>>,
}

impl ProactiveConnectClient {
    pub(crate) fn new(dispatcher: &Dispatcher) -> Self {
        use BodyFormat::{Empty, Json as JsonBody, Query};

        Self {
            create_list: dispatcher.register(spec(
                "proactive_connect.create_list",
                Method::POST,
                lists,
                JsonBody,
                Merge,
            )),
            get_list: dispatcher.register(spec(
                "proactive_connect.get_list",
                Method::GET,
                list_by_id,
                Empty,
                Json::new(),
            )),
            update_list: dispatcher.register(spec(
                "proactive_connect.update_list",
                Method::PUT,
                list_by_body,
                JsonBody,
                Merge,
            )),
            delete_list: dispatcher.register(spec(
                "proactive_connect.delete_list",
                Method::DELETE,
                list_by_id,
                Empty,
                NoContent,
            )),
            clear_list: dispatcher.register(spec(
                "proactive_connect.clear_list",
                Method::POST,
                list_clear,
                Empty,
                NoContent,
            )),
            fetch_list: dispatcher.register(spec(
                "proactive_connect.fetch_list",
                Method::POST,
                list_fetch,
                Empty,
                NoContent,
            )),
            list_lists: dispatcher.register(spec(
                "proactive_connect.list_lists",
                Method::GET,
                lists,
                Query,
                Json::new(),
            )),
            create_item: dispatcher.register(spec(
                "proactive_connect.create_item",
                Method::POST,
                item_create,
                JsonBody,
                Json::new(),
            )),
            get_item: dispatcher.register(spec(
                "proactive_connect.get_item",
                Method::GET,
                item_by_id,
                Empty,
                Json::new(),
            )),
            update_item: dispatcher.register(spec(
                "proactive_connect.update_item",
                Method::PUT,
                item_update,
                JsonBody,
                Json::new(),
            )),
            delete_item: dispatcher.register(spec(
                "proactive_connect.delete_item",
                Method::DELETE,
                item_by_id,
                Empty,
                NoContent,
            )),
            list_items: dispatcher.register(spec(
                "proactive_connect.list_items",
                Method::GET,
                items,
                Query,
                Json::new(),
            )),
            download_items: dispatcher.register(EndpointSpec {
                accept: CSV,
                ..spec(
                    "proactive_connect.download_items",
                    Method::GET,
                    items_download,
                    Empty,
                    Download,
                )
            }),
            list_events: dispatcher.register(spec(
                "proactive_connect.list_events",
                Method::GET,
                events,
                Query,
                Json::new(),
            )),
        }
    }

    /// Create a list; server-assigned fields of `list` are ignored.
    ///
    /// Returns `list` merged with the server's echo (id, timestamps, sync status).
    pub async fn create_list(&self, list: &ContactsList) -> Result<ContactsList, VonageError> {
        list.validate()?;
        self.create_list
            .execute(&list.without_server_fields())
            .await
    }

    pub async fn get_list(&self, list_id: &ListId) -> Result<ContactsList, VonageError> {
        self.get_list.execute(&list_path(list_id)).await
    }

    /// Replace a list's definition; `list` must carry its server id.
    pub async fn update_list(&self, list: &ContactsList) -> Result<ContactsList, VonageError> {
        if list.id().is_none_or(|id| id.trim().is_empty()) {
            return Err(ValidationError::Empty {
                field: ListId::FIELD,
            }
            .into());
        }
        list.validate()?;
        self.update_list.execute(list).await
    }

    pub async fn delete_list(&self, list_id: &ListId) -> Result<(), VonageError> {
        self.delete_list.execute(&list_path(list_id)).await
    }

    /// Delete every item of a list, keeping the list.
    pub async fn clear_list(&self, list_id: &ListId) -> Result<(), VonageError> {
        self.clear_list.execute(&list_path(list_id)).await
    }

    /// Re-sync a list from its datasource.
    pub async fn fetch_list(&self, list_id: &ListId) -> Result<(), VonageError> {
        self.fetch_list.execute(&list_path(list_id)).await
    }

    pub async fn list_lists(&self, page: PageRequest) -> Result<Page<ContactsList>, VonageError> {
        self.list_lists.execute(&page).await
    }

    pub async fn create_item(&self, request: &ListItemRequest) -> Result<ListItem, VonageError> {
        self.create_item.execute(request).await
    }

    pub async fn get_item(
        &self,
        list_id: &ListId,
        item_id: &ListItemId,
    ) -> Result<ListItem, VonageError> {
        self.get_item.execute(&item_path(list_id, item_id)).await
    }

    /// Replace an item's data; `request` must name the item via [`ListItemRequest::for_item`].
    pub async fn update_item(&self, request: &ListItemRequest) -> Result<ListItem, VonageError> {
        if request.item_id().is_none() {
            return Err(ValidationError::Empty {
                field: ListItemId::FIELD,
            }
            .into());
        }
        self.update_item.execute(request).await
    }

    pub async fn delete_item(
        &self,
        list_id: &ListId,
        item_id: &ListItemId,
    ) -> Result<(), VonageError> {
        self.delete_item.execute(&item_path(list_id, item_id)).await
    }

    pub async fn list_items(
        &self,
        list_id: &ListId,
        page: PageRequest,
    ) -> Result<Page<ListItem>, VonageError> {
        let query = ListItemsQuery {
            list_id: list_id.clone(),
            page,
        };
        self.list_items.execute(&query).await
    }

    /// Download all items of a list as CSV, to memory or to a file.
    pub async fn download_items(
        &self,
        list_id: &ListId,
        target: DownloadTarget,
    ) -> Result<Downloaded, VonageError> {
        self.download_items
            .download(&list_path(list_id), target)
            .await
    }

    pub async fn list_events(&self, query: &ListEventsQuery) -> Result<Page<Event>, VonageError> {
        self.list_events.execute(query).await
    }
}

fn list_path(list_id: &ListId) -> ListPath {
    ListPath {
        list_id: list_id.clone(),
    }
}

fn item_path(list_id: &ListId, item_id: &ListItemId) -> ListItemPath {
    ListItemPath {
        list_id: list_id.clone(),
        item_id: item_id.clone(),
    }
}
