use reqwest::Method;
use tracing::debug;
use url::Url;

use crate::auth::AuthMethodType;
use crate::domain::messages::{MessageStatusUpdate, UpdateMessage};
use crate::domain::{MessageRequest, MessageResponse, MessageUuid};
use crate::endpoint::{Dispatcher, Endpoint, EndpointSpec};
use crate::error::{ApiDomain, VonageError};
use crate::transport::encode::JSON;
use crate::transport::path::join;
use crate::transport::{BodyFormat, HttpConfig, Json, NoContent, Region};

const SEND_AUTH: &[AuthMethodType] = &[AuthMethodType::Jwt, AuthMethodType::Token];

fn send_path(config: &HttpConfig, _request: &MessageRequest) -> Url {
    join(config.api_base_uri(), &["v1", "messages"])
}

fn sandbox_path(config: &HttpConfig, _request: &MessageRequest) -> Url {
    join(config.messages_sandbox_uri(), &["v1", "messages"])
}

fn update_path(config: &HttpConfig, request: &UpdateMessage) -> Url {
    join(
        config.regional_base_uri(request.region),
        &["v1", "messages", request.message_uuid.as_str()],
    )
}

fn send_spec(
    name: &'static str,
    path: fn(&HttpConfig, &MessageRequest) -> Url,
) -> EndpointSpec<MessageRequest, Json<MessageResponse>> {
    EndpointSpec {
        name,
        domain: ApiDomain::Messages,
        method: Method::POST,
        auth: SEND_AUTH,
        path,
        format: BodyFormat::Json,
        accept: JSON,
        decoder: Json::new(),
    }
}

#[derive(Clone)]
/// Messages API: send across channels and update message status.
pub struct MessagesClient {
    send: Endpoint<MessageRequest, Json<MessageResponse>>,
    send_sandbox: Endpoint<MessageRequest, Json<MessageResponse>>,
    update: Endpoint<UpdateMessage, NoContent>,
    sandbox: bool,
}

impl MessagesClient {
    pub(crate) fn new(dispatcher: &Dispatcher, sandbox: bool) -> Self {
        Self {
            send: dispatcher.register(send_spec("messages.send", send_path)),
            send_sandbox: dispatcher.register(send_spec("messages.send_sandbox", sandbox_path)),
            update: dispatcher.register(EndpointSpec {
                name: "messages.update",
                domain: ApiDomain::Messages,
                method: Method::PATCH,
                auth: &[AuthMethodType::Jwt],
                path: update_path,
                format: BodyFormat::Json,
                accept: JSON,
                decoder: NoContent,
            }),
            sandbox,
        }
    }

    /// Whether outbound messages go to the sandbox host.
    pub fn is_sandbox(&self) -> bool {
        self.sandbox
    }

    /// A copy of this client with the sandbox switched on or off.
    pub fn with_sandbox(&self, sandbox: bool) -> Self {
        Self {
            sandbox,
            ..self.clone()
        }
    }

    /// Send a message.
    ///
    /// The request was validated when it was built, so nothing here can fail
    /// before the network except auth resolution.
    pub async fn send(&self, request: &MessageRequest) -> Result<MessageResponse, VonageError> {
        let endpoint = if self.sandbox {
            &self.send_sandbox
        } else {
            &self.send
        };
        let response = endpoint.execute(request).await?;
        debug!(
            channel = request.channel().as_str(),
            message_uuid = %response.message_uuid,
            "message accepted"
        );
        Ok(response)
    }

    /// Mark an inbound WhatsApp message as read.
    pub async fn ack_inbound(
        &self,
        message_uuid: &MessageUuid,
        region: Region,
    ) -> Result<(), VonageError> {
        self.update_status(message_uuid, region, MessageStatusUpdate::Read)
            .await
    }

    /// Revoke an outbound message that has not been delivered yet.
    pub async fn revoke_outbound(
        &self,
        message_uuid: &MessageUuid,
        region: Region,
    ) -> Result<(), VonageError> {
        self.update_status(message_uuid, region, MessageStatusUpdate::Revoked)
            .await
    }

    async fn update_status(
        &self,
        message_uuid: &MessageUuid,
        region: Region,
        status: MessageStatusUpdate,
    ) -> Result<(), VonageError> {
        let request = UpdateMessage {
            message_uuid: message_uuid.clone(),
            region,
            status,
        };
        self.update.execute(&request).await
    }
}
