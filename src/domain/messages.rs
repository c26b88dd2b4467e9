use serde::{Deserialize, Serialize};

use crate::domain::validation::ValidationError;
use crate::domain::value::{E164Number, MessageUuid, WebUrl, check_length, check_range};
use crate::transport::Region;

/// Maximum `client_ref` length.
pub const CLIENT_REF_MAX_LEN: usize = 100;
/// Maximum length of an alphanumeric SMS sender id.
pub const SMS_SENDER_MAX_LEN: usize = 11;
/// Maximum length of Messenger and Viber ids.
pub const CHANNEL_ID_MAX_LEN: usize = 50;
/// Maximum media caption length.
pub const CAPTION_MAX_LEN: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Sms,
    Mms,
    Whatsapp,
    Messenger,
    ViberService,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Mms => "mms",
            Self::Whatsapp => "whatsapp",
            Self::Messenger => "messenger",
            Self::ViberService => "viber_service",
        }
    }

    /// Message types this channel accepts.
    pub fn supported_types(self) -> &'static [MessageType] {
        use MessageType::*;
        match self {
            Self::Sms => &[Text],
            Self::Mms => &[Image, Vcard, Audio, Video],
            Self::Whatsapp => &[Text, Image, Audio, Video, File, Template, Custom, Sticker],
            Self::Messenger => &[Text, Image, Audio, Video, File],
            Self::ViberService => &[Text, Image, Video, File],
        }
    }

    pub fn supports(self, message_type: MessageType) -> bool {
        self.supported_types().contains(&message_type)
    }

    /// Maximum text length for `text` messages.
    pub fn max_text_len(self) -> usize {
        match self {
            Self::Sms | Self::ViberService => 1000,
            Self::Mms => CAPTION_MAX_LEN,
            Self::Whatsapp => 4096,
            Self::Messenger => 640,
        }
    }

    /// Allowed `ttl` range in seconds.
    pub fn ttl_range(self) -> (u32, u32) {
        match self {
            Self::Sms => (20, 604_800),
            _ => (30, 259_200),
        }
    }

    fn uses_phone_numbers(self) -> bool {
        matches!(self, Self::Sms | Self::Mms | Self::Whatsapp | Self::ViberService)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Image,
    Audio,
    Video,
    File,
    Vcard,
    Template,
    Custom,
    Sticker,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::File => "file",
            Self::Vcard => "vcard",
            Self::Template => "template",
            Self::Custom => "custom",
            Self::Sticker => "sticker",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaPayload {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl MediaPayload {
    pub fn new(url: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            url: WebUrl::new("url", url)?.as_str().to_owned(),
            caption: None,
        })
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Result<Self, ValidationError> {
        let caption = caption.into();
        check_length("caption", &caption, 1, CAPTION_MAX_LEN)?;
        self.caption = Some(caption);
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplatePayload {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatsappTemplateSettings {
    /// Always `deterministic`.
    pub policy: &'static str,
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StickerPayload {
    Url { url: String },
    Id { id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
/// Body of a message; the variant decides the `message_type`.
pub enum MessageContent {
    Text {
        text: String,
    },
    Image {
        image: MediaPayload,
    },
    Audio {
        audio: MediaPayload,
    },
    Video {
        video: MediaPayload,
    },
    File {
        file: MediaPayload,
    },
    Vcard {
        vcard: MediaPayload,
    },
    Template {
        template: TemplatePayload,
        whatsapp: WhatsappTemplateSettings,
    },
    Custom {
        custom: serde_json::Value,
    },
    Sticker {
        sticker: StickerPayload,
    },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(image: MediaPayload) -> Self {
        Self::Image { image }
    }

    /// WhatsApp template message with the deterministic language policy.
    pub fn template(
        name: impl Into<String>,
        parameters: Vec<String>,
        locale: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }
        let locale = locale.into();
        if locale.trim().is_empty() {
            return Err(ValidationError::Empty { field: "locale" });
        }
        Ok(Self::Template {
            template: TemplatePayload { name, parameters },
            whatsapp: WhatsappTemplateSettings {
                policy: "deterministic",
                locale,
            },
        })
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Text { .. } => MessageType::Text,
            Self::Image { .. } => MessageType::Image,
            Self::Audio { .. } => MessageType::Audio,
            Self::Video { .. } => MessageType::Video,
            Self::File { .. } => MessageType::File,
            Self::Vcard { .. } => MessageType::Vcard,
            Self::Template { .. } => MessageType::Template,
            Self::Custom { .. } => MessageType::Custom,
            Self::Sticker { .. } => MessageType::Sticker,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SmsEncoding {
    Text,
    Unicode,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct SmsSettings {
    encoding_type: SmsEncoding,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Validated outbound message; build it with [`MessageRequest::builder`].
pub struct MessageRequest {
    channel: Channel,
    #[serde(flatten)]
    content: MessageContent,
    to: String,
    from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sms: Option<SmsSettings>,
}

impl MessageRequest {
    pub fn builder(channel: Channel, content: MessageContent) -> MessageRequestBuilder {
        MessageRequestBuilder {
            channel,
            content,
            to: None,
            from: None,
            client_ref: None,
            webhook_url: None,
            ttl: None,
            sms_encoding: None,
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn message_type(&self) -> MessageType {
        self.content.message_type()
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn client_ref(&self) -> Option<&str> {
        self.client_ref.as_deref()
    }
}

#[derive(Debug, Clone)]
/// Collects message fields; [`MessageRequestBuilder::build`] runs every check.
pub struct MessageRequestBuilder {
    channel: Channel,
    content: MessageContent,
    to: Option<String>,
    from: Option<String>,
    client_ref: Option<String>,
    webhook_url: Option<String>,
    ttl: Option<u32>,
    sms_encoding: Option<SmsEncoding>,
}

impl MessageRequestBuilder {
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Recipient from an already parsed number, e.g. a national [`PhoneNumber`].
    ///
    /// [`PhoneNumber`]: crate::domain::PhoneNumber
    pub fn to_number(mut self, number: impl Into<E164Number>) -> Self {
        self.to = Some(number.into().as_str().to_owned());
        self
    }

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn client_ref(mut self, client_ref: impl Into<String>) -> Self {
        self.client_ref = Some(client_ref.into());
        self
    }

    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Time-to-live in seconds.
    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// SMS only.
    pub fn sms_encoding(mut self, encoding: SmsEncoding) -> Self {
        self.sms_encoding = Some(encoding);
        self
    }

    pub fn build(self) -> Result<MessageRequest, ValidationError> {
        let channel = self.channel;
        check_supported(channel, &self.content)?;
        check_content(channel, &self.content)?;

        let to = self.to.ok_or(ValidationError::Empty { field: "to" })?;
        let to = normalize_recipient(channel, to)?;
        let from = self.from.ok_or(ValidationError::Empty { field: "from" })?;
        let from = normalize_sender(channel, from)?;

        if let Some(client_ref) = &self.client_ref {
            check_length("client_ref", client_ref, 1, CLIENT_REF_MAX_LEN)?;
        }
        let webhook_url = self
            .webhook_url
            .map(|url| WebUrl::new("webhook_url", url).map(|url| url.as_str().to_owned()))
            .transpose()?;
        if let Some(ttl) = self.ttl {
            let (min, max) = channel.ttl_range();
            check_range("ttl", i64::from(ttl), i64::from(min), i64::from(max))?;
        }
        if self.sms_encoding.is_some() && channel != Channel::Sms {
            return Err(ValidationError::InvalidFormat {
                field: "sms",
                reason: "encoding applies to the sms channel only",
            });
        }

        Ok(MessageRequest {
            channel,
            content: self.content,
            to,
            from,
            client_ref: self.client_ref,
            webhook_url,
            ttl: self.ttl,
            sms: self
                .sms_encoding
                .map(|encoding_type| SmsSettings { encoding_type }),
        })
    }
}

fn check_supported(channel: Channel, content: &MessageContent) -> Result<(), ValidationError> {
    let message_type = content.message_type();
    if !channel.supports(message_type) {
        return Err(ValidationError::UnsupportedMessageType {
            channel: channel.as_str(),
            message_type: message_type.as_str(),
        });
    }
    Ok(())
}

fn check_content(channel: Channel, content: &MessageContent) -> Result<(), ValidationError> {
    match content {
        MessageContent::Text { text } => {
            if text.trim().is_empty() {
                return Err(ValidationError::Empty { field: "text" });
            }
            check_length("text", text, 1, channel.max_text_len())
        }
        MessageContent::Custom { custom } => match custom {
            serde_json::Value::Object(map) if !map.is_empty() => Ok(()),
            _ => Err(ValidationError::Empty { field: "custom" }),
        },
        MessageContent::Sticker { sticker } => {
            let value = match sticker {
                StickerPayload::Url { url } => url,
                StickerPayload::Id { id } => id,
            };
            if value.trim().is_empty() {
                return Err(ValidationError::Empty { field: "sticker" });
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn normalize_recipient(channel: Channel, to: String) -> Result<String, ValidationError> {
    if channel.uses_phone_numbers() {
        return Ok(E164Number::new(to)?.as_str().to_owned());
    }
    let to = to.trim().to_owned();
    check_length("to", &to, 1, CHANNEL_ID_MAX_LEN)?;
    Ok(to)
}

fn normalize_sender(channel: Channel, from: String) -> Result<String, ValidationError> {
    match channel {
        Channel::Sms => {
            let trimmed = from.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::Empty { field: "from" });
            }
            if let Ok(number) = E164Number::new(trimmed) {
                return Ok(number.as_str().to_owned());
            }
            check_length("from", trimmed, 1, SMS_SENDER_MAX_LEN)?;
            if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
                return Err(ValidationError::InvalidFormat {
                    field: "from",
                    reason: "sender id must be alphanumeric",
                });
            }
            Ok(trimmed.to_owned())
        }
        Channel::Mms | Channel::Whatsapp => Ok(E164Number::new(from)?.as_str().to_owned()),
        Channel::Messenger | Channel::ViberService => {
            let from = from.trim().to_owned();
            check_length("from", &from, 1, CHANNEL_ID_MAX_LEN)?;
            Ok(from)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    pub message_uuid: String,
    #[serde(default)]
    pub workflow_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatusUpdate {
    /// Mark an inbound WhatsApp message as read.
    Read,
    /// Revoke an outbound RCS message that was not delivered yet.
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// `PATCH /v1/messages/{uuid}` on a regional host.
pub struct UpdateMessage {
    #[serde(skip)]
    pub message_uuid: MessageUuid,
    #[serde(skip)]
    pub region: Region,
    pub status: MessageStatusUpdate,
}
