//! Domain layer: strong types with validation and invariants (no I/O).

pub mod account;
pub mod messages;
pub mod proactive_connect;
pub mod subaccounts;
mod validation;
mod value;

pub use messages::{
    Channel, MediaPayload, MessageContent, MessageRequest, MessageRequestBuilder,
    MessageResponse, MessageType, SmsEncoding,
};
pub use proactive_connect::{
    ContactsList, ContactsListBuilder, ListAttribute, ListDatasource, ListEventsQuery, ListItem,
    PageRequest, SortOrder,
};
pub use subaccounts::{Account, CreateSubaccount, TransferAmount, TransferNumber, UpdateSubaccount};
pub use validation::ValidationError;
pub use value::{
    AccountSecret, ApiKey, ApiSecret, ApplicationId, CountryCode, E164Number, ListId, ListItemId,
    MessageUuid, PhoneNumber, SecretId, WebUrl,
};
