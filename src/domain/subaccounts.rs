use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::validation::ValidationError;
use crate::domain::value::{AccountSecret, ApiKey, CountryCode, E164Number, check_length};
use crate::transport::AccountScoped;

pub const SUBACCOUNT_NAME_MAX_LEN: usize = 80;
pub const TRANSFER_REFERENCE_MAX_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// A primary account or subaccount.
pub struct Account {
    pub api_key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primary_account_api_key: Option<String>,
    #[serde(default)]
    pub use_primary_account_balance: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub suspended: Option<bool>,
    #[serde(default)]
    pub balance: Option<f64>,
    #[serde(default)]
    pub credit_limit: Option<f64>,
    /// Only present right after creation.
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubaccountsListing {
    #[serde(default)]
    pub total_balance: Option<f64>,
    #[serde(default)]
    pub total_credit_limit: Option<f64>,
    #[serde(rename = "_embedded")]
    embedded: SubaccountsEmbedded,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct SubaccountsEmbedded {
    primary_account: Account,
    #[serde(default)]
    subaccounts: Vec<Account>,
}

impl SubaccountsListing {
    pub fn primary_account(&self) -> &Account {
        &self.embedded.primary_account
    }

    pub fn subaccounts(&self) -> &[Account] {
        &self.embedded.subaccounts
    }
}

macro_rules! account_scoped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AccountScoped for $ty {
                fn account_id(&self) -> Option<&ApiKey> {
                    self.primary.as_ref()
                }

                fn set_account_id(&mut self, account_id: ApiKey) {
                    self.primary = Some(account_id);
                }
            }
        )*
    };
}

account_scoped!(
    PrimaryAccount,
    SubaccountPath,
    CreateSubaccount,
    UpdateSubaccount,
    ListTransfers,
    TransferAmount,
    TransferNumber,
);

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
/// Path-only request for the primary account's collection.
pub struct PrimaryAccount {
    #[serde(skip)]
    primary: Option<ApiKey>,
}

impl PrimaryAccount {
    pub fn new(primary: Option<ApiKey>) -> Self {
        Self { primary }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubaccountPath {
    #[serde(skip)]
    primary: Option<ApiKey>,
    #[serde(skip)]
    subaccount: ApiKey,
}

impl SubaccountPath {
    pub fn new(subaccount: ApiKey) -> Self {
        Self {
            primary: None,
            subaccount,
        }
    }

    pub fn subaccount(&self) -> &ApiKey {
        &self.subaccount
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSubaccount {
    #[serde(skip)]
    primary: Option<ApiKey>,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    use_primary_account_balance: Option<bool>,
}

impl CreateSubaccount {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            primary: None,
            name: check_name(name.into())?,
            secret: None,
            use_primary_account_balance: None,
        })
    }

    pub fn secret(mut self, secret: AccountSecret) -> Self {
        self.secret = Some(secret.as_str().to_owned());
        self
    }

    pub fn use_primary_account_balance(mut self, shared: bool) -> Self {
        self.use_primary_account_balance = Some(shared);
        self
    }

    /// Create under an explicit primary account instead of the configured one.
    pub fn primary_account(mut self, primary: ApiKey) -> Self {
        self.primary = Some(primary);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateSubaccount {
    #[serde(skip)]
    primary: Option<ApiKey>,
    #[serde(skip)]
    subaccount: ApiKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    use_primary_account_balance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suspended: Option<bool>,
}

impl UpdateSubaccount {
    pub fn builder(subaccount: ApiKey) -> UpdateSubaccountBuilder {
        UpdateSubaccountBuilder {
            update: Self {
                primary: None,
                subaccount,
                name: None,
                use_primary_account_balance: None,
                suspended: None,
            },
        }
    }

    pub fn subaccount(&self) -> &ApiKey {
        &self.subaccount
    }
}

#[derive(Debug, Clone)]
pub struct UpdateSubaccountBuilder {
    update: UpdateSubaccount,
}

impl UpdateSubaccountBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.update.name = Some(name.into());
        self
    }

    pub fn use_primary_account_balance(mut self, shared: bool) -> Self {
        self.update.use_primary_account_balance = Some(shared);
        self
    }

    pub fn suspended(mut self, suspended: bool) -> Self {
        self.update.suspended = Some(suspended);
        self
    }

    pub fn build(mut self) -> Result<UpdateSubaccount, ValidationError> {
        if let Some(name) = self.update.name.take() {
            self.update.name = Some(check_name(name)?);
        }
        let update = &self.update;
        if update.name.is_none()
            && update.use_primary_account_balance.is_none()
            && update.suspended.is_none()
        {
            return Err(ValidationError::NothingToUpdate);
        }
        Ok(self.update)
    }
}

fn check_name(name: String) -> Result<String, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty { field: "name" });
    }
    check_length("name", &name, 1, SUBACCOUNT_NAME_MAX_LEN)?;
    Ok(name)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Query for credit or balance transfers between `start_date` and `end_date`.
pub struct ListTransfers {
    #[serde(skip)]
    primary: Option<ApiKey>,
    start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subaccount: Option<String>,
}

impl ListTransfers {
    pub fn new(
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
        subaccount: Option<ApiKey>,
    ) -> Result<Self, ValidationError> {
        if end_date.is_some_and(|end| start_date > end) {
            return Err(ValidationError::InvertedRange {
                start: "start_date",
                end: "end_date",
            });
        }
        Ok(Self {
            primary: None,
            start_date,
            end_date,
            subaccount: subaccount.map(|key| key.as_str().to_owned()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Move credit or balance between two accounts of the same family.
pub struct TransferAmount {
    #[serde(skip)]
    primary: Option<ApiKey>,
    from: String,
    to: String,
    amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
}

impl TransferAmount {
    pub fn new(from: ApiKey, to: ApiKey, amount: f64) -> Result<Self, ValidationError> {
        if from == to {
            return Err(ValidationError::Conflict {
                first: "from",
                second: "to",
            });
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::InvalidFormat {
                field: "amount",
                reason: "must be a positive number",
            });
        }
        Ok(Self {
            primary: None,
            from: from.as_str().to_owned(),
            to: to.as_str().to_owned(),
            amount,
            reference: None,
        })
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Result<Self, ValidationError> {
        let reference = reference.into();
        check_length("reference", &reference, 1, TRANSFER_REFERENCE_MAX_LEN)?;
        self.reference = Some(reference);
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoneyTransfer {
    #[serde(default)]
    pub id: Option<String>,
    pub amount: f64,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransfersListing {
    #[serde(rename = "_embedded")]
    embedded: TransfersEmbedded,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct TransfersEmbedded {
    #[serde(alias = "credit_transfers", alias = "balance_transfers", default)]
    transfers: Vec<MoneyTransfer>,
}

impl TransfersListing {
    pub fn transfers(&self) -> &[MoneyTransfer] {
        &self.embedded.transfers
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Move a phone number between two accounts of the same family.
pub struct TransferNumber {
    #[serde(skip)]
    primary: Option<ApiKey>,
    from: String,
    to: String,
    number: String,
    country: String,
}

impl TransferNumber {
    pub fn new(
        from: ApiKey,
        to: ApiKey,
        number: E164Number,
        country: CountryCode,
    ) -> Result<Self, ValidationError> {
        if from == to {
            return Err(ValidationError::Conflict {
                first: "from",
                second: "to",
            });
        }
        Ok(Self {
            primary: None,
            from: from.as_str().to_owned(),
            to: to.as_str().to_owned(),
            number: number.as_str().to_owned(),
            country: country.as_str().to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NumberTransfer {
    pub number: String,
    pub country: String,
    pub from: String,
    pub to: String,
}
