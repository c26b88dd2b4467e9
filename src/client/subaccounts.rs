use reqwest::Method;
use url::Url;

use crate::auth::AuthMethodType;
use crate::client::with_account;
use crate::domain::subaccounts::{
    ListTransfers, MoneyTransfer, NumberTransfer, PrimaryAccount, SubaccountPath,
    SubaccountsListing, TransfersListing,
};
use crate::domain::{
    Account, ApiKey, CreateSubaccount, TransferAmount, TransferNumber, UpdateSubaccount,
};
use crate::endpoint::{Dispatcher, Endpoint, EndpointSpec};
use crate::error::{ApiDomain, VonageError};
use crate::transport::encode::JSON;
use crate::transport::path::join;
use crate::transport::{AccountScoped, BodyFormat, HttpConfig, Json};

const AUTH: &[AuthMethodType] = &[AuthMethodType::Token];

fn accounts<R: AccountScoped>(config: &HttpConfig, request: &R, tail: &[&str]) -> Url {
    let mut path = vec!["accounts", request.account_segment()];
    path.extend_from_slice(tail);
    join(config.api_base_uri(), &path)
}

fn subaccounts<R: AccountScoped>(config: &HttpConfig, request: &R) -> Url {
    accounts(config, request, &["subaccounts"])
}

fn subaccount(config: &HttpConfig, request: &SubaccountPath) -> Url {
    accounts(
        config,
        request,
        &["subaccounts", request.subaccount().as_str()],
    )
}

fn subaccount_update(config: &HttpConfig, request: &UpdateSubaccount) -> Url {
    accounts(
        config,
        request,
        &["subaccounts", request.subaccount().as_str()],
    )
}

fn credit_transfers<R: AccountScoped>(config: &HttpConfig, request: &R) -> Url {
    accounts(config, request, &["credit-transfers"])
}

fn balance_transfers<R: AccountScoped>(config: &HttpConfig, request: &R) -> Url {
    accounts(config, request, &["balance-transfers"])
}

fn transfer_number_path(config: &HttpConfig, request: &TransferNumber) -> Url {
    accounts(config, request, &["transfer-number"])
}

fn spec<Req, R>(
    name: &'static str,
    method: Method,
    path: fn(&HttpConfig, &Req) -> Url,
    format: BodyFormat,
) -> EndpointSpec<Req, Json<R>> {
    EndpointSpec {
        name,
        domain: ApiDomain::Subaccounts,
        method,
        auth: AUTH,
        path,
        format,
        accept: JSON,
        decoder: Json::new(),
    }
}

#[derive(Clone)]
/// Subaccounts API. Paths are scoped to the primary account, which defaults to
/// the API key of the configured token credentials.
pub struct SubaccountsClient {
    dispatcher: Dispatcher,
    create: Endpoint<CreateSubaccount, Json<Account>>,
    get: Endpoint<SubaccountPath, Json<Account>>,
    list: Endpoint<PrimaryAccount, Json<SubaccountsListing>>,
    update: Endpoint<UpdateSubaccount, Json<Account>>,
    list_credit_transfers: Endpoint<ListTransfers, Json<TransfersListing>>,
    list_balance_transfers: Endpoint<ListTransfers, Json<TransfersListing>>,
    transfer_credit: Endpoint<TransferAmount, Json<MoneyTransfer>>,
    transfer_balance: Endpoint<TransferAmount, Json<MoneyTransfer>>,
    transfer_number: Endpoint<TransferNumber, Json<NumberTransfer>>,
}

impl SubaccountsClient {
    pub(crate) fn new(dispatcher: &Dispatcher) -> Self {
        use BodyFormat::{Empty, Json as JsonBody, Query};

        Self {
            dispatcher: dispatcher.clone(),
            create: dispatcher.register(spec(
                "subaccounts.create",
                Method::POST,
                subaccounts,
                JsonBody,
            )),
            get: dispatcher.register(spec("subaccounts.get", Method::GET, subaccount, Empty)),
            list: dispatcher.register(spec("subaccounts.list", Method::GET, subaccounts, Empty)),
            update: dispatcher.register(spec(
                "subaccounts.update",
                Method::PATCH,
                subaccount_update,
                JsonBody,
            )),
            list_credit_transfers: dispatcher.register(spec(
                "subaccounts.list_credit_transfers",
                Method::GET,
                credit_transfers,
                Query,
            )),
            list_balance_transfers: dispatcher.register(spec(
                "subaccounts.list_balance_transfers",
                Method::GET,
                balance_transfers,
                Query,
            )),
            transfer_credit: dispatcher.register(spec(
                "subaccounts.transfer_credit",
                Method::POST,
                credit_transfers,
                JsonBody,
            )),
            transfer_balance: dispatcher.register(spec(
                "subaccounts.transfer_balance",
                Method::POST,
                balance_transfers,
                JsonBody,
            )),
            transfer_number: dispatcher.register(spec(
                "subaccounts.transfer_number",
                Method::POST,
                transfer_number_path,
                JsonBody,
            )),
        }
    }

    fn scoped<R: AccountScoped + Clone>(&self, request: &R) -> Result<R, VonageError> {
        with_account(self.dispatcher.credentials(), request)
    }

    /// Create a subaccount; the response carries its generated secret.
    pub async fn create_subaccount(
        &self,
        request: &CreateSubaccount,
    ) -> Result<Account, VonageError> {
        self.create.execute(&self.scoped(request)?).await
    }

    pub async fn get_subaccount(&self, subaccount: &ApiKey) -> Result<Account, VonageError> {
        let request = self.scoped(&SubaccountPath::new(subaccount.clone()))?;
        self.get.execute(&request).await
    }

    /// The primary account, its subaccounts and the combined balance.
    pub async fn list_subaccounts(&self) -> Result<SubaccountsListing, VonageError> {
        let request = self.scoped(&PrimaryAccount::default())?;
        self.list.execute(&request).await
    }

    pub async fn update_subaccount(
        &self,
        request: &UpdateSubaccount,
    ) -> Result<Account, VonageError> {
        self.update.execute(&self.scoped(request)?).await
    }

    pub async fn list_credit_transfers(
        &self,
        query: &ListTransfers,
    ) -> Result<TransfersListing, VonageError> {
        self.list_credit_transfers
            .execute(&self.scoped(query)?)
            .await
    }

    pub async fn list_balance_transfers(
        &self,
        query: &ListTransfers,
    ) -> Result<TransfersListing, VonageError> {
        self.list_balance_transfers
            .execute(&self.scoped(query)?)
            .await
    }

    pub async fn transfer_credit(
        &self,
        request: &TransferAmount,
    ) -> Result<MoneyTransfer, VonageError> {
        self.transfer_credit.execute(&self.scoped(request)?).await
    }

    pub async fn transfer_balance(
        &self,
        request: &TransferAmount,
    ) -> Result<MoneyTransfer, VonageError> {
        self.transfer_balance.execute(&self.scoped(request)?).await
    }

    pub async fn transfer_number(
        &self,
        request: &TransferNumber,
    ) -> Result<NumberTransfer, VonageError> {
        self.transfer_number.execute(&self.scoped(request)?).await
    }
}
