//! YCLIENTS API client
//!
//! Thin wrappers over [`HttpClient`] for the booking-form and account
//! endpoints, plus the paginated client and visit reads built on
//! [`Paginator`].

use super::types::{BookingOutcome, BookingRequest};
use crate::auth::Authenticator;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::http::{ConnectionContext, HttpClient, RequestConfig};
use crate::output::records_to_batch;
use crate::pagination::{
    BoundFetcher, KeyedPageFetcher, KeyedRecords, PageEnvelope, PageFetcher, Paginator,
};
use crate::types::{ClientId, Method, Record};
use crate::visits::{filter_attended, summarize_visits, VisitSummary};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

/// Client for one company (salon) and its booking form
#[derive(Debug)]
pub struct YClientsApi {
    config: ApiConfig,
    http: HttpClient,
    paginator: Paginator,
}

impl YClientsApi {
    /// Build a client from a validated config
    pub fn new(config: ApiConfig) -> Result<Self> {
        config.validate()?;
        let authenticator = Authenticator::new(config.credentials());
        let http = HttpClient::new(config.http_config(), authenticator);
        let paginator = Paginator::new()
            .with_policy(config.page_count_policy)
            .with_mode(config.fetch_mode);

        info!(
            company_id = config.company_id,
            form_id = config.form_id,
            "YCLIENTS client ready"
        );
        Ok(Self {
            config,
            http,
            paginator,
        })
    }

    /// Shorthand for [`ApiConfig::new`] with defaults
    pub fn with_token(token: impl Into<String>, company_id: u64, form_id: u64) -> Result<Self> {
        Self::new(ApiConfig::new(token, company_id, form_id))
    }

    /// Active configuration
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Underlying transport
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Paginator used by the list endpoints
    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// Open a connection context to share across several calls
    pub fn open_context(&self) -> Result<ConnectionContext> {
        self.http.open_context()
    }

    // ------------------------------------------------------------------
    // URLs
    // ------------------------------------------------------------------

    fn form_url(&self, path: &str) -> Result<String> {
        join_url(&self.config.form_base_url(), path)
    }

    fn api_url(&self, path: &str) -> Result<String> {
        join_url(&self.config.api_url, path)
    }

    // ------------------------------------------------------------------
    // Booking form
    // ------------------------------------------------------------------

    /// Book one appointment
    ///
    /// Transport and decode failures are errors; a rejection by the service
    /// comes back as an unsuccessful [`BookingOutcome`].
    pub async fn book(&self, request: &BookingRequest) -> Result<BookingOutcome> {
        let url = self.form_url(&format!("book_record/{}/", self.config.company_id))?;
        let body = self
            .http
            .post_json(&url, RequestConfig::new().json(request.payload()))
            .await?;

        let outcome = BookingOutcome::from_response(&body);
        if outcome.success {
            info!(booking_id = request.booking_id, "Booking accepted");
        } else {
            info!(
                booking_id = request.booking_id,
                reason = %outcome.message,
                "Booking rejected"
            );
        }
        Ok(outcome)
    }

    /// Details of one staff member
    pub async fn get_staff_info(&self, staff_id: u64) -> Result<Value> {
        let url = self.form_url(&format!("staff/{}/{staff_id}", self.config.company_id))?;
        self.http.get_json(&url, RequestConfig::new()).await
    }

    /// Details of one service
    pub async fn get_service_info(&self, service_id: u64) -> Result<Value> {
        let url = self.form_url(&format!("services/{}/{service_id}", self.config.company_id))?;
        self.http.get_json(&url, RequestConfig::new()).await
    }

    /// Staff available for a service and/or a date-time
    pub async fn get_staff(&self, service_id: Option<u64>, datetime: Option<&str>) -> Result<Value> {
        let url = self.form_url(&format!("book_staff/{}", self.config.company_id))?;
        let request = RequestConfig::new()
            .query_opt("service_ids[]", service_id)
            .query_opt("datetime", datetime);
        self.http.get_json(&url, request).await
    }

    /// Services available for a staff member and/or a date-time
    pub async fn get_services(&self, staff_id: Option<u64>, datetime: Option<&str>) -> Result<Value> {
        let url = self.form_url(&format!("book_services/{}", self.config.company_id))?;
        let request = RequestConfig::new()
            .query_opt("staff_id", staff_id)
            .query_opt("datetime", datetime);
        self.http.get_json(&url, request).await
    }

    /// Days with free slots for a staff member and/or a service
    pub async fn get_available_days(
        &self,
        staff_id: Option<u64>,
        service_id: Option<u64>,
    ) -> Result<Value> {
        let url = self.form_url(&format!("book_dates/{}", self.config.company_id))?;
        let request = RequestConfig::new()
            .query_opt("staff_id", staff_id)
            .query_opt("service_ids[]", service_id);
        self.http.get_json(&url, request).await
    }

    /// Free time slots of a staff member on `day` (`YYYY-MM-DD`)
    pub async fn get_available_times(
        &self,
        staff_id: u64,
        day: &str,
        service_id: Option<u64>,
    ) -> Result<Value> {
        let url = self.form_url(&format!(
            "book_times/{}/{staff_id}/{day}",
            self.config.company_id
        ))?;
        let request = RequestConfig::new().query_opt("service_ids[]", service_id);
        self.http.get_json(&url, request).await
    }

    // ------------------------------------------------------------------
    // User authorization
    // ------------------------------------------------------------------

    /// Exchange a login and password for a user token
    ///
    /// The token is returned, not installed; see [`Self::update_user_token`].
    pub async fn get_user_token(&self, login: &str, password: &str) -> Result<String> {
        let url = self.api_url("auth")?;
        let request = RequestConfig::new()
            .query("login", login)
            .query("password", password);
        let body = self.http.post_json(&url, request).await?;
        let token = Authenticator::user_token_from_response(&body)?;
        debug!("Obtained user token");
        Ok(token)
    }

    /// Send `user_token` with every later request
    ///
    /// Replaces a previously installed user token.
    pub async fn update_user_token(&self, user_token: impl Into<String>) {
        self.http.authenticator().set_user_token(user_token).await;
    }

    /// Obtain a user token and install it
    pub async fn login(&self, login: &str, password: &str) -> Result<()> {
        let token = self.get_user_token(login, password).await?;
        self.update_user_token(token).await;
        Ok(())
    }

    /// Current `Authorization` header value
    pub async fn authorization(&self) -> String {
        self.http.authenticator().authorization().await
    }

    /// Permissions of the authorized user in this company
    pub async fn user_permissions(&self) -> Result<Value> {
        let url = self.api_url(&format!("user/permissions/{}", self.config.company_id))?;
        let mut body = self.http.get_json(&url, RequestConfig::new()).await?;
        match body.get_mut("data") {
            Some(data) => Ok(data.take()),
            None => Err(Error::decode("permissions response has no 'data' field")),
        }
    }

    // ------------------------------------------------------------------
    // Clients and visits
    // ------------------------------------------------------------------

    /// Every client record of the company, in page order
    pub async fn get_clients_data(&self, per_page: u32) -> Result<Vec<Record>> {
        let context = self.open_context()?;
        let fetcher = ClientsPages {
            api: self,
            context: &context,
        };
        self.paginator.fetch_all(&fetcher, per_page).await
    }

    /// Every visit record of one client, in page order
    ///
    /// Uses `context` when given; otherwise a context is opened for this call
    /// and released when it returns.
    pub async fn get_visits_for_client(
        &self,
        client_id: ClientId,
        per_page: u32,
        context: Option<&ConnectionContext>,
    ) -> Result<Vec<Record>> {
        let scope = self.http.scope(context)?;
        let visits = VisitPages { api: self };
        let fetcher = BoundFetcher::new(&visits, &scope, &client_id);
        self.paginator.fetch_all(&fetcher, per_page).await
    }

    /// Visit records of several clients, one after another over one context
    pub async fn get_visits_data_for_clients_list(
        &self,
        client_ids: &[ClientId],
        per_page: u32,
        context: Option<&ConnectionContext>,
    ) -> Result<KeyedRecords<ClientId>> {
        let scope = self.http.scope(context)?;
        self.paginator
            .fetch_all_for_keys(client_ids, &VisitPages { api: self }, per_page, &scope)
            .await
    }

    /// Attended visits of one client, in page order
    pub async fn get_attended_visits_for_client(
        &self,
        client_id: ClientId,
        per_page: u32,
        context: Option<&ConnectionContext>,
    ) -> Result<Vec<Record>> {
        let visits = self
            .get_visits_for_client(client_id, per_page, context)
            .await?;
        Ok(filter_attended(visits))
    }

    /// One attended-visit summary per client, in the order of `client_ids`
    pub async fn get_attended_visits_dates_information(
        &self,
        client_ids: &[ClientId],
        per_page: u32,
        context: Option<&ConnectionContext>,
    ) -> Result<Vec<VisitSummary>> {
        let visits = self
            .get_visits_data_for_clients_list(client_ids, per_page, context)
            .await?;
        visits
            .iter()
            .map(|(id, records)| summarize_visits(*id, records))
            .collect()
    }

    /// Client records as a table, using the configured column policy
    pub fn parse_clients_data(&self, records: &[Record]) -> Result<RecordBatch> {
        records_to_batch(records, self.config.column_policy)
    }
}

/// Join a base URL and a relative path, rejecting malformed results
fn join_url(base: &str, path: &str) -> Result<String> {
    let joined = format!("{}/{}", base.trim_end_matches('/'), path);
    Ok(Url::parse(&joined)?.to_string())
}

// ============================================================================
// Page fetchers
// ============================================================================

/// Pages of `{api}/clients/{company}`
struct ClientsPages<'a> {
    api: &'a YClientsApi,
    context: &'a ConnectionContext,
}

#[async_trait]
impl PageFetcher for ClientsPages<'_> {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<PageEnvelope> {
        let url = self
            .api
            .api_url(&format!("clients/{}", self.api.config.company_id))?;
        let request = RequestConfig::new()
            .query("count", page_size)
            .query("page", page);
        let body = self
            .api
            .http
            .execute(self.context, Method::GET, &url, request)
            .await?;
        PageEnvelope::from_value(body)
    }
}

/// Pages of `{api}/records/{company}` filtered by client
struct VisitPages<'a> {
    api: &'a YClientsApi,
}

#[async_trait]
impl KeyedPageFetcher<ClientId> for VisitPages<'_> {
    async fn fetch_page(
        &self,
        context: &ConnectionContext,
        client_id: &ClientId,
        page: u32,
        page_size: u32,
    ) -> Result<PageEnvelope> {
        let url = self
            .api
            .api_url(&format!("records/{}", self.api.config.company_id))?;
        let request = RequestConfig::new()
            .query("client_id", client_id)
            .query("count", page_size)
            .query("page", page);
        let body = self
            .api
            .http
            .execute(context, Method::GET, &url, request)
            .await?;
        PageEnvelope::from_value(body)
    }
}
