use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use shared::{
    domain::{Client as CrmClient, ClientDraft, ClientId, ToggleField},
    error::{ApiError, ErrorBody},
    protocol::{
        ListClientsParams, LoginRequest, LoginResponse, PageResult, StatsOverview, ToggleRequest,
    },
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::{CrmError, CrmResult},
    session::SessionContext,
    ClientsApi,
};

/// Remote CRM API over HTTP. Every call except login carries the session's
/// bearer token; a `401` from the server drops the stored token.
pub struct HttpCrmApi {
    http: Client,
    base_url: Url,
    session: Arc<SessionContext>,
}

impl HttpCrmApi {
    pub fn new(api_url: &str, session: Arc<SessionContext>) -> CrmResult<Self> {
        let mut base_url = Url::parse(api_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    fn endpoint(&self, path: &str) -> CrmResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn authorized(&self, builder: RequestBuilder) -> CrmResult<RequestBuilder> {
        let token = self.session.require_token()?;
        Ok(builder.bearer_auth(token))
    }

    async fn check(&self, response: Response) -> CrmResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            warn!(url = %response.url(), "crm api: token rejected, clearing session");
            if let Err(error) = self.session.clear() {
                warn!(%error, "crm api: failed to clear rejected token");
            }
            return Err(CrmError::Unauthorized);
        }
        let url = response.url().clone();
        let body = response.bytes().await.unwrap_or_default();
        let message = ErrorBody::message_from_bytes(&body);
        debug!(%url, status = status.as_u16(), ?message, "crm api: request failed");
        Err(ApiError::new(status.as_u16(), message).into())
    }

    pub async fn login(&self, username: &str, password: &str) -> CrmResult<()> {
        let response = self
            .http
            .post(self.endpoint("api/auth/login")?)
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        // a 401 here means bad credentials, not an expired session
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(ApiError::new(status.as_u16(), ErrorBody::message_from_bytes(&body)).into());
        }
        let body: LoginResponse = response.json().await?;
        self.session.store_token(&body.token)?;
        info!(username, "crm api: logged in");
        Ok(())
    }

    pub fn logout(&self) -> CrmResult<()> {
        self.session.clear()
    }
}

#[async_trait]
impl ClientsApi for HttpCrmApi {
    async fn list_clients(&self, params: &ListClientsParams) -> CrmResult<PageResult<CrmClient>> {
        let request = self
            .authorized(self.http.get(self.endpoint("api/clients")?))?
            .query(params);
        let response = self.check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn create_client(&self, draft: &ClientDraft) -> CrmResult<()> {
        let request = self
            .authorized(self.http.post(self.endpoint("api/clients")?))?
            .json(draft);
        self.check(request.send().await?).await?;
        Ok(())
    }

    async fn update_client(&self, id: ClientId, draft: &ClientDraft) -> CrmResult<()> {
        let request = self
            .authorized(self.http.put(self.endpoint(&format!("api/clients/{id}"))?))?
            .json(draft);
        self.check(request.send().await?).await?;
        Ok(())
    }

    async fn delete_client(&self, id: ClientId) -> CrmResult<()> {
        let request =
            self.authorized(self.http.delete(self.endpoint(&format!("api/clients/{id}"))?))?;
        self.check(request.send().await?).await?;
        Ok(())
    }

    async fn toggle_field(&self, id: ClientId, field: ToggleField) -> CrmResult<()> {
        let request = self
            .authorized(
                self.http
                    .patch(self.endpoint(&format!("api/clients/{id}/toggle"))?),
            )?
            .json(&ToggleRequest { field });
        self.check(request.send().await?).await?;
        Ok(())
    }

    async fn export_csv(&self, params: &ListClientsParams) -> CrmResult<Vec<u8>> {
        let request = self
            .authorized(self.http.get(self.endpoint("api/clients/export/csv")?))?
            .query(params);
        let response = self.check(request.send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn stats_overview(&self) -> CrmResult<StatsOverview> {
        let request = self.authorized(self.http.get(self.endpoint("api/stats/overview")?))?;
        let response = self.check(request.send().await?).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
