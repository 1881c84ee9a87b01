//! Typed provider endpoints

use tracing::instrument;

use crate::client::ApiClient;
use crate::models::*;
use crate::transport::UpstreamRequest;
use crate::Result;

impl ApiClient {
    // ===== Identity =====

    /// GET `/user/tokens/verify`
    #[instrument(skip(self))]
    pub async fn verify_token(&self) -> Result<TokenVerification> {
        self.fetch(UpstreamRequest::get("/user/tokens/verify")).await
    }

    /// GET `/accounts/{account_id}`
    #[instrument(skip(self))]
    pub async fn get_account(&self, account_id: &str) -> Result<Account> {
        self.fetch(UpstreamRequest::get(format!("/accounts/{account_id}")))
            .await
    }

    /// POST `/user/tokens`
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_token(&self, request: &CreateTokenRequest) -> Result<MintedToken> {
        let body = serde_json::to_value(request)
            .map_err(|e| crate::UpstreamError::Decode(e.to_string()))?;
        self.fetch(UpstreamRequest::post("/user/tokens").json(body))
            .await
    }

    // ===== Dispatch namespaces =====

    /// GET `/accounts/{account_id}/workers/dispatch/namespaces`
    #[instrument(skip(self))]
    pub async fn list_namespaces(&self, account_id: &str) -> Result<Vec<DispatchNamespace>> {
        self.list(UpstreamRequest::get(format!(
            "/accounts/{account_id}/workers/dispatch/namespaces"
        )))
        .await
    }

    /// POST `/accounts/{account_id}/workers/dispatch/namespaces`
    #[instrument(skip(self))]
    pub async fn create_namespace(&self, account_id: &str, name: &str) -> Result<DispatchNamespace> {
        self.fetch(
            UpstreamRequest::post(format!("/accounts/{account_id}/workers/dispatch/namespaces"))
                .json(serde_json::json!({ "name": name })),
        )
        .await
    }

    // ===== Zones and routes =====

    /// GET `/zones?name={name}&account.id={account_id}`
    #[instrument(skip(self))]
    pub async fn find_zones(&self, name: &str, account_id: &str) -> Result<Vec<Zone>> {
        self.list(
            UpstreamRequest::get("/zones")
                .query("name", name)
                .query("account.id", account_id),
        )
        .await
    }

    /// GET `/zones/{zone_id}/workers/routes`
    #[instrument(skip(self))]
    pub async fn list_routes(&self, zone_id: &str) -> Result<Vec<WorkerRoute>> {
        self.list(UpstreamRequest::get(format!("/zones/{zone_id}/workers/routes")))
            .await
    }

    /// POST `/zones/{zone_id}/workers/routes`
    #[instrument(skip(self))]
    pub async fn create_route(&self, zone_id: &str, pattern: &str, script: &str) -> Result<()> {
        let body = serde_json::to_value(CreateRouteRequest {
            pattern: pattern.to_string(),
            script: script.to_string(),
        })
        .map_err(|e| crate::UpstreamError::Decode(e.to_string()))?;

        self.acknowledge(UpstreamRequest::post(format!("/zones/{zone_id}/workers/routes")).json(body))
            .await
    }

    // ===== Custom hostnames =====

    /// POST `/zones/{zone_id}/custom_hostnames`
    #[instrument(skip(self, request), fields(hostname = %request.hostname))]
    pub async fn create_custom_hostname(
        &self,
        zone_id: &str,
        request: &CreateCustomHostnameRequest,
    ) -> Result<()> {
        let body = serde_json::to_value(request)
            .map_err(|e| crate::UpstreamError::Decode(e.to_string()))?;
        self.acknowledge(UpstreamRequest::post(format!("/zones/{zone_id}/custom_hostnames")).json(body))
            .await
    }

    /// GET `/zones/{zone_id}/custom_hostnames?hostname={hostname}`
    #[instrument(skip(self))]
    pub async fn list_custom_hostnames(
        &self,
        zone_id: &str,
        hostname: &str,
    ) -> Result<Vec<CustomHostnameWire>> {
        self.list(
            UpstreamRequest::get(format!("/zones/{zone_id}/custom_hostnames"))
                .query("hostname", hostname),
        )
        .await
    }

    /// DELETE `/zones/{zone_id}/custom_hostnames/{id}`
    #[instrument(skip(self))]
    pub async fn delete_custom_hostname(&self, zone_id: &str, id: &str) -> Result<()> {
        self.acknowledge(UpstreamRequest::delete(format!(
            "/zones/{zone_id}/custom_hostnames/{id}"
        )))
        .await
    }
}
