//! Domain service flows: registry persistence around the controller.

use hostplane_core::{HostnameStatus, Tenant};
use hostplane_domains::{
    CustomHostnameController, DomainError, DomainService, InMemoryRegistry, RegistryError,
    TenantRegistry,
};
use hostplane_upstream::{ApiClient, Credentials, ReqwestTransport};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ZONE: &str = "zone-123";

async fn setup(server: &MockServer) -> (DomainService, Arc<InMemoryRegistry>, Tenant) {
    let transport = ReqwestTransport::builder()
        .base_url(server.uri())
        .credentials(Credentials::token("tok-123"))
        .build()
        .unwrap();
    let controller =
        CustomHostnameController::new(ApiClient::from_transport(transport), Some(ZONE.to_string()));

    let registry = Arc::new(InMemoryRegistry::new());
    let tenant = registry.insert(Tenant::new("acme")).await.unwrap();
    let service = DomainService::new(registry.clone(), controller, Some("platform.com".to_string()));

    (service, registry, tenant)
}

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"success": true, "errors": [], "result": result}))
}

#[tokio::test]
async fn test_connect_persists_pending_hostname() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/zones/{ZONE}/custom_hostnames")))
        .respond_with(ok(json!({"id": "ch-1", "hostname": "shop.example.org", "status": "pending"})))
        .expect(1)
        .mount(&server)
        .await;

    let (service, registry, tenant) = setup(&server).await;
    let updated = service.connect(&tenant.id, "Shop.Example.org").await.unwrap();

    assert_eq!(updated.custom_hostname.as_deref(), Some("shop.example.org"));
    assert_eq!(updated.custom_hostname_status, Some(HostnameStatus::Pending));
    assert!(updated.modified_at > tenant.modified_at);

    let found = registry.find_by_hostname("shop.example.org").await.unwrap();
    assert_eq!(found.map(|t| t.id), Some(tenant.id));
}

#[tokio::test]
async fn test_connect_rejects_platform_hostnames() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let (service, _, tenant) = setup(&server).await;
    let err = service
        .connect(&tenant.id, "other.platform.com")
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::ReservedHostname(_)));
}

#[tokio::test]
async fn test_connect_rejects_taken_hostname() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let (service, registry, tenant) = setup(&server).await;
    registry
        .insert(Tenant::new("globex").with_custom_hostname("shop.example.org"))
        .await
        .unwrap();

    let err = service.connect(&tenant.id, "shop.example.org").await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Registry(RegistryError::HostnameTaken(_))
    ));
}

#[tokio::test]
async fn test_connect_fails_when_upstream_rejects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "errors": [{"code": 10000, "message": "Authentication error"}]
        })))
        .mount(&server)
        .await;

    let (service, registry, tenant) = setup(&server).await;
    let err = service.connect(&tenant.id, "shop.example.org").await.unwrap_err();

    assert!(matches!(err, DomainError::CreateFailed(_)));
    let stored = registry.get(&tenant.id).await.unwrap().unwrap();
    assert!(stored.custom_hostname.is_none());
}

#[tokio::test]
async fn test_refresh_records_status_change() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/zones/{ZONE}/custom_hostnames")))
        .respond_with(ok(json!([{
            "id": "ch-1",
            "hostname": "shop.example.org",
            "status": "active",
            "ssl": {"status": "active", "validation_method": "http"}
        }])))
        .mount(&server)
        .await;

    let (service, registry, tenant) = setup(&server).await;
    let mut connected = tenant.clone();
    connected.connect_hostname("shop.example.org");
    let connected = registry.update(connected).await.unwrap();

    let (refreshed, record) = service.refresh(&tenant.id).await.unwrap();
    assert!(record.is_active());
    assert_eq!(refreshed.custom_hostname_status, Some(HostnameStatus::Active));
    assert!(refreshed.modified_at > connected.modified_at);

    // unchanged status leaves modified_at alone
    let (again, _) = service.refresh(&tenant.id).await.unwrap();
    assert_eq!(again.modified_at, refreshed.modified_at);
}

#[tokio::test]
async fn test_refresh_without_hostname() {
    let server = MockServer::start().await;
    let (service, _, tenant) = setup(&server).await;

    let err = service.refresh(&tenant.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NoCustomHostname(_)));
}

#[tokio::test]
async fn test_disconnect_when_upstream_has_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/zones/{ZONE}/custom_hostnames")))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let (service, registry, tenant) = setup(&server).await;
    let mut connected = tenant.clone();
    connected.connect_hostname("shop.example.org");
    registry.update(connected).await.unwrap();

    let detached = service.disconnect(&tenant.id).await.unwrap();
    assert!(detached.custom_hostname.is_none());
    assert!(detached.custom_hostname_status.is_none());
}

#[tokio::test]
async fn test_disconnect_keeps_hostname_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/zones/{ZONE}/custom_hostnames")))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let (service, registry, tenant) = setup(&server).await;
    let mut connected = tenant.clone();
    connected.connect_hostname("shop.example.org");
    registry.update(connected).await.unwrap();

    let err = service.disconnect(&tenant.id).await.unwrap_err();
    assert!(matches!(err, DomainError::DeleteFailed { .. }));

    let stored = registry.get(&tenant.id).await.unwrap().unwrap();
    assert_eq!(stored.custom_hostname.as_deref(), Some("shop.example.org"));
}

#[tokio::test]
async fn test_connect_removes_previous_hostname_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/zones/{ZONE}/custom_hostnames")))
        .and(query_param("hostname", "old.example.org"))
        .respond_with(ok(json!([{"id": "ch-old", "hostname": "old.example.org", "status": "active"}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/zones/{ZONE}/custom_hostnames/ch-old")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/zones/{ZONE}/custom_hostnames")))
        .respond_with(ok(json!({"id": "ch-new", "hostname": "new.example.org", "status": "pending"})))
        .expect(1)
        .mount(&server)
        .await;

    let (service, registry, tenant) = setup(&server).await;
    let mut connected = tenant.clone();
    connected.connect_hostname("old.example.org");
    registry.update(connected).await.unwrap();

    let updated = service.connect(&tenant.id, "new.example.org").await.unwrap();
    assert_eq!(updated.custom_hostname.as_deref(), Some("new.example.org"));
    assert!(registry.find_by_hostname("old.example.org").await.unwrap().is_none());
}

#[tokio::test]
async fn test_connect_keeps_previous_hostname_when_removal_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/zones/{ZONE}/custom_hostnames")))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let (service, registry, tenant) = setup(&server).await;
    let mut connected = tenant.clone();
    connected.connect_hostname("old.example.org");
    registry.update(connected).await.unwrap();

    let err = service.connect(&tenant.id, "new.example.org").await.unwrap_err();
    assert!(matches!(err, DomainError::DeleteFailed { ref hostname, .. } if hostname == "old.example.org"));

    let stored = registry.get(&tenant.id).await.unwrap().unwrap();
    assert_eq!(stored.custom_hostname.as_deref(), Some("old.example.org"));
}

#[tokio::test]
async fn test_connect_same_hostname_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let (service, registry, tenant) = setup(&server).await;
    let mut connected = tenant.clone();
    connected.connect_hostname("shop.example.org");
    let connected = registry.update(connected).await.unwrap();

    let again = service.connect(&tenant.id, "shop.example.org").await.unwrap();
    assert_eq!(again, connected);
}

/// Registry whose updates always fail, as if another writer won a race
struct RejectingUpdates(InMemoryRegistry);

#[async_trait]
impl TenantRegistry for RejectingUpdates {
    async fn ensure_schema(&self) -> Result<(), RegistryError> {
        self.0.ensure_schema().await
    }

    async fn get(&self, id: &str) -> Result<Option<Tenant>, RegistryError> {
        self.0.get(id).await
    }

    async fn find_by_label(&self, label: &str) -> Result<Option<Tenant>, RegistryError> {
        self.0.find_by_label(label).await
    }

    async fn find_by_hostname(&self, hostname: &str) -> Result<Option<Tenant>, RegistryError> {
        self.0.find_by_hostname(hostname).await
    }

    async fn insert(&self, tenant: Tenant) -> Result<Tenant, RegistryError> {
        self.0.insert(tenant).await
    }

    async fn update(&self, tenant: Tenant) -> Result<Tenant, RegistryError> {
        Err(RegistryError::HostnameTaken(
            tenant.custom_hostname.unwrap_or_default(),
        ))
    }
}

#[tokio::test]
async fn test_connect_rolls_back_upstream_when_persisting_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/zones/{ZONE}/custom_hostnames")))
        .respond_with(ok(json!({"id": "ch-1", "hostname": "shop.example.org", "status": "pending"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/zones/{ZONE}/custom_hostnames")))
        .and(query_param("hostname", "shop.example.org"))
        .respond_with(ok(json!([{"id": "ch-1", "hostname": "shop.example.org", "status": "pending"}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/zones/{ZONE}/custom_hostnames/ch-1")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::builder()
        .base_url(server.uri())
        .credentials(Credentials::token("tok-123"))
        .build()
        .unwrap();
    let controller =
        CustomHostnameController::new(ApiClient::from_transport(transport), Some(ZONE.to_string()));
    let inner = InMemoryRegistry::new();
    let tenant = inner.insert(Tenant::new("acme")).await.unwrap();
    let service = DomainService::new(
        Arc::new(RejectingUpdates(inner)),
        controller,
        Some("platform.com".to_string()),
    );

    let err = service.connect(&tenant.id, "shop.example.org").await.unwrap_err();
    assert!(matches!(err, DomainError::Registry(RegistryError::HostnameTaken(_))));
}
