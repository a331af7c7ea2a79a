use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use cms_auth::Credentials;
use cms_core::{Filter, Query, StorageDriver, TenantId, UniqueIndex, DEFAULT_DATABASE};
use cms_server::{build_with, default_config, SharedState};
use cms_store::MemoryDriver;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN: (&str, &str) = ("admin", "admin");

struct TestServer {
    router: Router,
    state: SharedState,
}

async fn server_on(driver: Arc<dyn StorageDriver>) -> TestServer {
    let mut config = default_config();
    config.set("auth.hash_cost", "4");
    config.set("auth.secret", "integration-secret");
    let server = build_with(config.snapshot(), driver).await.unwrap();
    let state = Arc::clone(&server.state);
    TestServer {
        router: server.router(),
        state,
    }
}

async fn server() -> (TestServer, MemoryDriver) {
    let driver = MemoryDriver::new();
    (server_on(Arc::new(driver.clone())).await, driver)
}

fn request(method: &str, uri: &str, auth: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user, password)) = auth {
        builder = builder.header("authorization", Credentials::basic_header(user, password));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (u16, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status().as_u16();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn create_tenant(app: &Router, username: &str, role: &str) -> String {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/tenants",
            Some(ADMIN),
            Some(json!({
                "name": format!("{username} inc"),
                "username": username,
                "password": "secret",
                "role": role,
            })),
        ),
    )
    .await;
    assert_eq!(status, 201, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn create_contact(app: &Router, user: &str, name: &str, phone: &str) -> Value {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/contacts",
            Some((user, "secret")),
            Some(json!({"contactName": name, "phone": phone})),
        ),
    )
    .await;
    assert_eq!(status, 201, "{body}");
    body
}

#[tokio::test]
async fn health_is_public() {
    let (srv, _) = server().await;
    let res = srv
        .router
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
}

#[tokio::test]
async fn protected_paths_need_credentials() {
    let (srv, _) = server().await;

    let (status, body) = send(&srv.router, request("GET", "/contacts", None, None)).await;
    assert_eq!(status, 401);
    assert_eq!(body["name"], "NotAuthenticated");

    let (status, _) = send(&srv.router, request("GET", "/contacts", Some(("admin", "wrong")), None)).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn creating_a_user_tenant_provisions_its_database() {
    let (srv, driver) = server().await;
    let id = create_tenant(&srv.router, "alice", "USER").await;

    let (status, body) = send(&srv.router, request("GET", &format!("/tenants/{id}"), Some(ADMIN), None)).await;
    assert_eq!(status, 200);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "USER");
    assert!(body.get("password").is_none());

    assert!(srv.state.tenants.lifecycle().is_provisioned(&TenantId::new(&id)).await.unwrap());
    let mut collections = driver.collection_names(&format!("tenant_{id}")).await.unwrap();
    collections.sort();
    assert_eq!(collections, vec!["categories", "contacts"]);
}

#[tokio::test]
async fn admin_tenants_get_no_database() {
    let (srv, driver) = server().await;
    let id = create_tenant(&srv.router, "ops", "admin").await;

    assert!(!srv.state.tenants.lifecycle().is_provisioned(&TenantId::new(&id)).await.unwrap());
    assert!(!driver.database_exists(&format!("tenant_{id}")).await.unwrap());
}

#[tokio::test]
async fn duplicate_usernames_conflict() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;

    let (status, body) = send(
        &srv.router,
        request(
            "POST",
            "/tenants",
            Some(ADMIN),
            Some(json!({"name": "other", "username": "alice", "password": "x"})),
        ),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["message"], "Username already exists: alice");
}

#[tokio::test]
async fn roles_are_enforced_per_route() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;

    let (status, _) = send(&srv.router, request("GET", "/tenants", Some(("alice", "secret")), None)).await;
    assert_eq!(status, 403);

    let (status, body) = send(&srv.router, request("GET", "/contacts", Some(ADMIN), None)).await;
    assert_eq!(status, 403);
    assert_eq!(body["name"], "Forbidden");
}

#[tokio::test]
async fn contact_crud_with_validation_and_conflicts() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;
    let alice = Some(("alice", "secret"));

    let (status, body) = send(
        &srv.router,
        request("POST", "/contacts", alice, Some(json!({"contactName": " ", "email": "nope"}))),
    )
    .await;
    assert_eq!(status, 422);
    assert_eq!(body["errors"]["contactName"], json!(["Contact name is required"]));
    assert_eq!(body["errors"]["phone"], json!(["Phone number is required"]));
    assert_eq!(body["errors"]["email"], json!(["Invalid email format"]));

    let contact = create_contact(&srv.router, "alice", "Ada Lovelace", "555-0100").await;
    let id = contact["id"].as_str().unwrap();
    assert_eq!(contact["categoryIds"], json!([]));

    let (status, body) = send(
        &srv.router,
        request("POST", "/contacts", alice, Some(json!({"contactName": "Ada", "phone": "555-0100"}))),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["message"], "Contact with phone number 555-0100 already exists");

    let (status, body) = send(
        &srv.router,
        request("PATCH", &format!("/contacts/{id}"), alice, Some(json!({"email": "ada@example.com"}))),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["contactName"], "Ada Lovelace");

    let (status, _) = send(&srv.router, request("DELETE", &format!("/contacts/{id}"), alice, None)).await;
    assert_eq!(status, 200);

    let (status, body) = send(&srv.router, request("GET", &format!("/contacts/{id}"), alice, None)).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], format!("Contact not found with id: {id}"));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;

    let req = Request::builder()
        .method("POST")
        .uri("/contacts")
        .header("authorization", Credentials::basic_header("alice", "secret"))
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&srv.router, req).await;
    assert_eq!(status, 400);
    assert_eq!(body["name"], "BadRequest");
}

#[tokio::test]
async fn tenants_only_see_their_own_contacts() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;
    create_tenant(&srv.router, "bob", "USER").await;

    create_contact(&srv.router, "alice", "Ada", "555-0100").await;
    // Phone uniqueness is per tenant.
    create_contact(&srv.router, "bob", "Brian", "555-0100").await;
    create_contact(&srv.router, "bob", "Barbara", "555-0101").await;

    let (_, alice_page) = send(&srv.router, request("GET", "/contacts", Some(("alice", "secret")), None)).await;
    assert_eq!(alice_page["totalElements"], 1);
    assert_eq!(alice_page["content"][0]["contactName"], "Ada");

    let (_, bob_page) = send(&srv.router, request("GET", "/contacts", Some(("bob", "secret")), None)).await;
    assert_eq!(bob_page["totalElements"], 2);
}

#[tokio::test]
async fn categories_link_to_contacts_both_ways() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;
    let alice = Some(("alice", "secret"));

    let (status, category) = send(
        &srv.router,
        request("POST", "/categories", alice, Some(json!({"categoryName": "Friends"}))),
    )
    .await;
    assert_eq!(status, 201);
    let category_id = category["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &srv.router,
        request("POST", "/categories", alice, Some(json!({"categoryName": "friends"}))),
    )
    .await;
    assert_eq!(status, 409);

    let (status, body) = send(
        &srv.router,
        request(
            "POST",
            "/contacts",
            alice,
            Some(json!({"contactName": "Ada", "phone": "1", "categoryIds": ["missing"]})),
        ),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Category not found with id: missing");

    let contact = create_contact(&srv.router, "alice", "Ada", "1").await;
    create_contact(&srv.router, "alice", "Grace", "2").await;
    let contact_id = contact["id"].as_str().unwrap().to_string();
    let link = format!("/contacts/{contact_id}/categories/{category_id}");

    let (status, body) = send(&srv.router, request("POST", &link, alice, None)).await;
    assert_eq!(status, 200);
    assert_eq!(body["categoryIds"], json!([category_id]));

    let (status, body) = send(&srv.router, request("POST", &link, alice, None)).await;
    assert_eq!(status, 409);
    assert_eq!(body["message"], "Category already assigned to contact");

    let (_, by_category) = send(&srv.router, request("GET", "/contacts?categoryName=FRI", alice, None)).await;
    assert_eq!(by_category["totalElements"], 1);
    assert_eq!(by_category["content"][0]["contactName"], "Ada");

    let (_, none) = send(&srv.router, request("GET", "/contacts?categoryName=family", alice, None)).await;
    assert_eq!(none["totalElements"], 0);
    assert_eq!(none["empty"], true);

    let (_, of_contact) = send(
        &srv.router,
        request("GET", &format!("/contacts/{contact_id}/categories"), alice, None),
    )
    .await;
    assert_eq!(of_contact["content"][0]["categoryName"], "Friends");

    let (_, in_category) = send(
        &srv.router,
        request("GET", &format!("/categories/{category_id}/contacts?contactName=ad"), alice, None),
    )
    .await;
    assert_eq!(in_category["totalElements"], 1);

    let (status, _) = send(&srv.router, request("GET", "/categories/nope/contacts", alice, None)).await;
    assert_eq!(status, 404);

    let (status, _) = send(&srv.router, request("DELETE", &link, alice, None)).await;
    assert_eq!(status, 200);
    let (status, body) = send(&srv.router, request("DELETE", &link, alice, None)).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Category not associated with this contact");
}

#[tokio::test]
async fn deleting_a_category_unlinks_it() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;
    let alice = Some(("alice", "secret"));

    let (_, category) = send(
        &srv.router,
        request("POST", "/categories", alice, Some(json!({"categoryName": "Work"}))),
    )
    .await;
    let category_id = category["id"].as_str().unwrap();
    let (_, contact) = send(
        &srv.router,
        request(
            "POST",
            "/contacts",
            alice,
            Some(json!({"contactName": "Ada", "phone": "1", "categoryIds": [category_id]})),
        ),
    )
    .await;

    let (status, _) = send(&srv.router, request("DELETE", &format!("/categories/{category_id}"), alice, None)).await;
    assert_eq!(status, 200);

    let (_, contact) = send(
        &srv.router,
        request("GET", &format!("/contacts/{}", contact["id"].as_str().unwrap()), alice, None),
    )
    .await;
    assert_eq!(contact["categoryIds"], json!([]));
}

#[tokio::test]
async fn listing_is_paged_and_sorted() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;
    for (name, phone) in [("Ada", "1"), ("Grace", "2"), ("Barbara", "3")] {
        create_contact(&srv.router, "alice", name, phone).await;
    }

    let (status, page) = send(
        &srv.router,
        request(
            "GET",
            "/contacts?page=0&pageSize=2&sortBy=contactName&sortOrder=DESC",
            Some(("alice", "secret")),
            None,
        ),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(page["totalElements"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["numberOfElements"], 2);
    assert_eq!(page["first"], true);
    assert_eq!(page["last"], false);
    assert_eq!(page["content"][0]["contactName"], "Grace");
    assert_eq!(page["content"][1]["contactName"], "Barbara");

    let (status, _) = send(
        &srv.router,
        request("GET", "/contacts?sortOrder=sideways", Some(("alice", "secret")), None),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn tenant_names_stay_unique_on_update() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;
    let bob = create_tenant(&srv.router, "bob", "USER").await;

    let (status, body) = send(
        &srv.router,
        request("PATCH", &format!("/tenants/{bob}"), Some(ADMIN), Some(json!({"name": "ALICE INC"}))),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["message"], "Tenant with name: ALICE INC already exists");

    let (status, body) = send(
        &srv.router,
        request("PATCH", &format!("/tenants/{bob}"), Some(ADMIN), Some(json!({"description": "builders"}))),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["description"], "builders");
    assert_eq!(body["name"], "bob inc");
}

#[tokio::test]
async fn deleting_a_tenant_drops_database_and_access() {
    let (srv, driver) = server().await;
    let id = create_tenant(&srv.router, "alice", "USER").await;
    create_contact(&srv.router, "alice", "Ada", "1").await;

    let (status, _) = send(&srv.router, request("DELETE", &format!("/tenants/{id}"), Some(ADMIN), None)).await;
    assert_eq!(status, 200);

    assert!(!driver.database_exists(&format!("tenant_{id}")).await.unwrap());
    let (status, _) = send(&srv.router, request("GET", "/contacts", Some(("alice", "secret")), None)).await;
    assert_eq!(status, 401);
    let (status, _) = send(&srv.router, request("GET", &format!("/tenants/{id}"), Some(ADMIN), None)).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn bearer_tokens_from_login_are_accepted() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;

    let (status, body) = send(
        &srv.router,
        request(
            "POST",
            "/authentication",
            None,
            Some(json!({"username": "alice", "password": "secret"})),
        ),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["tokenType"], "Bearer");
    let token = body["accessToken"].as_str().unwrap();

    let req = Request::builder()
        .uri("/contacts")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&srv.router, req).await;
    assert_eq!(status, 200);

    let (status, body) = send(
        &srv.router,
        request(
            "POST",
            "/authentication",
            None,
            Some(json!({"username": "alice", "password": "nope"})),
        ),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Invalid login");
}

/// Memory driver whose database drops and category collection creation
/// can be made to fail.
#[derive(Clone, Default)]
struct StubbornDriver {
    inner: MemoryDriver,
    refuse_drops: Arc<AtomicBool>,
    refuse_categories: Arc<AtomicBool>,
}

#[async_trait]
impl StorageDriver for StubbornDriver {
    async fn database_names(&self) -> Result<Vec<String>> {
        self.inner.database_names().await
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>> {
        self.inner.collection_names(database).await
    }

    async fn create_collection(&self, database: &str, collection: &str) -> Result<()> {
        if collection == "categories" && self.refuse_categories.load(Ordering::SeqCst) {
            anyhow::bail!("quota exceeded");
        }
        self.inner.create_collection(database, collection).await
    }

    async fn create_unique_index(&self, database: &str, collection: &str, index: &UniqueIndex) -> Result<()> {
        self.inner.create_unique_index(database, collection, index).await
    }

    async fn drop_database(&self, database: &str) -> Result<()> {
        if self.refuse_drops.load(Ordering::SeqCst) {
            anyhow::bail!("server selection timeout");
        }
        self.inner.drop_database(database).await
    }

    async fn insert(&self, database: &str, collection: &str, document: Value) -> Result<()> {
        self.inner.insert(database, collection, document).await
    }

    async fn find(&self, database: &str, collection: &str, query: &Query) -> Result<Vec<Value>> {
        self.inner.find(database, collection, query).await
    }

    async fn count(&self, database: &str, collection: &str, filter: &Filter) -> Result<u64> {
        self.inner.count(database, collection, filter).await
    }

    async fn replace(&self, database: &str, collection: &str, id: &str, document: Value) -> Result<bool> {
        self.inner.replace(database, collection, id, document).await
    }

    async fn delete(&self, database: &str, collection: &str, id: &str) -> Result<bool> {
        self.inner.delete(database, collection, id).await
    }
}

#[tokio::test]
async fn failed_drop_keeps_the_tenant_record() {
    let driver = StubbornDriver::default();
    let srv = server_on(Arc::new(driver.clone())).await;
    let id = create_tenant(&srv.router, "alice", "USER").await;

    driver.refuse_drops.store(true, Ordering::SeqCst);
    let (status, body) = send(&srv.router, request("DELETE", &format!("/tenants/{id}"), Some(ADMIN), None)).await;
    assert_eq!(status, 503);
    assert_eq!(body["name"], "Unavailable");

    let (status, _) = send(&srv.router, request("GET", &format!("/tenants/{id}"), Some(ADMIN), None)).await;
    assert_eq!(status, 200);
    let (status, _) = send(&srv.router, request("GET", "/contacts", Some(("alice", "secret")), None)).await;
    assert_eq!(status, 200);

    driver.refuse_drops.store(false, Ordering::SeqCst);
    let (status, _) = send(&srv.router, request("DELETE", &format!("/tenants/{id}"), Some(ADMIN), None)).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn failed_provisioning_leaves_no_database_or_record() {
    let driver = StubbornDriver::default();
    let srv = server_on(Arc::new(driver.clone())).await;

    driver.refuse_categories.store(true, Ordering::SeqCst);
    let (status, body) = send(
        &srv.router,
        request(
            "POST",
            "/tenants",
            Some(ADMIN),
            Some(json!({"name": "Alice", "username": "alice", "password": "secret"})),
        ),
    )
    .await;
    assert_eq!(status, 503, "{body}");
    assert_eq!(body["name"], "Unavailable");

    assert_eq!(driver.database_names().await.unwrap(), vec![DEFAULT_DATABASE.to_string()]);
    assert!(srv.state.tenants.find_by_username("alice").await.unwrap().is_none());

    // Nothing is left behind to block a retry.
    driver.refuse_categories.store(false, Ordering::SeqCst);
    create_tenant(&srv.router, "alice", "USER").await;
}

async fn race<F>(app: &Router, attempts: usize, make: F) -> Vec<u16>
where
    F: Fn(usize) -> Request<Body>,
{
    let handles: Vec<_> = (0..attempts)
        .map(|n| {
            let app = app.clone();
            let req = make(n);
            tokio::spawn(async move { send(&app, req).await.0 })
        })
        .collect();
    let mut statuses = Vec::with_capacity(attempts);
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }
    statuses.sort_unstable();
    statuses
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tenant_creation_keeps_usernames_unique() {
    let (srv, driver) = server().await;

    for round in 0..5 {
        let username = format!("bob{round}");
        let statuses = race(&srv.router, 4, |n| {
            request(
                "POST",
                "/tenants",
                Some(ADMIN),
                Some(json!({"name": format!("Bob {n}"), "username": username, "password": "secret"})),
            )
        })
        .await;
        assert_eq!(statuses, vec![201, 409, 409, 409], "round {round}");

        let stored = driver
            .count(DEFAULT_DATABASE, "tenants", &Filter::new().eq("username", username.as_str()))
            .await
            .unwrap();
        assert_eq!(stored, 1);
    }

    // The admin database plus one database per created tenant.
    assert_eq!(driver.database_names().await.unwrap().len(), 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_contacts_and_categories_stay_unique() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;
    let alice = Some(("alice", "secret"));

    let statuses = race(&srv.router, 4, |n| {
        request(
            "POST",
            "/contacts",
            alice,
            Some(json!({"contactName": format!("Caller {n}"), "phone": "+15550100"})),
        )
    })
    .await;
    assert_eq!(statuses, vec![201, 409, 409, 409]);

    let names = ["Family", "FAMILY", "family", "FaMiLy"];
    let statuses = race(&srv.router, names.len(), |n| {
        request("POST", "/categories", alice, Some(json!({"categoryName": names[n]})))
    })
    .await;
    assert_eq!(statuses, vec![201, 409, 409, 409]);

    let (_, contacts) = send(&srv.router, request("GET", "/contacts", alice, None)).await;
    assert_eq!(contacts["totalElements"], 1);
    let (_, categories) = send(&srv.router, request("GET", "/categories", alice, None)).await;
    assert_eq!(categories["totalElements"], 1);
}

#[tokio::test]
async fn updates_cannot_take_a_held_phone() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;
    let alice = Some(("alice", "secret"));

    create_contact(&srv.router, "alice", "Ann", "+1").await;
    let bea = create_contact(&srv.router, "alice", "Bea", "+2").await;
    let uri = format!("/contacts/{}", bea["id"].as_str().unwrap());
    let (status, body) = send(&srv.router, request("PATCH", &uri, alice, Some(json!({"phone": "+1"})))).await;
    assert_eq!(status, 409);
    assert_eq!(body["message"], "Contact with phone number +1 already exists");
}

#[tokio::test]
async fn tenant_locks_are_released_after_use() {
    let (srv, _) = server().await;
    let lifecycle = srv.state.tenants.lifecycle();

    let (status, _) = send(
        &srv.router,
        request("PATCH", "/tenants/missing", Some(ADMIN), Some(json!({"name": "x"}))),
    )
    .await;
    assert_eq!(status, 404);
    let (status, _) = send(&srv.router, request("DELETE", "/tenants/missing", Some(ADMIN), None)).await;
    assert_eq!(status, 404);
    assert_eq!(lifecycle.locked_tenants(), 0);

    let id = create_tenant(&srv.router, "alice", "USER").await;
    let (status, _) = send(&srv.router, request("DELETE", &format!("/tenants/{id}"), Some(ADMIN), None)).await;
    assert_eq!(status, 200);
    assert_eq!(lifecycle.locked_tenants(), 0);
}

#[tokio::test]
async fn largest_page_number_is_an_empty_last_page() {
    let (srv, _) = server().await;
    create_tenant(&srv.router, "alice", "USER").await;
    create_contact(&srv.router, "alice", "Ann", "+1").await;

    let uri = format!("/contacts?page={}", u64::MAX);
    let (status, body) = send(&srv.router, request("GET", &uri, Some(("alice", "secret")), None)).await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["last"], true);
    assert_eq!(body["content"], json!([]));

    let uri = format!("/tenants?page={}", u64::MAX);
    let (status, _) = send(&srv.router, request("GET", &uri, Some(ADMIN), None)).await;
    assert_eq!(status, 200);
}
