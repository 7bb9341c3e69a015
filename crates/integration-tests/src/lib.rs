//! In-process stub of the Soil2Spoon REST backend.
//!
//! The stub serves the endpoints the client uses from memory, records every
//! request, and can hold requests for one path behind a gate so tests can
//! observe in-flight behavior.
//!
//! # Seed data
//!
//! | User | Email | Password | Role | Token |
//! |---|---|---|---|---|
//! | 1 | `asha@soil2spoon.in` | `masala123` | USER | `token-asha` |
//! | 2 | `admin@soil2spoon.in` | `admin123` | ADMIN | `token-admin` |
//!
//! Products 7 (Mango Pickle, ₹249), 8 (Garam Masala, ₹120) and 9 (Ginger
//! Garlic Paste, ₹99). User 1's server cart holds two Mango Pickles.
//!
//! Besides the real API the stub serves a few fixtures under `/test/`:
//! `text` (plain text), `missing` (404 JSON), `broken` (500 text),
//! `empty-error` (500, no body) and `no-content` (204).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use soil2spoon_storefront::{MemoryTokenStore, Storefront, StorefrontConfig, TokenStore};

/// A request as the stub saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone)]
struct StubUser {
    id: i64,
    email: String,
    password: String,
    name: String,
    role: &'static str,
    token: String,
}

impl StubUser {
    fn profile(&self) -> Value {
        json!({
            "id": self.id.to_string(),
            "email": self.email,
            "name": self.name,
            "role": self.role,
        })
    }
}

#[derive(Debug, Clone)]
struct StubProduct {
    id: i64,
    name: &'static str,
    slug: &'static str,
    price: i64,
    category: &'static str,
}

impl StubProduct {
    fn json(&self) -> Value {
        json!({
            "id": self.id.to_string(),
            "name": self.name,
            "slug": self.slug,
            "price": self.price,
            "category": self.category,
            "image": format!("/images/{}.jpg", self.slug),
            "images": [],
        })
    }
}

#[derive(Default)]
struct StubData {
    users: Vec<StubUser>,
    products: Vec<StubProduct>,
    /// User id -> (product id, quantity) lines.
    carts: HashMap<i64, Vec<(i64, u32)>>,
    orders: Vec<(i64, Value)>,
    addresses: Vec<(i64, Value)>,
    next_id: i64,
}

struct StubState {
    data: Mutex<StubData>,
    requests: Mutex<Vec<RecordedRequest>>,
    cart_puts: Mutex<Vec<Value>>,
    gated_path: Mutex<Option<String>>,
    gate: watch::Sender<bool>,
}

impl StubState {
    fn data(&self) -> MutexGuard<'_, StubData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn authed(&self, headers: &HeaderMap) -> Result<StubUser, Response> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        token
            .and_then(|token| self.data().users.iter().find(|u| u.token == token).cloned())
            .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Unauthorized"))
    }

    fn cart_json(&self, user_id: i64) -> Value {
        let data = self.data();
        let lines = data.carts.get(&user_id).cloned().unwrap_or_default();
        let items: Vec<Value> = lines
            .iter()
            .filter_map(|(product_id, quantity)| {
                data.products.iter().find(|p| p.id == *product_id).map(|p| {
                    json!({
                        "id": p.id.to_string(),
                        "name": p.name,
                        "slug": p.slug,
                        "price": p.price,
                        "image": format!("/images/{}.jpg", p.slug),
                        "fallbackImage": null,
                        "quantity": quantity,
                    })
                })
            })
            .collect();
        Value::Array(items)
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// A running stub backend. Stops when dropped.
pub struct StubBackend {
    addr: SocketAddr,
    state: Arc<StubState>,
    server: JoinHandle<()>,
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl StubBackend {
    /// Bind to an ephemeral port on localhost and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let (gate, _) = watch::channel(true);
        let state = Arc::new(StubState {
            data: Mutex::new(seed()),
            requests: Mutex::new(Vec::new()),
            cart_puts: Mutex::new(Vec::new()),
            gated_path: Mutex::new(None),
            gate,
        });

        let app = router(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub backend");
        let addr = listener.local_addr().expect("Stub backend has no address");
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Stub backend stopped");
            }
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL to point a client at.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration targeting this stub.
    ///
    /// # Panics
    ///
    /// Never in practice; the URL is always valid.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig::new(&self.url()).expect("Stub URL is valid")
    }

    /// A fresh client with no persisted token.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        self.storefront_with(Arc::new(MemoryTokenStore::default()))
    }

    /// A fresh client with the given token store.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn storefront_with(&self, tokens: Arc<dyn TokenStore>) -> Storefront {
        Storefront::new(self.config(), tokens).expect("Failed to build storefront")
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received for `method` and `path`.
    #[must_use]
    pub fn hits(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Bodies of every `PUT /api/cart`, in arrival order.
    #[must_use]
    pub fn cart_puts(&self) -> Vec<Value> {
        self.state
            .cart_puts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The server cart of `user_id` as `(product id, quantity)` lines.
    #[must_use]
    pub fn server_cart(&self, user_id: i64) -> Vec<(i64, u32)> {
        self.state
            .data()
            .carts
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Overwrite the server cart of `user_id`.
    pub fn set_server_cart(&self, user_id: i64, lines: Vec<(i64, u32)>) {
        self.state.data().carts.insert(user_id, lines);
    }

    /// Hold every request to `path` until [`StubBackend::release`].
    pub fn hold(&self, path: &str) {
        *self
            .state
            .gated_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(path.to_string());
        self.state.gate.send_replace(false);
    }

    /// Let held requests through.
    pub fn release(&self) {
        self.state.gate.send_replace(true);
    }

    /// Wait until at least `count` requests for `method` and `path` arrived.
    ///
    /// # Panics
    ///
    /// Panics after five seconds.
    pub async fn wait_for_hits(&self, method: &str, path: &str, count: usize) {
        for _ in 0..500 {
            if self.hits(method, path) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {count} x {method} {path}");
    }
}

fn seed() -> StubData {
    let users = vec![
        StubUser {
            id: 1,
            email: "asha@soil2spoon.in".to_string(),
            password: "masala123".to_string(),
            name: "Asha".to_string(),
            role: "USER",
            token: "token-asha".to_string(),
        },
        StubUser {
            id: 2,
            email: "admin@soil2spoon.in".to_string(),
            password: "admin123".to_string(),
            name: "Admin".to_string(),
            role: "ADMIN",
            token: "token-admin".to_string(),
        },
    ];
    let products = vec![
        StubProduct {
            id: 7,
            name: "Mango Pickle",
            slug: "mango-pickle",
            price: 249,
            category: "pickles",
        },
        StubProduct {
            id: 8,
            name: "Garam Masala",
            slug: "garam-masala",
            price: 120,
            category: "spices",
        },
        StubProduct {
            id: 9,
            name: "Ginger Garlic Paste",
            slug: "ginger-garlic-paste",
            price: 99,
            category: "pastes",
        },
    ];
    StubData {
        users,
        products,
        carts: HashMap::from([(1, vec![(7, 2)])]),
        orders: Vec::new(),
        addresses: Vec::new(),
        next_id: 100,
    }
}

// =============================================================================
// Router
// =============================================================================

fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/me", get(me))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/cart", get(get_cart).put(put_cart))
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/products", get(list_products))
        .route("/api/products/featured", get(featured))
        .route("/api/products/trending", get(trending))
        .route("/api/products/{key}", get(get_product))
        .route("/api/products/{key}/reviews", get(list_reviews))
        .route("/api/categories", get(categories))
        .route("/api/faqs", get(faqs))
        .route("/api/content/contact", get(contact))
        .route("/api/addresses", get(list_addresses).post(create_address))
        .route("/api/addresses/{id}", delete(delete_address))
        .route("/api/admin/products", post(admin_create_product))
        .route("/api/admin/products/{id}", delete(admin_delete_product))
        .route("/test/text", get(|| async { "pong" }))
        .route(
            "/test/missing",
            get(|| async { error(StatusCode::NOT_FOUND, "not found") }),
        )
        .route(
            "/test/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database exploded") }),
        )
        .route(
            "/test/empty-error",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route("/test/no-content", get(|| async { StatusCode::NO_CONTENT }))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            record_and_gate,
        ))
        .with_state(state)
}

/// Record the request, then wait at the gate if its path is held.
async fn record_and_gate(
    State(state): State<Arc<StubState>>,
    request: Request,
    next: Next,
) -> Response {
    // Scoped so nothing borrowing the request lives across an await.
    let recorded = {
        let header_value = |name: header::HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(str::to_owned),
            authorization: header_value(header::AUTHORIZATION),
            content_type: header_value(header::CONTENT_TYPE),
        }
    };

    let held = state
        .gated_path
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_deref()
        == Some(recorded.path.as_str());

    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(recorded);

    if held {
        let mut gate = state.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
    }

    next.run(request).await
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
    #[serde(default)]
    name: Option<String>,
}

async fn login(State(state): State<Arc<StubState>>, Json(body): Json<Credentials>) -> Response {
    let data = state.data();
    data.users
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
        .map_or_else(
            || error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
            |u| Json(json!({ "token": u.token, "user": u.profile() })).into_response(),
        )
}

async fn signup(State(state): State<Arc<StubState>>, Json(body): Json<Credentials>) -> Response {
    let mut data = state.data();
    if data.users.iter().any(|u| u.email == body.email) {
        return error(StatusCode::BAD_REQUEST, "Email already registered");
    }
    data.next_id += 1;
    let user = StubUser {
        id: data.next_id,
        email: body.email,
        password: body.password,
        name: body.name.unwrap_or_default(),
        role: "USER",
        token: format!("token-{}", data.next_id),
    };
    let response = json!({ "token": user.token, "user": user.profile() });
    data.users.push(user);
    Json(response).into_response()
}

async fn me(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    match state.authed(&headers) {
        Ok(user) => Json(user.profile()).into_response(),
        Err(response) => response,
    }
}

async fn forgot_password(Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    Json(json!({
        "message": "If an account exists, a reset link has been sent.",
        "resetLink": format!("http://localhost:5173/reset-password?token=reset-{email}"),
    }))
    .into_response()
}

async fn reset_password(Json(body): Json<Value>) -> Response {
    if body.get("token").and_then(Value::as_str) == Some("reset-ok") {
        Json(json!({ "message": "Password updated" })).into_response()
    } else {
        error(StatusCode::BAD_REQUEST, "Invalid or expired reset token")
    }
}

// =============================================================================
// Cart and orders
// =============================================================================

async fn get_cart(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    match state.authed(&headers) {
        Ok(user) => Json(state.cart_json(user.id)).into_response(),
        Err(response) => response,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartLine {
    product_id: i64,
    quantity: u32,
}

async fn put_cart(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let user = match state.authed(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    state
        .cart_puts
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(body.clone());

    let Ok(lines) = serde_json::from_value::<Vec<CartLine>>(body) else {
        return error(StatusCode::BAD_REQUEST, "Invalid cart");
    };
    state.data().carts.insert(
        user.id,
        lines
            .into_iter()
            .map(|l| (l.product_id, l.quantity))
            .collect(),
    );
    Json(state.cart_json(user.id)).into_response()
}

async fn list_orders(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    let user = match state.authed(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let orders: Vec<Value> = state
        .data()
        .orders
        .iter()
        .filter(|(owner, _)| *owner == user.id)
        .map(|(_, order)| order.clone())
        .collect();
    Json(Value::Array(orders)).into_response()
}

async fn create_order(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let user = match state.authed(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let cart = state.cart_json(user.id);
    let items = cart.as_array().cloned().unwrap_or_default();
    if items.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Cart is empty");
    }

    let total: i64 = items
        .iter()
        .map(|i| i["price"].as_i64().unwrap_or_default() * i["quantity"].as_i64().unwrap_or_default())
        .sum();
    let order_items: Vec<Value> = items
        .iter()
        .map(|i| {
            json!({
                "productId": i["id"],
                "name": i["name"],
                "slug": i["slug"],
                "price": i["price"],
                "quantity": i["quantity"],
            })
        })
        .collect();

    let mut data = state.data();
    data.next_id += 1;
    let order = json!({
        "id": data.next_id.to_string(),
        "orderDate": "2025-03-01T10:15:30Z",
        "totalAmount": total,
        "status": "PENDING",
        "items": order_items,
        "shippingName": body.get("shippingName"),
        "shippingCity": body.get("shippingCity"),
        "paymentMethod": body.get("paymentMethod"),
    });
    data.orders.push((user.id, order.clone()));
    data.carts.insert(user.id, Vec::new());
    Json(order).into_response()
}

// =============================================================================
// Catalog and content
// =============================================================================

#[derive(Deserialize)]
struct ProductsQuery {
    category: Option<String>,
    #[serde(default)]
    page: usize,
    #[serde(default = "default_size")]
    size: usize,
}

const fn default_size() -> usize {
    20
}

async fn list_products(
    State(state): State<Arc<StubState>>,
    Query(query): Query<ProductsQuery>,
) -> Response {
    let data = state.data();
    let matching: Vec<Value> = data
        .products
        .iter()
        .filter(|p| query.category.as_deref().is_none_or(|c| c == p.category))
        .map(StubProduct::json)
        .collect();
    let total = matching.len();
    let size = query.size.max(1);
    let content: Vec<Value> = matching
        .into_iter()
        .skip(query.page * size)
        .take(size)
        .collect();
    Json(json!({
        "content": content,
        "totalElements": total,
        "totalPages": total.div_ceil(size),
        "number": query.page,
        "size": size,
    }))
    .into_response()
}

async fn featured(State(state): State<Arc<StubState>>) -> Response {
    let data = state.data();
    Json(data.products.first().map(StubProduct::json).into_iter().collect::<Vec<_>>())
        .into_response()
}

async fn trending(State(state): State<Arc<StubState>>) -> Response {
    let data = state.data();
    Json(data.products.iter().skip(1).map(StubProduct::json).collect::<Vec<_>>())
        .into_response()
}

async fn get_product(State(state): State<Arc<StubState>>, Path(key): Path<String>) -> Response {
    let data = state.data();
    data.products
        .iter()
        .find(|p| p.slug == key)
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "Product not found"),
            |p| Json(p.json()).into_response(),
        )
}

async fn list_reviews(Path(key): Path<String>) -> Response {
    if key == "7" {
        Json(json!([{
            "id": "1",
            "author": "Meera",
            "rating": 5,
            "date": "2025-02-11",
            "text": "Just like home.",
            "ownedByCurrentUser": false,
        }]))
        .into_response()
    } else {
        Json(json!([])).into_response()
    }
}

async fn categories() -> Response {
    Json(json!([
        { "id": "spices", "name": "Spices", "icon": "🌶" },
        { "id": "pastes", "name": "Pastes", "icon": null },
        { "id": "pickles", "name": "Pickles", "icon": null },
    ]))
    .into_response()
}

async fn faqs() -> Response {
    Json(json!([{
        "id": "1",
        "question": "Do you ship across India?",
        "answer": "Yes, to every serviceable pincode.",
    }]))
    .into_response()
}

async fn contact() -> Response {
    Json(json!({
        "email": "care@soil2spoon.in",
        "phone": "+91 98765 43210",
        "address": "Pune, Maharashtra",
        "hours": "Mon-Sat 10am-6pm",
    }))
    .into_response()
}

// =============================================================================
// Addresses and admin
// =============================================================================

async fn list_addresses(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    let user = match state.authed(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let addresses: Vec<Value> = state
        .data()
        .addresses
        .iter()
        .filter(|(owner, _)| *owner == user.id)
        .map(|(_, a)| a.clone())
        .collect();
    Json(Value::Array(addresses)).into_response()
}

async fn create_address(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    let user = match state.authed(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut data = state.data();
    data.next_id += 1;
    body["id"] = json!(data.next_id.to_string());
    if body.get("isDefault").is_none() {
        body["isDefault"] = json!(false);
    }
    data.addresses.push((user.id, body.clone()));
    Json(body).into_response()
}

async fn delete_address(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let user = match state.authed(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut data = state.data();
    let before = data.addresses.len();
    data.addresses
        .retain(|(owner, a)| !(*owner == user.id && a["id"] == json!(id)));
    if data.addresses.len() == before {
        error(StatusCode::NOT_FOUND, "Address not found")
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

fn require_admin(state: &StubState, headers: &HeaderMap) -> Result<StubUser, Response> {
    let user = state.authed(headers)?;
    if user.role == "ADMIN" {
        Ok(user)
    } else {
        Err(error(StatusCode::FORBIDDEN, "Forbidden"))
    }
}

async fn admin_create_product(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    let mut data = state.data();
    data.next_id += 1;
    body["id"] = json!(data.next_id.to_string());
    Json(body).into_response()
}

async fn admin_delete_product(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    let mut data = state.data();
    let before = data.products.len();
    data.products.retain(|p| p.id != id);
    if data.products.len() == before {
        error(StatusCode::NOT_FOUND, "Product not found")
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}
