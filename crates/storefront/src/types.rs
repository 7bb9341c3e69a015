//! Wire types for the Soil2Spoon REST API.
//!
//! Field names follow the backend's camelCase JSON. IDs come from
//! `soil2spoon_core` and accept both the string and numeric encodings the
//! backend uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use soil2spoon_core::{
    AddressId, CategoryId, Email, OrderId, OrderStatus, Price, ProductId, ReviewId, UserId,
    UserRole,
};

// =============================================================================
// Auth Types
// =============================================================================

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend user ID.
    pub id: UserId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login email.
    pub email: Email,
    /// `USER` or `ADMIN`.
    #[serde(default)]
    pub role: UserRole,
}

/// Credentials for `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Registration for `POST /api/auth/signup`.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

/// Response of login and signup.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// Profile of the authenticated user.
    pub user: UserProfile,
}

/// Response of `POST /api/auth/forgot-password`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    /// Confirmation text (identical whether or not the account exists).
    pub message: String,
    /// Direct reset link, only returned by development backends.
    #[serde(default)]
    pub reset_link: Option<String>,
}

/// Body of `POST /api/auth/reset-password`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}

/// Generic `{ "message": ... }` response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// Cart Types
// =============================================================================

/// One product line in the cart.
///
/// The server cart names the product ID `id`; `productId` is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product this line is for. Unique within a cart.
    #[serde(rename = "id", alias = "productId")]
    pub product_id: ProductId,
    /// Product name at the time it was added.
    #[serde(default)]
    pub name: String,
    /// Product slug for linking.
    #[serde(default)]
    pub slug: String,
    /// Unit price.
    pub price: Price,
    /// Primary image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Image to use when `image` fails to load.
    #[serde(default)]
    pub fallback_image: Option<String>,
    /// Units, always at least 1 inside a cart.
    pub quantity: u32,
}

impl CartItem {
    /// Build a line for `product` with the given quantity.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            image: product.image.clone(),
            fallback_image: product.fallback_image.clone(),
            quantity,
        }
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Element of the `PUT /api/cart` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl From<&CartItem> for CartLineInput {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            quantity: item.quantity,
        }
    }
}

// =============================================================================
// Product Types
// =============================================================================

/// Spring-style page of results.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    /// Items across all pages.
    #[serde(default)]
    pub total_elements: u64,
    /// Number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Zero-based page index.
    #[serde(default)]
    pub number: u32,
    /// Page size requested.
    #[serde(default)]
    pub size: u32,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Price,
    #[serde(default)]
    pub original_price: Option<Price>,
    /// Category slug.
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    /// Net quantity label (e.g. "250 g").
    #[serde(default)]
    pub net_qty: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub fallback_image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub trending: Option<bool>,
    #[serde(default)]
    pub highlights: Option<ProductHighlights>,
    #[serde(default)]
    pub information: Option<ProductInformation>,
}

/// Product highlight attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductHighlights {
    pub brand: Option<String>,
    pub product_type: Option<String>,
    pub dietary_preference: Option<String>,
    pub key_features: Option<String>,
    pub flavour: Option<String>,
    pub ingredients: Option<String>,
    pub allergen_information: Option<String>,
    pub weight: Option<String>,
    pub unit: Option<String>,
    pub packaging_type: Option<String>,
}

/// Regulatory and seller information for a product.
///
/// Also the shape of `/api/content/site-information`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInformation {
    pub disclaimer: Option<String>,
    pub customer_care_details: Option<String>,
    pub seller_name: Option<String>,
    pub seller_address: Option<String>,
    pub seller_license_no: Option<String>,
    pub manufacturer_name: Option<String>,
    pub country_of_origin: Option<String>,
    pub shelf_life: Option<String>,
}

/// Site-wide product information block.
pub type SiteInformation = ProductInformation;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Catalog listing filters for `GET /api/products`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<CategoryId>,
    pub page: u32,
    pub size: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            page: 0,
            size: 20,
        }
    }
}

/// Admin create/update payload. Unset fields are omitted.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_qty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trending: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<ProductHighlights>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub information: Option<ProductInformation>,
}

// =============================================================================
// Review Types
// =============================================================================

/// A product review.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    #[serde(default)]
    pub author: String,
    pub rating: u8,
    /// Review date as rendered by the backend (ISO date).
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Whether the signed-in user wrote this review.
    #[serde(default)]
    pub owned_by_current_user: bool,
}

/// Body for creating or updating a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRequest {
    /// 1 to 5.
    pub rating: u8,
    /// Up to 1000 characters.
    pub text: String,
}

// =============================================================================
// Order Types
// =============================================================================

/// Payment method label. Forwarded to the backend; no processing happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    #[default]
    Cod,
    Card,
    Upi,
    NetBanking,
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cod" => Ok(Self::Cod),
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "netbanking" => Ok(Self::NetBanking),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Shipping details for `POST /api/orders`. All optional.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address_line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address_line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_pincode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

impl CreateOrderRequest {
    /// Ship to a saved address.
    #[must_use]
    pub fn ship_to(address: &Address, payment_method: PaymentMethod) -> Self {
        Self {
            shipping_name: Some(address.name.clone()),
            shipping_phone: Some(address.phone.clone()),
            shipping_address_line1: Some(address.address_line1.clone()),
            shipping_address_line2: address.address_line2.clone(),
            shipping_city: Some(address.city.clone()),
            shipping_state: Some(address.state.clone()),
            shipping_pincode: Some(address.pincode.clone()),
            payment_method: Some(payment_method),
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub order_date: Option<DateTime<Utc>>,
    pub total_amount: Price,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_name: Option<String>,
    #[serde(default)]
    pub shipping_phone: Option<String>,
    #[serde(default)]
    pub shipping_address_line1: Option<String>,
    #[serde(default)]
    pub shipping_address_line2: Option<String>,
    #[serde(default)]
    pub shipping_city: Option<String>,
    #[serde(default)]
    pub shipping_state: Option<String>,
    #[serde(default)]
    pub shipping_pincode: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// A line of a placed order, priced at order time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub price: Price,
    pub quantity: u32,
}

// =============================================================================
// Address Types
// =============================================================================

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Body for creating or updating an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

// =============================================================================
// Content Types
// =============================================================================

/// A frequently asked question.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Faq {
    pub id: String,
    pub question: String,
    pub answer: String,
}

/// Delivery time for a region.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ShippingZone {
    pub name: String,
    pub days: String,
}

/// Shipping policy page content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingPolicy {
    pub title: String,
    pub intro: String,
    /// Orders at or above this amount ship free.
    pub free_over: Option<Price>,
    pub flat_charge: Option<Price>,
    pub delivery_days: String,
    pub zones: Vec<ShippingZone>,
    pub note: String,
}

/// Returns policy page content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReturnsPolicy {
    pub title: String,
    pub intro: String,
    pub window_days: Option<u32>,
    pub conditions: Vec<String>,
    pub contact_note: String,
}

/// Contact page content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub address: String,
    pub hours: String,
}
