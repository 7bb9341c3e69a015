//! Checkout and order history.

use soil2spoon_core::AddressId;
use soil2spoon_storefront::Storefront;
use soil2spoon_storefront::types::{CreateOrderRequest, PaymentMethod};

use super::CliError;
use crate::output;

/// Shipping details from the command line: a saved address or inline fields.
pub struct Shipping {
    pub address_id: Option<AddressId>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

pub async fn checkout(
    storefront: &Storefront,
    shipping: Shipping,
    payment: PaymentMethod,
) -> Result<(), CliError> {
    storefront.session().require_user()?;
    if storefront.cart().cart().is_empty() {
        return Err(CliError::InvalidArgument("the cart is empty".to_string()));
    }

    let request = match shipping.address_id {
        Some(id) => {
            let addresses = storefront.api().list_addresses().await?;
            let address = addresses
                .iter()
                .find(|a| a.id == id)
                .ok_or_else(|| CliError::InvalidArgument(format!("no saved address {id}")))?;
            CreateOrderRequest::ship_to(address, payment)
        }
        None => CreateOrderRequest {
            shipping_name: shipping.name,
            shipping_phone: shipping.phone,
            shipping_address_line1: shipping.line1,
            shipping_address_line2: shipping.line2,
            shipping_city: shipping.city,
            shipping_state: shipping.state,
            shipping_pincode: shipping.pincode,
            payment_method: Some(payment),
        },
    };

    let order = storefront.place_order(&request).await?;
    output::line(&format!(
        "Order #{} placed: {}",
        order.id, order.total_amount
    ));
    Ok(())
}

pub async fn list(storefront: &Storefront) -> Result<(), CliError> {
    storefront.session().require_user()?;
    output::orders(&storefront.api().list_orders().await?);
    Ok(())
}
