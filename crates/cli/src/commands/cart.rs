//! Cart commands.

use soil2spoon_core::ProductId;
use soil2spoon_storefront::Storefront;

use super::CliError;
use crate::output;

pub fn show(storefront: &Storefront) {
    output::cart_summary(&storefront.cart().cart());
}

pub async fn add(storefront: &Storefront, slug: &str, quantity: u32) -> Result<(), CliError> {
    let product = storefront.api().get_product(slug).await?;
    storefront.cart().add(&product, quantity);
    if let Some(notice) = storefront.cart().notice() {
        output::line(&notice);
    }
    warn_if_local(storefront);
    output::cart_summary(&storefront.cart().cart());
    Ok(())
}

pub fn set(storefront: &Storefront, product_id: ProductId, quantity: i64) -> Result<(), CliError> {
    require_line(storefront, product_id)?;
    storefront.cart().update_quantity(product_id, quantity);
    warn_if_local(storefront);
    output::cart_summary(&storefront.cart().cart());
    Ok(())
}

pub fn remove(storefront: &Storefront, product_id: ProductId) -> Result<(), CliError> {
    require_line(storefront, product_id)?;
    storefront.cart().remove(product_id);
    warn_if_local(storefront);
    output::cart_summary(&storefront.cart().cart());
    Ok(())
}

pub fn clear(storefront: &Storefront) {
    storefront.cart().clear();
    warn_if_local(storefront);
    output::line("Cart emptied");
}

fn require_line(storefront: &Storefront, product_id: ProductId) -> Result<(), CliError> {
    if storefront.cart().cart().get(product_id).is_none() {
        return Err(CliError::InvalidArgument(format!(
            "product {product_id} is not in the cart"
        )));
    }
    Ok(())
}

/// Without a session the cart lives only in this process.
fn warn_if_local(storefront: &Storefront) {
    if !storefront.session().is_authenticated() {
        output::line("Not signed in: the cart is not saved between runs");
    }
}
