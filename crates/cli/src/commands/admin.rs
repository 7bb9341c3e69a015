//! Catalog administration.

use soil2spoon_core::{ProductId, ReviewId};
use soil2spoon_storefront::Storefront;
use soil2spoon_storefront::types::ProductRequest;

use super::CliError;
use crate::output;

pub async fn create_product(
    storefront: &Storefront,
    request: &ProductRequest,
) -> Result<(), CliError> {
    let product = storefront.admin_create_product(request).await?;
    tracing::info!(product_id = %product.id, slug = %product.slug, "Created product");
    output::product_detail(&product);
    Ok(())
}

pub async fn delete_product(storefront: &Storefront, id: ProductId) -> Result<(), CliError> {
    storefront.admin_delete_product(id).await?;
    tracing::info!(product_id = %id, "Deleted product");
    output::line(&format!("Deleted product #{id}"));
    Ok(())
}

pub async fn delete_review(
    storefront: &Storefront,
    product_id: ProductId,
    review_id: ReviewId,
) -> Result<(), CliError> {
    storefront.admin_delete_review(product_id, review_id).await?;
    tracing::info!(product_id = %product_id, review_id = %review_id, "Deleted review");
    output::line(&format!("Deleted review #{review_id}"));
    Ok(())
}
