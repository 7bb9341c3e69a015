//! Catalog browsing and reviews.

use soil2spoon_core::{CategoryId, ProductId, ReviewId};
use soil2spoon_storefront::Storefront;
use soil2spoon_storefront::types::{ProductQuery, ReviewRequest};

use super::CliError;
use crate::output;

const MAX_REVIEW_LEN: usize = 1000;

pub async fn products(
    storefront: &Storefront,
    category: Option<CategoryId>,
    page: u32,
    size: u32,
) -> Result<(), CliError> {
    let query = ProductQuery {
        category,
        page,
        size,
    };
    let page = storefront.api().list_products(&query).await?;
    output::products(&page.content);
    output::line(&format!(
        "Page {} of {} ({} products)",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements
    ));
    Ok(())
}

pub async fn product(storefront: &Storefront, slug: &str) -> Result<(), CliError> {
    let product = storefront.api().get_product(slug).await?;
    output::product_detail(&product);
    Ok(())
}

pub async fn featured(storefront: &Storefront) -> Result<(), CliError> {
    output::products(&storefront.api().featured_products().await?);
    Ok(())
}

pub async fn trending(storefront: &Storefront) -> Result<(), CliError> {
    output::products(&storefront.api().trending_products().await?);
    Ok(())
}

pub async fn categories(storefront: &Storefront) -> Result<(), CliError> {
    for category in storefront.api().list_categories().await? {
        output::line(&format!("{:<20} {}", category.id, category.name));
    }
    Ok(())
}

pub async fn reviews(storefront: &Storefront, product_id: ProductId) -> Result<(), CliError> {
    output::reviews(&storefront.api().list_reviews(product_id).await?);
    Ok(())
}

pub async fn add_review(
    storefront: &Storefront,
    product_id: ProductId,
    rating: u8,
    text: String,
) -> Result<(), CliError> {
    storefront.session().require_user()?;
    let review = review_request(rating, text)?;
    let created = storefront.api().create_review(product_id, &review).await?;
    output::line(&format!("Posted review #{}", created.id));
    Ok(())
}

pub async fn edit_review(
    storefront: &Storefront,
    product_id: ProductId,
    review_id: ReviewId,
    rating: u8,
    text: String,
) -> Result<(), CliError> {
    storefront.session().require_user()?;
    let review = review_request(rating, text)?;
    storefront
        .api()
        .update_review(product_id, review_id, &review)
        .await?;
    output::line(&format!("Updated review #{review_id}"));
    Ok(())
}

fn review_request(rating: u8, text: String) -> Result<ReviewRequest, CliError> {
    if !(1..=5).contains(&rating) {
        return Err(CliError::InvalidArgument(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    if text.chars().count() > MAX_REVIEW_LEN {
        return Err(CliError::InvalidArgument(format!(
            "review text is limited to {MAX_REVIEW_LEN} characters"
        )));
    }
    Ok(ReviewRequest { rating, text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_request_validation() {
        assert!(review_request(0, "meh".to_string()).is_err());
        assert!(review_request(6, "wow".to_string()).is_err());
        assert!(review_request(5, "x".repeat(1001)).is_err());
        assert!(review_request(4, "Tangy and fresh".to_string()).is_ok());
    }
}
