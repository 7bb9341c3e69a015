//! Static content pages. These never fail; missing content prints empty.

use soil2spoon_core::ProductId;
use soil2spoon_storefront::Storefront;

use crate::output;

pub async fn faqs(storefront: &Storefront) {
    for faq in storefront.api().faqs_or_default().await {
        output::line(&format!("Q: {}\nA: {}\n", faq.question, faq.answer));
    }
}

pub async fn shipping(storefront: &Storefront) {
    let policy = storefront.api().shipping_policy_or_default().await;
    output::heading(&policy.title);
    output::line(&policy.intro);
    if let Some(free_over) = policy.free_over {
        output::line(&format!("Free shipping on orders over {free_over}"));
    }
    if let Some(flat) = policy.flat_charge {
        output::line(&format!("Flat charge otherwise: {flat}"));
    }
    for zone in &policy.zones {
        output::line(&format!("  {:<24} {}", zone.name, zone.days));
    }
    output::line(&policy.note);
}

pub async fn returns(storefront: &Storefront) {
    let policy = storefront.api().returns_policy_or_default().await;
    output::heading(&policy.title);
    output::line(&policy.intro);
    if let Some(days) = policy.window_days {
        output::line(&format!("Returns accepted within {days} days"));
    }
    for condition in &policy.conditions {
        output::line(&format!("  - {condition}"));
    }
    output::line(&policy.contact_note);
}

pub async fn contact(storefront: &Storefront) {
    let info = storefront.api().contact_info_or_default().await;
    output::line(&format!("Email:   {}", info.email));
    output::line(&format!("Phone:   {}", info.phone));
    output::line(&format!("Address: {}", info.address));
    output::line(&format!("Hours:   {}", info.hours));
}

pub async fn site_information(storefront: &Storefront, product_id: Option<ProductId>) {
    let info = storefront
        .api()
        .site_information_or_default(product_id)
        .await;
    output::information(&info);
}
