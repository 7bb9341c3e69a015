//! Plain-text rendering of command results on stdout.

#![allow(clippy::print_stdout)]

use soil2spoon_storefront::Cart;
use soil2spoon_storefront::types::{
    Address, Order, Product, ProductInformation, Review, UserProfile,
};

pub fn line(text: &str) {
    println!("{text}");
}

pub fn heading(text: &str) {
    println!("{text}");
    println!("{}", "=".repeat(text.chars().count()));
}

pub fn user(user: &UserProfile) {
    println!("{} <{}>", user.name, user.email);
    println!("id:   {}", user.id);
    println!("role: {}", user.role);
}

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products");
        return;
    }
    for product in products {
        let was = product
            .original_price
            .filter(|original| *original > product.price)
            .map(|original| format!(" (was {original})"))
            .unwrap_or_default();
        println!(
            "{:>5}  {:<32} {:>10}{was}  {}",
            product.id, product.name, product.price.to_string(), product.slug
        );
    }
}

pub fn product_detail(product: &Product) {
    heading(&product.name);
    println!("id:    {}", product.id);
    println!("slug:  {}", product.slug);
    println!("price: {}", product.price);
    if let Some(category) = &product.category {
        println!("category: {category}");
    }
    if let Some(net_qty) = &product.net_qty {
        println!("net qty:  {net_qty}");
    }
    if let (Some(rating), Some(count)) = (product.rating, product.review_count) {
        println!("rating:   {rating:.1} ({count} reviews)");
    }
    if let Some(description) = &product.description {
        println!();
        println!("{description}");
    }
    if let Some(information) = &product.information {
        println!();
        self::information(information);
    }
}

pub fn information(info: &ProductInformation) {
    let rows = [
        ("Seller", &info.seller_name),
        ("Seller address", &info.seller_address),
        ("License no.", &info.seller_license_no),
        ("Manufacturer", &info.manufacturer_name),
        ("Country of origin", &info.country_of_origin),
        ("Shelf life", &info.shelf_life),
        ("Customer care", &info.customer_care_details),
        ("Disclaimer", &info.disclaimer),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            println!("{label:<18} {value}");
        }
    }
}

pub fn reviews(reviews: &[Review]) {
    if reviews.is_empty() {
        println!("No reviews yet");
        return;
    }
    for review in reviews {
        let stars = "*".repeat(usize::from(review.rating.min(5)));
        let mine = if review.owned_by_current_user { " (yours)" } else { "" };
        println!(
            "#{} {stars:<5} {}{mine} {}",
            review.id,
            review.author,
            review.date.as_deref().unwrap_or_default()
        );
        println!("    {}", review.text);
    }
}

pub fn cart_summary(cart: &Cart) {
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }
    for item in cart.items() {
        println!(
            "{:>5}  {:<32} {:>3} x {:>8} = {:>10}",
            item.product_id,
            item.name,
            item.quantity,
            item.price.to_string(),
            item.line_total().to_string()
        );
    }
    println!("{} items, total {}", cart.count(), cart.total());
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders yet");
        return;
    }
    for order in orders {
        let date = order
            .order_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let status = order.status.map(|s| s.to_string()).unwrap_or_default();
        println!(
            "#{:<6} {date:<10} {status:<10} {:>10}",
            order.id,
            order.total_amount.to_string()
        );
        for item in &order.items {
            println!("         {} x {}", item.quantity, item.name);
        }
    }
}

pub fn addresses(addresses: &[Address]) {
    if addresses.is_empty() {
        println!("No saved addresses");
        return;
    }
    for address in addresses {
        let default = if address.is_default { " [default]" } else { "" };
        println!("#{} {}{default}", address.id, address.name);
        println!("    {}", address.address_line1);
        if let Some(line2) = &address.address_line2 {
            println!("    {line2}");
        }
        println!(
            "    {}, {} {}  ({})",
            address.city, address.state, address.pincode, address.phone
        );
    }
}
