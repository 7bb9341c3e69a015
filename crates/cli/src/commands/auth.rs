//! Sign-in commands.

use soil2spoon_storefront::Storefront;

use super::CliError;
use crate::output;

pub async fn login(storefront: &Storefront, email: &str, password: &str) -> Result<(), CliError> {
    let user = storefront.session().login(email, password).await?;
    // Wait for the server cart so the summary below is accurate.
    storefront
        .cart()
        .flush()
        .await
        .map_err(soil2spoon_storefront::StorefrontError::from)?;
    output::line(&format!("Signed in as {} <{}>", user.name, user.email));
    output::cart_summary(&storefront.cart().cart());
    Ok(())
}

pub async fn signup(
    storefront: &Storefront,
    email: &str,
    password: &str,
    name: &str,
) -> Result<(), CliError> {
    let user = storefront.session().signup(email, password, name).await?;
    output::line(&format!("Welcome, {}! Account created for {}", user.name, user.email));
    Ok(())
}

pub async fn logout(storefront: &Storefront) {
    storefront.session().logout().await;
    output::line("Signed out");
}

pub fn whoami(storefront: &Storefront) -> Result<(), CliError> {
    let user = storefront.session().require_user()?;
    output::user(&user);
    Ok(())
}

pub async fn forgot_password(storefront: &Storefront, email: &str) -> Result<(), CliError> {
    let response = storefront.session().forgot_password(email).await?;
    output::line(&response.message);
    if let Some(link) = response.reset_link {
        output::line(&format!("Reset link: {link}"));
    }
    Ok(())
}

pub async fn reset_password(
    storefront: &Storefront,
    token: &str,
    password: &str,
) -> Result<(), CliError> {
    let message = storefront.session().reset_password(token, password).await?;
    if message.is_empty() {
        output::line("Password updated");
    } else {
        output::line(&message);
    }
    Ok(())
}
