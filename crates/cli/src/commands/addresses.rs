//! Saved address commands.

use soil2spoon_core::AddressId;
use soil2spoon_storefront::Storefront;
use soil2spoon_storefront::types::AddressRequest;

use super::CliError;
use crate::output;

pub async fn list(storefront: &Storefront) -> Result<(), CliError> {
    storefront.session().require_user()?;
    output::addresses(&storefront.api().list_addresses().await?);
    Ok(())
}

pub async fn add(storefront: &Storefront, request: &AddressRequest) -> Result<(), CliError> {
    storefront.session().require_user()?;
    let address = storefront.api().create_address(request).await?;
    output::line(&format!("Saved address #{}", address.id));
    Ok(())
}

pub async fn delete(storefront: &Storefront, id: AddressId) -> Result<(), CliError> {
    storefront.session().require_user()?;
    storefront.api().delete_address(id).await?;
    output::line(&format!("Deleted address #{id}"));
    Ok(())
}
