//! Seed the database with a demo merchant, shop and terminal.
//!
//! Safe to run more than once: when the terminal's public id is already
//! taken nothing new is created.

use tracing::info;

use receetly_core::{Email, TerminalPublicId};
use receetly_server::db::{
    self, MerchantRepository, RepositoryError, ShopRepository, TerminalRepository,
};

/// Create the demo records for `public_id`.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the public id is invalid,
/// or database operations fail.
pub async fn demo(public_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let public_id = TerminalPublicId::parse(public_id)?;
    let database_url = super::database_url()?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let terminals = TerminalRepository::new(&pool);
    if let Some(existing) = terminals.get_by_public_id(&public_id).await? {
        info!(terminal_id = %existing.id, %public_id, "Demo terminal already exists");
        return Ok(());
    }

    let email = Email::parse("owner@example.com")?;
    let merchant = MerchantRepository::new(&pool)
        .create("Joe's Convenience", Some(&email))
        .await?;
    let shop = ShopRepository::new(&pool)
        .create("Joe's CBD Store", merchant.id)
        .await?;

    match terminals.create("Till 1", shop.id, &public_id).await {
        Ok(terminal) => {
            info!(
                merchant_id = %merchant.id,
                shop_id = %shop.id,
                terminal_id = %terminal.id,
                %public_id,
                "Demo terminal created"
            );
            Ok(())
        }
        // Another seed won the race for the public id
        Err(RepositoryError::Conflict(message)) => {
            info!(%message, "Demo terminal already exists");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
