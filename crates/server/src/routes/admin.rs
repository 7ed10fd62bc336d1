//! Admin pages: create merchants, shops and terminals.
//!
//! The whole surface is one page of lists and create forms. A successful
//! create redirects back to the page; a rejected one re-renders it with the
//! reason and a 4xx status.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use receetly_core::{Email, MerchantId, ShopId, TerminalPublicId};

use crate::ASSET_VERSION;
use crate::config::ServerConfig;
use crate::db::{MerchantRepository, RepositoryError, ShopRepository, TerminalRepository};
use crate::error::Result;
use crate::models::{Merchant, Shop, Terminal};
use crate::state::AppState;

const ADMIN_PATH: &str = "/admin";

// =============================================================================
// View Models
// =============================================================================

/// Merchant row as listed on the page.
pub struct MerchantView {
    pub id: MerchantId,
    pub name: String,
    pub contact_email: Option<String>,
}

/// Shop row with its merchant resolved.
pub struct ShopView {
    pub id: ShopId,
    pub name: String,
    pub merchant_name: Option<String>,
}

/// Terminal row with its shop, merchant and QR URL resolved.
pub struct TerminalView {
    pub name: String,
    pub shop_name: Option<String>,
    pub merchant_name: Option<String>,
    pub public_id: String,
    pub qr_url: String,
}

/// Admin page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub merchants: Vec<MerchantView>,
    pub shops: Vec<ShopView>,
    pub terminals: Vec<TerminalView>,
    /// Why the last submission was rejected.
    pub notice: Option<String>,
    pub asset_version: &'static str,
}

impl AdminTemplate {
    /// Join the three listings for display.
    pub fn build(
        config: &ServerConfig,
        merchants: Vec<Merchant>,
        shops: Vec<Shop>,
        terminals: Vec<Terminal>,
        notice: Option<String>,
    ) -> Self {
        let merchant_name = |id: MerchantId| {
            merchants
                .iter()
                .find(|m| m.id == id)
                .map(|m| m.name.clone())
        };

        let shop_views = shops
            .iter()
            .map(|s| ShopView {
                id: s.id,
                name: s.name.clone(),
                merchant_name: merchant_name(s.merchant_id),
            })
            .collect();

        let terminal_views = terminals
            .iter()
            .map(|t| {
                let shop = shops.iter().find(|s| s.id == t.shop_id);
                TerminalView {
                    name: t.name.clone(),
                    shop_name: shop.map(|s| s.name.clone()),
                    merchant_name: shop.and_then(|s| merchant_name(s.merchant_id)),
                    public_id: t.public_id.to_string(),
                    qr_url: config.waiting_room_url(&t.public_id),
                }
            })
            .collect();

        let merchant_views = merchants
            .into_iter()
            .map(|m| MerchantView {
                id: m.id,
                name: m.name,
                contact_email: m.contact_email.map(|e| e.as_str().to_owned()),
            })
            .collect();

        Self {
            merchants: merchant_views,
            shops: shop_views,
            terminals: terminal_views,
            notice,
            asset_version: ASSET_VERSION,
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// A form submission the page refuses, with the status to answer with.
#[derive(Debug, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusCode,
    pub message: String,
}

impl Rejection {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Turn constraint violations into rejections; anything else is a fault.
    fn from_repository(err: RepositoryError) -> std::result::Result<Self, RepositoryError> {
        match err {
            RepositoryError::Conflict(message) => Ok(Self {
                status: StatusCode::CONFLICT,
                message,
            }),
            RepositoryError::InvalidReference(message) => Ok(Self::bad_request(message)),
            err @ RepositoryError::Database(_) => Err(err),
        }
    }
}

fn required(value: &str, what: &str) -> std::result::Result<String, Rejection> {
    let value = value.trim();
    if value.is_empty() {
        Err(Rejection::bad_request(format!("{what} is required.")))
    } else {
        Ok(value.to_owned())
    }
}

fn selected<T: std::str::FromStr>(value: &str, what: &str) -> std::result::Result<T, Rejection> {
    value
        .parse()
        .map_err(|_| Rejection::bad_request(format!("Select a {what}.")))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MerchantForm {
    pub name: String,
    pub email: String,
}

impl MerchantForm {
    /// Trimmed name and optional contact email.
    ///
    /// # Errors
    ///
    /// Rejects a blank name or a malformed email.
    pub fn validate(&self) -> std::result::Result<(String, Option<Email>), Rejection> {
        let name = required(&self.name, "Merchant name")?;
        let email = if self.email.trim().is_empty() {
            None
        } else {
            Some(Email::parse(&self.email).map_err(|e| {
                Rejection::bad_request(format!("Contact email is invalid: {e}."))
            })?)
        };
        Ok((name, email))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShopForm {
    pub name: String,
    pub merchant_id: String,
}

impl ShopForm {
    /// # Errors
    ///
    /// Rejects a blank name or a missing merchant.
    pub fn validate(&self) -> std::result::Result<(String, MerchantId), Rejection> {
        Ok((
            required(&self.name, "Shop name")?,
            selected(&self.merchant_id, "merchant")?,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TerminalForm {
    pub name: String,
    pub shop_id: String,
    pub public_id: String,
}

impl TerminalForm {
    /// # Errors
    ///
    /// Rejects a blank name, a missing shop or an unusable public id.
    pub fn validate(&self) -> std::result::Result<(String, ShopId, TerminalPublicId), Rejection> {
        let name = required(&self.name, "Terminal name")?;
        let shop_id = selected(&self.shop_id, "shop")?;
        let public_id = TerminalPublicId::parse(&self.public_id)
            .map_err(|e| Rejection::bad_request(format!("Public ID is invalid: {e}.")))?;
        Ok((name, shop_id, public_id))
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn render(state: &AppState, notice: Option<String>) -> Result<AdminTemplate> {
    let pool = state.pool();
    let merchants = MerchantRepository::new(pool).list_all().await?;
    let shops = ShopRepository::new(pool).list_all().await?;
    let terminals = TerminalRepository::new(pool).list_all().await?;

    Ok(AdminTemplate::build(
        state.config(),
        merchants,
        shops,
        terminals,
        notice,
    ))
}

async fn reject(state: &AppState, rejection: Rejection) -> Result<Response> {
    tracing::info!(status = rejection.status.as_u16(), message = %rejection.message, "Admin form rejected");
    let page = render(state, Some(rejection.message)).await?;
    Ok((rejection.status, page).into_response())
}

/// Answer a create: redirect on success, re-render on a constraint violation.
async fn finish<T>(
    state: &AppState,
    outcome: std::result::Result<T, RepositoryError>,
) -> Result<Response> {
    match outcome {
        Ok(_) => Ok(Redirect::to(ADMIN_PATH).into_response()),
        Err(err) => reject(state, Rejection::from_repository(err)?).await,
    }
}

/// Display the admin page.
///
/// GET /admin
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<AdminTemplate> {
    render(&state, None).await
}

/// Create a merchant.
///
/// POST /admin/merchants
#[instrument(skip(state, form))]
pub async fn create_merchant(
    State(state): State<AppState>,
    Form(form): Form<MerchantForm>,
) -> Result<Response> {
    let (name, email) = match form.validate() {
        Ok(fields) => fields,
        Err(rejection) => return reject(&state, rejection).await,
    };

    let outcome = MerchantRepository::new(state.pool())
        .create(&name, email.as_ref())
        .await;
    finish(&state, outcome).await
}

/// Create a shop for an existing merchant.
///
/// POST /admin/shops
#[instrument(skip(state, form))]
pub async fn create_shop(
    State(state): State<AppState>,
    Form(form): Form<ShopForm>,
) -> Result<Response> {
    let (name, merchant_id) = match form.validate() {
        Ok(fields) => fields,
        Err(rejection) => return reject(&state, rejection).await,
    };

    let outcome = ShopRepository::new(state.pool())
        .create(&name, merchant_id)
        .await;
    finish(&state, outcome).await
}

/// Create a terminal for an existing shop.
///
/// POST /admin/terminals
#[instrument(skip(state, form))]
pub async fn create_terminal(
    State(state): State<AppState>,
    Form(form): Form<TerminalForm>,
) -> Result<Response> {
    let (name, shop_id, public_id) = match form.validate() {
        Ok(fields) => fields,
        Err(rejection) => return reject(&state, rejection).await,
    };

    let outcome = TerminalRepository::new(state.pool())
        .create(&name, shop_id, &public_id)
        .await;
    finish(&state, outcome).await
}
