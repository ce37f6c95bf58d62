//! Gallery page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use manipedi_core::GalleryItem;

use crate::error::Result;
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::Page;
use crate::state::AppState;

/// Gallery page template.
#[derive(Template, WebTemplate)]
#[template(path = "gallery.html")]
pub struct GalleryTemplate {
    pub page: Page,
    /// Newest first.
    pub items: Vec<GalleryItem>,
}

/// Display the gallery grid.
#[instrument(skip(state, session, nonce))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let items = state.catalog().gallery().await;
    let page = Page::load(&state, &session, nonce, "Galería", "/galeria").await?;

    Ok(GalleryTemplate { page, items })
}
