//! Contact page route handler.
//!
//! Bookings are taken by an external provider; this page only links to it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::Page;
use crate::state::AppState;

/// One row of the opening hours table.
#[derive(Debug, Clone, Copy)]
pub struct OpeningHours {
    pub days: &'static str,
    pub hours: &'static str,
}

pub const OPENING_HOURS: &[OpeningHours] = &[
    OpeningHours {
        days: "Lun - Vie",
        hours: "10:00 - 20:00",
    },
    OpeningHours {
        days: "Sábado",
        hours: "10:00 - 14:00",
    },
    OpeningHours {
        days: "Domingo",
        hours: "Cerrado",
    },
];

/// Street address lines.
pub const ADDRESS: &[&str] = &["Urkijo Kalea 15", "48930 Getxo, Bizkaia"];

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub page: Page,
    pub hours: &'static [OpeningHours],
    pub address: &'static [&'static str],
}

/// Display contact details and opening hours.
#[instrument(skip(state, session, nonce))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let page = Page::load(&state, &session, nonce, "Contacto", "/contacto").await?;

    Ok(ContactTemplate {
        page,
        hours: OPENING_HOURS,
        address: ADDRESS,
    })
}
