//! Team page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use manipedi_core::TeamMember;

use crate::error::Result;
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::Page;
use crate::state::AppState;

/// Team card display data for templates.
#[derive(Debug, Clone)]
pub struct TeamMemberCard {
    pub name: String,
    pub initials: String,
    pub role: String,
    pub specialty: String,
    pub bio: String,
    pub image_url: Option<String>,
    /// One decimal, e.g. `4.9`.
    pub rating: Option<String>,
    pub reviews: Option<u32>,
    /// Handle with the leading `@`.
    pub instagram: Option<String>,
    pub instagram_url: Option<String>,
}

impl From<&TeamMember> for TeamMemberCard {
    fn from(member: &TeamMember) -> Self {
        let handle = member
            .instagram
            .as_deref()
            .map(|h| h.trim().trim_start_matches('@'))
            .filter(|h| !h.is_empty());

        Self {
            name: member.name.clone(),
            initials: member.initials(),
            role: member.role.clone(),
            specialty: member.specialty.clone(),
            bio: member.bio.clone(),
            image_url: member.image_url.clone(),
            rating: member.rating.map(|r| format!("{r:.1}")),
            reviews: member.reviews,
            instagram: handle.map(|h| format!("@{h}")),
            instagram_url: handle.map(|h| format!("https://instagram.com/{h}")),
        }
    }
}

/// Team page template.
#[derive(Template, WebTemplate)]
#[template(path = "team.html")]
pub struct TeamTemplate {
    pub page: Page,
    pub members: Vec<TeamMemberCard>,
}

/// Display the team cards.
#[instrument(skip(state, session, nonce))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let team = state.catalog().team().await;
    let page = Page::load(&state, &session, nonce, "Equipo", "/equipo").await?;

    Ok(TeamTemplate {
        page,
        members: team.iter().map(TeamMemberCard::from).collect(),
    })
}
