//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use manipedi_core::Testimonial;

use crate::error::Result;
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::Page;
use crate::routes::services::ServiceCard;
use crate::state::AppState;

/// Number of services shown in the home page preview.
const SERVICES_PREVIEW: usize = 3;

/// Hero section copy.
#[derive(Debug, Clone)]
pub struct HeroConfig {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub image_url: &'static str,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            title: "Belleza en tus manos",
            subtitle: "Manicura, pedicura y nail art en el corazón de Getxo. \
                       Productos premium y un equipo que cuida cada detalle.",
            image_url: "https://images.unsplash.com/photo-1604654894610-df63bc536371?w=1600",
        }
    }
}

/// Testimonial display data for templates.
#[derive(Debug, Clone)]
pub struct TestimonialView {
    pub name: String,
    pub initials: String,
    pub content: String,
    /// Filled stars, e.g. `★★★★☆`.
    pub stars: String,
    pub service: Option<String>,
    pub date: Option<String>,
}

impl From<&Testimonial> for TestimonialView {
    fn from(t: &Testimonial) -> Self {
        let filled = usize::from(t.stars());
        Self {
            name: t.name.clone(),
            initials: t.initials(),
            content: t.content.clone(),
            stars: format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled)),
            service: t.service.clone(),
            date: t.date.clone(),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: Page,
    pub hero: HeroConfig,
    /// First services in catalog order.
    pub services: Vec<ServiceCard>,
    pub testimonials: Vec<TestimonialView>,
}

/// Display the home page.
#[instrument(skip(state, session, nonce))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let catalog = state.catalog();
    let (services, testimonials) = tokio::join!(catalog.services(), catalog.testimonials());

    let page = Page::load(&state, &session, nonce, "Inicio", "/").await?;

    Ok(HomeTemplate {
        page,
        hero: HeroConfig::default(),
        services: services
            .iter()
            .take(SERVICES_PREVIEW)
            .map(ServiceCard::from)
            .collect(),
        testimonials: testimonials.iter().map(TestimonialView::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testimonial_stars() {
        let testimonial = Testimonial {
            id: None,
            name: "Ane Etxeberria".to_string(),
            content: "Genial".to_string(),
            rating: 4,
            date: None,
            service: None,
            professional: None,
        };

        let view = TestimonialView::from(&testimonial);
        assert_eq!(view.stars, "★★★★☆");
        assert_eq!(view.initials, "AE");
    }
}
