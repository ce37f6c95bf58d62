//! Services page with category filter.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use manipedi_core::Service;

use crate::error::Result;
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::Page;
use crate::state::AppState;

/// A filter tab on the services page.
#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub slug: &'static str,
    pub label: &'static str,
}

/// Filter tabs; `all` shows everything.
pub const CATEGORIES: &[Category] = &[
    Category {
        slug: "all",
        label: "Todos",
    },
    Category {
        slug: "manicura",
        label: "Manicura",
    },
    Category {
        slug: "pedicura",
        label: "Pedicura",
    },
    Category {
        slug: "nailart",
        label: "Nail Art",
    },
    Category {
        slug: "tratamientos",
        label: "Tratamientos",
    },
];

/// Resolve a requested category, treating unknown values as `all`.
#[must_use]
pub fn resolve_category(requested: Option<&str>) -> &'static str {
    requested
        .map(|c| c.trim().to_ascii_lowercase())
        .and_then(|c| CATEGORIES.iter().find(|cat| cat.slug == c))
        .map_or("all", |cat| cat.slug)
}

/// Keep the services in `category`, in their stored order.
#[must_use]
pub fn filter_services(services: Vec<Service>, category: &str) -> Vec<Service> {
    if category == "all" {
        return services;
    }
    services
        .into_iter()
        .filter(|s| s.category.eq_ignore_ascii_case(category))
        .collect()
}

/// Service card display data for templates.
#[derive(Debug, Clone)]
pub struct ServiceCard {
    pub name: String,
    pub description: String,
    pub price: String,
    pub duration: String,
    pub category: String,
    pub image_url: Option<String>,
    pub popular: bool,
}

impl From<&Service> for ServiceCard {
    fn from(service: &Service) -> Self {
        let category = CATEGORIES
            .iter()
            .find(|c| c.slug == service.category)
            .map_or_else(|| service.category.clone(), |c| c.label.to_string());

        Self {
            name: service.name.clone(),
            description: service.description.clone(),
            price: service.price.display_short(),
            duration: service.duration.clone(),
            category,
            image_url: service.image_url.clone(),
            popular: service.popular,
        }
    }
}

/// Query parameters for the services page.
#[derive(Debug, Deserialize)]
pub struct ServicesQuery {
    pub category: Option<String>,
}

/// Services page template.
#[derive(Template, WebTemplate)]
#[template(path = "services.html")]
pub struct ServicesTemplate {
    pub page: Page,
    pub categories: &'static [Category],
    pub active: &'static str,
    pub services: Vec<ServiceCard>,
}

/// Display the services grid.
#[instrument(skip(state, session, nonce))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Query(query): Query<ServicesQuery>,
) -> Result<impl IntoResponse> {
    let active = resolve_category(query.category.as_deref());
    let services = filter_services(state.catalog().services().await, active);

    let page = Page::load(&state, &session, nonce, "Servicios", "/servicios").await?;

    Ok(ServicesTemplate {
        page,
        categories: CATEGORIES,
        active,
        services: services.iter().map(ServiceCard::from).collect(),
    })
}
