//! Read-only catalog records served from the hosted table store.
//!
//! Field names follow the table columns so rows deserialize directly from the
//! REST API and serialize back unchanged for seeding. Optional columns default
//! when absent so a partially filled row still renders.

use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::types::{GalleryItemId, Price, ProductId, ServiceId, TeamMemberId, TestimonialId};

/// Tables exposed by the hosted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogTable {
    Services,
    Products,
    Team,
    Testimonials,
    Gallery,
}

/// Ordering applied to the `id` column when selecting rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Query-string form used by the REST API (`order=id.asc`).
    #[must_use]
    pub const fn as_query(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

impl CatalogTable {
    /// Every table, in seeding order.
    pub const ALL: [Self; 5] = [
        Self::Services,
        Self::Team,
        Self::Testimonials,
        Self::Products,
        Self::Gallery,
    ];

    /// Table name as it appears in the store's URL path.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Products => "products",
            Self::Team => "team",
            Self::Testimonials => "testimonials",
            Self::Gallery => "gallery",
        }
    }

    /// Display order for the table. The gallery shows newest work first.
    #[must_use]
    pub const fn default_order(&self) -> SortOrder {
        match self {
            Self::Gallery => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }
}

impl core::fmt::Display for CatalogTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for CatalogTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "services" => Ok(Self::Services),
            "products" => Ok(Self::Products),
            "team" => Ok(Self::Team),
            "testimonials" => Ok(Self::Testimonials),
            "gallery" => Ok(Self::Gallery),
            other => Err(format!("unknown catalog table: {other}")),
        }
    }
}

/// A bookable salon service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    #[serde(alias = "title")]
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Human-readable duration, e.g. `"45 min"`.
    pub duration: String,
    /// Filter slug: `manicura`, `pedicura`, `nailart`, `tratamientos`.
    pub category: String,
    #[serde(default, alias = "image", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub popular: bool,
}

/// A retail product sold through the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Payment provider price reference. Products without one cannot be
    /// checked out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_price_id: Option<String>,
}

impl Product {
    /// Build the cart line for this product.
    #[must_use]
    pub fn to_cart_item(&self) -> CartItem {
        CartItem::new(
            self.id.clone(),
            self.name.clone(),
            self.price,
            self.image.clone(),
            self.stripe_price_id.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TeamMemberId>,
    pub name: String,
    pub role: String,
    pub specialty: String,
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

impl TeamMember {
    /// Two-letter initials for the avatar placeholder.
    #[must_use]
    pub fn initials(&self) -> String {
        initials(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TestimonialId>,
    pub name: String,
    pub content: String,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professional: Option<String>,
}

impl Testimonial {
    /// Star count clamped to the 1-5 range the cards can draw.
    #[must_use]
    pub fn stars(&self) -> u8 {
        self.rating.clamp(1, 5)
    }

    #[must_use]
    pub fn initials(&self) -> String {
        initials(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<GalleryItemId>,
    pub url: String,
    pub title: String,
    pub category: String,
}

fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_roundtrip() {
        for table in CatalogTable::ALL {
            assert_eq!(table.as_str().parse::<CatalogTable>().unwrap(), table);
        }
        assert!("bookings".parse::<CatalogTable>().is_err());
    }

    #[test]
    fn test_gallery_sorts_descending() {
        assert_eq!(CatalogTable::Gallery.default_order(), SortOrder::Descending);
        assert_eq!(CatalogTable::Services.default_order(), SortOrder::Ascending);
    }

    #[test]
    fn test_service_accepts_title_alias() {
        let service: Service = serde_json::from_value(serde_json::json!({
            "id": 2,
            "title": "Manicura Gel",
            "description": "Esmaltado semipermanente",
            "price": 25,
            "duration": "45 min",
            "category": "manicura",
            "popular": true
        }))
        .unwrap();
        assert_eq!(service.name, "Manicura Gel");
        assert_eq!(service.price, Price::from_cents(2500));
        assert!(service.image_url.is_none());
    }

    #[test]
    fn test_product_to_cart_item() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Esmalte Gel Premium",
            "description": "Colores vibrantes",
            "price": 14.99,
            "image": "https://example.com/p1.jpg",
            "stripe_price_id": "price_123"
        }))
        .unwrap();

        let item = product.to_cart_item();
        assert_eq!(item.id().as_str(), "p1");
        assert_eq!(item.quantity(), 1);
        assert_eq!(item.stripe_price_id(), Some("price_123"));
    }

    #[test]
    fn test_team_member_without_id_omits_it() {
        let member = TeamMember {
            id: None,
            name: "Laura Pérez".to_string(),
            role: "Especialista en Pedicura Spa".to_string(),
            specialty: "Tratamientos Podológicos".to_string(),
            bio: String::new(),
            rating: Some(4.9),
            reviews: Some(120),
            image_url: None,
            instagram: None,
        };
        let json = serde_json::to_value(&member).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(member.initials(), "LP");
    }

    #[test]
    fn test_testimonial_stars_clamped() {
        let testimonial = Testimonial {
            id: None,
            name: "María García".to_string(),
            content: "Genial".to_string(),
            rating: 9,
            date: None,
            service: None,
            professional: None,
        };
        assert_eq!(testimonial.stars(), 5);
        assert_eq!(testimonial.initials(), "MG");
    }
}
