//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Returns the content hash for site.js.
///
/// Usage in templates: `{{ ""|js_hash }}`
#[askama::filter_fn]
pub fn js_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("JS_HASH"))
}

/// WhatsApp deep link with a prefilled greeting.
///
/// Usage in templates: `{{ page.salon.whatsapp_url|whatsapp_link }}`
#[askama::filter_fn]
pub fn whatsapp_link(base: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let mut url = base.to_string();
    let separator = if url.contains('?') { '&' } else { '?' };
    url.push(separator);
    url.push_str("text=Hola%2C%20me%20gustar%C3%ADa%20pedir%20una%20cita");
    Ok(url)
}
