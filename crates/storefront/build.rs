//! Build script for storefront crate.
//!
//! Fingerprints the static stylesheet and script so templates can link
//! `main.<hash>.css` / `site.<hash>.js` with immutable cache headers.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Static assets to fingerprint: (path under `static/`, env var, stem, extension).
const ASSETS: &[(&str, &str, &str, &str)] = &[
    ("css/main.css", "CSS_HASH", "main", "css"),
    ("js/site.js", "JS_HASH", "site", "js"),
];

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let static_dir = Path::new(&manifest_dir).join("static");

    for (relative, env_var, stem, ext) in ASSETS {
        hash_asset(&static_dir, relative, env_var, stem, ext);
    }
}

/// Hash one asset and copy it to `derived/<stem>.<hash>.<ext>` beside it.
///
/// Sets `env_var` for use with `env!()`; empty if the asset is missing.
fn hash_asset(static_dir: &Path, relative: &str, env_var: &str, stem: &str, ext: &str) {
    let path = static_dir.join(relative);
    println!("cargo:rerun-if-changed={}", path.display());

    let content = match fs::read(&path) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {relative}: {e}");
            println!("cargo:rustc-env={env_var}=");
            return;
        }
    };

    let hash = format!("{:x}", Sha256::digest(&content));
    let short_hash = &hash[..8];
    println!("cargo:rustc-env={env_var}={short_hash}");

    let Some(parent) = path.parent() else {
        return;
    };
    let derived_dir = parent.join("derived");
    fs::create_dir_all(&derived_dir).expect("Failed to create derived asset directory");
    fs::copy(&path, derived_dir.join(format!("{stem}.{short_hash}.{ext}")))
        .expect("Failed to copy asset to derived directory");
}
