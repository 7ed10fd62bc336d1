//! Build script for the server crate.
//!
//! Fingerprints the static assets so templates can append `?v=<hash>` and
//! browsers never keep polling with a stale waiting-room script.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

const ASSETS: &[&str] = &["static/app.css", "static/waiting-room.js"];

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");

    let mut hasher = Sha256::new();
    for asset in ASSETS {
        let path = Path::new(&manifest_dir).join(asset);
        println!("cargo:rerun-if-changed={}", path.display());

        match fs::read(&path) {
            Ok(content) => hasher.update(&content),
            Err(e) => println!("cargo:warning=Could not read {asset}: {e}"),
        }
    }

    let hash = format!("{:x}", hasher.finalize());
    let short_hash = hash.get(..8).unwrap_or(&hash);
    println!("cargo:rustc-env=ASSET_VERSION={short_hash}");
}
