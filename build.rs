use std::fs;
use std::path::Path;

fn main() {
    // sqlx::migrate! embeds the migration files at compile time
    println!("cargo:rerun-if-changed=migrations");
    println!("cargo:rerun-if-changed=src/api.rs");
    println!("cargo:rerun-if-changed=src/db/models.rs");
    println!("cargo:rerun-if-changed=src/analytics.rs");

    // The real document is written by `cargo run --bin generate-openapi`
    let openapi_path = Path::new("openapi.json");
    if !openapi_path.exists() {
        let placeholder = r#"{
  "note": "Run 'cargo run --bin generate-openapi' to generate the farm tracker API document"
}"#;
        if let Err(e) = fs::write(openapi_path, placeholder) {
            println!("cargo:warning=could not create openapi.json placeholder: {e}");
        }
    }
}
