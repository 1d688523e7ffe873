//! services/api/src/bin/openapi.rs
//!
//! This binary generates the OpenAPI 3.0 document for the beer journal API.
//! Usage: `openapi [OUTPUT]`, writing to `openapi.json` when no path is given.

use api_lib::web::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

/// Renders the API document and writes it to `path`.
fn write_document(
    api_doc: utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = api_doc.to_pretty_json()?;
    std::fs::write(path, document)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The first argument, if any, overrides the output file.
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    write_document(ApiDoc::openapi(), &path)?;
    println!("OpenAPI document for the beer journal written to {}", path);
    Ok(())
}
