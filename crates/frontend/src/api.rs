use atlas_shared::document::parse_document;
use atlas_shared::error::LoadError;
use atlas_shared::models::EntityStore;

/// Resolve a data path against the page origin. Absolute URLs pass through.
pub fn resolve_url(origin: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        path.trim_start_matches("./").trim_start_matches('/')
    )
}

fn page_origin() -> Result<String, String> {
    web_sys::window()
        .ok_or_else(|| "No window".to_string())?
        .location()
        .origin()
        .map_err(|e| format!("No page origin: {:?}", e))
}

/// Fetch and parse the atlas document.
pub async fn fetch_document(path: &str) -> Result<EntityStore, String> {
    let url = resolve_url(&page_origin()?, path);
    tracing::debug!(%url, "Fetching atlas document");

    let resp = reqwest::Client::new()
        .get(&url)
        .header("Cache-Control", "no-cache")
        .send()
        .await
        .map_err(|e| {
            LoadError::Fetch {
                url: url.clone(),
                reason: e.to_string(),
            }
            .to_string()
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url,
            status: status.as_u16(),
        }
        .to_string());
    }

    let text = resp.text().await.map_err(|e| {
        LoadError::Fetch {
            url: url.clone(),
            reason: e.to_string(),
        }
        .to_string()
    })?;

    parse_document(&text).map_err(|e| e.to_string())
}
