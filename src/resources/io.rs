//! Fetching raw asset bytes.
//!
//! Locations are either absolute `http(s)` URLs, fetched with `reqwest` on
//! every platform, or paths relative to an asset root: a directory on
//! native, `<origin>/<root>/` on the web.

use anyhow::Context as _;

pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

pub fn is_data_uri(location: &str) -> bool {
    location.starts_with("data:")
}

/// Resolves `uri` found inside the document at `base`.
pub fn resolve(base: &str, uri: &str) -> anyhow::Result<String> {
    if is_url(uri) || is_data_uri(uri) {
        return Ok(uri.to_string());
    }
    if is_url(base) {
        let base = reqwest::Url::parse(base).with_context(|| format!("Invalid URL {base}"))?;
        return Ok(base.join(uri)?.to_string());
    }
    Ok(match base.rfind('/') {
        Some(idx) => format!("{}{}", &base[..=idx], uri),
        None => uri.to_string(),
    })
}

#[cfg(target_arch = "wasm32")]
fn format_url(root: &str, file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("No window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("Could not read the page origin"))?;
    let base = reqwest::Url::parse(&format!("{}/{}/", origin, root.trim_matches('/')))?;
    Ok(base.join(file_name)?)
}

async fn fetch(url: &str) -> anyhow::Result<Vec<u8>> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Request to {url} failed"))?
        .error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

pub async fn load_binary(root: &str, location: &str) -> anyhow::Result<Vec<u8>> {
    if is_url(location) {
        return fetch(location).await;
    }
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(root, location)?;
        fetch(url.as_str()).await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new(root).join(location);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?
    };

    Ok(data)
}

pub async fn load_string(root: &str, location: &str) -> anyhow::Result<String> {
    let data = load_binary(root, location).await?;
    String::from_utf8(data).with_context(|| format!("{location} is not valid UTF-8"))
}
