//! Platform specific byte fetching: files under the assets root natively,
//! HTTP GET relative to the page origin on the web.

/// Absolute URL path of `file_name` below `root`.
///
/// An empty `root` serves from the origin itself: `("", "fonts/a.json")`
/// becomes `/fonts/a.json`, `("static", "fonts/a.json")` becomes
/// `/static/fonts/a.json`.
pub fn url_path(root: &str, file_name: &str) -> String {
    let file_name = file_name.trim_start_matches('/');
    match root.trim_matches('/') {
        "" => format!("/{}", file_name),
        root => format!("/{}/{}", root, file_name),
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(root: &str, file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("no origin: {:?}", e))?;
    Ok(reqwest::Url::parse(&origin)?.join(&url_path(root, file_name))?)
}

pub async fn load_string(root: &str, file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(root, file_name)?;
        reqwest::get(url).await?.error_for_status()?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = {
        let path = std::path::Path::new(root).join(file_name);
        tokio::fs::read_to_string(path).await?
    };

    Ok(txt)
}

pub async fn load_binary(root: &str, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(root, file_name)?;
        reqwest::get(url)
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new(root).join(file_name);
        tokio::fs::read(path).await?
    };

    Ok(data)
}
