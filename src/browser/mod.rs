use anyhow::{Context, Result};
use std::net::SocketAddr;

/// URL of the dashboard served on `addr`.
///
/// Unspecified bind addresses (`0.0.0.0`, `::`) are opened via localhost.
pub fn dashboard_url(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("http://localhost:{}/", addr.port())
    } else {
        format!("http://{}/", addr)
    }
}

/// Open a URL in the user's default browser
///
/// # Errors
/// Returns error if browser cannot be opened (e.g., no browser available)
pub fn open_url(url: &str) -> Result<()> {
    webbrowser::open(url)
        .with_context(|| format!("Failed to open browser for URL: {}", url))?;
    Ok(())
}
