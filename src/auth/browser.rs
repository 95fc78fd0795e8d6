use open;
use tokio::task::spawn_blocking;
use crate::error::LinkOpenError;

/// Opens `url` in the system browser.
pub async fn open_link(url: &str) -> Result<(), LinkOpenError> {
    let link = url.to_string();
    if !link.starts_with("http://") && !link.starts_with("https://") {
        return Err(LinkOpenError::NotHttp);
    }

    spawn_blocking(move || {
        open::that(&link)
    }).await??;

    Ok(())
}
