use tracing::{info, warn};

use crate::dom::SharedDocument;
use crate::platform::{Platform, ShareData};
use crate::ui::{show_toast, ToastKind};

pub const LINK_COPIED_MESSAGE: &str = "Enlace copiado al portapapeles";

/// Share through the platform's share sheet, falling back to copying the URL.
pub async fn share_content(
    platform: &dyn Platform,
    document: &SharedDocument,
    data: ShareData,
) -> anyhow::Result<()> {
    if platform.supports_share() {
        match platform.share(&data).await {
            Ok(()) => {
                info!(url = %data.url, "Shared");
                return Ok(());
            }
            Err(e) => warn!(error = %e, "Share failed, copying link instead"),
        }
    }

    platform.write_clipboard(&data.url).await?;
    show_toast(document, LINK_COPIED_MESSAGE, ToastKind::Success);
    Ok(())
}
