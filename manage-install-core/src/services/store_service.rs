//! App Store hand-off (`goToAppStore`)

use std::sync::Arc;

use url::Url;

use crate::error::CoreError;
use crate::traits::UrlOpener;
use crate::types::{FlowOutcome, StoreRequest};

/// Opens the store page of the app, on platforms that have one.
pub struct StoreService {
    opener: Option<Arc<dyn UrlOpener>>,
}

impl StoreService {
    #[must_use]
    pub fn new(opener: Option<Arc<dyn UrlOpener>>) -> Self {
        Self { opener }
    }

    pub async fn go_to_app_store(&self, request: StoreRequest) -> FlowOutcome {
        let Some(store_uri) = request.store_uri.filter(|uri| !uri.is_empty()) else {
            return CoreError::InvalidInput(
                "'goToAppStore' called with empty argument 'storeUri'".to_string(),
            )
            .into();
        };

        let Some(ref opener) = self.opener else {
            return CoreError::NotImplemented("goToAppStore".to_string()).into();
        };

        let Some(url) = Url::parse(&store_uri).ok().filter(|url| opener.can_open(url)) else {
            log::warn!("Store URI cannot be opened: {store_uri}");
            return CoreError::InvalidInput(format!(
                "The used 'storeUri' could not be opened into AppStore: {store_uri}"
            ))
            .into();
        };

        if opener.open(&url).await {
            log::info!("Opened store page {url}");
            FlowOutcome::success(None)
        } else {
            FlowOutcome::failure(format!("Failed to open {url}"))
        }
    }
}
