//! URL opening abstraction (App Store hand-off)

use async_trait::async_trait;
use url::Url;

/// `UIApplication.shared` style URL opener
#[async_trait]
pub trait UrlOpener: Send + Sync {
    /// `canOpenURL`
    fn can_open(&self, url: &Url) -> bool;

    /// `open(_:options:completionHandler:)`, resolves with the completion flag
    async fn open(&self, url: &Url) -> bool;
}
