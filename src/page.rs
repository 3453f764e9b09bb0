//! The index page: fetches one todo on mount and shows its title.

use serde::Deserialize;
use tracing::debug;

use crate::{RequestClient, RequestOptions, Result, Transport};

/// Resource fetched by the index page.
pub const INDEX_URL: &str = "https://jsonplaceholder.typicode.com/todos/1";

/// Heading rendered above the fetched title.
pub const PAGE_HEADING: &str = "Page index";

/// View state of the index page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PageData {
    #[serde(default)]
    pub title: String,
}

/// Page component that shows the title of [`INDEX_URL`] once mounted.
#[derive(Clone, Debug)]
pub struct IndexPage {
    url: String,
    data: PageData,
    mounted: bool,
}

impl Default for IndexPage {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexPage {
    /// Empty, unmounted page for [`INDEX_URL`].
    pub fn new() -> Self {
        Self::with_url(INDEX_URL)
    }

    /// Page that fetches `url` instead of [`INDEX_URL`].
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            data: PageData::default(),
            mounted: false,
        }
    }

    /// Retry options used for the mount request.
    pub fn request_options() -> RequestOptions {
        RequestOptions::new(2).with_retry_interval_ms(1)
    }

    /// URL fetched on mount.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current view state.
    pub fn data(&self) -> &PageData {
        &self.data
    }

    /// Whether a mount has started since construction or the last unmount.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Fetches the page data and updates the view state.
    ///
    /// Only the first call after construction or [`IndexPage::unmount`]
    /// issues a request. Returns `true` if the state changed.
    pub async fn mount<T: Transport>(&mut self, client: &RequestClient<T>) -> bool {
        if !self.begin_mount() {
            return false;
        }
        let result = Self::fetch(client, &self.url).await;
        self.apply(result)
    }

    /// Marks the page mounted. Returns `false` if it already was.
    pub fn begin_mount(&mut self) -> bool {
        if self.mounted {
            return false;
        }
        self.mounted = true;
        true
    }

    /// Issues the mount request without touching any page state.
    pub async fn fetch<T: Transport>(client: &RequestClient<T>, url: &str) -> Result<PageData> {
        client
            .get_with(url, Self::request_options())
            .await?
            .error_for_status()?
            .json()
    }

    /// Stores a fetch result. Failures leave the current state in place.
    pub fn apply(&mut self, result: Result<PageData>) -> bool {
        match result {
            Ok(data) => {
                let changed = data != self.data;
                self.data = data;
                changed
            }
            Err(err) => {
                debug!(url = %self.url, error = %err, "index page keeps previous state");
                false
            }
        }
    }

    /// Resets the page so that the next [`IndexPage::mount`] fetches again.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.data = PageData::default();
    }

    /// Page text: the heading line, then the title.
    pub fn render(&self) -> String {
        format!("{PAGE_HEADING}\n{}", self.data.title)
    }
}

#[cfg(test)]
mod tests {
    use super::{IndexPage, PageData, INDEX_URL};
    use crate::RequestError;

    #[test]
    fn new_page_is_empty() {
        let page = IndexPage::new();
        assert_eq!(page.url(), INDEX_URL);
        assert_eq!(page.data(), &PageData::default());
        assert_eq!(page.render(), "Page index\n");
        assert_eq!(IndexPage::request_options().retry_count, 2);
        assert_eq!(IndexPage::request_options().retry_interval_ms, Some(1));
    }

    #[test]
    fn begin_mount_only_once() {
        let mut page = IndexPage::new();
        assert!(page.begin_mount());
        assert!(!page.begin_mount());
        page.unmount();
        assert!(page.begin_mount());
    }

    #[test]
    fn failed_fetch_keeps_previous_state() {
        let mut page = IndexPage::new();
        assert!(page.apply(Ok(PageData {
            title: "delectus aut autem".to_owned()
        })));
        assert!(!page.apply(Err(RequestError::Connection("refused".to_owned()))));
        assert_eq!(page.render(), "Page index\ndelectus aut autem");
    }
}
