use crate::domain::ports::{Navigator, Notifier};
use async_trait::async_trait;
use tracing::info;

/// Prints notifications on stdout, one per line.
#[derive(Debug, Default, Clone)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, message: &str) {
        println!("{message}");
    }
}

/// Prints the absolute URL the buyer would be sent to.
#[derive(Debug, Clone)]
pub struct ConsoleNavigator {
    base_url: String,
}

impl ConsoleNavigator {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn destination(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl Navigator for ConsoleNavigator {
    async fn navigate(&self, path: &str) {
        let url = self.destination(path);
        info!(%url, "Redirecting");
        println!("Redirect: {url}");
    }
}
