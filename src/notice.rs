//! User-facing notices emitted by the core
//!
//! The core self-heals silently wherever it can; these are the few
//! conditions the user should actually hear about. The embedding shell
//! injects a sink that renders them (a toast, a banner); the default
//! sink just logs.

/// A condition worth surfacing to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserNotice {
    /// A favorite was dropped because its app is no longer installed
    AppUninstalled { display_name: String },
    /// Stored favorites were corrupt and replaced with defaults
    DataReset,
    /// An add was refused because the favorites list is full
    FavoritesLimitReached,
}

impl UserNotice {
    /// Message ready for display
    pub fn message(&self) -> String {
        match self {
            UserNotice::AppUninstalled { display_name } => {
                format!("{} was removed from favorites", display_name)
            }
            UserNotice::DataReset => "Settings reset to defaults".to_string(),
            UserNotice::FavoritesLimitReached => {
                format!("Maximum {} favorite apps allowed", crate::data::MAX_FAVORITES)
            }
        }
    }
}

/// Sink for user notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: UserNotice);
}

/// Default sink: log and move on
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: UserNotice) {
        tracing::info!("{}", notice.message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_app() {
        let notice = UserNotice::AppUninstalled {
            display_name: "Maps".into(),
        };
        assert_eq!(notice.message(), "Maps was removed from favorites");
    }

    #[test]
    fn limit_message_quotes_the_limit() {
        assert!(UserNotice::FavoritesLimitReached.message().contains('7'));
    }
}
