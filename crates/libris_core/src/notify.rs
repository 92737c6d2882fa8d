//! User feedback
//!
//! Components never render anything themselves. Every success or failure that a user should see
//! becomes a [`Notification`] handed to a [`Notifier`], and route changes go through a
//! [`Navigator`]. Front-ends decide how to present both.
use log::{info, warn};
use serde::Serialize;

#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Default,
    Destructive,
}

/// A short message for the user, shown as a toast by graphical front-ends
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    #[must_use]
    #[inline]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Default,
        }
    }

    #[must_use]
    #[inline]
    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Destructive,
        }
    }

    /// Shown instead of acting when the user fires requests faster than they can be handled.
    #[must_use]
    #[inline]
    pub fn too_fast() -> Self {
        Self::failure(
            "Whoa, slow down there, speed racer!",
            "Looks like you were a little too eager. We have put a temporary hold on your \
             excitement. Chill for a bit, and try again.",
        )
    }

    #[must_use]
    #[inline]
    pub const fn is_destructive(&self) -> bool {
        matches!(self.variant, Variant::Destructive)
    }
}

pub trait Notifier {
    fn notify(&self, notification: Notification);
}

pub trait Navigator {
    fn navigate(&self, route: &str);
}

/// Writes notifications to the log, destructive ones as warnings.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    #[inline]
    fn notify(&self, notification: Notification) {
        if notification.is_destructive() {
            warn!("{}: {}", notification.title, notification.description);
        } else {
            info!("{}: {}", notification.title, notification.description);
        }
    }
}

/// Front-ends without routing only record where the user would have been sent.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    #[inline]
    fn navigate(&self, route: &str) {
        info!("Navigating to {route}");
    }
}
