//! Per-user language settings and busy/queued flags
//!
//! Entries are created lazily on first contact and live for the whole process.

use crate::languages::AUTO;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;

/// Language settings for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    pub user_id: u64,
    /// Input language, `auto` for detection
    pub source: String,
    /// Output language, never `auto`
    pub target: String,
}

impl UserSettings {
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            source: AUTO.to_string(),
            target: "en".to_string(),
        }
    }

    /// Exchange source and target. An `auto` source cannot become a target,
    /// so nothing changes in that case.
    pub fn swap(&mut self) {
        if self.source != AUTO {
            std::mem::swap(&mut self.source, &mut self.target);
        }
    }

    pub fn set_source(&mut self, code: &str) {
        self.source = code.to_string();
    }

    /// `auto` is refused as a target and leaves the current one in place
    pub fn set_target(&mut self, code: &str) {
        if code != AUTO {
            self.target = code.to_string();
        }
    }
}

/// Where a user's outstanding job is, if anywhere
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserFlags {
    /// Job is waiting in line
    pub queued: bool,
    /// Job is being executed by the worker
    pub busy: bool,
}

impl UserFlags {
    /// The user has an outstanding job, waiting or running
    pub fn is_active(&self) -> bool {
        self.busy || self.queued
    }

    pub fn mark_queued(&mut self) {
        self.queued = true;
        self.busy = false;
    }

    pub fn mark_busy(&mut self) {
        self.busy = true;
        self.queued = false;
    }

    pub fn clear(&mut self) {
        self.busy = false;
        self.queued = false;
    }
}

/// Everything the bot remembers about one user
#[derive(Debug, Clone)]
pub struct UserEntry {
    pub settings: UserSettings,
    pub flags: UserFlags,
}

/// Concurrent user map shared by request handlers and the worker
#[derive(Debug, Default)]
pub struct UserStore {
    users: DashMap<u64, UserEntry>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the user's entry, creating defaults on first contact.
    ///
    /// The returned guard holds the entry's shard lock; do not keep it
    /// across an `.await`.
    pub fn get_or_create(&self, user_id: u64) -> RefMut<'_, u64, UserEntry> {
        self.users.entry(user_id).or_insert_with(|| UserEntry {
            settings: UserSettings::new(user_id),
            flags: UserFlags::default(),
        })
    }

    /// Snapshot of the user's settings
    pub fn settings(&self, user_id: u64) -> UserSettings {
        self.get_or_create(user_id).settings.clone()
    }

    /// Mutate the user's settings in place and return the result
    pub fn update_settings<F>(&self, user_id: u64, f: F) -> UserSettings
    where
        F: FnOnce(&mut UserSettings),
    {
        let mut entry = self.get_or_create(user_id);
        f(&mut entry.settings);
        entry.settings.clone()
    }

    /// Current flags; unknown users have none set
    pub fn flags(&self, user_id: u64) -> UserFlags {
        self.users
            .get(&user_id)
            .map(|entry| entry.flags)
            .unwrap_or_default()
    }

    pub fn update_flags<F>(&self, user_id: u64, f: F)
    where
        F: FnOnce(&mut UserFlags),
    {
        f(&mut self.get_or_create(user_id).flags);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_defaults() {
        let store = UserStore::new();
        assert_eq!(store.len(), 0);

        let settings = store.settings(7);
        assert_eq!(settings.source, "auto");
        assert_eq!(settings.target, "en");
        assert_eq!(store.len(), 1);

        // Idempotent
        store.update_settings(7, |s| s.set_target("de"));
        assert_eq!(store.settings(7).target, "de");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_swap_rules() {
        let mut settings = UserSettings::new(1);
        settings.swap();
        assert_eq!((settings.source.as_str(), settings.target.as_str()), ("auto", "en"));

        settings.set_source("ru");
        settings.swap();
        assert_eq!((settings.source.as_str(), settings.target.as_str()), ("en", "ru"));

        settings.set_target("auto");
        assert_eq!(settings.target, "ru");
    }

    #[test]
    fn test_flags_are_exclusive() {
        let mut flags = UserFlags::default();
        assert!(!flags.is_active());

        flags.mark_queued();
        assert!(flags.queued && !flags.busy);
        assert!(flags.is_active());

        flags.mark_busy();
        assert!(flags.busy && !flags.queued);
        assert!(flags.is_active());

        flags.clear();
        assert!(!flags.is_active());
    }

    #[test]
    fn test_flags_for_unknown_user() {
        let store = UserStore::new();
        assert_eq!(store.flags(99), UserFlags::default());
        assert_eq!(store.len(), 0);
    }
}
