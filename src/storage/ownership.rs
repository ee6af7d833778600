// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Creator checks for mutations.
//!
//! Trips and expenses may only be changed by the identity that created them.
//! A failed check is not an error: the caller refuses the mutation and
//! leaves both storage and local state untouched.

/// Trait for records that remember who created them.
pub trait CreatedResource {
    /// The creator's user ID. Set once at creation and never changed.
    fn creator_id(&self) -> &str;

    /// Whether `viewer_id` is this record's creator.
    ///
    /// An absent viewer never matches.
    fn is_created_by(&self, viewer_id: Option<&str>) -> bool {
        viewer_id.is_some_and(|viewer| viewer == self.creator_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestResource {
        creator: String,
    }

    impl CreatedResource for TestResource {
        fn creator_id(&self) -> &str {
            &self.creator
        }
    }

    #[test]
    fn creator_matches() {
        let resource = TestResource {
            creator: "user_123".to_string(),
        };
        assert!(resource.is_created_by(Some("user_123")));
    }

    #[test]
    fn other_user_does_not_match() {
        let resource = TestResource {
            creator: "user_123".to_string(),
        };
        assert!(!resource.is_created_by(Some("user_456")));
    }

    #[test]
    fn absent_viewer_never_matches() {
        let resource = TestResource {
            creator: String::new(),
        };
        assert!(!resource.is_created_by(None));
    }
}
