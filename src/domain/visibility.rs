//! Post visibility and ownership rules.
//!
//! A post is public when it is published, filed under a published category and
//! its publication date has passed. Authors always see their own posts. The
//! same rules are expressed in SQL by `infra::db::posts`; [`is_publicly_visible`]
//! is the in-process form used by the detail page and the in-memory store.

use time::OffsetDateTime;

use crate::domain::entities::{CategoryRef, PostRecord};

/// Who is looking at a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(i64),
}

impl Viewer {
    pub fn user_id(self) -> Option<i64> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(id),
        }
    }

    pub fn is_user(self, id: i64) -> bool {
        self.user_id() == Some(id)
    }
}

/// Which posts a listing may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    /// Published posts in published categories whose publication date has passed.
    Public,
    /// Every post of one author, drafts and scheduled posts included.
    AuthorAll { author_id: i64 },
}

impl PostScope {
    /// Scope for a profile page: the owner sees everything, others see the public subset.
    pub fn for_profile(viewer: Viewer, author_id: i64) -> Self {
        if viewer.is_user(author_id) {
            PostScope::AuthorAll { author_id }
        } else {
            PostScope::Public
        }
    }
}

pub fn is_publicly_visible(
    post: &PostRecord,
    category: Option<&CategoryRef>,
    now: OffsetDateTime,
) -> bool {
    post.is_published
        && category.is_some_and(|category| category.is_published)
        && post.pub_date <= now
}

/// Detail-page rule: authors see their own posts unconditionally.
pub fn can_view(
    viewer: Viewer,
    post: &PostRecord,
    category: Option<&CategoryRef>,
    now: OffsetDateTime,
) -> bool {
    viewer.is_user(post.author_id) || is_publicly_visible(post, category, now)
}

/// Result of comparing an acting user with the author of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owner,
    NotOwner,
}

pub fn ownership(actor_id: i64, author_id: i64) -> Ownership {
    if actor_id == author_id {
        Ownership::Owner
    } else {
        Ownership::NotOwner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn post(author_id: i64, is_published: bool, pub_date: OffsetDateTime) -> PostRecord {
        PostRecord {
            id: 1,
            title: "Title".to_string(),
            text: "Text".to_string(),
            pub_date,
            image: None,
            author_id,
            location_id: None,
            category_id: Some(7),
            is_published,
            created_at: pub_date,
        }
    }

    fn category(is_published: bool) -> CategoryRef {
        CategoryRef {
            id: 7,
            title: "Travel".to_string(),
            slug: "travel".to_string(),
            is_published,
        }
    }

    #[test]
    fn public_requires_all_three_conditions() {
        let now = OffsetDateTime::now_utc();
        let past = now - Duration::hours(1);
        let future = now + Duration::hours(1);
        let published = category(true);
        let hidden = category(false);

        assert!(is_publicly_visible(&post(1, true, past), Some(&published), now));
        assert!(!is_publicly_visible(&post(1, false, past), Some(&published), now));
        assert!(!is_publicly_visible(&post(1, true, past), Some(&hidden), now));
        assert!(!is_publicly_visible(&post(1, true, future), Some(&published), now));
        assert!(!is_publicly_visible(&post(1, true, past), None, now));
    }

    #[test]
    fn pub_date_equal_to_now_is_visible() {
        let now = OffsetDateTime::now_utc();
        assert!(is_publicly_visible(
            &post(1, true, now),
            Some(&category(true)),
            now
        ));
    }

    #[test]
    fn author_sees_own_hidden_post() {
        let now = OffsetDateTime::now_utc();
        let draft = post(5, false, now + Duration::days(3));

        assert!(can_view(Viewer::User(5), &draft, None, now));
        assert!(!can_view(Viewer::User(6), &draft, None, now));
        assert!(!can_view(Viewer::Anonymous, &draft, None, now));
    }

    #[test]
    fn profile_scope_depends_on_viewer() {
        assert_eq!(
            PostScope::for_profile(Viewer::User(3), 3),
            PostScope::AuthorAll { author_id: 3 }
        );
        assert_eq!(PostScope::for_profile(Viewer::User(4), 3), PostScope::Public);
        assert_eq!(PostScope::for_profile(Viewer::Anonymous, 3), PostScope::Public);
    }

    #[test]
    fn ownership_compares_ids() {
        assert_eq!(ownership(1, 1), Ownership::Owner);
        assert_eq!(ownership(1, 2), Ownership::NotOwner);
    }
}
