mod support;

use axum::http::StatusCode;
use time::{Duration, OffsetDateTime};

use support::{PostSeed, TestApp, body_to_string, card_titles};

#[tokio::test]
async fn index_hides_drafts_future_posts_and_hidden_categories() {
    let app = TestApp::new();
    let author = app.store.add_user("ann");
    let open = app.store.add_category("travel", true);
    let closed = app.store.add_category("secret", false);

    app.store
        .add_post(PostSeed::public("Visible", author.id, open.id));
    app.store.add_post(PostSeed {
        is_published: false,
        ..PostSeed::public("Draft", author.id, open.id)
    });
    app.store.add_post(PostSeed {
        pub_date: OffsetDateTime::now_utc() + Duration::days(2),
        ..PostSeed::public("Scheduled", author.id, open.id)
    });
    app.store
        .add_post(PostSeed::public("Filed away", author.id, closed.id));

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_to_string(response.into_body()).await;
    assert_eq!(card_titles(&html), vec!["Visible".to_string()]);
}

#[tokio::test]
async fn index_lists_newest_first() {
    let app = TestApp::new();
    let author = app.store.add_user("ann");
    let category = app.store.add_category("travel", true);
    let now = OffsetDateTime::now_utc();

    for (title, hours_ago) in [("Oldest", 30), ("Newest", 1), ("Middle", 10)] {
        app.store.add_post(PostSeed {
            pub_date: now - Duration::hours(hours_ago),
            ..PostSeed::public(title, author.id, category.id)
        });
    }

    let html = body_to_string(app.get("/", None).await.into_body()).await;
    insta::assert_snapshot!(card_titles(&html).join(" | "), @"Newest | Middle | Oldest");
}

#[tokio::test]
async fn listings_paginate_by_ten() {
    let app = TestApp::new();
    let author = app.store.add_user("ann");
    let category = app.store.add_category("travel", true);
    let now = OffsetDateTime::now_utc();
    for n in 1..=12 {
        app.store.add_post(PostSeed {
            pub_date: now - Duration::hours(n),
            ..PostSeed::public(&format!("Post {n:02}"), author.id, category.id)
        });
    }

    let first = body_to_string(app.get("/", None).await.into_body()).await;
    let titles = card_titles(&first);
    assert_eq!(titles.len(), 10);
    assert_eq!(titles.first().map(String::as_str), Some("Post 01"));
    assert!(first.contains("Page 1 of 2"));

    let second = body_to_string(app.get("/?page=2", None).await.into_body()).await;
    assert_eq!(card_titles(&second), vec!["Post 11", "Post 12"]);

    let last = body_to_string(app.get("/?page=last", None).await.into_body()).await;
    assert_eq!(card_titles(&last), vec!["Post 11", "Post 12"]);
    assert!(last.contains("Page 2 of 2"));

    for page in ["3", "0", "abc"] {
        let response = app.get(&format!("/?page={page}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "page={page}");
    }
}

#[tokio::test]
async fn category_page_requires_published_category() {
    let app = TestApp::new();
    let author = app.store.add_user("ann");
    let open = app.store.add_category("travel", true);
    let closed = app.store.add_category("secret", false);
    let other = app.store.add_category("food", true);
    app.store
        .add_post(PostSeed::public("Alps", author.id, open.id));
    app.store
        .add_post(PostSeed::public("Soup", author.id, other.id));

    let response = app.get("/category/travel/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_to_string(response.into_body()).await;
    assert_eq!(card_titles(&html), vec!["Alps"]);
    assert!(html.contains("About travel"));

    assert_eq!(
        app.get(&format!("/category/{}/", closed.slug), None)
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get("/category/missing/", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn profile_owner_sees_own_drafts() {
    let app = TestApp::new();
    let (author, token) = app.signed_in("ann");
    let category = app.store.add_category("travel", true);
    app.store
        .add_post(PostSeed::public("Shared", author.id, category.id));
    app.store.add_post(PostSeed {
        is_published: false,
        ..PostSeed::public("Private", author.id, category.id)
    });

    let own = body_to_string(app.get("/profile/ann/", Some(&token)).await.into_body()).await;
    let mut titles = card_titles(&own);
    titles.sort();
    assert_eq!(titles, vec!["Private", "Shared"]);

    let public = body_to_string(app.get("/profile/ann/", None).await.into_body()).await;
    assert_eq!(card_titles(&public), vec!["Shared"]);

    assert_eq!(
        app.get("/profile/nobody/", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn hidden_post_detail_is_visible_only_to_author() {
    let app = TestApp::new();
    let (author, token) = app.signed_in("ann");
    let (_, stranger) = app.signed_in("bob");
    let category = app.store.add_category("travel", true);
    let draft = app.store.add_post(PostSeed {
        is_published: false,
        ..PostSeed::public("Draft", author.id, category.id)
    });
    let uri = format!("/posts/{}/", draft.id);

    assert_eq!(app.get(&uri, None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        app.get(&uri, Some(&stranger)).await.status(),
        StatusCode::NOT_FOUND
    );

    let response = app.get(&uri, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("<h1>Draft</h1>"));
    assert!(html.contains("No comments yet."));
}

#[tokio::test]
async fn non_numeric_post_id_is_not_found() {
    let app = TestApp::new();
    for uri in ["/posts/abc/", "/posts/0/", "/posts/999/", "/no/such/page"] {
        assert_eq!(
            app.get(uri, None).await.status(),
            StatusCode::NOT_FOUND,
            "{uri}"
        );
    }
}

#[tokio::test]
async fn static_pages_render() {
    let app = TestApp::new();
    for uri in ["/pages/about/", "/pages/rules/"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let html = body_to_string(response.into_body()).await;
        assert!(html.contains("Log in"));
    }
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = TestApp::new();
    assert_eq!(
        app.get("/_health/db", None).await.status(),
        StatusCode::NO_CONTENT
    );
}
