mod support;

use std::collections::HashMap;

use axum::http::StatusCode;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use blogicum::application::{
    accounts::METRIC_SIGN_IN_FAILED_TOTAL, comments::METRIC_COMMENTS_CREATED_TOTAL,
    posts::METRIC_POSTS_CREATED_TOTAL,
};
use support::{PostSeed, TestApp};

#[tokio::test]
async fn write_paths_increment_counters() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let app = TestApp::new();
    let (author, token) = app.signed_in("ann");
    let category = app.store.add_category("travel", true);
    let post = app
        .store
        .add_post(PostSeed::public("Alps", author.id, category.id));

    for text in ["one", "two"] {
        let response = app
            .post_form(
                &format!("/posts/{}/comment/", post.id),
                &format!("text={text}"),
                Some(&token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let category_id = category.id.to_string();
    let response = app
        .post_multipart(
            "/posts/create/",
            &[
                ("title", "Andes"),
                ("text", "High"),
                ("pub_date", "2024-05-01T12:00"),
                ("category", &category_id),
            ],
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .post_form("/auth/login/", "username=nobody&password=whatever", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let counters: HashMap<String, u64> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(key, _, _, value)| match value {
            DebugValue::Counter(count) => Some((key.key().name().to_string(), count)),
            _ => None,
        })
        .collect();

    assert_eq!(counters.get(METRIC_COMMENTS_CREATED_TOTAL), Some(&2));
    assert_eq!(counters.get(METRIC_POSTS_CREATED_TOTAL), Some(&1));
    assert_eq!(counters.get(METRIC_SIGN_IN_FAILED_TOTAL), Some(&1));
}
