use axum::http::StatusCode;
use integration_tests::TestApp;
use serde_json::json;

#[tokio::test]
async fn same_titles_get_distinct_slugs() {
    let app = TestApp::new();
    let alice = app.user("alice").await;

    let first = app.thread(&alice, "Hello, World!").await;
    let second = app.thread(&alice, "Hello, World!").await;
    assert_ne!(first, second);
    for slug in [&first, &second] {
        assert!(slug.starts_with("hello-world-"), "{slug}");
        assert_eq!(slug.len(), "hello-world-".len() + 8);
    }

    let (status, fetched) = app.get(&format!("/api/threads/{first}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Hello, World!");
}

#[tokio::test]
async fn explicit_slugs_are_unique() {
    let app = TestApp::new();
    let alice = app.user("alice").await;

    let (status, created) = app
        .post("/api/threads", &alice, json!({ "title": "Rules", "slug": "rules" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "rules");

    let (status, body) = app
        .post("/api/threads", &alice, json!({ "title": "More rules", "slug": "rules" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

#[tokio::test]
async fn listing_is_newest_first_and_paginated() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let mut slugs = Vec::new();
    for title in ["one", "two", "three"] {
        slugs.push(app.thread(&alice, title).await);
    }

    let (_, all) = app.get("/api/threads", None).await;
    let titles: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["three", "two", "one"]);

    let (_, page) = app.get("/api/threads?limit=1&offset=1", None).await;
    assert_eq!(page.as_array().unwrap().len(), 1);
    assert_eq!(page[0]["slug"], slugs[1]);
}

#[tokio::test]
async fn titles_are_validated() {
    let app = TestApp::new();
    let alice = app.user("alice").await;

    let (status, body) = app.post("/api/threads", &alice, json!({ "title": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "title");

    let (status, body) = app
        .post("/api/threads", &alice, json!({ "title": "x".repeat(201) }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "title");

    let (status, body) = app.post("/api/threads", &alice, json!({ "nope": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");
}

#[tokio::test]
async fn only_the_author_or_staff_may_change_a_thread() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let staff = app.staff("mod").await;
    let slug = app.thread(&alice, "Original").await;
    let url = format!("/api/threads/{slug}");

    let (status, body) = app.patch(&url, &bob, json!({ "title": "Hijacked" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "not_author");

    let (status, updated) = app.patch(&url, &alice, json!({ "title": "Renamed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["slug"], slug);

    let (status, body) = app.delete(&url, &bob).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "not_author");

    let (status, _) = app.delete(&url, &staff).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn deleting_a_thread_removes_its_posts() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let slug = app.thread(&alice, "Doomed").await;
    let post = app.reply(&alice, &slug, "first").await;
    app.reply(&alice, &slug, "second").await;

    let (_, thread) = app.get(&format!("/api/threads/{slug}"), None).await;
    assert_eq!(thread["postsCount"], 2);

    app.delete(&format!("/api/threads/{slug}"), &alice).await;
    let (status, _) = app
        .get(&format!("/api/threads/{slug}/posts/{post}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("/api/threads/{slug}/posts"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_threads_are_not_found_even_for_writers() {
    let app = TestApp::new();
    let alice = app.user("alice").await;

    let (status, _) = app
        .post("/api/threads/missing/posts", &alice, json!({ "body": "hello?" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request("POST", "/api/threads/missing/posts", None, Some(json!({ "body": "x" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
