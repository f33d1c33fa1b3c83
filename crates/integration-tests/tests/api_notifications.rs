use axum::http::StatusCode;
use integration_tests::TestApp;
use serde_json::{json, Value};

fn kinds(listing: &Value) -> Vec<&str> {
    let mut kinds: Vec<&str> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["type"].as_str().unwrap())
        .collect();
    kinds.sort_unstable();
    kinds
}

#[tokio::test]
async fn a_mentioning_reply_yields_both_notifications() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let slug = app.thread(&alice, "Alice asks").await;
    let post = app.reply(&bob, &slug, "hi @alice").await;

    let (status, listing) = app.get("/api/notifications", Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kinds(&listing), ["mention", "thread_reply"]);

    let reply = listing
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["type"] == "thread_reply")
        .unwrap();
    assert_eq!(reply["payload"]["threadSlug"], slug);
    assert_eq!(reply["payload"]["postId"], post);
    assert_eq!(reply["payload"]["actorUsername"], "bob");
    assert_eq!(reply["readAt"], Value::Null);

    let (_, bobs) = app.get("/api/notifications", Some(&bob)).await;
    assert!(bobs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn mentions_are_deduplicated_and_skip_the_author() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let carol = app.user("carol").await;
    let slug = app.thread(&bob, "Bob's thread").await;

    app.reply(&bob, &slug, "@carol @carol @bob @ghost and @alice").await;

    let (_, carols) = app.get("/api/notifications", Some(&carol)).await;
    assert_eq!(kinds(&carols), ["mention"]);
    assert_eq!(carols[0]["payload"]["mentionedUsername"], "carol");
    assert_eq!(carols[0]["payload"]["type"], "post");

    let (_, alices) = app.get("/api/notifications", Some(&alice)).await;
    assert_eq!(kinds(&alices), ["mention"]);

    let (_, bobs) = app.get("/api/notifications", Some(&bob)).await;
    assert!(bobs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unread_filter_and_mark_read() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let slug = app.thread(&alice, "Inbox").await;
    app.reply(&bob, &slug, "one").await;
    app.reply(&bob, &slug, "two").await;

    let (_, listing) = app.get("/api/notifications", Some(&alice)).await;
    assert_eq!(listing.as_array().unwrap().len(), 2);
    let id = listing[0]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request("POST", &format!("/api/notifications/{id}/read"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (_, unread) = app.get("/api/notifications?unread=1", Some(&alice)).await;
    assert_eq!(unread.as_array().unwrap().len(), 1);
    assert_ne!(unread[0]["id"], id.as_str());

    let (_, all) = app.get("/api/notifications?unread=0", Some(&alice)).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    let read = all
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == id.as_str())
        .unwrap();
    assert!(read["readAt"].is_i64());
}

#[tokio::test]
async fn other_users_notifications_are_not_found() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let slug = app.thread(&alice, "Private").await;
    app.reply(&bob, &slug, "ping").await;

    let (_, listing) = app.get("/api/notifications", Some(&alice)).await;
    let id = listing[0]["id"].as_str().unwrap();

    let (status, _) = app
        .request("POST", &format!("/api/notifications/{id}/read"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, unread) = app.get("/api/notifications?unread=true", Some(&alice)).await;
    assert_eq!(unread.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn profile_comments_notify_the_owner() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;

    let (status, comment) = app
        .post("/api/users/alice/comments", &bob, json!({ "body": "nice profile" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listing) = app.get("/api/notifications", Some(&alice)).await;
    assert_eq!(kinds(&listing), ["profile_comment"]);
    assert_eq!(listing[0]["payload"]["username"], "alice");
    assert_eq!(listing[0]["payload"]["commentId"], comment["id"]);
    assert_eq!(listing[0]["payload"]["actorUsername"], "bob");

    app.post("/api/users/alice/comments", &alice, json!({ "body": "thanks" }))
        .await;
    let (_, listing) = app.get("/api/notifications", Some(&alice)).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn anonymous_callers_have_no_inbox() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/notifications", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");
}
