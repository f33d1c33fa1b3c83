use axum::http::StatusCode;
use integration_tests::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn banned_users_are_locked_out_but_anonymous_reads_work() {
    let app = TestApp::new();
    let root = app.superuser("root").await;
    let alice = app.user("alice").await;
    let slug = app.thread(&alice, "Before the ban").await;

    let until = TestApp::hours_from_now(24);
    let (status, _) = app
        .moderate(&root, "alice", json!({ "banned_until": until }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/api/threads", &alice, json!({ "title": "During the ban" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "banned");

    let (status, body) = app.get("/api/threads", Some(&alice)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "banned");

    let (status, body) = app
        .post(&format!("/api/threads/{slug}/posts"), &alice, json!({ "body": "x" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "banned");

    let (status, body) = app.get("/api/banned", Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bannedUntil"], until);

    let (status, _) = app.get("/api/threads", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn silenced_users_can_read_vote_and_edit_their_profile_but_not_write() {
    let app = TestApp::new();
    let root = app.superuser("root").await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let slug = app.thread(&bob, "Bob's thread").await;
    let post_id = app.reply(&bob, &slug, "first").await;

    let (status, _) = app
        .moderate(&root, "alice", json!({ "silenced_until": TestApp::hours_from_now(2) }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/api/threads", &alice, json!({ "title": "Quiet" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "silenced");

    let (status, body) = app
        .post(&format!("/api/threads/{slug}/posts"), &alice, json!({ "body": "hi" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "silenced");

    let (status, body) = app
        .post("/api/users/bob/comments", &alice, json!({ "body": "hi" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "silenced");

    let (status, _) = app.get(&format!("/api/threads/{slug}/posts"), Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, tally) = app
        .post(
            &format!("/api/threads/{slug}/posts/{post_id}/rate"),
            &alice,
            json!({ "value": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tally["score"], 1);

    let (status, profile) = app
        .patch("/api/me/profile", &alice, json!({ "bio": "still here" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["bio"], "still here");
}

#[tokio::test]
async fn past_windows_are_inert() {
    let app = TestApp::new();
    let root = app.superuser("root").await;
    let alice = app.user("alice").await;

    let (status, _) = app
        .moderate(
            &root,
            "alice",
            json!({
                "banned_until": TestApp::hours_from_now(-1),
                "silenced_until": TestApp::hours_from_now(-1),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    app.thread(&alice, "Back again").await;
}

#[tokio::test]
async fn hierarchy_rules() {
    let app = TestApp::new();
    let root = app.superuser("root").await;
    let staff1 = app.staff("staff1").await;
    app.staff("staff2").await;
    app.user("plain").await;
    let until = TestApp::hours_from_now(1);

    let (status, body) = app
        .moderate(&staff1, "staff2", json!({ "banned_until": until }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "hierarchy");

    let (status, body) = app
        .moderate(&staff1, "root", json!({ "banned_until": until }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "hierarchy");

    let (status, body) = app
        .moderate(&staff1, "staff1", json!({ "banned_until": until }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "hierarchy");

    let (status, body) = app
        .moderate(&root, "root", json!({ "banned_until": until }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "hierarchy");

    let (status, body) = app
        .moderate(&root, "staff1", json!({ "silenced_until": until }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["silencedUntil"], until);

    let (status, _) = app
        .moderate(&staff1, "plain", json!({ "banned_until": until }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn moderation_needs_staff_and_a_known_target() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let staff = app.staff("staff").await;
    app.user("bob").await;

    let (status, body) = app
        .moderate(&alice, "bob", json!({ "banned_until": TestApp::hours_from_now(1) }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "staff_only");

    let (status, _) = app
        .moderate(&staff, "nobody", json!({ "banned_until": TestApp::hours_from_now(1) }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .moderate(&staff, "bob", json!({ "banned_until": "next tuesday" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");
}

#[tokio::test]
async fn windows_are_set_cleared_and_kept_independently() {
    let app = TestApp::new();
    let root = app.superuser("root").await;
    app.user("bob").await;
    let silence = TestApp::hours_from_now(3);
    let ban = TestApp::hours_from_now(5);

    let (_, body) = app
        .moderate(&root, "bob", json!({ "silenced_until": silence, "banned_until": ban }))
        .await;
    assert_eq!(body["silencedUntil"], silence);
    assert_eq!(body["bannedUntil"], ban);

    let (_, body) = app
        .moderate(&root, "bob", json!({ "banned_until": null }))
        .await;
    assert_eq!(body["silencedUntil"], silence);
    assert_eq!(body["bannedUntil"], Value::Null);

    let (_, body) = app
        .moderate(&root, "bob", json!({ "silenced_until": "0" }))
        .await;
    assert_eq!(body["silencedUntil"], Value::Null);

    let (_, body) = app.moderate(&root, "bob", json!({})).await;
    assert_eq!(body["silencedUntil"], Value::Null);
    assert_eq!(body["bannedUntil"], Value::Null);
}

#[tokio::test]
async fn silenced_authors_can_delete_but_not_edit() {
    let app = TestApp::new();
    let root = app.superuser("root").await;
    let alice = app.user("alice").await;
    let slug = app.thread(&alice, "Mine").await;
    let url = format!("/api/threads/{slug}");

    app.moderate(&root, "alice", json!({ "silenced_until": TestApp::hours_from_now(1) }))
        .await;

    let (status, body) = app.patch(&url, &alice, json!({ "title": "Edited" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "silenced");

    let (status, _) = app.delete(&url, &alice).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
