mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;

use common::TestServer;
use huddle::store::Store;

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    let server = TestServer::new().await;

    let (status, body) = server
        .request("GET", "/spaceadministration/list", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["reason"], json!("no_logged_in_user"));

    // Unknown token is indistinguishable from no token.
    let request = Request::builder()
        .method("GET")
        .uri("/spaceadministration/list")
        .header(header::AUTHORIZATION, "Bearer tok-nobody")
        .body(Body::empty())
        .unwrap();
    let response = server.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_open() {
    let server = TestServer::new().await;
    let (status, _) = server.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_space_requires_capability() {
    let server = TestServer::new().await;

    // "user" role has create_space; revoke it and try.
    let (status, _) = server
        .post_json("/global_acl?role=user", "root", json!({"create_space": false}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .post("/spaceadministration/create?name=denied", "alice")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], json!("insufficient_permission"));

    // Grant it back and the same call succeeds with creator as sole admin.
    server
        .post_json("/global_acl?role=user", "root", json!({"create_space": true}))
        .await;
    let (status, body) = server
        .post("/spaceadministration/create?name=general", "alice")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["space"]["members"], json!(["alice"]));
    assert_eq!(body["space"]["admins"], json!(["alice"]));
}

#[tokio::test]
async fn test_join_direct_when_capability_granted() {
    let server = TestServer::new().await;
    let id = server.create_space("alice", "open").await;

    // Members of role "user" may join directly once the space row says so.
    let (status, _) = server
        .post_json(
            &format!("/space_acl?id={id}&role=user"),
            "alice",
            json!({"join_space": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .post(&format!("/spaceadministration/join?id={id}"), "bob")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["join_type"], json!("joined"));

    let (_, body) = server
        .get(&format!("/spaceadministration/info?id={id}"), "alice")
        .await;
    let members = body["space"]["members"].as_array().unwrap();
    assert!(members.contains(&json!("bob")));
}

#[tokio::test]
async fn test_join_falls_back_to_request_and_admin_accepts() {
    let server = TestServer::new().await;
    let id = server.create_space("alice", "gated").await;

    // No join_space for "user": the join downgrades to a request.
    let (status, body) = server
        .post(&format!("/spaceadministration/join?id={id}"), "bob")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["join_type"], json!("requested_join"));

    // Visible to the space admin, invisible membership-wise.
    let (_, body) = server
        .get(&format!("/spaceadministration/requests?id={id}"), "alice")
        .await;
    assert_eq!(body["users"], json!(["bob"]));

    // Non-admin cannot see the internals.
    let (status, _) = server
        .get(&format!("/spaceadministration/requests?id={id}"), "carol")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .post(
            &format!("/spaceadministration/accept_request?id={id}&user=bob"),
            "alice",
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = server
        .get(&format!("/spaceadministration/info?id={id}"), "alice")
        .await;
    assert!(
        body["space"]["members"]
            .as_array()
            .unwrap()
            .contains(&json!("bob"))
    );
    assert_eq!(body["space"]["requests"], json!([]));
}

#[tokio::test]
async fn test_invite_flow_delivers_notification() {
    let server = TestServer::new().await;
    let id = server.create_space("alice", "team").await;

    let (status, _) = server
        .post(
            &format!("/spaceadministration/invite?id={id}&user=carol"),
            "alice",
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Delivery is async through the worker pool.
    let mut delivered = vec![];
    for _ in 0..50 {
        delivered = server.store.list_notifications("carol").unwrap();
        if !delivered.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].actor, "alice");

    let (status, _) = server
        .post(&format!("/spaceadministration/accept_invite?id={id}"), "carol")
        .await;
    assert_eq!(status, StatusCode::OK);

    // Accepting again conflicts: the invite is consumed.
    let (status, body) = server
        .post(&format!("/spaceadministration/accept_invite?id={id}"), "carol")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], json!("user_is_not_invited_into_space"));
}

#[tokio::test]
async fn test_last_admin_cannot_leave() {
    let server = TestServer::new().await;
    let id = server.create_space("alice", "solo").await;

    let (status, body) = server
        .delete(&format!("/spaceadministration/leave?id={id}"), "alice")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], json!("no_other_admins_left"));
}

#[tokio::test]
async fn test_admin_acl_rows_are_immutable() {
    let server = TestServer::new().await;

    let (status, body) = server
        .post_json("/global_acl?role=admin", "root", json!({"create_space": false}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], json!("admin_role_immutable"));

    let id = server.create_space("alice", "team").await;
    let (status, body) = server
        .post_json(
            &format!("/space_acl?id={id}&role=admin"),
            "alice",
            json!({"post": false}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], json!("admin_role_immutable"));
}

#[tokio::test]
async fn test_timeline_capability_and_membership_gates() {
    let server = TestServer::new().await;
    let id = server.create_space("alice", "feed").await;
    server
        .post_json(
            &format!("/space_acl?id={id}&role=user"),
            "alice",
            json!({"join_space": true, "read_timeline": true}),
        )
        .await;
    server
        .post(&format!("/spaceadministration/join?id={id}"), "bob")
        .await;

    // Member without the post capability.
    let (status, body) = server
        .post_json(
            &format!("/timeline/post?id={id}"),
            "bob",
            json!({"text": "hello"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], json!("insufficient_permission"));

    // Space admin posts freely.
    let (status, body) = server
        .post_json(
            &format!("/timeline/post?id={id}"),
            "alice",
            json!({"text": "welcome"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let post_id = body["post"]["id"].as_str().unwrap().to_string();

    // Member reads; outsider does not.
    let (status, body) = server.get(&format!("/timeline/space?id={id}"), "bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);

    let (status, _) = server
        .get(&format!("/timeline/space?id={id}"), "carol")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Comments follow the same space gates.
    server
        .post_json(
            &format!("/space_acl?id={id}&role=user"),
            "alice",
            json!({"join_space": true, "read_timeline": true, "comment": true}),
        )
        .await;
    let (status, _) = server
        .post_json(
            &format!("/timeline/comment?post_id={post_id}"),
            "bob",
            json!({"text": "hi"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .get(&format!("/timeline/comments?post_id={post_id}"), "bob")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_full_timeline_is_admin_only() {
    let server = TestServer::new().await;
    let (status, body) = server.get("/timeline/all", "alice").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], json!("insufficient_permission"));

    let (status, _) = server.get("/timeline/all", "root").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_role_management() {
    let server = TestServer::new().await;

    // Only global admins may reassign roles.
    let (status, _) = server
        .post("/role/user?user=bob&role=moderator", "alice")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let id = server.create_space("alice", "team").await;
    let (status, _) = server
        .post("/role/user?user=bob&role=moderator", "root")
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server.get("/role/user?user=bob", "root").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], json!("moderator"));

    // The new role got its row in the existing space.
    assert!(
        server
            .store
            .get_space_acl("moderator", &id)
            .unwrap()
            .is_some()
    );

    let (status, body) = server.get("/role/exists?role=moderator", "bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], json!(true));

    let (status, body) = server
        .post("/role/user?user=ghost&role=user", "root")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], json!("user_doesnt_exist"));
}

#[tokio::test]
async fn test_follow_is_idempotent_with_304() {
    let server = TestServer::new().await;

    let (status, _) = server.post("/follow?user=bob", "alice").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server.post("/follow?user=bob", "alice").await;
    assert_eq!(status, StatusCode::NOT_MODIFIED);

    let (status, _) = server.delete("/follow?user=bob", "alice").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server.delete("/follow?user=bob", "alice").await;
    assert_eq!(status, StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn test_report_lifecycle() {
    let server = TestServer::new().await;

    let (status, body) = server
        .post_json(
            "/report",
            "bob",
            json!({"item_type": "post", "item_id": "p1", "reason": "spam"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let report_id = body["report"]["report_id"].as_str().unwrap().to_string();

    // Reading and closing is for admins.
    let (status, _) = server.get("/report/list", "bob").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server.get("/report/list?open_only=true", "root").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reports"].as_array().unwrap().len(), 1);

    let (status, _) = server
        .post(&format!("/report/close?id={report_id}"), "root")
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .post(&format!("/report/close?id={report_id}"), "root")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], json!("report_doesnt_exist"));
}

#[tokio::test]
async fn test_delete_space_cascades() {
    let server = TestServer::new().await;
    let id = server.create_space("alice", "doomed").await;
    server
        .post(
            &format!("/spaceadministration/invite?id={id}&user=carol"),
            "alice",
        )
        .await;

    let (status, _) = server
        .delete(&format!("/spaceadministration/delete_space?id={id}"), "alice")
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .get(&format!("/spaceadministration/info?id={id}"), "alice")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], json!("space_doesnt_exist"));

    assert!(server.store.list_space_acl(&id).unwrap().is_empty());
}

#[tokio::test]
async fn test_invisible_space_hidden_from_outsiders() {
    let server = TestServer::new().await;
    let (_, body) = server
        .post(
            "/spaceadministration/create?name=secret&invisible=true",
            "alice",
        )
        .await;
    let id = body["space"]["id"].as_str().unwrap().to_string();

    let (_, body) = server.get("/spaceadministration/list", "bob").await;
    assert!(
        body["spaces"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["id"] != json!(id))
    );

    // Global admins see everything.
    let (_, body) = server.get("/spaceadministration/list", "root").await;
    assert!(
        body["spaces"]
            .as_array()
            .unwrap()
            .iter()
            .any(|s| s["id"] == json!(id))
    );

    let (status, body) = server
        .get(&format!("/spaceadministration/info?id={id}"), "bob")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], json!("space_doesnt_exist"));
}

#[tokio::test]
async fn test_missing_query_parameter() {
    let server = TestServer::new().await;
    let (status, body) = server.post("/spaceadministration/join", "alice").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], json!("missing_key:id"));
}

#[tokio::test]
async fn test_file_upload_download_delete() {
    let server = TestServer::new().await;
    let id = server.create_space("alice", "docs").await;

    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nhello files\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri(format!("/spaceadministration/files/upload?id={id}"))
        .header(header::AUTHORIZATION, format!("Bearer {}", common::token("alice")))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = server.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let file_id = json["file"]["file_id"].as_str().unwrap().to_string();
    assert_eq!(json["file"]["filename"], serde_json::json!("notes.txt"));

    // Download round-trips the bytes for a reader.
    let request = Request::builder()
        .method("GET")
        .uri(format!(
            "/spaceadministration/files/download?id={id}&file_id={file_id}"
        ))
        .header(header::AUTHORIZATION, format!("Bearer {}", common::token("alice")))
        .body(Body::empty())
        .unwrap();
    let response = server.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"hello files");

    // Outsiders cannot read files.
    let (status, _) = server
        .get(
            &format!("/spaceadministration/files/download?id={id}&file_id={file_id}"),
            "carol",
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .delete(
            &format!("/spaceadministration/files/delete?id={id}&file_id={file_id}"),
            "alice",
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .delete(
            &format!("/spaceadministration/files/delete?id={id}&file_id={file_id}"),
            "alice",
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], json!("file_doesnt_exist"));
}

#[tokio::test]
async fn test_user_timeline_and_search_are_prefiltered() {
    let server = TestServer::new().await;
    let id = server.create_space("alice", "feed").await;
    server
        .post_json(
            &format!("/space_acl?id={id}&role=user"),
            "alice",
            json!({"join_space": true, "read_timeline": true, "post": true}),
        )
        .await;
    server
        .post(&format!("/spaceadministration/join?id={id}"), "bob")
        .await;

    server
        .post_json(
            &format!("/timeline/post?id={id}"),
            "alice",
            json!({"text": "quarterly report ready"}),
        )
        .await;
    server
        .post_json(
            &format!("/timeline/post?id={id}"),
            "bob",
            json!({"text": "lunch plans"}),
        )
        .await;

    // Bob follows nobody: only his own posts show up.
    let (status, body) = server.get("/timeline/user", "bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);

    server.post("/follow?user=alice", "bob").await;
    let (_, body) = server.get("/timeline/user", "bob").await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 2);

    // Search runs over the same candidate set.
    let (status, body) = server.get("/search?query=report", "bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);

    // Carol is not a member: nothing leaks into search.
    server.post("/follow?user=alice", "carol").await;
    let (_, body) = server.get("/search?query=report", "carol").await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 0);
}
