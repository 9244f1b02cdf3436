//! Router-level tests for notes, documents and citizen requests.

use axum::http::{Request, StatusCode};
use axum::body::Body;
use chrono::{DateTime, Utc};
use foncier_test_utils::{assertions, fixtures};
use serde_json::json;

#[path = "support/app.rs"]
mod app;
use app::*;

// ============================================================================
// NOTES
// ============================================================================

#[tokio::test]
async fn test_note_crud_cycle() {
    let (app, _) = test_app();
    let parcel_id = create_parcel(&app, &fixtures::create_parcel_body()).await;
    let notes_uri = format!("/api/parcels/{}/notes", parcel_id);

    let (status, note) = post_json(&app, &notes_uri, &json!({ "note": "Bornage à refaire" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["author"], "Agent");
    let note_uri = format!("{}/{}", notes_uri, note["id"].as_str().unwrap());

    let (status, edited) = put_json(&app, &note_uri, &json!({ "note": "Bornage refait" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["note"], "Bornage refait");
    assert_eq!(edited["created_at"], note["created_at"]);

    post_json(&app, &notes_uri, &json!({ "note": "Second passage", "author": "Géomètre" })).await;
    let (_, listed) = get_json(&app, &notes_uri).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assertions::assert_newest_first(listed, |n| {
        n["created_at"]
            .as_str()
            .and_then(|s| s.parse::<DateTime<Utc>>().ok())
            .unwrap()
    });
    assert_eq!(listed[0]["author"], "Géomètre");

    let delete = Request::builder()
        .method("DELETE")
        .uri(&note_uri)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let delete_again = Request::builder()
        .method("DELETE")
        .uri(&note_uri)
        .body(Body::empty())
        .unwrap();
    let (status, error) = send(&app, delete_again).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "Note not found");
}

#[tokio::test]
async fn test_note_requires_text_and_parcel() {
    let (app, _) = test_app();
    let parcel_id = create_parcel(&app, &fixtures::create_parcel_body()).await;

    let (status, error) = post_json(
        &app,
        &format!("/api/parcels/{}/notes", parcel_id),
        &json!({ "note": "  " }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Missing field: note");

    let (status, _) = post_json(
        &app,
        "/api/parcels/0192f0c1-0000-7000-8000-000000000000/notes",
        &json!({ "note": "orpheline" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_note_is_scoped_to_its_parcel() {
    let (app, _) = test_app();
    let first = create_parcel(&app, &fixtures::create_parcel_body()).await;
    let second = create_parcel(&app, &fixtures::create_parcel_body()).await;

    let (_, note) = post_json(
        &app,
        &format!("/api/parcels/{}/notes", first),
        &json!({ "note": "Visite" }),
    )
    .await;

    let (status, _) = put_json(
        &app,
        &format!("/api/parcels/{}/notes/{}", second, note["id"].as_str().unwrap()),
        &json!({ "note": "Détournée" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// DOCUMENTS
// ============================================================================

#[tokio::test]
async fn test_upload_pairs_files_with_types() {
    let config = test_config(true);
    let upload_dir = config.upload_dir.clone();
    let (app, _) = test_app_with(config);
    let parcel_id = create_parcel(&app, &fixtures::create_parcel_body()).await;
    let uri = format!("/api/parcels/{}/documents", parcel_id);

    let body = multipart_body(
        &[
            ("titre.pdf", "application/pdf", &b"%PDF-1.4 titre"[..]),
            ("../../plan.png", "image/png", &b"\x89PNG plan"[..]),
        ],
        &["Titre foncier", "Plan cadastral"],
    );
    let (status, documents) = send(&app, multipart_request(&uri, body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", documents);

    let documents = documents.as_array().unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0]["type"], "Titre foncier");
    assert_eq!(documents[0]["mime"], "application/pdf");
    assert_eq!(documents[0]["size_bytes"], 14);
    assert_eq!(documents[1]["type"], "Plan cadastral");

    let stored = documents[1]["file_path"].as_str().unwrap();
    assert!(stored.starts_with(&parcel_id));
    assert!(!stored.contains(".."));
    assert!(upload_dir.join(stored).exists());

    let (_, listed) = get_json(&app, &uri).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let (status, single) = get_json(
        &app,
        &format!("{}/{}", uri, documents[0]["id"].as_str().unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(single["original_name"], "titre.pdf");

    let (status, _) = send(&app, get(&format!("/uploads/{}", stored))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_upload_requires_files_and_types() {
    let (app, _) = test_app();
    let parcel_id = create_parcel(&app, &fixtures::create_parcel_body()).await;
    let uri = format!("/api/parcels/{}/documents", parcel_id);

    let (status, error) = send(&app, multipart_request(&uri, multipart_body(&[], &["Titre"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Missing field: files");

    let only_files = multipart_body(&[("a.txt", "text/plain", &b"a"[..])], &[]);
    let (status, error) = send(&app, multipart_request(&uri, only_files)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Missing field: types");

    let (_, listed) = get_json(&app, &uri).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_to_unknown_parcel_is_not_found() {
    let (app, _) = test_app();
    let body = multipart_body(&[("a.txt", "text/plain", &b"a"[..])], &["Titre"]);
    let (status, _) = send(
        &app,
        multipart_request(
            "/api/parcels/0192f0c1-0000-7000-8000-000000000000/documents",
            body,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// CITIZEN REQUESTS
// ============================================================================

#[tokio::test]
async fn test_request_lifecycle() {
    let (app, _) = test_app();

    let (status, created) = post_json(
        &app,
        "/api/requests",
        &fixtures::create_request_body("KIN-GOM-0001"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "En attente");
    let uri = format!("/api/requests/{}/status", created["id"].as_str().unwrap());

    let (_, pending) = get_json(&app, "/api/requests?status=En%20attente").await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, approved) = put_json(&app, &uri, &json!({ "status": "Approuvé" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "Approuvé");

    let (status, again) = put_json(&app, &uri, &json!({ "status": "Approuvé" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["updated_at"], approved["updated_at"]);

    let (status, error) = put_json(&app, &uri, &json!({ "status": "Rejeté" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "STATE_CONFLICT");

    let (_, pending) = get_json(&app, "/api/requests?status=En%20attente").await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_request_validation() {
    let (app, _) = test_app();

    let (status, error) = post_json(
        &app,
        "/api/requests",
        &json!({ "citizen_name": "Rachel", "document_type": "Extrait" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Missing field: parcel_reference");

    let (_, created) = post_json(
        &app,
        "/api/requests",
        &fixtures::create_request_body("KIN-GOM-0001"),
    )
    .await;
    let (status, _) = put_json(
        &app,
        &format!("/api/requests/{}/status", created["id"].as_str().unwrap()),
        &json!({ "status": "Archivé" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, error) = get_json(
        &app,
        "/api/requests/0192f0c1-0000-7000-8000-000000000000",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "Request not found");
}
