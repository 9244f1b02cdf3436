//! Router-level tests for parcels and their audit trail.

use axum::{body::Body, http::Request, http::StatusCode};
use foncier_core::{ParcelStatus, RegistryStats};
use foncier_storage::RegistryStore;
use foncier_test_utils::fixtures;
use serde_json::json;

#[path = "support/app.rs"]
mod app;
use app::*;

#[tokio::test]
async fn test_create_parcel_applies_defaults() {
    let (app, _) = test_app();

    let (status, parcel) = post_json(&app, "/api/parcels", &fixtures::create_parcel_body()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(parcel["reference"].as_str().unwrap().starts_with("AUTO-"));
    assert_eq!(parcel["status"], "Libre");
    assert_eq!(parcel["certificate_number"], "");
    assert_eq!(parcel["company_name"], serde_json::Value::Null);
    assert_eq!(parcel["created_at"], parcel["updated_at"]);
}

#[tokio::test]
async fn test_create_parcel_reports_first_missing_field() {
    let (app, _) = test_app();

    let mut body = fixtures::create_parcel_body();
    let obj = body.as_object_mut().unwrap();
    obj.remove("owner_name");
    obj.insert("province".to_string(), json!("   "));

    let (status, error) = post_json(&app, "/api/parcels", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Missing field: province");
    assert_eq!(error["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn test_create_parcel_rejects_non_numeric_area() {
    let (app, _) = test_app();

    let mut body = fixtures::create_parcel_body();
    body["area"] = json!("beaucoup");

    let (status, error) = post_json(&app, "/api/parcels", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Invalid numeric fields");
}

#[tokio::test]
async fn test_duplicate_reference_is_conflict() {
    let (app, _) = test_app();
    let body = fixtures::create_parcel_body_with_reference("KIN-GOM-0001");

    create_parcel(&app, &body).await;
    let (status, error) = post_json(&app, "/api/parcels", &body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"], "Reference already exists");
}

#[tokio::test]
async fn test_get_parcel_by_id_and_reference() {
    let (app, _) = test_app();
    let id = create_parcel(&app, &fixtures::create_parcel_body_with_reference("KIN-LIM-0042")).await;

    let (status, by_id) = get_json(&app, &format!("/api/parcels/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["reference"], "KIN-LIM-0042");

    let (status, by_ref) = get_json(&app, "/api/parcels/KIN-LIM-0042").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_ref["id"], id.as_str());

    let (status, error) = get_json(&app, "/api/parcels/UNKNOWN-REF").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "Parcel not found");
}

#[tokio::test]
async fn test_list_parcels_filters_and_paginates() {
    let (app, store) = test_app();
    store
        .parcel_insert(&fixtures::parcel_in("KIN-1", "Kinshasa", ParcelStatus::Free))
        .await
        .unwrap();
    store
        .parcel_insert(&fixtures::parcel_in("KIN-2", "Kinshasa", ParcelStatus::Disputed))
        .await
        .unwrap();
    store
        .parcel_insert(&fixtures::parcel_in("LUB-1", "Haut-Katanga", ParcelStatus::Free))
        .await
        .unwrap();

    let (_, all) = get_json(&app, "/api/parcels?status=all").await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, disputed) = get_json(&app, "/api/parcels?status=En%20litige").await;
    let disputed = disputed.as_array().unwrap();
    assert_eq!(disputed.len(), 1);
    assert_eq!(disputed[0]["reference"], "KIN-2");

    let (_, kinshasa) = get_json(&app, "/api/parcels?province=Kinshasa&q=kin").await;
    assert_eq!(kinshasa.as_array().unwrap().len(), 2);

    let (_, page) = get_json(&app, "/api/parcels?limit=2&offset=2").await;
    assert_eq!(page.as_array().unwrap().len(), 1);

    let (status, _) = get_json(&app, "/api/parcels?status=Vendu").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/api/parcels?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_records_history_under_actor() {
    let (app, _) = test_app();
    let id = create_parcel(&app, &fixtures::create_parcel_body()).await;

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/parcels/{}", id))
        .header("content-type", "application/json")
        .header("x-user", "Conservateur")
        .body(Body::from(
            json!({ "area": 750, "status": "Hypothéqué", "owner_name": "Kalala" }).to_string(),
        ))
        .unwrap();
    let (status, parcel) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parcel["area"], 750.0);
    assert_eq!(parcel["status"], "Hypothéqué");
    assert_ne!(parcel["updated_at"], parcel["created_at"]);

    let (status, history) = get_json(&app, &format!("/api/parcels/{}/history", id)).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["user"], "Conservateur");

    let changes = history[0]["changes"].as_object().unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes["area"]["from"], 500.0);
    assert_eq!(changes["area"]["to"], 750.0);
    assert_eq!(changes["status"]["to"], "Hypothéqué");
}

#[tokio::test]
async fn test_unchanged_update_writes_no_history() {
    let (app, _) = test_app();
    let id = create_parcel(&app, &fixtures::create_parcel_body()).await;
    let (_, before) = get_json(&app, &format!("/api/parcels/{}", id)).await;

    let (status, after) = put_json(
        &app,
        &format!("/api/parcels/{}", id),
        &json!({ "province": "Kinshasa", "area": 500 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["updated_at"], before["updated_at"]);

    let (_, history) = get_json(&app, &format!("/api/parcels/{}/history", id)).await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_rejects_null_required_field() {
    let (app, _) = test_app();
    let id = create_parcel(&app, &fixtures::create_parcel_body()).await;

    let (status, error) = put_json(
        &app,
        &format!("/api/parcels/{}", id),
        &json!({ "owner_name": null }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Missing field: owner_name");
}

#[tokio::test]
async fn test_update_unknown_or_malformed_id() {
    let (app, _) = test_app();

    let (status, _) = put_json(
        &app,
        "/api/parcels/0192f0c1-0000-7000-8000-000000000000",
        &json!({ "area": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, error) = put_json(&app, "/api/parcels/not-a-uuid", &json!({ "area": 10 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_FORMAT");
}

#[tokio::test]
async fn test_manual_history_entry_and_filters() {
    let (app, _) = test_app();
    let id = create_parcel(&app, &fixtures::create_parcel_body()).await;
    let uri = format!("/api/parcels/{}/history", id);

    let (status, entry) = post_json(
        &app,
        &uri,
        &json!({
            "changes": { "avenue": { "from": "Kasa-Vubu", "to": "Kabambare" } },
            "user": "Géomètre"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["user"], "Géomètre");

    let (status, error) = post_json(&app, &uri, &json!({ "user": "Agent" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Missing field: changes");

    let (_, hits) = get_json(&app, &format!("{}?q=kabambare", uri)).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let (_, misses) = get_json(&app, &format!("{}?q=inconnu", uri)).await;
    assert!(misses.as_array().unwrap().is_empty());

    let (_, old) = get_json(&app, &format!("{}?to=2000-01-01", uri)).await;
    assert!(old.as_array().unwrap().is_empty());

    let (status, _) = get_json(&app, &format!("{}?from=2024-05-01&to=2024-04-01", uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_of_unknown_parcel_is_not_found() {
    let (app, _) = test_app();
    let (status, _) = get_json(
        &app,
        "/api/parcels/0192f0c1-0000-7000-8000-000000000000/history",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_follow_parcel_status() {
    let (app, store) = test_app();
    store
        .parcel_insert(&fixtures::parcel_in("A-1", "Kinshasa", ParcelStatus::Free))
        .await
        .unwrap();
    store
        .parcel_insert(&fixtures::parcel_in("A-2", "Kinshasa", ParcelStatus::Mortgaged))
        .await
        .unwrap();
    store
        .request_insert(&fixtures::pending_request("A-1"))
        .await
        .unwrap();

    let (status, body) = get_json(&app, "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    let stats: RegistryStats = serde_json::from_value(body).unwrap();
    assert_eq!(stats.total_parcels, 2);
    assert_eq!(stats.free_parcels, 1);
    assert_eq!(stats.mortgaged_parcels, 1);
    assert_eq!(stats.disputed_parcels, 0);
    assert_eq!(stats.pending_requests, 1);

    let (status, extended) = get_json(&app, "/api/stats/extended").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(extended["parcelsThisMonth"], 2);
    assert_eq!(extended["monthlyEvolution"].as_array().unwrap().len(), 12);
    assert_eq!(extended["parcelsByProvince"][0]["province"], "Kinshasa");
    assert_eq!(extended["parcelsByProvince"][0]["c"], 2);
}

#[tokio::test]
async fn test_malformed_list_queries_return_error_body() {
    let (app, _) = test_app();
    let id = create_parcel(&app, &fixtures::create_parcel_body()).await;

    for uri in [
        "/api/parcels?limit=abc".to_string(),
        "/api/parcels?offset=-1".to_string(),
        "/api/requests?status=all&status=Approuvé".to_string(),
        format!("/api/parcels/{}/history?q=a&q=b", id),
    ] {
        let (status, error) = get_json(&app, &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(error["code"], "INVALID_INPUT", "{}", uri);
        assert!(
            error["error"].as_str().unwrap().starts_with("Invalid query string"),
            "{}",
            uri
        );
    }
}

#[tokio::test]
async fn test_out_of_range_paging_is_rejected() {
    let (app, _) = test_app();

    let (status, error) = get_json(&app, "/api/parcels?limit=1001").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_RANGE");

    let (status, error) = get_json(&app, "/api/parcels?offset=18446744073709551615").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_RANGE");

    let (status, parcels) = get_json(&app, "/api/parcels?offset=9223372036854775807").await;
    assert_eq!(status, StatusCode::OK);
    assert!(parcels.as_array().unwrap().is_empty());
}
