use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_database::supabase::SupabaseClient;
use shared_utils::test_utils::{time, MockSupabaseResponses, TestConfig};
use specialist_cell::{
    SpecialistError, SpecialistSearchFilters, SpecialistStore, Specialty, SupabaseSpecialistStore,
};

fn store_for(server: &MockServer) -> SupabaseSpecialistStore {
    let config = TestConfig::with_url(&server.uri()).to_app_config();
    SupabaseSpecialistStore::new(Arc::new(SupabaseClient::new(&config)), "test-service-token")
}

#[tokio::test]
async fn test_get_parses_specialist_row() {
    let server = MockServer::start().await;
    let specialist_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/specialists"))
        .and(query_param("id", format!("eq.{}", specialist_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::specialist_response(specialist_id, user_id, "09:00:00", "17:00:00")
        ])))
        .mount(&server)
        .await;

    let specialist = store_for(&server).get(specialist_id).await.unwrap().unwrap();
    assert_eq!(specialist.user_id, user_id);
    assert_eq!(specialist.availability_start(), time(9, 0));
    assert_eq!(specialist.specialty, Specialty::TattooArtist);
}

#[tokio::test]
async fn test_list_pushes_filters_into_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/specialists"))
        .and(query_param("specialty", "eq.tattoo_artist"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::specialist_response(Uuid::new_v4(), Uuid::new_v4(), "09:00:00", "17:00:00")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let specialists = store_for(&server)
        .list(&SpecialistSearchFilters {
            specialty: Some(Specialty::TattooArtist),
            active_only: true,
            available_at: None,
        })
        .await
        .unwrap();
    assert_eq!(specialists.len(), 1);
}

#[tokio::test]
async fn test_update_of_missing_row_is_not_found() {
    let server = MockServer::start().await;
    let specialist_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/specialists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::specialist_response(specialist_id, Uuid::new_v4(), "09:00:00", "17:00:00")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/specialists"))
        .and(body_partial_json(json!({ "is_active": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let mut specialist = store.get(specialist_id).await.unwrap().unwrap();
    specialist.is_active = false;

    assert_matches!(store.update(specialist).await, Err(SpecialistError::NotFound));
}

#[tokio::test]
async fn test_server_error_maps_to_database_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_json(
            MockSupabaseResponses::error_response("boom", "XX000"),
        ))
        .mount(&server)
        .await;

    assert_matches!(
        store_for(&server).get(Uuid::new_v4()).await,
        Err(SpecialistError::DatabaseError(_))
    );
}
