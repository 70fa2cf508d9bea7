use std::sync::Arc;

use assert_matches::assert_matches;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::test_utils::{init_test_tracing, time};
use specialist_cell::{
    CreateSpecialistRequest, InMemorySpecialistStore, SpecialistError, SpecialistSearchFilters,
    SpecialistService, Specialty, UpdateSpecialistRequest,
};

fn service() -> SpecialistService {
    init_test_tracing();
    SpecialistService::new(Arc::new(InMemorySpecialistStore::new()))
}

fn create_request(name: &str, specialty: Specialty) -> CreateSpecialistRequest {
    CreateSpecialistRequest {
        user_id: Uuid::new_v4(),
        name: name.to_string(),
        specialty,
        email: format!("{}@studio.test", name.to_lowercase()),
        phone_number: Some("07700900123".to_string()),
        availability_start: time(9, 0),
        availability_end: time(17, 0),
        is_active: None,
        session_price_pence: None,
    }
}

#[tokio::test]
async fn test_create_specialist_applies_defaults() {
    let service = service();

    let specialist = assert_ok!(service.create_specialist(create_request("Jo", Specialty::Hairdresser)).await);

    assert!(specialist.is_active);
    assert_eq!(specialist.session_price_pence, 5000);
    assert_eq!(specialist.availability.to_string(), "09:00 to 17:00");

    let fetched = assert_ok!(service.get_specialist(specialist.id).await);
    assert_eq!(fetched, specialist);
}

#[tokio::test]
async fn test_create_specialist_rejects_inverted_window() {
    let service = service();
    let mut request = create_request("Jo", Specialty::Hairdresser);
    request.availability_start = time(18, 0);
    request.availability_end = time(8, 0);

    let err = assert_err!(service.create_specialist(request).await);
    assert_matches!(err, SpecialistError::InvalidAvailabilityWindow { .. });

    let app_error: AppError = err.into();
    assert_eq!(app_error.field(), Some("availability_end"));
}

#[tokio::test]
async fn test_create_specialist_validates_contact_details() {
    let service = service();

    let mut bad_email = create_request("Jo", Specialty::Hairdresser);
    bad_email.email = "not-an-email".to_string();
    assert_matches!(
        service.create_specialist(bad_email).await,
        Err(SpecialistError::ValidationError(_))
    );

    let mut short_phone = create_request("Jo", Specialty::Hairdresser);
    short_phone.phone_number = Some("0770".to_string());
    assert_matches!(
        service.create_specialist(short_phone).await,
        Err(SpecialistError::ValidationError(msg)) if msg.contains("at least 11")
    );

    let mut blank_name = create_request("  ", Specialty::Hairdresser);
    blank_name.email = "blank@studio.test".to_string();
    assert_matches!(
        service.create_specialist(blank_name).await,
        Err(SpecialistError::ValidationError(_))
    );
}

#[tokio::test]
async fn test_update_window_checks_against_unchanged_bound() {
    let service = service();
    let specialist = service.create_specialist(create_request("Jo", Specialty::Hairdresser)).await.unwrap();

    // Moving only the start past the existing 17:00 end is invalid.
    let err = service
        .update_specialist(
            specialist.id,
            UpdateSpecialistRequest { availability_start: Some(time(18, 0)), ..Default::default() },
        )
        .await
        .unwrap_err();
    assert_matches!(err, SpecialistError::InvalidAvailabilityWindow { .. });

    let updated = service
        .update_specialist(
            specialist.id,
            UpdateSpecialistRequest { availability_end: Some(time(20, 0)), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(updated.availability_start(), time(9, 0));
    assert_eq!(updated.availability_end(), time(20, 0));
}

#[tokio::test]
async fn test_list_specialists_filters() {
    let service = service();
    let tattoo = service.create_specialist(create_request("Ash", Specialty::TattooArtist)).await.unwrap();
    let _hair = service.create_specialist(create_request("Bea", Specialty::Hairdresser)).await.unwrap();
    let mut late = create_request("Cat", Specialty::TattooArtist);
    late.availability_start = time(12, 0);
    late.availability_end = time(22, 0);
    let late = service.create_specialist(late).await.unwrap();

    let tattooists = service
        .list_specialists(&SpecialistSearchFilters {
            specialty: Some(Specialty::TattooArtist),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(tattooists.iter().map(|s| s.id).collect::<Vec<_>>(), vec![tattoo.id, late.id]);

    service.set_active(tattoo.id, false).await.unwrap();
    let evening = service
        .list_specialists(&SpecialistSearchFilters {
            active_only: true,
            available_at: Some(time(19, 0)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(evening.len(), 1);
    assert_eq!(evening[0].id, late.id);
}

#[tokio::test]
async fn test_missing_specialist_is_not_found() {
    let service = service();
    assert_matches!(service.get_specialist(Uuid::new_v4()).await, Err(SpecialistError::NotFound));
    assert_matches!(
        service.set_active(Uuid::new_v4(), false).await,
        Err(SpecialistError::NotFound)
    );
}
