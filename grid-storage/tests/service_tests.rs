use common::decimal::dec;
use common::error::Error;
use common::model::provider::{EnergyType, NewEnergyProvider};
use common::model::request::NewEnergyRequest;
use common::model::user::{NewUser, UserType};
use grid_storage::{GridService, RepositoryType};

fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        username: name.to_string(),
        email: email.to_string(),
        password: "secret".to_string(),
        display_name: name.to_string(),
        user_type: UserType::Consumer,
        location: Some("Rooftop Lane 4".to_string()),
        profile_image: None,
    }
}

#[tokio::test]
async fn test_register_rejects_duplicates() {
    let service = GridService::new();

    service
        .register_user(new_user("alice", "alice@example.com"))
        .await
        .unwrap();

    // Same username, different email
    let err = service
        .register_user(new_user("alice", "other@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateUser(_)));

    // Same email, different username
    let err = service
        .register_user(new_user("bob", "alice@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateUser(_)));
}

#[tokio::test]
async fn test_authenticate() {
    let service = GridService::with_repository(RepositoryType::InMemory)
        .await
        .unwrap();
    service
        .register_user(new_user("carol", "carol@example.com"))
        .await
        .unwrap();

    let user = service.authenticate("carol", "secret").await.unwrap();
    assert_eq!(user.username, "carol");

    assert!(matches!(
        service.authenticate("carol", "wrong").await.unwrap_err(),
        Error::InvalidCredentials(_)
    ));
    assert!(matches!(
        service.authenticate("nobody", "secret").await.unwrap_err(),
        Error::InvalidCredentials(_)
    ));
}

#[tokio::test]
async fn test_provider_validation() {
    let service = GridService::new();
    let user = service
        .register_user(new_user("dave", "dave@example.com"))
        .await
        .unwrap();

    let mut provider = NewEnergyProvider {
        user_id: user.id,
        provider_name: "Roof array".to_string(),
        energy_type: EnergyType::Solar,
        max_capacity: dec!(0),
        current_production: dec!(0),
        available_energy: dec!(0),
        price_per_kwh: None,
        latitude: None,
        longitude: None,
        is_active: true,
    };

    assert!(matches!(
        service.register_provider(provider.clone()).await.unwrap_err(),
        Error::ValidationError(_)
    ));

    provider.max_capacity = dec!(10.0);
    provider.available_energy = dec!(20.0);
    assert!(matches!(
        service.register_provider(provider.clone()).await.unwrap_err(),
        Error::ValidationError(_)
    ));

    provider.available_energy = dec!(8.0);
    let created = service.register_provider(provider).await.unwrap();
    assert!(created.is_active);
}

#[tokio::test]
async fn test_request_validation() {
    let service = GridService::new();
    let user = service
        .register_user(new_user("erin", "erin@example.com"))
        .await
        .unwrap();

    let request = NewEnergyRequest {
        user_id: user.id,
        energy_amount: dec!(0),
        urgency_level: Default::default(),
        preferred_time_slot: None,
        max_price: None,
        requested_for: None,
    };

    assert!(matches!(
        service.submit_request(request).await.unwrap_err(),
        Error::ValidationError(_)
    ));
}

#[tokio::test]
async fn test_community_stats_lazy_init() {
    let service = GridService::new();

    let stats = service.community_stats().await.unwrap();
    assert_eq!(stats.total_production, dec!(0));
    assert_eq!(stats.active_providers, 0);

    // Second read returns the same singleton
    let again = service.community_stats().await.unwrap();
    assert_eq!(again.id, stats.id);
}
