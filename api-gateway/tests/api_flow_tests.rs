//! Handler-level flow tests against in-memory storage

use std::sync::Arc;

use api_gateway::api::providers::{create_provider, update_provider_energy, UpdateEnergyRequest};
use api_gateway::api::requests::create_request;
use api_gateway::api::users::{get_user, login, register, LoginRequest};
use api_gateway::AppState;
use axum::extract::{Path, State};
use axum::Json;
use common::decimal::dec;
use common::model::provider::{EnergyType, NewEnergyProvider};
use common::model::request::{NewEnergyRequest, RequestStatus, UrgencyLevel};
use common::model::user::{NewUser, UserType};
use energy_data::{ClientRegistry, OutboundFrame};
use grid_storage::{GridService, InMemoryGridRepository, ProviderLockRegistry};
use matching_engine::MatchingEngine;
use tokio::sync::mpsc;

fn app_state() -> Arc<AppState> {
    let repo = Arc::new(InMemoryGridRepository::new());
    let locks = Arc::new(ProviderLockRegistry::new());
    let registry = Arc::new(ClientRegistry::new());
    let storage = Arc::new(GridService::with_repo(repo.clone()));
    let matching_engine = Arc::new(MatchingEngine::new(repo, locks.clone(), registry.clone()));
    Arc::new(AppState {
        storage,
        matching_engine,
        registry,
        locks,
    })
}

fn new_user(name: &str, user_type: UserType) -> NewUser {
    NewUser {
        username: name.to_string(),
        email: format!("{}@example.com", name),
        password: "secret".to_string(),
        display_name: name.to_string(),
        user_type,
        location: None,
        profile_image: None,
    }
}

fn received_event_types(rx: &mut mpsc::UnboundedReceiver<OutboundFrame>) -> Vec<String> {
    let mut types = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let OutboundFrame::Event(message) = frame {
            let value: serde_json::Value = serde_json::from_str(&message).unwrap();
            types.push(value["type"].as_str().unwrap().to_string());
        }
    }
    types
}

#[tokio::test]
async fn request_submission_matches_and_broadcasts() {
    let state = app_state();
    let (tx, mut rx) = mpsc::unbounded_channel();
    state.registry.register(tx);

    let producer = register(
        State(state.clone()),
        Json(new_user("producer", UserType::Provider)),
    )
    .await
    .unwrap()
    .data;

    let consumer = register(
        State(state.clone()),
        Json(new_user("consumer", UserType::Consumer)),
    )
    .await
    .unwrap()
    .data;

    create_provider(
        State(state.clone()),
        Json(NewEnergyProvider {
            user_id: producer.id,
            provider_name: "Roof array".to_string(),
            energy_type: EnergyType::Solar,
            max_capacity: dec!(20.0),
            current_production: dec!(10.0),
            available_energy: dec!(10.0),
            price_per_kwh: Some(dec!(0.20)),
            latitude: None,
            longitude: None,
            is_active: true,
        }),
    )
    .await
    .unwrap();

    let request = create_request(
        State(state.clone()),
        Json(NewEnergyRequest {
            user_id: consumer.id,
            energy_amount: dec!(5.0),
            urgency_level: UrgencyLevel::Immediate,
            preferred_time_slot: None,
            max_price: None,
            requested_for: None,
        }),
    )
    .await
    .unwrap()
    .data;

    // Matching ran synchronously before the submission was acknowledged
    assert_eq!(request.status, RequestStatus::Matched);
    assert!(request.matched_provider_id.is_some());

    // The transaction was priced off the provider
    let transactions = state.storage.transactions_for_user(consumer.id).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].total_price, dec!(1.00));

    // provider_added, then match_found from the engine, then new_request
    let types = received_event_types(&mut rx);
    assert_eq!(types, vec!["provider_added", "match_found", "new_request"]);
}

#[tokio::test]
async fn unmatched_request_stays_pending_and_only_announces_itself() {
    let state = app_state();
    let (tx, mut rx) = mpsc::unbounded_channel();
    state.registry.register(tx);

    let consumer = register(
        State(state.clone()),
        Json(new_user("loner", UserType::Consumer)),
    )
    .await
    .unwrap()
    .data;

    let request = create_request(
        State(state.clone()),
        Json(NewEnergyRequest {
            user_id: consumer.id,
            energy_amount: dec!(5.0),
            urgency_level: UrgencyLevel::Normal,
            preferred_time_slot: None,
            max_price: None,
            requested_for: None,
        }),
    )
    .await
    .unwrap()
    .data;

    assert_eq!(request.status, RequestStatus::Pending);
    assert!(state
        .storage
        .transactions_for_user(consumer.id)
        .await
        .unwrap()
        .is_empty());

    let types = received_event_types(&mut rx);
    assert_eq!(types, vec!["new_request"]);
}

#[tokio::test]
async fn login_and_lookup() {
    let state = app_state();

    let user = register(
        State(state.clone()),
        Json(new_user("frida", UserType::Both)),
    )
    .await
    .unwrap()
    .data;

    let logged_in = login(
        State(state.clone()),
        Json(LoginRequest {
            username: "frida".to_string(),
            password: "secret".to_string(),
        }),
    )
    .await
    .unwrap()
    .data;
    assert_eq!(logged_in.id, user.id);

    assert!(login(
        State(state.clone()),
        Json(LoginRequest {
            username: "frida".to_string(),
            password: "nope".to_string(),
        }),
    )
    .await
    .is_err());

    let fetched = get_user(State(state.clone()), Path(user.id)).await.unwrap().data;
    assert_eq!(fetched.username, "frida");

    assert!(get_user(State(state), Path(9999)).await.is_err());
}

#[tokio::test]
async fn manual_energy_update_broadcasts() {
    let state = app_state();

    let producer = register(
        State(state.clone()),
        Json(new_user("tinkerer", UserType::Provider)),
    )
    .await
    .unwrap()
    .data;

    let provider = create_provider(
        State(state.clone()),
        Json(NewEnergyProvider {
            user_id: producer.id,
            provider_name: "Wind turbine".to_string(),
            energy_type: EnergyType::Wind,
            max_capacity: dec!(15.0),
            current_production: dec!(5.0),
            available_energy: dec!(4.0),
            price_per_kwh: None,
            latitude: None,
            longitude: None,
            is_active: true,
        }),
    )
    .await
    .unwrap()
    .data;

    let (tx, mut rx) = mpsc::unbounded_channel();
    state.registry.register(tx);

    let updated = update_provider_energy(
        State(state.clone()),
        Path(provider.id),
        Json(UpdateEnergyRequest {
            current_production: dec!(9.0),
            available_energy: dec!(7.5),
        }),
    )
    .await
    .unwrap()
    .data;

    assert_eq!(updated.current_production, dec!(9.0));
    assert_eq!(updated.available_energy, dec!(7.5));

    let types = received_event_types(&mut rx);
    assert_eq!(types, vec!["energy_update"]);

    // Updating a missing provider is a 404-mapped error
    assert!(update_provider_energy(
        State(state),
        Path(9999),
        Json(UpdateEnergyRequest {
            current_production: dec!(1.0),
            available_energy: dec!(1.0),
        }),
    )
    .await
    .is_err());
}
