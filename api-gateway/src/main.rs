//! API Gateway for the energy sharing platform

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use clap::Parser;
use common::decimal::dec;
use common::model::provider::{EnergyType, NewEnergyProvider};
use common::model::user::{NewUser, UserType};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_gateway::api::{
    providers::{create_provider, get_providers, get_user_providers, update_provider_energy},
    requests::{create_request, get_requests, get_user_requests},
    stats::get_community_stats,
    transactions::{get_recent_transactions, get_user_transactions},
    users::{get_user, login, register},
};
use api_gateway::config::AppConfig;
use api_gateway::ws::handler::ws_handler;
use api_gateway::AppState;
use energy_data::{spawn_heartbeat, ClientRegistry, SimulationConfig, Simulator};
use grid_storage::{
    GridRepository, GridService, InMemoryGridRepository, PostgresGridRepository,
    ProviderLockRegistry,
};
use matching_engine::MatchingEngine;

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // User routes
        api_gateway::api::users::register,
        api_gateway::api::users::login,
        api_gateway::api::users::get_user,
        // Provider routes
        api_gateway::api::providers::get_providers,
        api_gateway::api::providers::create_provider,
        api_gateway::api::providers::get_user_providers,
        api_gateway::api::providers::update_provider_energy,
        // Request routes
        api_gateway::api::requests::get_requests,
        api_gateway::api::requests::create_request,
        api_gateway::api::requests::get_user_requests,
        // Transaction routes
        api_gateway::api::transactions::get_user_transactions,
        api_gateway::api::transactions::get_recent_transactions,
        // Stats routes
        api_gateway::api::stats::get_community_stats,
    ),
    components(
        schemas(
            // User API
            api_gateway::api::users::LoginRequest,
            common::model::user::User,
            common::model::user::NewUser,
            common::model::user::UserType,

            // Provider API
            api_gateway::api::providers::UpdateEnergyRequest,
            common::model::provider::EnergyProvider,
            common::model::provider::NewEnergyProvider,
            common::model::provider::EnergyType,

            // Request API
            common::model::request::EnergyRequest,
            common::model::request::NewEnergyRequest,
            common::model::request::UrgencyLevel,
            common::model::request::RequestStatus,

            // Transaction API
            api_gateway::api::transactions::RecentTransactionsQuery,
            common::model::transaction::EnergyTransaction,
            common::model::transaction::TransactionStatus,

            // Stats API
            common::model::stats::CommunityStats,

            // Response models
            api_gateway::api::response::ApiResponse<common::model::user::User>,
            api_gateway::api::response::ApiResponse<common::model::provider::EnergyProvider>,
            api_gateway::api::response::ApiResponse<common::model::request::EnergyRequest>,
            api_gateway::api::response::ApiResponse<common::model::stats::CommunityStats>,
            api_gateway::api::response::ApiListResponse<common::model::provider::EnergyProvider>,
            api_gateway::api::response::ApiListResponse<common::model::request::EnergyRequest>,
            api_gateway::api::response::ApiListResponse<common::model::transaction::EnergyTransaction>,
            api_gateway::api::response::ResponseMetadata
        )
    ),
    tags(
        (name = "user", description = "User registration and lookup"),
        (name = "provider", description = "Energy provider endpoints"),
        (name = "request", description = "Energy request endpoints"),
        (name = "transaction", description = "Energy transaction endpoints"),
        (name = "stats", description = "Community statistics endpoints")
    ),
    info(
        title = "GridShare API",
        version = "1.0.0",
        description = "API for the peer-to-peer energy sharing platform: provider registration, energy requests with matching, and live community data"
    )
)]
struct ApiDoc;

/// Energy sharing API server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    addr: String,

    /// Seed a few demo users and providers at startup
    #[clap(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging with debug level when DEBUG=1 env var is set
    let env = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug,energy_data=debug,matching_engine=debug,grid_storage=debug")
        .unwrap();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    debug!("Debug logging enabled");

    // Initialize storage
    let config = AppConfig::new();
    let repo: Arc<dyn GridRepository> = if config.database_url.is_some() {
        let pool = common::db::init_db_pool().await?;
        common::db::run_migrations(&pool).await?;
        Arc::new(PostgresGridRepository::with_pool(pool))
    } else {
        info!("DATABASE_URL not set, using in-memory storage");
        Arc::new(InMemoryGridRepository::new())
    };

    // Initialize services
    let locks = Arc::new(ProviderLockRegistry::new());
    let registry = Arc::new(ClientRegistry::new());
    let storage = Arc::new(GridService::with_repo(repo.clone()));
    let matching_engine = Arc::new(MatchingEngine::new(
        repo.clone(),
        locks.clone(),
        registry.clone(),
    ));
    let simulator = Arc::new(Simulator::new(
        repo.clone(),
        locks.clone(),
        registry.clone(),
        SimulationConfig::default(),
    ));

    if args.demo {
        info!("Seeding demo data...");
        seed_demo_data(&storage).await?;
    }

    // Start background tasks: production simulation and the heartbeat sweep
    let simulation_task = tokio::spawn(simulator.run());
    let heartbeat_task = spawn_heartbeat(registry.clone(), config.heartbeat_interval);

    // Create app state
    let state = Arc::new(AppState {
        storage,
        matching_engine,
        registry: registry.clone(),
        locks,
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Set up API routes
    let api_routes = Router::new()
        // User routes
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/users/:id", get(get_user))
        // Provider routes
        .route("/providers", get(get_providers).post(create_provider))
        .route("/providers/user/:user_id", get(get_user_providers))
        .route("/providers/:id/energy", put(update_provider_energy))
        // Request routes
        .route("/requests", get(get_requests).post(create_request))
        .route("/requests/user/:user_id", get(get_user_requests))
        // Transaction routes
        .route("/transactions/user/:user_id", get(get_user_transactions))
        .route("/transactions/recent", get(get_recent_transactions))
        // Stats routes
        .route("/community/stats", get(get_community_stats));

    // Set up websocket route
    let ws_routes = Router::new().route("/ws", get(ws_handler));

    // Set up Swagger UI
    let swagger_ui = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi());

    // Combine all routes
    let app = Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .merge(swagger_ui)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(log_level))
                .on_request(DefaultOnRequest::new().level(log_level))
                .on_response(DefaultOnResponse::new().level(log_level)),
        )
        .with_state(state);

    // Start the server
    let addr: std::net::SocketAddr = args.addr.parse().expect("Invalid address");
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    // Run until interrupt signal
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Tear down background work and close every client connection
    simulation_task.abort();
    heartbeat_task.abort();
    registry.close_all();

    Ok(())
}

/// Seed a handful of demo users and providers
async fn seed_demo_data(storage: &GridService) -> common::error::Result<()> {
    let producer = storage
        .register_user(NewUser {
            username: "sunny-roof".to_string(),
            email: "sunny@example.com".to_string(),
            password: "demo".to_string(),
            display_name: "Sunny Roof".to_string(),
            user_type: UserType::Provider,
            location: Some("Elm Street 12".to_string()),
            profile_image: None,
        })
        .await?;

    storage
        .register_user(NewUser {
            username: "night-owl".to_string(),
            email: "owl@example.com".to_string(),
            password: "demo".to_string(),
            display_name: "Night Owl".to_string(),
            user_type: UserType::Consumer,
            location: Some("Oak Avenue 3".to_string()),
            profile_image: None,
        })
        .await?;

    storage
        .register_provider(NewEnergyProvider {
            user_id: producer.id,
            provider_name: "Rooftop solar array".to_string(),
            energy_type: EnergyType::Solar,
            max_capacity: dec!(25.0),
            current_production: dec!(12.0),
            available_energy: dec!(10.0),
            price_per_kwh: Some(dec!(0.18)),
            latitude: None,
            longitude: None,
            is_active: true,
        })
        .await?;

    storage
        .register_provider(NewEnergyProvider {
            user_id: producer.id,
            provider_name: "Garage battery".to_string(),
            energy_type: EnergyType::Battery,
            max_capacity: dec!(10.0),
            current_production: dec!(0.0),
            available_energy: dec!(8.0),
            price_per_kwh: None,
            latitude: None,
            longitude: None,
            is_active: true,
        })
        .await?;

    info!("Demo data seeded");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
