//! Server initialization and routing

use crate::api;
use crate::cache::CacheManager;
use crate::config::{Config, FieldsSchema};
use crate::repository::{
    BankAccountRepositoryImpl, CountryAuthorityRepositoryImpl, CredentialRepositoryImpl,
    CurrencyRepositoryImpl, FieldsReader, FieldsWriter, LegacyFieldsRepository,
    MySqlConfigUnitOfWork, ProviderMethodRepositoryImpl, ProviderRepositoryImpl,
    ScopedFieldsRepository, StpRuleRepositoryImpl, TransactionConfigRepositoryImpl,
};
use crate::repository::RestrictionRepositoryImpl;
use crate::service::{
    BankAccountsService, ConfigUpsertService, CredentialsService, FieldsService,
    MethodConfigsService, RestrictionsService, StpRulesService,
};
use anyhow::Result;
use axum::{
    routing::{get, put},
    Router,
};
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

type AppCredentialsService = CredentialsService<
    CredentialRepositoryImpl,
    ProviderRepositoryImpl,
    CountryAuthorityRepositoryImpl,
    CurrencyRepositoryImpl,
>;
type AppBankAccountsService = BankAccountsService<
    BankAccountRepositoryImpl,
    ProviderRepositoryImpl,
    CountryAuthorityRepositoryImpl,
    CurrencyRepositoryImpl,
>;
type AppStpRulesService =
    StpRulesService<StpRuleRepositoryImpl, ProviderRepositoryImpl, CountryAuthorityRepositoryImpl>;
type AppRestrictionsService = RestrictionsService<
    RestrictionRepositoryImpl,
    ProviderRepositoryImpl,
    CountryAuthorityRepositoryImpl,
>;
type AppFieldsService = FieldsService<
    ProviderRepositoryImpl,
    CountryAuthorityRepositoryImpl,
    CurrencyRepositoryImpl,
>;
type AppMethodConfigsService = MethodConfigsService<
    ProviderRepositoryImpl,
    ProviderMethodRepositoryImpl,
    TransactionConfigRepositoryImpl,
    CurrencyRepositoryImpl,
>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub cache_manager: Option<CacheManager>,
    pub config_upsert_service: Arc<ConfigUpsertService<MySqlConfigUnitOfWork>>,
    pub fields_service: Arc<AppFieldsService>,
    pub credentials_service: Arc<AppCredentialsService>,
    pub bank_accounts_service: Arc<AppBankAccountsService>,
    pub stp_rules_service: Arc<AppStpRulesService>,
    pub restrictions_service: Arc<AppRestrictionsService>,
    pub method_configs_service: Arc<AppMethodConfigsService>,
}

/// Run the HTTP server
pub async fn run(config: Config) -> Result<()> {
    // Create database connection pool
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    info!("Connected to database");

    // Cache is best-effort; the service runs without Redis
    let cache_manager = match CacheManager::new(&config.redis).await {
        Ok(cache) => {
            info!("Connected to Redis");
            Some(cache)
        }
        Err(e) => {
            warn!("Redis unavailable, running without cache: {}", e);
            None
        }
    };

    // Create repositories
    let provider_repo = Arc::new(ProviderRepositoryImpl::new(db_pool.clone()));
    let country_authority_repo = Arc::new(CountryAuthorityRepositoryImpl::new(db_pool.clone()));
    let currency_repo = Arc::new(CurrencyRepositoryImpl::new(db_pool.clone()));
    let provider_method_repo = Arc::new(ProviderMethodRepositoryImpl::new(db_pool.clone()));
    let credential_repo = Arc::new(CredentialRepositoryImpl::new(db_pool.clone()));
    let bank_account_repo = Arc::new(BankAccountRepositoryImpl::new(db_pool.clone()));
    let stp_rule_repo = Arc::new(StpRuleRepositoryImpl::new(db_pool.clone()));
    let restriction_repo = Arc::new(RestrictionRepositoryImpl::new(db_pool.clone()));
    let transaction_config_repo = Arc::new(TransactionConfigRepositoryImpl::new(db_pool.clone()));
    let uow = Arc::new(MySqlConfigUnitOfWork::new(db_pool.clone()));

    // The fields storage layout is chosen once here; everything downstream
    // sees only the reader/writer pair
    let (fields_reader, fields_writer): (Arc<dyn FieldsReader>, Arc<dyn FieldsWriter>) =
        match config.fields_schema {
            FieldsSchema::V1 => {
                let repo = Arc::new(LegacyFieldsRepository::new(db_pool.clone()));
                (repo.clone(), repo)
            }
            FieldsSchema::V2 => {
                let repo = Arc::new(ScopedFieldsRepository::new(db_pool.clone()));
                (repo.clone(), repo)
            }
        };
    info!("Fields schema: {:?}", config.fields_schema);

    // Create services
    let config_upsert_service = Arc::new(ConfigUpsertService::new(
        uow,
        config.limits.clone(),
        cache_manager.clone(),
    ));
    let fields_service = Arc::new(FieldsService::new(
        fields_reader,
        fields_writer,
        provider_repo.clone(),
        country_authority_repo.clone(),
        currency_repo.clone(),
        config.limits.clone(),
        cache_manager.clone(),
    ));
    let credentials_service = Arc::new(CredentialsService::new(
        credential_repo,
        provider_repo.clone(),
        country_authority_repo.clone(),
        currency_repo.clone(),
        config.limits.clone(),
        cache_manager.clone(),
    ));
    let bank_accounts_service = Arc::new(BankAccountsService::new(
        bank_account_repo,
        provider_repo.clone(),
        country_authority_repo.clone(),
        currency_repo.clone(),
        config.limits.clone(),
        cache_manager.clone(),
    ));
    let stp_rules_service = Arc::new(StpRulesService::new(
        stp_rule_repo,
        provider_repo.clone(),
        country_authority_repo.clone(),
        cache_manager.clone(),
    ));
    let restrictions_service = Arc::new(RestrictionsService::new(
        restriction_repo,
        provider_repo.clone(),
        country_authority_repo.clone(),
        cache_manager.clone(),
    ));
    let method_configs_service = Arc::new(MethodConfigsService::new(
        provider_repo,
        provider_method_repo,
        transaction_config_repo,
        currency_repo,
        config.limits.clone(),
        cache_manager.clone(),
    ));

    let http_addr = config.http_addr();
    let state = AppState {
        config: Arc::new(config),
        db_pool,
        cache_manager,
        config_upsert_service,
        fields_service,
        credentials_service,
        bank_accounts_service,
        stp_rules_service,
        restrictions_service,
        method_configs_service,
    };

    let app = build_router(state);

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the HTTP router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready))
        // Provider configuration
        .route(
            "/api/v1/providers/{code}/country-authority-methods",
            put(api::provider_config::upsert_config),
        )
        .route(
            "/api/v1/providers/{code}/fields",
            get(api::provider_config::get_fields).put(api::provider_config::update_fields),
        )
        .route(
            "/api/v1/providers/{code}/fields/effective",
            get(api::provider_config::get_effective_fields),
        )
        .route(
            "/api/v1/providers/{code}/credentials",
            get(api::provider_config::get_credentials)
                .put(api::provider_config::update_credentials),
        )
        .route(
            "/api/v1/providers/{code}/bank-accounts",
            get(api::provider_config::get_bank_accounts)
                .put(api::provider_config::update_bank_accounts),
        )
        .route(
            "/api/v1/providers/{code}/stp-rules",
            get(api::provider_config::get_stp_rules).put(api::provider_config::update_stp_rules),
        )
        .route(
            "/api/v1/providers/{code}/restrictions",
            get(api::provider_config::get_restrictions)
                .put(api::provider_config::update_restrictions),
        )
        .route(
            "/api/v1/providers/{code}/methods/{method}/configs",
            get(api::provider_config::get_method_configs)
                .put(api::provider_config::update_method_configs),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
