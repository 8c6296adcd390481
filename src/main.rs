use std::{future::IntoFuture, process, sync::Arc};

use talentdesk::{
    application::{
        admins::AdminService,
        applicants::ApplicantService,
        catalog::CatalogService,
        error::AppError,
        listing::ListingEngine,
        onboarding::{ServiceProviderOnboardingService, StudentOnboardingService},
        profiles::ProfileService,
        repos::{
            AccountsRepo, AdminWriteRepo, CatalogRepo, HealthRepo, ListingRepo, ProfileWriteRepo,
            RoleAdminRepo, StudentWriteRepo,
        },
        roles::RoleService,
        snapshots::{CacheAsideRepository, SnapshotRefresher},
        uploads::MAX_DOCUMENT_BYTES,
    },
    cache::{self, CacheStore},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        image_host, telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

const SOURCE: &str = "talentdesk::main";

/// Multipart overhead allowed on top of the two documents.
const MULTIPART_SLACK_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_database(&settings).await?;
    let result = PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)));
    pool.close().await;
    result?;

    info!(target = SOURCE, "migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_database(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let repositories = Arc::new(PostgresRepositories::new(
        pool,
        settings.transactions,
    ));
    let cache = cache::connect(&settings.cache)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let state = build_api_state(repositories.clone(), cache.clone(), &settings)?;
    let result = serve_http(&settings, state).await;

    cache.close().await;
    repositories.pool().close().await;
    info!(target = SOURCE, "connections closed");

    result
}

async fn connect_database(settings: &config::Settings) -> Result<sqlx::PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, &settings.database)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

fn build_api_state(
    repositories: Arc<PostgresRepositories>,
    cache: Arc<dyn CacheStore>,
    settings: &config::Settings,
) -> Result<ApiState, AppError> {
    let listing_repo: Arc<dyn ListingRepo> = repositories.clone();
    let catalog_repo: Arc<dyn CatalogRepo> = repositories.clone();
    let accounts_repo: Arc<dyn AccountsRepo> = repositories.clone();
    let profile_write_repo: Arc<dyn ProfileWriteRepo> = repositories.clone();
    let student_write_repo: Arc<dyn StudentWriteRepo> = repositories.clone();
    let admin_write_repo: Arc<dyn AdminWriteRepo> = repositories.clone();
    let role_repo: Arc<dyn RoleAdminRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories.clone();

    let image_host = image_host::from_settings(&settings.image_host).map_err(AppError::from)?;

    let refresher = SnapshotRefresher {
        students: CacheAsideRepository::new(repositories.clone(), cache.clone()),
        service_providers: CacheAsideRepository::new(repositories.clone(), cache.clone()),
        admins: CacheAsideRepository::new(repositories, cache),
    };
    let profiles = ProfileService::new(
        refresher.students.clone(),
        refresher.service_providers.clone(),
        refresher.admins.clone(),
    );

    let applicants = ApplicantService::new(
        ListingEngine::new(listing_repo),
        settings.listing,
    );
    let students = StudentOnboardingService::new(
        accounts_repo.clone(),
        catalog_repo.clone(),
        profile_write_repo.clone(),
        student_write_repo,
        image_host,
    );
    let service_providers = ServiceProviderOnboardingService::new(
        accounts_repo.clone(),
        catalog_repo.clone(),
        profile_write_repo,
    );
    let admins = AdminService::new(accounts_repo, catalog_repo.clone(), admin_write_repo);

    Ok(ApiState {
        catalog: Arc::new(CatalogService::new(catalog_repo)),
        applicants: Arc::new(applicants),
        profiles: Arc::new(profiles),
        students: Arc::new(students),
        service_providers: Arc::new(service_providers),
        admins: Arc::new(admins),
        roles: Arc::new(RoleService::new(role_repo)),
        refresher: Arc::new(refresher),
        health: health_repo,
        upload_body_limit: 2 * MAX_DOCUMENT_BYTES + MULTIPART_SLACK_BYTES,
    })
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = SOURCE, addr = %settings.server.addr, "listening");

    let grace = settings.server.graceful_shutdown;
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal());
    let server = server.into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        () = async {
            shutdown_signal().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target = SOURCE,
                grace_secs = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = SOURCE, error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = SOURCE, error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!(target = SOURCE, "shutdown signal received");
}
