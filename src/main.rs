use std::{future::IntoFuture, process, sync::Arc};

use blogicum::{
    application::{
        accounts::{AccountService, RegisterCommand},
        admin::{AdminTaxonomyService, ModerationService},
        comments::CommentService,
        error::AppError,
        feed::FeedService,
        posts::PostService,
        repos::{
            CategoriesRepo, CommentsRepo, HealthRepo, LocationsRepo, PostsRepo, PostsWriteRepo,
            SessionsRepo, UsersRepo,
        },
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState, HttpState, SiteContext},
        telemetry,
        uploads::UploadStorage,
    },
};
use tokio::{sync::watch, try_join};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

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
        config::Command::CreateUser(args) => run_create_user(settings, args).await,
    }
}

struct ApplicationContext {
    http_state: HttpState,
    admin_state: AdminState,
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories, &settings)?;

    match app.http_state.accounts.prune_expired_sessions().await {
        Ok(removed) => info!(
            target = "blogicum::main",
            removed, "pruned expired sessions"
        ),
        Err(err) => warn!(
            target = "blogicum::main",
            error = %err,
            "failed to prune expired sessions"
        ),
    }

    serve_http(&settings, app.http_state, app.admin_state).await
}

async fn run_create_user(
    settings: config::Settings,
    args: config::CreateUserArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let accounts = build_account_service(&repositories, &settings)?;

    let user = accounts
        .register(RegisterCommand {
            username: args.username,
            email: args.email,
            password1: args.password.clone(),
            password2: args.password,
        })
        .await?;

    info!(
        target = "blogicum::main",
        user_id = user.id,
        username = %user.username,
        "user created"
    );
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_account_service(
    repositories: &Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<AccountService, AppError> {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();
    let lifetime = time::Duration::try_from(settings.auth.session_lifetime)
        .map_err(|err| AppError::unexpected(format!("invalid session lifetime: {err}")))?;
    Ok(AccountService::new(users_repo, sessions_repo, lifetime))
}

fn build_application_context(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let categories_repo: Arc<dyn CategoriesRepo> = repositories.clone();
    let locations_repo: Arc<dyn LocationsRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories.clone();

    let upload_storage = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone()).map_err(|err| {
            AppError::from(InfraError::uploads(settings.uploads.directory.clone(), err))
        })?,
    );

    let site = Arc::new(SiteContext {
        title: settings.site.title.clone(),
        timezone: settings.site.timezone,
        cookie_secure: settings.auth.cookie_secure,
    });

    let http_state = HttpState {
        feed: Arc::new(FeedService::new(
            posts_repo.clone(),
            categories_repo.clone(),
            comments_repo.clone(),
            users_repo,
        )),
        posts: Arc::new(PostService::new(
            posts_repo.clone(),
            posts_write_repo.clone(),
            categories_repo.clone(),
            locations_repo.clone(),
            upload_storage.clone(),
        )),
        comments: Arc::new(CommentService::new(posts_repo.clone(), comments_repo.clone())),
        accounts: Arc::new(build_account_service(&repositories, settings)?),
        uploads: upload_storage.clone(),
        health: health_repo.clone(),
        site: site.clone(),
    };

    let admin_state = AdminState {
        taxonomy: Arc::new(AdminTaxonomyService::new(categories_repo, locations_repo)),
        moderation: Arc::new(ModerationService::new(
            posts_repo,
            posts_write_repo,
            comments_repo,
            upload_storage,
        )),
        health: health_repo,
        site,
    };

    Ok(ApplicationContext {
        http_state,
        admin_state,
    })
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let upload_body_limit = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| AppError::unexpected("upload limit exceeds usize"))?;
    let public_router = http::build_router(http_state, upload_body_limit);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::listener(settings.server.public_addr, err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::listener(settings.server.admin_addr, err)))?;

    info!(
        target = "blogicum::main",
        public = %settings.server.public_addr,
        admin = %settings.server.admin_addr,
        "listeners bound"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()))
        .into_future();
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()))
        .into_future();

    let grace = settings.server.graceful_shutdown;
    let drain_deadline = async move {
        wait_for_shutdown(shutdown_rx).await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = async { try_join!(public_server, admin_server) } => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline => {
            warn!(
                target = "blogicum::main",
                timeout_secs = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "blogicum::main", "shutdown complete");
    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stopped| *stopped).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "blogicum::main", error = %err, "failed to listen for Ctrl-C");
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
                error!(target = "blogicum::main", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(target = "blogicum::main", "shutdown signal received");
}
