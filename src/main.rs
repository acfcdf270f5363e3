#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use scribe_auth::{
    bootstrap::ensure_groups_and_admin, configure_services, utils::LoggingHelper, AppState,
    CognitoClient, IdentityProvider, ScribeSettings,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads the .env file
    let settings = ScribeSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;
    settings
        .init_logging()
        .map_err(|e| std::io::Error::other(format!("Failed to initialize logging: {e}")))?;

    let client = CognitoClient::from_settings(&settings)
        .map_err(|e| std::io::Error::other(format!("Failed to configure Cognito client: {e}")))?;
    let provider: Arc<dyn IdentityProvider> = Arc::new(client);
    LoggingHelper::log_provider_configured(
        provider.provider_name(),
        &settings.cognito.user_pool_id,
    );

    if settings.bootstrap.is_enabled() {
        let report = ensure_groups_and_admin(
            provider.as_ref(),
            &settings.cognito.user_pool_id,
            &settings.bootstrap,
        )
        .await
        .map_err(|e| std::io::Error::other(format!("Bootstrap failed: {e:#}")))?;
        println!(
            "✓ Bootstrap complete ({} group(s) created, admin created: {})",
            report.groups_created.len(),
            report.admin_created
        );
    }

    start_server(provider, settings).await
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    provider: Arc<dyn IdentityProvider>,
    settings: ScribeSettings,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let state = web::Data::new(AppState::from_settings(provider, &settings));

    // Configure CORS for browser clients
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &ScribeSettings) {
    println!("Starting Scribe Auth API on http://{bind_address}");
    println!("User pool: {}", settings.cognito.user_pool_id);
    println!();
    println!("Login endpoints:");
    println!("  POST /auth/login                  - Username/password login");
    println!("  POST /auth/respond-to-challenge   - Set a new password after first login");
    println!("  POST /login                       - Legacy login (raw provider response)");
    println!();
    println!("Admin endpoints (Bearer token, admins group):");
    println!("  POST   /auth/signup               - Create a user");
    println!("  DELETE /auth/delete-user/{{name}}   - Delete a user");
    println!("  GET    /auth/users                - List users");
    println!();
    println!("System endpoints:");
    println!("  GET  /ping            - Health check");
}
