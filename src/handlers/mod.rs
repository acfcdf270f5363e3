// HTTP request handlers for the auth API
pub mod admin;
pub mod auth;
pub mod health;
pub mod types;


use actix_web::web;

// Re-export the main handler functions
pub use admin::{delete_user, list_users, signup};
pub use auth::{legacy_login, login, respond_to_challenge};
pub use health::health;

/// Register every route on an `App` or test service
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Public login endpoints
        .route("/auth/login", web::post().to(login))
        .route(
            "/auth/respond-to-challenge",
            web::post().to(respond_to_challenge),
        )
        // Admin-only user management
        .route("/auth/signup", web::post().to(signup))
        .route("/auth/delete-user/{username}", web::delete().to(delete_user))
        .route("/auth/users", web::get().to(list_users))
        // Legacy login, relays the provider envelope
        .route("/login", web::post().to(legacy_login))
        // Health endpoint
        .route("/ping", web::get().to(health));
}
