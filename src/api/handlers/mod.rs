//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod admin;
pub mod auth;
pub mod health;
pub mod links;
pub mod redirect;

pub use admin::{
    change_role_handler, delete_user_handler, list_users_handler, update_limit_handler,
    update_status_handler,
};
pub use auth::{
    change_password_handler, csrf_handler, google_callback_handler, google_login_handler,
    login_handler, logout_handler, me_handler, register_handler,
};
pub use health::health_handler;
pub use links::{
    create_link_handler, delete_link_handler, link_stats_handler, list_links_handler,
    update_link_handler,
};
pub use redirect::redirect_handler;
