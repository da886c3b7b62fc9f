//! API Route Definitions
//!
//! This module defines all HTTP routes and their corresponding handlers using a
//! builder pattern. The RouterBuilder enables route groups selectively, so a
//! deployment can expose, for example, only the public authentication surface.

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use super::admin_handlers::*;
use super::aid_handlers::*;
use super::handlers::*;
use super::middleware::auth_middleware;
use crate::service::AccessGuard;

/// Builder for creating API routes with configurable route groups
///
/// Routes that need a caller identity are wrapped in [`auth_middleware`];
/// the rest are public.
#[derive(Default)]
pub struct RouterBuilder {
    /// `GET /` and `GET /health`
    health_check: bool,
    /// `/auth/*`: registration, login, verification, password recovery and change
    auth: bool,
    /// `/students/*`: submit and list aid requests
    students: bool,
    /// `/managers/*`: review aid requests
    managers: bool,
    /// `/admin/*`: admin bootstrap and account administration
    admin: bool,
}

impl RouterBuilder {
    /// Creates a new router builder with all route groups disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router builder with every route group enabled
    pub fn with_all_routes() -> Self {
        Self {
            health_check: true,
            auth: true,
            students: true,
            managers: true,
            admin: true,
        }
    }

    /// Health and authentication routes only
    pub fn with_public_routes() -> Self {
        Self {
            health_check: true,
            auth: true,
            ..Self::default()
        }
    }

    /// Creates a router with only the health check endpoints
    pub fn with_minimal_routes() -> Self {
        Self {
            health_check: true,
            ..Self::default()
        }
    }

    pub fn health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    pub fn auth(mut self, enabled: bool) -> Self {
        self.auth = enabled;
        self
    }

    pub fn students(mut self, enabled: bool) -> Self {
        self.students = enabled;
        self
    }

    pub fn managers(mut self, enabled: bool) -> Self {
        self.managers = enabled;
        self
    }

    pub fn admin(mut self, enabled: bool) -> Self {
        self.admin = enabled;
        self
    }

    /// Builds the Axum router with the configured routes
    ///
    /// Protected routes resolve their caller through `access_guard`.
    pub fn build(self, access_guard: Arc<AccessGuard>) -> Router<AppState> {
        let mut router = Router::new();
        let mut protected = Router::new();

        if self.health_check {
            router = router
                .route("/", get(root))
                .route("/health", get(health_check));
        }

        if self.auth {
            router = router
                .route("/auth/register", post(register))
                .route("/auth/login", post(login))
                .route("/auth/verify-email/{token}", get(verify_email))
                .route("/auth/forgot-password", post(forgot_password))
                .route("/auth/reset-password/{token}", post(reset_password));
            protected = protected.route("/auth/change-password", post(change_password));
        }

        if self.students {
            protected = protected
                .route("/students/apply", post(apply))
                .route("/students/applications", get(list_my_applications))
                .route(
                    "/students/applications/{student_id}",
                    get(list_student_applications),
                );
        }

        if self.managers {
            protected = protected
                .route("/managers/applications", get(list_all_applications))
                .route(
                    "/managers/applications/{id}/status",
                    put(update_application_status),
                );
        }

        if self.admin {
            router = router.route("/admin/initial-admin", post(create_initial_admin));
            protected = protected
                .route("/admin/admins", post(create_admin))
                .route("/admin/managers", get(list_managers))
                .route("/admin/managers/{id}/deactivate", put(deactivate_manager))
                .route("/admin/students", get(list_students));
        }

        // route_layer panics on a router without routes
        if !(self.auth || self.students || self.managers || self.admin) {
            return router;
        }

        let protected = protected.route_layer(from_fn_with_state(access_guard, auth_middleware));
        router.merge(protected)
    }
}

/// Creates all API routes
pub fn create_routes(access_guard: Arc<AccessGuard>) -> Router<AppState> {
    RouterBuilder::with_all_routes().build(access_guard)
}
