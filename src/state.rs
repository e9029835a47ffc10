use std::sync::Arc;

use crate::db::{DbPool, OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub auth: Arc<AuthSettings>,
}

/// Token signing settings shared by the login service and the request extractor.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, jwt_secret: impl Into<String>, jwt_ttl_hours: i64) -> Self {
        Self {
            pool,
            orm,
            auth: Arc::new(AuthSettings {
                jwt_secret: jwt_secret.into(),
                jwt_ttl_hours,
            }),
        }
    }
}
