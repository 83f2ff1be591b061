use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Credentials that grant the manager role on login. Optional: when the env
/// vars are unset, no account is privileged.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedManager {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub seed_manager: Option<SeedManager>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "helpdesk".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "helpdesk-users".into()),
            // 7 days
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };
        let seed_manager = match (
            std::env::var("SEED_MANAGER_EMAIL"),
            std::env::var("SEED_MANAGER_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(SeedManager { email, password }),
            _ => None,
        };
        Ok(Self {
            database_url,
            jwt,
            seed_manager,
        })
    }
}
