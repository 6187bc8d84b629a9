use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Missing secret is tolerated at boot; token issuance fails until it is set.
    pub secret: Option<String>,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub production: bool,
    pub static_dir: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "startgig".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "startgig-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let production = std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "public".into());

        Ok(Self {
            database_url,
            max_connections,
            jwt,
            production,
            static_dir,
        })
    }
}
