use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub app: AppInfoConfig,
    pub session: SessionConfig,
    pub cache: CacheConfig,
    pub query: QueryConfig,
    pub mutation: MutationConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Values reported by the version endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfoConfig {
    pub name: String,
    pub updated_at: String,
    pub timezone: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub lifetime_minutes: u64,
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_payload_bytes: usize,
    pub invalidate_on_write: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    pub lock_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_name: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
    pub users_table: String,
    pub licenses_table: String,
    pub tenants_table: String,
    pub template_table: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // App overrides
        if let Ok(v) = env::var("APP_NAME") {
            self.app.name = v;
        }
        if let Ok(v) = env::var("APP_UPDATED_AT") {
            self.app.updated_at = v;
        }
        if let Ok(v) = env::var("APP_TIMEZONE") {
            self.app.timezone = v;
        }
        if let Ok(v) = env::var("CAIXA_API_PORT").or_else(|_| env::var("PORT")) {
            self.app.port = v.parse().unwrap_or(self.app.port);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_LIFETIME_MINUTES") {
            self.session.lifetime_minutes = v.parse().unwrap_or(self.session.lifetime_minutes);
        }
        if let Ok(v) = env::var("SESSION_JWT_SECRET") {
            self.session.jwt_secret = v;
        }

        // Cache overrides
        if let Ok(v) = env::var("CACHE_ENABLED") {
            self.cache.enabled = v.parse().unwrap_or(self.cache.enabled);
        }
        if let Ok(v) = env::var("CACHE_TTL_SECS") {
            self.cache.ttl_secs = v.parse().unwrap_or(self.cache.ttl_secs);
        }
        if let Ok(v) = env::var("CACHE_MAX_PAYLOAD_BYTES") {
            self.cache.max_payload_bytes = v.parse().unwrap_or(self.cache.max_payload_bytes);
        }
        if let Ok(v) = env::var("CACHE_INVALIDATE_ON_WRITE") {
            self.cache.invalidate_on_write = v.parse().unwrap_or(self.cache.invalidate_on_write);
        }

        // Query overrides
        if let Ok(v) = env::var("QUERY_DEFAULT_PAGE_SIZE") {
            self.query.default_page_size = v.parse().unwrap_or(self.query.default_page_size);
        }
        if let Ok(v) = env::var("QUERY_MAX_PAGE_SIZE") {
            self.query.max_page_size = v.parse().unwrap_or(self.query.max_page_size);
        }

        // Mutation overrides
        if let Ok(v) = env::var("MUTATION_LOCK_TIMEOUT_SECS") {
            self.mutation.lock_timeout_secs = v.parse().unwrap_or(self.mutation.lock_timeout_secs);
        }

        // Store overrides
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.store.backend = match v.to_ascii_lowercase().as_str() {
                "postgres" | "pg" => StoreBackend::Postgres,
                "memory" | "mem" => StoreBackend::Memory,
                _ => self.store.backend,
            };
        }
        if let Ok(v) = env::var("STORE_DATABASE_NAME") {
            self.store.database_name = v;
        }
        if let Ok(v) = env::var("STORE_MAX_CONNECTIONS") {
            self.store.max_connections = v.parse().unwrap_or(self.store.max_connections);
        }
        if let Ok(v) = env::var("STORE_CONNECTION_TIMEOUT_SECS") {
            self.store.connection_timeout_secs = v.parse().unwrap_or(self.store.connection_timeout_secs);
        }
        if let Ok(v) = env::var("STORE_USERS_TABLE") {
            self.store.users_table = v;
        }
        if let Ok(v) = env::var("STORE_LICENSES_TABLE") {
            self.store.licenses_table = v;
        }
        if let Ok(v) = env::var("STORE_TENANTS_TABLE") {
            self.store.tenants_table = v;
        }
        if let Ok(v) = env::var("STORE_TEMPLATE_TABLE") {
            self.store.template_table = v;
        }

        self
    }

    fn base(environment: Environment) -> Self {
        Self {
            environment,
            app: AppInfoConfig {
                name: "Caixa API".to_string(),
                updated_at: env!("CARGO_PKG_VERSION").to_string(),
                timezone: "America/Sao_Paulo".to_string(),
                port: 3000,
            },
            session: SessionConfig {
                lifetime_minutes: 120,
                jwt_secret: String::new(),
            },
            cache: CacheConfig {
                enabled: true,
                ttl_secs: 30,
                max_payload_bytes: 100 * 1024,
                invalidate_on_write: false,
            },
            query: QueryConfig {
                default_page_size: 200,
                max_page_size: 1000,
            },
            mutation: MutationConfig { lock_timeout_secs: 20 },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database_name: "caixa".to_string(),
                max_connections: 10,
                connection_timeout_secs: 30,
                users_table: "usuarios".to_string(),
                licenses_table: "licencas".to_string(),
                tenants_table: "tenants".to_string(),
                template_table: "template_lancamentos".to_string(),
            },
        }
    }

    pub fn development() -> Self {
        let mut config = Self::base(Environment::Development);
        config.session.jwt_secret = "dev-only-secret-change-me".to_string();
        config
    }

    pub fn staging() -> Self {
        let mut config = Self::base(Environment::Staging);
        config.store.backend = StoreBackend::Postgres;
        config.store.max_connections = 20;
        config.store.connection_timeout_secs = 10;
        config
    }

    pub fn production() -> Self {
        let mut config = Self::base(Environment::Production);
        config.store.backend = StoreBackend::Postgres;
        config.store.max_connections = 50;
        config.store.connection_timeout_secs = 5;
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
