#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub auth_db: String,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongo: MongoConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);

        let database = std::env::var("MONGO_DATABASE")?;
        let mongo = MongoConfig {
            host: std::env::var("MONGO_HOST").unwrap_or_else(|_| "localhost".into()),
            port: std::env::var("MONGO_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(27017),
            username: std::env::var("MONGO_USERNAME").unwrap_or_default(),
            password: std::env::var("MONGO_PASSWORD").unwrap_or_default(),
            auth_db: std::env::var("MONGO_AUTH_DB").unwrap_or_else(|_| database.clone()),
            collection: std::env::var("MONGO_COLLECTION").unwrap_or_else(|_| "accounts".into()),
            database,
        };

        Ok(Self { host, port, mongo })
    }
}
