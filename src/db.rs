use std::time::Duration;

use anyhow::Context;
use mongodb::{
    bson::doc,
    options::{ClientOptions, Credential},
    Client, Database,
};
use tracing::info;

use crate::config::MongoConfig;

/// Connect to MongoDB and verify the connection with a ping before the
/// server starts taking requests.
pub async fn connect(config: &MongoConfig) -> anyhow::Result<Database> {
    // Credentials go into the typed option, not the URI, so they never show
    // up in connection-string logging.
    let uri = format!("mongodb://{}:{}", config.host, config.port);
    let mut options = ClientOptions::parse(&uri)
        .await
        .context("parse mongodb uri")?;
    options.app_name = Some("accountant".to_string());
    options.server_selection_timeout = Some(Duration::from_secs(10));
    if !config.username.is_empty() && !config.password.is_empty() {
        options.credential = Some(
            Credential::builder()
                .username(config.username.clone())
                .password(config.password.clone())
                .source(config.auth_db.clone())
                .build(),
        );
    }

    let client = Client::with_options(options).context("build mongodb client")?;
    let db = client.database(&config.database);
    db.run_command(doc! { "ping": 1 }, None)
        .await
        .context("ping mongodb")?;
    info!(database = %config.database, "connected to mongodb");
    Ok(db)
}
