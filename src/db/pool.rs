use libsql::{Builder, Database};

pub async fn create_database(
    database_url: &str,
    auth_token: Option<&str>,
) -> Result<Database, libsql::Error> {
    // Check if this is a Turso remote URL
    if database_url.starts_with("libsql://") {
        let auth_token = auth_token
            .expect("DATABASE_TOKEN must be set for remote database")
            .to_string();

        Builder::new_remote(database_url.to_string(), auth_token)
            .build()
            .await
    } else {
        // Local SQLite file
        let path = database_url
            .strip_prefix("sqlite:")
            .or_else(|| database_url.strip_prefix("file:"))
            .unwrap_or(database_url)
            .split('?')
            .next()
            .unwrap_or("farmabeth365.db");

        Builder::new_local(path).build().await
    }
}
