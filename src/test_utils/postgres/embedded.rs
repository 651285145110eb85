use postgresql_embedded::PostgreSQL;

use super::super::SHARED_RUNTIME;
use crate::credentials::Credentials;
use crate::postgres::PostgresOptions;

/// Represents a running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    /// Credentials for the freshly created test database.
    pub credentials: Credentials,
    /// Host and port the embedded server listens on.
    pub options: PostgresOptions,
}

/// Set up an embedded `PostgreSQL` instance with an empty database named `database`.
///
/// # Errors
/// Returns an error if the embedded server cannot be set up or started, or if the
/// database cannot be created.
pub fn setup_postgres_embedded(
    database: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    SHARED_RUNTIME.block_on(async {
        let mut postgresql = PostgreSQL::default();

        // Setup PostgreSQL binaries (bundled, so no download conflicts)
        postgresql.setup().await?;
        postgresql.start().await?;
        postgresql.create_database(database).await?;

        let settings = postgresql.settings();
        let credentials = Credentials::new(
            settings.username.clone(),
            database,
            settings.password.clone(),
        );
        let options = PostgresOptions::builder()
            .host(settings.host.clone())
            .port(settings.port)
            .finish();

        tracing::debug!(port = settings.port, database, "embedded postgres started");

        Ok(EmbeddedPostgres {
            postgresql,
            credentials,
            options,
        })
    })
}

/// Stop a previously started embedded `PostgreSQL` instance.
pub fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    SHARED_RUNTIME.block_on(async move {
        let _ = postgresql.stop().await;
    });
}
