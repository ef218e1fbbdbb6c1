use crate::config::DatabaseConfig;
use crate::db::Database;
use tempfile::NamedTempFile;


/// Open a fresh database with the queue tables created.
///
/// The temp file must outlive the database handle.
pub(super) async fn test_db() -> (Database, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let config = DatabaseConfig {
        path: temp_file.path().to_path_buf(),
        max_connections: 1,
        ..DatabaseConfig::default()
    };
    let db = Database::connect(&config).await.unwrap();
    db.create_schema().await.unwrap();
    (db, temp_file)
}
