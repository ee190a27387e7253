use log::info;
use rand::Rng;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};

use crate::SqliteDatabase;

/// Loads `.env.test` (if present) and initialises logging. Safe to call from every test.
pub fn prepare_logging() {
    let _ = dotenvy::from_filename(".env.test");
    let _ = env_logger::try_init();
}

/// A unique SQLite URL under the system temp directory.
pub fn random_db_url() -> String {
    let suffix: u64 = rand::thread_rng().gen();
    let path = std::env::temp_dir().join(format!("market_mirror_test_{suffix}.db"));
    format!("sqlite://{}", path.display())
}

/// A fully migrated scratch database, ready to be handed to an [`crate::OrderMirrorApi`].
pub async fn prepare_test_env() -> SqliteDatabase {
    prepare_logging();
    let url = random_db_url();
    create_test_database(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Could not open test database")
}

/// Creates a fresh database at `url` and applies the mirror schema.
pub async fn create_test_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        Sqlite::drop_database(url).await.expect("Could not drop old test database");
    }
    Sqlite::create_database(url).await.expect("Could not create test database");
    let pool = SqlitePool::connect(url).await.expect("Could not connect to test database");
    sqlx::migrate!("./src/sqlite/migrations").run(&pool).await.expect("Could not run migrations");
    pool.close().await;
    info!("🛠️ Test database created at {url}");
}
