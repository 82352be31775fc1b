//! MySQL-backed store using a sqlx connection pool.
//!
//! Schema (created on connect when absent):
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS novels (
//!     id BIGINT NOT NULL AUTO_INCREMENT,
//!     title VARCHAR(255) NULL,
//!     author VARCHAR(255) NULL,
//!     publishedDate VARCHAR(255) NULL,
//!     imageUrl VARCHAR(255) NULL,
//!     description TEXT NULL,
//!     createdBy VARCHAR(255) NULL,
//!     createdById VARCHAR(255) NULL,
//!     PRIMARY KEY (id)
//! );
//! ```

use async_trait::async_trait;
use shelf_kernel::settings::MySqlSettings;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::{ConnectOptions, Connection};

use crate::error::{StoreError, StoreResult};
use crate::novel::{Novel, NovelId};
use crate::store::{ensure_assigned, NovelStore};

const LIST_STATEMENT: &str = "\
    SELECT id, title, author, publishedDate, imageUrl, description, createdBy, createdById \
    FROM novels ORDER BY CAST(title AS BINARY), id";

const LIST_BY_STATEMENT: &str = "\
    SELECT id, title, author, publishedDate, imageUrl, description, createdBy, createdById \
    FROM novels WHERE createdById = ? ORDER BY CAST(title AS BINARY), id";

const GET_STATEMENT: &str = "\
    SELECT id, title, author, publishedDate, imageUrl, description, createdBy, createdById \
    FROM novels WHERE id = ?";

const INSERT_STATEMENT: &str = "\
    INSERT INTO novels (title, author, publishedDate, imageUrl, description, createdBy, createdById) \
    VALUES (?, ?, ?, ?, ?, ?, ?)";

const UPDATE_STATEMENT: &str = "\
    UPDATE novels \
    SET title = ?, author = ?, publishedDate = ?, imageUrl = ?, description = ?, createdBy = ?, createdById = ? \
    WHERE id = ?";

const DELETE_STATEMENT: &str = "DELETE FROM novels WHERE id = ?";

/// Row shape of the `novels` table; every text column is nullable.
#[derive(Debug, sqlx::FromRow)]
struct NovelRow {
    id: i64,
    title: Option<String>,
    author: Option<String>,
    #[sqlx(rename = "publishedDate")]
    published_date: Option<String>,
    #[sqlx(rename = "imageUrl")]
    image_url: Option<String>,
    description: Option<String>,
    #[sqlx(rename = "createdBy")]
    created_by: Option<String>,
    #[sqlx(rename = "createdById")]
    created_by_id: Option<String>,
}

impl From<NovelRow> for Novel {
    fn from(row: NovelRow) -> Self {
        Novel {
            id: NovelId::from(row.id),
            title: row.title.unwrap_or_default(),
            author: row.author.unwrap_or_default(),
            published_date: row.published_date.unwrap_or_default(),
            image_url: row.image_url.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            created_by: row.created_by.unwrap_or_default(),
            created_by_id: row.created_by_id.unwrap_or_default(),
        }
    }
}

/// Relational backend over a pooled MySQL connection.
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Connect, create the database and table if needed, and verify the pool.
    ///
    /// Failures here are meant to abort startup.
    pub async fn connect(settings: &MySqlSettings) -> StoreResult<Self> {
        let options = connect_options(settings);
        ensure_schema(&options, &settings.database).await?;

        let pool = MySqlPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(options.database(&settings.database))
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        tracing::info!(
            database = %settings.database,
            max_connections = settings.max_connections,
            "mysql store connected"
        );

        Ok(Self { pool })
    }

    /// Wrap an existing pool whose database already has the `novels` table.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> StoreResult<&MySqlPool> {
        if self.pool.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(&self.pool)
    }

    async fn fetch_list(&self, owner_id: Option<&str>) -> StoreResult<Vec<Novel>> {
        let pool = self.pool()?;
        let rows = match owner_id {
            Some(owner) => {
                sqlx::query_as::<_, NovelRow>(LIST_BY_STATEMENT)
                    .bind(owner)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, NovelRow>(LIST_STATEMENT)
                    .fetch_all(pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(Novel::from).collect())
    }
}

#[async_trait]
impl NovelStore for MySqlStore {
    fn backend(&self) -> &'static str {
        "mysql"
    }

    async fn list(&self) -> StoreResult<Vec<Novel>> {
        self.fetch_list(None).await
    }

    async fn list_created_by(&self, owner_id: &str) -> StoreResult<Vec<Novel>> {
        if owner_id.is_empty() {
            return self.list().await;
        }
        self.fetch_list(Some(owner_id)).await
    }

    async fn get(&self, id: &NovelId) -> StoreResult<Novel> {
        let pool = self.pool()?;
        let Some(key) = id.as_sequence() else {
            return Err(StoreError::NotFound(id.clone()));
        };

        sqlx::query_as::<_, NovelRow>(GET_STATEMENT)
            .bind(key)
            .fetch_optional(pool)
            .await?
            .map(Novel::from)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn add(&self, novel: &mut Novel) -> StoreResult<NovelId> {
        let pool = self.pool()?;
        let result = sqlx::query(INSERT_STATEMENT)
            .bind(&novel.title)
            .bind(&novel.author)
            .bind(&novel.published_date)
            .bind(&novel.image_url)
            .bind(&novel.description)
            .bind(&novel.created_by)
            .bind(&novel.created_by_id)
            .execute(pool)
            .await?;

        if result.rows_affected() != 1 {
            return Err(StoreError::UnexpectedRowCount(result.rows_affected()));
        }

        novel.id = NovelId::from(result.last_insert_id() as i64);
        Ok(novel.id.clone())
    }

    async fn update(&self, novel: &Novel) -> StoreResult<()> {
        ensure_assigned(&novel.id, "update")?;
        let pool = self.pool()?;
        let Some(key) = novel.id.as_sequence() else {
            return Err(StoreError::NotFound(novel.id.clone()));
        };

        let result = sqlx::query(UPDATE_STATEMENT)
            .bind(&novel.title)
            .bind(&novel.author)
            .bind(&novel.published_date)
            .bind(&novel.image_url)
            .bind(&novel.description)
            .bind(&novel.created_by)
            .bind(&novel.created_by_id)
            .bind(key)
            .execute(pool)
            .await?;

        expect_single_row(result.rows_affected(), &novel.id)
    }

    async fn delete(&self, id: &NovelId) -> StoreResult<()> {
        ensure_assigned(id, "delete")?;
        let pool = self.pool()?;
        let Some(key) = id.as_sequence() else {
            return Err(StoreError::NotFound(id.clone()));
        };

        let result = sqlx::query(DELETE_STATEMENT)
            .bind(key)
            .execute(pool)
            .await?;

        expect_single_row(result.rows_affected(), id)
    }

    async fn close(&self) -> StoreResult<()> {
        if !self.pool.is_closed() {
            self.pool.close().await;
            tracing::info!("mysql store closed");
        }
        Ok(())
    }
}

fn connect_options(settings: &MySqlSettings) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new().charset("utf8mb4");

    if !settings.username.is_empty() {
        options = options.username(&settings.username);
    }
    if !settings.password.is_empty() {
        options = options.password(&settings.password);
    }

    if settings.unix_socket.is_empty() {
        options.host(&settings.host).port(settings.port)
    } else {
        options.socket(&settings.unix_socket)
    }
}

/// Create the database and `novels` table when they do not exist yet.
async fn ensure_schema(options: &MySqlConnectOptions, database: &str) -> StoreResult<()> {
    validate_database_name(database)?;

    let mut conn = options.connect().await?;

    let create_database = format!(
        "CREATE DATABASE IF NOT EXISTS `{database}` \
         DEFAULT CHARACTER SET = 'utf8mb4' DEFAULT COLLATE 'utf8mb4_general_ci'"
    );
    sqlx::raw_sql(&create_database).execute(&mut conn).await?;

    let create_table = format!(
        "CREATE TABLE IF NOT EXISTS `{database}`.novels (
            id BIGINT NOT NULL AUTO_INCREMENT,
            title VARCHAR(255) NULL,
            author VARCHAR(255) NULL,
            publishedDate VARCHAR(255) NULL,
            imageUrl VARCHAR(255) NULL,
            description TEXT NULL,
            createdBy VARCHAR(255) NULL,
            createdById VARCHAR(255) NULL,
            PRIMARY KEY (id)
        )"
    );
    sqlx::raw_sql(&create_table).execute(&mut conn).await?;

    conn.close().await?;

    tracing::debug!(database, "mysql schema ensured");
    Ok(())
}

fn validate_database_name(database: &str) -> StoreResult<()> {
    let valid = !database.is_empty()
        && database
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if !valid {
        return Err(StoreError::InvalidDatabaseName(database.to_string()));
    }
    Ok(())
}

/// Updates and deletes address one primary key, so anything other than one
/// affected row is an error.
fn expect_single_row(rows_affected: u64, id: &NovelId) -> StoreResult<()> {
    match rows_affected {
        1 => Ok(()),
        0 => Err(StoreError::NotFound(id.clone())),
        n => Err(StoreError::UnexpectedRowCount(n)),
    }
}
