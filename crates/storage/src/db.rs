use std::path::Path;
use std::str::FromStr;

use billsnap_core::{
    Account, AccountId, BookkeepingData, Category, CategoryId, DataError, FeatureRestrictions,
    Tag, TagId, TransactionType, User, UserId, LEVEL_ONE_CATEGORY_PARENT_ID,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

pub type DbPool = Pool<Sqlite>;

pub const DEMO_USERNAME: &str = "demo";

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            uid INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            feature_restrictions INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            account_id INTEGER PRIMARY KEY AUTOINCREMENT,
            uid INTEGER NOT NULL,
            name TEXT NOT NULL,
            hidden INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (uid) REFERENCES users(uid) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // parent_category_id = 0 marks a first-level category.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            category_id INTEGER PRIMARY KEY AUTOINCREMENT,
            uid INTEGER NOT NULL,
            name TEXT NOT NULL,
            category_type TEXT NOT NULL,
            parent_category_id INTEGER NOT NULL DEFAULT 0,
            hidden INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (uid) REFERENCES users(uid) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            tag_id INTEGER PRIMARY KEY AUTOINCREMENT,
            uid INTEGER NOT NULL,
            name TEXT NOT NULL,
            hidden INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (uid) REFERENCES users(uid) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ── Reads ─────────────────────────────────────────────────────────────────────

pub async fn get_user(pool: &DbPool, uid: UserId) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64, String, i64)>(
        "SELECT uid, username, feature_restrictions FROM users WHERE uid = ?",
    )
    .bind(uid.0)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| User {
        uid: UserId(r.0),
        username: r.1,
        feature_restrictions: FeatureRestrictions::from_bits(r.2 as u64),
    }))
}

/// Every account of the user, hidden ones included, in id order.
pub async fn get_all_accounts(pool: &DbPool, uid: UserId) -> Result<Vec<Account>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String, bool)>(
        "SELECT account_id, name, hidden FROM accounts WHERE uid = ? ORDER BY account_id",
    )
    .bind(uid.0)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Account { id: AccountId(r.0), name: r.1, hidden: r.2 })
        .collect())
}

pub async fn get_all_categories(pool: &DbPool, uid: UserId) -> Result<Vec<Category>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String, String, i64, bool)>(
        "SELECT category_id, name, category_type, parent_category_id, hidden FROM categories WHERE uid = ? ORDER BY category_id",
    )
    .bind(uid.0)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            let category_type =
                TransactionType::from_str(&r.2).map_err(|e| sqlx::Error::Decode(e.into()))?;
            Ok(Category {
                id: CategoryId(r.0),
                name: r.1,
                category_type,
                parent_id: CategoryId(r.3),
                hidden: r.4,
            })
        })
        .collect()
}

pub async fn get_all_tags(pool: &DbPool, uid: UserId) -> Result<Vec<Tag>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String, bool)>(
        "SELECT tag_id, name, hidden FROM tags WHERE uid = ? ORDER BY tag_id",
    )
    .bind(uid.0)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Tag { id: TagId(r.0), name: r.1, hidden: r.2 })
        .collect())
}

// ── Writes ────────────────────────────────────────────────────────────────────

pub async fn insert_user(
    pool: &DbPool,
    username: &str,
    feature_restrictions: FeatureRestrictions,
) -> Result<UserId, sqlx::Error> {
    let result = sqlx::query("INSERT INTO users (username, feature_restrictions) VALUES (?, ?)")
        .bind(username)
        .bind(feature_restrictions.bits() as i64)
        .execute(pool)
        .await?;
    Ok(UserId(result.last_insert_rowid()))
}

pub async fn insert_account(
    pool: &DbPool,
    uid: UserId,
    name: &str,
    hidden: bool,
) -> Result<AccountId, sqlx::Error> {
    let result = sqlx::query("INSERT INTO accounts (uid, name, hidden) VALUES (?, ?, ?)")
        .bind(uid.0)
        .bind(name)
        .bind(hidden)
        .execute(pool)
        .await?;
    Ok(AccountId(result.last_insert_rowid()))
}

/// Pass [`LEVEL_ONE_CATEGORY_PARENT_ID`] as `parent_id` for a first-level category.
pub async fn insert_category(
    pool: &DbPool,
    uid: UserId,
    name: &str,
    category_type: TransactionType,
    parent_id: CategoryId,
    hidden: bool,
) -> Result<CategoryId, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO categories (uid, name, category_type, parent_category_id, hidden) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(uid.0)
    .bind(name)
    .bind(category_type.to_string())
    .bind(parent_id.0)
    .bind(hidden)
    .execute(pool)
    .await?;
    Ok(CategoryId(result.last_insert_rowid()))
}

pub async fn insert_tag(
    pool: &DbPool,
    uid: UserId,
    name: &str,
    hidden: bool,
) -> Result<TagId, sqlx::Error> {
    let result = sqlx::query("INSERT INTO tags (uid, name, hidden) VALUES (?, ?, ?)")
        .bind(uid.0)
        .bind(name)
        .bind(hidden)
        .execute(pool)
        .await?;
    Ok(TagId(result.last_insert_rowid()))
}

// (first-level name, type, second-level names)
const DEMO_CATEGORIES: &[(&str, TransactionType, &[&str])] = &[
    ("餐饮", TransactionType::Expense, &["超市", "外卖", "餐厅"]),
    ("交通", TransactionType::Expense, &["打车", "公共交通"]),
    ("职业收入", TransactionType::Income, &["工资", "奖金"]),
    ("投资收入", TransactionType::Income, &["理财收益"]),
    ("转账", TransactionType::Transfer, &["还款", "账户互转"]),
];

const DEMO_ACCOUNTS: &[&str] = &["支付宝", "微信钱包", "招商银行", "现金"];

const DEMO_TAGS: &[&str] = &["日常", "报销", "家庭"];

/// Create the demo user with a small set of accounts, categories and tags.
/// Returns the existing user untouched if it was seeded before.
pub async fn seed_demo(pool: &DbPool) -> Result<UserId, sqlx::Error> {
    let existing = sqlx::query_as::<_, (i64,)>("SELECT uid FROM users WHERE username = ?")
        .bind(DEMO_USERNAME)
        .fetch_optional(pool)
        .await?;
    if let Some((uid,)) = existing {
        return Ok(UserId(uid));
    }

    let mut tx = pool.begin().await?;
    let uid = UserId(
        sqlx::query("INSERT INTO users (username, feature_restrictions) VALUES (?, 0)")
            .bind(DEMO_USERNAME)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid(),
    );

    for name in DEMO_ACCOUNTS {
        sqlx::query("INSERT INTO accounts (uid, name) VALUES (?, ?)")
            .bind(uid.0)
            .bind(*name)
            .execute(&mut *tx)
            .await?;
    }

    for (parent, category_type, children) in DEMO_CATEGORIES {
        let parent_id = sqlx::query(
            "INSERT INTO categories (uid, name, category_type, parent_category_id) VALUES (?, ?, ?, ?)",
        )
        .bind(uid.0)
        .bind(*parent)
        .bind(category_type.to_string())
        .bind(LEVEL_ONE_CATEGORY_PARENT_ID.0)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for child in children.iter() {
            sqlx::query(
                "INSERT INTO categories (uid, name, category_type, parent_category_id) VALUES (?, ?, ?, ?)",
            )
            .bind(uid.0)
            .bind(*child)
            .bind(category_type.to_string())
            .bind(parent_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    for name in DEMO_TAGS {
        sqlx::query("INSERT INTO tags (uid, name) VALUES (?, ?)")
            .bind(uid.0)
            .bind(*name)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::info!("Seeded demo data for {uid}");
    Ok(uid)
}

// ── Collaborator adapter ──────────────────────────────────────────────────────

/// [`BookkeepingData`] over a SQLite pool.
#[derive(Clone)]
pub struct SqliteBookkeeping {
    pool: DbPool,
}

impl SqliteBookkeeping {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl BookkeepingData for SqliteBookkeeping {
    async fn get_user(&self, uid: UserId) -> Result<User, DataError> {
        get_user(&self.pool, uid)
            .await
            .map_err(DataError::backend)?
            .ok_or(DataError::UserNotFound(uid))
    }

    async fn get_all_accounts(&self, uid: UserId) -> Result<Vec<Account>, DataError> {
        get_all_accounts(&self.pool, uid).await.map_err(DataError::backend)
    }

    async fn get_all_categories(&self, uid: UserId) -> Result<Vec<Category>, DataError> {
        get_all_categories(&self.pool, uid).await.map_err(DataError::backend)
    }

    async fn get_all_tags(&self, uid: UserId) -> Result<Vec<Tag>, DataError> {
        get_all_tags(&self.pool, uid).await.map_err(DataError::backend)
    }
}
