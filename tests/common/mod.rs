#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use dept_guard::authz::{GuardOptions, ADMIN_PRIORITY_THRESHOLD};
use dept_guard::db::seed::{seed_demo, SeedSummary};
use dept_guard::{DepartmentMenuCache, GuardService, SqliteCatalog};

pub struct TestDb {
    // keeps the database file alive for the test's duration
    _dir: TempDir,
    pub pool: SqlitePool,
}

pub async fn setup_db() -> Result<TestDb> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    Ok(TestDb { _dir: dir, pool })
}

pub struct Seeded {
    pub db: TestDb,
    pub summary: SeedSummary,
    pub service: Arc<GuardService<SqliteCatalog>>,
}

impl Seeded {
    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn user(&self, code: &str) -> Uuid {
        self.summary.users[code]
    }

    pub fn department(&self) -> Uuid {
        self.summary.department_id
    }
}

pub fn service_for(pool: &SqlitePool, options: GuardOptions) -> Arc<GuardService<SqliteCatalog>> {
    let catalog = Arc::new(SqliteCatalog::new(pool.clone()));
    Arc::new(GuardService::new(
        catalog,
        Arc::new(DepartmentMenuCache::new()),
        options,
        ADMIN_PRIORITY_THRESHOLD,
    ))
}

pub async fn seeded() -> Result<Seeded> {
    let db = setup_db().await?;
    let summary = seed_demo(&db.pool).await?;
    let service = service_for(&db.pool, GuardOptions::default());
    Ok(Seeded { db, summary, service })
}

pub async fn menu_id(pool: &SqlitePool, title: &str) -> Result<Uuid> {
    let id: String = sqlx::query_scalar("SELECT id FROM menus WHERE title = ?")
        .bind(title)
        .fetch_one(pool)
        .await
        .with_context(|| format!("no menu titled {title}"))?;
    Ok(Uuid::parse_str(&id)?)
}

pub async fn role_id(pool: &SqlitePool, code: &str) -> Result<Uuid> {
    let id: String = sqlx::query_scalar("SELECT id FROM roles WHERE code = ?")
        .bind(code)
        .fetch_one(pool)
        .await?;
    Ok(Uuid::parse_str(&id)?)
}

pub struct NewMenu<'a> {
    pub parent_id: Option<Uuid>,
    pub title: &'a str,
    pub href: Option<&'a str>,
    pub match_mode: &'a str,
    pub min_priority: Option<i64>,
    pub is_section: bool,
    pub lock_hidden_override: bool,
    pub order: i64,
}

impl Default for NewMenu<'_> {
    fn default() -> Self {
        Self {
            parent_id: None,
            title: "Extra",
            href: None,
            match_mode: "exact",
            min_priority: None,
            is_section: false,
            lock_hidden_override: false,
            order: 0,
        }
    }
}

pub async fn insert_menu(pool: &SqlitePool, menu: NewMenu<'_>) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO menus (id, parent_id, title, href, match_mode, min_priority, is_section, is_active, hidden, \
         lock_hidden_override, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, 1, 0, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(menu.parent_id.map(|p| p.to_string()))
    .bind(menu.title)
    .bind(menu.href)
    .bind(menu.match_mode)
    .bind(menu.min_priority)
    .bind(menu.is_section)
    .bind(menu.lock_hidden_override)
    .bind(menu.order)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;
    Ok(id)
}

/// Inserts an active user pointing at either a role or a department role.
pub async fn insert_user(
    pool: &SqlitePool,
    department_id: Uuid,
    role_id: Option<Uuid>,
    department_role_id: Option<Uuid>,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO users (id, department_id, role_id, department_role_id, name, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id.to_string())
    .bind(department_id.to_string())
    .bind(role_id.map(|r| r.to_string()))
    .bind(department_role_id.map(|r| r.to_string()))
    .bind(format!("user-{id}"))
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn insert_department(pool: &SqlitePool, code: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();
    sqlx::query("INSERT INTO departments (id, code, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(code)
        .bind(code)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;
    Ok(id)
}

pub fn titles(records: &[dept_guard::models::ComposedMenuRecord]) -> Vec<String> {
    records.iter().map(|r| r.title.clone()).collect()
}

pub fn titles_by_parent(records: &[dept_guard::models::ComposedMenuRecord]) -> HashMap<Option<Uuid>, Vec<(String, i64)>> {
    let mut out: HashMap<Option<Uuid>, Vec<(String, i64)>> = HashMap::new();
    for r in records {
        out.entry(r.parent_id).or_default().push((r.title.clone(), r.effective_order));
    }
    out
}
