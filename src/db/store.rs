use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database, Row, Value};
use serde::{Deserialize, Serialize};

use crate::types::{AppError, Result, Role, UserSummary};

/// One remembered credential: digest, the salt it was derived under, and when
/// it was installed. History is most-recent-first and bounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordHistoryEntry {
    pub hash: String,
    pub salt: String,
    pub changed_at: DateTime<Utc>,
}

/// A successful login: when and from where. The store keeps the last 5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub at: DateTime<Utc>,
    pub ip: Option<String>,
}

/// A persisted account, including the security state the core mutates.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub role: Role,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub failed_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub verification_token: Option<String>,
    pub is_verified: bool,
    pub reset_token: Option<String>,
    pub reset_token_expiry: Option<DateTime<Utc>>,
    pub sessions: Vec<SessionRecord>,
    pub password_history: Vec<PasswordHistoryEntry>,
    pub api_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Sanitized view safe to return to callers.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            is_verified: self.is_verified,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
impl Account {
    /// Blank account for exercising the security core in unit tests.
    pub(crate) fn stub() -> Self {
        Self {
            id: "acct-1".to_string(),
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            password_salt: String::new(),
            role: Role::Member,
            is_deleted: false,
            deleted_at: None,
            failed_attempts: 0,
            locked_until: None,
            verification_token: None,
            is_verified: false,
            reset_token: None,
            reset_token_expiry: None,
            sessions: Vec::new(),
            password_history: Vec::new(),
            api_key: None,
            created_at: Utc::now(),
        }
    }
}

/// Account and audit-log store backed by a local libsql database.
pub struct UserStore {
    db: Database,
}

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, password_salt, role, \
     is_deleted, deleted_at, failed_attempts, locked_until, \
     verification_token, is_verified, reset_token, reset_token_expiry, \
     sessions, password_history, api_key, created_at";

impl UserStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub async fn open(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Store(format!("failed to open database: {e}")))?;

        let store = Self { db };
        store.initialize_schema().await?;

        Ok(store)
    }

    fn connection(&self) -> Result<Connection> {
        self.db
            .connect()
            .map_err(|e| AppError::Store(format!("failed to get connection: {e}")))
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                password_salt TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'member',
                is_deleted INTEGER NOT NULL DEFAULT 0,
                deleted_at INTEGER,
                failed_attempts INTEGER NOT NULL DEFAULT 0,
                locked_until INTEGER,
                verification_token TEXT,
                is_verified INTEGER NOT NULL DEFAULT 0,
                reset_token TEXT,
                reset_token_expiry INTEGER,
                sessions TEXT NOT NULL DEFAULT '[]',
                password_history TEXT NOT NULL DEFAULT '[]',
                api_key TEXT,
                created_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Store(format!("failed to create users table: {e}")))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS audit_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT,
                action TEXT NOT NULL,
                meta TEXT NOT NULL DEFAULT '{}',
                ip TEXT,
                created_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Store(format!("failed to create audit_logs table: {e}")))?;

        Ok(())
    }

    // Account operations

    pub async fn create_account(&self, account: &Account) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "INSERT INTO users (id, name, email, password_hash, password_salt, role,
                is_deleted, deleted_at, failed_attempts, locked_until,
                verification_token, is_verified, reset_token, reset_token_expiry,
                sessions, password_history, api_key, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            account_params(account)?,
        )
        .await
        .map_err(|e| AppError::Store(format!("failed to create account: {e}")))?;

        Ok(())
    }

    /// Persist every field the security core mutates (credentials, throttle
    /// state, tokens, history, sessions, verification and delete flags).
    pub async fn save(&self, account: &Account) -> Result<()> {
        let conn = self.connection()?;

        let mut params = account_params(account)?;
        // Move id to the end for the WHERE clause
        let id = params.remove(0);
        params.push(id);

        conn.execute(
            "UPDATE users SET name = ?, email = ?, password_hash = ?, password_salt = ?,
                role = ?, is_deleted = ?, deleted_at = ?, failed_attempts = ?,
                locked_until = ?, verification_token = ?, is_verified = ?,
                reset_token = ?, reset_token_expiry = ?, sessions = ?,
                password_history = ?, api_key = ?, created_at = ?
             WHERE id = ?",
            params,
        )
        .await
        .map_err(|e| AppError::Store(format!("failed to save account: {e}")))?;

        Ok(())
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.query_one("email = ?", Value::Text(email.to_string()))
            .await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Account>> {
        self.query_one("id = ?", Value::Text(id.to_string())).await
    }

    pub async fn get_by_api_key(&self, api_key: &str) -> Result<Option<Account>> {
        self.query_one("api_key = ?", Value::Text(api_key.to_string()))
            .await
    }

    async fn query_one(&self, predicate: &str, param: Value) -> Result<Option<Account>> {
        let conn = self.connection()?;

        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE {predicate}");
        let mut rows = conn
            .query(&sql, vec![param])
            .await
            .map_err(|e| AppError::Store(format!("failed to query account: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?
        {
            Some(row) => Ok(Some(account_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Sanitized summaries of all non-deleted accounts, newest first.
    pub async fn list(&self) -> Result<Vec<UserSummary>> {
        let conn = self.connection()?;

        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE is_deleted = 0 ORDER BY created_at DESC"
        );
        let mut rows = conn
            .query(&sql, ())
            .await
            .map_err(|e| AppError::Store(format!("failed to list accounts: {e}")))?;

        let mut summaries = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?
        {
            summaries.push(account_from_row(&row)?.summary());
        }

        Ok(summaries)
    }

    /// Soft-delete an account. Deleted accounts never authenticate again but
    /// remain in the store until the purge sweep removes them.
    pub async fn soft_delete(&self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        let conn = self.connection()?;

        let affected = conn
            .execute(
                "UPDATE users SET is_deleted = 1, deleted_at = ? WHERE id = ? AND is_deleted = 0",
                (now.timestamp(), id),
            )
            .await
            .map_err(|e| AppError::Store(format!("failed to delete account: {e}")))?;

        Ok(affected > 0)
    }

    /// Hard-delete soft-deleted accounts whose `deleted_at` is older than
    /// `cutoff`. Returns the number of rows removed. Callable, not scheduled.
    pub async fn purge_deleted(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let conn = self.connection()?;

        let affected = conn
            .execute(
                "DELETE FROM users WHERE is_deleted = 1 AND deleted_at IS NOT NULL AND deleted_at <= ?",
                [cutoff.timestamp()],
            )
            .await
            .map_err(|e| AppError::Store(format!("failed to purge accounts: {e}")))?;

        Ok(affected)
    }

    // Audit log

    /// Append an audit entry. Callers treat this as fire-and-forget; a
    /// failure here must never fail the operation being audited.
    pub async fn record_audit(
        &self,
        user_id: Option<&str>,
        action: &str,
        meta: &serde_json::Value,
        ip: Option<&str>,
    ) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "INSERT INTO audit_logs (id, user_id, action, meta, ip, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            vec![
                Value::Text(uuid::Uuid::new_v4().to_string()),
                opt_text(user_id),
                Value::Text(action.to_string()),
                Value::Text(meta.to_string()),
                opt_text(ip),
                Value::Integer(Utc::now().timestamp()),
            ],
        )
        .await
        .map_err(|e| AppError::Store(format!("failed to record audit entry: {e}")))?;

        Ok(())
    }
}

fn opt_text(value: Option<&str>) -> Value {
    match value {
        Some(s) => Value::Text(s.to_string()),
        None => Value::Null,
    }
}

fn opt_timestamp(value: Option<DateTime<Utc>>) -> Value {
    match value {
        Some(t) => Value::Integer(t.timestamp()),
        None => Value::Null,
    }
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::Member => "member",
        Role::Admin => "admin",
        Role::Superadmin => "superadmin",
    }
}

fn role_from_str(role: &str) -> Role {
    match role {
        "admin" => Role::Admin,
        "superadmin" => Role::Superadmin,
        _ => Role::Member,
    }
}

fn account_params(account: &Account) -> Result<Vec<Value>> {
    let sessions = serde_json::to_string(&account.sessions)
        .map_err(|e| AppError::Internal(format!("failed to encode sessions: {e}")))?;
    let history = serde_json::to_string(&account.password_history)
        .map_err(|e| AppError::Internal(format!("failed to encode password history: {e}")))?;

    Ok(vec![
        Value::Text(account.id.clone()),
        Value::Text(account.name.clone()),
        Value::Text(account.email.clone()),
        Value::Text(account.password_hash.clone()),
        Value::Text(account.password_salt.clone()),
        Value::Text(role_to_str(account.role).to_string()),
        Value::Integer(account.is_deleted as i64),
        opt_timestamp(account.deleted_at),
        Value::Integer(account.failed_attempts as i64),
        opt_timestamp(account.locked_until),
        opt_text(account.verification_token.as_deref()),
        Value::Integer(account.is_verified as i64),
        opt_text(account.reset_token.as_deref()),
        opt_timestamp(account.reset_token_expiry),
        Value::Text(sessions),
        Value::Text(history),
        opt_text(account.api_key.as_deref()),
        Value::Integer(account.created_at.timestamp()),
    ])
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn account_from_row(row: &Row) -> Result<Account> {
    let get_err = |e: libsql::Error| AppError::Store(e.to_string());

    let role: String = row.get(5).map_err(get_err)?;
    let deleted_at: Option<i64> = row.get(7).map_err(get_err)?;
    let locked_until: Option<i64> = row.get(9).map_err(get_err)?;
    let reset_token_expiry: Option<i64> = row.get(13).map_err(get_err)?;
    let sessions_json: String = row.get(14).map_err(get_err)?;
    let history_json: String = row.get(15).map_err(get_err)?;

    let sessions: Vec<SessionRecord> = serde_json::from_str(&sessions_json)
        .map_err(|e| AppError::Internal(format!("malformed sessions column: {e}")))?;
    let password_history: Vec<PasswordHistoryEntry> = serde_json::from_str(&history_json)
        .map_err(|e| AppError::Internal(format!("malformed password_history column: {e}")))?;

    Ok(Account {
        id: row.get(0).map_err(get_err)?,
        name: row.get(1).map_err(get_err)?,
        email: row.get(2).map_err(get_err)?,
        password_hash: row.get(3).map_err(get_err)?,
        password_salt: row.get(4).map_err(get_err)?,
        role: role_from_str(&role),
        is_deleted: row.get::<i64>(6).map_err(get_err)? != 0,
        deleted_at: deleted_at.map(timestamp),
        failed_attempts: row.get::<i64>(8).map_err(get_err)? as u32,
        locked_until: locked_until.map(timestamp),
        verification_token: row.get(10).map_err(get_err)?,
        is_verified: row.get::<i64>(11).map_err(get_err)? != 0,
        reset_token: row.get(12).map_err(get_err)?,
        reset_token_expiry: reset_token_expiry.map(timestamp),
        sessions,
        password_history,
        api_key: row.get(16).map_err(get_err)?,
        created_at: timestamp(row.get::<i64>(17).map_err(get_err)?),
    })
}
