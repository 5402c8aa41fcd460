//! User repository

use rusqlite::{Connection, OptionalExtension, params};

use super::{ColumnUpdates, Repository, delete_by_id, exists, id_or_new, json_column};
use crate::model::{User, UserPatch};
use crate::storage::Store;
use crate::{Error, Result};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone, role, roles, \
     favorites, bonus_balance, referral_code, referred_by, created_at, updated_at";

pub(crate) const UPSERT_USER: &str = r#"
INSERT INTO users (id, email, password_hash, first_name, last_name, phone, role, roles,
                   favorites, bonus_balance, referral_code, referred_by, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
ON CONFLICT(id) DO UPDATE SET
    email = excluded.email,
    password_hash = excluded.password_hash,
    first_name = excluded.first_name,
    last_name = excluded.last_name,
    phone = excluded.phone,
    role = excluded.role,
    roles = excluded.roles,
    favorites = excluded.favorites,
    bonus_balance = excluded.bonus_balance,
    referral_code = excluded.referral_code,
    referred_by = excluded.referred_by,
    created_at = excluded.created_at,
    updated_at = excluded.updated_at
"#;

/// Insert or overwrite a user row. Roles and favorites are stored as JSON.
pub(crate) fn upsert_row(conn: &Connection, user: &User) -> Result<()> {
    let roles = serde_json::to_string(&user.roles)?;
    let favorites = serde_json::to_string(&user.favorites)?;
    conn.prepare_cached(UPSERT_USER)?.execute(params![
        user.id,
        user.email,
        user.password_hash,
        user.first_name,
        user.last_name,
        user.phone,
        user.role,
        roles,
        favorites,
        user.bonus_balance,
        user.referral_code,
        user.referred_by,
        user.created_at,
        user.updated_at,
    ])?;
    Ok(())
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        phone: row.get(5)?,
        role: row.get(6)?,
        roles: json_column(row, 7)?,
        favorites: json_column(row, 8)?,
        bonus_balance: row.get(9)?,
        referral_code: row.get(10)?,
        referred_by: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub struct UserRepo<'a> {
    store: &'a Store,
}

impl<'a> UserRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn conn(&self) -> &Connection {
        self.store.conn()
    }

    fn find_one(&self, filter: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} LIMIT 1", USER_COLUMNS, filter);
        Ok(self
            .conn()
            .prepare_cached(&sql)?
            .query_row([value], row_to_user)
            .optional()?)
    }

    /// Email lookup ignores ASCII case
    pub fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one("email = ?1 COLLATE NOCASE", email.trim())
    }

    pub fn get_by_referral_code(&self, code: &str) -> Result<Option<User>> {
        self.find_one("referral_code = ?1 COLLATE NOCASE", code.trim())
    }

    /// Users who signed up with this user's referral
    pub fn get_referrals(&self, user_id: &str) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE referred_by = ?1 ORDER BY created_at, id",
            USER_COLUMNS
        );
        let users = self
            .conn()
            .prepare_cached(&sql)?
            .query_map([user_id], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Add `delta` to the stored bonus balance and return the new balance
    pub fn adjust_bonus_balance(&self, user_id: &str, delta: f64) -> Result<Option<f64>> {
        let changed = self.conn().execute(
            "UPDATE users SET bonus_balance = bonus_balance + ?1, updated_at = ?2 WHERE id = ?3",
            params![delta, crate::model::now(), user_id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let balance = self
            .conn()
            .query_row("SELECT bonus_balance FROM users WHERE id = ?1", [user_id], |row| row.get(0))?;
        Ok(Some(balance))
    }
}

impl Repository for UserRepo<'_> {
    type Entity = User;
    type Patch = UserPatch;

    fn get_all(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at, id", USER_COLUMNS);
        let users = self
            .conn()
            .prepare_cached(&sql)?
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        self.find_one("id = ?1", id)
    }

    fn create(&self, mut user: User) -> Result<User> {
        user.id = id_or_new(&user.id);
        if exists(self.conn(), "users", &user.id)? {
            return Err(Error::Invalid(format!("user {} already exists", user.id)));
        }
        if let Some(email) = &user.email {
            if self.get_by_email(email)?.is_some() {
                return Err(Error::Invalid(format!("email {} is already registered", email)));
            }
        }
        user.normalize_roles();
        let now = crate::model::now();
        user.created_at.get_or_insert_with(|| now.clone());
        user.updated_at = Some(now);

        upsert_row(self.conn(), &user)?;
        tracing::debug!("Created user {}", user.id);
        Ok(user)
    }

    fn update(&self, id: &str, patch: UserPatch) -> Result<Option<User>> {
        let Some(current) = self.get_by_id(id)? else {
            return Ok(None);
        };

        // Keep `roles` containing the primary role when either one changes
        let roles = if patch.role.is_some() || patch.roles.is_some() {
            let mut merged = User {
                role: patch.role.unwrap_or(current.role),
                roles: patch.roles.clone().unwrap_or(current.roles),
                ..Default::default()
            };
            merged.normalize_roles();
            Some(serde_json::to_string(&merged.roles)?)
        } else {
            None
        };
        let favorites = patch.favorites.as_ref().map(serde_json::to_string).transpose()?;

        let mut updates = ColumnUpdates::new();
        updates
            .set("email", patch.email)
            .set("password_hash", patch.password_hash)
            .set("first_name", patch.first_name)
            .set("last_name", patch.last_name)
            .set("phone", patch.phone)
            .set("role", patch.role)
            .set("roles", roles)
            .set("favorites", favorites)
            .set("bonus_balance", patch.bonus_balance)
            .set("referral_code", patch.referral_code)
            .set("referred_by", patch.referred_by);
        if !updates.is_empty() {
            updates.set("updated_at", Some(crate::model::now()));
        }
        updates.apply(self.conn(), "users", id)?;

        self.get_by_id(id)
    }

    /// Specialists keep their profile with `user_id` cleared; reviews,
    /// reactions and bonus history go with the user.
    fn delete(&self, id: &str) -> Result<bool> {
        let removed = delete_by_id(self.conn(), "users", id)?;
        if removed {
            tracing::info!("Deleted user {}", id);
        }
        Ok(removed)
    }
}
