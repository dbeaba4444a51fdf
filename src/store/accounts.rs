//! User accounts, credentials and subscriptions.

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Row};

use super::models::*;
use super::SqliteLibraryStore;
use crate::user::UserRole;

const SUBSCRIPTION_DURATION_SECS: i64 = 30 * 24 * 3600;

#[derive(Debug)]
pub enum UserCreation {
    Created(User),
    DuplicateEmail,
}

#[derive(Debug)]
pub enum ProfileUpdate {
    Updated(User),
    EmailTaken,
    NotFound,
}

pub trait AccountStore: Send + Sync {
    /// Registers a user and, when a plan is given, opens a subscription in
    /// the same transaction.
    fn create_user(&self, new: &NewUser) -> Result<UserCreation>;

    fn get_user(&self, id: i64) -> Result<Option<User>>;

    /// Lookup for the login path, including the stored password hash.
    fn get_user_by_email(&self, email: &str) -> Result<Option<UserAuth>>;

    fn touch_last_login(&self, user_id: i64) -> Result<()>;

    fn update_profile(&self, user_id: i64, name: &str, email: &str) -> Result<ProfileUpdate>;

    fn get_password_hash(&self, user_id: i64) -> Result<Option<String>>;

    /// Returns false if the user is unknown.
    fn set_password_hash(&self, user_id: i64, password_hash: &str) -> Result<bool>;

    fn get_subscription(&self, user_id: i64) -> Result<Option<Subscription>>;

    /// Creates or replaces the user's single subscription row, running for
    /// thirty days from now.
    fn set_subscription(&self, user_id: i64, plan: &str) -> Result<Subscription>;
}

const USER_SELECT: &str = "SELECT id, name, email, role, created, last_login FROM users";

fn parse_user(row: &Row) -> rusqlite::Result<User> {
    let role_str: String = row.get(3)?;
    let role = UserRole::from_str(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown role '{}'", role_str).into(),
        )
    })?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role,
        created: row.get(4)?,
        last_login: row.get(5)?,
    })
}

fn parse_subscription(row: &Row) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        plan: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        is_active: row.get(5)?,
    })
}

fn email_taken(conn: &rusqlite::Connection, email: &str, exclude: Option<i64>) -> Result<bool> {
    use rusqlite::OptionalExtension;
    let taken = conn
        .query_row(
            "SELECT 1 FROM users WHERE email = ?1 COLLATE NOCASE AND id != ?2",
            params![email, exclude.unwrap_or(-1)],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    Ok(taken)
}

impl AccountStore for SqliteLibraryStore {
    fn create_user(&self, new: &NewUser) -> Result<UserCreation> {
        use rusqlite::OptionalExtension;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if email_taken(&tx, &new.email, None)? {
            return Ok(UserCreation::DuplicateEmail);
        }

        tx.execute(
            "INSERT INTO users (name, email, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
            params![new.name, new.email, new.password_hash, new.role.as_str()],
        )?;
        let id = tx.last_insert_rowid();

        if let Some(plan) = &new.subscription_plan {
            let now = Utc::now().timestamp();
            tx.execute(
                "INSERT INTO subscriptions (user_id, plan, start_date, end_date, is_active) \
                 VALUES (?1, ?2, ?3, ?4, 1)",
                params![id, plan, now, now + SUBSCRIPTION_DURATION_SECS],
            )?;
        }

        let user = tx
            .query_row(
                &format!("{} WHERE id = ?1", USER_SELECT),
                params![id],
                parse_user,
            )
            .optional()?;
        tx.commit()?;

        match user {
            Some(user) => Ok(UserCreation::Created(user)),
            None => anyhow::bail!("user {} vanished during registration", id),
        }
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        use rusqlite::OptionalExtension;
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                &format!("{} WHERE id = ?1", USER_SELECT),
                params![id],
                parse_user,
            )
            .optional()?;
        Ok(user)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<UserAuth>> {
        use rusqlite::OptionalExtension;
        let conn = self.conn.lock().unwrap();
        let auth = conn
            .query_row(
                "SELECT id, name, email, role, created, last_login, password_hash \
                 FROM users WHERE email = ?1 COLLATE NOCASE",
                params![email],
                |row| {
                    let user = parse_user(row)?;
                    let password_hash: String = row.get(6)?;
                    Ok(UserAuth {
                        user,
                        password_hash,
                    })
                },
            )
            .optional()?;
        Ok(auth)
    }

    fn touch_last_login(&self, user_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![Utc::now().timestamp(), user_id],
        )?;
        Ok(())
    }

    fn update_profile(&self, user_id: i64, name: &str, email: &str) -> Result<ProfileUpdate> {
        use rusqlite::OptionalExtension;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if email_taken(&tx, email, Some(user_id))? {
            return Ok(ProfileUpdate::EmailTaken);
        }

        let changed = tx.execute(
            "UPDATE users SET name = ?1, email = ?2 WHERE id = ?3",
            params![name, email, user_id],
        )?;
        if changed == 0 {
            return Ok(ProfileUpdate::NotFound);
        }
        let user = tx
            .query_row(
                &format!("{} WHERE id = ?1", USER_SELECT),
                params![user_id],
                parse_user,
            )
            .optional()?;
        tx.commit()?;

        match user {
            Some(user) => Ok(ProfileUpdate::Updated(user)),
            None => Ok(ProfileUpdate::NotFound),
        }
    }

    fn get_password_hash(&self, user_id: i64) -> Result<Option<String>> {
        use rusqlite::OptionalExtension;
        let conn = self.conn.lock().unwrap();
        let hash = conn
            .query_row(
                "SELECT password_hash FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    fn set_password_hash(&self, user_id: i64, password_hash: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, user_id],
        )?;
        Ok(changed > 0)
    }

    fn get_subscription(&self, user_id: i64) -> Result<Option<Subscription>> {
        use rusqlite::OptionalExtension;
        let conn = self.conn.lock().unwrap();
        let subscription = conn
            .query_row(
                "SELECT id, user_id, plan, start_date, end_date, is_active \
                 FROM subscriptions WHERE user_id = ?1",
                params![user_id],
                parse_subscription,
            )
            .optional()?;
        Ok(subscription)
    }

    fn set_subscription(&self, user_id: i64, plan: &str) -> Result<Subscription> {
        let now = Utc::now().timestamp();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO subscriptions (user_id, plan, start_date, end_date, is_active) \
             VALUES (?1, ?2, ?3, ?4, 1) \
             ON CONFLICT(user_id) DO UPDATE SET \
                 plan = excluded.plan, \
                 start_date = excluded.start_date, \
                 end_date = excluded.end_date, \
                 is_active = 1",
            params![user_id, plan, now, now + SUBSCRIPTION_DURATION_SECS],
        )?;
        let subscription = conn.query_row(
            "SELECT id, user_id, plan, start_date, end_date, is_active \
             FROM subscriptions WHERE user_id = ?1",
            params![user_id],
            parse_subscription,
        )?;
        Ok(subscription)
    }
}
