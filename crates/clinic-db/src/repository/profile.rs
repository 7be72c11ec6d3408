//! # Profile Repository
//!
//! Authorization profiles keyed by the authenticated identity. The session
//! asks for the role once per identity change. The admin screen lists every
//! profile and switches roles.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use clinic_core::{Profile, Role};

use crate::error::{DbError, DbResult};

/// Repository for profile lookups and role administration.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    /// Returns the role of an identity, `None` when it has no profile.
    pub async fn role_of(&self, identity: &str) -> DbResult<Option<Role>> {
        let role = sqlx::query_scalar::<_, Role>("SELECT role FROM profiles WHERE id = ?1")
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;

        debug!(identity = %identity, role = ?role, "Role lookup");
        Ok(role)
    }

    /// Gets a profile by identity.
    pub async fn get(&self, identity: &str) -> DbResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, email, role, name, created_at, updated_at FROM profiles WHERE id = ?1",
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Lists every profile, newest first.
    pub async fn list(&self) -> DbResult<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, email, role, name, created_at, updated_at
            FROM profiles
            ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = profiles.len(), "Profiles listed");
        Ok(profiles)
    }

    /// Changes the role of an existing profile.
    pub async fn set_role(&self, identity: &str, role: Role) -> DbResult<()> {
        let result = sqlx::query("UPDATE profiles SET role = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(identity)
            .bind(role)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Profile", identity));
        }

        info!(identity = %identity, role = ?role, "Profile role changed");
        Ok(())
    }

    /// Creates or updates the profile of an identity.
    pub async fn upsert(&self, identity: &str, email: &str, role: Role) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO profiles (id, email, role, name, created_at, updated_at)
            VALUES (?1, ?2, ?3, NULL, ?4, ?4)
            ON CONFLICT (id) DO UPDATE SET
                email = excluded.email,
                role = excluded.role,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(identity)
        .bind(email)
        .bind(role)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
