//! Database helpers for users, sessions, and OTP reset flows.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::is_unique_violation;

/// Outcome when attempting to create a new user.
#[derive(Debug)]
pub(crate) enum SignupOutcome {
    Created(Uuid),
    Conflict,
}

/// A user row with everything the auth flows need. The password hash never
/// leaves this layer except for verification.
pub(crate) struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    /// Last password change, unix seconds. Tokens issued before this moment
    /// are stale.
    pub(crate) password_changed_at_unix: i64,
}

/// Server-side revocation record for an issued bearer token.
pub(crate) struct SessionRecord {
    pub(crate) id: Uuid,
    pub(crate) user_id: Uuid,
}

/// A live password-reset flow. `exchange_token_hash` is set once the OTP has
/// been verified.
pub(crate) struct OtpRecord {
    pub(crate) id: Uuid,
    pub(crate) user_email: String,
    pub(crate) otp_hash: String,
    pub(crate) exchange_token_hash: Option<String>,
}

const USER_COLUMNS: &str = r"
    id, name, email, password_hash,
    EXTRACT(EPOCH FROM password_changed_at)::BIGINT AS password_changed_at
";

fn user_from_row(row: &sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        password_changed_at_unix: row.get("password_changed_at"),
    }
}

pub(crate) async fn insert_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<SignupOutcome> {
    let query = r"
        INSERT INTO users (name, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(SignupOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

pub(crate) async fn lookup_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")?;

    Ok(row.as_ref().map(user_from_row))
}

pub(crate) async fn lookup_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by id")?;

    Ok(row.as_ref().map(user_from_row))
}

/// Replace the stored hash and bump the password-change timestamp, which
/// implicitly invalidates every token issued before this moment.
pub(crate) async fn update_user_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<()> {
    let query = r"
        UPDATE users
        SET password_hash = $2,
            password_changed_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update user password")?;
    Ok(())
}

pub(crate) async fn insert_session(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &[u8],
) -> Result<()> {
    // Only the digest is persisted; identical tokens share a digest and are
    // the same bearer, so no uniqueness handling is needed here.
    let query = r"
        INSERT INTO user_sessions (user_id, token_hash)
        VALUES ($1, $2)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to insert session")?;
    Ok(())
}

pub(crate) async fn lookup_session(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<SessionRecord>> {
    let query = r"
        SELECT id, user_id
        FROM user_sessions
        WHERE token_hash = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    Ok(row.map(|row| SessionRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
    }))
}

pub(crate) async fn delete_session(pool: &PgPool, token_hash: &[u8]) -> Result<()> {
    // Logout and stale-session cleanup are idempotent; zero rows is fine.
    let query = "DELETE FROM user_sessions WHERE token_hash = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}

/// Supersede any prior reset flow for this email and start a new one.
///
/// Delete-then-insert without serialization: two concurrent requests may
/// transiently leave two live rows, which is acceptable since each code check
/// is independent and the loser expires unconsumed.
pub(crate) async fn replace_otp(pool: &PgPool, email: &str, otp_hash: &str) -> Result<Uuid> {
    let mut tx = pool.begin().await.context("begin otp transaction")?;

    let query = "DELETE FROM password_otps WHERE user_email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to delete prior otp records")?;

    let query = r"
        INSERT INTO password_otps (user_email, otp_hash)
        VALUES ($1, $2)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(otp_hash)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await
        .context("failed to insert otp record")?;

    tx.commit().await.context("commit otp transaction")?;

    Ok(row.get("id"))
}

/// Look up a live reset flow. Rows older than the TTL (measured from the last
/// update) are invisible here, which is the observable expiry signal.
pub(crate) async fn lookup_otp(
    pool: &PgPool,
    otp_id: Uuid,
    ttl_seconds: i64,
) -> Result<Option<OtpRecord>> {
    let query = r"
        SELECT id, user_email, otp_hash, exchange_token_hash
        FROM password_otps
        WHERE id = $1
          AND updated_at > NOW() - ($2 * INTERVAL '1 second')
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(otp_id)
        .bind(ttl_seconds)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup otp record")?;

    Ok(row.map(|row| OtpRecord {
        id: row.get("id"),
        user_email: row.get("user_email"),
        otp_hash: row.get("otp_hash"),
        exchange_token_hash: row.get("exchange_token_hash"),
    }))
}

/// Attach the hashed exchange token after a successful OTP verification.
/// Bumping `updated_at` restarts the TTL window for the reset step.
pub(crate) async fn attach_exchange_token(
    pool: &PgPool,
    otp_id: Uuid,
    exchange_token_hash: &str,
) -> Result<()> {
    let query = r"
        UPDATE password_otps
        SET exchange_token_hash = $2,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(otp_id)
        .bind(exchange_token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to attach exchange token")?;
    Ok(())
}

/// One-time use: the record is removed once the reset succeeds.
pub(crate) async fn delete_otp(pool: &PgPool, otp_id: Uuid) -> Result<()> {
    let query = "DELETE FROM password_otps WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(otp_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete otp record")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{OtpRecord, SessionRecord, SignupOutcome};
    use uuid::Uuid;

    #[test]
    fn signup_outcome_debug_names() {
        let id = Uuid::nil();
        assert_eq!(
            format!("{:?}", SignupOutcome::Created(id)),
            format!("Created({id:?})")
        );
        assert_eq!(format!("{:?}", SignupOutcome::Conflict), "Conflict");
    }

    #[test]
    fn session_record_holds_values() {
        let record = SessionRecord {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
        };
        assert_eq!(record.id, record.user_id);
    }

    #[test]
    fn otp_record_starts_without_exchange_token() {
        let record = OtpRecord {
            id: Uuid::nil(),
            user_email: "a@x.com".to_string(),
            otp_hash: "$argon2id$...".to_string(),
            exchange_token_hash: None,
        };
        assert!(record.exchange_token_hash.is_none());
        assert_eq!(record.user_email, "a@x.com");
        assert_eq!(record.id, Uuid::nil());
        assert!(record.otp_hash.starts_with("$argon2id$"));
    }
}
