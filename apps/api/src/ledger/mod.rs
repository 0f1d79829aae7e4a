//! Coin ledger: atomic balance mutation plus an append-only spend log.
//!
//! `debit` and `credit` take `&mut PgConnection` so they compose into the
//! caller's transaction: a coin movement is never observable without the
//! business mutation that triggered it. No other path writes `users.coins`.

use sqlx::{PgConnection, PgPool};

use crate::errors::AppError;
use crate::models::ledger::LedgerEntryRow;

/// Removes `amount` coins from the user's balance and appends a
/// negative-delta entry. Fails with `InsufficientCoins` when the balance is
/// short, without touching any state.
pub async fn debit(
    conn: &mut PgConnection,
    user_id: i64,
    amount: i64,
    entry_type: &str,
    reason: &str,
) -> Result<(), AppError> {
    ensure_positive(amount)?;

    let updated = sqlx::query(
        "UPDATE users SET coins = coins - $1, updated_at = NOW() WHERE id = $2 AND coins >= $1",
    )
    .bind(amount)
    .bind(user_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated == 0 {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!("User {user_id} not found")));
        }
        return Err(AppError::InsufficientCoins);
    }

    append_entry(conn, user_id, -amount, entry_type, reason).await
}

/// Adds `amount` coins to the user's balance and appends a positive-delta
/// entry. Never fails on balance grounds.
pub async fn credit(
    conn: &mut PgConnection,
    user_id: i64,
    amount: i64,
    entry_type: &str,
    reason: &str,
) -> Result<(), AppError> {
    ensure_positive(amount)?;

    let updated =
        sqlx::query("UPDATE users SET coins = coins + $1, updated_at = NOW() WHERE id = $2")
            .bind(amount)
            .bind(user_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound(format!("User {user_id} not found")));
    }

    append_entry(conn, user_id, amount, entry_type, reason).await
}

async fn append_entry(
    conn: &mut PgConnection,
    user_id: i64,
    delta: i64,
    entry_type: &str,
    reason: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO ledger_entries (user_id, delta, entry_type, reason) VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(delta)
    .bind(entry_type)
    .bind(reason)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Current balance for a user.
pub async fn balance(pool: &PgPool, user_id: i64) -> Result<i64, AppError> {
    sqlx::query_scalar("SELECT coins FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}

/// The append-only log for a user, oldest first, for reconciliation.
pub async fn entries(pool: &PgPool, user_id: i64) -> Result<Vec<LedgerEntryRow>, AppError> {
    Ok(sqlx::query_as::<_, LedgerEntryRow>(
        "SELECT * FROM ledger_entries WHERE user_id = $1 ORDER BY id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

fn ensure_positive(amount: i64) -> Result<(), AppError> {
    if amount <= 0 {
        return Err(AppError::Validation(format!(
            "Ledger amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_negative_amounts_rejected() {
        assert!(ensure_positive(0).is_err());
        assert!(ensure_positive(-10).is_err());
        assert!(ensure_positive(1).is_ok());
    }
}
