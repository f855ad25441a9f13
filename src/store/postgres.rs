//! PostgreSQL store
//!
//! Conditional transitions are single `UPDATE ... WHERE <expected state>
//! RETURNING` statements; a miss comes back as no row.

use async_trait::async_trait;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use super::{
    ApplicationFilter, ApplicationStore, HealthCheck, LoanFilter, LoanStore, StatusNote,
    StoreError, StoreResult, UserStore,
};
use crate::db;
use crate::models::{
    ApplicationStatus, FeePayment, FeeStatus, LoanApplication, LoanOffer, LoanOfferPatch,
    NewApplication, NewLoanOffer, NewUser, StatusTransition, User, UserRole, UserStatus,
};

const USER_COLUMNS: &str = "id, email, name, photo_url, password_hash, role, status, \
     suspend_reason, suspend_feedback, created_at, updated_at";

const OFFER_COLUMNS: &str = "id, title, description, category, interest_rate, min_amount, \
     max_amount, created_by, show_on_home, created_at, updated_at";

const APPLICATION_COLUMNS: &str = "id, applicant_email, applicant_name, loan_id, \
     requested_amount, purpose, status, fee_status, transaction_id, paid_at, approved_at, \
     created_at, updated_at";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Escape LIKE metacharacters and wrap for a substring match
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Run a query under the store-call timeout
    async fn timed<T, F>(&self, query: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => {
                tracing::warn!(timeout_ms = %self.timeout.as_millis(), "Store call timed out");
                Err(StoreError::Timeout)
            }
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, name, photo_url, password_hash, role, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        );
        self.timed(
            sqlx::query_as::<_, User>(&sql)
                .bind(Uuid::new_v4())
                .bind(&user.email)
                .bind(&user.name)
                .bind(&user.photo_url)
                .bind(&user.password_hash)
                .bind(user.role)
                .bind(UserStatus::Active)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        self.timed(
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        self.timed(
            sqlx::query_as::<_, User>(&sql)
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn search_users(&self, search: Option<&str>) -> StoreResult<Vec<User>> {
        let pattern = search.filter(|s| !s.is_empty()).map(like_pattern);
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE $1::text IS NULL OR email ILIKE $1 OR name ILIKE $1
            ORDER BY created_at DESC
            "#
        );
        self.timed(
            sqlx::query_as::<_, User>(&sql)
                .bind(pattern)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn set_user_role(&self, id: Uuid, role: UserRole) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        self.timed(
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .bind(role)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn set_user_status(
        &self,
        id: Uuid,
        status: UserStatus,
        note: StatusNote,
    ) -> StoreResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET status = $2, suspend_reason = $3, suspend_feedback = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        self.timed(
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .bind(status)
                .bind(note.reason)
                .bind(note.feedback)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = self
            .timed(
                sqlx::query("DELETE FROM users WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LoanStore for PgStore {
    async fn insert_offer(&self, offer: NewLoanOffer) -> StoreResult<LoanOffer> {
        let sql = format!(
            r#"
            INSERT INTO loan_offers (
                id, title, description, category, interest_rate,
                min_amount, max_amount, created_by, show_on_home
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {OFFER_COLUMNS}
            "#
        );
        self.timed(
            sqlx::query_as::<_, LoanOffer>(&sql)
                .bind(Uuid::new_v4())
                .bind(&offer.title)
                .bind(&offer.description)
                .bind(&offer.category)
                .bind(offer.interest_rate)
                .bind(offer.min_amount)
                .bind(offer.max_amount)
                .bind(&offer.created_by)
                .bind(offer.show_on_home)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn find_offer(&self, id: Uuid) -> StoreResult<Option<LoanOffer>> {
        let sql = format!("SELECT {OFFER_COLUMNS} FROM loan_offers WHERE id = $1");
        self.timed(
            sqlx::query_as::<_, LoanOffer>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn list_offers(&self, filter: LoanFilter) -> StoreResult<Vec<LoanOffer>> {
        let sql = format!(
            r#"
            SELECT {OFFER_COLUMNS} FROM loan_offers
            WHERE ($1::text IS NULL OR created_by = $1)
              AND ($2::bool IS NULL OR show_on_home = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        );
        self.timed(
            sqlx::query_as::<_, LoanOffer>(&sql)
                .bind(filter.created_by)
                .bind(filter.show_on_home)
                .bind(filter.page.limit)
                .bind(filter.page.offset)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn update_offer(
        &self,
        id: Uuid,
        patch: LoanOfferPatch,
        owner: Option<&str>,
    ) -> StoreResult<Option<LoanOffer>> {
        let sql = format!(
            r#"
            UPDATE loan_offers
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                interest_rate = COALESCE($5, interest_rate),
                min_amount = COALESCE($6, min_amount),
                max_amount = COALESCE($7, max_amount),
                updated_at = NOW()
            WHERE id = $1
              AND ($8::text IS NULL OR created_by = $8)
              AND COALESCE($6, min_amount) <= COALESCE($7, max_amount)
            RETURNING {OFFER_COLUMNS}
            "#
        );
        self.timed(
            sqlx::query_as::<_, LoanOffer>(&sql)
                .bind(id)
                .bind(patch.title)
                .bind(patch.description)
                .bind(patch.category)
                .bind(patch.interest_rate)
                .bind(patch.min_amount)
                .bind(patch.max_amount)
                .bind(owner)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn set_show_on_home(&self, id: Uuid, show: bool) -> StoreResult<Option<LoanOffer>> {
        let sql = format!(
            r#"
            UPDATE loan_offers SET show_on_home = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {OFFER_COLUMNS}
            "#
        );
        self.timed(
            sqlx::query_as::<_, LoanOffer>(&sql)
                .bind(id)
                .bind(show)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete_offer(&self, id: Uuid, owner: Option<&str>) -> StoreResult<bool> {
        let result = self
            .timed(
                sqlx::query(
                    "DELETE FROM loan_offers WHERE id = $1 AND ($2::text IS NULL OR created_by = $2)",
                )
                .bind(id)
                .bind(owner)
                .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn insert_application(
        &self,
        application: NewApplication,
    ) -> StoreResult<LoanApplication> {
        let sql = format!(
            r#"
            INSERT INTO loan_applications (
                id, applicant_email, applicant_name, loan_id,
                requested_amount, purpose, status, fee_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {APPLICATION_COLUMNS}
            "#
        );
        self.timed(
            sqlx::query_as::<_, LoanApplication>(&sql)
                .bind(Uuid::new_v4())
                .bind(&application.applicant_email)
                .bind(&application.applicant_name)
                .bind(application.loan_id)
                .bind(application.requested_amount)
                .bind(&application.purpose)
                .bind(ApplicationStatus::Pending)
                .bind(FeeStatus::Unpaid)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn find_application(&self, id: Uuid) -> StoreResult<Option<LoanApplication>> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM loan_applications WHERE id = $1");
        self.timed(
            sqlx::query_as::<_, LoanApplication>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn list_applications(
        &self,
        filter: ApplicationFilter,
    ) -> StoreResult<Vec<LoanApplication>> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM loan_applications
            WHERE ($1::text IS NULL OR applicant_email = $1)
              AND ($2::application_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        );
        self.timed(
            sqlx::query_as::<_, LoanApplication>(&sql)
                .bind(filter.applicant_email)
                .bind(filter.status)
                .bind(filter.page.limit)
                .bind(filter.page.offset)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn transition(
        &self,
        id: Uuid,
        transition: StatusTransition,
    ) -> StoreResult<Option<LoanApplication>> {
        let sql = format!(
            r#"
            UPDATE loan_applications
            SET status = $2, approved_at = $3, updated_at = $4
            WHERE id = $1 AND status = $5 AND ($6::text IS NULL OR applicant_email = $6)
            RETURNING {APPLICATION_COLUMNS}
            "#
        );
        self.timed(
            sqlx::query_as::<_, LoanApplication>(&sql)
                .bind(id)
                .bind(transition.to)
                .bind(transition.approved_at())
                .bind(transition.at)
                .bind(transition.from)
                .bind(transition.applicant_email.as_deref())
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn record_fee_payment(
        &self,
        id: Uuid,
        payment: FeePayment,
    ) -> StoreResult<Option<LoanApplication>> {
        let sql = format!(
            r#"
            UPDATE loan_applications
            SET fee_status = $2, transaction_id = $3, paid_at = $4, updated_at = $4
            WHERE id = $1 AND fee_status = $5 AND applicant_email = $6
            RETURNING {APPLICATION_COLUMNS}
            "#
        );
        self.timed(
            sqlx::query_as::<_, LoanApplication>(&sql)
                .bind(id)
                .bind(FeeStatus::Paid)
                .bind(&payment.transaction_id)
                .bind(payment.paid_at)
                .bind(FeeStatus::Unpaid)
                .bind(&payment.applicant_email)
                .fetch_optional(&self.pool),
        )
        .await
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        self.timed(db::check_health(&self.pool)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("ann"), "%ann%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
