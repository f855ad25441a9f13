//! In-memory store
//!
//! Backs the test suites and `STORE_BACKEND=memory`. A single `RwLock` guards
//! all collections, so every conditional update is atomic with respect to
//! concurrent callers.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ApplicationFilter, ApplicationStore, HealthCheck, LoanFilter, LoanStore, StatusNote,
    StoreError, StoreResult, UserStore,
};
use crate::models::{
    ApplicationStatus, FeePayment, FeeStatus, LoanApplication, LoanOffer, LoanOfferPatch,
    NewApplication, NewLoanOffer, NewUser, PageRequest, StatusTransition, User, UserRole,
    UserStatus,
};

/// Records keep their insertion sequence so "newest first" is deterministic
/// even when timestamps collide.
#[derive(Debug)]
struct Table<T> {
    next_seq: u64,
    rows: HashMap<Uuid, (u64, T)>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            rows: HashMap::new(),
        }
    }
}

impl<T: Clone> Table<T> {
    fn insert(&mut self, id: Uuid, row: T) {
        self.next_seq += 1;
        self.rows.insert(id, (self.next_seq, row));
    }

    fn get(&self, id: &Uuid) -> Option<&T> {
        self.rows.get(id).map(|(_, row)| row)
    }

    fn get_mut(&mut self, id: &Uuid) -> Option<&mut T> {
        self.rows.get_mut(id).map(|(_, row)| row)
    }

    fn newest_first(&self, keep: impl Fn(&T) -> bool, page: PageRequest) -> Vec<T> {
        let mut rows: Vec<&(u64, T)> = self.rows.values().filter(|(_, r)| keep(r)).collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        page.apply(rows.into_iter().map(|(_, r)| r.clone()))
    }
}

#[derive(Debug, Default)]
struct Inner {
    users: Table<User>,
    offers: Table<LoanOffer>,
    applications: Table<LoanApplication>,
}

/// In-memory implementation of every store trait
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.rows.values().any(|(_, u)| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email '{}' already registered",
                user.email
            )));
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            photo_url: user.photo_url,
            password_hash: user.password_hash,
            role: user.role,
            status: UserStatus::Active,
            suspend_reason: None,
            suspend_feedback: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .rows
            .values()
            .map(|(_, u)| u)
            .find(|u| u.email == email)
            .cloned())
    }

    async fn search_users(&self, search: Option<&str>) -> StoreResult<Vec<User>> {
        let needle = search.unwrap_or_default().to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner.users.newest_first(
            |u| {
                needle.is_empty()
                    || contains_ci(&u.email, &needle)
                    || u.name.as_deref().is_some_and(|n| contains_ci(n, &needle))
            },
            PageRequest::default(),
        ))
    }

    async fn set_user_role(&self, id: Uuid, role: UserRole) -> StoreResult<Option<User>> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.get_mut(&id).map(|user| {
            user.role = role;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_user_status(
        &self,
        id: Uuid,
        status: UserStatus,
        note: StatusNote,
    ) -> StoreResult<Option<User>> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.get_mut(&id).map(|user| {
            user.status = status;
            user.suspend_reason = note.reason;
            user.suspend_feedback = note.feedback;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.users.rows.remove(&id).is_some())
    }
}

#[async_trait]
impl LoanStore for MemoryStore {
    async fn insert_offer(&self, offer: NewLoanOffer) -> StoreResult<LoanOffer> {
        let now = Utc::now();
        let record = LoanOffer {
            id: Uuid::new_v4(),
            title: offer.title,
            description: offer.description,
            category: offer.category,
            interest_rate: offer.interest_rate,
            min_amount: offer.min_amount,
            max_amount: offer.max_amount,
            created_by: offer.created_by,
            show_on_home: offer.show_on_home,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .await
            .offers
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_offer(&self, id: Uuid) -> StoreResult<Option<LoanOffer>> {
        Ok(self.inner.read().await.offers.get(&id).cloned())
    }

    async fn list_offers(&self, filter: LoanFilter) -> StoreResult<Vec<LoanOffer>> {
        let inner = self.inner.read().await;
        Ok(inner.offers.newest_first(
            |o| {
                filter
                    .created_by
                    .as_deref()
                    .map_or(true, |email| o.created_by == email)
                    && filter.show_on_home.map_or(true, |s| o.show_on_home == s)
            },
            filter.page,
        ))
    }

    async fn update_offer(
        &self,
        id: Uuid,
        patch: LoanOfferPatch,
        owner: Option<&str>,
    ) -> StoreResult<Option<LoanOffer>> {
        let mut inner = self.inner.write().await;
        let Some(offer) = inner.offers.get_mut(&id) else {
            return Ok(None);
        };
        if owner.is_some_and(|email| offer.created_by != email) || !patch.keeps_bounds(offer) {
            return Ok(None);
        }
        patch.apply_to(offer);
        offer.updated_at = Utc::now();
        Ok(Some(offer.clone()))
    }

    async fn set_show_on_home(&self, id: Uuid, show: bool) -> StoreResult<Option<LoanOffer>> {
        let mut inner = self.inner.write().await;
        Ok(inner.offers.get_mut(&id).map(|offer| {
            offer.show_on_home = show;
            offer.updated_at = Utc::now();
            offer.clone()
        }))
    }

    async fn delete_offer(&self, id: Uuid, owner: Option<&str>) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let owned = match inner.offers.get(&id) {
            Some(offer) => owner.map_or(true, |email| offer.created_by == email),
            None => false,
        };
        if owned {
            inner.offers.rows.remove(&id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert_application(
        &self,
        application: NewApplication,
    ) -> StoreResult<LoanApplication> {
        let now = Utc::now();
        let record = LoanApplication {
            id: Uuid::new_v4(),
            applicant_email: application.applicant_email,
            applicant_name: application.applicant_name,
            loan_id: application.loan_id,
            requested_amount: application.requested_amount,
            purpose: application.purpose,
            status: ApplicationStatus::Pending,
            fee_status: FeeStatus::Unpaid,
            transaction_id: None,
            paid_at: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .await
            .applications
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_application(&self, id: Uuid) -> StoreResult<Option<LoanApplication>> {
        Ok(self.inner.read().await.applications.get(&id).cloned())
    }

    async fn list_applications(
        &self,
        filter: ApplicationFilter,
    ) -> StoreResult<Vec<LoanApplication>> {
        let inner = self.inner.read().await;
        Ok(inner.applications.newest_first(
            |a| {
                filter
                    .applicant_email
                    .as_deref()
                    .map_or(true, |email| a.applicant_email == email)
                    && filter.status.map_or(true, |s| a.status == s)
            },
            filter.page,
        ))
    }

    async fn transition(
        &self,
        id: Uuid,
        transition: StatusTransition,
    ) -> StoreResult<Option<LoanApplication>> {
        let mut inner = self.inner.write().await;
        let Some(application) = inner.applications.get_mut(&id) else {
            return Ok(None);
        };
        let owner_matches = transition
            .applicant_email
            .as_deref()
            .map_or(true, |email| application.applicant_email == email);
        if application.status != transition.from || !owner_matches {
            return Ok(None);
        }

        application.status = transition.to;
        application.approved_at = transition.approved_at();
        application.updated_at = transition.at;
        Ok(Some(application.clone()))
    }

    async fn record_fee_payment(
        &self,
        id: Uuid,
        payment: FeePayment,
    ) -> StoreResult<Option<LoanApplication>> {
        let mut inner = self.inner.write().await;
        let Some(application) = inner.applications.get_mut(&id) else {
            return Ok(None);
        };
        if application.fee_status != FeeStatus::Unpaid
            || application.applicant_email != payment.applicant_email
        {
            return Ok(None);
        }

        application.fee_status = FeeStatus::Paid;
        application.transaction_id = Some(payment.transaction_id);
        application.paid_at = Some(payment.paid_at);
        application.updated_at = payment.paid_at;
        Ok(Some(application.clone()))
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: Some("Test User".to_string()),
            photo_url: None,
            password_hash: None,
            role: UserRole::Borrower,
        }
    }

    fn new_application(email: &str) -> NewApplication {
        NewApplication {
            applicant_email: email.to_string(),
            applicant_name: None,
            loan_id: None,
            requested_amount: 5000,
            purpose: "medical".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com")).await.unwrap();
        let err = store.insert_user(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        // Emails are case-sensitive keys
        assert!(store.insert_user(new_user("A@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = MemoryStore::new();
        store.insert_user(new_user("karim@example.com")).await.unwrap();
        store.insert_user(new_user("nadia@example.com")).await.unwrap();

        let found = store.search_users(Some("KARIM")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(store.search_users(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let store = MemoryStore::new();
        let app = store
            .insert_application(new_application("b@example.com"))
            .await
            .unwrap();

        let approve = StatusTransition {
            from: ApplicationStatus::Pending,
            to: ApplicationStatus::Approved,
            applicant_email: None,
            at: Utc::now(),
        };
        let updated = store.transition(app.id, approve.clone()).await.unwrap();
        assert_eq!(updated.unwrap().status, ApplicationStatus::Approved);

        // Source state no longer matches
        assert!(store.transition(app.id, approve).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owner_guard_leaves_record_untouched() {
        let store = MemoryStore::new();
        let app = store
            .insert_application(new_application("owner@example.com"))
            .await
            .unwrap();

        let cancel = StatusTransition {
            from: ApplicationStatus::Pending,
            to: ApplicationStatus::Cancelled,
            applicant_email: Some("intruder@example.com".to_string()),
            at: Utc::now(),
        };
        assert!(store.transition(app.id, cancel).await.unwrap().is_none());
        let stored = store.find_application(app.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paged() {
        let store = MemoryStore::new();
        for _ in 0..3 {
            store
                .insert_application(new_application("c@example.com"))
                .await
                .unwrap();
        }
        let last = store
            .insert_application(new_application("c@example.com"))
            .await
            .unwrap();

        let all = store
            .list_applications(ApplicationFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].id, last.id);

        let page = store
            .list_applications(ApplicationFilter {
                page: PageRequest::new(Some(2), Some(3)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_offer_patches_cannot_invert_bounds() {
        let store = MemoryStore::new();
        let offer = store
            .insert_offer(NewLoanOffer {
                title: "Starter".to_string(),
                description: String::new(),
                category: "personal".to_string(),
                interest_rate: 9.5,
                min_amount: 1000,
                max_amount: 5000,
                created_by: "mo@example.com".to_string(),
                show_on_home: false,
            })
            .await
            .unwrap();

        let raise_min = LoanOfferPatch {
            min_amount: Some(4000),
            ..Default::default()
        };
        let lower_max = LoanOfferPatch {
            max_amount: Some(3000),
            ..Default::default()
        };
        let (a, b) = tokio::join!(
            store.update_offer(offer.id, raise_min, None),
            store.update_offer(offer.id, lower_max, None),
        );
        let applied = [a.unwrap(), b.unwrap()];
        assert_eq!(applied.iter().filter(|o| o.is_some()).count(), 1);

        let stored = store.find_offer(offer.id).await.unwrap().unwrap();
        assert!(stored.min_amount <= stored.max_amount);
    }
}
