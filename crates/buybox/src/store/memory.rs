use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::access::{Ban, BanRepository, EmailAddress};
use crate::onboarding::{
    BuyerOnboarding, OnboardingId, OnboardingRepository, OnboardingStep, StepRecord, UserId,
};
use crate::property::{Property, PropertyId, PropertyRepository};
use crate::signups::{Lead, NewsletterSubscription, SignupRepository, WaitlistEntry};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
}

#[derive(Default)]
pub struct InMemoryBanRepository {
    bans: Mutex<BTreeMap<EmailAddress, Ban>>,
}

impl BanRepository for InMemoryBanRepository {
    fn upsert(&self, ban: Ban) -> Result<Ban, RepositoryError> {
        lock(&self.bans)?.insert(ban.email.clone(), ban.clone());
        Ok(ban)
    }

    fn remove(&self, email: &EmailAddress) -> Result<bool, RepositoryError> {
        Ok(lock(&self.bans)?.remove(email).is_some())
    }

    fn fetch(&self, email: &EmailAddress) -> Result<Option<Ban>, RepositoryError> {
        Ok(lock(&self.bans)?.get(email).cloned())
    }

    fn list(&self) -> Result<Vec<Ban>, RepositoryError> {
        Ok(lock(&self.bans)?.values().cloned().collect())
    }
}

#[derive(Default)]
struct OnboardingTables {
    onboardings: HashMap<OnboardingId, BuyerOnboarding>,
    by_user: HashMap<UserId, OnboardingId>,
    steps: HashMap<OnboardingId, BTreeMap<OnboardingStep, StepRecord>>,
}

/// Onboardings and their step rows behind one lock, so a step upsert and the
/// matching advance are applied together.
#[derive(Default)]
pub struct InMemoryOnboardingRepository {
    tables: Mutex<OnboardingTables>,
}

impl OnboardingRepository for InMemoryOnboardingRepository {
    fn insert(&self, onboarding: BuyerOnboarding) -> Result<BuyerOnboarding, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        if tables.by_user.contains_key(&onboarding.user_id)
            || tables.onboardings.contains_key(&onboarding.id)
        {
            return Err(RepositoryError::Conflict);
        }
        tables
            .by_user
            .insert(onboarding.user_id.clone(), onboarding.id.clone());
        tables
            .onboardings
            .insert(onboarding.id.clone(), onboarding.clone());
        Ok(onboarding)
    }

    fn fetch(&self, id: &OnboardingId) -> Result<Option<BuyerOnboarding>, RepositoryError> {
        Ok(lock(&self.tables)?.onboardings.get(id).cloned())
    }

    fn fetch_by_user(&self, user_id: &UserId) -> Result<Option<BuyerOnboarding>, RepositoryError> {
        let tables = lock(&self.tables)?;
        Ok(tables
            .by_user
            .get(user_id)
            .and_then(|id| tables.onboardings.get(id))
            .cloned())
    }

    fn list(&self, limit: usize) -> Result<Vec<BuyerOnboarding>, RepositoryError> {
        let tables = lock(&self.tables)?;
        let mut onboardings: Vec<BuyerOnboarding> = tables.onboardings.values().cloned().collect();
        onboardings.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        onboardings.truncate(limit);
        Ok(onboardings)
    }

    fn steps(&self, id: &OnboardingId) -> Result<Vec<StepRecord>, RepositoryError> {
        Ok(lock(&self.tables)?
            .steps
            .get(id)
            .map(|steps| steps.values().cloned().collect())
            .unwrap_or_default())
    }

    fn record_step(
        &self,
        record: StepRecord,
        advance_to: Option<OnboardingStep>,
    ) -> Result<BuyerOnboarding, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        let tables = &mut *tables;
        let onboarding = tables
            .onboardings
            .get_mut(&record.onboarding_id)
            .ok_or(RepositoryError::NotFound)?;
        if onboarding.current_step == OnboardingStep::Completed {
            return Err(RepositoryError::Conflict);
        }

        if let Some(next) = advance_to {
            if onboarding.current_step == record.step {
                onboarding.current_step = next;
            }
        }
        onboarding.updated_at = record.updated_at;
        let updated = onboarding.clone();

        tables
            .steps
            .entry(record.onboarding_id.clone())
            .or_default()
            .insert(record.step, record);
        Ok(updated)
    }

    fn mark_completed(
        &self,
        id: &OnboardingId,
        at: DateTime<Utc>,
    ) -> Result<BuyerOnboarding, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        let onboarding = tables
            .onboardings
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        onboarding.current_step = OnboardingStep::Completed;
        onboarding.completed_at = Some(at);
        onboarding.updated_at = at;
        Ok(onboarding.clone())
    }
}

#[derive(Default)]
pub struct InMemoryPropertyRepository {
    properties: Mutex<HashMap<PropertyId, Property>>,
}

impl PropertyRepository for InMemoryPropertyRepository {
    fn insert(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut properties = lock(&self.properties)?;
        if properties.contains_key(&property.id) {
            return Err(RepositoryError::Conflict);
        }
        properties.insert(property.id.clone(), property.clone());
        Ok(property)
    }

    fn modify<T, E, F>(&self, id: &PropertyId, apply: F) -> Result<T, E>
    where
        F: FnOnce(&mut Property) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut properties = lock(&self.properties)?;
        let slot = properties.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let mut draft = slot.clone();
        let result = apply(&mut draft)?;
        *slot = draft;
        Ok(result)
    }

    fn fetch(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        Ok(lock(&self.properties)?.get(id).cloned())
    }

    fn list(&self, limit: usize) -> Result<Vec<Property>, RepositoryError> {
        let properties = lock(&self.properties)?;
        let mut listed: Vec<Property> = properties.values().cloned().collect();
        listed.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        listed.truncate(limit);
        Ok(listed)
    }
}

#[derive(Default)]
struct SignupTables {
    subscriptions: HashMap<EmailAddress, NewsletterSubscription>,
    waitlist: BTreeMap<EmailAddress, WaitlistEntry>,
    next_position: u32,
    leads: Vec<Lead>,
}

#[derive(Default)]
pub struct InMemorySignupRepository {
    tables: Mutex<SignupTables>,
}

impl SignupRepository for InMemorySignupRepository {
    fn upsert_subscription(
        &self,
        subscription: NewsletterSubscription,
    ) -> Result<NewsletterSubscription, RepositoryError> {
        lock(&self.tables)?
            .subscriptions
            .insert(subscription.email.clone(), subscription.clone());
        Ok(subscription)
    }

    fn fetch_subscription(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<NewsletterSubscription>, RepositoryError> {
        Ok(lock(&self.tables)?.subscriptions.get(email).cloned())
    }

    fn join_waitlist(
        &self,
        email: EmailAddress,
        name: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(WaitlistEntry, bool), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        if let Some(existing) = tables.waitlist.get(&email) {
            return Ok((existing.clone(), false));
        }
        tables.next_position += 1;
        let entry = WaitlistEntry {
            email: email.clone(),
            name,
            position: tables.next_position,
            joined_at: at,
        };
        tables.waitlist.insert(email, entry.clone());
        Ok((entry, true))
    }

    fn insert_lead(&self, lead: Lead) -> Result<Lead, RepositoryError> {
        lock(&self.tables)?.leads.push(lead.clone());
        Ok(lead)
    }

    fn leads(&self, limit: usize) -> Result<Vec<Lead>, RepositoryError> {
        Ok(lock(&self.tables)?
            .leads
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::steps::PlatformTraining;
    use crate::onboarding::StepPayload;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 2, 9, minute, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn record_step_upserts_and_advances_once() {
        let repository = InMemoryOnboardingRepository::default();
        let onboarding = repository
            .insert(BuyerOnboarding::new(UserId("user-1".to_string()), at(0)))
            .expect("inserted");

        let record = |minute| StepRecord {
            onboarding_id: onboarding.id.clone(),
            step: OnboardingStep::PlatformTraining,
            payload: StepPayload::PlatformTraining(PlatformTraining {
                modules_completed: vec!["marketplace-basics".to_string()],
                assessment_passed: true,
            }),
            completed: true,
            updated_at: at(minute),
        };

        let first = repository
            .record_step(record(1), Some(OnboardingStep::QualificationKycAml))
            .expect("recorded");
        // Not the current step, so nothing advances.
        assert_eq!(first.current_step, OnboardingStep::InitialInquiry);

        repository.record_step(record(2), None).expect("re-recorded");
        let steps = repository.steps(&onboarding.id).expect("steps");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].updated_at, at(2));
    }

    #[test]
    fn completed_onboardings_refuse_step_records() {
        let repository = InMemoryOnboardingRepository::default();
        let onboarding = repository
            .insert(BuyerOnboarding::new(UserId("user-2".to_string()), at(0)))
            .expect("inserted");
        repository
            .mark_completed(&onboarding.id, at(1))
            .expect("completed");

        let record = StepRecord {
            onboarding_id: onboarding.id.clone(),
            step: OnboardingStep::PlatformTraining,
            payload: StepPayload::PlatformTraining(PlatformTraining {
                modules_completed: Vec::new(),
                assessment_passed: true,
            }),
            completed: true,
            updated_at: at(2),
        };
        assert_eq!(
            repository.record_step(record, None).err(),
            Some(RepositoryError::Conflict)
        );
        assert!(repository.steps(&onboarding.id).expect("steps").is_empty());
    }

    #[test]
    fn second_onboarding_for_a_user_conflicts() {
        let repository = InMemoryOnboardingRepository::default();
        repository
            .insert(BuyerOnboarding::new(UserId("user-1".to_string()), at(0)))
            .expect("inserted");
        assert_eq!(
            repository
                .insert(BuyerOnboarding::new(UserId("user-1".to_string()), at(1)))
                .err(),
            Some(RepositoryError::Conflict)
        );
    }
}
