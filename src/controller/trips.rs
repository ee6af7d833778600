// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trip list and trip detail board.

use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::{storage_failure, ControllerError, Outcome, SIGN_IN_REQUIRED};
use crate::identity::Viewer;
use crate::models::{Currency, Trip, TripChanges, Visibility};
use crate::storage::{CreatedResource, DocumentStore, TripRepository};
use crate::validation::{TripForm, ValidTrip};
use crate::visibility;

pub const TRIP_ADDED: &str = "Trip added successfully!";
pub const TRIP_UPDATED: &str = "Trip updated successfully!";
pub const TRIP_DELETED: &str = "Trip deleted successfully!";
pub const SAMPLE_TRIP_ADDED: &str = "Sample trip added!";

/// Days from today until the sample trip starts, and its length.
const SAMPLE_TRIP_LEAD_DAYS: u64 = 30;
const SAMPLE_TRIP_NIGHTS: u64 = 6;

/// The trips one viewer is looking at.
pub struct TripBoard<'a> {
    store: &'a dyn DocumentStore,
    viewer: Option<Viewer>,
    today: NaiveDate,
    trips: Vec<Trip>,
}

impl<'a> TripBoard<'a> {
    /// An empty board. Use [`load`](Self::load) or [`load_trip`](Self::load_trip)
    /// to populate it from storage.
    pub fn new(store: &'a dyn DocumentStore, viewer: Option<Viewer>) -> Self {
        Self {
            store,
            viewer,
            today: Utc::now().date_naive(),
            trips: Vec::new(),
        }
    }

    /// Load every trip the viewer may see.
    pub fn load(
        store: &'a dyn DocumentStore,
        viewer: Option<Viewer>,
    ) -> Result<Self, ControllerError> {
        let mut board = Self::new(store, viewer);
        let all = TripRepository::new(store)
            .list()
            .map_err(storage_failure("Failed to load trips", "Trip"))?;
        board.trips = visibility::filter(&all, board.viewer_id());
        debug!(visible = board.trips.len(), total = all.len(), "Loaded trips");
        Ok(board)
    }

    /// Load a single trip. Missing and invisible trips are both not found.
    pub fn load_trip(
        store: &'a dyn DocumentStore,
        viewer: Option<Viewer>,
        trip_id: &str,
    ) -> Result<Self, ControllerError> {
        let mut board = Self::new(store, viewer);
        let trip = TripRepository::new(store)
            .get(trip_id)
            .map_err(storage_failure("Failed to load trip", "Trip"))?
            .filter(|trip| visibility::is_visible(trip, board.viewer_id()))
            .ok_or(ControllerError::NotFound("Trip"))?;
        board.trips.push(trip);
        Ok(board)
    }

    /// Override the calendar day used for date validation.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn viewer_id(&self) -> Option<&str> {
        self.viewer.as_ref().map(|v| v.user_id.as_str())
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn into_trips(self) -> Vec<Trip> {
        self.trips
    }

    pub fn trip(&self, trip_id: &str) -> Option<&Trip> {
        self.trips.iter().find(|t| t.id == trip_id)
    }

    /// Whether the viewer created `trip_id`. Drives edit/delete controls.
    pub fn is_creator(&self, trip_id: &str) -> bool {
        self.trip(trip_id)
            .is_some_and(|trip| trip.is_created_by(self.viewer_id()))
    }

    fn require_viewer(&self) -> Result<&Viewer, ControllerError> {
        self.viewer
            .as_ref()
            .ok_or(ControllerError::Unauthenticated(SIGN_IN_REQUIRED))
    }

    /// Locate a local trip the viewer may change.
    ///
    /// `Ok(None)` means the viewer is not its creator.
    fn owned_trip(&self, trip_id: &str) -> Result<Option<&Trip>, ControllerError> {
        let trip = self.trip(trip_id).ok_or(ControllerError::NotFound("Trip"))?;
        if trip.is_created_by(self.viewer_id()) {
            Ok(Some(trip))
        } else {
            debug!(trip_id, viewer = ?self.viewer_id(), "Refusing change by non-creator");
            Ok(None)
        }
    }

    fn refilter(&mut self) {
        self.trips = visibility::filter(&self.trips, self.viewer_id());
    }

    fn insert(&mut self, valid: ValidTrip, creator_id: String) -> Result<Trip, ControllerError> {
        let trip = Trip {
            id: String::new(),
            title: valid.title,
            destination: valid.destination,
            start_date: valid.start_date,
            end_date: valid.end_date,
            budget: valid.budget,
            currency: valid.currency,
            visibility: valid.visibility,
            creator_id,
            created_at: Utc::now(),
            updated_at: None,
        };

        let trip = TripRepository::new(self.store)
            .add(&trip)
            .map_err(storage_failure("Failed to add trip", "Trip"))?;

        info!(trip_id = %trip.id, creator_id = %trip.creator_id, "Trip created");
        self.trips.push(trip.clone());
        self.refilter();
        Ok(trip)
    }

    // ========== Intents ==========

    /// Validate `form` and store a new trip created by the viewer.
    pub fn create_trip(&mut self, form: &TripForm) -> Result<Outcome<Trip>, ControllerError> {
        let creator_id = self.require_viewer()?.user_id.clone();
        let valid = form.validate(self.today)?;
        let trip = self.insert(valid, creator_id)?;
        Ok(Outcome::applied(trip, TRIP_ADDED))
    }

    /// Store the fixed sample trip for the viewer.
    pub fn add_sample_trip(&mut self) -> Result<Outcome<Trip>, ControllerError> {
        let creator_id = self.require_viewer()?.user_id.clone();
        let start_date = self.today + Days::new(SAMPLE_TRIP_LEAD_DAYS);
        let sample = ValidTrip {
            title: "Spring Break in Amsterdam".to_string(),
            destination: "Amsterdam".to_string(),
            start_date,
            end_date: start_date + Days::new(SAMPLE_TRIP_NIGHTS),
            budget: Decimal::from(1800),
            currency: Currency::Eur,
            visibility: Visibility::Public,
        };
        let trip = self.insert(sample, creator_id)?;
        Ok(Outcome::applied(trip, SAMPLE_TRIP_ADDED))
    }

    /// Apply `form` to a trip the viewer created.
    pub fn update_trip(
        &mut self,
        trip_id: &str,
        form: &TripForm,
    ) -> Result<Outcome<Trip>, ControllerError> {
        self.require_viewer()?;
        let Some(current) = self.owned_trip(trip_id)? else {
            return Ok(Outcome::Refused);
        };

        let valid = form.validate(self.today)?;
        let changes = TripChanges {
            title: valid.title,
            destination: valid.destination,
            start_date: valid.start_date,
            end_date: valid.end_date,
            budget: valid.budget,
            currency: valid.currency,
            visibility: valid.visibility,
            updated_at: Utc::now(),
        };
        let patched = current.with_changes(&changes);

        let repo = TripRepository::new(self.store);
        repo.update(trip_id, &changes)
            .map_err(storage_failure("Failed to update trip", "Trip"))?;

        let refreshed = match repo.get(trip_id) {
            Ok(Some(trip)) => trip,
            Ok(None) => patched,
            Err(e) => {
                warn!(trip_id, error = %e, "Re-read after update failed, using local copy");
                patched
            }
        };

        info!(trip_id, "Trip updated");
        if let Some(slot) = self.trips.iter_mut().find(|t| t.id == trip_id) {
            *slot = refreshed.clone();
        }
        self.refilter();
        Ok(Outcome::applied(refreshed, TRIP_UPDATED))
    }

    /// Delete a trip the viewer created. Its expenses are left in storage.
    pub fn delete_trip(&mut self, trip_id: &str) -> Result<Outcome<Trip>, ControllerError> {
        self.require_viewer()?;
        let Some(current) = self.owned_trip(trip_id)?.cloned() else {
            return Ok(Outcome::Refused);
        };

        TripRepository::new(self.store)
            .delete(trip_id)
            .map_err(storage_failure("Failed to delete trip", "Trip"))?;

        info!(trip_id, "Trip deleted");
        self.trips.retain(|t| t.id != trip_id);
        Ok(Outcome::applied(current, TRIP_DELETED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::test_support::CountingStore;
    use crate::storage::{CollectionPath, StoredDocument};
    use serde_json::json;

    fn viewer(user_id: &str) -> Option<Viewer> {
        Some(Viewer {
            user_id: user_id.to_string(),
            session_token: format!("token-{user_id}"),
        })
    }

    fn today() -> NaiveDate {
        "2026-10-18".parse().unwrap()
    }

    fn form(title: &str, visibility: Visibility) -> TripForm {
        TripForm {
            title: Some(title.to_string()),
            destination: Some("Kyoto".to_string()),
            start_date: "2026-12-01".parse().ok(),
            end_date: "2026-12-10".parse().ok(),
            budget: Some(json!(2500)),
            currency: Some(Currency::Jpy),
            visibility: Some(visibility),
        }
    }

    fn seed(store: &CountingStore, owner: &str, title: &str, visibility: Visibility) -> Trip {
        let mut board = TripBoard::new(store, viewer(owner)).with_today(today());
        match board.create_trip(&form(title, visibility)).unwrap() {
            Outcome::Applied { record, .. } => record,
            Outcome::Refused => panic!("create refused"),
        }
    }

    fn stored_trips(store: &CountingStore) -> Vec<StoredDocument> {
        store.get_all(&CollectionPath::trips()).unwrap()
    }

    #[test]
    fn create_trip_stamps_creator_and_notifies() {
        let store = CountingStore::new();
        let mut board = TripBoard::new(&store, viewer("u1")).with_today(today());

        let outcome = board.create_trip(&form("Kyoto", Visibility::Private)).unwrap();
        let Outcome::Applied {
            record,
            notification,
        } = outcome
        else {
            panic!("expected applied");
        };

        assert_eq!(record.creator_id, "u1");
        assert!(!record.id.is_empty());
        assert_eq!(notification.message, TRIP_ADDED);
        assert_eq!(board.trips(), std::slice::from_ref(&record));
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn create_trip_in_the_past_writes_nothing() {
        let store = CountingStore::new();
        let mut board = TripBoard::new(&store, viewer("u1")).with_today(today());
        let past = TripForm {
            start_date: "2026-10-01".parse().ok(),
            ..form("Too late", Visibility::Public)
        };

        let result = board.create_trip(&past);

        assert!(matches!(result, Err(ControllerError::Validation(_))));
        assert_eq!(store.calls(), 0);
        assert!(board.trips().is_empty());
        assert!(stored_trips(&store).is_empty());
    }

    #[test]
    fn anonymous_viewer_cannot_create() {
        let store = CountingStore::new();
        let mut board = TripBoard::new(&store, None).with_today(today());
        let result = board.create_trip(&form("Nope", Visibility::Public));
        assert!(matches!(result, Err(ControllerError::Unauthenticated(_))));
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn load_filters_by_viewer() {
        let store = CountingStore::new();
        let public = seed(&store, "u2", "Public by u2", Visibility::Public);
        let own = seed(&store, "u1", "Private by u1", Visibility::Private);
        seed(&store, "u3", "Private by u3", Visibility::Private);

        let board = TripBoard::load(&store, viewer("u1")).unwrap();
        assert_eq!(board.trips(), &[public.clone(), own][..]);

        let anonymous = TripBoard::load(&store, None).unwrap();
        assert_eq!(anonymous.trips(), &[public][..]);
    }

    #[test]
    fn private_trip_of_someone_else_is_not_found() {
        let store = CountingStore::new();
        let trip = seed(&store, "u1", "Secret", Visibility::Private);

        assert!(matches!(
            TripBoard::load_trip(&store, viewer("u2"), &trip.id),
            Err(ControllerError::NotFound("Trip"))
        ));
        let board = TripBoard::load_trip(&store, viewer("u1"), &trip.id).unwrap();
        assert!(board.is_creator(&trip.id));
    }

    #[test]
    fn non_creator_delete_is_refused_without_storage_call() {
        let store = CountingStore::new();
        let trip = seed(&store, "u1", "Shared", Visibility::Public);

        let mut board = TripBoard::load(&store, viewer("u2")).unwrap();
        let calls_before = store.calls();

        let outcome = board.delete_trip(&trip.id).unwrap();

        assert!(outcome.is_refused());
        assert_eq!(store.calls(), calls_before);
        assert_eq!(board.trips(), &[trip][..]);
        assert_eq!(stored_trips(&store).len(), 1);
    }

    #[test]
    fn non_creator_update_is_refused_before_validation() {
        let store = CountingStore::new();
        let trip = seed(&store, "u1", "Shared", Visibility::Public);
        let mut board = TripBoard::load(&store, viewer("u2"))
            .unwrap()
            .with_today(today());
        let writes_before = store.writes();

        let outcome = board.update_trip(&trip.id, &TripForm::default()).unwrap();

        assert!(outcome.is_refused());
        assert_eq!(store.writes(), writes_before);
        assert_eq!(board.trip(&trip.id), Some(&trip));
    }

    #[test]
    fn creator_update_refreshes_from_storage() {
        let store = CountingStore::new();
        let trip = seed(&store, "u1", "Before", Visibility::Public);
        let mut board = TripBoard::load(&store, viewer("u1"))
            .unwrap()
            .with_today(today());

        let outcome = board
            .update_trip(&trip.id, &form("After", Visibility::Private))
            .unwrap();

        let Outcome::Applied { record, .. } = outcome else {
            panic!("expected applied");
        };
        assert_eq!(record.title, "After");
        assert_eq!(record.visibility, Visibility::Private);
        assert_eq!(record.creator_id, "u1");
        assert!(record.updated_at.is_some());
        assert_eq!(board.trip(&trip.id), Some(&record));
    }

    #[test]
    fn creator_delete_removes_trip_but_keeps_expenses() {
        let store = CountingStore::new();
        let trip = seed(&store, "u1", "Doomed", Visibility::Public);
        let expenses = CollectionPath::expenses(&trip.id).unwrap();
        store
            .add(&expenses, json!({"amount": 5}).as_object().cloned().unwrap())
            .unwrap();

        let mut board = TripBoard::load(&store, viewer("u1")).unwrap();
        let outcome = board.delete_trip(&trip.id).unwrap();

        assert!(!outcome.is_refused());
        assert!(board.trips().is_empty());
        assert!(stored_trips(&store).is_empty());
        assert_eq!(store.get_all(&expenses).unwrap().len(), 1);
    }

    #[test]
    fn failed_write_leaves_state_unchanged() {
        let store = CountingStore::new();
        let trip = seed(&store, "u1", "Sticky", Visibility::Public);
        let mut board = TripBoard::load(&store, viewer("u1")).unwrap();

        store.fail_writes(true);
        let result = board.delete_trip(&trip.id);

        assert!(matches!(result, Err(ControllerError::Storage { .. })));
        assert_eq!(board.trips(), &[trip][..]);
    }

    #[test]
    fn sample_trip_is_public_and_in_the_future() {
        let store = CountingStore::new();
        let mut board = TripBoard::new(&store, viewer("u1")).with_today(today());

        let Outcome::Applied { record, .. } = board.add_sample_trip().unwrap() else {
            panic!("expected applied");
        };

        assert_eq!(record.title, "Spring Break in Amsterdam");
        assert_eq!(record.visibility, Visibility::Public);
        assert_eq!(record.currency, Currency::Eur);
        assert_eq!(record.budget, Decimal::from(1800));
        assert!(record.start_date > today());
        assert!(record.end_date > record.start_date);
    }
}
