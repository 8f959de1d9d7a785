use std::{cell::Cell, rc::Rc};

use gloo::storage::{LocalStorage, Storage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use yew::prelude::*;

pub(crate) mod constants {
    pub(crate) const STORAGE_KEY: &str = "phatik.settings";
    pub(crate) const DEFAULT_UPDATE_FREQUENCY: f64 = 1.0;
    pub(crate) const DEFAULT_LIMIT: u32 = 100;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum SettingsError {
    #[error("update frequency must be a positive number of seconds, got {0:?}")]
    UpdateFrequency(String),
    #[error("limit must be a positive whole number, got {0:?}")]
    Limit(String),
}

/// How often and how much the events page polls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Settings {
    /// Pause between two polls, in seconds.
    pub(crate) update_frequency: f64,
    pub(crate) limit: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            update_frequency: constants::DEFAULT_UPDATE_FREQUENCY,
            limit: constants::DEFAULT_LIMIT,
        }
    }
}

impl Settings {
    pub(crate) fn new(update_frequency: f64, limit: u32) -> Result<Self, SettingsError> {
        if !update_frequency.is_finite() || update_frequency <= 0.0 {
            return Err(SettingsError::UpdateFrequency(update_frequency.to_string()));
        }
        if limit == 0 {
            return Err(SettingsError::Limit(limit.to_string()));
        }
        Ok(Self {
            update_frequency,
            limit,
        })
    }

    /// Builds settings from the raw text of the settings form.
    pub(crate) fn parse(update_frequency: &str, limit: &str) -> Result<Self, SettingsError> {
        let update_frequency_value = update_frequency
            .trim()
            .parse::<f64>()
            .map_err(|_| SettingsError::UpdateFrequency(update_frequency.to_owned()))?;
        let limit_value = limit
            .trim()
            .parse::<u32>()
            .map_err(|_| SettingsError::Limit(limit.to_owned()))?;
        Self::new(update_frequency_value, limit_value)
    }

    pub(crate) fn update_interval_millis(&self) -> u32 {
        (self.update_frequency * 1000.0).round().min(u32::MAX as f64) as u32
    }

    pub(crate) fn limit(&self) -> usize {
        self.limit as usize
    }

    /// Stored settings, or the defaults when nothing valid is stored.
    pub(crate) fn load() -> Self {
        LocalStorage::get::<Settings>(constants::STORAGE_KEY)
            .ok()
            .and_then(|stored| Settings::new(stored.update_frequency, stored.limit).ok())
            .unwrap_or_default()
    }

    pub(crate) fn persist(&self) {
        if let Err(e) = LocalStorage::set(constants::STORAGE_KEY, self) {
            log::warn!("could not persist settings: {e}");
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct AppState {
    pub(crate) settings: Settings,
    /// True while a long-poll request is outstanding.
    pub(crate) in_wait: bool,
}

impl AppState {
    pub(crate) fn with_persisted_settings() -> Self {
        Self {
            settings: Settings::load(),
            in_wait: false,
        }
    }
}

pub(crate) enum StoreAction {
    BeginLongPoll,
    EndLongPoll,
    UpdateSettings(Settings),
}

impl Reducible for AppState {
    type Action = StoreAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let next = match action {
            StoreAction::BeginLongPoll => AppState {
                in_wait: true,
                ..(*self).clone()
            },
            StoreAction::EndLongPoll => AppState {
                in_wait: false,
                ..(*self).clone()
            },
            StoreAction::UpdateSettings(settings) => AppState {
                settings,
                ..(*self).clone()
            },
        };

        if next == *self {
            self
        } else {
            Rc::new(next)
        }
    }
}

/// Handle to the application state, handed down through a `ContextProvider`.
pub(crate) type Store = UseReducerHandle<AppState>;

/// Pairs one poll loop's begin and end on the `in_wait` flag.
///
/// Cancelling ends the flag right away and mutes the loop, so a request that
/// is still out when its loop gets replaced cannot clear the flag its
/// successor has just raised.
#[derive(Clone)]
pub(crate) struct LongPollOwner {
    active: Rc<Cell<bool>>,
    dispatch: Rc<dyn Fn(StoreAction)>,
}

impl LongPollOwner {
    pub(crate) fn new(dispatch: impl Fn(StoreAction) + 'static) -> Self {
        Self {
            active: Rc::new(Cell::new(true)),
            dispatch: Rc::new(dispatch),
        }
    }

    pub(crate) fn for_store(store: &Store) -> Self {
        let dispatcher = store.dispatcher();
        Self::new(move |action| dispatcher.dispatch(action))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.get()
    }

    pub(crate) fn begin(&self) {
        if self.is_active() {
            (self.dispatch)(StoreAction::BeginLongPoll);
        }
    }

    pub(crate) fn end(&self) {
        if self.is_active() {
            (self.dispatch)(StoreAction::EndLongPoll);
        }
    }

    pub(crate) fn cancel(&self) {
        if self.active.replace(false) {
            (self.dispatch)(StoreAction::EndLongPoll);
        }
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use super::*;

    fn reduce(state: AppState, actions: Vec<StoreAction>) -> Rc<AppState> {
        actions
            .into_iter()
            .fold(Rc::new(state), |state, action| state.reduce(action))
    }

    #[test]
    pub fn starts_with_defaults() {
        let state = AppState::default();
        assert_eq!(state.settings.update_frequency, 1.0);
        assert_eq!(state.settings.limit, 100);
        assert!(!state.in_wait);
    }

    #[test]
    pub fn toggles_long_poll_flag() {
        let state = reduce(AppState::default(), vec![StoreAction::BeginLongPoll]);
        assert!(state.in_wait);

        let state = reduce((*state).clone(), vec![StoreAction::EndLongPoll]);
        assert!(!state.in_wait);
    }

    #[test]
    pub fn begin_twice_stays_waiting() {
        let state = reduce(
            AppState::default(),
            vec![StoreAction::BeginLongPoll, StoreAction::BeginLongPoll],
        );
        assert!(state.in_wait);
    }

    #[test]
    pub fn end_without_begin_stays_idle() {
        let state = reduce(AppState::default(), vec![StoreAction::EndLongPoll]);
        assert!(!state.in_wait);
    }

    fn owner(state: &Rc<RefCell<Rc<AppState>>>) -> LongPollOwner {
        let state = state.clone();
        LongPollOwner::new(move |action| {
            let next = state.borrow().clone().reduce(action);
            *state.borrow_mut() = next;
        })
    }

    #[test]
    pub fn replaced_loop_cannot_clear_successor_wait() {
        let state = Rc::new(RefCell::new(Rc::new(AppState::default())));

        let old = owner(&state);
        old.begin();
        assert!(state.borrow().in_wait);

        // settings change while the old request is out
        old.cancel();
        assert!(!state.borrow().in_wait);
        let new = owner(&state);
        new.begin();

        // the old request returns late
        old.end();
        assert!(state.borrow().in_wait);

        new.end();
        assert!(!state.borrow().in_wait);
    }

    #[test]
    pub fn cancelled_loop_stays_silent() {
        let state = Rc::new(RefCell::new(Rc::new(AppState::default())));
        let old = owner(&state);
        old.cancel();
        assert!(!old.is_active());

        old.begin();
        assert!(!state.borrow().in_wait);
        old.cancel();
        assert!(!state.borrow().in_wait);
    }

    #[test]
    pub fn unmount_during_request_ends_wait() {
        let state = Rc::new(RefCell::new(Rc::new(AppState::default())));
        let only = owner(&state);
        only.begin();
        only.cancel();
        only.end();
        assert!(!state.borrow().in_wait);
    }

    #[test]
    pub fn unchanged_state_keeps_identity() {
        let before = Rc::new(AppState::default());
        let after = before.clone().reduce(StoreAction::EndLongPoll);
        assert!(Rc::ptr_eq(&before, &after));
    }

    #[test]
    pub fn updates_settings_without_touching_flag() {
        let settings = Settings::new(2.5, 10).unwrap();
        let state = reduce(
            AppState::default(),
            vec![
                StoreAction::BeginLongPoll,
                StoreAction::UpdateSettings(settings),
            ],
        );
        assert_eq!(state.settings, settings);
        assert!(state.in_wait);
    }

    #[test]
    pub fn rejects_invalid_settings() {
        assert!(matches!(
            Settings::new(0.0, 10),
            Err(SettingsError::UpdateFrequency(_))
        ));
        assert!(matches!(
            Settings::new(-1.0, 10),
            Err(SettingsError::UpdateFrequency(_))
        ));
        assert!(matches!(
            Settings::new(f64::NAN, 10),
            Err(SettingsError::UpdateFrequency(_))
        ));
        assert!(matches!(Settings::new(1.0, 0), Err(SettingsError::Limit(_))));
    }

    #[test]
    pub fn parses_form_input() {
        assert_eq!(
            Settings::parse(" 0.5 ", "20"),
            Ok(Settings {
                update_frequency: 0.5,
                limit: 20
            })
        );
        assert_eq!(
            Settings::parse("soon", "20"),
            Err(SettingsError::UpdateFrequency("soon".to_owned()))
        );
        assert_eq!(
            Settings::parse("1", "-3"),
            Err(SettingsError::Limit("-3".to_owned()))
        );
    }

    #[test]
    pub fn converts_frequency_to_interval() {
        assert_eq!(Settings::default().update_interval_millis(), 1000);
        assert_eq!(Settings::new(0.25, 1).unwrap().update_interval_millis(), 250);
    }

    #[test]
    pub fn persists_with_camel_case_fields() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert_eq!(json, r#"{"updateFrequency":1.0,"limit":100}"#);
    }
}
