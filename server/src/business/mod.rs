use std::{sync::Arc, time::Duration};

use anyhow::Result;
use phatik_server_shared::{Event, EventList, ListOptions, PhaticMessage, TagList, TagListOptions};
use tokio::sync::{watch, Mutex};

use crate::data::{DatabaseApi, DbEvent};

/// Shared handle to the event database. Clones refer to the same storage.
#[derive(Clone)]
pub(crate) struct EventStore {
    database: Arc<Mutex<DatabaseApi>>,
    newest_id: Arc<watch::Sender<i64>>,
    long_poll_timeout: Duration,
}

impl EventStore {
    pub(crate) fn new(database: DatabaseApi, long_poll_timeout: Duration) -> Result<Self> {
        let newest = database.newest_id()?;
        let (newest_id, _) = watch::channel(newest);
        Ok(Self {
            database: Arc::new(Mutex::new(database)),
            newest_id: Arc::new(newest_id),
            long_poll_timeout,
        })
    }

    /// Lists events after `options.last_id`. If there are none and the caller
    /// asked to wait, holds on until a newer event is stored or the wait
    /// (capped by the configured timeout) runs out.
    pub(crate) async fn list(&self, options: ListOptions) -> Result<EventList> {
        let mut newest_id = self.newest_id.subscribe();
        let list = self.query(options).await?;

        let wait = Duration::from_secs(options.wait.unwrap_or(0)).min(self.long_poll_timeout);
        if !list.events.is_empty() || wait.is_zero() {
            return Ok(list);
        }

        let last_id = options.last_id_or_default();
        let woken = tokio::time::timeout(wait, newest_id.wait_for(|id| *id > last_id))
            .await
            .map(|newer| newer.is_ok())
            .unwrap_or(false);
        if woken {
            self.query(options).await
        } else {
            Ok(list)
        }
    }

    async fn query(&self, options: ListOptions) -> Result<EventList> {
        let database = self.database.lock().await;
        let (last_id, events) =
            database.events_after_id(options.last_id_or_default(), options.limit_or_default())?;
        Ok(EventList { events, last_id })
    }

    pub(crate) async fn post(&self, event: Event) -> Result<i64> {
        let id = {
            let database = self.database.lock().await;
            let tags = event
                .tags
                .into_iter()
                .map(|text| database.register_tag(text.as_str().into()))
                .collect::<Result<Vec<_>>>()?;

            database.register_event(DbEvent {
                message: event.message,
                app: event.app,
                tags,
                epoch_seconds: event.epoch_seconds,
            })?
        };
        self.newest_id.send_modify(|newest| *newest = (*newest).max(id));
        log::debug!("stored event {id}");
        Ok(id)
    }

    pub(crate) async fn tags(&self, options: TagListOptions) -> Result<TagList> {
        let database = self.database.lock().await;
        let tags = database.all_tags(options.limit)?;
        Ok(TagList { tags })
    }

    /// Answers a websocket frame. Posted statuses produce no reply.
    pub(crate) async fn handle_phatic_message(
        &self,
        message: PhaticMessage,
    ) -> Result<Option<PhaticMessage>> {
        Ok(match message {
            PhaticMessage::TagList(..) | PhaticMessage::StatusList(..) => Some(message),
            PhaticMessage::Request(options) => Some(PhaticMessage::StatusList(self.list(options).await?)),
            PhaticMessage::TagRequest(options) => Some(PhaticMessage::TagList(self.tags(options).await?)),
            PhaticMessage::Status(event) => {
                self.post(event).await?;
                None
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::time::Instant;

    use super::*;

    pub(crate) fn store(long_poll_timeout: Duration) -> EventStore {
        let database = DatabaseApi::new_temporary().unwrap();
        database.init_database().unwrap();
        EventStore::new(database, long_poll_timeout).unwrap()
    }

    pub(crate) fn event(message: &str) -> Event {
        Event {
            message: message.to_owned(),
            tags: vec!["build".to_owned()],
            app: "ci".to_owned(),
            epoch_seconds: 1_000,
        }
    }

    #[tokio::test]
    pub async fn lists_posted_events() {
        let store = store(Duration::from_secs(1));
        let id = store.post(event("hello")).await.unwrap();

        let list = store.list(ListOptions::default()).await.unwrap();
        assert_eq!(list.last_id, id);
        assert_eq!(list.events, vec![event("hello")]);
    }

    #[tokio::test]
    pub async fn returns_immediately_without_wait() {
        let store = store(Duration::from_secs(10));
        let list = store
            .list(ListOptions {
                last_id: Some(5),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(list, EventList { events: vec![], last_id: 5 });
    }

    #[tokio::test]
    pub async fn long_poll_wakes_up_on_new_event() {
        let store = store(Duration::from_secs(10));
        let poster = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            poster.post(event("late")).await.unwrap();
        });

        let started = Instant::now();
        let list = store
            .list(ListOptions {
                wait: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(list.events, vec![event("late")]);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    pub async fn long_poll_is_capped_by_configured_timeout() {
        let store = store(Duration::from_millis(100));
        let started = Instant::now();
        let list = store
            .list(ListOptions {
                wait: Some(60),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(list.events.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    pub async fn answers_websocket_requests() {
        let store = store(Duration::from_secs(1));
        let reply = store
            .handle_phatic_message(PhaticMessage::Status(event("via socket")))
            .await
            .unwrap();
        assert_eq!(reply, None);

        let reply = store
            .handle_phatic_message(PhaticMessage::TagRequest(TagListOptions::default()))
            .await
            .unwrap();
        assert_eq!(
            reply,
            Some(PhaticMessage::TagList(TagList {
                tags: vec!["build".to_owned()]
            }))
        );

        let reply = store
            .handle_phatic_message(PhaticMessage::Request(ListOptions::default()))
            .await
            .unwrap();
        assert_eq!(
            reply,
            Some(PhaticMessage::StatusList(EventList {
                events: vec![event("via socket")],
                last_id: 1,
            }))
        );
    }

    #[tokio::test]
    pub async fn echoes_lists() {
        let store = store(Duration::from_secs(1));
        let message = PhaticMessage::TagList(TagList { tags: vec![] });
        let reply = store.handle_phatic_message(message.clone()).await.unwrap();
        assert_eq!(reply, Some(message));
    }
}
