use std::collections::VecDeque;

use phatik_server_shared::{Event, EventList, ListOptions};

use crate::store::Settings;

pub(crate) mod constants {
    /// How long the server may hold a poll while nothing new arrived.
    pub(crate) const LONG_POLL_WAIT_SECONDS: u64 = 30;
}

/// Events received so far, newest first, and where the next poll continues.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct EventFeed {
    last_id: Option<i64>,
    events: VecDeque<Event>,
    /// The last page came back full, so the server may hold more.
    catching_up: bool,
}

impl EventFeed {
    /// Asks for the next page. While catching up the server must answer
    /// at once; only a caught-up feed lets it hold the request.
    pub(crate) fn next_request(&self, settings: &Settings) -> ListOptions {
        ListOptions {
            last_id: self.last_id,
            limit: Some(i64::from(settings.limit)),
            wait: (!self.catching_up).then_some(constants::LONG_POLL_WAIT_SECONDS),
        }
    }

    /// Adds a poll result (oldest first, as the server sends it) and drops
    /// everything beyond the `limit` most recent events.
    pub(crate) fn merge(&mut self, list: EventList, limit: usize) {
        self.catching_up = list.events.len() >= limit;
        for event in list.events {
            self.events.push_front(event);
        }
        self.events.truncate(limit);
        self.last_id = Some(self.last_id.map_or(list.last_id, |id| id.max(list.last_id)));
    }

    /// True until a page shorter than `limit` arrives; the poll loop asks
    /// again without pausing meanwhile.
    pub(crate) fn is_catching_up(&self) -> bool {
        self.catching_up
    }

    pub(crate) fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn event(message: &str) -> Event {
        Event {
            message: message.to_owned(),
            tags: vec![],
            app: "git".to_owned(),
            epoch_seconds: 0,
        }
    }

    fn messages(feed: &EventFeed) -> Vec<&str> {
        feed.events().map(|e| e.message.as_str()).collect()
    }

    #[test]
    pub fn first_request_starts_from_the_beginning() {
        let request = EventFeed::default().next_request(&Settings::default());
        assert_eq!(request.last_id, None);
        assert_eq!(request.limit, Some(100));
        assert_eq!(request.wait, Some(constants::LONG_POLL_WAIT_SECONDS));
    }

    #[test]
    pub fn continues_after_last_id() {
        let mut feed = EventFeed::default();
        feed.merge(
            EventList {
                events: vec![event("a")],
                last_id: 7,
            },
            100,
        );
        assert_eq!(feed.next_request(&Settings::default()).last_id, Some(7));
    }

    #[test]
    pub fn keeps_newest_first() {
        let mut feed = EventFeed::default();
        feed.merge(
            EventList {
                events: vec![event("a"), event("b")],
                last_id: 2,
            },
            100,
        );
        feed.merge(
            EventList {
                events: vec![event("c")],
                last_id: 3,
            },
            100,
        );
        assert_eq!(messages(&feed), vec!["c", "b", "a"]);
    }

    #[test]
    pub fn caps_to_limit() {
        let mut feed = EventFeed::default();
        feed.merge(
            EventList {
                events: vec![event("a"), event("b"), event("c")],
                last_id: 3,
            },
            2,
        );
        assert_eq!(messages(&feed), vec!["c", "b"]);
    }

    fn page(messages: &[&str], last_id: i64) -> EventList {
        EventList {
            events: messages.iter().map(|m| event(m)).collect(),
            last_id,
        }
    }

    #[test]
    pub fn full_pages_catch_up_to_the_newest_events() {
        let settings = Settings::new(1.0, 2).unwrap();
        let mut feed = EventFeed::default();
        let mut requests = vec![];

        // the server holds five events and pages them oldest first
        let mut pages = vec![page(&["a", "b"], 2), page(&["c", "d"], 4), page(&["e"], 5)].into_iter();
        loop {
            requests.push(feed.next_request(&settings));
            let Some(list) = pages.next() else {
                break;
            };
            feed.merge(list, settings.limit());
            if !feed.is_catching_up() {
                break;
            }
        }

        assert_eq!(messages(&feed), vec!["e", "d"]);
        let waits = requests.iter().map(|r| r.wait).collect::<Vec<_>>();
        assert_eq!(waits, vec![Some(constants::LONG_POLL_WAIT_SECONDS), None, None]);
        assert_eq!(
            feed.next_request(&settings).wait,
            Some(constants::LONG_POLL_WAIT_SECONDS)
        );
        assert_eq!(feed.next_request(&settings).last_id, Some(5));
    }

    #[test]
    pub fn short_page_is_caught_up() {
        let mut feed = EventFeed::default();
        feed.merge(page(&["a"], 1), 2);
        assert!(!feed.is_catching_up());

        feed.merge(page(&["b", "c"], 3), 2);
        assert!(feed.is_catching_up());
        assert_eq!(feed.next_request(&Settings::default()).wait, None);
    }

    #[test]
    pub fn empty_result_keeps_position() {
        let mut feed = EventFeed::default();
        feed.merge(
            EventList {
                events: vec![event("a")],
                last_id: 4,
            },
            100,
        );
        feed.merge(
            EventList {
                events: vec![],
                last_id: 4,
            },
            100,
        );
        assert_eq!(feed.next_request(&Settings::default()).last_id, Some(4));
        assert!(!feed.is_empty());
    }
}
