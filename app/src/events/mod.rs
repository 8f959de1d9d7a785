use gloo::timers::future::TimeoutFuture;
use patternfly_yew::prelude::*;
use phatik_server_shared::Event;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::{
    api::{fetch_events, FetchError},
    page::Section,
    store::{LongPollOwner, Store},
    timeago::TimeAgo,
};

use self::feed::EventFeed;

mod feed;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Column {
    When,
    App,
    Message,
    Tags,
}

#[derive(Clone, Debug, PartialEq)]
struct EventRow(Event);

impl TableEntryRenderer<Column> for EventRow {
    fn render_cell(&self, context: CellContext<'_, Column>) -> Cell {
        let event = &self.0;
        match context.column {
            Column::When => html!(<TimeAgo epoch_seconds={event.epoch_seconds} />),
            Column::App => html!({ event.app.clone() }),
            Column::Message => html!({ event.message.clone() }),
            Column::Tags => html!(
                { for event.tags.iter().map(|tag| html!(<><Label label={tag.clone()} />{" "}</>)) }
            ),
        }
        .into()
    }
}

#[function_component(Events)]
pub fn events() -> Html {
    let store = use_context::<Store>().expect("Application provides the store");
    let feed = use_state_eq(EventFeed::default);
    let error = use_state_eq::<Option<FetchError>, _>(|| None);

    {
        let owner = LongPollOwner::for_store(&store);
        let feed = feed.clone();
        let error = error.clone();

        // restarted whenever the settings change, stopped on unmount
        use_effect_with(store.settings, move |settings| {
            let settings = *settings;
            let mut current = (*feed).clone();
            let poll = owner.clone();

            spawn_local(async move {
                while poll.is_active() {
                    poll.begin();
                    let result = fetch_events(&current.next_request(&settings)).await;
                    if !poll.is_active() {
                        break;
                    }
                    poll.end();

                    match result {
                        Ok(list) => {
                            current.merge(list, settings.limit());
                            feed.set(current.clone());
                            error.set(None);
                            if current.is_catching_up() {
                                continue;
                            }
                        }
                        Err(e) => {
                            log::warn!("polling events failed: {e}");
                            error.set(Some(e));
                        }
                    }
                    TimeoutFuture::new(settings.update_interval_millis()).await;
                }
            });

            move || owner.cancel()
        });
    }

    let rows = use_memo((*feed).clone(), |feed| {
        feed.events().cloned().map(EventRow).collect::<Vec<_>>()
    });
    let (entries, _) = use_table_data(MemoizedTableModel::new(rows));

    let status = store
        .in_wait
        .then(|| AttrValue::from("Waiting for new events…"));

    let warning = (*error).as_ref().map(|e| {
        html!(
            <Alert inline=true r#type={AlertType::Warning} title="Could not load events">
                { e.to_string() }
            </Alert>
        )
    });

    let header = html_nested!(
        <TableHeader<Column>>
            <TableColumn<Column> label="When" index={Column::When} />
            <TableColumn<Column> label="App" index={Column::App} />
            <TableColumn<Column> label="Message" index={Column::Message} />
            <TableColumn<Column> label="Tags" index={Column::Tags} />
        </TableHeader<Column>>
    );

    let body = if feed.is_empty() {
        html!(<p>{"No events yet."}</p>)
    } else {
        html!(
            <Table<Column, UseTableData<Column, MemoizedTableModel<EventRow>>>
                mode={TableMode::Compact}
                {header}
                {entries}
            />
        )
    };

    html!(
        <Section title="Events" {status}>
            { for warning }
            { body }
        </Section>
    )
}
