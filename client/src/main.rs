use anyhow::{bail, Context};
use chrono::{TimeZone, Utc};
use clap::Parser;
use options::{Args, Command, Format};
use phatik_server_shared::{serialize, Event, EventList, ListOptions};
use reqwest::{Client, StatusCode, Url};

mod options;

pub(crate) fn status_url(endpoint: &str) -> anyhow::Result<Url> {
    let base = Url::parse(endpoint).with_context(|| format!("invalid endpoint {endpoint}"))?;
    base.join("/api/status")
        .context("when building status url")
}

async fn post(client: &Client, endpoint: &str, event: &Event) -> anyhow::Result<()> {
    let response = client
        .post(status_url(endpoint)?)
        .json(event)
        .send()
        .await
        .context("when posting status")?;

    if response.status() != StatusCode::CREATED {
        bail!("server answered {}", response.status());
    }
    Ok(())
}

async fn fetch(client: &Client, endpoint: &str, options: &ListOptions) -> anyhow::Result<EventList> {
    let response = client
        .get(status_url(endpoint)?)
        .query(options)
        .send()
        .await
        .context("when requesting statuses")?
        .error_for_status()?;

    response
        .json::<EventList>()
        .await
        .context("when decoding statuses")
}

pub(crate) fn render(list: &EventList, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Json => Ok(serialize(list)?),
        Format::Raw => {
            let mut out = String::new();
            for event in &list.events {
                let time = Utc
                    .timestamp_opt(event.epoch_seconds, 0)
                    .single()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| event.epoch_seconds.to_string());
                out.push_str(&format!("{time} [{}] {}", event.app, event.message));
                if !event.tags.is_empty() {
                    out.push_str(&format!(" #{}", event.tags.join(" #")));
                }
                out.push('\n');
            }
            out.push_str(&format!("last id: {}", list.last_id));
            Ok(out)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let client = Client::new();

    match args.command {
        Command::Post { message, app, tags } => {
            let event = Event {
                message,
                tags,
                app,
                epoch_seconds: Utc::now().timestamp(),
            };
            post(&client, &args.endpoint, &event).await?;
            log::info!("posted status for {}", event.app);
        }
        Command::List {
            min_id,
            count,
            format,
        } => {
            let options = ListOptions {
                last_id: min_id,
                limit: count,
                wait: None,
            };
            let list = fetch(&client, &args.endpoint, &options).await?;
            println!("{}", render(&list, format)?);
        }
    }
    Ok(())
}
