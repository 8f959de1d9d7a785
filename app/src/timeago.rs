use chrono::{DateTime, Utc};
use strum::{Display, EnumString};
use yew::prelude::*;
use yew_hooks::use_interval;

pub(crate) mod constants {
    pub(crate) const REFRESH_MILLIS: u32 = 10_000;
    pub(crate) const JUST_NOW_SECONDS: i64 = 10;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Locale {
    #[default]
    En,
}

const UNITS: [(i64, &str); 6] = [
    (365 * 86_400, "year"),
    (30 * 86_400, "month"),
    (86_400, "day"),
    (3_600, "hour"),
    (60, "minute"),
    (1, "second"),
];

/// Describes `then` relative to `now`, e.g. "3 minutes ago" or "in 2 days".
pub(crate) fn format_relative(now: DateTime<Utc>, then: DateTime<Utc>, locale: Locale) -> String {
    let delta = (now - then).num_seconds();
    let seconds = delta.abs();

    match locale {
        Locale::En => {
            if seconds < constants::JUST_NOW_SECONDS {
                return "just now".to_owned();
            }
            let (size, unit) = UNITS
                .iter()
                .find(|(size, _)| seconds >= *size)
                .copied()
                .unwrap_or((1, "second"));
            let count = seconds / size;
            let plural = if count == 1 { "" } else { "s" };
            if delta < 0 {
                format!("in {count} {unit}{plural}")
            } else {
                format!("{count} {unit}{plural} ago")
            }
        }
    }
}

#[derive(Clone, Debug, Properties, PartialEq)]
pub struct TimeAgoProps {
    pub epoch_seconds: i64,
}

#[function_component(TimeAgo)]
pub fn time_ago(props: &TimeAgoProps) -> Html {
    let locale = use_context::<Locale>().unwrap_or_default();
    let update = use_force_update();
    use_interval(move || update.force_update(), constants::REFRESH_MILLIS);

    match DateTime::from_timestamp(props.epoch_seconds, 0) {
        Some(then) => {
            let title = then.format("%Y-%m-%d %H:%M:%S UTC").to_string();
            html!(
                <time {title}>{ format_relative(Utc::now(), then, locale) }</time>
            )
        }
        None => html!(),
    }
}
