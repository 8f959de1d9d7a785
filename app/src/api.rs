use phatik_server_shared::{deserialize, EventList, ListOptions};
use thiserror::Error;
use url::form_urlencoded;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

const STATUS_PATH: &str = "/api/status";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum FetchError {
    #[error("cannot build request: {0}")]
    Request(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("cannot decode response: {0}")]
    Decode(String),
}

fn describe(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

pub(crate) fn status_url(options: &ListOptions) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(last_id) = options.last_id {
        query.append_pair("last_id", &last_id.to_string());
    }
    if let Some(limit) = options.limit {
        query.append_pair("limit", &limit.to_string());
    }
    if let Some(wait) = options.wait {
        query.append_pair("wait", &wait.to_string());
    }
    let query = query.finish();

    if query.is_empty() {
        STATUS_PATH.to_owned()
    } else {
        format!("{STATUS_PATH}?{query}")
    }
}

pub(crate) async fn fetch_events(options: &ListOptions) -> Result<EventList, FetchError> {
    let url = status_url(options);
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(&url, &opts)
        .map_err(|e| FetchError::Request(describe(e)))?;

    let window = gloo::utils::window();
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| FetchError::Transport(describe(e)))?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|e| FetchError::Transport(describe(e)))?;
    if !resp.ok() {
        return Err(FetchError::Status(resp.status()));
    }

    let text = resp.text().map_err(|e| FetchError::Decode(describe(e)))?;
    let text = JsFuture::from(text)
        .await
        .map_err(|e| FetchError::Decode(describe(e)))?
        .as_string()
        .ok_or_else(|| FetchError::Decode("body is not text".to_owned()))?;

    deserialize::<EventList>(&text).map_err(|e| FetchError::Decode(e.to_string()))
}
