#![recursion_limit = "1024"]

mod api;
mod app;
mod events;
mod page;
mod settings;
mod store;
mod theme;
mod timeago;

use wasm_bindgen::prelude::*;

pub fn main() -> Result<(), JsValue> {
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));

    let root = gloo::utils::document()
        .get_element_by_id("app")
        .ok_or_else(|| JsValue::from_str("missing #app element"))?;
    yew::Renderer::<app::Application>::with_root(root).render();
    Ok(())
}
