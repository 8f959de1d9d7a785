use std::time::Duration;

use crate::page::Section;
use crate::store::{Settings, Store, StoreAction};
use crate::theme::{Theme, ThemeHandle};
use patternfly_yew::prelude::*;
use yew::prelude::*;

#[function_component(SettingsPage)]
pub fn settings_page() -> Html {
    let store = use_context::<Store>().expect("Application provides the store");
    let theme = use_context::<ThemeHandle>().expect("Application provides the theme");
    let toaster = use_toaster();

    let update_frequency = use_state(|| store.settings.update_frequency.to_string());
    let limit = use_state(|| store.settings.limit.to_string());

    let on_update_frequency = {
        let update_frequency = update_frequency.clone();
        Callback::from(move |value: String| update_frequency.set(value))
    };
    let on_limit = {
        let limit = limit.clone();
        Callback::from(move |value: String| limit.set(value))
    };

    let on_save = {
        let store = store.clone();
        let update_frequency = update_frequency.clone();
        let limit = limit.clone();
        Callback::from(move |_: MouseEvent| {
            let (title, r#type) = match Settings::parse(&update_frequency, &limit) {
                Ok(settings) => {
                    store.dispatch(StoreAction::UpdateSettings(settings));
                    settings.persist();
                    ("Settings saved".to_owned(), AlertType::Success)
                }
                Err(e) => {
                    log::info!("rejected settings: {e}");
                    (e.to_string(), AlertType::Danger)
                }
            };
            if let Some(toaster) = &toaster {
                toaster.toast(Toast {
                    title,
                    r#type,
                    timeout: Some(Duration::from_secs(4)),
                    ..Default::default()
                });
            }
        })
    };

    let on_theme = {
        let theme = theme.clone();
        Callback::from(move |dark: bool| theme.set(Theme { dark }))
    };

    html!(
        <Section title="Settings">
            <Form>
                <FormGroup label="Update frequency (seconds)">
                    <TextInput
                        r#type={TextInputType::Number}
                        value={(*update_frequency).clone()}
                        onchange={on_update_frequency}
                    />
                </FormGroup>
                <FormGroup label="Number of events">
                    <TextInput
                        r#type={TextInputType::Number}
                        value={(*limit).clone()}
                        onchange={on_limit}
                    />
                </FormGroup>
                <FormGroup label="Appearance">
                    <Switch label="Dark theme" checked={theme.dark} onchange={on_theme} />
                </FormGroup>
                <ActionGroup>
                    <Button variant={ButtonVariant::Primary} label="Save" onclick={on_save} />
                </ActionGroup>
            </Form>
        </Section>
    )
}
