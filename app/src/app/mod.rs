use crate::events::Events;
use crate::page::Section;
use crate::settings::SettingsPage;
use crate::store::{AppState, Store};
use crate::theme::{Theme, ThemeHandle};
use crate::timeago::Locale;
use patternfly_yew::prelude::*;
use yew::prelude::*;
use yew_nested_router::components::Redirect;
use yew_nested_router::prelude::{Switch as RouterSwitch, *};
use yew_nested_router::Target;

#[derive(Debug, Default, Clone, PartialEq, Eq, Target)]
pub enum AppRoute {
    #[default]
    #[target(index)]
    Index,
    App,
    Settings,
}

/// What navigating to a path ends up showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirect(AppRoute),
    Render(AppRoute),
    NotFound,
}

impl AppRoute {
    pub fn resolve(path: &str) -> Resolution {
        let segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>();
        match AppRoute::parse_path(&segments) {
            Some(AppRoute::Index) => Resolution::Redirect(AppRoute::App),
            Some(target) => Resolution::Render(target),
            None => Resolution::NotFound,
        }
    }
}

#[function_component(Application)]
pub fn app() -> Html {
    let store = use_reducer(AppState::with_persisted_settings);
    // the application starts out dark
    let theme = use_state_eq(Theme::dark);

    use_effect_with(*theme, |theme| {
        theme.apply();
        || ()
    });

    html! {
        <ContextProvider<Store> context={store}>
            <ContextProvider<ThemeHandle> context={theme}>
                <ContextProvider<Locale> context={Locale::En}>
                    <ToastViewer>
                        <Router<AppRoute>>
                            <RouterSwitch<AppRoute>
                                render={switch_app_route}
                                default={html!(<Shell><NotFound/></Shell>)}
                            />
                        </Router<AppRoute>>
                    </ToastViewer>
                </ContextProvider<Locale>>
            </ContextProvider<ThemeHandle>>
        </ContextProvider<Store>>
    }
}

fn switch_app_route(target: AppRoute) -> Html {
    match target {
        AppRoute::Index => html! {<Redirect<AppRoute> to={AppRoute::App}/>},
        AppRoute::App => html! {<Shell><Events/></Shell>},
        AppRoute::Settings => html! {<Shell><SettingsPage/></Shell>},
    }
}

#[function_component(NotFound)]
fn not_found() -> Html {
    html!(
        <Section title="Not found">
            <p>
                {"There is nothing here. "}
                <a href="/app">{"Back to the events"}</a>
            </p>
        </Section>
    )
}

#[derive(Clone, Debug, PartialEq, Properties)]
pub struct ShellProps {
    pub children: Html,
}

/// Masthead and navigation around every route.
#[function_component(Shell)]
fn shell(props: &ShellProps) -> Html {
    let brand = html!(
        <MastheadBrand>
            <Title size={Size::XLarge}>{"Phatik"}</Title>
        </MastheadBrand>
    );
    let sidebar = html_nested!(
        <PageSidebar>
            <Nav>
                <NavList>
                    <NavRouterItem<AppRoute> to={AppRoute::App}>{"Events"}</NavRouterItem<AppRoute>>
                    <NavRouterItem<AppRoute> to={AppRoute::Settings}>{"Settings"}</NavRouterItem<AppRoute>>
                </NavList>
            </Nav>
        </PageSidebar>
    );

    html!(
        <Page {brand} {sidebar}>
            { props.children.clone() }
        </Page>
    )
}
