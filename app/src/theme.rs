use yew::prelude::*;

pub(crate) mod constants {
    /// PatternFly switches to its dark palette when the root element carries this class.
    pub(crate) const DARK_CLASS: &str = "pf-v5-theme-dark";
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Theme {
    pub(crate) dark: bool,
}

impl Theme {
    pub(crate) fn dark() -> Self {
        Self { dark: true }
    }

    pub(crate) fn apply(&self) {
        let Some(root) = gloo::utils::document().document_element() else {
            return;
        };
        let classes = root.class_list();
        let result = if self.dark {
            classes.add_1(constants::DARK_CLASS)
        } else {
            classes.remove_1(constants::DARK_CLASS)
        };
        if let Err(e) = result {
            log::warn!("could not switch theme: {e:?}");
        }
    }
}

pub(crate) type ThemeHandle = UseStateHandle<Theme>;
