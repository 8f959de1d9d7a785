use patternfly_yew::prelude::*;
use yew::prelude::*;

#[derive(Clone, Debug, Properties, PartialEq)]
pub struct SectionProps {
    pub title: AttrValue,
    /// Shown under the heading with a spinner, e.g. while a poll is out.
    #[prop_or_default]
    pub status: Option<AttrValue>,
    #[prop_or_default]
    pub children: Html,
}

/// Sticky heading followed by the page body in a single section.
#[function_component(Section)]
pub fn section(props: &SectionProps) -> Html {
    let status = props.status.as_ref().map(|status| {
        html!(
            <p>
                <Spinner size={SpinnerSize::Md} />
                { " " }{ status.clone() }
            </p>
        )
    });

    html!(
        <>
            <PageSection variant={PageSectionVariant::Light} sticky={[PageSectionSticky::Top]}>
                <Content>
                    <Title size={Size::XXLarge}>{ props.title.clone() }</Title>
                    { for status }
                </Content>
            </PageSection>
            <PageSection>{ props.children.clone() }</PageSection>
        </>
    )
}
