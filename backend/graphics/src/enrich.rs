//! Accessibility annotation of a rendered graphic.

use texspeak_core::{Description, EnrichmentError};

use crate::graphic::{Element, Graphic, Node};

pub const DEFAULT_TITLE_PREFIX: &str = "Mathematical equation: ";

/// Attaches a description to the first `svg` element of a graphic.
///
/// The result is rooted at that `svg`; any wrapper around it is dropped.
/// Applying it twice adds a second `title`/`desc` pair.
#[derive(Debug, Clone)]
pub struct AccessibilityEnricher {
    title_prefix: String,
}

impl Default for AccessibilityEnricher {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE_PREFIX)
    }
}

impl AccessibilityEnricher {
    pub fn new(title_prefix: impl Into<String>) -> Self {
        Self {
            title_prefix: title_prefix.into(),
        }
    }

    pub fn enrich(
        &self,
        graphic: Graphic,
        description: &Description,
    ) -> Result<Graphic, EnrichmentError> {
        if description.is_empty() {
            return Err(EnrichmentError::EmptyDescription);
        }
        let mut svg = first_svg(graphic.into_root()).ok_or(EnrichmentError::MissingRoot)?;

        svg.set_attribute("aria-label", description.as_str());
        svg.set_attribute("role", "img");

        // Resulting order is [desc, title, ...].
        let title = Element::new("title").text(format!("{}{}", self.title_prefix, description));
        svg.children.insert(0, title.into());
        let desc = Element::new("desc").text(description.as_str());
        svg.children.insert(0, desc.into());

        Ok(Graphic::new(svg))
    }
}

/// [`AccessibilityEnricher::enrich`] with the default title prefix.
pub fn enrich(graphic: Graphic, description: &Description) -> Result<Graphic, EnrichmentError> {
    AccessibilityEnricher::default().enrich(graphic, description)
}

fn first_svg(element: Element) -> Option<Element> {
    if element.name == "svg" {
        return Some(element);
    }
    element.children.into_iter().find_map(|child| match child {
        Node::Element(e) => first_svg(e),
        Node::Text(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrapped() -> Graphic {
        Graphic::parse(
            r#"<mjx-container><svg xmlns="http://www.w3.org/2000/svg" role="presentation"><g/></svg></mjx-container>"#,
        )
        .unwrap()
    }

    #[test]
    fn desc_then_title_then_content() {
        let description = Description::new("x squared");
        let graphic = enrich(wrapped(), &description).unwrap();
        let svg = graphic.root();
        assert_eq!(svg.name, "svg");

        let names: Vec<&str> = svg.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["desc", "title", "g"]);
        let children: Vec<&Element> = svg.elements().collect();
        assert_eq!(children[0].text_content(), "x squared");
        assert_eq!(children[1].text_content(), "Mathematical equation: x squared");
    }

    #[test]
    fn label_and_role_replace_existing_values() {
        let graphic = enrich(wrapped(), &Description::new("y")).unwrap();
        let svg = graphic.root();
        assert_eq!(svg.attribute("aria-label"), Some("y"));
        assert_eq!(svg.attribute("role"), Some("img"));
        assert_eq!(
            svg.attributes.iter().filter(|(k, _)| k == "role").count(),
            1
        );
    }

    #[test]
    fn finds_nested_svg_depth_first() {
        let graphic = Graphic::parse(
            r#"<div><span><svg id="first"/></span><svg id="second"/></div>"#,
        )
        .unwrap();
        let enriched = enrich(graphic, &Description::new("z")).unwrap();
        assert_eq!(enriched.root().attribute("id"), Some("first"));
    }

    #[test]
    fn missing_svg_and_empty_description() {
        let no_svg = Graphic::parse("<div><g/></div>").unwrap();
        assert!(matches!(
            enrich(no_svg, &Description::new("x")),
            Err(EnrichmentError::MissingRoot)
        ));
        assert!(matches!(
            enrich(wrapped(), &Description::new("  ")),
            Err(EnrichmentError::EmptyDescription)
        ));
    }

    #[test]
    fn description_text_is_escaped() {
        let graphic = enrich(wrapped(), &Description::new("a < b")).unwrap();
        let svg = graphic.to_svg();
        assert!(svg.contains(r#"aria-label="a &lt; b""#));
        assert!(svg.contains("<desc>a &lt; b</desc>"));
    }

    #[test]
    fn custom_title_prefix() {
        let enricher = AccessibilityEnricher::new("Formula: ");
        let graphic = enricher.enrich(wrapped(), &Description::new("x")).unwrap();
        assert_eq!(
            graphic.root().find("title").map(Element::text_content),
            Some("Formula: x".to_string())
        );
    }
}
