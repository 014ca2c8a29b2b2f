use texspeak_core::Description;
use texspeak_graphics::Graphic;

/// An enriched graphic together with the description it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessibleArtifact {
    graphic: Graphic,
    description: Description,
}

impl AccessibleArtifact {
    pub fn new(graphic: Graphic, description: Description) -> Self {
        Self {
            graphic,
            description,
        }
    }

    pub fn graphic(&self) -> &Graphic {
        &self.graphic
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    /// Serialized SVG text.
    pub fn svg(&self) -> String {
        self.graphic.to_svg()
    }

    pub fn into_parts(self) -> (Graphic, Description) {
        (self.graphic, self.description)
    }
}
