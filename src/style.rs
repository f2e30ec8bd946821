use crate::foundation::error::{AssemblyError, AssemblyResult};

/// Template styles known to the engine.
///
/// Unknown template names fail at parse time instead of mapping to a default look.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Mysterious,
    Scientific,
    Folklore,
    Horror,
    Historical,
    Documentary,
    Energetic,
}

/// How a scene hands over to the next one.
///
/// Scenes are always joined with a hard concat. Only `Slide` changes the compiled graph (it
/// becomes a pan); fades come from [`StyleEffects::fade`] and the scene position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Fade,
    Dissolve,
    Slide,
    Cut,
}

/// Per-style effect selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StyleEffects {
    pub transition: TransitionKind,
    pub zoom: bool,
    pub fade: bool,
}

impl Style {
    pub const ALL: [Style; 7] = [
        Style::Mysterious,
        Style::Scientific,
        Style::Folklore,
        Style::Horror,
        Style::Historical,
        Style::Documentary,
        Style::Energetic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Style::Mysterious => "mysterious",
            Style::Scientific => "scientific",
            Style::Folklore => "folklore",
            Style::Horror => "horror",
            Style::Historical => "historical",
            Style::Documentary => "documentary",
            Style::Energetic => "energetic",
        }
    }

    /// Slow and dark styles fade and zoom; fast styles only slide.
    pub fn effects(self) -> StyleEffects {
        let (transition, zoom, fade) = match self {
            Style::Mysterious | Style::Horror => (TransitionKind::Fade, true, true),
            Style::Folklore | Style::Historical => (TransitionKind::Dissolve, true, true),
            Style::Documentary => (TransitionKind::Dissolve, true, false),
            Style::Scientific => (TransitionKind::Cut, false, true),
            Style::Energetic => (TransitionKind::Slide, false, false),
        };
        StyleEffects {
            transition,
            zoom,
            fade,
        }
    }
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Style {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Style::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AssemblyError::validation(format!("unknown style template '{s}'")))
    }
}

/// Style metadata handed over by template selection.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StyleMetadata {
    pub template: Style,
    /// Free-form hint the image stage used; carried for logging only.
    #[serde(default)]
    pub image_style_hint: Option<String>,
}

impl StyleMetadata {
    pub fn new(template: Style) -> Self {
        Self {
            template,
            image_style_hint: None,
        }
    }

    /// Build from the raw template name used by upstream collaborators.
    pub fn parse(template_name: &str, image_style_hint: Option<String>) -> AssemblyResult<Self> {
        Ok(Self {
            template: template_name.parse()?,
            image_style_hint,
        })
    }
}
