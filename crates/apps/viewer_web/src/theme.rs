//! Light/dark theme switching. Appearance itself lives in the stylesheet;
//! this only flips the `dark` class on the root element.

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownThemeMode(pub String);

impl std::fmt::Display for UnknownThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown theme mode: {}", self.0)
    }
}

impl std::error::Error for UnknownThemeMode {}

impl std::str::FromStr for ThemeMode {
    type Err = UnknownThemeMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            _ => Err(UnknownThemeMode(s.to_string())),
        }
    }
}

pub trait ThemeController {
    fn apply(&mut self, mode: ThemeMode);
    fn current(&self) -> ThemeMode;
}

const DARK_CLASS: &str = "dark";
const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

#[derive(Debug, Default)]
pub struct DocumentTheme {
    mode: ThemeMode,
}

impl DocumentTheme {
    /// Starts from the system preference and applies it.
    pub fn detect() -> Self {
        let prefers_dark = web_sys::window()
            .and_then(|w| w.match_media(DARK_QUERY).ok().flatten())
            .is_some_and(|mq| mq.matches());
        let mut theme = Self::default();
        theme.apply(if prefers_dark {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        });
        theme
    }
}

impl ThemeController for DocumentTheme {
    fn apply(&mut self, mode: ThemeMode) {
        self.mode = mode;
        let Some(root) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.document_element())
        else {
            tracing::warn!("no document element; theme class not applied");
            return;
        };
        if let Err(err) = root
            .class_list()
            .toggle_with_force(DARK_CLASS, mode == ThemeMode::Dark)
        {
            tracing::warn!("theme class toggle failed: {err:?}");
        }
    }

    fn current(&self) -> ThemeMode {
        self.mode
    }
}
