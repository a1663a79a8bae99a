use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for each kind of terminal line
#[derive(Debug, Clone)]
pub struct Theme {
    /// Store banners, in the complaint form's red
    pub banner: Style,
    pub section: Style,
    pub label: Style,
    pub hint: Style,
    pub success: Style,
    pub warn: Style,
    pub error: Style,
}

impl Theme {
    /// Colors only when stdout is a terminal and color is not disabled
    pub fn detect() -> Self {
        Self::new(console::Term::stdout().is_term() && console::colors_enabled())
    }

    pub fn new(colored: bool) -> Self {
        if !colored {
            let plain = Style::new();
            return Self {
                banner: plain,
                section: plain,
                label: plain,
                hint: plain,
                success: plain,
                warn: plain,
                error: plain,
            };
        }
        Self {
            banner: Style::new().truecolor(0xB2, 0x22, 0x34).bold(),
            section: Style::new().cyan().bold(),
            label: Style::new().dimmed(),
            hint: Style::new().magenta(),
            success: Style::new().green().bold(),
            warn: Style::new().yellow().bold(),
            error: Style::new().red().bold(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncolored_theme_is_plain() {
        let plain = Theme::new(false);
        assert!(plain.banner.is_plain());
        assert!(plain.error.is_plain());

        let colored = Theme::new(true);
        assert!(!colored.banner.is_plain());
        assert_ne!(colored.success, colored.error);
    }
}
