use ratatui::style::Color;

#[derive(Clone)]
pub struct Theme {
    pub name: &'static str,
    pub fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub error: Color,
    pub user_color: Color,
    pub assistant_color: Color,
    pub system_color: Color,
    pub border: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark",
            fg: Color::Rgb(220, 220, 220),
            accent: Color::Rgb(122, 162, 247),
            muted: Color::Rgb(100, 100, 100),
            error: Color::Rgb(247, 118, 142),
            user_color: Color::Cyan,
            assistant_color: Color::Green,
            system_color: Color::Yellow,
            border: Color::Rgb(60, 60, 60),
        }
    }

    pub fn rose() -> Self {
        Self {
            name: "rose",
            fg: Color::Rgb(224, 222, 244),
            accent: Color::Rgb(235, 111, 146),
            muted: Color::Rgb(110, 106, 134),
            error: Color::Rgb(235, 188, 186),
            user_color: Color::Rgb(156, 207, 216),
            assistant_color: Color::Rgb(246, 193, 119),
            system_color: Color::Rgb(196, 167, 231),
            border: Color::Rgb(64, 61, 82),
        }
    }

    pub fn dracula() -> Self {
        Self {
            name: "dracula",
            fg: Color::Rgb(248, 248, 242),
            accent: Color::Rgb(189, 147, 249),
            muted: Color::Rgb(98, 114, 164),
            error: Color::Rgb(255, 85, 85),
            user_color: Color::Rgb(139, 233, 253),
            assistant_color: Color::Rgb(80, 250, 123),
            system_color: Color::Rgb(241, 250, 140),
            border: Color::Rgb(68, 71, 90),
        }
    }

    /// Look up a theme by name, falling back to `rose`.
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dark" => Self::dark(),
            "dracula" => Self::dracula(),
            _ => Self::rose(),
        }
    }

    pub fn all_names() -> Vec<&'static str> {
        vec!["dark", "rose", "dracula"]
    }

    pub fn exists(name: &str) -> bool {
        Self::all_names().contains(&name.to_lowercase().as_str())
    }
}
