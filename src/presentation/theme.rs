use crossterm::style::{Color, Stylize};

/// Design tokens for the CLI output.
///
/// Only 5 semantic colors; every icon comes from this module.
pub mod colors {
    use super::Color;

    pub const SUCCESS: Color = Color::Green;
    pub const ERROR: Color = Color::Red;
    pub const WARNING: Color = Color::Yellow;
    pub const INFO: Color = Color::Cyan;
    pub const DIM: Color = Color::DarkGrey;
}

pub mod icons {
    pub const SUCCESS: &str = "✓";
    pub const ERROR: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const PROGRESS: &str = "●";
    pub const ARROW: &str = "↳";
    pub const CHANGE: &str = "Δ";
    pub const TRASH: &str = "🗑";
}

pub mod icons_ascii {
    pub const SUCCESS: &str = "[OK]";
    pub const ERROR: &str = "[FAIL]";
    pub const WARNING: &str = "[WARN]";
    pub const PROGRESS: &str = "[..]";
    pub const ARROW: &str = "->";
    pub const CHANGE: &str = "[~]";
    pub const TRASH: &str = "[DEL]";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Success,
    Error,
    Warning,
    Progress,
    Arrow,
    Change,
    Trash,
}

impl Icon {
    pub fn render(&self, supports_unicode: bool) -> &'static str {
        match (supports_unicode, self) {
            (true, Icon::Success) => icons::SUCCESS,
            (true, Icon::Error) => icons::ERROR,
            (true, Icon::Warning) => icons::WARNING,
            (true, Icon::Progress) => icons::PROGRESS,
            (true, Icon::Arrow) => icons::ARROW,
            (true, Icon::Change) => icons::CHANGE,
            (true, Icon::Trash) => icons::TRASH,
            (false, Icon::Success) => icons_ascii::SUCCESS,
            (false, Icon::Error) => icons_ascii::ERROR,
            (false, Icon::Warning) => icons_ascii::WARNING,
            (false, Icon::Progress) => icons_ascii::PROGRESS,
            (false, Icon::Arrow) => icons_ascii::ARROW,
            (false, Icon::Change) => icons_ascii::CHANGE,
            (false, Icon::Trash) => icons_ascii::TRASH,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Icon::Success => colors::SUCCESS,
            Icon::Error => colors::ERROR,
            Icon::Warning | Icon::Progress | Icon::Trash => colors::WARNING,
            Icon::Arrow => colors::DIM,
            Icon::Change => colors::INFO,
        }
    }
}

/// How text is decorated for one output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: bool,
    pub unicode: bool,
}

impl Style {
    pub fn plain() -> Self {
        Self {
            color: false,
            unicode: false,
        }
    }

    pub fn icon(&self, icon: Icon) -> String {
        self.paint(icon.render(self.unicode), icon.color())
    }

    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            format!("{}", text.with(color))
        } else {
            text.to_string()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(text, colors::DIM)
    }

    /// `icon text`, one line.
    pub fn line(&self, icon: Icon, text: &str) -> String {
        format!("{} {}", self.icon(icon), text)
    }
}
