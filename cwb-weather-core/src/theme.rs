use crate::moment::Moment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub foreground: &'static str,
    pub box_shadow: &'static str,
    pub title: &'static str,
    pub temperature: &'static str,
    pub text: &'static str,
}

const LIGHT: Palette = Palette {
    background: "#ededed",
    foreground: "#f9f9f9",
    box_shadow: "0 2px 6px 0 #999999",
    title: "#212121",
    temperature: "#757575",
    text: "#828282",
};

const DARK: Palette = Palette {
    background: "#1F2022",
    foreground: "#121416",
    box_shadow: "0 1px 4px 0 rgba(12, 12, 13, 0.2), 0 0 0 1px rgba(0, 0, 0, 0.15)",
    title: "#f9f9fa",
    temperature: "#dddddd",
    text: "#cccccc",
};

impl Theme {
    /// Unknown moments get the light theme.
    pub fn for_moment(moment: Moment) -> Self {
        match moment {
            Moment::Night => Theme::Dark,
            Moment::Day | Moment::Unknown => Theme::Light,
        }
    }

    pub fn palette(&self) -> &'static Palette {
        match self {
            Theme::Light => &LIGHT,
            Theme::Dark => &DARK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn night_is_dark_everything_else_is_light() {
        assert_eq!(Theme::for_moment(Moment::Day), Theme::Light);
        assert_eq!(Theme::for_moment(Moment::Night), Theme::Dark);
        assert_eq!(Theme::for_moment(Moment::Unknown), Theme::Light);
    }

    #[test]
    fn palettes_differ() {
        assert_ne!(Theme::Light.palette().background, Theme::Dark.palette().background);
    }
}
