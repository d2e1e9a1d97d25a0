use std::io;

use owo_colors::{OwoColorize, Style};

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum ColorSetting {
    #[default]
    Automatic,
    Always,
    Never,
}

pub trait SupportsColor {
    fn supports_color(&self) -> bool;
}

impl<T: io::IsTerminal> SupportsColor for T {
    fn supports_color(&self) -> bool {
        self.is_terminal()
    }
}

/// Styles used by the reporter, all plain unless [`colorize`](Self::colorize)
/// was called.
#[derive(Debug, Clone, Default)]
pub struct Styles {
    pub is_colorized: bool,
    pub fail_tag: Style,
    pub banner: Style,
    pub banner_label: Style,
    pub error: Style,
    pub error_title: Style,
    pub dim: Style,
    pub counter: Style,
    pub pass: Style,
    pub fail: Style,
    pub skip: Style,
    pub projects: [Style; 5],
}

impl Styles {
    pub fn colorize(&mut self) {
        self.is_colorized = true;
        self.fail_tag = Style::new().red().bold().reversed();
        self.banner = Style::new().red();
        self.banner_label = Style::new().red().bold().reversed();
        self.error = Style::new().red();
        self.error_title = Style::new().red().bold();
        self.dim = Style::new().dimmed();
        self.counter = Style::new().red().dimmed();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
        self.projects = [
            Style::new().black().reversed(),
            Style::new().yellow().reversed(),
            Style::new().cyan().reversed(),
            Style::new().green().reversed(),
            Style::new().magenta().reversed(),
        ];
    }
}

/// Tag for a project name, followed by a space. Empty without a project.
///
/// Colored tags pick one of the project styles from the name, so a project
/// keeps its color across runs.
pub fn format_project_name(name: &str, styles: &Styles) -> String {
    if name.is_empty() {
        return String::new();
    }
    if !styles.is_colorized {
        return format!("|{name}| ");
    }

    let index = name
        .encode_utf16()
        .enumerate()
        .fold(0usize, |acc, (idx, unit)| acc + usize::from(unit) + idx);
    let style = styles.projects[index % styles.projects.len()];
    format!("{} ", format!(" {name} ").style(style))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn colorized() -> Styles {
        let mut styles = Styles::default();
        styles.colorize();
        styles
    }

    #[test]
    fn plain_project_tag() {
        assert_eq!(format_project_name("web", &Styles::default()), "|web| ");
        assert_eq!(format_project_name("", &Styles::default()), "");
        assert_eq!(format_project_name("", &colorized()), "");
    }

    #[test]
    fn project_color_is_stable() {
        let styles = colorized();

        // "a" = 97, 97 % 5 = 2
        let expected = format!("{} ", " a ".style(Style::new().cyan().reversed()));
        assert_eq!(format_project_name("a", &styles), expected);

        // "ab" = 97 + 0 + 98 + 1 = 196, 196 % 5 = 1
        let expected = format!("{} ", " ab ".style(Style::new().yellow().reversed()));
        assert_eq!(format_project_name("ab", &styles), expected);

        assert_eq!(
            format_project_name("node", &styles),
            format_project_name("node", &styles)
        );
    }

    #[test]
    fn plain_styles_emit_no_escapes() {
        let styles = Styles::default();
        assert_eq!(format!("{}", " FAIL ".style(styles.fail_tag)), " FAIL ");
    }
}
