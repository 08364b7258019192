//! Supported languages and the auto-target policy

/// Code used for "detect the language for me"
pub const AUTO: &str = "auto";

/// Supported languages: code -> display name
pub const LANGS: &[(&str, &str)] = &[
    (AUTO, "Auto"),
    ("en", "English"),
    ("ru", "Русский"),
    ("de", "Deutsch"),
    ("fr", "Français"),
    ("es", "Español"),
    ("it", "Italiano"),
    ("tr", "Türkçe"),
    ("ar", "العربية"),
    ("zh", "中文"),
];

/// Render a language code for the user, e.g. `English (en)` or `Auto`
pub fn fmt_lang(code: &str) -> String {
    if code == AUTO {
        return "Auto".to_string();
    }
    let name = LANGS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code);
    format!("{} ({})", name, code)
}

pub fn is_supported(code: &str) -> bool {
    LANGS.iter().any(|(c, _)| *c == code)
}

/// Any Cyrillic character makes the text Russian, everything else is English.
pub fn detect_language_heuristic(text: &str) -> &'static str {
    if text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c)) {
        "ru"
    } else {
        "en"
    }
}

/// Accept an explicit source language, or guess one when it is `auto`
pub fn detect_or_accept(text: &str, source: &str) -> String {
    if source == AUTO {
        detect_language_heuristic(text).to_string()
    } else {
        source.to_string()
    }
}

/// Outcome of the auto-switch rule for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetChoice {
    pub target: &'static str,
    /// The configured target differs from the effective one
    pub switched: bool,
}

/// Russian goes to English, everything else goes to Russian.
pub fn pick_auto_target(detected: &str, configured: &str) -> TargetChoice {
    let target = if detected == "ru" { "en" } else { "ru" };
    TargetChoice {
        target,
        switched: configured != target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_lang() {
        assert_eq!(fmt_lang("auto"), "Auto");
        assert_eq!(fmt_lang("en"), "English (en)");
        assert_eq!(fmt_lang("xx"), "xx (xx)");
    }

    #[test]
    fn test_heuristic() {
        assert_eq!(detect_language_heuristic("Привет, мир"), "ru");
        assert_eq!(detect_language_heuristic("hello world"), "en");
        assert_eq!(detect_language_heuristic("Guten Tag"), "en");
        assert_eq!(detect_or_accept("hello", "de"), "de");
        assert_eq!(detect_or_accept("ёж", AUTO), "ru");
    }

    #[test]
    fn test_auto_switch_rule() {
        assert_eq!(
            pick_auto_target("ru", "en"),
            TargetChoice { target: "en", switched: false }
        );
        assert_eq!(
            pick_auto_target("ru", "de"),
            TargetChoice { target: "en", switched: true }
        );
        assert_eq!(
            pick_auto_target("en", "en"),
            TargetChoice { target: "ru", switched: true }
        );
        assert_eq!(
            pick_auto_target("auto", "ru"),
            TargetChoice { target: "ru", switched: false }
        );
    }

    #[test]
    fn test_supported() {
        assert!(is_supported("zh"));
        assert!(is_supported(AUTO));
        assert!(!is_supported("xx"));
    }
}
