use crate::upload::MediaKind;
use regex::Regex;
use std::sync::LazyLock;
use validator::ValidateEmail as _;

#[allow(clippy::expect_used, reason = "Pattern is a compile-time constant")]
static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Regex must be valid"));

/// Validation rule of a single field. Applying a rule either yields the normalised value that is
/// handed on to the typed payload, or the message shown next to the field.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Free text, `min` and `max` count characters. With `trim` set, surrounding whitespace is
    /// removed before counting and in the normalised value.
    Text {
        min: usize,
        max: Option<usize>,
        trim: bool,
        message: Option<&'static str>,
    },
    Email,
    /// Coerced to a number the way a browser number input is, then required to be a whole
    /// number within `min..=max`.
    Integer { min: i32, max: i32 },
    /// `#RRGGBB`, case-insensitive
    HexColor,
}

impl Rule {
    #[must_use]
    #[inline]
    pub const fn required() -> Self {
        Self::Text {
            min: 1,
            max: None,
            trim: true,
            message: None,
        }
    }

    /// Check `raw` against the rule.
    /// # Errors
    /// Returns the user-facing message describing the first violated constraint.
    #[allow(clippy::missing_inline_in_public_items, reason = "Large match, called per field")]
    pub fn apply(&self, raw: &str) -> Result<String, String> {
        match *self {
            Self::Text {
                min,
                max,
                trim,
                message,
            } => {
                let value = if trim { raw.trim() } else { raw };
                let length = value.chars().count();
                if length < min {
                    return Err(message.map_or_else(
                        || format!("String must contain at least {min} character(s)"),
                        str::to_owned,
                    ));
                }
                match max {
                    Some(max) if length > max => {
                        Err(format!("String must contain at most {max} character(s)"))
                    }
                    _ => Ok(value.to_owned()),
                }
            }
            Self::Email => {
                if raw.validate_email() {
                    Ok(raw.to_owned())
                } else {
                    Err(String::from("Invalid email"))
                }
            }
            Self::Integer { min, max } => {
                let Some(number) = coerce_number(raw) else {
                    return Err(String::from("Expected number, received nan"));
                };
                if number.fract() != 0.0 {
                    return Err(String::from("Expected integer, received float"));
                }
                if number < f64::from(min) {
                    return Err(format!("Number must be greater than or equal to {min}"));
                }
                if number > f64::from(max) {
                    return Err(format!("Number must be less than or equal to {max}"));
                }
                Ok(format!("{number:.0}"))
            }
            Self::HexColor => {
                let value = raw.trim();
                if HEX_COLOR.is_match(value) {
                    Ok(value.to_owned())
                } else {
                    Err(String::from("Invalid hex color"))
                }
            }
        }
    }
}

/// Same coercion as `Number(value)`: surrounding whitespace is ignored and an empty input is zero.
/// Anything that is not a finite number yields `None`.
pub(crate) fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Everything an upload field needs besides the file itself.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSpec {
    pub kind: MediaKind,
    /// File picker filter, e.g. `image/*`
    pub accept: &'static str,
    pub placeholder: &'static str,
    /// Folder on the media host the asset is stored in
    pub folder: &'static str,
    pub theme: Theme,
}

impl UploadSpec {
    #[must_use]
    #[inline]
    pub const fn new(
        kind: MediaKind,
        accept: &'static str,
        placeholder: &'static str,
        folder: &'static str,
        theme: Theme,
    ) -> Self {
        Self {
            kind,
            accept,
            placeholder,
            folder,
            theme,
        }
    }
}

/// Input control used for a field
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Password,
    Number { min: i32, max: i32 },
    TextArea { rows: u8 },
    Upload(UploadSpec),
    Color,
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderHint {
    pub label: &'static str,
    pub placeholder: Option<&'static str>,
}

/// One entry of a form: what the field is called, how it is entered, how it is checked and how
/// it is presented.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub rule: Rule,
    pub hint: RenderHint,
}

impl FieldDescriptor {
    #[must_use]
    #[inline]
    pub const fn new(name: &'static str, kind: FieldKind, rule: Rule, label: &'static str) -> Self {
        Self {
            name,
            kind,
            rule,
            hint: RenderHint {
                label,
                placeholder: None,
            },
        }
    }

    #[must_use]
    #[inline]
    pub const fn with_placeholder(mut self, placeholder: &'static str) -> Self {
        self.hint.placeholder = Some(placeholder);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_rule_counts_characters_after_trimming() {
        let rule = Rule::Text {
            min: 3,
            max: Some(5),
            trim: true,
            message: None,
        };
        assert_eq!(rule.apply("  abc  "), Ok(String::from("abc")));
        assert_eq!(
            rule.apply(" ab "),
            Err(String::from("String must contain at least 3 character(s)"))
        );
        assert_eq!(
            rule.apply("abcdef"),
            Err(String::from("String must contain at most 5 character(s)"))
        );
        assert_eq!(rule.apply("ééé"), Ok(String::from("ééé")));
    }

    #[test]
    fn text_rule_uses_custom_message() {
        let rule = Rule::Text {
            min: 1,
            max: None,
            trim: false,
            message: Some("University Card is required"),
        };
        assert_eq!(rule.apply(""), Err(String::from("University Card is required")));
    }

    #[test]
    fn email_rule() {
        assert!(Rule::Email.apply("reader@campus.edu").is_ok());
        assert_eq!(Rule::Email.apply("reader@"), Err(String::from("Invalid email")));
        assert!(Rule::Email.apply("").is_err());
    }

    #[test]
    fn integer_rule_coerces_and_bounds() {
        let rule = Rule::Integer { min: 1, max: 5 };
        assert_eq!(rule.apply(" 4 "), Ok(String::from("4")));
        assert_eq!(rule.apply("5.0"), Ok(String::from("5")));
        assert_eq!(
            rule.apply("4.5"),
            Err(String::from("Expected integer, received float"))
        );
        assert_eq!(
            rule.apply("six"),
            Err(String::from("Expected number, received nan"))
        );
        assert_eq!(
            rule.apply(""),
            Err(String::from("Number must be greater than or equal to 1"))
        );
        assert_eq!(
            rule.apply("6"),
            Err(String::from("Number must be less than or equal to 5"))
        );
    }

    #[test]
    fn hex_color_rule() {
        assert_eq!(Rule::HexColor.apply("#1a2B3c"), Ok(String::from("#1a2B3c")));
        assert!(Rule::HexColor.apply("#12345").is_err());
        assert!(Rule::HexColor.apply("123456").is_err());
        assert!(Rule::HexColor.apply("#12345g").is_err());
    }

    #[test]
    fn coercion_matches_number_input() {
        assert_eq!(coerce_number(""), Some(0.0));
        assert_eq!(coerce_number(" 12 "), Some(12.0));
        assert_eq!(coerce_number("inf"), None);
        assert_eq!(coerce_number("1e3"), Some(1000.0));
    }
}
