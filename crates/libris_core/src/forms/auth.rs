use crate::forms::render::{FormRenderer, render};
use crate::forms::schema::{
    SIGN_IN_SCHEMA, SIGN_UP_SCHEMA, Schema, SignInCredentials, SignUpCredentials, names,
};
use crate::forms::values::{FieldErrors, FormValues};

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFormKind {
    SignIn,
    SignUp,
}

impl AuthFormKind {
    #[must_use]
    #[inline]
    pub const fn schema(self) -> &'static Schema {
        match self {
            Self::SignIn => &SIGN_IN_SCHEMA,
            Self::SignUp => &SIGN_UP_SCHEMA,
        }
    }

    #[must_use]
    #[inline]
    pub fn default_values(self) -> FormValues {
        match self {
            Self::SignIn => [(names::EMAIL, ""), (names::PASSWORD, "")].into_iter().collect(),
            Self::SignUp => [
                (names::EMAIL, ""),
                (names::PASSWORD, ""),
                (names::FULL_NAME, ""),
                (names::UNIVERSITY_ID, "1"),
                (names::UNIVERSITY_CARD, ""),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[must_use]
    #[inline]
    pub const fn title(self) -> &'static str {
        match self {
            Self::SignIn => "Welcome back to Libris",
            Self::SignUp => "Create your library account",
        }
    }

    #[must_use]
    #[inline]
    pub const fn description(self) -> &'static str {
        match self {
            Self::SignIn => "Access the vast collection of resources, and stay updated",
            Self::SignUp => {
                "Please complete all fields and upload a valid university ID to gain access to the library"
            }
        }
    }

    #[must_use]
    #[inline]
    pub const fn submit_label(self) -> &'static str {
        match self {
            Self::SignIn => "Sign In",
            Self::SignUp => "Sign Up",
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCredentials {
    SignIn(SignInCredentials),
    SignUp(SignUpCredentials),
}

/// State of the sign-in or sign-up form
#[derive(Debug, Clone)]
pub struct AuthForm {
    kind: AuthFormKind,
    values: FormValues,
    errors: FieldErrors,
}

impl AuthForm {
    #[must_use]
    #[inline]
    pub fn new(kind: AuthFormKind) -> Self {
        Self {
            kind,
            values: kind.default_values(),
            errors: FieldErrors::new(),
        }
    }

    #[must_use]
    #[inline]
    pub const fn kind(&self) -> AuthFormKind {
        self.kind
    }

    #[inline]
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        self.values.set(name, value);
    }

    #[must_use]
    #[inline]
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name)
    }

    #[must_use]
    #[inline]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[inline]
    pub fn render<R: FormRenderer>(&self, renderer: R) -> R::Output {
        render(
            self.kind.schema(),
            &self.values,
            &self.errors,
            self.kind.submit_label(),
            renderer,
        )
    }

    /// Validate the form. On failure the errors are kept for rendering and nothing is submitted.
    /// # Errors
    /// Returns the field errors if any field fails its rule.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per submission")]
    pub fn submit(&mut self) -> Result<AuthCredentials, FieldErrors> {
        let result = match self.kind {
            AuthFormKind::SignIn => {
                SignInCredentials::try_from(&self.values).map(AuthCredentials::SignIn)
            }
            AuthFormKind::SignUp => {
                SignUpCredentials::try_from(&self.values).map(AuthCredentials::SignUp)
            }
        };
        self.errors = result.as_ref().err().cloned().unwrap_or_default();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::render::TextRenderer;
    use pretty_assertions::assert_eq;

    #[test]
    fn sign_up_defaults_start_with_university_id_one() {
        let form = AuthForm::new(AuthFormKind::SignUp);
        assert_eq!(form.value(names::UNIVERSITY_ID), "1");
        assert_eq!(form.value(names::FULL_NAME), "");
    }

    #[test]
    fn failed_submit_keeps_errors_for_rendering() {
        let mut form = AuthForm::new(AuthFormKind::SignIn);
        form.set_value(names::EMAIL, "ada@campus.edu");
        form.set_value(names::PASSWORD, "short");

        let errors = form.submit().unwrap_err();
        assert_eq!(form.errors(), &errors);
        assert!(form.render(TextRenderer::new()).contains("  ! String must contain at least 8"));

        form.set_value(names::PASSWORD, "long enough");
        let credentials = form.submit().unwrap();
        assert!(form.errors().is_empty());
        assert_eq!(
            credentials,
            AuthCredentials::SignIn(SignInCredentials {
                email: String::from("ada@campus.edu"),
                password: String::from("long enough"),
            })
        );
    }
}
