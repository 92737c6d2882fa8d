//! Generic form rendering
//!
//! A form is rendered by walking its schema and handing each field, together with its current
//! value and error, to a [`FormRenderer`]. The renderer decides what the output looks like.
use crate::forms::field::{FieldDescriptor, FieldKind};
use crate::forms::schema::Schema;
use crate::forms::values::{FieldErrors, FormValues};
use core::fmt::Write as _;

/// A single field as it should currently be presented
#[non_exhaustive]
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'form> {
    pub descriptor: &'form FieldDescriptor,
    pub value: &'form str,
    pub error: Option<&'form str>,
}

pub trait FormRenderer {
    type Output;

    fn field(&mut self, view: FieldView<'_>);

    fn finish(self, submit_label: &str) -> Self::Output;
}

#[inline]
pub fn render<R: FormRenderer>(
    schema: &Schema,
    values: &FormValues,
    errors: &FieldErrors,
    submit_label: &str,
    mut renderer: R,
) -> R::Output {
    for descriptor in schema.fields {
        renderer.field(FieldView {
            descriptor,
            value: values.get(descriptor.name),
            error: errors.get(descriptor.name),
        });
    }
    renderer.finish(submit_label)
}

/// Plain-text rendering for terminals, one line per field followed by its error if there is one.
#[non_exhaustive]
#[derive(Debug, Default)]
pub struct TextRenderer {
    output: String,
}

impl TextRenderer {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormRenderer for TextRenderer {
    type Output = String;

    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called through the trait only"
    )]
    fn field(&mut self, view: FieldView<'_>) {
        let hint = &view.descriptor.hint;
        let shown = match view.descriptor.kind {
            FieldKind::Password if !view.value.is_empty() => "*".repeat(view.value.chars().count()),
            FieldKind::Upload(spec) if view.value.is_empty() => format!("<{}>", spec.placeholder),
            FieldKind::Text
            | FieldKind::Email
            | FieldKind::Password
            | FieldKind::Number { .. }
            | FieldKind::TextArea { .. }
            | FieldKind::Upload(_)
            | FieldKind::Color => {
                if view.value.is_empty() {
                    hint.placeholder
                        .map_or_else(String::new, |placeholder| format!("<{placeholder}>"))
                } else {
                    view.value.to_owned()
                }
            }
        };

        writeln!(self.output, "{}: {shown}", hint.label).ok();
        if let Some(error) = view.error {
            writeln!(self.output, "  ! {error}").ok();
        }
    }

    #[inline]
    fn finish(mut self, submit_label: &str) -> String {
        writeln!(self.output, "[{submit_label}]").ok();
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::schema::{SIGN_IN_SCHEMA, SIGN_UP_SCHEMA, names};
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_values_errors_and_submit_label() {
        let values: FormValues = [(names::EMAIL, "ada@"), (names::PASSWORD, "secret")]
            .into_iter()
            .collect();
        let mut errors = FieldErrors::new();
        errors.insert(names::EMAIL, "Invalid email");

        let output = render(&SIGN_IN_SCHEMA, &values, &errors, "Sign In", TextRenderer::new());

        assert_eq!(
            output,
            "Email: ada@\n  ! Invalid email\nPassword: ******\n[Sign In]\n"
        );
    }

    #[test]
    fn empty_upload_shows_its_placeholder() {
        let output = render(
            &SIGN_UP_SCHEMA,
            &FormValues::new(),
            &FieldErrors::new(),
            "Sign Up",
            TextRenderer::new(),
        );
        assert!(output.contains("Upload University ID Card: <Upload your ID>\n"));
    }

    struct CountingRenderer(usize);

    impl FormRenderer for CountingRenderer {
        type Output = usize;

        fn field(&mut self, _view: FieldView<'_>) {
            self.0 += 1;
        }

        fn finish(self, _submit_label: &str) -> usize {
            self.0
        }
    }

    #[test]
    fn visits_every_field_in_order() {
        let count = render(
            &SIGN_UP_SCHEMA,
            &FormValues::new(),
            &FieldErrors::new(),
            "Sign Up",
            CountingRenderer(0),
        );
        assert_eq!(count, SIGN_UP_SCHEMA.fields.len());
    }
}
