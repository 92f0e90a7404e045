//! Copywriting stage: render subject and body templates.

use tera::{Context, Tera};

use crate::context::DraftContext;
use crate::error::PipelineError;

/// Render one template against the draft context.
///
/// An undefined variable is an error, never an empty string: a template
/// that references something the context lacks is a campaign defect.
pub fn render(template: &str, context: &DraftContext) -> Result<String, PipelineError> {
    let context = Context::from_serialize(context)?;
    let rendered = Tera::one_off(template, &context, false)?;
    Ok(rendered.trim().to_string())
}

/// Render subject and body.
pub fn draft(
    subject_template: &str,
    body_template: &str,
    context: &DraftContext,
) -> Result<(String, String), PipelineError> {
    Ok((
        render(subject_template, context)?,
        render(body_template, context)?,
    ))
}
