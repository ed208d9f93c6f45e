//! Slug value acquisition.
//!
//! Generation code asks a `ValueSource` for every value it needs; the
//! interactive implementation talks to the terminal through dialoguer,
//! while the non-interactive one only ever returns what is already known.

use dialoguer::{Confirm, Input, Select};

use crate::error::{Error, Result};
use crate::slug::{Slug, SlugKind, SlugValue};

/// Where slug values come from when neither the caller nor the manifest
/// defaults supply one.
pub trait ValueSource {
    /// Returns a value for the slug, or `None` when this source cannot
    /// produce one. `suggested` is the expanded default, if any.
    fn value_for(&self, slug: &Slug, suggested: Option<&SlugValue>) -> Result<Option<SlugValue>>;
}

/// Never asks; defaults pass through untouched.
pub struct NonInteractive;

impl ValueSource for NonInteractive {
    fn value_for(&self, _slug: &Slug, suggested: Option<&SlugValue>) -> Result<Option<SlugValue>> {
        Ok(suggested.cloned())
    }
}

/// Terminal prompting via dialoguer.
pub struct InteractivePrompt;

impl ValueSource for InteractivePrompt {
    fn value_for(&self, slug: &Slug, suggested: Option<&SlugValue>) -> Result<Option<SlugValue>> {
        let value = match slug.kind {
            SlugKind::Boolean => {
                let default = matches!(suggested, Some(SlugValue::Bool(true)));
                let answer = Confirm::new()
                    .with_prompt(&slug.display_name)
                    .default(default)
                    .interact()
                    .map_err(Error::IoError)?;
                SlugValue::Bool(answer)
            }
            _ if !slug.allowed_values.is_empty() => {
                let default = suggested
                    .map(|v| v.render(slug.kind))
                    .and_then(|rendered| {
                        slug.allowed_values
                            .iter()
                            .position(|c| c.eq_ignore_ascii_case(&rendered))
                    })
                    .unwrap_or(0);
                let selection = Select::new()
                    .with_prompt(&slug.display_name)
                    .items(&slug.allowed_values)
                    .default(default)
                    .interact()
                    .map_err(Error::IoError)?;
                SlugValue::Str(slug.allowed_values[selection].clone())
            }
            kind => {
                let default = suggested.map(|v| v.render(kind)).unwrap_or_default();
                let raw: String = Input::new()
                    .with_prompt(&slug.display_name)
                    .default(default)
                    .interact_text()
                    .map_err(Error::IoError)?;
                SlugValue::parse(kind, &raw)?
            }
        };
        slug.accepts(&value)?;
        Ok(Some(value))
    }
}
