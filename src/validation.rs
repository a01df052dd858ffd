//! Edge validation for user-entered values, and the view-side ticket URL
//! edit buffer.
//!
//! Values are checked here before any remote call is issued. The
//! [`TicketUrlEdit`] buffer is the only state a view holds for an
//! incident: it is transient, and is reconciled against the store after a
//! save.

use crate::error::ValidationError;

/// Normalizes a user-entered ticket URL.
///
/// Surrounding whitespace is ignored. An empty input means "clear the
/// ticket" and yields `Ok(None)`; anything else must be an absolute URL.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTicketUrl`] if the input is
/// non-empty and does not parse as an absolute URL.
pub fn normalize_ticket_url(input: &str) -> Result<Option<String>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    url::Url::parse(trimmed).map_err(|err| ValidationError::InvalidTicketUrl {
        url: trimmed.to_string(),
        reason: err.to_string(),
    })?;
    Ok(Some(trimmed.to_string()))
}

/// What saving a [`TicketUrlEdit`] asks the backend to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketUrlSave {
    /// The buffer was not edited; nothing to send.
    Unchanged,
    /// Store this URL.
    Set(String),
    /// Remove the ticket link.
    Clear,
}

impl TicketUrlSave {
    /// Returns the string to send to the backend, `""` meaning clear.
    /// `None` when there is nothing to send.
    #[must_use]
    pub fn as_request(&self) -> Option<&str> {
        match self {
            Self::Unchanged => None,
            Self::Set(url) => Some(url),
            Self::Clear => Some(""),
        }
    }
}

/// In-progress edit of one incident's ticket URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketUrlEdit {
    buffer: String,
    editing: bool,
    changed: bool,
}

impl TicketUrlEdit {
    /// Starts from the store's current value.
    #[must_use]
    pub fn new(current: Option<&str>) -> Self {
        Self {
            buffer: current.unwrap_or_default().to_string(),
            editing: false,
            changed: false,
        }
    }

    /// Current buffer contents.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.buffer
    }

    /// Whether the field is in edit mode.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.editing
    }

    /// Enters edit mode without changing the value.
    pub fn begin(&mut self) {
        self.editing = true;
    }

    /// Replaces the buffer contents and enters edit mode.
    pub fn set(&mut self, value: impl Into<String>) {
        self.buffer = value.into();
        self.editing = true;
        self.changed = true;
    }

    /// Validation error for the current buffer, if any.
    #[must_use]
    pub fn error(&self) -> Option<ValidationError> {
        normalize_ticket_url(&self.buffer).err()
    }

    /// Leaves edit mode and reports what should be sent.
    ///
    /// # Errors
    ///
    /// Returns the validation error and stays in edit mode if the buffer
    /// holds an invalid URL.
    pub fn save(&mut self) -> Result<TicketUrlSave, ValidationError> {
        if !self.changed {
            self.editing = false;
            return Ok(TicketUrlSave::Unchanged);
        }
        let normalized = normalize_ticket_url(&self.buffer)?;
        self.editing = false;
        self.changed = false;
        Ok(match normalized {
            Some(url) => TicketUrlSave::Set(url),
            None => TicketUrlSave::Clear,
        })
    }

    /// Discards local edits in favour of the store's value. Does nothing
    /// while the user is editing.
    pub fn reconcile(&mut self, canonical: Option<&str>) {
        if !self.editing {
            self.buffer = canonical.unwrap_or_default().to_string();
            self.changed = false;
        }
    }
}
