//! Feature services. Each one supplies prompt text, generation parameters
//! and typed parsing; the failover executor does the rest.

pub mod bible;
pub mod language;
pub mod quest;
pub mod theology;
pub mod youtube;

pub use language::Language;

/// Reject blank user input before any provider is contacted
pub(crate) fn require_text(
  field: &str
, value: &str
) -> crate::error::Result<()>
{   if value.trim().is_empty()
    {   return Err(crate::error::Error::InvalidRequest(format!(
          "{} must not be empty"
        , field
        )));
    }
    Ok(())
}
