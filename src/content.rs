//! Helpers for providers that answer with JSON as text

use serde::de::DeserializeOwned;

/// Strip a surrounding Markdown code fence (```json ... ``` or ``` ... ```).
/// Unfenced text is returned trimmed.
pub fn strip_markdown_fence(text: &str) -> &str
{   let trimmed = text.trim();
    let inner = if let Some(rest) = trimmed.strip_prefix("```json")
    {   rest
    } else if let Some(rest) = trimmed.strip_prefix("```")
    {   rest
    } else
    {   return trimmed;
    };
    let inner = inner.trim_start();
    inner.strip_suffix("```")
      .unwrap_or(inner)
      .trim()
}

/// Parse provider text as JSON, tolerating Markdown fences.
/// The error string is a short diagnostic with a preview of the text.
pub fn parse_json_content<T: DeserializeOwned>(text: &str)
  -> Result<T, String>
{   let cleaned = strip_markdown_fence(text);

    if !cleaned.starts_with('{') && !cleaned.starts_with('[')
    {   return Err(format!(
          "non-JSON content: {}"
        , preview(cleaned, 100)
        ));
    }

    serde_json::from_str(cleaned).map_err(|e| {
      format!("invalid JSON ({}): {}", e, preview(cleaned, 200))
    })
}

/// First `max_chars` characters, with an ellipsis when cut
pub fn preview(text: &str, max_chars: usize) -> String
{   let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some()
    {   format!("{}...", head)
    } else
    {   head
    }
}
