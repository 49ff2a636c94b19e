//! Sed-style find/replace commands: `s<delim>find<delim>replace<delim>flags`.

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error(
        "Invalid find/replace message format. Expected format: s<delimiter>find<delimiter>replace<delimiter>flags"
    )]
    InvalidFormat,
    #[error("invalid find pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// A parsed find/replace command.
///
/// The delimiter is whatever single character follows the leading `s`; the
/// same character must separate all three segments, with nothing after the
/// optional trailing `g`.
#[derive(Debug, Clone)]
pub struct ReplaceDirective {
    pattern: Regex,
    template: String,
    global: bool,
}

impl ReplaceDirective {
    pub fn parse(command: &str) -> Result<Self, DirectiveError> {
        let rest = command
            .strip_prefix('s')
            .ok_or(DirectiveError::InvalidFormat)?;
        let delim = rest.chars().next().ok_or(DirectiveError::InvalidFormat)?;
        let body = &rest[delim.len_utf8()..];

        // The regex crate has no back-references, so the delimiter is inlined
        // literally instead of captured. Lazy segments keep the split at the
        // earliest delimiter occurrences that still satisfy the full shape.
        let delim_lit = regex::escape(&delim.to_string());
        let shape = Regex::new(&format!("^(.*?){delim_lit}(.*?){delim_lit}(g?)$"))
            .map_err(|_| DirectiveError::InvalidFormat)?;
        let caps = shape.captures(body).ok_or(DirectiveError::InvalidFormat)?;

        let find = caps.get(1).map_or("", |m| m.as_str());
        let template = caps.get(2).map_or("", |m| m.as_str()).to_string();
        let global = caps.get(3).map_or("", |m| m.as_str()) == "g";

        let pattern = Regex::new(find)?;
        Ok(Self {
            pattern,
            template,
            global,
        })
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// The raw find segment as given in the command.
    pub fn find(&self) -> &str {
        self.pattern.as_str()
    }

    /// Replacement template; `$1`-style groups expand on substitution.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn is_global(&self) -> bool {
        self.global
    }
}
