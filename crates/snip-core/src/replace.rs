use crate::directive::ReplaceDirective;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub content: String,
    /// False when the substitution left the input untouched (no match, or an
    /// identity replacement). Callers decide whether that is an error.
    pub changed: bool,
}

/// Substitutes the directive's find pattern in `input`: all non-overlapping
/// matches when the `g` flag is set, otherwise only the first.
pub fn apply(directive: &ReplaceDirective, input: &str) -> ReplaceOutcome {
    let replaced = if directive.is_global() {
        directive.pattern().replace_all(input, directive.template())
    } else {
        directive.pattern().replace(input, directive.template())
    };
    let changed = replaced != input;
    ReplaceOutcome {
        content: replaced.into_owned(),
        changed,
    }
}
