//! Formula grammar contract
//!
//! A formula is either empty (no transform) or a template of the form
//!
//! ```text
//! [prefix] "{" expression "}" [suffix]
//! ```
//!
//! where `expression` is `val` or an arithmetic expression over the bound
//! identifier `val`. The chart engine evaluates the expression and splices
//! the numeric result between prefix and suffix:
//!
//! | formula           | val = 12345 |
//! |-------------------|-------------|
//! | `{val}`           | `12345`     |
//! | `{val / 100}`     | `123.45`    |
//! | `$ {val / 100}`   | `$ 123.45`  |
//! | `{val / 100} USD` | `123.45 USD`|
//!
//! The editor never evaluates and never corrects a formula. Malformed
//! strings (unbalanced braces, several blocks) are stored verbatim; only
//! presence or absence of content matters to the editor.

use serde::{Deserialize, Serialize};

/// A value-transform template, stored verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Formula(String);

impl Formula {
    /// Template that leaves values unchanged
    pub const IDENTITY: &'static str = "{val}";
    /// Template offered as a worked example
    pub const EXAMPLE: &'static str = "${val / 100}";
    /// Identifier bound to the raw value inside the block
    pub const BOUND_IDENTIFIER: &'static str = "val";

    /// Wrap a formula string without inspecting it
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The empty formula (no transform)
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// `{val}`
    #[inline]
    #[must_use]
    pub fn identity() -> Self {
        Self::new(Self::IDENTITY)
    }

    /// `${val / 100}`
    #[inline]
    #[must_use]
    pub fn example() -> Self {
        Self::new(Self::EXAMPLE)
    }

    /// Raw formula text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// No transform configured
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split into prefix, expression and suffix
    ///
    /// Takes the first `{` and the first `}` after it. Returns `None` when no
    /// block is present. Anything past the first block stays in the suffix.
    #[must_use]
    pub fn template(&self) -> Option<FormulaTemplate<'_>> {
        let open = self.0.find('{')?;
        let close = open + 1 + self.0[open + 1..].find('}')?;
        Some(FormulaTemplate {
            prefix: &self.0[..open],
            expression: &self.0[open + 1..close],
            suffix: &self.0[close + 1..],
        })
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Formula {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Formula {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Borrowed view of a formula split around its substitution block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaTemplate<'a> {
    /// Literal text before `{`
    pub prefix: &'a str,
    /// Text between the braces
    pub expression: &'a str,
    /// Literal text after `}`
    pub suffix: &'a str,
}

impl FormulaTemplate<'_> {
    /// Expression is exactly `val`
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.expression.trim() == Formula::BOUND_IDENTIFIER
    }

    /// Expression mentions `val` as a whole identifier
    #[must_use]
    pub fn references_value(&self) -> bool {
        self.expression
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .any(|token| token == Formula::BOUND_IDENTIFIER)
    }

    /// Splice an externally evaluated result between prefix and suffix
    #[must_use]
    pub fn render_with(&self, evaluated: &str) -> String {
        format!("{}{}{}", self.prefix, evaluated, self.suffix)
    }
}
