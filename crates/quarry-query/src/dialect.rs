//! SQL dialect contract.
//!
//! A dialect decides how identifiers are quoted and what a bound-parameter
//! placeholder looks like. Concrete backends implement this in the driver
//! crate; [`AnsiDialect`] serves renders that have no backend attached.

/// Backend-specific rendering rules shared by every clause.
pub trait Dialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn quote_char(&self) -> char {
        '"'
    }

    /// Wraps a name in the dialect's quote character, doubling any embedded
    /// quote character.
    fn ident_quote(&self, name: &str) -> String {
        let q = self.quote_char();
        let mut out = String::with_capacity(name.len() + 2);
        out.push(q);
        for ch in name.chars() {
            if ch == q {
                out.push(q);
            }
            out.push(ch);
        }
        out.push(q);
        out
    }

    /// Renders the placeholder for a bound parameter.
    ///
    /// `name` is the generated parameter name (`col1`, `col2`, ...) and
    /// `position` its 1-based allocation order, for dialects with positional
    /// placeholders only.
    fn placeholder(&self, name: &str, position: usize) -> String {
        let _ = position;
        format!(":{name}")
    }
}

/// Plain ANSI quoting with named placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl Dialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ansi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_quote() {
        let d = AnsiDialect;
        assert_eq!(d.ident_quote("foo"), "\"foo\"");
    }

    #[test]
    fn test_ident_quote_doubles_embedded_quotes() {
        let d = AnsiDialect;
        assert_eq!(d.ident_quote("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_placeholder() {
        let d = AnsiDialect;
        assert_eq!(d.placeholder("col1", 1), ":col1");
    }
}
