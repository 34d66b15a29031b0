//! Positional `{0}`-style templates.
//!
//! Arguments are pasted in as raw text. Nothing is quoted or escaped, so a
//! value containing `'` changes the meaning of the rendered statement. Use
//! the `*_bound` processor methods when the values come from outside.

use std::fmt::Display;

use crate::error::{ProcessorError, Result};

/// Substitutes `{N}` placeholders with the `N`th argument.
///
/// `{{` and `}}` render as literal braces.
///
/// # Errors
///
/// Returns [`ProcessorError::Template`] for an out-of-range or malformed
/// placeholder and for an unmatched brace.
pub fn render<A: Display>(template: &str, args: &[A]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut digits = String::new();
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    digits.push(next);
                }
                if !closed {
                    return Err(ProcessorError::Template(format!(
                        "unclosed placeholder at position {position}"
                    )));
                }
                let index: usize = digits.trim().parse().map_err(|_| {
                    ProcessorError::Template(format!(
                        "invalid placeholder '{{{digits}}}' at position {position}"
                    ))
                })?;
                let arg = args.get(index).ok_or_else(|| {
                    ProcessorError::Template(format!(
                        "placeholder {{{index}}} has no argument ({} given)",
                        args.len()
                    ))
                })?;
                out.push_str(&arg.to_string());
            }
            '}' => {
                return Err(ProcessorError::Template(format!(
                    "unmatched '}}' at position {position}"
                )));
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_substitution() {
        let sql = render(
            "select count(*) from t where a='{0}' and b='{1}' or a='{0}'",
            &["x", "y"],
        )
        .unwrap();
        assert_eq!(sql, "select count(*) from t where a='x' and b='y' or a='x'");
    }

    #[test]
    fn test_no_placeholders() {
        let sql = render::<&str>("select 1", &[]).unwrap();
        assert_eq!(sql, "select 1");
    }

    #[test]
    fn test_escaped_braces() {
        let sql = render("select '{{{0}}}'", &[42]).unwrap();
        assert_eq!(sql, "select '{42}'");
    }

    #[test]
    fn test_missing_argument() {
        let err = render("select {1}", &["only one"]).unwrap_err();
        assert!(matches!(err, ProcessorError::Template(_)));
    }

    #[test]
    fn test_malformed_placeholders() {
        assert!(render("select {a}", &["x"]).is_err());
        assert!(render("select {0", &["x"]).is_err());
        assert!(render("select 0}", &["x"]).is_err());
    }

    #[test]
    fn test_arguments_are_not_escaped() {
        let sql = render("select '{0}'", &["it's"]).unwrap();
        assert_eq!(sql, "select 'it's'");
    }
}
