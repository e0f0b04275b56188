//! CLI override token parsing.
//!
//! Overrides take the form `key=value` or `key=v1,v2,...` (a sweep list).
//! A backslash before `=` or `,` escapes the character so values can contain
//! literal delimiters, which matters for values like a previous run's
//! directory name passed as `save_dir`.

use crate::error::OverrideError;

/// A single parsed override: a dotted key and one or more values.
///
/// More than one value means the override is a sweep key; the value order is
/// the order listed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub key: String,
    pub values: Vec<String>,
}

impl Override {
    /// Whether this override carries a sweep value list.
    pub fn is_sweep(&self) -> bool {
        self.values.len() > 1
    }

    /// The single value of a fixed override.
    ///
    /// Returns the first value; callers must check `is_sweep` first when the
    /// distinction matters.
    pub fn value(&self) -> &str {
        &self.values[0]
    }
}

/// An ordered set of parsed CLI overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    entries: Vec<Override>,
}

impl OverrideSet {
    /// Parse a list of raw `key=value` tokens into an override set.
    ///
    /// Token order is preserved; it determines both application order and the
    /// rendering order of the run-directory override summary.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, OverrideError> {
        let mut entries = Vec::with_capacity(tokens.len());
        for token in tokens {
            entries.push(parse_token(token.as_ref())?);
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Override> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a OverrideSet {
    type Item = &'a Override;
    type IntoIter = std::slice::Iter<'a, Override>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Escape a raw value so it survives override parsing verbatim.
///
/// The inverse of the unescaping done by [`OverrideSet::parse`]; useful when
/// embedding a string containing `=` or `,` (such as an existing run
/// directory name) into an override token.
pub fn escape_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '=' || c == ',' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn parse_token(token: &str) -> Result<Override, OverrideError> {
    let split = find_unescaped_eq(token)?;
    let Some(split) = split else {
        return Err(OverrideError::MissingDelimiter {
            token: token.to_string(),
        });
    };

    let key = unescape(&token[..split], token)?;
    if key.is_empty() {
        return Err(OverrideError::EmptyKey {
            token: token.to_string(),
        });
    }

    let values = split_values(&token[split + 1..], token)?;
    Ok(Override { key, values })
}

/// Find the byte index of the first `=` not preceded by a backslash escape.
fn find_unescaped_eq(token: &str) -> Result<Option<usize>, OverrideError> {
    let mut chars = token.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                if chars.next().is_none() {
                    return Err(OverrideError::UnbalancedEscape {
                        token: token.to_string(),
                    });
                }
            }
            '=' => return Ok(Some(i)),
            _ => {}
        }
    }
    Ok(None)
}

/// Split a raw value on unescaped commas, unescaping each element.
fn split_values(raw: &str, token: &str) -> Result<Vec<String>, OverrideError> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next @ ('=' | ',')) => current.push(next),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                }
                None => {
                    return Err(OverrideError::UnbalancedEscape {
                        token: token.to_string(),
                    })
                }
            },
            ',' => {
                values.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    values.push(current);
    Ok(values)
}

/// Unescape a segment without splitting it.
fn unescape(raw: &str, token: &str) -> Result<String, OverrideError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('=' | ',')) => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => {
                    return Err(OverrideError::UnbalancedEscape {
                        token: token.to_string(),
                    })
                }
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_one(token: &str) -> Override {
        let set = OverrideSet::parse(&[token]).unwrap();
        set.iter().next().unwrap().clone()
    }

    #[test]
    fn test_parse_fixed_override() {
        let ov = parse_one("train.batch_size=256");
        assert_eq!(ov.key, "train.batch_size");
        assert_eq!(ov.values, vec!["256"]);
        assert!(!ov.is_sweep());
    }

    #[test]
    fn test_parse_sweep_override() {
        let ov = parse_one("model.d=1,5,10,15,20");
        assert_eq!(ov.key, "model.d");
        assert_eq!(ov.values, vec!["1", "5", "10", "15", "20"]);
        assert!(ov.is_sweep());
    }

    #[test]
    fn test_escaped_delimiters_are_literal() {
        let ov = parse_one(r"save_dir=a\=b\,c");
        assert_eq!(ov.key, "save_dir");
        assert_eq!(ov.values, vec!["a=b,c"]);
        assert!(!ov.is_sweep());
    }

    #[test]
    fn test_escaped_comma_inside_sweep_element() {
        let ov = parse_one(r"save_dir=a\,b,c");
        assert_eq!(ov.values, vec!["a,b", "c"]);
        assert!(ov.is_sweep());
    }

    #[test]
    fn test_value_splits_on_first_unescaped_eq() {
        // A second '=' in the value is kept verbatim.
        let ov = parse_one("note=a=b");
        assert_eq!(ov.key, "note");
        assert_eq!(ov.values, vec!["a=b"]);
    }

    #[test]
    fn test_backslash_before_other_char_is_literal() {
        let ov = parse_one(r"save_dir=a\bc");
        assert_eq!(ov.values, vec![r"a\bc"]);
    }

    #[test]
    fn test_missing_delimiter_is_error() {
        let err = OverrideSet::parse(&["batch_size"]).unwrap_err();
        assert_eq!(
            err,
            OverrideError::MissingDelimiter {
                token: "batch_size".into()
            }
        );
    }

    #[test]
    fn test_trailing_backslash_is_error() {
        let err = OverrideSet::parse(&[r"save_dir=abc\"]).unwrap_err();
        assert_eq!(
            err,
            OverrideError::UnbalancedEscape {
                token: r"save_dir=abc\".into()
            }
        );
    }

    #[test]
    fn test_trailing_backslash_before_eq_is_error() {
        let err = OverrideSet::parse(&[r"save_dir\"]).unwrap_err();
        assert_eq!(
            err,
            OverrideError::UnbalancedEscape {
                token: r"save_dir\".into()
            }
        );
    }

    #[test]
    fn test_empty_key_is_error() {
        let err = OverrideSet::parse(&["=5"]).unwrap_err();
        assert_eq!(err, OverrideError::EmptyKey { token: "=5".into() });
    }

    #[test]
    fn test_empty_value_is_allowed() {
        let ov = parse_one("save_dir=");
        assert_eq!(ov.values, vec![""]);
    }

    #[test]
    fn test_order_is_preserved() {
        let set =
            OverrideSet::parse(&["train.batch_size=64", "random_seed=7", "model.d=4"]).unwrap();
        let keys: Vec<&str> = set.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["train.batch_size", "random_seed", "model.d"]);
    }

    #[test]
    fn test_escape_value_roundtrip() {
        let raw = "vaecl_train.lr=0.01,model.d=5";
        let token = format!("save_dir={}", escape_value(raw));
        let ov = parse_one(&token);
        assert_eq!(ov.values, vec![raw]);
        assert!(!ov.is_sweep());
    }
}
