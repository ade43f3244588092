// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parser for canonical type names.
//!
//! ```text
//! name      := base | name "[]" | base "`" arity "[" arg ("," arg)* "]"
//! arg       := "[" name "]"
//! ```

use crate::error::{Error, Result};

/// Structure of a canonical type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedTypeName<'a> {
    /// Non-generic name, or a generic definition without arguments.
    Plain(&'a str),
    /// `elem[]`.
    Array(&'a str),
    /// ``base`N[[a],[b]]``; `base` keeps its `` `N `` suffix.
    Generic {
        base: &'a str,
        arity: usize,
        args: Vec<&'a str>,
    },
}

/// Parse a canonical type name into its outermost structure.
///
/// Nested arguments are returned unparsed so callers can resolve them
/// recursively.
pub fn parse_type_name(name: &str) -> Result<ParsedTypeName<'_>> {
    let malformed = |why: &str| Error::MalformedGenericSignature(format!("{}: {}", name, why));

    if name.is_empty() {
        return Err(malformed("empty name"));
    }
    if let Some(element) = name.strip_suffix("[]") {
        if element.is_empty() {
            return Err(malformed("array without element type"));
        }
        return Ok(ParsedTypeName::Array(element));
    }

    let Some(tick) = name.find('`') else {
        if name.contains(['[', ']', ',']) {
            return Err(malformed("brackets on a non-generic name"));
        }
        return Ok(ParsedTypeName::Plain(name));
    };

    let rest = &name[tick + 1..];
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return Err(malformed("missing generic arity"));
    }
    let arity: usize = rest[..digits_end]
        .parse()
        .map_err(|_| malformed("invalid generic arity"))?;
    let base = &name[..tick + 1 + digits_end];
    let tail = &rest[digits_end..];

    if tail.is_empty() {
        return Ok(ParsedTypeName::Plain(base));
    }

    let inner = tail
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| malformed("generic arguments must be enclosed in brackets"))?;
    let args = split_arguments(inner)
        .ok_or_else(|| malformed("unbalanced brackets or separators"))?;

    if args.len() != arity {
        return Err(malformed(&format!(
            "declares {} type arguments, found {}",
            arity,
            args.len()
        )));
    }

    Ok(ParsedTypeName::Generic { base, arity, args })
}

/// Split `[a],[b[[c]]]` into `a`, `b[[c]]` by bracket depth.
///
/// Top-level arguments must be separated by exactly one comma.
fn split_arguments(inner: &str) -> Option<Vec<&str>> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    // Between arguments: `true` after an argument closed, until its comma.
    let mut needs_comma = false;

    for (i, c) in inner.char_indices() {
        match c {
            '[' => {
                if depth == 0 {
                    if needs_comma {
                        return None;
                    }
                    start = Some(i + 1);
                }
                depth += 1;
            }
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    let arg = inner.get(start.take()?..i)?;
                    if arg.is_empty() {
                        return None;
                    }
                    args.push(arg);
                    needs_comma = true;
                }
            }
            ',' if depth == 0 => {
                if !needs_comma {
                    return None;
                }
                needs_comma = false;
            }
            _ if depth == 0 => return None,
            _ => {}
        }
    }

    (depth == 0 && needs_comma).then_some(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_array() {
        assert_eq!(
            parse_type_name("sys.String").unwrap(),
            ParsedTypeName::Plain("sys.String")
        );
        assert_eq!(
            parse_type_name("sys.String[]").unwrap(),
            ParsedTypeName::Array("sys.String")
        );
        assert_eq!(
            parse_type_name("sys.collections.List`1").unwrap(),
            ParsedTypeName::Plain("sys.collections.List`1")
        );
    }

    #[test]
    fn test_nested_generic() {
        let parsed = parse_type_name(
            "sys.collections.Dictionary`2[[sys.String],[sys.collections.List`1[[sys.Int32]]]]",
        )
        .unwrap();
        assert_eq!(
            parsed,
            ParsedTypeName::Generic {
                base: "sys.collections.Dictionary`2",
                arity: 2,
                args: vec!["sys.String", "sys.collections.List`1[[sys.Int32]]"],
            }
        );
    }

    #[test]
    fn test_generic_with_array_argument() {
        let parsed = parse_type_name("sys.Func`2[[sys.String[]],[sys.Boolean]]").unwrap();
        assert_eq!(
            parsed,
            ParsedTypeName::Generic {
                base: "sys.Func`2",
                arity: 2,
                args: vec!["sys.String[]", "sys.Boolean"],
            }
        );
    }

    #[test]
    fn test_malformed_names() {
        for bad in [
            "",
            "[]",
            "sys.List`[[sys.Int32]]",
            "sys.List`1[[sys.Int32]",
            "sys.List`1[sys.Int32]",
            "sys.List`2[[sys.Int32]]",
            "sys.List`1[[]]",
            "sys.Str[ing",
            "sys.collections.Dictionary`2[[sys.String][sys.Int32]]",
            "sys.collections.Dictionary`2[[sys.String],,[sys.Int32]]",
            "sys.collections.Dictionary`2[,[sys.String],[sys.Int32]]",
            "sys.collections.Dictionary`2[[sys.String],[sys.Int32],]",
        ] {
            assert!(
                matches!(parse_type_name(bad), Err(Error::MalformedGenericSignature(_))),
                "expected malformed: {:?}",
                bad
            );
        }
    }
}
