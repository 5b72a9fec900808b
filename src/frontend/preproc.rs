//! Preprocessor condition evaluation.
//!
//! Decides `#if`/`#elif` conditions from integer literals, `defined`, the
//! values of macros defined so far and the C operators. Identifiers that
//! name no macro evaluate to 0. Anything else (calls, string or char
//! literals, non-numeric macro bodies) makes the condition undecidable.

use std::collections::HashMap;
use tree_sitter::Node;

/// Currently defined macros. `None` marks a macro whose body is not an
/// integer.
pub(crate) type MacroValues = HashMap<String, Option<i64>>;

/// Value of a `#define` body: empty bodies count as 1, like `-DNAME`.
pub(crate) fn macro_value(body: &str) -> Option<i64> {
    let body = body.trim();
    if body.is_empty() {
        return Some(1);
    }
    let body = body
        .strip_prefix('(')
        .and_then(|b| b.strip_suffix(')'))
        .map(str::trim)
        .unwrap_or(body);
    parse_integer(body)
}

/// Parse a C integer literal, ignoring `u`/`l` suffixes and `'` separators.
pub(crate) fn parse_integer(text: &str) -> Option<i64> {
    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let digits: String = text
        .trim_end_matches(['u', 'U', 'l', 'L'])
        .chars()
        .filter(|&c| c != '\'')
        .collect();
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse().ok()?
    };
    Some(if negative { value.wrapping_neg() } else { value })
}

/// Bounds the nesting of a condition expression. Deeper conditions are
/// undecidable.
const MAX_CONDITION_DEPTH: usize = 128;

/// Evaluate a condition expression. `None` means undecidable.
pub(crate) fn evaluate(node: Node, source: &[u8], macros: &MacroValues) -> Option<i64> {
    Evaluator { source, macros }.eval(node, 0)
}

struct Evaluator<'a> {
    source: &'a [u8],
    macros: &'a MacroValues,
}

impl<'a> Evaluator<'a> {
    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or_default()
    }

    fn eval(&self, node: Node, depth: usize) -> Option<i64> {
        if depth > MAX_CONDITION_DEPTH {
            log::debug!("Condition nested deeper than {} levels", MAX_CONDITION_DEPTH);
            return None;
        }
        let depth = depth + 1;

        match node.kind() {
            "number_literal" => parse_integer(self.text(node)),
            "true" => Some(1),
            "false" => Some(0),
            "identifier" => match self.macros.get(self.text(node)) {
                Some(value) => *value,
                None => Some(0),
            },
            "preproc_defined" => {
                let name = node.named_child(0)?;
                Some(i64::from(self.macros.contains_key(self.text(name))))
            }
            "parenthesized_expression" => self.eval(node.named_child(0)?, depth),
            "unary_expression" => {
                let operator = node.child_by_field_name("operator")?;
                let value = self.eval(node.child_by_field_name("argument")?, depth)?;
                match operator.kind() {
                    "!" => Some(i64::from(value == 0)),
                    "-" => Some(value.wrapping_neg()),
                    "+" => Some(value),
                    "~" => Some(!value),
                    _ => None,
                }
            }
            "binary_expression" => {
                let operator = node.child_by_field_name("operator")?.kind();
                let left = self.eval(node.child_by_field_name("left")?, depth);
                let right = || self.eval(node.child_by_field_name("right")?, depth);
                match operator {
                    // short-circuit lets a decided side win over an undecidable one
                    "&&" => match left {
                        Some(0) => Some(0),
                        Some(_) => right().map(|r| i64::from(r != 0)),
                        None => match right() {
                            Some(0) => Some(0),
                            _ => None,
                        },
                    },
                    "||" => match left {
                        Some(0) => right().map(|r| i64::from(r != 0)),
                        Some(_) => Some(1),
                        None => match right() {
                            Some(r) if r != 0 => Some(1),
                            _ => None,
                        },
                    },
                    _ => binary(operator, left?, right()?),
                }
            }
            "conditional_expression" => {
                let condition = self.eval(node.child_by_field_name("condition")?, depth)?;
                let branch = if condition != 0 {
                    node.child_by_field_name("consequence")?
                } else {
                    node.child_by_field_name("alternative")?
                };
                self.eval(branch, depth)
            }
            _ => None,
        }
    }
}

fn binary(operator: &str, left: i64, right: i64) -> Option<i64> {
    let value = match operator {
        "+" => left.wrapping_add(right),
        "-" => left.wrapping_sub(right),
        "*" => left.wrapping_mul(right),
        "/" => left.checked_div(right)?,
        "%" => left.checked_rem(right)?,
        "<<" => left.checked_shl(u32::try_from(right).ok()?)?,
        ">>" => left.checked_shr(u32::try_from(right).ok()?)?,
        "&" => left & right,
        "|" => left | right,
        "^" => left ^ right,
        "==" => i64::from(left == right),
        "!=" => i64::from(left != right),
        "<" => i64::from(left < right),
        "<=" => i64::from(left <= right),
        ">" => i64::from(left > right),
        ">=" => i64::from(left >= right),
        _ => return None,
    };
    Some(value)
}
