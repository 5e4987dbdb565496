//! Structural evaluation of a practical XPath subset.
//!
//! Snapshot drivers have no scripting engine to hand XPath expressions to,
//! so the resolver evaluates a subset directly against the parsed tree:
//!
//! - `child` and `descendant` axes (`/`, `//`, `./`, `.//`)
//! - name tests and the `*` wildcard
//! - predicates: `[@attr]`, `[@attr='value']`, `[text()='value']`, `[n]`
//!
//! Leading `//` is evaluated from the context node, which is the scoped
//! subtree when inside `within`. Drivers backed by a real query engine are
//! free to resolve XPath natively instead.

use crate::error::{Error, Result};
use scraper::ElementRef;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pred {
    HasAttr(String),
    AttrEquals { name: String, value: String },
    TextEquals(String),
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    /// `None` is the `*` wildcard.
    name: Option<String>,
    preds: Vec<Pred>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Parsed {
    /// True for expressions starting with a single `/`: the first step is
    /// tested against the context node itself.
    absolute: bool,
    steps: Vec<Step>,
}

/// Evaluates `expr` with `context` as the context node, returning matches
/// in the order they were found (deduplicated).
pub(crate) fn evaluate<'a>(context: ElementRef<'a>, expr: &str) -> Result<Vec<ElementRef<'a>>> {
    let parsed = parse(expr)?;
    let mut current = vec![context];

    for (index, step) in parsed.steps.iter().enumerate() {
        let mut next = Vec::new();
        for ctx in &current {
            let candidates: Vec<ElementRef<'a>> = if parsed.absolute && index == 0 {
                // The root step of an absolute path names the context itself.
                vec![*ctx]
            } else {
                match step.axis {
                    Axis::Child => ctx.children().filter_map(ElementRef::wrap).collect(),
                    Axis::Descendant => ctx
                        .descendants()
                        .skip(1)
                        .filter_map(ElementRef::wrap)
                        .collect(),
                }
            };

            let mut matched: Vec<ElementRef<'a>> = candidates
                .into_iter()
                .filter(|el| match &step.name {
                    Some(name) => el.value().name() == name.as_str(),
                    None => true,
                })
                .collect();
            for pred in &step.preds {
                matched = apply_pred(matched, pred);
            }
            next.extend(matched);
        }

        let mut seen = HashSet::new();
        next.retain(|el| seen.insert(el.id()));
        current = next;
    }

    Ok(current)
}

fn apply_pred<'a>(matched: Vec<ElementRef<'a>>, pred: &Pred) -> Vec<ElementRef<'a>> {
    match pred {
        Pred::HasAttr(name) => matched
            .into_iter()
            .filter(|el| el.value().attr(name).is_some())
            .collect(),
        Pred::AttrEquals { name, value } => matched
            .into_iter()
            .filter(|el| el.value().attr(name) == Some(value.as_str()))
            .collect(),
        Pred::TextEquals(value) => matched
            .into_iter()
            .filter(|el| el.text().collect::<String>().trim() == value.as_str())
            .collect(),
        Pred::Position(n) => matched.into_iter().nth(n - 1).into_iter().collect(),
    }
}

fn parse(expr: &str) -> Result<Parsed> {
    let trimmed = expr.trim();
    let mut absolute = false;
    let mut axis = Axis::Child;

    let mut rest = if let Some(r) = trimmed.strip_prefix(".//") {
        axis = Axis::Descendant;
        r
    } else if let Some(r) = trimmed.strip_prefix("//") {
        axis = Axis::Descendant;
        r
    } else if let Some(r) = trimmed.strip_prefix("./") {
        r
    } else if let Some(r) = trimmed.strip_prefix('/') {
        absolute = true;
        r
    } else {
        trimmed
    };

    if rest.is_empty() {
        return Err(invalid(expr, "empty location path"));
    }

    let mut steps = Vec::new();
    loop {
        let (step, remaining) = parse_step(rest, axis, expr)?;
        steps.push(step);
        if remaining.is_empty() {
            break;
        }
        if let Some(r) = remaining.strip_prefix("//") {
            axis = Axis::Descendant;
            rest = r;
        } else if let Some(r) = remaining.strip_prefix('/') {
            axis = Axis::Child;
            rest = r;
        } else {
            return Err(invalid(expr, "expected '/' between steps"));
        }
    }

    Ok(Parsed { absolute, steps })
}

fn parse_step<'a>(input: &'a str, axis: Axis, expr: &str) -> Result<(Step, &'a str)> {
    let name_len = input
        .find(|c: char| c == '/' || c == '[')
        .unwrap_or(input.len());
    let name = &input[..name_len];
    if name.is_empty() {
        return Err(invalid(expr, "missing step name"));
    }
    let name = if name == "*" {
        None
    } else {
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
        {
            return Err(invalid(expr, "unsupported step syntax"));
        }
        Some(name.to_string())
    };

    let mut rest = &input[name_len..];
    let mut preds = Vec::new();
    while let Some(inner_start) = rest.strip_prefix('[') {
        let end = inner_start
            .find(']')
            .ok_or_else(|| invalid(expr, "unterminated predicate"))?;
        preds.push(parse_pred(inner_start[..end].trim(), expr)?);
        rest = &inner_start[end + 1..];
    }

    Ok((Step { axis, name, preds }, rest))
}

fn parse_pred(input: &str, expr: &str) -> Result<Pred> {
    if let Some(attr) = input.strip_prefix('@') {
        return match attr.split_once('=') {
            Some((name, literal)) => Ok(Pred::AttrEquals {
                name: name.trim().to_string(),
                value: parse_literal(literal.trim(), expr)?,
            }),
            None => Ok(Pred::HasAttr(attr.trim().to_string())),
        };
    }
    if let Some(text) = input.strip_prefix("text()") {
        let literal = text
            .trim()
            .strip_prefix('=')
            .ok_or_else(|| invalid(expr, "expected '=' after text()"))?;
        return Ok(Pred::TextEquals(parse_literal(literal.trim(), expr)?));
    }
    if let Ok(position) = input.parse::<usize>() {
        if position == 0 {
            return Err(invalid(expr, "positions are 1-based"));
        }
        return Ok(Pred::Position(position));
    }
    Err(invalid(expr, "unsupported predicate"))
}

fn parse_literal(input: &str, expr: &str) -> Result<String> {
    let mut chars = input.chars();
    let quote = chars.next();
    match quote {
        Some(q @ ('\'' | '"')) if input.len() >= 2 && input.ends_with(q) => {
            Ok(input[1..input.len() - 1].to_string())
        }
        _ => Err(invalid(expr, "expected quoted string literal")),
    }
}

fn invalid(expr: &str, reason: &str) -> Error {
    Error::InvalidArgument(format!("xpath `{expr}`: {reason}"))
}
