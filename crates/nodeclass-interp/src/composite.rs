//! Composite values: strings split into literals and references.

use crate::error::{InterpolationError, Result};
use crate::options::InterpolationOptions;
use crate::reference::Reference;
use serde_json::Value;

/// A parsed string of alternating literal segments and references.
///
/// There is always exactly one more literal than there are references; a
/// literal may be empty. `literals[i]` precedes `references[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeValue {
    literals: Vec<String>,
    references: Vec<Reference>,
}

impl CompositeValue {
    /// Split `raw` on parameter sentinels, then split every literal piece on
    /// function sentinels. Any sentinel left over in a literal is an error.
    pub fn parse(raw: &str, options: &InterpolationOptions) -> Result<Self> {
        let mut composite = Self {
            literals: Vec::new(),
            references: Vec::new(),
        };
        let sentinels = &options.parameter_sentinels;
        let mut rest = raw;
        loop {
            let Some(open_at) = rest.find(&sentinels.open) else {
                break;
            };
            let after = &rest[open_at + sentinels.open.len()..];
            let Some(close_at) = after.find(&sentinels.close) else {
                break;
            };
            let body = &after[..close_at];
            if body.trim().is_empty() {
                return Err(incomplete(raw, &sentinels.open));
            }
            composite.split_functions(&rest[..open_at], raw, options)?;
            composite.references.push(Reference::Parameter {
                raw: body.to_string(),
                path: body.trim().to_string(),
            });
            rest = &after[close_at + sentinels.close.len()..];
        }
        composite.split_functions(rest, raw, options)?;
        composite.check_literals(raw, options)?;

        if composite.has_references() {
            tracing::debug!(
                references = composite.references.len(),
                "parsed composite {raw:?}"
            );
        }
        Ok(composite)
    }

    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }

    /// `true` for a lone reference with nothing around it, which renders
    /// to the referenced value's own type.
    pub fn is_single_reference(&self) -> bool {
        self.references.len() == 1 && self.literals.iter().all(String::is_empty)
    }

    /// Assemble the final value, resolving each reference with `resolve`.
    pub fn assemble<F>(&self, mut resolve: F) -> Result<Value>
    where
        F: FnMut(&Reference) -> Result<Value>,
    {
        if !self.has_references() {
            return Ok(Value::String(
                self.literals.first().cloned().unwrap_or_default(),
            ));
        }
        if self.is_single_reference() {
            return resolve(&self.references[0]);
        }
        let mut out = String::new();
        for (literal, reference) in self.literals.iter().zip(&self.references) {
            out.push_str(literal);
            out.push_str(&coerce_to_string(&resolve(reference)?));
        }
        if let Some(last) = self.literals.last() {
            out.push_str(last);
        }
        Ok(Value::String(out))
    }

    /// The text this value was parsed from.
    pub fn source_text(&self, options: &InterpolationOptions) -> String {
        let mut out = String::new();
        for (literal, reference) in self.literals.iter().zip(&self.references) {
            out.push_str(literal);
            out.push_str(&reference.source(options));
        }
        if let Some(last) = self.literals.last() {
            out.push_str(last);
        }
        out
    }

    // ── Function references ──────────────────────────────────────────────

    /// Split one literal piece on function references. Always pushes one
    /// more literal than references.
    fn split_functions(
        &mut self,
        piece: &str,
        raw: &str,
        options: &InterpolationOptions,
    ) -> Result<()> {
        let sentinels = &options.function_sentinels;
        let mut literal = String::new();
        let mut rest = piece;
        loop {
            let Some(open_at) = rest.find(&sentinels.open) else {
                break;
            };
            let body = &rest[open_at + sentinels.open.len()..];
            let Some(body_len) = function_body_len(body, &sentinels.close) else {
                break;
            };
            literal.push_str(&rest[..open_at]);
            self.references
                .push(parse_call(&body[..body_len], raw, &sentinels.open)?);
            self.literals.push(std::mem::take(&mut literal));
            rest = &body[body_len + sentinels.close.len()..];
        }
        literal.push_str(rest);
        self.literals.push(literal);
        Ok(())
    }

    fn check_literals(&self, raw: &str, options: &InterpolationOptions) -> Result<()> {
        let markers = [
            &options.parameter_sentinels.open,
            &options.parameter_sentinels.close,
            &options.function_sentinels.open,
            &options.function_sentinels.close,
        ];
        for literal in &self.literals {
            if let Some(marker) = markers.iter().find(|m| literal.contains(m.as_str())) {
                return Err(incomplete(raw, marker));
            }
        }
        Ok(())
    }
}

/// String form used when a reference is spliced into surrounding text.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn incomplete(raw: &str, sentinel: &str) -> InterpolationError {
    InterpolationError::IncompleteInterpolation {
        string: raw.to_string(),
        sentinel: sentinel.to_string(),
    }
}

/// Length of a function reference body, up to its closing sentinel.
///
/// Once a `(` appears, the closing sentinel only counts after the matching
/// `)`, so brackets inside arguments do not end the reference.
fn function_body_len(body: &str, close: &str) -> Option<usize> {
    let first_close = body.find(close);
    let paren = match (body.find('('), first_close) {
        (Some(p), Some(c)) if c < p => return Some(c),
        (None, c) => return c,
        (Some(p), _) => p,
    };
    let matched = matching_paren(body, paren)?;
    body[matched + 1..].find(close).map(|i| matched + 1 + i)
}

/// Byte index of the `)` matching the `(` at `open`, skipping quoted text.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text[open..].char_indices() {
        if let Some(q) = quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                _ if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_call(raw: &str, original: &str, open: &str) -> Result<Reference> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(incomplete(original, open));
    }
    let malformed = |reason: &str| InterpolationError::MalformedFunctionCall {
        reference: text.to_string(),
        reason: reason.to_string(),
    };

    let (name, args) = match text.find('(') {
        None => (text, Vec::new()),
        Some(p) => {
            let close = matching_paren(text, p).ok_or_else(|| malformed("unbalanced parentheses"))?;
            if !text[close + 1..].trim().is_empty() {
                return Err(malformed("unexpected text after argument list"));
            }
            (text[..p].trim(), split_args(&text[p + 1..close]))
        }
    };
    if name.is_empty() {
        return Err(malformed("missing function name"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(malformed("function name contains whitespace"));
    }
    Ok(Reference::Function {
        raw: raw.to_string(),
        name: name.to_string(),
        args,
    })
}

/// Split on commas outside quotes and brackets, trimming each argument.
fn split_args(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                _ if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                args.push(text[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(text[start..].trim().to_string());
    args
}
