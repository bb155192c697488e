//! The two kinds of reference found inside composite strings.

use crate::options::InterpolationOptions;
use crate::path::DictPath;

/// A reference cut out of a composite string.
///
/// `raw` is the exact text between the sentinels, whitespace included, so
/// that a value can be rendered back to its source losslessly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A path into the node's own parameters, e.g. `${network:ip}`.
    Parameter { raw: String, path: String },
    /// A call into the function registry, e.g. `$[list(filter, extract)]`.
    Function {
        raw: String,
        name: String,
        args: Vec<String>,
    },
}

impl Reference {
    pub fn raw(&self) -> &str {
        match self {
            Reference::Parameter { raw, .. } | Reference::Function { raw, .. } => raw,
        }
    }

    /// Paths this reference reads from the context.
    ///
    /// Function references read the inventory only and declare none.
    pub fn dependencies(&self, delimiter: &str) -> Vec<DictPath> {
        match self {
            Reference::Parameter { path, .. } => vec![DictPath::new(delimiter, path)],
            Reference::Function { .. } => Vec::new(),
        }
    }

    /// The reference as written, sentinels included.
    pub fn source(&self, options: &InterpolationOptions) -> String {
        match self {
            Reference::Parameter { raw, .. } => options.parameter_sentinels.wrap(raw),
            Reference::Function { raw, .. } => options.function_sentinels.wrap(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_dependencies() {
        let r = Reference::Parameter {
            raw: " a:b ".into(),
            path: "a:b".into(),
        };
        assert_eq!(r.dependencies(":"), vec![DictPath::new(":", "a:b")]);
        assert_eq!(r.source(&InterpolationOptions::default()), "${ a:b }");
    }

    #[test]
    fn test_function_has_no_dependencies() {
        let r = Reference::Function {
            raw: "print(a)".into(),
            name: "print".into(),
            args: vec!["a".into()],
        };
        assert!(r.dependencies(":").is_empty());
        assert_eq!(r.source(&InterpolationOptions::default()), "$[print(a)]");
    }
}
