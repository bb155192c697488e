//! Recursive rendering of parameter values.

use crate::composite::CompositeValue;
use crate::error::{ConfigError, InterpolationError, Result};
use crate::function::{FunctionRegistry, Inventory};
use crate::mutator::{MutatorCatalog, Mutators};
use crate::options::InterpolationOptions;
use crate::path::DictPath;
use crate::reference::Reference;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Maximum chain of parameter references followed while rendering one value.
pub const MAX_RESOLUTION_DEPTH: usize = 64;

/// What to do with function references during a render.
#[derive(Debug, Clone, Copy)]
pub enum FunctionMode<'i> {
    /// Execute them against a finished inventory.
    Evaluate(&'i Inventory),
    /// Leave them as written, sentinels included.
    Defer,
    /// Fail with [`InterpolationError::InventoryRequired`].
    Unavailable,
}

/// Renders raw values against a node context.
///
/// Built once per run; the function table and mutator stack are shared by
/// every node rendered with it.
#[derive(Debug)]
pub struct Interpolator {
    options: InterpolationOptions,
    functions: FunctionRegistry,
    mutators: Mutators,
}

impl Interpolator {
    /// Interpolator with the builtin functions and the mutators named in
    /// `options`, resolved from the builtin catalog.
    pub fn new(options: InterpolationOptions) -> std::result::Result<Self, ConfigError> {
        options.validate()?;
        let mutators = Mutators::load(&options.mutators, &MutatorCatalog::builtin())?;
        Ok(Self {
            options,
            functions: FunctionRegistry::builtin(),
            mutators,
        })
    }

    pub fn with_parts(
        options: InterpolationOptions,
        functions: FunctionRegistry,
        mutators: Mutators,
    ) -> Self {
        Self {
            options,
            functions,
            mutators,
        }
    }

    pub fn options(&self) -> &InterpolationOptions {
        &self.options
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn mutators(&self) -> &Mutators {
        &self.mutators
    }

    pub fn parse(&self, raw: &str) -> Result<CompositeValue> {
        CompositeValue::parse(raw, &self.options)
    }

    /// Render `value` against `context`, then run the mutator stack.
    pub fn render(&self, value: &Value, context: &Value, mode: FunctionMode<'_>) -> Result<Value> {
        let rendered = Resolution::new(self, context, mode).render_value(value)?;
        self.mutators.apply(rendered)
    }

    /// Render every entry of `context` in place.
    ///
    /// References read the context as it was before this call, so the order
    /// entries are rendered in does not matter.
    pub fn interpolate(&self, context: &mut Value, mode: FunctionMode<'_>) -> Result<()> {
        let rendered = {
            let snapshot: &Value = context;
            let mut resolution = Resolution::new(self, snapshot, mode);
            match snapshot {
                Value::Object(map) => {
                    let mut out = Value::Object(Map::new());
                    for key in map.keys() {
                        // top-level keys are taken whole, delimiter included
                        let path = DictPath::from_parts(&self.options.path_delimiter, vec![key.clone()]);
                        let rendered = resolution.resolve_path(&path)?;
                        path.set(&mut out, rendered)?;
                    }
                    out
                }
                other => resolution.render_value(other)?,
            }
        };
        *context = self.mutators.apply(rendered)?;
        Ok(())
    }

    /// Resolve one function reference.
    fn call(&self, reference: &Reference, mode: FunctionMode<'_>) -> Result<Value> {
        let Reference::Function { name, args, .. } = reference else {
            return Err(InterpolationError::UndefinedFunction {
                reference: reference.source(&self.options),
            });
        };
        let inventory = match mode {
            FunctionMode::Evaluate(inventory) => inventory,
            FunctionMode::Defer => return Ok(Value::String(reference.source(&self.options))),
            FunctionMode::Unavailable => {
                return Err(InterpolationError::InventoryRequired {
                    reference: reference.source(&self.options),
                })
            }
        };
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| InterpolationError::UndefinedFunction {
                reference: reference.source(&self.options),
            })?;
        tracing::debug!(function = %name, args = args.len(), "calling function");
        function
            .execute(inventory, args)
            .map_err(|source| InterpolationError::Function {
                name: name.clone(),
                source,
            })
    }
}

/// State for one render pass: memoised paths and the chain being resolved.
struct Resolution<'a> {
    interp: &'a Interpolator,
    context: &'a Value,
    mode: FunctionMode<'a>,
    stack: Vec<DictPath>,
    memo: HashMap<DictPath, Value>,
}

impl<'a> Resolution<'a> {
    fn new(interp: &'a Interpolator, context: &'a Value, mode: FunctionMode<'a>) -> Self {
        Self {
            interp,
            context,
            mode,
            stack: Vec::new(),
            memo: HashMap::new(),
        }
    }

    fn render_value(&mut self, value: &Value) -> Result<Value> {
        match value {
            Value::String(raw) => self.render_string(raw),
            Value::Array(items) => items
                .iter()
                .map(|item| self.render_value(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, item) in map {
                    out.insert(key.clone(), self.render_value(item)?);
                }
                Ok(Value::Object(out))
            }
            scalar => Ok(scalar.clone()),
        }
    }

    fn render_string(&mut self, raw: &str) -> Result<Value> {
        self.render_composite(raw).map_err(|err| err.in_value(raw))
    }

    fn render_composite(&mut self, raw: &str) -> Result<Value> {
        let composite = self.interp.parse(raw)?;
        if !composite.has_references() {
            return Ok(Value::String(raw.to_string()));
        }
        composite.assemble(|reference| match reference {
            Reference::Parameter { path, .. } => {
                let path = DictPath::new(&self.interp.options.path_delimiter, path);
                self.resolve_path(&path)
            }
            Reference::Function { .. } => self.interp.call(reference, self.mode),
        })
    }

    /// Look `path` up in the context and render what is found there.
    fn resolve_path(&mut self, path: &DictPath) -> Result<Value> {
        if let Some(done) = self.memo.get(path) {
            return Ok(done.clone());
        }
        let key = path.to_string();
        if self
            .stack
            .iter()
            .any(|p| p == path || path.is_ancestor_of(p))
        {
            let mut chain: Vec<String> = self.stack.iter().map(DictPath::to_string).collect();
            chain.push(key.clone());
            return Err(InterpolationError::CircularReference { path: key, chain });
        }
        if self.stack.len() >= MAX_RESOLUTION_DEPTH {
            return Err(InterpolationError::DepthExceeded {
                path: key,
                limit: MAX_RESOLUTION_DEPTH,
            });
        }

        tracing::trace!(path = %key, depth = self.stack.len(), "resolving reference");
        let raw = path.get(self.context)?;
        self.stack.push(path.clone());
        let rendered = self.render_value(raw);
        self.stack.pop();
        let rendered = rendered?;
        self.memo.insert(path.clone(), rendered.clone());
        Ok(rendered)
    }
}
