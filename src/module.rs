//! Named namespaces of functions and constants.

use std::rc::Rc;

use mlua::{Lua, MultiValue, Value};
use rustc_hash::FxHashMap;
use tracing::trace;

use luabinder_core::{Context, Diagnostics, Guard, Handler, NativeError};

/// A constant exported by a [`Module`].
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    String(String),
    Number(f64),
    Bool(bool),
}

impl Constant {
    fn to_value(&self, lua: &Lua) -> mlua::Result<Value> {
        Ok(match self {
            Constant::String(s) => Value::String(lua.create_string(s)?),
            Constant::Number(n) => Value::Number(*n),
            Constant::Bool(b) => Value::Boolean(*b),
        })
    }
}

/// A namespace scripts acquire with `require(name)`.
///
/// ```ignore
/// let reverse = loader.module("reverse");
/// reverse.func("string", |ctx| {
///     let s = ctx.arg(1).string()?;
///     ctx.push().string(&s.chars().rev().collect::<String>())?;
///     Ok(())
/// });
/// reverse.string("version", "1.0");
/// ```
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    funcs: FxHashMap<String, Handler>,
    constants: FxHashMap<String, Constant>,
}

impl Module {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            funcs: FxHashMap::default(),
            constants: FxHashMap::default(),
        }
    }

    /// Name the module is required by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a function. A later registration under the same name replaces it.
    pub fn func<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>) -> Result<(), NativeError> + 'static,
    {
        self.funcs.insert(name.into(), Handler::new(f));
        self
    }

    pub fn string(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.constant(name, Constant::String(value.into()))
    }

    pub fn number(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.constant(name, Constant::Number(value))
    }

    pub fn bool(&mut self, name: impl Into<String>, value: bool) -> &mut Self {
        self.constant(name, Constant::Bool(value))
    }

    fn constant(&mut self, name: impl Into<String>, value: Constant) -> &mut Self {
        self.constants.insert(name.into(), value);
        self
    }

    pub fn function_count(&self) -> usize {
        self.funcs.len()
    }

    pub fn constant_count(&self) -> usize {
        self.constants.len()
    }

    /// Look up a registered constant.
    pub fn get_constant(&self, name: &str) -> Option<&Constant> {
        self.constants.get(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty() && self.constants.is_empty()
    }

    /// Install this module as `package.preload[name]`.
    pub(crate) fn materialize(&self, lua: &Lua, diagnostics: &Rc<Diagnostics>) -> mlua::Result<()> {
        let exports = lua.create_table()?;
        for (name, handler) in &self.funcs {
            let function = handler
                .clone()
                .into_function(lua, Rc::clone(diagnostics), Guard::None)?;
            exports.set(name.as_str(), function)?;
        }
        for (name, constant) in &self.constants {
            exports.set(name.as_str(), constant.to_value(lua)?)?;
        }

        let package: mlua::Table = lua.globals().get("package")?;
        let preload: mlua::Table = package.get("preload")?;
        let open = lua.create_function(move |_, _: MultiValue| Ok(exports.clone()))?;
        preload.set(self.name.as_str(), open)?;

        trace!(
            module = %self.name,
            functions = self.funcs.len(),
            constants = self.constants.len(),
            "installed module"
        );
        Ok(())
    }
}
