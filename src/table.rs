//! Bound object types.

use std::rc::Rc;

use mlua::Lua;
use rustc_hash::FxHashMap;
use tracing::trace;

use luabinder_core::{Context, Diagnostics, Guard, Handler, NativeError, register_methods};

/// A host object type exposed to scripts.
///
/// Static functions live in a global table named after the type
/// (`person.new(...)`). Dynamic functions are methods of objects tagged with
/// the type's name (`p:name()`); before a dynamic function runs, its receiver
/// must carry this type's tag, otherwise the call fails with a wrong-type
/// error.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    statics: FxHashMap<String, Handler>,
    dynamics: FxHashMap<String, Handler>,
}

impl Table {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            statics: FxHashMap::default(),
            dynamics: FxHashMap::default(),
        }
    }

    /// Type name, also the tag carried by its objects.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a type-level function, reachable as `Type.name`.
    pub fn static_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>) -> Result<(), NativeError> + 'static,
    {
        self.statics.insert(name.into(), Handler::new(f));
        self
    }

    /// Register a method, reachable as `value:name()`.
    ///
    /// The receiver is argument 1 and is guaranteed to carry this type's tag
    /// when the handler runs.
    pub fn dynamic_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>) -> Result<(), NativeError> + 'static,
    {
        self.dynamics.insert(name.into(), Handler::new(f));
        self
    }

    pub fn static_count(&self) -> usize {
        self.statics.len()
    }

    pub fn dynamic_count(&self) -> usize {
        self.dynamics.len()
    }

    pub fn has_static(&self, name: &str) -> bool {
        self.statics.contains_key(name)
    }

    pub fn has_dynamic(&self, name: &str) -> bool {
        self.dynamics.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.statics.is_empty() && self.dynamics.is_empty()
    }

    pub(crate) fn materialize(&self, lua: &Lua, diagnostics: &Rc<Diagnostics>) -> mlua::Result<()> {
        let statics = lua.create_table()?;
        for (name, handler) in &self.statics {
            let function = handler
                .clone()
                .into_function(lua, Rc::clone(diagnostics), Guard::None)?;
            statics.set(name.as_str(), function)?;
        }
        lua.globals().set(self.name.as_str(), statics)?;

        let methods = lua.create_table()?;
        for (name, handler) in &self.dynamics {
            let function = handler.clone().into_function(
                lua,
                Rc::clone(diagnostics),
                Guard::receiver(&self.name),
            )?;
            methods.set(name.as_str(), function)?;
        }
        register_methods(lua, &self.name, methods)?;

        trace!(
            table = %self.name,
            statics = self.statics.len(),
            dynamics = self.dynamics.len(),
            "installed table"
        );
        Ok(())
    }
}
