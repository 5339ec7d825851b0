//! Binding declaration sets.

use std::rc::Rc;

use mlua::Lua;
use rustc_hash::FxHashMap;
use tracing::debug;

use luabinder_core::{Context, Diagnostics, Guard, Handler, NativeError};

use crate::{Module, Table};

/// A set of bindings waiting to be installed into a VM.
///
/// A `Loader` is plain data until a [`Binder`](crate::Binder) materializes
/// it, which happens once per VM before the first script runs. Independently
/// authored loaders compose through [`Binder::load`](crate::Binder::load).
///
/// ```ignore
/// let mut loader = Loader::new();
/// loader.func("sum", |ctx| {
///     let a = ctx.arg(1).number()?;
///     let b = ctx.arg(2).number()?;
///     ctx.push().number(a + b);
///     Ok(())
/// });
/// loader.module("reverse").func("string", reverse_string);
/// loader.table("person").static_fn("new", new_person);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Loader {
    funcs: FxHashMap<String, Handler>,
    modules: FxHashMap<String, Module>,
    tables: FxHashMap<String, Table>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global function. A later registration under the same name replaces it.
    pub fn func<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>) -> Result<(), NativeError> + 'static,
    {
        self.funcs.insert(name.into(), Handler::new(f));
        self
    }

    /// Register a prebuilt handler as a global function.
    pub fn handler(&mut self, name: impl Into<String>, handler: Handler) -> &mut Self {
        self.funcs.insert(name.into(), handler);
        self
    }

    /// Get or create the module `name`.
    pub fn module(&mut self, name: impl Into<String>) -> &mut Module {
        let name = name.into();
        self.modules
            .entry(name.clone())
            .or_insert_with(|| Module::new(name))
    }

    /// Get or create the bound type `name`.
    pub fn table(&mut self, name: impl Into<String>) -> &mut Table {
        let name = name.into();
        self.tables
            .entry(name.clone())
            .or_insert_with(|| Table::new(name))
    }

    pub fn function_count(&self) -> usize {
        self.funcs.len()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn get_module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty() && self.modules.is_empty() && self.tables.is_empty()
    }

    /// Install every function, module and table into `lua`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn materialize(&self, lua: &Lua, diagnostics: &Rc<Diagnostics>) -> mlua::Result<()> {
        debug!(
            functions = self.funcs.len(),
            modules = self.modules.len(),
            tables = self.tables.len(),
            "materializing loader"
        );

        let globals = lua.globals();
        for (name, handler) in &self.funcs {
            let function = handler
                .clone()
                .into_function(lua, Rc::clone(diagnostics), Guard::None)?;
            globals.set(name.as_str(), function)?;
        }
        for module in self.modules.values() {
            module.materialize(lua, diagnostics)?;
        }
        for table in self.tables.values() {
            table.materialize(lua, diagnostics)?;
        }
        Ok(())
    }
}
