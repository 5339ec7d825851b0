//! VM ownership, materialization and script execution.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::fs;
use std::iter;
use std::path::Path;
use std::rc::Rc;

use mlua::{Lua, MultiValue, Value};
use tracing::{debug, trace};

use luabinder_core::{Context, Diagnostics, NativeError, Stack};

use crate::{BinderError, Caller, Loader, Module, Options, Returns, ScriptError, Source, Table};

/// Chunk name used for [`Binder::do_string`].
pub const STRING_CHUNK: &str = "<string>";

/// An embedded VM together with the bindings installed into it.
///
/// Bindings are collected in a base [`Loader`] (through [`func`](Self::func),
/// [`module`](Self::module) and [`table`](Self::table)) and in any loaders
/// attached with [`load`](Self::load). They are installed lazily, before the
/// first [`do_string`](Self::do_string), [`do_file`](Self::do_file) or
/// [`call`](Self::call), each loader exactly once.
///
/// # Example
///
/// ```ignore
/// let mut binder = Binder::new();
/// binder.func("sum", |ctx| {
///     let a = ctx.arg(1).number()?;
///     let b = ctx.arg(2).number()?;
///     ctx.push().number(a + b);
///     Ok(())
/// })?;
///
/// let ret = binder.do_string("return sum(5, 7)")?;
/// assert_eq!(ret.get(1).number()?, 12.0);
/// ```
pub struct Binder {
    /// Base loader, sealed once materialized
    loader: Loader,
    /// Loaders attached with `load`, in attachment order
    attached: Vec<Loader>,
    /// How many loaders (base first) are installed
    applied: Cell<usize>,
    /// Staged calls and live results
    stack: RefCell<Stack>,
    diagnostics: Rc<Diagnostics>,
    lua: Lua,
}

impl Binder {
    /// Create a binder over a VM with the engine's default configuration.
    pub fn new() -> Self {
        Self::build(Lua::new(), &Options::default())
    }

    /// Create a binder over a VM configured by `options`.
    pub fn with_options(options: Options) -> Result<Self, BinderError> {
        let lua = options.open_state()?;
        Ok(Self::build(lua, &options))
    }

    fn build(lua: Lua, options: &Options) -> Self {
        let stack = match options.registry_size {
            Some(size) => Stack::with_capacity(size),
            None => Stack::new(),
        };
        Self {
            loader: Loader::new(),
            attached: Vec::new(),
            applied: Cell::new(0),
            stack: RefCell::new(stack),
            diagnostics: Rc::new(Diagnostics::new(options.include_native_trace)),
            lua,
        }
    }

    /// Register a global function.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::Sealed`] once the base loader has been installed.
    pub fn func<F>(&mut self, name: impl Into<String>, f: F) -> Result<&mut Self, BinderError>
    where
        F: Fn(&mut Context<'_>) -> Result<(), NativeError> + 'static,
    {
        self.base_loader()?.func(name, f);
        Ok(self)
    }

    /// Get or create a module in the base loader.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::Sealed`] once the base loader has been installed.
    pub fn module(&mut self, name: impl Into<String>) -> Result<&mut Module, BinderError> {
        Ok(self.base_loader()?.module(name))
    }

    /// Get or create a bound type in the base loader.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::Sealed`] once the base loader has been installed.
    pub fn table(&mut self, name: impl Into<String>) -> Result<&mut Table, BinderError> {
        Ok(self.base_loader()?.table(name))
    }

    /// Attach a loader, installed after the base loader and earlier attachments.
    ///
    /// Attaching works at any time; a loader attached after the first run is
    /// installed before the next one.
    pub fn load(&mut self, loader: Loader) -> &mut Self {
        self.attached.push(loader);
        self
    }

    /// The base loader.
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Check if the base loader has been installed.
    pub fn is_sealed(&self) -> bool {
        self.applied.get() > 0
    }

    fn base_loader(&mut self) -> Result<&mut Loader, BinderError> {
        if self.is_sealed() {
            return Err(BinderError::Sealed);
        }
        Ok(&mut self.loader)
    }

    /// Install every loader not installed yet.
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn materialize(&self) -> Result<(), BinderError> {
        let pending = iter::once(&self.loader)
            .chain(&self.attached)
            .skip(self.applied.get());
        for loader in pending {
            loader.materialize(&self.lua, &self.diagnostics)?;
            self.applied.set(self.applied.get() + 1);
        }
        Ok(())
    }

    /// Run script text as the chunk `<string>`.
    ///
    /// Every value the chunk returns is kept in the returned [`Returns`].
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::Script`] with the text and failing line when
    /// the chunk does not compile or fails while running.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn do_string(&self, text: &str) -> Result<Returns<'_>, BinderError> {
        self.materialize()?;
        self.run(Source::new(STRING_CHUNK, text))
    }

    /// Read and run a script file, named after its path.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::Io`] when the file cannot be read, and
    /// [`BinderError::Script`] like [`do_string`](Self::do_string) when it fails.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn do_file(&self, path: impl AsRef<Path>) -> Result<Returns<'_>, BinderError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| BinderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.materialize()?;
        self.run(Source::new(path.display().to_string(), text))
    }

    fn run(&self, source: Source) -> Result<Returns<'_>, BinderError> {
        debug!(chunk = %source.name(), "running chunk");
        self.diagnostics.reset();

        let result = self
            .lua
            .load(source.text())
            .set_name(format!("={}", source.name()))
            .call::<MultiValue>(());

        let values = match result {
            Ok(values) => values,
            Err(err) => {
                return Err(ScriptError::from_engine(&err, source, &self.diagnostics).into());
            }
        };

        let base = self.stack.borrow().top();
        let count = values.len();
        let mut stack = self.stack.borrow_mut();
        for value in values {
            stack.push(value);
        }
        trace!(chunk = %source.name(), count, "chunk returned");
        Ok(Returns::new(&self.stack, base, count))
    }

    /// Prepare a call to the global function `name`.
    ///
    /// Resolution happens now, but an unknown or non-function global is only
    /// reported by [`Caller::execute`].
    pub fn call(&self, name: &str) -> Result<Caller<'_>, BinderError> {
        self.materialize()?;

        let callee: Value = self.lua.globals().get(name)?;
        let base = self.stack.borrow().top();
        self.stack.borrow_mut().push(callee);

        let ctx = Context::outbound(&self.lua, &self.stack);
        Ok(Caller::new(self, name.to_owned(), base, ctx))
    }

    /// Current depth of the binder's value stack.
    pub fn top(&self) -> usize {
        self.stack.borrow().top()
    }

    /// The VM, for work outside the binding layer.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Release the VM.
    pub fn close(self) {
        debug!(top = self.top(), "closing binder");
    }

    pub(crate) fn stack(&self) -> &RefCell<Stack> {
        &self.stack
    }

    pub(crate) fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("loader", &self.loader)
            .field("attached", &self.attached.len())
            .field("applied", &self.applied.get())
            .field("top", &self.top())
            .finish_non_exhaustive()
    }
}
