//! Tagged host objects.
//!
//! A host value crosses into the VM as userdata wrapping an [`Object`]: the
//! payload stays host-owned behind an `Rc`, and a string tag names the bound
//! type it belongs to. Method lookup on the script side goes through a
//! per-tag method table kept in the engine registry, so every bound type
//! shares one userdata type while keeping its own dynamic methods.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use mlua::{Lua, MetaMethod, Table, UserData, UserDataMethods, Value};

/// Registry key holding the dynamic-method table of a tag.
fn methods_key(tag: &str) -> String {
    format!("luabinder.methods.{tag}")
}

/// Install the dynamic-method table for `tag`.
///
/// Objects carrying `tag` resolve `value:name(...)` through this table.
pub fn register_methods(lua: &Lua, tag: &str, methods: Table) -> mlua::Result<()> {
    lua.set_named_registry_value(&methods_key(tag), methods)
}

/// Host payload plus the type tag that identifies it in the VM.
pub struct Object {
    tag: String,
    payload: Rc<dyn Any>,
}

impl Object {
    /// Wrap a new host value.
    pub fn new<T: 'static>(value: T, tag: impl Into<String>) -> Self {
        Self::shared(Rc::new(RefCell::new(value)), tag)
    }

    /// Wrap a host value the embedder keeps a handle to.
    pub fn shared<T: 'static>(value: Rc<RefCell<T>>, tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            payload: value,
        }
    }

    /// Type tag of this object.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Check if the payload is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.payload.is::<RefCell<T>>()
    }

    /// Shared handle to the payload, if it is a `T`.
    pub fn downcast<T: 'static>(&self) -> Option<Rc<RefCell<T>>> {
        Rc::clone(&self.payload).downcast::<RefCell<T>>().ok()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

impl UserData for Object {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Index, |lua, this, key: Value| {
            let table: Option<Table> = lua.named_registry_value(&methods_key(&this.tag))?;
            match table {
                Some(table) => table.raw_get::<Value>(key),
                None => Ok(Value::Nil),
            }
        });

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("{}: {:p}", this.tag, Rc::as_ptr(&this.payload)))
        });
    }
}
