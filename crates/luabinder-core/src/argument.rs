//! Typed read access to stack positions.

use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use mlua::Value;

use crate::dynamic::format_number;
use crate::{ConversionError, Dynamic, Object, Stack};

/// Name reported for positions past the top of the stack.
const NO_VALUE: &str = "no value";

/// A read-only view of one stack position.
///
/// Creating an `Argument` never touches the stack; each accessor reads and
/// converts the value when called, so a missing or mistyped argument is only
/// an error for the accessor that asked for it.
///
/// ```ignore
/// let name = ctx.arg(1).string()?;
/// let person = ctx.arg(2).data::<Person>()?;
/// ```
pub struct Argument<'a> {
    stack: &'a RefCell<Stack>,
    /// Absolute 1-based stack position
    index: usize,
    /// Position reported in errors, relative to the owner's base
    position: usize,
    /// Highest absolute position this view may read
    limit: Option<usize>,
}

impl<'a> Argument<'a> {
    pub(crate) fn new(stack: &'a RefCell<Stack>, index: usize, position: usize) -> Self {
        Self {
            stack,
            index,
            position,
            limit: None,
        }
    }

    /// Create a view that reads nothing above `limit`.
    ///
    /// Results use this so a position past their own values never reads
    /// somebody else's slots.
    pub fn bounded(stack: &'a RefCell<Stack>, index: usize, position: usize, limit: usize) -> Self {
        Self {
            stack,
            index,
            position,
            limit: Some(limit),
        }
    }

    /// The 1-based position this argument reads.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The raw engine value, or `None` past the top of the stack.
    pub fn value(&self) -> Option<Value> {
        if self.position == 0 || self.limit.is_some_and(|limit| self.index > limit) {
            return None;
        }
        self.stack.borrow().get(self.index).cloned()
    }

    /// Check if the position holds nil or nothing at all.
    pub fn is_nil(&self) -> bool {
        matches!(self.value(), None | Some(Value::Nil))
    }

    /// Name of the value's kind, `"no value"` past the top of the stack.
    pub fn kind(&self) -> &'static str {
        match self.value() {
            Some(value) => kind_of(&value),
            None => NO_VALUE,
        }
    }

    /// Read a boolean.
    pub fn bool(&self) -> Result<bool, ConversionError> {
        match self.value() {
            Some(Value::Boolean(b)) => Ok(b),
            other => Err(self.mismatch("boolean", other.as_ref())),
        }
    }

    /// Read a number; integers are widened to `f64`.
    pub fn number(&self) -> Result<f64, ConversionError> {
        match self.value() {
            Some(Value::Number(n)) => Ok(n),
            Some(Value::Integer(i)) => Ok(i as f64),
            other => Err(self.mismatch("number", other.as_ref())),
        }
    }

    /// Read a string; numbers are converted the way the VM converts them.
    pub fn string(&self) -> Result<String, ConversionError> {
        match self.value() {
            Some(Value::String(s)) => {
                let text = s.to_str().map_err(|_| ConversionError::InvalidUtf8 {
                    position: self.position,
                })?;
                Ok((*text).to_owned())
            }
            Some(Value::Integer(i)) => Ok(i.to_string()),
            Some(Value::Number(n)) => Ok(format_number(n)),
            other => Err(self.mismatch("string", other.as_ref())),
        }
    }

    /// Read the value's dynamic kind without committing to a type.
    pub fn any(&self) -> Dynamic {
        self.value()
            .map(|value| Dynamic::from_value(&value))
            .unwrap_or(Dynamic::Nil)
    }

    /// Tag of a host object, if the position holds one.
    pub fn tag(&self) -> Option<String> {
        match self.value() {
            Some(Value::UserData(ud)) => ud.borrow::<Object>().ok().map(|o| o.tag().to_owned()),
            _ => None,
        }
    }

    /// Read a host object whose payload is a `T`.
    ///
    /// Fails with [`ConversionError::WrongType`] when the object carries a
    /// payload of another type.
    pub fn data<T: 'static>(&self) -> Result<Rc<RefCell<T>>, ConversionError> {
        self.with_object(|object| {
            object.downcast::<T>().ok_or_else(|| ConversionError::WrongType {
                position: self.position,
                expected: type_name::<T>().to_owned(),
                actual: object.tag().to_owned(),
            })
        })
    }

    /// Read a host object of bound type `tag` whose payload is a `T`.
    ///
    /// Both identities must match; either mismatch is a
    /// [`ConversionError::WrongType`].
    pub fn object<T: 'static>(&self, tag: &str) -> Result<Rc<RefCell<T>>, ConversionError> {
        self.with_object(|object| {
            if object.tag() != tag {
                return Err(ConversionError::WrongType {
                    position: self.position,
                    expected: tag.to_owned(),
                    actual: object.tag().to_owned(),
                });
            }
            object.downcast::<T>().ok_or_else(|| ConversionError::WrongType {
                position: self.position,
                expected: format!("{tag} ({})", type_name::<T>()),
                actual: object.tag().to_owned(),
            })
        })
    }

    fn with_object<R>(
        &self,
        f: impl FnOnce(&Object) -> Result<R, ConversionError>,
    ) -> Result<R, ConversionError> {
        match self.value() {
            Some(Value::UserData(ud)) => match ud.borrow::<Object>() {
                Ok(object) => f(&object),
                Err(_) => Err(ConversionError::WrongType {
                    position: self.position,
                    expected: "host object".to_owned(),
                    actual: "userdata".to_owned(),
                }),
            },
            other => Err(self.mismatch("host object", other.as_ref())),
        }
    }

    fn mismatch(&self, expected: &'static str, actual: Option<&Value>) -> ConversionError {
        ConversionError::TypeMismatch {
            position: self.position,
            expected,
            actual: actual.map(kind_of).unwrap_or(NO_VALUE),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) | Value::Number(_) => "number",
        other => other.type_name(),
    }
}

impl fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("position", &self.position)
            .field("kind", &self.kind())
            .finish()
    }
}
