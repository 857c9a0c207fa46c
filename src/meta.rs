use std::fmt::{self, Display, Formatter};

/// Attribute value.
///
/// Values borrow their string data from the call site, so attaching them never allocates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    String(&'a str),
}

impl<'a> From<()> for Value<'a> {
    fn from(_: ()) -> Value<'a> {
        Value::Nil
    }
}

impl<'a> From<bool> for Value<'a> {
    fn from(val: bool) -> Value<'a> {
        Value::Bool(val)
    }
}

macro_rules! from_signed {
    ($($ty:ty)*) => {$(
        impl<'a> From<$ty> for Value<'a> {
            fn from(val: $ty) -> Value<'a> {
                Value::Signed(val as i64)
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($ty:ty)*) => {$(
        impl<'a> From<$ty> for Value<'a> {
            fn from(val: $ty) -> Value<'a> {
                Value::Unsigned(val as u64)
            }
        }
    )*};
}

macro_rules! from_float {
    ($($ty:ty)*) => {$(
        impl<'a> From<$ty> for Value<'a> {
            fn from(val: $ty) -> Value<'a> {
                Value::Float(val.into())
            }
        }
    )*};
}

from_signed!(i8 i16 i32 i64 isize);
from_unsigned!(u8 u16 u32 u64 usize);
from_float!(f32 f64);

impl<'a> From<&'a str> for Value<'a> {
    fn from(val: &'a str) -> Value<'a> {
        Value::String(val)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(val: &'a String) -> Value<'a> {
        Value::String(val.as_str())
    }
}

impl<'a> Display for Value<'a> {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), fmt::Error> {
        match *self {
            Value::Nil => fmt.pad("nil"),
            Value::Bool(val) => Display::fmt(&val, fmt),
            Value::Signed(val) => Display::fmt(&val, fmt),
            Value::Unsigned(val) => Display::fmt(&val, fmt),
            Value::Float(val) => Display::fmt(&val, fmt),
            Value::String(val) => fmt.pad(val),
        }
    }
}

/// Meta information (also known as attribute).
///
/// There are some predefined attributes: message, severity, timestamp, module, line and thread.
/// All other are represented using this struct and travel with the record they are attached to.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Meta<'a> {
    /// Name.
    pub name: &'static str,
    pub value: Value<'a>,
}

impl<'a> Meta<'a> {
    /// Constructs a new Meta struct with the given name and value.
    #[inline]
    pub fn new<V>(name: &'static str, value: V) -> Meta<'a>
        where V: Into<Value<'a>>
    {
        Meta {
            name,
            value: value.into(),
        }
    }
}
