// vim: tw=80
//! Descriptors for the methods of a mock object.

use std::{
    any::{self, TypeId},
    fmt,
    marker::PhantomData
};

/// A mockable method, typed by its argument tuple `I` and its return type `O`.
///
/// Hand-written mocks usually declare one `const` per method and pass it to
/// every [`Session`](crate::Session) operation that concerns that method.
///
/// ```
/// # use strictmock::Method;
/// // fn simple_method(&self, x: i32) -> String
/// const SIMPLE_METHOD: Method<i32, String> = Method::new("simple_method");
/// // fn combine(&self, a: u8, b: u8) -> u16
/// const COMBINE: Method<(u8, u8), u16> = Method::new("combine");
/// ```
pub struct Method<I, O> {
    name: &'static str,
    _types: PhantomData<fn(I) -> O>
}

impl<I, O> Method<I, O> {
    pub const fn new(name: &'static str) -> Self {
        Method{name, _types: PhantomData}
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<I: 'static, O: 'static> Method<I, O> {
    /// The type-erased signature: name plus argument and return types.
    pub fn signature(&self) -> Signature {
        Signature {
            name: self.name,
            args: TypeId::of::<I>(),
            ret: TypeId::of::<O>(),
            args_name: any::type_name::<I>(),
        }
    }
}

impl<I, O> Clone for Method<I, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, O> Copy for Method<I, O> {}

impl<I, O> fmt::Debug for Method<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("args", &any::type_name::<I>())
            .field("ret", &any::type_name::<O>())
            .finish()
    }
}

/// Identifies a method independently of its Rust types.
///
/// Two methods with the same name but different argument or return types are
/// different signatures, just like overloads.
#[derive(Clone, Copy, Debug)]
pub struct Signature {
    name: &'static str,
    args: TypeId,
    ret: TypeId,
    args_name: &'static str,
}

impl Signature {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args &&
            self.ret == other.ret
    }
}

impl Eq for Signature {}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args_name)
    }
}
