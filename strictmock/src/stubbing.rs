// vim: tw=80
//! Declared stubbings and their answers

use std::{
    fmt,
    mem,
    sync::{Arc, Mutex}
};

use downcast::*;
use fragile::Fragile;

use crate::{
    matcher::Matcher,
    method::{Method, Signature},
    mock::MockId
};

/// What a stubbing produces when a matching call arrives.
pub enum Response<I, O> {
    // A `once` response that has already answered
    Expired,
    Mut(Box<dyn FnMut(&I) -> O + Send>),
    Once(Box<dyn FnOnce(&I) -> O + Send>),
}

impl<I, O> Response<I, O> {
    /// Always answer with a clone of `c`.
    pub fn constant(c: O) -> Self
        where I: 'static, O: Clone + Send + 'static
    {
        Response::Mut(Box::new(move |_: &I| c.clone()))
    }

    /// Compute the answer from the call's arguments.
    pub fn from_fn<F>(f: F) -> Self
        where F: FnMut(&I) -> O + Send + 'static
    {
        Response::Mut(Box::new(f))
    }

    /// Answer a single call.  Useful for return types that aren't `Clone`.
    pub fn once<F>(f: F) -> Self
        where F: FnOnce(&I) -> O + Send + 'static
    {
        Response::Once(Box::new(f))
    }

    /// Single-threaded version of [`from_fn`](#method.from_fn), for closures
    /// that aren't `Send`.
    ///
    /// It is a runtime error to call the mock method from a different thread
    /// than the one that declared the stubbing.
    pub fn from_fn_st<F>(f: F) -> Self
        where F: FnMut(&I) -> O + 'static, I: 'static, O: 'static
    {
        let mut fragile = Fragile::new(f);
        Response::Mut(Box::new(move |i: &I| (fragile.get_mut())(i)))
    }

    /// Produce an answer, or `None` if a `once` response was already used.
    pub(crate) fn call(&mut self, i: &I) -> Option<O> {
        if let Response::Mut(f) = self {
            return Some(f(i));
        }
        match mem::replace(self, Response::Expired) {
            Response::Once(f) => Some(f(i)),
            _ => None
        }
    }
}

impl<I, O> fmt::Debug for Response<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Response::Expired => "Expired",
            Response::Mut(_) => "Mut",
            Response::Once(_) => "Once",
        };
        f.write_str(s)
    }
}

/// Refers to one declared stubbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StubbingHandle {
    pub(crate) session: u64,
    pub(crate) mock: MockId,
    pub(crate) index: usize,
}

/// The typed half of a stubbing, erased so that stubbings of every method can
/// live in one list.
pub(crate) trait AnyStub: Any + Send {}
downcast!(dyn AnyStub);

struct TypedStub<I, O> {
    matcher: Matcher<I>,
    response: Arc<Mutex<Response<I, O>>>,
}

impl<I: 'static, O: 'static> AnyStub for TypedStub<I, O> {}

pub(crate) struct StubEntry {
    signature: Signature,
    description: String,
    used: bool,
    lenient: bool,
    stub: Box<dyn AnyStub>,
}

impl StubEntry {
    fn typed<I: 'static, O: 'static>(&self) -> Option<&TypedStub<I, O>> {
        let stub: Option<&TypedStub<I, O>> = self.stub.downcast_ref().ok();
        stub
    }

    pub(crate) fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn is_lenient(&self) -> bool {
        self.lenient
    }

    pub(crate) fn is_used(&self) -> bool {
        self.used
    }
}

/// Every stubbing declared on one mock, in declaration order.
pub(crate) struct StubbingRegistry {
    session: u64,
    mock: MockId,
    entries: Vec<StubEntry>,
}

impl StubbingRegistry {
    pub(crate) fn new(session: u64, mock: MockId) -> Self {
        StubbingRegistry{session, mock, entries: Vec::new()}
    }

    fn handle(&self, index: usize) -> StubbingHandle {
        StubbingHandle{session: self.session, mock: self.mock, index}
    }

    /// Is `handle` one of this registry's own?
    fn owns(&self, handle: StubbingHandle) -> bool {
        handle.session == self.session && handle.mock == self.mock
    }

    pub(crate) fn register<I, O>(&mut self,
                                 method: &Method<I, O>,
                                 matcher: Matcher<I>,
                                 response: Response<I, O>,
                                 lenient: bool) -> StubbingHandle
        where I: 'static, O: 'static
    {
        let handle = self.handle(self.entries.len());
        let description = format!("{}({})", method.name(), matcher);
        let stub = TypedStub {
            matcher,
            response: Arc::new(Mutex::new(response))
        };
        self.entries.push(StubEntry {
            signature: method.signature(),
            description,
            used: false,
            lenient,
            stub: Box::new(stub)
        });
        handle
    }

    /// The first stubbing, in declaration order, whose pattern matches `args`.
    pub(crate) fn find_first_match<I, O>(&self, method: &Method<I, O>, args: &I)
        -> Option<StubbingHandle>
        where I: 'static, O: 'static
    {
        let signature = method.signature();
        self.entries.iter()
            .position(|e| e.signature == signature &&
                e.typed::<I, O>().is_some_and(|s| s.matcher.matches(args)))
            .map(|index| self.handle(index))
    }

    pub(crate) fn mark_used(&mut self, handle: StubbingHandle) {
        if !self.owns(handle) {
            return;
        }
        if let Some(e) = self.entries.get_mut(handle.index) {
            e.used = true;
        }
    }

    pub(crate) fn get(&self, handle: StubbingHandle) -> Option<&StubEntry> {
        if !self.owns(handle) {
            return None;
        }
        self.entries.get(handle.index)
    }

    pub(crate) fn response<I, O>(&self, handle: StubbingHandle)
        -> Option<Arc<Mutex<Response<I, O>>>>
        where I: 'static, O: 'static
    {
        self.get(handle)
            .and_then(StubEntry::typed::<I, O>)
            .map(|s| s.response.clone())
    }

    /// Every stubbing that no call has used yet, in declaration order.
    pub(crate) fn unused_stubbings(&self) -> Vec<StubbingHandle> {
        self.entries.iter()
            .enumerate()
            .filter(|(_, e)| !e.used)
            .map(|(index, _)| self.handle(index))
            .collect()
    }

    /// Describe the strict stubbings of `method` that a call with `args` was
    /// probably meant to hit: unused, not lenient, and with the same
    /// signature.
    pub(crate) fn potential_mismatches<I, O>(&self,
                                             method: &Method<I, O>,
                                             args: &I) -> Vec<String>
        where I: 'static, O: 'static
    {
        let signature = method.signature();
        self.entries.iter()
            .filter(|e| e.signature == signature && !e.used && !e.lenient)
            .map(|e| {
                match e.typed::<I, O>().and_then(|s| s.matcher.explain(args)) {
                    Some(why) => format!("{}\n{}", e.description, why),
                    None => e.description.clone()
                }
            }).collect()
    }
}

#[cfg(test)]
mod t {
    use super::*;

    const SIMPLE: Method<i32, String> = Method::new("simple_method");
    const OTHER: Method<(), String> = Method::new("other_method");

    fn registry() -> StubbingRegistry {
        StubbingRegistry::new(0, MockId(0))
    }

    fn answer(r: &StubbingRegistry, h: StubbingHandle, args: i32) -> String {
        let response = r.response::<i32, String>(h).unwrap();
        let mut guard = response.lock().unwrap();
        guard.call(&args).unwrap()
    }

    #[test]
    fn register_starts_unused() {
        let mut r = registry();
        let h = r.register(&SIMPLE, Matcher::eq(100),
            Response::constant("100".to_owned()), false);
        assert!(!r.get(h).unwrap().is_used());
        assert_eq!(vec![h], r.unused_stubbings());
    }

    #[test]
    fn declaration_order_wins() {
        let mut r = registry();
        let first = r.register(&SIMPLE, Matcher::eq(5),
            Response::constant("first".to_owned()), false);
        let _second = r.register(&SIMPLE, Matcher::any(),
            Response::constant("second".to_owned()), false);
        let h = r.find_first_match(&SIMPLE, &5).unwrap();
        assert_eq!(first, h);
        assert_eq!("first", answer(&r, h, 5));
    }

    #[test]
    fn find_does_not_mutate() {
        let mut r = registry();
        let h = r.register(&SIMPLE, Matcher::eq(5),
            Response::constant(String::new()), false);
        assert_eq!(Some(h), r.find_first_match(&SIMPLE, &5));
        assert_eq!(vec![h], r.unused_stubbings());
    }

    #[test]
    fn find_ignores_other_signatures() {
        let mut r = registry();
        r.register(&OTHER, Matcher::any(), Response::constant(String::new()),
            false);
        assert!(r.find_first_match(&SIMPLE, &5).is_none());
    }

    #[test]
    fn mark_used_is_idempotent() {
        let mut r = registry();
        let h = r.register(&SIMPLE, Matcher::eq(5),
            Response::constant(String::new()), false);
        r.mark_used(h);
        r.mark_used(h);
        assert!(r.get(h).unwrap().is_used());
        assert!(r.unused_stubbings().is_empty());
    }

    #[test]
    fn potential_mismatches_skip_used_and_lenient() {
        let mut r = registry();
        let used = r.register(&SIMPLE, Matcher::eq(1),
            Response::constant(String::new()), false);
        r.register(&SIMPLE, Matcher::eq(2),
            Response::constant(String::new()), true);
        r.register(&SIMPLE, Matcher::eq(3),
            Response::constant(String::new()), false);
        r.mark_used(used);
        let m = r.potential_mismatches(&SIMPLE, &4);
        assert_eq!(1, m.len());
        assert!(m[0].starts_with("simple_method(var == 3)"), "{}", m[0]);
    }

    #[test]
    fn foreign_handles_are_unknown() {
        let mut r = registry();
        let mut other = StubbingRegistry::new(1, MockId(0));
        r.register(&SIMPLE, Matcher::eq(5), Response::constant(String::new()),
            false);
        let h = other.register(&SIMPLE, Matcher::eq(5),
            Response::constant(String::new()), false);
        assert!(r.get(h).is_none());
        assert!(r.response::<i32, String>(h).is_none());
        r.mark_used(h);
        assert_eq!(1, r.unused_stubbings().len());
    }

    #[test]
    fn response_is_typed() {
        let mut r = registry();
        let h = r.register(&SIMPLE, Matcher::eq(5),
            Response::constant(String::new()), false);
        assert!(r.response::<i32, String>(h).is_some());
        assert!(r.response::<u32, String>(h).is_none());
    }

    #[test]
    fn once_expires() {
        let mut resp = Response::<i32, String>::once(|x| x.to_string());
        assert_eq!(Some("4".to_owned()), resp.call(&4));
        assert_eq!(None, resp.call(&4));
    }

    #[test]
    fn from_fn_sees_arguments() {
        let mut count = 0;
        let mut resp = Response::<i32, i32>::from_fn(move |x| {
            count += x;
            count
        });
        assert_eq!(Some(5), resp.call(&5));
        assert_eq!(Some(10), resp.call(&5));
    }

    #[test]
    fn from_fn_st() {
        let rc = std::rc::Rc::new(7);
        let mut resp = Response::<(), i32>::from_fn_st(move |_| *rc);
        assert_eq!(Some(7), resp.call(&()));
    }
}
