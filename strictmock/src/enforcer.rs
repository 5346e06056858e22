// vim: tw=80
//! Call-time enforcement of strict stubbing

use std::sync::{Arc, Mutex};

use tracing::{trace, warn};

use crate::{
    error::{Error, Result},
    invocation::AnyArgs,
    method::Method,
    mock::MockState,
    strictness::Strictness,
    stubbing::{Response, StubbingHandle}
};

/// The engine's reply to an intercepted call.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum Answer<O> {
    /// A stubbing matched, and this is its response.
    Stubbed(O),
    /// No stubbing matched.  The mock should fall back to its default
    /// behavior.
    Unstubbed,
}

impl<O> Answer<O> {
    pub fn is_stubbed(&self) -> bool {
        matches!(self, Answer::Stubbed(_))
    }

    pub fn stubbed(self) -> Option<O> {
        match self {
            Answer::Stubbed(o) => Some(o),
            Answer::Unstubbed => None
        }
    }

    /// Use the stubbed value, or `O::default()` for an unstubbed call.
    pub fn unwrap_or_default(self) -> O
        where O: Default
    {
        self.stubbed().unwrap_or_default()
    }

    pub fn unwrap_or_else<F: FnOnce() -> O>(self, f: F) -> O {
        self.stubbed().unwrap_or_else(f)
    }
}

/// What the enforcer decided for one call.
pub(crate) struct Decision<I, O> {
    pub(crate) stubbing: Option<(StubbingHandle, Arc<Mutex<Response<I, O>>>)>,
}

/// Run the strictness decision for one call and record its outcome.
///
/// The first matching stubbing, in declaration order, is marked used and its
/// response returned.  If none matches but the method still has unused strict
/// stubbings, the call is most likely using stale arguments: under
/// `StrictStubs` it fails right here and is not recorded.
pub(crate) fn intercept<I, O>(target: &mut MockState,
                              strictness: Strictness,
                              seq: u64,
                              method: &Method<I, O>,
                              args: &Arc<I>) -> Result<Decision<I, O>>
    where I: AnyArgs, O: 'static
{
    let signature = method.signature();
    if let Some(handle) = target.registry.find_first_match(method, &**args) {
        target.registry.mark_used(handle);
        target.log.record(seq, signature, args.clone(), true);
        trace!(mock = %target.name, method = method.name(), args = ?args,
            "call matched stubbing {}", handle.index);
        let stubbing = target.registry.response(handle)
            .map(|response| (handle, response));
        return Ok(Decision{stubbing});
    }

    if strictness.reports() {
        let conflicts = target.registry.potential_mismatches(method, &**args);
        if !conflicts.is_empty() {
            let invocation = format!("{}({:?})", method.name(), args);
            if strictness.fails_on_mismatch() {
                return Err(Error::StubbingMismatch {
                    mock: target.name.to_string(),
                    invocation,
                    stubbings: conflicts.into()
                });
            }
            warn!(mock = %target.name, "potential stubbing problem: {} \
                matches none of {} stubbing(s) of that method",
                invocation, conflicts.len());
        }
    }

    target.log.record(seq, signature, args.clone(), false);
    trace!(mock = %target.name, method = method.name(), args = ?args,
        "unstubbed call");
    Ok(Decision{stubbing: None})
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{matcher::Matcher, mock::MockId};

    const SIMPLE: Method<i32, String> = Method::new("simple_method");

    fn target() -> MockState {
        MockState::new(0, MockId(0), "mock".into(), None)
    }

    fn stub(target: &mut MockState, x: i32) -> StubbingHandle {
        target.registry.register(&SIMPLE, Matcher::eq(x),
            Response::constant(x.to_string()), false)
    }

    #[test]
    fn match_marks_used_and_records() {
        let mut t = target();
        let h = stub(&mut t, 100);
        let d = intercept(&mut t, Strictness::StrictStubs, 0, &SIMPLE,
            &Arc::new(100)).unwrap();
        assert_eq!(Some(h), d.stubbing.map(|(h, _)| h));
        assert!(t.registry.get(h).unwrap().is_used());
        assert!(t.log.unaccounted().next().is_none());
    }

    #[test]
    fn mismatch_fails_without_recording() {
        let mut t = target();
        stub(&mut t, 100);
        let r = intercept(&mut t, Strictness::StrictStubs, 0, &SIMPLE,
            &Arc::new(200));
        match r {
            Err(Error::StubbingMismatch{mock, invocation, stubbings}) => {
                assert_eq!("mock", mock);
                assert_eq!("simple_method(200)", invocation);
                assert_eq!(1, stubbings.len());
            },
            _ => panic!("expected a stubbing mismatch")
        }
        assert!(t.log.is_empty());
    }

    #[test]
    fn mismatch_after_use_is_allowed() {
        let mut t = target();
        stub(&mut t, 100);
        intercept(&mut t, Strictness::StrictStubs, 0, &SIMPLE, &Arc::new(100))
            .unwrap();
        let d = intercept(&mut t, Strictness::StrictStubs, 1, &SIMPLE,
            &Arc::new(200)).unwrap();
        assert!(d.stubbing.is_none());
        assert_eq!(1, t.log.unaccounted().count());
    }

    #[test]
    fn lenient_and_warn_never_fail() {
        for s in [Strictness::Lenient, Strictness::Warn] {
            let mut t = target();
            stub(&mut t, 100);
            let d = intercept(&mut t, s, 0, &SIMPLE, &Arc::new(200)).unwrap();
            assert!(d.stubbing.is_none());
            assert_eq!(1, t.log.unaccounted().count());
        }
    }

    #[test]
    fn answer_helpers() {
        assert_eq!(5, Answer::Stubbed(5).unwrap_or_default());
        assert_eq!(0, Answer::<i32>::Unstubbed.unwrap_or_default());
        assert_eq!(9, Answer::Unstubbed.unwrap_or_else(|| 9));
        assert!(Answer::Stubbed(()).is_stubbed());
    }
}
