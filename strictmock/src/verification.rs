// vim: tw=80
//! Explicit verification of calls
//!
//! Calls that were bound to a stubbing count as implicitly verified: a call
//! you stubbed is a call you clearly expected.  Every other call must be
//! verified explicitly before
//! [`verify_no_more_interactions`](crate::Session::verify_no_more_interactions)
//! will pass.

use std::{fmt, ops::RangeInclusive};

use tracing::trace;

use crate::{
    error::{Error, Result},
    matcher::Matcher,
    method::Method,
    mock::{Mock, MockId},
    session::Session,
    Predicate
};

/// How many times a verified call pattern must have happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationMode {
    range: RangeInclusive<usize>
}

impl VerificationMode {
    pub fn is_satisfied_by(&self, count: usize) -> bool {
        self.range.contains(&count)
    }
}

impl Default for VerificationMode {
    fn default() -> Self {
        once()
    }
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (start, end) = (*self.range.start(), *self.range.end());
        if start == end {
            if start == 0 {
                f.write_str("never")
            } else {
                write!(f, "exactly {} time(s)", start)
            }
        } else if end == usize::MAX {
            write!(f, "at least {} time(s)", start)
        } else if start == 0 {
            write!(f, "at most {} time(s)", end)
        } else {
            write!(f, "between {} and {} time(s)", start, end)
        }
    }
}

/// Exactly `n` calls
pub fn times(n: usize) -> VerificationMode {
    VerificationMode{range: n..=n}
}

/// Exactly one call.  Shortcut for [`times(1)`](fn.times.html).
pub fn once() -> VerificationMode {
    times(1)
}

/// No calls at all
pub fn never() -> VerificationMode {
    times(0)
}

pub fn at_least(n: usize) -> VerificationMode {
    VerificationMode{range: n..=usize::MAX}
}

pub fn at_least_once() -> VerificationMode {
    at_least(1)
}

pub fn at_most(n: usize) -> VerificationMode {
    VerificationMode{range: 0..=n}
}

impl Session {
    /// Check that `mock` received calls to `method` with arguments matching
    /// `p` as many times as `mode` requires.
    ///
    /// The matching calls are marked as verified either way, so that a failed
    /// verification is not reported a second time by
    /// [`verify_no_more_interactions`](#method.verify_no_more_interactions).
    pub fn verify<I, O, P>(&self,
                           mock: &Mock,
                           method: &Method<I, O>,
                           p: P,
                           mode: VerificationMode) -> Result<()>
        where I: fmt::Debug + Send + Sync + 'static,
              O: 'static,
              P: Predicate<I> + Send + 'static
    {
        let matcher = Matcher::new(p);
        let mut state = self.state();
        let target = self.target(&mut state, mock)?;
        let found = target.log.matching(method, &matcher, None);
        target.log.mark_verified(&found);
        trace!(mock = %mock, method = method.name(), found = found.len(),
            "verified");
        if mode.is_satisfied_by(found.len()) {
            Ok(())
        } else {
            Err(Error::VerificationCountMismatch {
                mock: mock.name().to_owned(),
                wanted: format!("{}({})", method.name(), matcher),
                expected: mode.to_string(),
                actual: found.len()
            })
        }
    }

    /// Fail if `mock` received any call that was neither bound to a stubbing
    /// nor explicitly verified.
    pub fn verify_no_more_interactions(&self, mock: &Mock) -> Result<()> {
        let mut state = self.state();
        let target = self.target(&mut state, mock)?;
        let unaccounted: Vec<String> = target.log.unaccounted()
            .map(ToString::to_string)
            .collect();
        if unaccounted.is_empty() {
            Ok(())
        } else {
            Err(Error::UnexpectedInteraction {
                mock: mock.name().to_owned(),
                invocations: unaccounted.into()
            })
        }
    }

    /// Fail if `mock` received any call at all, stubbed or not.
    pub fn verify_no_interactions(&self, mock: &Mock) -> Result<()> {
        let mut state = self.state();
        let target = self.target(&mut state, mock)?;
        if target.log.is_empty() {
            Ok(())
        } else {
            let all: Vec<String> = target.log.iter()
                .map(ToString::to_string)
                .collect();
            Err(Error::UnexpectedInteraction {
                mock: mock.name().to_owned(),
                invocations: all.into()
            })
        }
    }

    /// Forget the calls recorded so far on `mock`.  Its stubbings, and
    /// whether they were used, are unaffected.
    pub fn clear_invocations(&self, mock: &Mock) -> Result<()> {
        let mut state = self.state();
        self.ensure_open(&state)?;
        let target = self.target(&mut state, mock)?;
        target.log.clear();
        Ok(())
    }

    /// Start verifying the relative order of calls on `mocks`.
    pub fn in_order<'a>(&'a self, mocks: &[&Mock]) -> InOrder<'a> {
        InOrder {
            session: self,
            mocks: mocks.iter()
                .filter(|m| m.session == self.id())
                .map(|m| m.id)
                .collect(),
            cursor: None
        }
    }
}

/// Verifies that calls happened in a particular order.
///
/// Each verification only considers calls made after the last call matched
/// by the previous verification through the same `InOrder`.
///
/// # Examples
/// ```
/// # use strictmock::*;
/// const OPEN: Method<(), ()> = Method::new("open");
/// const CLOSE: Method<(), ()> = Method::new("close");
///
/// let session = start_session("doc", Strictness::StrictStubs);
/// let file = session.mock("file").unwrap();
/// session.on_call(&file, &OPEN, ()).unwrap().unwrap_or_default();
/// session.on_call(&file, &CLOSE, ()).unwrap().unwrap_or_default();
///
/// let mut in_order = session.in_order(&[&file]);
/// in_order.verify(&file, &OPEN, predicate::always(), once()).unwrap();
/// in_order.verify(&file, &CLOSE, predicate::always(), once()).unwrap();
/// session.finish().unwrap();
/// ```
pub struct InOrder<'a> {
    session: &'a Session,
    mocks: Vec<MockId>,
    /// Sequence number of the last call verified so far
    cursor: Option<u64>,
}

impl<'a> InOrder<'a> {
    pub fn verify<I, O, P>(&mut self,
                           mock: &Mock,
                           method: &Method<I, O>,
                           p: P,
                           mode: VerificationMode) -> Result<()>
        where I: fmt::Debug + Send + Sync + 'static,
              O: 'static,
              P: Predicate<I> + Send + 'static
    {
        if mock.session != self.session.id() || !self.mocks.contains(&mock.id)
        {
            return Err(Error::ForeignMock {
                mock: mock.name().to_owned(),
                scope: "this in-order verification".to_owned()
            });
        }
        let matcher = Matcher::new(p);
        let mut state = self.session.state();
        let target = self.session.target(&mut state, mock)?;
        let found = target.log.matching(method, &matcher, self.cursor);
        // Like `Session::verify`, a failed check still accounts for the calls
        // it found.  The cursor only moves on success.
        target.log.mark_verified(&found);
        if !mode.is_satisfied_by(found.len()) {
            let wanted = format!("{}({})", method.name(), matcher);
            let total = target.log.matching(method, &matcher, None).len();
            return Err(if mode.is_satisfied_by(total) {
                Error::VerificationOrder {
                    mock: mock.name().to_owned(),
                    wanted,
                    expected: mode.to_string(),
                    actual: found.len()
                }
            } else {
                Error::VerificationCountMismatch {
                    mock: mock.name().to_owned(),
                    wanted,
                    expected: mode.to_string(),
                    actual: total
                }
            });
        }
        let last = found.iter()
            .filter_map(|&i| target.log.get(i))
            .map(|inv| inv.seq)
            .max();
        if last.is_some() {
            self.cursor = last;
        }
        Ok(())
    }
}
