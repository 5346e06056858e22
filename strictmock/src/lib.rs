// vim: tw=80
//! Strict stubbing and verification for mock objects.
//!
//! Strictmock is the engine behind a test double.  It observes the calls made
//! on mock objects during a test, answers them from the stubbings the test
//! declared, and catches two kinds of stale test code:
//!
//! * stubbings that are declared but never exercised ("unnecessary
//!   stubbing"), reported when the test finishes, and
//! * calls to a stubbed method whose arguments match none of its stubbings
//!   ("potential stubbing problem"), reported at the very call that went
//!   wrong.
//!
//! It also answers explicit verification queries ("this call happened"), and
//! treats every stubbed call as already verified.
//!
//! # User Guide
//!
//! * [`Sessions`](#sessions)
//! * [`Writing a mock`](#writing-a-mock)
//! * [`Stubbing`](#stubbing)
//! * [`Strictness`](#strictness)
//! * [`Verification`](#verification)
//! * [`Finishing`](#finishing)
//!
//! ## Sessions
//!
//! Everything happens inside a [`Session`], which scopes mocks to one test.
//! There is no global state: every mock, stubbing, and verification is tied to
//! the session that created it.
//!
//! ```
//! # use strictmock::*;
//! let session = start_session("no_interactions", Strictness::StrictStubs);
//! let _mock = session.mock("mock").unwrap();
//! session.finish().unwrap();
//! ```
//!
//! ## Writing a mock
//!
//! Strictmock does not generate code.  A mock is an ordinary struct that holds
//! its session and a [`Mock`] handle, and forwards each method to
//! [`Session::on_call`].  The [`Answer`] tells it whether a stubbing matched;
//! if none did, the mock falls back to a default.
//!
//! ```
//! # use strictmock::*;
//! const SIMPLE_METHOD: Method<i32, String> = Method::new("simple_method");
//!
//! struct MockMethods {
//!     session: Session,
//!     mock: Mock,
//! }
//!
//! impl MockMethods {
//!     fn simple_method(&self, x: i32) -> Result<String> {
//!         self.session.on_call(&self.mock, &SIMPLE_METHOD, x)
//!             .map(Answer::unwrap_or_default)
//!     }
//! }
//!
//! let session = start_session("few_interactions", Strictness::StrictStubs);
//! let mock = session.mock("mock").unwrap();
//! let m = MockMethods{session: session.clone(), mock};
//! assert_eq!("", m.simple_method(100).unwrap());
//! session.finish().unwrap();
//! ```
//!
//! ## Stubbing
//!
//! [`Session::stub`] declares a stubbing: an argument pattern and a response.
//! The pattern is any [`Predicate`] over the method's arguments; multiple
//! arguments are passed as a tuple.  Stubbings of the same method are tried in
//! declaration order, and the first match wins.
//!
//! ```
//! # use strictmock::*;
//! const COMBINE: Method<(u8, u8), u16> = Method::new("combine");
//!
//! let session = start_session("stubbing", Strictness::StrictStubs);
//! let mock = session.mock("mock").unwrap();
//! session.stub(&mock, &COMBINE)
//!     .withf(|(a, b)| a == b)
//!     .returning(|(a, _)| u16::from(*a) * 2)
//!     .unwrap();
//! session.stub(&mock, &COMBINE)
//!     .return_const(0)
//!     .unwrap();
//! assert_eq!(Answer::Stubbed(6), session.on_call(&mock, &COMBINE, (3, 3))
//!     .unwrap());
//! assert_eq!(Answer::Stubbed(0), session.on_call(&mock, &COMBINE, (3, 4))
//!     .unwrap());
//! session.finish().unwrap();
//! ```
//!
//! ## Strictness
//!
//! Under [`Strictness::StrictStubs`], the default, calling a stubbed method
//! with arguments that match none of its still-unused stubbings fails at once
//! with [`Error::StubbingMismatch`], and the call does not complete.
//! [`Strictness::Warn`] logs the same problems through `tracing` without
//! failing, and [`Strictness::Lenient`] ignores them.  A single mock can
//! override its session's strictness with
//! [`Session::mock_with_strictness`], and a single stubbing can opt out with
//! [`StubBuilder::lenient`].
//!
//! ```
//! # use strictmock::*;
//! const SIMPLE_METHOD: Method<i32, String> = Method::new("simple_method");
//!
//! let session = start_session("stubbing_argument_mismatch",
//!                             Strictness::StrictStubs);
//! let mock = session.mock("mock").unwrap();
//! session.stub(&mock, &SIMPLE_METHOD)
//!     .with(predicate::eq(100))
//!     .return_const("100".to_owned())
//!     .unwrap();
//! let r = session.on_call(&mock, &SIMPLE_METHOD, 200);
//! assert!(matches!(r, Err(Error::StubbingMismatch{..})));
//! ```
//!
//! ## Verification
//!
//! [`Session::verify`] checks how often a call pattern happened, using a
//! [`VerificationMode`] such as [`times`], [`never`] or [`at_least`].
//! [`Session::verify_no_more_interactions`] then fails if any call was neither
//! stubbed nor verified.  The relative order of calls can be checked with
//! [`Session::in_order`].
//!
//! ```
//! # use strictmock::*;
//! const SIMPLE_METHOD: Method<i32, String> = Method::new("simple_method");
//! const OTHER_METHOD: Method<(), String> = Method::new("other_method");
//!
//! let session = start_session("few_verified_interactions",
//!                             Strictness::StrictStubs);
//! let mock = session.mock("mock").unwrap();
//! session.on_call(&mock, &SIMPLE_METHOD, 100).unwrap().unwrap_or_default();
//! session.on_call(&mock, &OTHER_METHOD, ()).unwrap().unwrap_or_default();
//!
//! session.verify(&mock, &SIMPLE_METHOD, predicate::eq(100), once()).unwrap();
//! session.verify(&mock, &OTHER_METHOD, predicate::always(), once()).unwrap();
//! session.verify_no_more_interactions(&mock).unwrap();
//! session.finish().unwrap();
//! ```
//!
//! ## Finishing
//!
//! [`Session::finish`] runs the end-of-session check exactly once, failing
//! with [`Error::UnnecessaryStubbing`] if any strict stubbing went unused.  A
//! test that may itself fail should use [`Session::finish_with`], or let
//! [`runner::run`] drive the whole test: the session is checked even when the
//! test failed first, and both failures are returned together in
//! [`Failures`].

use std::sync::{Mutex, MutexGuard, PoisonError};

mod enforcer;
mod error;
mod invocation;
mod matcher;
mod method;
mod mock;
pub mod runner;
mod session;
mod strictness;
mod stubbing;
mod verification;

pub use enforcer::Answer;
pub use error::{Error, Failure, Failures, Listing, Result};
pub use matcher::Matcher;
pub use method::{Method, Signature};
pub use mock::{Mock, MockId};
pub use predicates::prelude::{Predicate, predicate};
pub use session::{Session, SessionBuilder, StubBuilder, start_session};
pub use strictness::Strictness;
pub use stubbing::{Response, StubbingHandle};
pub use verification::{
    InOrder,
    VerificationMode,
    at_least,
    at_least_once,
    at_most,
    never,
    once,
    times
};

/// Lock a mutex even if a panicking test poisoned it.  A session must remain
/// usable, and finishable, after its test panicked.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
