// vim: tw=80
//! Test-harness integration
//!
//! These functions play the part of a test runner's setup and teardown hooks.
//! They start a session, run the test body, and always finish the session
//! afterwards, even if the body failed or panicked.  Every failure is kept.
//!
//! # Examples
//! ```
//! use strictmock::{Method, predicate, runner};
//!
//! const SIMPLE_METHOD: Method<&'static str, String> =
//!     Method::new("simple_method");
//!
//! let r = runner::run_strict("argument_mismatch", |session| {
//!     let mock = session.mock("mock")?;
//!     session.stub(&mock, &SIMPLE_METHOD)
//!         .with(predicate::eq("1"))
//!         .return_const("one".to_owned())?;
//!     Err::<(), _>(strictmock::Failure::test("IllegalState"))
//! });
//! // Both the test's own failure and the unused stubbing are reported.
//! assert_eq!(2, r.unwrap_err().len());
//! ```

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe}
};

use crate::{
    error::{Failure, Failures},
    session::{Session, SessionBuilder},
    strictness::Strictness
};

/// Run `body` in a new session configured by `builder`.
///
/// A panic in `body` is caught and reported as [`Failure::Panic`].  The
/// session is finished in every case, and its own failure, if any, is appended
/// after the body's.
pub fn run<T, E, F>(builder: SessionBuilder, body: F) -> Result<T, Failures>
    where F: FnOnce(&Session) -> Result<T, E>,
          E: Into<Failure>
{
    let session = builder.start();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&session)));
    let outcome = match outcome {
        Ok(r) => r.map_err(Into::into),
        Err(payload) => Err(Failure::Panic(panic_message(payload.as_ref())))
    };
    session.finish_with(outcome)
}

/// Like [`run`], with a [`Strictness::StrictStubs`] session named `owner`.
pub fn run_strict<T, E, F, S>(owner: S, body: F) -> Result<T, Failures>
    where F: FnOnce(&Session) -> Result<T, E>,
          E: Into<Failure>,
          S: Into<String>
{
    let builder = Session::builder()
        .owner(owner)
        .strictness(Strictness::StrictStubs);
    run(builder, body)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
