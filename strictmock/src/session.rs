// vim: tw=80
//! Mocking sessions
//!
//! A [`Session`] scopes a set of mocks to one test.  It owns their calls and
//! stubbings, applies its [`Strictness`] to every call, and checks for unused
//! stubbings exactly once, when the test finishes.

use std::{
    fmt,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicU64, Ordering}
    },
    thread
};

use tracing::{debug, warn};

use crate::{
    enforcer::{self, Answer},
    error::{Error, Failure, Failures, Result},
    invocation::AnyArgs,
    lock,
    matcher::Matcher,
    method::Method,
    mock::{Mock, MockId, MockState},
    predicate,
    strictness::Strictness,
    stubbing::{Response, StubbingHandle},
    Predicate
};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(0);

/// Lifecycle of a session.
///
/// `finish` moves from `Open` through `Finalizing` to `Closed` while holding
/// the state lock for the whole transition, so other callers only ever see
/// `Open` or `Closed`.  That single guarded transition is what makes `finish`
/// one-shot: exactly one caller finds the session `Open`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Accepting calls, stubbings and new mocks
    Open,
    /// Running the end-of-session checks
    Finalizing,
    Closed,
}

pub(crate) struct State {
    phase: Phase,
    mocks: Vec<MockState>,
    /// Sequence number for the next call on any of this session's mocks
    next_seq: u64,
}

impl State {
    fn ensure_open(&self, session: &str) -> Result<()> {
        if self.phase == Phase::Open {
            Ok(())
        } else {
            Err(Error::SessionClosed{session: session.to_owned()})
        }
    }
}

struct Inner {
    id: u64,
    name: String,
    strictness: Strictness,
    state: Mutex<State>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if state.phase == Phase::Open && !thread::panicking() {
            warn!(session = %self.name,
                "mocking session dropped without being finished");
        }
    }
}

/// Configures a new [`Session`].
#[derive(Clone, Debug)]
#[must_use]
pub struct SessionBuilder {
    owner: String,
    strictness: Strictness,
}

impl SessionBuilder {
    /// Name the session after the test that owns it.  The name appears in
    /// error messages and logs.
    pub fn owner<S: Into<String>>(mut self, owner: S) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn start(self) -> Session {
        let id = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        debug!(session = %self.owner, strictness = %self.strictness,
            "mocking session started");
        let state = State {
            phase: Phase::Open,
            mocks: Vec::new(),
            next_seq: 0
        };
        let inner = Inner {
            id,
            name: self.owner,
            strictness: self.strictness,
            state: Mutex::new(state)
        };
        Session{inner: Arc::new(inner)}
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        SessionBuilder {
            owner: "mocking session".to_owned(),
            strictness: Strictness::default()
        }
    }
}

/// Start a session for the test named `owner`.
pub fn start_session<S: Into<String>>(owner: S, strictness: Strictness)
    -> Session
{
    Session::builder()
        .owner(owner)
        .strictness(strictness)
        .start()
}

/// The scope of all mocks, stubbings and calls of one test.
///
/// Cloning a `Session` yields another handle to the same session, which is
/// how hand-written mocks keep a reference to it.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn strictness(&self) -> Strictness {
        self.inner.strictness
    }

    /// Has [`finish`](#method.finish) already been called?
    pub fn is_finished(&self) -> bool {
        self.state().phase != Phase::Open
    }

    /// Create a mock governed by the session's strictness.
    pub fn mock(&self, name: &str) -> Result<Mock> {
        self.add_mock(name, None)
    }

    /// Create a mock whose strictness overrides the session's.
    pub fn mock_with_strictness(&self, name: &str, strictness: Strictness)
        -> Result<Mock>
    {
        self.add_mock(name, Some(strictness))
    }

    fn add_mock(&self, name: &str, strictness: Option<Strictness>)
        -> Result<Mock>
    {
        let mut state = self.state();
        state.ensure_open(self.name())?;
        let id = MockId(state.mocks.len());
        let name: Arc<str> = name.into();
        state.mocks.push(MockState::new(self.inner.id, id, name.clone(),
                                        strictness));
        debug!(session = %self.name(), mock = %name, "mock created");
        Ok(Mock::new(id, self.inner.id, name))
    }

    /// Intercept a call on `mock`.
    ///
    /// This is what every method of a hand-written mock forwards to.  Returns
    /// the answer of the first matching stubbing, [`Answer::Unstubbed`] if
    /// there is none, or [`Error::StubbingMismatch`] if strict stubbing
    /// rejects the arguments.  A rejected call is not recorded.
    pub fn on_call<I, O>(&self, mock: &Mock, method: &Method<I, O>, args: I)
        -> Result<Answer<O>>
        where I: fmt::Debug + Send + Sync + 'static, O: 'static
    {
        let args = Arc::new(args);
        let mut state = self.state();
        state.ensure_open(self.name())?;
        let seq = state.next_seq;
        state.next_seq += 1;
        let target = self.target(&mut state, mock)?;
        let strictness = target.strictness(self.inner.strictness);
        let decision = enforcer::intercept(target, strictness, seq, method,
                                           &args)?;
        drop(state);

        // Answer with the session unlocked, so that answers may call other
        // mocks.
        let Some((handle, response)) = decision.stubbing else {
            return Ok(Answer::Unstubbed);
        };
        let answer = lock(&response).call(&args);
        match answer {
            Some(o) => Ok(Answer::Stubbed(o)),
            None => Err(Error::AnswerExhausted {
                mock: mock.name().to_owned(),
                stubbing: self.describe_stubbing(handle)
            })
        }
    }

    /// Declare a stubbing.  See also [`stub`](#method.stub), which offers a
    /// builder for the same thing.
    pub fn declare_stub<I, O>(&self,
                              mock: &Mock,
                              method: &Method<I, O>,
                              matcher: Matcher<I>,
                              response: Response<I, O>)
        -> Result<StubbingHandle>
        where I: fmt::Debug + Send + Sync + 'static, O: 'static
    {
        self.register(mock, method, matcher, response, false)
    }

    /// Start declaring a stubbing of `method` on `mock`.
    pub fn stub<'a, I, O>(&'a self, mock: &'a Mock, method: &Method<I, O>)
        -> StubBuilder<'a, I, O>
        where I: fmt::Debug + Send + Sync + 'static, O: 'static
    {
        StubBuilder {
            session: self,
            mock,
            method: *method,
            matcher: Matcher::any(),
            lenient: false
        }
    }

    fn register<I, O>(&self,
                      mock: &Mock,
                      method: &Method<I, O>,
                      matcher: Matcher<I>,
                      response: Response<I, O>,
                      lenient: bool) -> Result<StubbingHandle>
        where I: AnyArgs, O: 'static
    {
        let mut state = self.state();
        state.ensure_open(self.name())?;
        let target = self.target(&mut state, mock)?;
        let handle = target.registry.register(method, matcher, response,
                                              lenient);
        debug!(session = %self.name(), mock = %mock,
            stubbing = %self.describe_in(target, handle), lenient,
            "stubbing declared");
        Ok(handle)
    }

    /// Has any call used this stubbing yet?  Always `false` for a stubbing
    /// of another session.
    pub fn is_used(&self, handle: StubbingHandle) -> bool {
        if handle.session != self.inner.id {
            return false;
        }
        let state = self.state();
        state.mocks.get(handle.mock.0)
            .and_then(|m| m.registry.get(handle))
            .is_some_and(|e| e.is_used())
    }

    /// End the session, checking every mock for unused stubbings.
    ///
    /// The checks run only once.  Calling `finish` again returns
    /// [`Error::SessionClosed`].
    pub fn finish(&self) -> Result<()> {
        let unused = {
            let mut state = self.state();
            state.ensure_open(self.name())?;
            state.phase = Phase::Finalizing;
            let unused = self.unnecessary_stubbings(&state);
            state.phase = Phase::Closed;
            unused
        };
        debug!(session = %self.name(), unnecessary = unused.len(),
            "mocking session finished");
        if unused.is_empty() {
            Ok(())
        } else {
            Err(Error::UnnecessaryStubbing {
                session: self.name().to_owned(),
                stubbings: unused.into()
            })
        }
    }

    /// Finish the session after the test body produced `outcome`.
    ///
    /// The end-of-session checks run even if the test already failed.  When
    /// both fail, the test's own failure comes first, followed by the
    /// session's, and neither replaces the other.
    pub fn finish_with<T, E>(&self, outcome: std::result::Result<T, E>)
        -> std::result::Result<T, Failures>
        where E: Into<Failure>
    {
        let mut failures = Failures::default();
        let value = match outcome {
            Ok(v) => Some(v),
            Err(e) => {
                failures.push(e.into());
                None
            }
        };
        if let Err(e) = self.finish() {
            failures.push(Failure::Mocking(e));
        }
        match value {
            Some(v) if failures.is_empty() => Ok(v),
            _ => Err(failures)
        }
    }

    /// Describe every stubbing that should fail the session for being unused,
    /// and log the ones that only deserve a warning.
    fn unnecessary_stubbings(&self, state: &State) -> Vec<String> {
        let mut unused = Vec::new();
        for m in state.mocks.iter() {
            let strictness = m.strictness(self.inner.strictness);
            if !strictness.reports() {
                continue;
            }
            for handle in m.registry.unused_stubbings() {
                let Some(e) = m.registry.get(handle) else {
                    continue;
                };
                if e.is_lenient() {
                    continue;
                }
                let desc = format!("{}.{}", m.name, e.description());
                if strictness.fails_on_unused() {
                    unused.push(desc);
                } else {
                    warn!(session = %self.name(), "unnecessary stubbing: {}",
                        desc);
                }
            }
        }
        unused
    }

    fn describe_stubbing(&self, handle: StubbingHandle) -> String {
        let state = self.state();
        match state.mocks.get(handle.mock.0) {
            Some(m) => self.describe_in(m, handle),
            None => format!("stubbing #{}", handle.index)
        }
    }

    fn describe_in(&self, m: &MockState, handle: StubbingHandle) -> String {
        m.registry.get(handle)
            .map(|e| e.description().to_owned())
            .unwrap_or_else(|| format!("stubbing #{}", handle.index))
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.inner.state)
    }

    /// Look up the state of `mock`, provided this session owns it.
    pub(crate) fn target<'s>(&self, state: &'s mut State, mock: &Mock)
        -> Result<&'s mut MockState>
    {
        let foreign = || Error::ForeignMock {
            mock: mock.name().to_owned(),
            scope: format!("session {}", self.name())
        };
        if mock.session != self.inner.id {
            return Err(foreign());
        }
        state.mocks.get_mut(mock.id.0).ok_or_else(foreign)
    }

    pub(crate) fn ensure_open(&self, state: &State) -> Result<()> {
        state.ensure_open(self.name())
    }

    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.inner.name)
            .field("strictness", &self.inner.strictness)
            .finish()
    }
}

/// Builds a stubbing, registering it when the response is supplied.
///
/// # Examples
/// ```
/// # use strictmock::*;
/// const SIMPLE_METHOD: Method<i32, String> = Method::new("simple_method");
///
/// let session = start_session("doc", Strictness::StrictStubs);
/// let mock = session.mock("mock").unwrap();
/// session.stub(&mock, &SIMPLE_METHOD)
///     .with(predicate::eq(100))
///     .return_const("100".to_owned())
///     .unwrap();
/// let answer = session.on_call(&mock, &SIMPLE_METHOD, 100).unwrap();
/// assert_eq!(Answer::Stubbed("100".to_owned()), answer);
/// session.finish().unwrap();
/// ```
#[must_use = "a stubbing is only declared once its response is supplied"]
pub struct StubBuilder<'a, I, O> {
    session: &'a Session,
    mock: &'a Mock,
    method: Method<I, O>,
    matcher: Matcher<I>,
    lenient: bool,
}

impl<'a, I, O> StubBuilder<'a, I, O>
    where I: fmt::Debug + Send + Sync + 'static, O: 'static
{
    /// Set the argument pattern.  Without one, any arguments match.
    pub fn with<P>(mut self, p: P) -> Self
        where P: Predicate<I> + Send + 'static
    {
        self.matcher = Matcher::new(p);
        self
    }

    /// Match with a function of the arguments.
    pub fn withf<F>(mut self, f: F) -> Self
        where F: Fn(&I) -> bool + Send + 'static
    {
        self.matcher = Matcher::new(predicate::function(f));
        self
    }

    /// Match arguments equal to `args`.
    pub fn with_args(mut self, args: I) -> Self
        where I: PartialEq
    {
        self.matcher = Matcher::eq(args);
        self
    }

    /// Exempt this stubbing from strictness checks: it may go unused, and
    /// calls with other arguments are not treated as mismatches.
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    /// Register the stubbing with an arbitrary [`Response`].
    pub fn respond(self, response: Response<I, O>) -> Result<StubbingHandle> {
        self.session.register(self.mock, &self.method, self.matcher, response,
                              self.lenient)
    }

    /// Answer every matching call with a clone of `c`.
    pub fn return_const(self, c: O) -> Result<StubbingHandle>
        where O: Clone + Send
    {
        self.respond(Response::constant(c))
    }

    /// Compute the answer from the arguments.
    pub fn returning<F>(self, f: F) -> Result<StubbingHandle>
        where F: FnMut(&I) -> O + Send + 'static
    {
        self.respond(Response::from_fn(f))
    }

    /// Answer a single call.  A second matching call fails with
    /// [`Error::AnswerExhausted`].
    pub fn return_once<F>(self, f: F) -> Result<StubbingHandle>
        where F: FnOnce(&I) -> O + Send + 'static
    {
        self.respond(Response::once(f))
    }

    /// Single-threaded version of [`returning`](#method.returning).
    pub fn returning_st<F>(self, f: F) -> Result<StubbingHandle>
        where F: FnMut(&I) -> O + 'static
    {
        self.respond(Response::from_fn_st(f))
    }
}
