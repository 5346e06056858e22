// vim: tw=80
//! Strict stubbing: unused stubbings fail the session, and argument mismatches
//! with a stubbed method fail the call.
#![deny(warnings)]

use strictmock::{
    Answer,
    Error,
    Failure,
    Method,
    Mock,
    Session,
    Strictness,
    once,
    predicate::{always, eq},
    runner,
    start_session
};

const SIMPLE_METHOD: Method<i32, String> = Method::new("simple_method");
const SIMPLE_METHOD_STR: Method<&'static str, String> =
    Method::new("simple_method");
const OTHER_METHOD: Method<(), String> = Method::new("other_method");

/// A hand-written mock of a small interface
struct MockMethods {
    session: Session,
    mock: Mock,
}

impl MockMethods {
    fn new(session: &Session) -> Self {
        let mock = session.mock("mock").unwrap();
        MockMethods{session: session.clone(), mock}
    }

    fn simple_method(&self, x: i32) -> strictmock::Result<String> {
        self.session.on_call(&self.mock, &SIMPLE_METHOD, x)
            .map(Answer::unwrap_or_default)
    }

    fn simple_method_str(&self, s: &'static str) -> strictmock::Result<String> {
        self.session.on_call(&self.mock, &SIMPLE_METHOD_STR, s)
            .map(Answer::unwrap_or_default)
    }

    fn other_method(&self) -> strictmock::Result<String> {
        self.session.on_call(&self.mock, &OTHER_METHOD, ())
            .map(Answer::unwrap_or_default)
    }
}

fn setup() -> (Session, MockMethods) {
    let session = start_session("StrictStubbingTest", Strictness::StrictStubs);
    let mock = MockMethods::new(&session);
    (session, mock)
}

#[test]
fn no_interactions() {
    let (session, _mock) = setup();
    session.finish().unwrap();
}

#[test]
fn few_interactions() {
    let (session, mock) = setup();
    mock.simple_method(100).unwrap();
    mock.other_method().unwrap();
    session.finish().unwrap();
}

#[test]
fn few_verified_interactions() {
    let (session, mock) = setup();
    mock.simple_method(100).unwrap();
    mock.other_method().unwrap();

    session.verify(&mock.mock, &SIMPLE_METHOD, eq(100), once()).unwrap();
    session.verify(&mock.mock, &OTHER_METHOD, always(), once()).unwrap();
    session.verify_no_more_interactions(&mock.mock).unwrap();
    session.finish().unwrap();
}

#[test]
fn stubbed_method_is_implicitly_verified() {
    let (session, mock) = setup();
    session.stub(&mock.mock, &SIMPLE_METHOD)
        .with(eq(100))
        .return_const("100".to_owned())
        .unwrap();
    assert_eq!("100", mock.simple_method(100).unwrap());

    session.verify_no_more_interactions(&mock.mock).unwrap();
    session.finish().unwrap();
}

#[test]
fn unused_stubbed_is_not_implicitly_verified() {
    let (session, mock) = setup();
    session.stub(&mock.mock, &SIMPLE_METHOD)
        .with(eq(100))
        .return_const("100".to_owned())
        .unwrap();
    assert_eq!("100", mock.simple_method(100).unwrap());  // implicitly verified
    assert_eq!("", mock.simple_method(200).unwrap());     // unverified

    match session.verify_no_more_interactions(&mock.mock) {
        Err(Error::UnexpectedInteraction{mock, invocations}) => {
            assert_eq!("mock", mock);
            assert_eq!(&["simple_method(200)".to_owned()],
                invocations.items());
        },
        r => panic!("Unexpected result {:?}", r)
    }
    session.finish().unwrap();
}

#[test]
fn stubbing_argument_mismatch() {
    let (session, mock) = setup();
    session.stub(&mock.mock, &SIMPLE_METHOD)
        .with(eq(100))
        .return_const("100".to_owned())
        .unwrap();

    match mock.simple_method(200) {
        Err(Error::StubbingMismatch{mock, invocation, stubbings}) => {
            assert_eq!("mock", mock);
            assert_eq!("simple_method(200)", invocation);
            assert!(stubbings.items()[0].starts_with("simple_method(var == 100)"),
                "{}", stubbings);
        },
        r => panic!("Unexpected result {:?}", r)
    }
    // The rejected call was never recorded
    session.verify(&mock.mock, &SIMPLE_METHOD, always(), strictmock::never())
        .unwrap();
}

#[test]
fn unused_stubbing() {
    let (session, mock) = setup();
    session.stub(&mock.mock, &SIMPLE_METHOD)
        .with(eq(100))
        .return_const("100".to_owned())
        .unwrap();

    match session.finish() {
        Err(Error::UnnecessaryStubbing{session, stubbings}) => {
            assert_eq!("StrictStubbingTest", session);
            assert_eq!(&["mock.simple_method(var == 100)".to_owned()],
                stubbings.items());
        },
        r => panic!("Unexpected result {:?}", r)
    }
}

/// The session's failure must not hide the failure of the test itself, and
/// vice versa.
#[test]
fn finish_mocking_exception_does_not_hide_the_exception_from_test() {
    let r = runner::run_strict("stubbing_argument_mismatch", |session| {
        let mock = MockMethods::new(session);
        session.stub(&mock.mock, &SIMPLE_METHOD_STR)
            .with(eq("1"))
            .return_const("one".to_owned())?;
        Err::<(), _>(Failure::test("IllegalStateException"))
    });
    let failures = r.unwrap_err().into_vec();
    assert_eq!(2, failures.len());
    match &failures[0] {
        Failure::Test(e) => assert_eq!("IllegalStateException", e.to_string()),
        f => panic!("Unexpected failure {:?}", f)
    }
    assert!(matches!(failures[1].as_mocking(),
        Some(Error::UnnecessaryStubbing{..})));
}

/// Same as above, but the test body panics instead of returning an error.
#[test]
fn finish_mocking_after_panic() {
    let r = runner::run_strict("stubbing_argument_mismatch", |session| {
        let mock = MockMethods::new(session);
        session.stub(&mock.mock, &SIMPLE_METHOD_STR)
            .with(eq("1"))
            .return_const("one".to_owned())?;
        if mock.simple_method_str("1").is_ok() {
            panic!("IllegalStateException");
        }
        Ok::<(), Failure>(())
    });
    let failures = r.unwrap_err().into_vec();
    // The stubbing was used before the panic, so only the panic remains.
    assert_eq!(1, failures.len());
    match &failures[0] {
        Failure::Panic(msg) => assert_eq!("IllegalStateException", msg),
        f => panic!("Unexpected failure {:?}", f)
    }
}

#[test]
fn mismatch_propagates_out_of_the_test_body() {
    let r = runner::run_strict("mismatch", |session| {
        let mock = MockMethods::new(session);
        session.stub(&mock.mock, &SIMPLE_METHOD)
            .with(eq(100))
            .return_const("100".to_owned())?;
        mock.simple_method(200)?;
        Ok::<(), Failure>(())
    });
    let failures = r.unwrap_err().into_vec();
    assert_eq!(2, failures.len());
    assert!(matches!(failures[0].as_mocking(),
        Some(Error::StubbingMismatch{..})));
    assert!(matches!(failures[1].as_mocking(),
        Some(Error::UnnecessaryStubbing{..})));
}

#[test]
fn passing_test_returns_its_value() {
    let r = runner::run_strict("passing", |session| {
        let mock = MockMethods::new(session);
        session.stub(&mock.mock, &OTHER_METHOD)
            .return_const("other".to_owned())?;
        mock.other_method().map_err(Failure::from)
    });
    assert_eq!("other", r.unwrap());
}

/// Overloads with a different parameter type are separate methods, so
/// stubbing one does not make calls to the other mismatches.
#[test]
fn overloads_do_not_conflict() {
    let (session, mock) = setup();
    session.stub(&mock.mock, &SIMPLE_METHOD_STR)
        .with(eq("1"))
        .return_const("one".to_owned())
        .unwrap();
    assert_eq!("", mock.simple_method(1).unwrap());
    assert_eq!("one", mock.simple_method_str("1").unwrap());
    session.finish().unwrap();
}

#[test]
fn declaration_order_determines_precedence() {
    let (session, mock) = setup();
    let first = session.stub(&mock.mock, &SIMPLE_METHOD)
        .with(eq(5))
        .return_const("first".to_owned())
        .unwrap();
    let second = session.stub(&mock.mock, &SIMPLE_METHOD)
        .with(always())
        .return_const("second".to_owned())
        .unwrap();

    assert_eq!("first", mock.simple_method(5).unwrap());
    assert!(session.is_used(first));
    assert!(!session.is_used(second));
    assert_eq!("second", mock.simple_method(6).unwrap());
    assert!(session.is_used(second));
    session.finish().unwrap();
}

#[test]
fn mismatch_lists_every_unused_stubbing() {
    let (session, mock) = setup();
    for x in [1, 2, 3] {
        session.stub(&mock.mock, &SIMPLE_METHOD)
            .with(eq(x))
            .return_const(x.to_string())
            .unwrap();
    }
    assert_eq!("2", mock.simple_method(2).unwrap());
    match mock.simple_method(4) {
        Err(Error::StubbingMismatch{stubbings, ..}) => {
            assert_eq!(2, stubbings.len());
        },
        r => panic!("Unexpected result {:?}", r)
    }
}
