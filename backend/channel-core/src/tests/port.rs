// Unit tests for the generic open-port retry primitive.
// Real-socket behavior is covered by the integration tests; these use a
// fake attempt so ordering and error routing are observable.

use crate::error::port::PortError;
use crate::port::{PortRange, find_open_port};

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
enum FakeBindError {
    #[error("address in use")]
    Taken,
    #[error("permission denied")]
    Denied,
}

fn is_taken(error: &FakeBindError) -> bool {
    matches!(error, FakeBindError::Taken)
}

/// **VALUE**: Verifies candidates are tried strictly in ascending order and the
/// first success wins.
///
/// **WHY THIS MATTERS**: Both endpoints rendezvous by scanning the same range in
/// the same order. If the allocator skipped around, the client could connect to a
/// stale server another process left on a later port.
#[tokio::test]
async fn given_first_ports_taken_when_finding_port_then_returns_first_free_in_order() {
    // GIVEN: A range where the first two candidates are taken
    let attempted = Rc::new(RefCell::new(Vec::new()));
    let log = attempted.clone();

    // WHEN: Allocating
    let result = find_open_port(
        PortRange::new(7000, 5),
        move |port| {
            log.borrow_mut().push(port);
            let outcome = if port < 7002 {
                Err(FakeBindError::Taken)
            } else {
                Ok(port)
            };
            async move { outcome }
        },
        is_taken,
    )
    .await;

    // THEN: The first free candidate is returned, earlier ones tried in order
    assert_eq!(result.unwrap(), 7002, "Should return first free port");
    assert_eq!(
        *attempted.borrow(),
        vec![7000, 7001, 7002],
        "Should try ports in ascending order and stop at first success"
    );
}

/// **VALUE**: Verifies a non-unavailable error aborts allocation immediately.
///
/// **WHY THIS MATTERS**: Address-in-use is the only recoverable bind failure.
/// Anything else (permissions, bad interface) would fail on every candidate too,
/// so retrying would just bury the real error under an exhausted-range one.
#[tokio::test]
async fn given_fatal_bind_error_when_finding_port_then_propagates_without_retrying() {
    // GIVEN: An attempt that fails fatally on the first candidate
    let attempted = Rc::new(RefCell::new(Vec::new()));
    let log = attempted.clone();

    // WHEN: Allocating
    let result: Result<u16, PortError> = find_open_port(
        PortRange::new(7000, 5),
        move |port| {
            log.borrow_mut().push(port);
            async move { Err(FakeBindError::Denied) }
        },
        is_taken,
    )
    .await;

    // THEN: The error surfaces as Bind and no further candidates are tried
    assert!(
        matches!(result, Err(PortError::Bind { .. })),
        "Fatal errors must surface as PortError::Bind"
    );
    assert_eq!(
        *attempted.borrow(),
        vec![7000],
        "Must not try further ports after a fatal error"
    );
}

/// **VALUE**: Verifies exhausting the range yields an error naming the full range.
///
/// **WHY THIS MATTERS**: "No port free between 6660 and 6669" is the one message
/// an operator gets when ten stale processes are squatting the range; it has to
/// name the whole range, not the last port tried.
#[tokio::test]
async fn given_every_port_taken_when_finding_port_then_fails_with_exhausted_range() {
    // GIVEN: A range where every candidate is taken
    let attempted = Rc::new(RefCell::new(Vec::new()));
    let log = attempted.clone();

    // WHEN: Allocating
    let result: Result<u16, PortError> = find_open_port(
        PortRange::new(7000, 5),
        move |port| {
            log.borrow_mut().push(port);
            async move { Err(FakeBindError::Taken) }
        },
        is_taken,
    )
    .await;

    // THEN: Every candidate was tried once, and the error names the range
    assert_eq!(*attempted.borrow(), vec![7000, 7001, 7002, 7003, 7004]);
    let error = result.unwrap_err();
    assert!(matches!(
        error,
        PortError::Exhausted {
            range,
            ..
        } if range == PortRange::new(7000, 5)
    ));
    assert!(
        error.to_string().contains("between 7000 and 7004"),
        "Error must name the full range, got: {error}"
    );
}

/// **VALUE**: Verifies the range arithmetic and the compiled-in default.
///
/// **BUG THIS CATCHES**: An off-by-one in `end()` would silently shrink or grow
/// the rendezvous window on both endpoints.
#[test]
fn given_port_range_when_inspected_then_bounds_and_default_are_correct() {
    let range = PortRange::new(6660, 10);
    assert_eq!(range.start(), 6660);
    assert_eq!(range.end(), 6669, "Range end is inclusive");
    assert_eq!(range.ports().count(), 10);
    assert_eq!(format!("{range}"), "6660 and 6669");

    assert_eq!(PortRange::default(), range, "Default must be the shared range");
}

/// **VALUE**: Verifies a single-port range is usable - the minimum the invariant
/// `length >= 1` allows.
#[test]
fn given_single_port_range_when_iterated_then_yields_exactly_that_port() {
    let range = PortRange::new(9000, 1);
    assert_eq!(range.ports().collect::<Vec<_>>(), vec![9000]);
    assert_eq!(range.end(), 9000);
}
