//! Resource-cap configuration through the environment.
//!
//! Environment variables are process-global, so everything lives in one
//! test function; this file is its own test binary and does not race the
//! other suites.

use polygol::{union, Error, Geom};

fn square(x0: f64, y0: f64, size: f64) -> Geom {
    vec![vec![vec![
        vec![x0, y0],
        vec![x0 + size, y0],
        vec![x0 + size, y0 + size],
        vec![x0, y0 + size],
        vec![x0, y0],
    ]]]
}

#[test]
fn caps_are_read_from_the_environment() {
    let a = square(0.0, 0.0, 1.0);
    let b = square(0.5, 0.5, 1.0);

    // a queue cap smaller than the input aborts with a recoverable error
    std::env::set_var("POLYGOL_MAX_QUEUE_SIZE", "4");
    let err = union(&a, &[b.clone()]).unwrap_err();
    match err {
        Error::ResourceExceeded(msg) => assert!(msg.contains("POLYGOL_MAX_QUEUE_SIZE")),
        other => panic!("expected ResourceExceeded, got {other:?}"),
    }

    // an unparsable value logs a warning and keeps the default
    std::env::set_var("POLYGOL_MAX_QUEUE_SIZE", "not-a-number");
    assert!(union(&a, &[b.clone()]).is_ok());

    std::env::remove_var("POLYGOL_MAX_QUEUE_SIZE");

    // same for the sweep line segment cap
    std::env::set_var("POLYGOL_MAX_SWEEPLINE_SEGMENTS", "2");
    let err = union(&a, &[b.clone()]).unwrap_err();
    match err {
        Error::ResourceExceeded(msg) => {
            assert!(msg.contains("POLYGOL_MAX_SWEEPLINE_SEGMENTS"))
        }
        other => panic!("expected ResourceExceeded, got {other:?}"),
    }

    std::env::set_var("POLYGOL_MAX_SWEEPLINE_SEGMENTS", "-5");
    assert!(union(&a, &[b.clone()]).is_ok());

    std::env::remove_var("POLYGOL_MAX_SWEEPLINE_SEGMENTS");
    assert!(union(&a, &[b]).is_ok());
}
