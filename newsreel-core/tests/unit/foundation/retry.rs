use super::*;
use crate::foundation::error::NewsreelError;

#[test]
fn default_policy_backs_off_1_2_4_seconds() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_retries, 3);
    assert_eq!(policy.delay_for(0), Duration::from_secs(1));
    assert_eq!(policy.delay_for(1), Duration::from_secs(2));
    assert_eq!(policy.delay_for(2), Duration::from_secs(4));
}

#[test]
fn delay_is_capped() {
    let policy = RetryPolicy {
        max_retries: 10,
        base_delay_ms: 1000,
        max_delay_ms: 2500,
        ..RetryPolicy::default()
    };
    assert_eq!(policy.delay_for(5), Duration::from_millis(2500));
    assert_eq!(policy.delay_for(63), Duration::from_millis(2500));
}

#[test]
fn retries_retryable_errors_until_success() {
    let policy = RetryPolicy::default();
    let mut calls = 0;
    let mut slept = Vec::new();
    let out = policy.run_with_sleep(
        "flaky",
        |e| policy.should_retry(e),
        || {
            calls += 1;
            if calls < 3 {
                Err(NewsreelError::fetch_retryable("timeout"))
            } else {
                Ok(calls)
            }
        },
        |d| slept.push(d),
    );
    assert_eq!(out.unwrap(), 3);
    assert_eq!(slept, vec![Duration::from_secs(1), Duration::from_secs(2)]);
}

#[test]
fn gives_up_after_max_retries() {
    let policy = RetryPolicy::default();
    let mut calls = 0;
    let mut slept = Vec::new();
    let out: NewsreelResult<()> = policy.run_with_sleep(
        "down",
        |e| policy.should_retry(e),
        || {
            calls += 1;
            Err(NewsreelError::fetch_retryable("503"))
        },
        |d| slept.push(d),
    );
    assert!(out.is_err());
    assert_eq!(calls, 4);
    assert_eq!(
        slept,
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4)
        ]
    );
}

#[test]
fn client_errors_are_retried_by_default() {
    let policy = RetryPolicy::default();
    let mut calls = 0;
    let mut slept = Vec::new();
    let out: NewsreelResult<()> = policy.run_with_sleep(
        "missing",
        |e| policy.should_retry(e),
        || {
            calls += 1;
            Err(NewsreelError::fetch("404"))
        },
        |d| slept.push(d),
    );
    assert!(out.is_err());
    assert_eq!(calls, 4);
    assert_eq!(slept.len(), 3);
}

#[test]
fn transient_only_narrows_to_flagged_errors() {
    let policy = RetryPolicy {
        transient_only: true,
        ..RetryPolicy::default()
    };
    assert!(policy.should_retry(&NewsreelError::fetch_retryable("503")));
    assert!(!policy.should_retry(&NewsreelError::fetch("404")));

    let mut calls = 0;
    let out: NewsreelResult<()> = policy.run_with_sleep(
        "missing",
        |e| policy.should_retry(e),
        || {
            calls += 1;
            Err(NewsreelError::fetch("404"))
        },
        |_| panic!("must not sleep"),
    );
    assert!(out.is_err());
    assert_eq!(calls, 1);
}

#[test]
fn non_fetch_errors_fail_fast() {
    let policy = RetryPolicy::default();
    assert!(!policy.should_retry(&NewsreelError::decode("bad bytes")));

    let mut calls = 0;
    let out: NewsreelResult<()> = policy.run_with_sleep(
        "parse",
        |e| policy.should_retry(e),
        || {
            calls += 1;
            Err(NewsreelError::validation("empty url"))
        },
        |_| panic!("must not sleep"),
    );
    assert!(out.is_err());
    assert_eq!(calls, 1);
}

#[test]
fn run_if_uses_the_callers_predicate() {
    let policy = RetryPolicy {
        base_delay_ms: 0,
        ..RetryPolicy::default()
    };
    let mut calls = 0;
    let out = policy.run_if(
        "custom",
        |e| matches!(e, NewsreelError::Service(_)),
        || {
            calls += 1;
            if calls < 2 {
                Err(NewsreelError::service("busy"))
            } else {
                Ok(calls)
            }
        },
    );
    assert_eq!(out.unwrap(), 2);
}
