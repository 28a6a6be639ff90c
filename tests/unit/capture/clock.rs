use super::*;

#[test]
fn manual_clock_sleep_advances_virtual_time() {
    let c = ManualClock::new();
    assert_eq!(c.now(), Duration::ZERO);
    c.sleep(Duration::from_millis(250));
    c.advance(Duration::from_millis(750));
    assert_eq!(c.now(), Duration::from_secs(1));
    c.set(Duration::from_millis(10));
    assert_eq!(c.now(), Duration::from_millis(10));
}

#[test]
fn manual_clock_saturates() {
    let c = ManualClock::new();
    c.set(Duration::MAX);
    c.advance(Duration::from_secs(1));
    assert_eq!(c.now(), Duration::from_nanos(u64::MAX));
}

#[test]
fn system_clock_is_monotonic() {
    let c = SystemClock::new();
    let a = c.now();
    c.sleep(Duration::from_millis(2));
    assert!(c.now() >= a + Duration::from_millis(2));
}
