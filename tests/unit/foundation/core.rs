use super::*;

#[test]
fn fps_validation_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert_eq!(Fps::new(30, 1).unwrap(), Fps::default());
}

#[test]
fn frame_offsets_land_on_whole_seconds() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.frame_offset(FrameIndex(30)), Duration::from_secs(1));
    assert_eq!(fps.frame_offset(FrameIndex(0)), Duration::ZERO);

    let ntsc = Fps::new(30_000, 1001).unwrap();
    assert_eq!(ntsc.frame_offset(FrameIndex(30_000)), Duration::from_secs(1001));
}

#[test]
fn slot_at_is_floor_of_elapsed() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.slot_at(Duration::ZERO), FrameIndex(0));
    assert_eq!(fps.slot_at(Duration::from_millis(34)), FrameIndex(1));
    assert_eq!(fps.slot_at(Duration::from_secs(1)), FrameIndex(30));
    assert_eq!(fps.slot_at(fps.frame_offset(FrameIndex(77))), FrameIndex(77));
}

#[test]
fn frame_offset_never_lands_before_its_slot() {
    for fps in [
        Fps::new(30, 1).unwrap(),
        Fps::new(24_000, 1001).unwrap(),
        Fps::new(7, 3).unwrap(),
    ] {
        for n in 0..500 {
            assert_eq!(fps.slot_at(fps.frame_offset(FrameIndex(n))), FrameIndex(n));
        }
    }
}

#[test]
fn premul_conversion_rounds() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.to_array(), [128, 64, 0, 128]);
    assert_eq!(Rgba8Premul::transparent().to_array(), [0, 0, 0, 0]);
}
