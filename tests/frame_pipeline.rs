//! End-to-end frame pipeline: fixed spectra in, finished frames out.

use voiceorb::audio::StaticSpectrum;
use voiceorb::envelope::EnvelopeState;
use voiceorb::scene::{FrameOrchestrator, FrameSink, FrameStatus, SceneConfig, SceneFrame, Viewport};
use voiceorb::Result;

#[derive(Default)]
struct RecordingSink {
    frames: Vec<SceneFrame>,
    resizes: Vec<Viewport>,
}

impl FrameSink for RecordingSink {
    fn submit(&mut self, frame: &SceneFrame) -> Result<()> {
        self.frames.push(*frame);
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) {
        self.resizes.push(viewport);
    }
}

fn small_config() -> SceneConfig {
    let mut config = SceneConfig::default();
    config.sphere.detail = 2;
    config.reactive.count = 32;
    config.ambient.count = 8;
    config
}

fn scene_with(input: Vec<u8>, output: Vec<u8>) -> FrameOrchestrator {
    let mut scene = FrameOrchestrator::new(small_config());
    scene.set_input_source(Box::new(StaticSpectrum::new(input)));
    scene.set_output_source(Box::new(StaticSpectrum::new(output)));
    scene
}

#[test]
fn silent_local_loud_remote() {
    let mut scene = scene_with(vec![0; 64], vec![255; 64]);
    let mut sink = RecordingSink::default();

    assert_eq!(scene.frame(0.5, &mut sink).unwrap(), FrameStatus::Rendered);

    let frame = &sink.frames[0];
    assert_eq!(frame.features.input_intensity, 0.0);
    assert_eq!(frame.features.output_intensity, 1.0);
    assert_eq!(frame.features.bass_intensity, 1.0);
    assert_eq!(frame.features.treble_intensity, 1.0);
    assert_eq!(frame.envelope, 0.0);
    assert!((frame.bloom.strength - 3.1).abs() < 1e-5);
}

#[test]
fn retrigger_restarts_pulse() {
    let mut scene = scene_with(vec![0; 64], vec![255; 64]);
    let mut sink = RecordingSink::default();

    scene.set_empathy_trigger(3);
    scene.frame(0.0, &mut sink).unwrap();
    assert_eq!(scene.envelope().state(), EnvelopeState::Active);

    scene.set_empathy_trigger(4);
    scene.frame(1.0, &mut sink).unwrap();
    assert_eq!(scene.envelope().trigger_id(), 4);

    // Midpoint of the restarted pulse
    scene.frame(2.25, &mut sink).unwrap();
    let peak = sink.frames.last().unwrap();
    assert!((peak.envelope - 1.0).abs() < 1e-4);
    assert!((peak.bloom.strength - 4.1).abs() < 1e-3);

    scene.frame(3.5, &mut sink).unwrap();
    assert_eq!(sink.frames.last().unwrap().envelope, 0.0);
    assert_eq!(scene.envelope().state(), EnvelopeState::Inactive);
}

#[test]
fn missing_source_skips_frame() {
    let mut scene = FrameOrchestrator::new(small_config());
    let mut sink = RecordingSink::default();
    scene.set_output_source(Box::new(StaticSpectrum::new(vec![128; 16])));

    assert_eq!(scene.frame(1.0, &mut sink).unwrap(), FrameStatus::Skipped);
    assert!(sink.frames.is_empty());
    assert!(!scene.is_ready());
}

#[test]
fn first_frame_has_zero_dt_and_all_frames_finite() {
    let mut scene = scene_with(vec![90; 32], vec![200; 32]);
    let mut sink = RecordingSink::default();
    scene.set_empathy_trigger(1);

    for i in 0..120 {
        scene.frame(10.0 + i as f32 / 60.0, &mut sink).unwrap();
    }

    assert_eq!(sink.frames[0].dt, 0.0);
    assert!((sink.frames[1].dt - 1.0 / 60.0).abs() < 1e-4);
    assert!(sink.frames.iter().all(|f| f.is_finite()));
    assert!(sink.frames.iter().all(|f| f.envelope >= 0.0 && f.envelope <= 1.0));
}

#[test]
fn sphere_keeps_spinning_in_silence() {
    let mut scene = scene_with(vec![0; 16], vec![0; 16]);
    let mut sink = RecordingSink::default();

    scene.frame(0.0, &mut sink).unwrap();
    let start = scene.state().rotation;
    for i in 1..=30 {
        scene.frame(i as f32 / 30.0, &mut sink).unwrap();
    }

    assert!(scene.state().rotation.y > start.y);
    assert!(sink.frames.iter().all(|f| f.is_finite()));
}

#[test]
fn same_seed_same_frames() {
    let mut a = scene_with(vec![40; 16], vec![180; 16]);
    let mut b = scene_with(vec![40; 16], vec![180; 16]);
    let mut sink_a = RecordingSink::default();
    let mut sink_b = RecordingSink::default();

    for i in 0..10 {
        let now = i as f32 * 0.1;
        a.frame(now, &mut sink_a).unwrap();
        b.frame(now, &mut sink_b).unwrap();
    }

    assert_eq!(a.reactive_particles().particles(), b.reactive_particles().particles());
    let grain = |sink: &RecordingSink| sink.frames.iter().map(|f| f.backdrop.rand).collect::<Vec<_>>();
    assert_eq!(grain(&sink_a), grain(&sink_b));
}

#[test]
fn resize_reaches_sink_while_attached() {
    let mut scene = scene_with(vec![0; 16], vec![0; 16]);
    let mut sink = RecordingSink::default();

    scene.attach_viewport(Viewport::new(1280, 720));
    scene.resize(1920, 1080, &mut sink);
    scene.frame(0.0, &mut sink).unwrap();

    assert_eq!(sink.resizes, vec![Viewport::new(1920, 1080)]);
    assert_eq!(sink.frames[0].backdrop.resolution, [1920.0, 1080.0]);
}
