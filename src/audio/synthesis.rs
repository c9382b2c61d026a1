//! Procedural stand-in for the remote voice.

/// Glicol composition: a phrase-like sawtooth babble with a moving formant
pub const VOICE_COMPOSITION: &str = r#"
~gate: speed 3.0 >> seq 60 _62 _~a 55
~a: choose 57 60 62 64 0 0
~amp: ~gate >> envperc 0.01 0.25
~pit: ~gate >> mul 130.81
~voice: saw ~pit >> mul ~amp >> lpf ~mod 3.0 >> mul 0.1
~mod: sin 0.7 >> mul 900 >> add 1100
o: ~voice >> plate 0.2
"#;
