use std::fs;

use sticker_sketchpad::sketch::script::{load_script, run_script};
use sticker_sketchpad::sketch::settings_store::{load_from_path, save_to_path};
use sticker_sketchpad::sketch::{Color, Drawable, InputEvent, SketchSettings, Sketchpad};
use tempfile::tempdir;

#[test]
fn script_replay_exports_to_requested_path() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("exports").join("final.png");
    let script = dir.path().join("session.json");
    fs::write(
        &script,
        format!(
            r##"[
                {{"type": "select_tool", "tool": {{"kind": "thin"}}}},
                {{"type": "set_color", "color": "#ff0000"}},
                {{"type": "pointer_down", "x": 10, "y": 10}},
                {{"type": "pointer_move", "x": 120, "y": 40}},
                {{"type": "pointer_up"}},
                {{"type": "select_tool", "tool": {{"kind": "sticker", "index": 4}}}},
                {{"type": "pointer_down", "x": 64, "y": 64}},
                {{"type": "export", "path": {}}}
            ]"##,
            serde_json::to_string(&out).unwrap()
        ),
    )
    .unwrap();

    let events = load_script(&script).unwrap();
    assert_eq!(events.len(), 8);

    let mut pad = Sketchpad::from_settings(SketchSettings::default()).unwrap();
    let report = run_script(&mut pad, events).unwrap();

    assert_eq!(report.exports, vec![out.clone()]);
    assert!(out.exists());
    assert_eq!(pad.history().undo_len(), 2);
    match &pad.history().committed()[0] {
        Drawable::Stroke(stroke) => assert_eq!(stroke.color(), Color::rgb(255, 0, 0)),
        Drawable::Sticker(_) => panic!("expected stroke first"),
    }
}

#[test]
fn invalid_event_names_its_position() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("broken.json");
    fs::write(&script, r#"[{"type": "undo"}, {"type": "pointer_down"}]"#).unwrap();

    let err = load_script(&script).unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));
}

#[test]
fn settings_file_drives_session_setup() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sketch_settings.json");
    fs::write(
        &path,
        r##"{
            "canvas_width": 64,
            "canvas_height": 48,
            "thin_thickness": 0.5,
            "stickers": ["🧽", ""],
            "initial_color": {"r": 10, "g": 20, "b": 30}
        }"##,
    )
    .unwrap();

    let settings = load_from_path(&path).unwrap();
    assert_eq!(settings.thin_thickness, 3.0);
    assert_eq!(settings.initial_color, Color::rgb(10, 20, 30));

    let mut pad = Sketchpad::from_settings(settings.clone()).unwrap();
    assert_eq!(pad.surface().width(), 64);
    assert_eq!(pad.surface().height(), 48);
    assert_eq!(pad.input().stickers().len(), 1);

    pad.dispatch(InputEvent::PointerDown { x: 1.0, y: 1.0 })
        .unwrap();
    pad.dispatch(InputEvent::PointerUp).unwrap();
    match &pad.history().committed()[0] {
        Drawable::Stroke(stroke) => {
            assert_eq!(stroke.color(), Color::rgb(10, 20, 30));
            assert_eq!(stroke.thickness(), 3.0);
        }
        Drawable::Sticker(_) => panic!("expected stroke"),
    }

    let copy = dir.path().join("copy.json");
    save_to_path(&copy, &settings).unwrap();
    assert_eq!(load_from_path(&copy).unwrap(), settings);
}

#[test]
fn zero_sized_canvas_fails_at_startup() {
    let settings = SketchSettings {
        canvas_width: 0,
        ..SketchSettings::default()
    };
    assert!(Sketchpad::from_settings(settings).is_err());
}

#[test]
fn unreadable_font_fails_at_startup() {
    let dir = tempdir().unwrap();
    let font = dir.path().join("font.ttf");
    fs::write(&font, b"not a font").unwrap();

    let settings = SketchSettings {
        font_path: Some(font),
        ..SketchSettings::default()
    };
    let err = Sketchpad::from_settings(settings).err().unwrap();
    assert!(format!("{err:#}").contains("font.ttf"));
}
