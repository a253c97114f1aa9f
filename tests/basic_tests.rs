use clap::Parser;
use image::{GrayImage, ImageFormat, Luma};
use qr_guard::config::{ConfigData, SourceKind, DEFAULT_POLL_INTERVAL_MS};
use qr_guard::decode::{decode_frame, load_frame};
use qr_guard::scan::{ScanEvent, ScanState};
use qr_guard::source::{FrameDirSource, PayloadSource, ScriptedSource, SourceEvent};
use qr_guard::state::State;
use qr_guard::verdict::{classify, VerdictKind};
use qr_guard::Args;
use qrcode::QrCode;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

// Renders the codes left to right as one clean PNG, 8px per module with a
// 4 module quiet zone around each code.
fn render_qr_row(texts: &[&str]) -> GrayImage {
    let (scale, quiet) = (8u32, 4i64);
    let codes: Vec<(i64, Vec<qrcode::Color>)> = texts
        .iter()
        .map(|text| {
            let code = QrCode::new(text.as_bytes()).unwrap();
            (code.width() as i64, code.to_colors())
        })
        .collect();
    let cell = codes.iter().map(|(modules, _)| *modules).max().unwrap() + 2 * quiet;
    let width = cell as u32 * codes.len() as u32 * scale;
    let height = cell as u32 * scale;

    GrayImage::from_fn(width, height, |x, y| {
        let col = (x / scale) as i64;
        let (modules, colors) = &codes[(col / cell) as usize];
        let mx = col % cell - quiet;
        let my = (y / scale) as i64 - quiet;
        let dark = mx >= 0
            && my >= 0
            && mx < *modules
            && my < *modules
            && colors[(my * modules + mx) as usize] == qrcode::Color::Dark;
        if dark {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

fn write_qr_png(dir: &Path, file_name: &str, text: &str) {
    render_qr_row(&[text]).save(dir.join(file_name)).unwrap();
}

fn png_bytes(texts: &[&str]) -> Vec<u8> {
    let mut bytes = Vec::new();
    render_qr_row(texts)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn payloads(events: &[SourceEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            SourceEvent::Payload(p) => Some(p.as_str()),
            SourceEvent::Frame(_) => None,
        })
        .collect()
}

#[test]
fn test_scenario_a_safe_link() {
    let mut state = ScanState::new();
    state.apply(ScanEvent::Payload("https://example.com".to_string()));
    let verdict = state.verdict().unwrap();
    assert_eq!(verdict.kind, VerdictKind::Safe);
    assert_eq!(verdict.label, "✅ ССЫЛКА БЕЗОПАСНА");
}

#[test]
fn test_scenario_b_dangerous_link() {
    let verdict = classify("https://t.me/somechannel");
    assert_eq!(verdict.kind, VerdictKind::Danger);
    assert_eq!(verdict.label, "⚠️ ВОЗМОЖНО ОПАСНАЯ ССЫЛКА");
}

#[test]
fn test_scenario_c_plain_text() {
    let verdict = classify("plain-text-value");
    assert_eq!(verdict.kind, VerdictKind::Neutral);
    assert_eq!(verdict.label, "Найдено: plain-text-value");
}

#[test]
fn test_scenario_d_repeat_is_noop() {
    let mut state = ScanState::new();
    assert!(state.apply(ScanEvent::Payload("https://example.com".to_string())));
    let snapshot = state.clone();
    assert!(!state.apply(ScanEvent::Payload("https://example.com".to_string())));
    assert_eq!(state, snapshot);
}

#[test]
fn test_scenario_e_no_scan_no_banner() {
    let state = ScanState::new();
    assert!(state.verdict().is_none());
    assert!(state.last_scanned().is_none());
}

#[test]
fn test_every_non_link_is_echoed() {
    for payload in ["WIFI:S:home;T:WPA;P:secret;;", "12345", "mailto:a@b.c", "http:/broken"] {
        let verdict = classify(payload);
        assert_eq!(verdict.kind, VerdictKind::Neutral);
        assert_eq!(verdict.label, format!("Найдено: {}", payload));
    }
}

#[test]
fn test_http_and_https_both_count_as_links() {
    assert_eq!(classify("http://example.com").kind, VerdictKind::Safe);
    assert_eq!(classify("http://example.com/virus").kind, VerdictKind::Danger);
}

#[test]
fn test_config_data_default() {
    let config = ConfigData::default();
    assert_eq!(config.frames_dir, None);
    assert_eq!(config.camera_index, 0);
    assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    assert_eq!(config.source, SourceKind::default());
}

#[test]
fn test_source_kind_display() {
    assert_eq!(format!("{}", SourceKind::Camera), "Camera");
    assert_eq!(format!("{}", SourceKind::Frames), "Frames");
    assert_eq!(format!("{}", SourceKind::Stdin), "Stdin");
    assert_eq!(format!("{}", SourceKind::Demo), "Demo");
}

#[test]
fn test_args_override_config() {
    let args = Args::try_parse_from([
        "qr_guard",
        "--source",
        "stdin",
        "--frames-dir",
        "/tmp/qr",
        "--poll-ms",
        "25",
    ])
    .unwrap();
    assert!(!args.preview);

    let mut config = ConfigData::default();
    args.apply_to(&mut config);
    assert_eq!(config.source, SourceKind::Stdin);
    assert_eq!(config.frames_dir.as_deref(), Some(Path::new("/tmp/qr")));
    assert_eq!(config.poll_interval_ms, 25);
    assert_eq!(config.camera_index, 0);
}

#[test]
fn test_camera_access_requested_unless_preview() {
    let headless = Args::try_parse_from(["qr_guard", "--headless"]).unwrap();
    assert!(headless.requests_camera());
    let windowed = Args::try_parse_from(["qr_guard"]).unwrap();
    assert!(windowed.requests_camera());
    let preview = Args::try_parse_from(["qr_guard", "--preview"]).unwrap();
    assert!(!preview.requests_camera());
}

#[test]
fn test_preview_and_headless_conflict() {
    assert!(Args::try_parse_from(["qr_guard", "--preview", "--headless"]).is_err());
}

#[test]
fn test_state_enum() {
    assert_ne!(State::Initialising, State::Running);
    assert_ne!(State::Running, State::About);
    assert_eq!(State::About, State::About);
}

#[test]
fn test_frames_dir_decodes_qr_images() {
    let dir = tempfile::tempdir().unwrap();
    write_qr_png(dir.path(), "0001.png", "https://t.me/somechannel");
    write_qr_png(dir.path(), "0002.png", "plain-text-value");

    let mut source = FrameDirSource::new(dir.path().to_path_buf(), Duration::ZERO);
    let mut events = Vec::new();
    assert_eq!(source.poll_once(&mut |e| events.push(e)).unwrap(), 2);

    // One frame event per file, followed by its payload
    assert!(matches!(events[0], SourceEvent::Frame(_)));
    assert_eq!(
        payloads(&events),
        vec!["https://t.me/somechannel", "plain-text-value"]
    );

    // Already seen files are not decoded again
    let mut again = Vec::new();
    assert_eq!(source.poll_once(&mut |e| again.push(e)).unwrap(), 0);
    assert!(again.is_empty());
}

#[test]
fn test_frames_dir_picks_up_new_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = FrameDirSource::new(dir.path().to_path_buf(), Duration::ZERO);
    let mut events = Vec::new();
    assert_eq!(source.poll_once(&mut |e| events.push(e)).unwrap(), 0);

    write_qr_png(dir.path(), "late.png", "https://example.com");
    assert_eq!(source.poll_once(&mut |e| events.push(e)).unwrap(), 1);
    assert_eq!(payloads(&events), vec!["https://example.com"]);
}

#[test]
fn test_scripted_source_through_dedup() {
    let run = Arc::new((Mutex::new(true), Condvar::new()));
    let mut source = ScriptedSource::demo(Duration::ZERO);
    let mut state = ScanState::new();
    let mut changes = 0;
    source
        .subscribe(&run, &mut |event| {
            if let SourceEvent::Payload(p) = event {
                if state.apply(ScanEvent::Payload(p)) {
                    changes += 1;
                }
            }
        })
        .unwrap();

    // Five scripted payloads, the second repeats the first
    assert_eq!(changes, 4);
    assert_eq!(state.verdict().map(|v| v.kind), Some(VerdictKind::Danger));
}

#[test]
fn test_half_written_frame_is_read_once_complete() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0001.png");
    let bytes = png_bytes(&["https://t.me/x"]);

    let mut source = FrameDirSource::new(dir.path().to_path_buf(), Duration::ZERO);
    let mut events = Vec::new();

    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    source.poll_once(&mut |e| events.push(e)).unwrap();
    assert!(payloads(&events).is_empty());

    std::fs::write(&path, &bytes).unwrap();
    assert_eq!(source.poll_once(&mut |e| events.push(e)).unwrap(), 1);
    assert_eq!(payloads(&events), vec!["https://t.me/x"]);
}

#[test]
fn test_two_codes_in_view_do_not_defeat_dedup() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = png_bytes(&["plain-text-value", "https://example.com"]);
    std::fs::write(dir.path().join("0001.png"), &bytes).unwrap();
    std::fs::write(dir.path().join("0002.png"), &bytes).unwrap();

    // Both codes are really in the frame
    let frame = load_frame(&dir.path().join("0001.png")).unwrap();
    assert_eq!(decode_frame(&frame).len(), 2);

    let mut source = FrameDirSource::new(dir.path().to_path_buf(), Duration::ZERO);
    let mut events = Vec::new();
    source.poll_once(&mut |e| events.push(e)).unwrap();

    // One payload per frame, the same one for identical frames
    assert_eq!(
        payloads(&events),
        vec!["https://example.com", "https://example.com"]
    );

    let mut state = ScanState::new();
    let changes = payloads(&events)
        .into_iter()
        .filter(|p| state.apply(ScanEvent::Payload(p.to_string())))
        .count();
    assert_eq!(changes, 1);
}
