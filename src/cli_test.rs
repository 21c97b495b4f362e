use clap::Parser;

use canvas::doc::SourceKind;
use canvas::lifecycle::ImageSource;

use super::*;

// =============================================================
// Value parsers
// =============================================================

#[test]
fn parse_point_accepts_spaces_and_decimals() {
    let p = parse_point(" 12.5, 40 ").unwrap();
    assert!((p.x - 12.5).abs() < f64::EPSILON);
    assert!((p.y - 40.0).abs() < f64::EPSILON);
}

#[test]
fn parse_point_rejects_garbage() {
    assert!(parse_point("12").is_err());
    assert!(parse_point("a,b").is_err());
    assert!(parse_point("inf,0").is_err());
}

#[test]
fn parse_container_accepts_either_case() {
    let c = parse_container("800x600").unwrap();
    assert!((c.width - 800.0).abs() < f64::EPSILON);
    assert!((c.height - 600.0).abs() < f64::EPSILON);
    assert!(parse_container("1024X768").is_ok());
}

#[test]
fn parse_container_rejects_negative_and_malformed() {
    assert!(parse_container("-1x600").is_err());
    assert!(parse_container("800").is_err());
    assert!(parse_container("800xtall").is_err());
}

// =============================================================
// Region files
// =============================================================

#[test]
fn parse_regions_reads_a_plain_list() {
    let body = r#"[{"id":"r1","x1":1,"y1":2,"x2":30,"y2":40,"text":"hi"}]"#;
    let regions = parse_regions(body).unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].id.as_str(), "r1");
    assert!(regions[0].visible);
}

#[test]
fn parse_regions_reads_a_detection_response() {
    let body = r#"{"ocr_result":{"text_boxes":[
        {"text":"one","x1":0,"y1":0,"x2":10,"y2":10,"confidence":0.5},
        {"text":"two","x1":20,"y1":0,"x2":40,"y2":10,"confidence":0.7}
    ]}}"#;
    let regions = parse_regions(body).unwrap();
    assert_eq!(regions.len(), 2);
    assert!(regions.iter().all(|r| r.source_kind == SourceKind::Detected));
}

#[test]
fn parse_regions_rejects_other_json() {
    let err = parse_regions(r#"{"nothing":true}"#).unwrap_err();
    assert!(matches!(err, CliError::InvalidJson(_)));
}

#[tokio::test]
async fn load_regions_reports_missing_file() {
    let path = std::path::Path::new("/definitely/not/here/regions.json");
    let err = load_regions(path).await.unwrap_err();
    assert!(matches!(err, CliError::Read { .. }));
}

// =============================================================
// Argument parsing
// =============================================================

#[test]
fn inspect_parses_canvas_args() {
    let cli = Cli::try_parse_from([
        "translator",
        "inspect",
        "https://example.com/page.png",
        "--container",
        "900x700",
        "--zoom",
        "1.5",
        "--select",
        "r1",
    ])
    .unwrap();
    let Command::Inspect(args) = cli.command else {
        panic!("expected inspect");
    };
    assert_eq!(args.image, ImageSource::Url("https://example.com/page.png".into()));
    assert_eq!(args.select.as_deref(), Some("r1"));
    assert_eq!(args.zoom, Some(1.5));
    assert!(args.container.is_some());
}

#[test]
fn gesture_requires_both_points() {
    assert!(Cli::try_parse_from(["translator", "gesture", "page.png", "--from", "1,2"]).is_err());
    let cli = Cli::try_parse_from(["translator", "gesture", "page.png", "--from", "1,2", "--to", "50,60"]).unwrap();
    let Command::Gesture(args) = cli.command else {
        panic!("expected gesture");
    };
    assert_eq!(args.canvas.image, ImageSource::File("page.png".into()));
    assert!((args.to.x - 50.0).abs() < f64::EPSILON);
}
