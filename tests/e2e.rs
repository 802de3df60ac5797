//! End-to-end tests against the real external collaborators.
//!
//! These call the Python `pdf2docx` package, LibreOffice and the Gemini API.
//! They are gated behind the `E2E_ENABLED` environment variable so they do
//! not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture
//!
//! PDF inputs are read from `./test_cases/`; tests whose file is missing are
//! skipped.

use docbridge::{
    convert, ConversionConfig, EngineKind, GenerativeModel, LlmModel, ModelInput, ServerConfig,
};
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// Skip unless E2E_ENABLED and a Gemini key are both present.
macro_rules! e2e_skip_unless_gemini {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if std::env::var("GEMINI_API_KEY").is_err() {
            println!("SKIP: GEMINI_API_KEY not set");
            return;
        }
    }};
}

/// A DOCX is a zip archive.
fn assert_docx(path: &std::path::Path) {
    let bytes = std::fs::read(path).expect("output should exist");
    assert!(bytes.len() > 1000, "DOCX suspiciously small: {} bytes", bytes.len());
    assert_eq!(&bytes[..2], b"PK", "DOCX must be a zip container");
}

// ── Conversion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_with_pdf2docx() {
    let input = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("sample.docx");

    let report = convert(input.to_str().unwrap(), &output, &ConversionConfig::default())
        .await
        .expect("pdf2docx conversion should succeed");

    println!("{report:?}");
    assert_eq!(report.engine, "pdf2docx");
    assert_docx(&output);
}

#[tokio::test]
async fn test_convert_with_libreoffice() {
    let input = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("nested/sample.docx");

    let config = ConversionConfig::builder()
        .engine(EngineKind::LibreOffice)
        .build()
        .unwrap();
    let report = convert(input.to_str().unwrap(), &output, &config)
        .await
        .expect("libreoffice conversion should succeed");

    assert_eq!(report.engine, "libreoffice");
    assert_docx(&output);
}

// ── Gemini ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_gemini_answers_text_question() {
    e2e_skip_unless_gemini!();
    let model = LlmModel::from_config(&ServerConfig::default()).expect("provider should build");

    let answer = model
        .generate(ModelInput::Text(
            "Reply with the single word: pong".into(),
        ))
        .await
        .expect("Gemini call should succeed");

    println!("answer: {answer}");
    assert!(answer.to_lowercase().contains("pong"));
}

#[tokio::test]
async fn test_gemini_describes_image() {
    e2e_skip_unless_gemini!();
    let model = LlmModel::from_config(&ServerConfig::default()).expect("provider should build");
    let red = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 64, Rgba([255, 0, 0, 255])));

    let answer = model
        .generate(ModelInput::Image {
            image: red,
            prompt: "What single colour fills this image? Answer in one word.".into(),
        })
        .await
        .expect("Gemini vision call should succeed");

    println!("answer: {answer}");
    assert!(answer.to_lowercase().contains("red"));
}
