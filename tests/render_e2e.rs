use certforge::{
    CertificateError, CertificateRenderer, CertificateRequest, encode_verification_code,
    inspect_pdf_bytes, inspect_pdf_path,
};
use chrono::NaiveDate;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn request(output: &Path) -> CertificateRequest {
    CertificateRequest {
        output_path: output.to_path_buf(),
        certificate_number: "CERT-2024-0042".to_string(),
        verification_url: "https://verify.example.org/c/CERT-2024-0042".to_string(),
        student_name: "Ada Lovelace".to_string(),
        student_photo_source: None,
        course_title: "Analytical Engines".to_string(),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 3, 1),
        issue_date: date(2024, 3, 5),
        performance_label: Some("Distinction".to_string()),
        remarks: Some("Completed every practical.".to_string()),
    }
}

fn renderer(root: &Path) -> CertificateRenderer {
    CertificateRenderer::builder()
        .asset_root(root)
        .build()
        .expect("renderer")
}

fn write_photo(path: &Path) {
    let img = RgbImage::from_fn(60, 80, |x, y| Rgb([(x * 4) as u8, (y * 3) as u8, 128]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode photo");
    std::fs::write(path, bytes).expect("write photo");
}

#[tokio::test]
async fn renders_certificate_without_photo() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("out/cert.pdf");
    let mut req = request(&out);
    req.issue_date = date(2024, 3, 2);
    req.performance_label = Some("Excellent".to_string());
    req.remarks = Some(String::new());
    let summary = renderer(dir.path()).render(&req).await.expect("render");

    assert_eq!(summary.output_path, out);
    assert!(summary.bytes > 0);
    assert!(!summary.photo_embedded);
    let report = inspect_pdf_path(&out).expect("inspect");
    assert_eq!(report.page_count, 1);
    assert_eq!(report.file_size_bytes, summary.bytes);
    assert_eq!(report.title.as_deref(), Some("Certificate CERT-2024-0042"));
    assert!(report.contains_text("Ada Lovelace"));
    assert!(report.contains_text("1/1/2024 to 3/1/2024"));
    assert!(report.contains_text("No Photo"));
    assert!(report.contains_text("3/2/2024"));
    assert!(report.contains_text("Excellent"));
    assert!(report.contains_text("CERT-2024-0042"));
    assert_eq!(report.images.len(), 1);
}

#[tokio::test]
async fn unreachable_photo_host_falls_back_to_placeholder() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let mut req = request(&dir.path().join("cert.pdf"));
    req.student_photo_source = Some(format!("http://127.0.0.1:{port}/photo.png"));

    let rendered = renderer(dir.path())
        .render_to_bytes(&req)
        .await
        .expect("render");
    assert!(!rendered.photo_embedded);
    let report = inspect_pdf_bytes(&rendered.pdf).expect("inspect");
    assert!(report.contains_text("No Photo"));
}

#[tokio::test]
async fn local_photo_is_embedded() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_photo(&dir.path().join("photo.png"));
    let out = dir.path().join("cert.pdf");
    let mut req = request(&out);
    req.student_photo_source = Some("/photo.png".to_string());

    let summary = renderer(dir.path()).render(&req).await.expect("render");
    assert!(summary.photo_embedded);
    let report = inspect_pdf_path(&out).expect("inspect");
    assert_eq!(report.images.len(), 2);
    assert!(!report.contains_text("No Photo"));
    assert!(
        report
            .images
            .iter()
            .any(|img| img.width == 60 && img.height == 80 && img.color_space == "DeviceRGB")
    );
}

#[tokio::test]
async fn undecodable_photo_still_produces_a_certificate() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("photo.png"), b"definitely not an image").expect("seed");
    let mut req = request(&dir.path().join("cert.pdf"));
    req.student_photo_source = Some("photo.png".to_string());

    let rendered = renderer(dir.path())
        .render_to_bytes(&req)
        .await
        .expect("render");
    assert!(!rendered.photo_embedded);
    let report = inspect_pdf_bytes(&rendered.pdf).expect("inspect");
    assert_eq!(report.images.len(), 1);
    assert!(report.contains_text("Ada Lovelace"));
}

#[tokio::test]
async fn verification_code_scans_back_to_the_url() {
    let dir = tempfile::tempdir().expect("tempdir");
    let req = request(&dir.path().join("cert.pdf"));
    let rendered = renderer(dir.path())
        .render_to_bytes(&req)
        .await
        .expect("render");
    let report = inspect_pdf_bytes(&rendered.pdf).expect("inspect");

    let side = encode_verification_code(&req.verification_url)
        .expect("encode")
        .pixel_width();
    let code = report
        .images
        .iter()
        .find(|img| img.width == side && img.height == side)
        .expect("verification code image");
    let samples = code.gray_samples().expect("gray samples");
    let width = code.width as usize;

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        code.width as usize,
        code.height as usize,
        |x, y| samples[y * width + x],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1);
    let (_, content) = grids[0].decode().expect("decode");
    assert_eq!(content, req.verification_url);
}

#[tokio::test]
async fn concurrent_renders_do_not_interfere() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_photo(&dir.path().join("photo.png"));
    let renderer = renderer(dir.path());
    let other = renderer.clone();

    let first = request(&dir.path().join("first.pdf"));
    let mut second = request(&dir.path().join("second.pdf"));
    second.student_name = "Grace Hopper".to_string();
    second.student_photo_source = Some("photo.png".to_string());

    let (a, b) = tokio::join!(renderer.render(&first), other.render(&second));
    assert!(!a.expect("first").photo_embedded);
    assert!(b.expect("second").photo_embedded);

    let first_report = inspect_pdf_path(&first.output_path).expect("first");
    let second_report = inspect_pdf_path(&second.output_path).expect("second");
    assert!(first_report.contains_text("Ada Lovelace"));
    assert!(!first_report.contains_text("Grace Hopper"));
    assert!(second_report.contains_text("Grace Hopper"));
    assert_eq!(first_report.images.len(), 1);
    assert_eq!(second_report.images.len(), 2);
}

#[tokio::test]
async fn unwritable_output_is_a_write_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").expect("seed");

    let err = renderer(dir.path())
        .render(&request(&blocker.join("cert.pdf")))
        .await
        .expect_err("parent is a file");
    assert!(matches!(err, CertificateError::Write { .. }));
    assert!(!err.is_request_error());
}
