use super::*;

#[test]
fn storage_path_is_namespaced_by_year_and_month() {
    let now = OffsetDateTime::from_unix_timestamp_nanos(1_700_000_000_123_000_000).unwrap();
    assert_eq!(storage_path("cafe.png", now), "menu/2023/11/1700000000123_cafe.png");
}

#[test]
fn storage_path_pads_single_digit_months() {
    // 2024-03-01T00:00:00Z
    let now = OffsetDateTime::from_unix_timestamp(1_709_251_200).unwrap();
    assert_eq!(storage_path("a.jpg", now), "menu/2024/03/1709251200000_a.jpg");
}

#[test]
fn content_type_ignores_extension_case() {
    assert_eq!(content_type_for("cafe_menu.PNG"), "image/png");
    assert_eq!(content_type_for("x.JpEg"), "image/jpeg");
    assert_eq!(content_type_for("noext"), "application/octet-stream");
}

#[test]
fn preview_is_a_base64_data_url() {
    let pending = PendingUpload::new("dot.gif", b"GIF89a".to_vec());
    assert_eq!(pending.preview_data_url(), "data:image/gif;base64,R0lGODlh");
}

#[test]
fn debug_omits_image_bytes() {
    let pending = PendingUpload::new("big.png", vec![7; 4096]);
    let rendered = format!("{pending:?}");
    assert!(rendered.contains("len: 4096"));
    assert!(!rendered.contains("7, 7"));
}

#[tokio::test]
async fn read_picks_up_name_and_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Çay.webp");
    std::fs::write(&path, [1_u8, 2, 3]).unwrap();

    let pending = PendingUpload::read(&path).await.unwrap();
    assert_eq!(pending.file_name, "Çay.webp");
    assert_eq!(pending.content_type, "image/webp");
    assert_eq!(pending.bytes, vec![1, 2, 3]);
}

#[tokio::test]
async fn read_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = PendingUpload::read(&dir.path().join("gone.png")).await.unwrap_err();
    assert!(matches!(err, UploadError::Read { .. }));
}
