use super::*;

#[test]
fn strips_diacritics_and_replaces_spaces() {
    assert_eq!(safe_object_name("café menü.PNG"), "cafe_menu.PNG");
}

#[test]
fn no_extension_means_no_trailing_dot() {
    assert_eq!(safe_object_name("report"), "report");
}

#[test]
fn turkish_letters_fold_where_they_decompose() {
    // ı has no decomposition and falls through to `_`.
    assert_eq!(safe_object_name("Çiğ köfte ızgara.jpg"), "Cig_kofte__zgara.jpg");
}

#[test]
fn only_last_extension_is_split_off() {
    assert_eq!(safe_object_name("menu.2024.tar.gz"), "menu.2024.tar.gz");
    assert_eq!(safe_object_name("a b.c d"), "a_b.c_d");
}

#[test]
fn extension_is_filtered_like_the_base() {
    assert_eq!(safe_object_name("photo.jpé"), "photo.jpe");
    assert_eq!(safe_object_name("scan.p g"), "scan.p_g");
}

#[test]
fn non_latin_names_collapse_to_underscores() {
    assert_eq!(safe_object_name("日本.png"), "__.png");
}

#[test]
fn empty_name_falls_back() {
    assert_eq!(safe_object_name(".png"), ".png");
    assert_eq!(safe_object_name(""), "file");
    assert_eq!(safe_object_name("..."), "file");
}

#[test]
fn trailing_dots_are_dropped_without_extension() {
    assert_eq!(safe_object_name("photo."), "photo");
    assert_eq!(safe_object_name("photo.."), "photo");
}

#[test]
fn path_separators_are_replaced() {
    assert_eq!(safe_object_name("../etc/passwd"), ".._etc_passwd");
}

#[test]
fn sanitizing_twice_is_stable() {
    let inputs = [
        "café menü.PNG",
        "report",
        "photo..",
        "..png",
        ".hidden.png",
        "a..b",
        "日本語 メニュー.jpeg",
        "İskender (büyük).webp",
        "...",
        "",
        "x.y.",
        ".y.",
        "../etc/passwd",
        "ünlü-şef_özel.JPG",
    ];
    for input in inputs {
        let once = safe_object_name(input);
        assert_eq!(safe_object_name(&once), once, "input {input:?}");
        assert!(!once.is_empty());
    }
}
