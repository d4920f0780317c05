/// Builds a URL slug from Vietnamese text.
///
/// Lower-cases, folds Vietnamese (and a few Latin-1) diacritics to their
/// base letter, drops everything outside `[a-z0-9 -]`, then joins words
/// with single dashes. The same title always yields the same slug.
pub fn create_slug(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .chars()
        .map(fold_diacritic)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(folded.len());
    for c in folded.chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'ã' | 'ả' | 'ạ' | 'ă' | 'ằ' | 'ắ' | 'ẳ' | 'ẵ' | 'ặ' | 'â' | 'ầ' | 'ấ' | 'ẩ'
        | 'ẫ' | 'ậ' | 'ä' => 'a',
        'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ề' | 'ế' | 'ể' | 'ễ' | 'ệ' | 'ë' => 'e',
        'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' | 'ï' | 'î' => 'i',
        'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ồ' | 'ố' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ờ' | 'ớ' | 'ở'
        | 'ỡ' | 'ợ' | 'ö' => 'o',
        'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ừ' | 'ứ' | 'ử' | 'ữ' | 'ự' | 'ü' | 'û' => 'u',
        'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' => 'y',
        'đ' => 'd',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_vietnamese_title() {
        assert_eq!(
            create_slug("Quy hoạch tổng thể quốc gia thời kỳ 2021-2030"),
            "quy-hoach-tong-the-quoc-gia-thoi-ky-2021-2030"
        );
    }

    #[test]
    fn folds_uppercase_d_stroke() {
        assert_eq!(create_slug("Đường sắt Bắc – Nam!"), "duong-sat-bac-nam");
    }

    #[test]
    fn collapses_separators_and_trims() {
        assert_eq!(create_slug("  --Tin   tức -- mới--  "), "tin-tuc-moi");
    }

    #[test]
    fn combining_marks_are_dropped() {
        // "Việt" written with combining marks instead of precomposed letters.
        let decomposed = "Vie\u{0323}\u{0302}t Nam";
        assert_eq!(create_slug(decomposed), "viet-nam");
    }

    #[test]
    fn is_deterministic() {
        let title = "Phường Âu Lâu - Tỉnh Lào Cai";
        assert_eq!(create_slug(title), create_slug(title));
        assert_eq!(create_slug(title), "phuong-au-lau-tinh-lao-cai");
    }

    #[test]
    fn symbols_only_yield_empty_slug() {
        assert_eq!(create_slug("!!! ??? ***"), "");
    }
}
