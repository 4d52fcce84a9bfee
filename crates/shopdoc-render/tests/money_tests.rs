use shopdoc_render::*;

#[test]
fn test_number_to_words_reference_values() {
    assert_eq!(number_to_words(0.0), "Zero Rupees Only");
    assert_eq!(number_to_words(100_000.0), "One Lakh Rupees Only");
    assert_eq!(
        number_to_words(12_345_678.0),
        "One Crore Twenty Three Lakh Forty Five Thousand Six Hundred Seventy Eight Rupees Only"
    );
}

#[test]
fn test_number_to_words_ignores_paise() {
    assert_eq!(number_to_words(1_180.75), "One Thousand One Hundred Eighty Rupees Only");
    assert_eq!(number_to_words(0.99), "Zero Rupees Only");
}

#[test]
fn test_currency_uses_indian_grouping() {
    assert_eq!(format_currency(12_345_678.5, true), "\u{20B9}1,23,45,678.50");
    assert_eq!(format_currency(999.0, false), "\u{20B9}999");
    assert_eq!(format_currency(100_000.0, false), "\u{20B9}1,00,000");
}
