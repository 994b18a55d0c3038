use dishbot::localization::{
    detect_language, get_localization_manager, init_localization, t_args_lang, t_lang,
};

/// Every key the bot sends to users. Both locale files must resolve all of
/// them, otherwise users see "Missing translation" markers.
const MESSAGE_KEYS: &[&str] = &[
    "welcome-title",
    "welcome-description",
    "welcome-commands",
    "help-title",
    "help-steps",
    "help-limits",
    "suggest-intro",
    "suggest-step-photo",
    "suggest-step-name",
    "suggest-step-description",
    "suggest-step-price",
    "photo-received",
    "name-accepted",
    "description-accepted",
    "description-skipped",
    "error-photo-expected",
    "error-photo-fetch",
    "error-name-length",
    "error-description-too-long",
    "error-price-invalid",
    "error-price-range",
    "error-text-expected",
    "error-store",
    "preview-title",
    "preview-photo",
    "preview-name",
    "preview-description",
    "preview-none",
    "preview-price",
    "preview-question",
    "button-cancel",
    "button-skip",
    "button-confirm",
    "button-reject",
    "button-like",
    "button-dislike",
    "suggestion-submitted",
    "suggestion-submitted-hint",
    "suggestion-cancelled",
    "status-empty",
    "status-title",
    "status-approved",
    "status-pending",
    "dish-price",
    "vote-exhausted",
    "vote-recorded",
    "vote-already",
    "random-empty",
    "unknown-message",
];

#[test]
fn test_both_languages_are_loaded() {
    init_localization().expect("Failed to initialize localization");

    let manager = get_localization_manager();
    assert!(manager.is_language_supported("en"));
    assert!(manager.is_language_supported("ru"));
    assert!(!manager.is_language_supported("es"));
}

#[test]
fn test_every_key_resolves_in_every_language() {
    init_localization().expect("Failed to initialize localization");

    let manager = get_localization_manager();
    for lang in ["en", "ru"] {
        for key in MESSAGE_KEYS {
            let message = manager.get_message_in_language(key, lang, None);
            assert!(
                !message.starts_with("Missing translation"),
                "key {key} is missing in {lang}"
            );
            assert!(!message.is_empty(), "key {key} is empty in {lang}");
        }
    }
}

#[test]
fn test_languages_actually_differ() {
    init_localization().expect("Failed to initialize localization");

    let manager = get_localization_manager();
    let title_en = manager.get_message_in_language("welcome-title", "en", None);
    let title_ru = manager.get_message_in_language("welcome-title", "ru", None);

    assert_ne!(title_en, title_ru);
}

#[test]
fn test_unsupported_language_falls_back_to_english() {
    init_localization().expect("Failed to initialize localization");

    let manager = get_localization_manager();
    let fallback = manager.get_message_in_language("welcome-title", "de", None);
    let english = manager.get_message_in_language("welcome-title", "en", None);

    assert_eq!(fallback, english);
}

#[test]
fn test_arguments_are_interpolated() {
    init_localization().expect("Failed to initialize localization");

    for lang in [Some("en"), Some("ru")] {
        let message = t_args_lang("name-accepted", &[("name", "Tonkatsu")], lang);
        assert!(message.contains("Tonkatsu"), "no name in: {message}");

        let price = t_args_lang("preview-price", &[("price", "199.50")], lang);
        assert!(price.contains("199.50"), "no price in: {price}");
    }
}

#[test]
fn test_language_detection_with_region_subtags() {
    assert_eq!(detect_language(Some("ru-RU")), "ru");
    assert_eq!(detect_language(Some("en-GB")), "en");
    assert_eq!(detect_language(Some("pt-BR")), "en");
    assert_eq!(detect_language(None), "en");
}

#[test]
fn test_t_lang_uses_detection() {
    init_localization().expect("Failed to initialize localization");

    assert_eq!(
        t_lang("button-cancel", Some("de")),
        t_lang("button-cancel", Some("en"))
    );
    assert_ne!(
        t_lang("button-cancel", Some("ru")),
        t_lang("button-cancel", Some("en"))
    );
}
