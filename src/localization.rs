//! User-facing message catalog backed by Fluent resources.
//!
//! Resources live under `./locales/<lang>/main.ftl`. The language is taken
//! from the Telegram user's `language_code`; unsupported languages fall back
//! to English.

use std::collections::HashMap;
use std::fs;
use std::sync::OnceLock;

use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use unic_langid::LanguageIdentifier;

pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "ru"];
pub const FALLBACK_LANGUAGE: &str = "en";

/// Localization manager for the dish bot
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a manager with every supported language loaded.
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for lang in SUPPORTED_LANGUAGES {
            let locale: LanguageIdentifier = lang.parse()?;
            let bundle = Self::create_bundle(&locale)?;
            bundles.insert(lang.to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: &LanguageIdentifier) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Telegram renders the bidi isolation marks fluent inserts by default
        // as visible garbage
        bundle.set_use_isolating(false);

        let resource_path = format!("./locales/{}/main.ftl", locale);
        if let Ok(content) = fs::read_to_string(&resource_path) {
            if let Ok(resource) = FluentResource::try_new(content) {
                let _ = bundle.add_resource(resource);
            }
        }

        Ok(bundle)
    }

    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.bundles.contains_key(lang)
    }

    /// Get a localized message in a specific language, falling back to
    /// English for unknown languages or untranslated keys.
    pub fn get_message_in_language(
        &self,
        key: &str,
        lang: &str,
        args: Option<&FluentArgs>,
    ) -> String {
        if let Some(bundle) = self.bundles.get(lang) {
            if let Some(text) = Self::format_message(bundle, key, args) {
                return text;
            }
        }

        if lang != FALLBACK_LANGUAGE {
            if let Some(bundle) = self.bundles.get(FALLBACK_LANGUAGE) {
                if let Some(text) = Self::format_message(bundle, key, args) {
                    return text;
                }
            }
        }

        format!("Missing translation: {key}")
    }

    fn format_message(
        bundle: &FluentBundle<FluentResource>,
        key: &str,
        args: Option<&FluentArgs>,
    ) -> Option<String> {
        let msg = bundle.get_message(key)?;
        let pattern = msg.value()?;

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, args, &mut errors);
        Some(value.into_owned())
    }
}

/// Map a Telegram `language_code` onto a supported language, stripping any
/// region subtag ("ru-RU" → "ru").
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let Some(code) = language_code else {
        return FALLBACK_LANGUAGE;
    };

    let primary = code.split('-').next().unwrap_or(code);
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| **lang == primary)
        .copied()
        .unwrap_or(FALLBACK_LANGUAGE)
}

/// Global localization instance
static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager. Safe to call more than once.
pub fn init_localization() -> Result<()> {
    if LOCALIZATION_MANAGER.get().is_none() {
        let manager = LocalizationManager::new()?;
        let _ = LOCALIZATION_MANAGER.set(manager);
    }
    Ok(())
}

/// Get the global localization manager
pub fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER
        .get()
        .expect("Localization manager not initialized")
}

/// Get a localized message for a Telegram language code.
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    get_localization_manager().get_message_in_language(key, detect_language(language_code), None)
}

/// Get a localized message with arguments for a Telegram language code.
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let mut fluent_args = FluentArgs::new();
    for (name, value) in args {
        fluent_args.set(*name, FluentValue::from(*value));
    }

    get_localization_manager().get_message_in_language(
        key,
        detect_language(language_code),
        Some(&fluent_args),
    )
}
