//! The datasets shipped under `data/` load and classify as expected.

use std::path::PathBuf;

use estate_chat::{IntentClassifier, ResponseGenerator};
use estate_core::config::EstateConfig;
use estate_core::types::{labels, Intent};

fn config() -> EstateConfig {
    let mut config = EstateConfig::default();
    config.general.data_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../data")
        .to_string_lossy()
        .to_string();
    config
}

#[test]
fn test_sample_datasets_load() {
    let config = config();
    let classifier = IntentClassifier::load(&config);
    let generator = ResponseGenerator::load(&config);

    assert_eq!(classifier.intent_count(), 5);
    assert_eq!(classifier.dialogue_pair_count(), 4);
    assert_eq!(generator.listing_count(), 4);
}

#[test]
fn test_sample_classification() {
    let classifier = IntentClassifier::load(&config());

    let result = classifier.classify("Здравствуйте! Ищу квартиру", false);
    assert_eq!(result.intent, Intent::named(labels::GREETING));

    let result = classifier.classify("Хочу снять студию", false);
    assert_eq!(result.intent, Intent::named(labels::APARTMENT));

    let result = classifier.classify("Как оформить ипотеку?", false);
    assert_eq!(result.intent, Intent::DialogueAnswer);
    assert!(result.reply.unwrap().contains("ипотеки"));

    let result = classifier.classify("какая погода завтра", false);
    assert_eq!(result.intent, Intent::Unknown);
}
