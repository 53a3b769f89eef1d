//! Intent classifier: keyword, scripted-dialogue and probe-word passes.

use tracing::debug;

use estate_core::config::EstateConfig;
use estate_core::text::{normalize_input, normalize_response};
use estate_core::types::{ClassificationResult, Intent, Speaker};
use estate_storage::{DialogueScript, IntentTable};

/// High-frequency words re-tried against the dialogues when the message as a
/// whole matched nothing.
pub const PROBE_WORDS: [&str; 7] = [
    "привет",
    "здравствуй",
    "пока",
    "до свидания",
    "спасибо",
    "кто ты",
    "как дела",
];

/// A human turn followed by a bot turn.
#[derive(Debug, Clone)]
struct DialoguePair {
    /// Lower-cased human utterance.
    prompt: String,
    /// Bot utterance with its first letter capitalized.
    reply: String,
}

/// Classifies messages against the static intent table and dialogues.
///
/// Pure over its loaded state; safe to share between concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    intents: IntentTable,
    pairs: Vec<DialoguePair>,
}

impl IntentClassifier {
    pub fn new(intents: IntentTable, dialogues: &DialogueScript) -> Self {
        let pairs = dialogues
            .dialogues()
            .iter()
            .flat_map(|dialogue| dialogue.turns.windows(2))
            .filter(|w| w[0].speaker == Speaker::Human && w[1].speaker == Speaker::Bot)
            .filter_map(|w| {
                let prompt = normalize_input(&w[0].utterance);
                let reply = normalize_response(&w[1].utterance);
                // An empty prompt would match every message.
                (!prompt.is_empty() && !reply.is_empty()).then_some(DialoguePair { prompt, reply })
            })
            .collect();
        Self { intents, pairs }
    }

    /// Load both datasets from the configured data directory. Missing or
    /// malformed files leave the corresponding pass empty.
    pub fn load(config: &EstateConfig) -> Self {
        let intents = IntentTable::load_or_empty(&config.data_path(&config.dataset.intents_file));
        let dialogues =
            DialogueScript::load_or_empty(&config.data_path(&config.dataset.dialogues_file));
        Self::new(intents, &dialogues)
    }

    pub fn intent_count(&self) -> usize {
        self.intents.len()
    }

    pub fn dialogue_pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn classify(&self, text: &str, ai_mode: bool) -> ClassificationResult {
        if ai_mode {
            return ClassificationResult::intent(Intent::AiDirect);
        }

        let text = normalize_input(text);
        if text.is_empty() {
            return ClassificationResult::unknown();
        }

        if let Some(intent) = self.match_keywords(&text) {
            debug!(intent = %intent, "Keyword match");
            return ClassificationResult::intent(Intent::named(intent));
        }

        if let Some(reply) = self.match_dialogue(&text) {
            debug!("Dialogue match");
            return ClassificationResult::dialogue_answer(reply.to_string());
        }

        for word in PROBE_WORDS.iter().filter(|w| text.contains(*w)) {
            if let Some(reply) = self.match_dialogue(word) {
                debug!(probe = %word, "Probe word dialogue match");
                return ClassificationResult::dialogue_answer(reply.to_string());
            }
        }

        ClassificationResult::unknown()
    }

    fn match_keywords(&self, text: &str) -> Option<&str> {
        self.intents
            .entries()
            .iter()
            .find(|entry| entry.triggers.iter().any(|t| text.contains(t.as_str())))
            .map(|entry| entry.name.as_str())
    }

    fn match_dialogue(&self, text: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|pair| text.contains(pair.prompt.as_str()) || pair.prompt.contains(text))
            .map(|pair| pair.reply.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_core::types::labels;

    fn classifier(intents: &str, script: &str) -> IntentClassifier {
        IntentClassifier::new(
            IntentTable::from_json_str(intents).unwrap(),
            &DialogueScript::parse(script),
        )
    }

    #[test]
    fn test_ai_mode_short_circuits() {
        let c = classifier(r#"{"greeting": ["привет"]}"#, "");
        let result = c.classify("привет", true);
        assert_eq!(result.intent, Intent::AiDirect);
        assert!(result.reply.is_none());
    }

    #[test]
    fn test_empty_input_is_unknown() {
        let c = classifier(r#"{"greeting": ["привет"]}"#, "H: привет\nB: здравствуйте");
        assert_eq!(c.classify("   ", false), ClassificationResult::unknown());
        assert_eq!(c.classify("", false), ClassificationResult::unknown());
    }

    #[test]
    fn test_keyword_match_case_insensitive() {
        let c = classifier(r#"{"greeting": ["привет"]}"#, "");
        let result = c.classify("Привет!", false);
        assert_eq!(result.intent, Intent::named(labels::GREETING));
        assert!(result.reply.is_none());
    }

    #[test]
    fn test_first_intent_in_load_order_wins() {
        let c = classifier(
            r#"{"apartment": ["квартир"], "greeting": ["привет"]}"#,
            "",
        );
        let result = c.classify("привет, ищу квартиру", false);
        assert_eq!(result.intent, Intent::named(labels::APARTMENT));
    }

    #[test]
    fn test_keywords_before_dialogues() {
        let c = classifier(r#"{"greeting": ["привет"]}"#, "H: привет\nB: здравствуйте");
        assert_eq!(c.classify("привет", false).intent, Intent::named("greeting"));
    }

    #[test]
    fn test_dialogue_answer_is_capitalized() {
        let c = classifier("{}", "H: привет\nB: здравствуйте");
        let result = c.classify("привет", false);
        assert_eq!(result.intent, Intent::DialogueAnswer);
        assert_eq!(result.reply.as_deref(), Some("Здравствуйте"));
    }

    #[test]
    fn test_dialogue_match_both_directions() {
        let c = classifier("{}", "H: сколько стоит аренда\nB: от 30 тысяч");
        // Human utterance inside the message.
        let r = c.classify("скажите, сколько стоит аренда в центре?", false);
        assert_eq!(r.reply.as_deref(), Some("От 30 тысяч"));
        // Message inside the human utterance.
        let r = c.classify("аренда", false);
        assert_eq!(r.reply.as_deref(), Some("От 30 тысяч"));
    }

    #[test]
    fn test_dialogue_requires_following_bot_turn() {
        let c = classifier(
            "{}",
            "H: ипотека\nH: повторяю\n==========\nH: ипотека\nB: банк одобрит",
        );
        assert_eq!(c.classify("ипотека", false).reply.as_deref(), Some("Банк одобрит"));
    }

    #[test]
    fn test_empty_bot_answer_skipped() {
        let c = classifier("{}", "H: вопрос\nB:\n==========\nH: вопрос\nB: ответ");
        assert_eq!(c.classify("вопрос", false).reply.as_deref(), Some("Ответ"));
    }

    #[test]
    fn test_probe_word_fallback() {
        let c = classifier("{}", "H: ну привет\nB: и вам привет");
        // Whole message matches no dialogue, but the probe word does.
        let r = c.classify("привет, бот, что умеешь делать?", false);
        assert_eq!(r.intent, Intent::DialogueAnswer);
        assert_eq!(r.reply.as_deref(), Some("И вам привет"));
    }

    #[test]
    fn test_no_match_is_unknown() {
        let c = classifier(r#"{"greeting": ["привет"]}"#, "H: пока\nB: до встречи");
        assert_eq!(c.classify("какая погода", false), ClassificationResult::unknown());
    }

    #[test]
    fn test_empty_datasets_always_unknown() {
        let c = IntentClassifier::default();
        for text in ["привет", "квартира", "пока"] {
            assert_eq!(c.classify(text, false), ClassificationResult::unknown());
        }
    }

    #[test]
    fn test_substring_match_is_unscoped() {
        // Short trigger phrases also fire inside longer words.
        let c = classifier(r#"{"goodbye": ["пока"]}"#, "");
        assert_eq!(c.classify("покажите квартиры", false).intent, Intent::named("goodbye"));
    }

    #[test]
    fn test_load_from_config_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EstateConfig::default();
        config.general.data_dir = dir.path().to_string_lossy().into_owned();
        let c = IntentClassifier::load(&config);
        assert_eq!(c.intent_count(), 0);
        assert_eq!(c.dialogue_pair_count(), 0);
    }
}
