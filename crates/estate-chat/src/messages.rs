//! User-facing texts.

pub const WELCOME: &str = "Приветствую! 👋 Я твой виртуальный помощник по недвижимости.\n\n\
🏠 Основные команды:\n\
• /start - Начало работы\n\
• /help - Список команд\n\
• /search - Найти квартиры 🔎\n\
• /ai_mode - AI-режим\n\
• /voice_mode - Голосовой режим\n\n\
Просто напиши мне о том, что ищешь, и я подберу лучшие варианты! 😊";

pub const THINKING: &str = "🤔 Думаю...";
pub const AI_FAILED: &str = "❌ Не удалось обработать ваш запрос. Попробуйте сформулировать иначе.";
pub const NOT_UNDERSTOOD: &str = "Я не понял вашего вопроса";

pub const VOICE_DISABLED: &str = "ℹ️ Для голосового общения активируйте функцию /voice_mode";
pub const SPEECH_NOT_RECOGNIZED: &str =
    "🔇 Не удалось распознать речь. Пожалуйста, повторите или пишите текстом.";
pub const AUDIO_FAILED: &str = "❌ Не удалось обработать аудио. Попробуйте ещё раз.";
pub const SPEECH_SYNTH_FAILED: &str = "🔇 Не удалось озвучить ответ.";

pub const AI_RECOMMENDATION_LEAD: &str = "✨ Кстати, вот отличный вариант для вас:";
pub const TEMPLATE_RECOMMENDATION_LEAD: &str = "🏠 Рекомендую посмотреть этот вариант:";

pub const NO_LISTINGS: &str =
    "😔 К сожалению, сейчас нет доступных вариантов. Загляните позже, база постоянно обновляется!";

pub fn you_said(text: &str) -> String {
    format!("🔊 Вы сказали: {}", text)
}

pub fn ai_mode_state(enabled: bool) -> String {
    format!("🤖 AI режим {}", on_off(enabled))
}

pub fn voice_mode_state(enabled: bool) -> String {
    format!("🎤 Голосовой режим {}", on_off(enabled))
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "включен"
    } else {
        "выключен"
    }
}
