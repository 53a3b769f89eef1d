//! Response generator: templated replies and formatted listings.

use num_format::{Locale, ToFormattedString};
use rand::seq::IndexedRandom;
use rand::Rng;

use estate_core::config::EstateConfig;
use estate_core::types::{labels, Intent, Listing};
use estate_storage::ListingSet;

use crate::messages;

// =============================================================================
// Response sets
// =============================================================================

const GREETING: &[&str] = &[
    "Привет! Я ваш гид по недвижимости.",
    "Здравствуйте! Готов помочь с поиском жилья.",
    "Приветствую!",
];

const SELF_INFO: &[&str] = &[
    "Я бот-консультант по недвижимости. Могу помочь подобрать квартиру!",
    "Ваш виртуальный помощник по аренде и покупке жилья!",
    "Я специализируюсь на подборе недвижимости!",
];

const MOOD: &[&str] = &[
    "Всё отлично! Готов вам помочь.",
    "Работаю в штатном режиме! Ищу лучшие варианты для вас.",
    "Как в сказке! Чем могу помочь?",
    "Прекрасно!",
];

const GOODBYE: &[&str] = &[
    "До свидания! Возвращайтесь за новыми предложениями!",
    "Хорошего дня! Если нужна будет недвижимость, обращайтесь.",
    "Всего доброго!",
];

const LISTING_HEADERS: &[&str] = &[
    "Вот несколько вариантов квартир:",
    "Подобрал для вас лучшие актуальные предложения:",
    "Актуальные варианты жилья для вас:",
];

const STANDARD_STYLE: &str = "🏡 Хороший вариант";
const CONTACT_PLACEHOLDER: &str = "+7 (XXX) XXX-XX-XX";

fn style_label(style: Option<&str>) -> &'static str {
    match style {
        Some("luxury") => "💎 Премиум предложение",
        Some("budget") => "💰 Экономичный выбор",
        _ => STANDARD_STYLE,
    }
}

/// Fixed candidate set of a conversational intent.
fn response_set(intent: &str) -> Option<&'static [&'static str]> {
    match intent {
        labels::GREETING => Some(GREETING),
        labels::SELF_INFO => Some(SELF_INFO),
        labels::MOOD => Some(MOOD),
        labels::GOODBYE => Some(GOODBYE),
        _ => None,
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Render one listing. Deterministic: the same record always renders to the
/// same text.
pub fn format_listing(listing: &Listing) -> String {
    let mut out = format!(
        "{}\n🏢 {}\n📐 {} м² | {} комнаты\n🏷️ {} руб.{}\n",
        style_label(listing.style.as_deref()),
        listing.address,
        listing.area,
        listing.rooms,
        listing.price.to_formatted_string(&Locale::en),
        if listing.rental { "/мес." } else { "" },
    );

    if !listing.features.is_empty() {
        out.push_str("\n✨ Особенности:\n");
        for feature in &listing.features {
            out.push_str("• ");
            out.push_str(feature);
            out.push('\n');
        }
    }

    let description = listing.description.trim();
    if !description.is_empty() {
        out.push_str("\n📌 ");
        out.push_str(description);
        out.push('\n');
    }

    let contact = listing
        .contact
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(CONTACT_PLACEHOLDER);
    out.push_str("\n☎ Контакт: ");
    out.push_str(contact);
    out
}

// =============================================================================
// Generator
// =============================================================================

/// Produces the ordered reply messages for an intent.
#[derive(Debug, Clone)]
pub struct ResponseGenerator {
    listings: ListingSet,
    max_listings: usize,
}

impl ResponseGenerator {
    pub fn new(listings: ListingSet, max_listings: usize) -> Self {
        Self {
            listings,
            max_listings: max_listings.max(1),
        }
    }

    /// Load the listing dataset named in the configuration.
    pub fn load(config: &EstateConfig) -> Self {
        let listings = ListingSet::load_or_empty(&config.data_path(&config.dataset.listings_file));
        Self::new(listings, config.chat.max_listings)
    }

    pub fn listing_count(&self) -> usize {
        self.listings.len()
    }

    pub fn generate(&self, intent: &Intent) -> Vec<String> {
        self.generate_with(intent, &mut rand::rng())
    }

    /// [`Self::generate`] with a caller-supplied random source.
    pub fn generate_with<R: Rng + ?Sized>(&self, intent: &Intent, rng: &mut R) -> Vec<String> {
        let Intent::Named(name) = intent else {
            // ai-direct and dialogue-answer are resolved elsewhere; unknown
            // is left to the caller's fallback.
            return Vec::new();
        };

        if name == labels::APARTMENT {
            return self.listing_reply(rng);
        }

        response_set(name)
            .and_then(|set| set.choose(rng))
            .map(|s| vec![s.to_string()])
            .unwrap_or_default()
    }

    fn listing_reply<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let listings = self.listings.as_slice();
        let Some(header) = LISTING_HEADERS.choose(rng) else {
            return Vec::new();
        };
        if listings.is_empty() {
            return vec![messages::NO_LISTINGS.to_string()];
        }

        let mut replies = Vec::with_capacity(1 + self.max_listings.min(listings.len()));
        replies.push(header.to_string());
        replies.extend(
            listings
                .choose_multiple(rng, self.max_listings)
                .map(format_listing),
        );
        replies
    }

    /// One uniformly chosen listing, formatted; `None` when there are none.
    pub fn random_listing(&self) -> Option<String> {
        self.random_listing_with(&mut rand::rng())
    }

    pub fn random_listing_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        self.listings.as_slice().choose(rng).map(format_listing)
    }
}
