// src/rules.rs
use crate::message::{Message, Role};

/// Every canned reply the fallback table can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    Flight,
    Hotel,
    Package,
    Manali,
    Goa,
    Booking,
    Payment,
    Hindi,
    Default,
    BookingDetails,
    PaymentPrompt,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Flight => "flight",
            Topic::Hotel => "hotel",
            Topic::Package => "package",
            Topic::Manali => "manali",
            Topic::Goa => "goa",
            Topic::Booking => "booking",
            Topic::Payment => "payment",
            Topic::Hindi => "hindi",
            Topic::Default => "default",
            Topic::BookingDetails => "booking_details",
            Topic::PaymentPrompt => "payment_prompt",
        }
    }
}

pub const DEFAULT_REPLY: &str = "Hello! I can help you book flights, hotels, and plan your trip. \
    How can I assist you today?";
pub const FLIGHT_REPLY: &str = "I'd be happy to help you book a flight. Could you please tell me \
    your departure city, destination, and travel dates?";
pub const HOTEL_REPLY: &str = "I can help you find the perfect hotel. What's your destination, \
    check-in and check-out dates, and how many guests will be staying?";
pub const PACKAGE_REPLY: &str = "Looking for a complete travel package? Great choice! Where would \
    you like to go, and when are you planning to travel?";
pub const MANALI_REPLY: &str = "Manali is a beautiful destination! Would you like me to help you \
    find flights to Manali, hotels in the area, or a complete package?";
pub const GOA_REPLY: &str = "Goa is a fantastic choice! Are you interested in beach resorts, \
    budget accommodations, or luxury hotels in Goa?";
pub const BOOKING_REPLY: &str = "I've found some great options for you. To proceed with the \
    booking, I'll need some details. Would you like to continue?";
pub const PAYMENT_REPLY: &str = "Your booking has been confirmed! Your confirmation number is \
    TRV-2025-58742. You'll receive a detailed itinerary via email shortly. Thank you for booking \
    with TravelAI!";
pub const HINDI_REPLY: &str =
    "नमस्ते! मैं आपकी यात्रा की योजना बनाने में मदद कर सकता हूं। आप कहां जाना चाहते हैं?";
pub const BOOKING_DETAILS_REPLY: &str = "Great choice! To proceed with the booking, I'll need \
    some details:\n\n1. Your full name\n2. Email address\n3. Phone number\n\nOnce you provide \
    these details, I can confirm your booking.";
pub const PAYMENT_PROMPT_REPLY: &str = "Thank you for providing your details. You can now \
    proceed to payment to complete your booking. Would you like to pay now?";

#[derive(Clone, Debug)]
pub struct KeywordRule {
    pub topic: Topic,
    pub keywords: Vec<String>,
    pub reply: String,
}

impl KeywordRule {
    pub fn new(topic: Topic, keywords: &[&str], reply: impl Into<String>) -> Self {
        Self {
            topic,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            reply: reply.into(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

#[derive(Clone, Debug)]
pub enum OverrideCondition {
    AnyOf(Vec<String>),
    AllOf(Vec<String>),
}

impl OverrideCondition {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            OverrideCondition::AnyOf(phrases) => {
                phrases.iter().any(|p| lowered.contains(p.as_str()))
            }
            OverrideCondition::AllOf(phrases) => {
                phrases.iter().all(|p| lowered.contains(p.as_str()))
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct OverrideRule {
    pub topic: Topic,
    pub condition: OverrideCondition,
    pub reply: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackMatch<'a> {
    pub topic: Topic,
    pub reply: &'a str,
}

/// Keyword-to-reply table used when no model reply is available.
///
/// Keyword rules are tried in order and the first hit wins. Overrides run
/// afterwards, each one checked on its own, so a later override replaces an
/// earlier one when both match.
#[derive(Clone, Debug)]
pub struct RuleTable {
    rules: Vec<KeywordRule>,
    overrides: Vec<OverrideRule>,
    default_reply: String,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::travel()
    }
}

impl RuleTable {
    pub fn new(
        rules: Vec<KeywordRule>,
        overrides: Vec<OverrideRule>,
        default_reply: impl Into<String>,
    ) -> Self {
        Self {
            rules,
            overrides,
            default_reply: default_reply.into(),
        }
    }

    pub fn travel() -> Self {
        let rules = vec![
            KeywordRule::new(Topic::Flight, &["flight", "fly"], FLIGHT_REPLY),
            KeywordRule::new(Topic::Hotel, &["hotel", "stay", "room"], HOTEL_REPLY),
            KeywordRule::new(Topic::Package, &["package", "all inclusive"], PACKAGE_REPLY),
            KeywordRule::new(Topic::Manali, &["manali"], MANALI_REPLY),
            KeywordRule::new(Topic::Goa, &["goa"], GOA_REPLY),
            KeywordRule::new(Topic::Booking, &["book", "reserve"], BOOKING_REPLY),
            KeywordRule::new(Topic::Payment, &["payment", "pay", "completed"], PAYMENT_REPLY),
            KeywordRule::new(Topic::Hindi, &["hindi", "हिंदी"], HINDI_REPLY),
        ];

        let overrides = vec![
            OverrideRule {
                topic: Topic::BookingDetails,
                condition: OverrideCondition::AnyOf(vec!["like to book this".to_string()]),
                reply: BOOKING_DETAILS_REPLY.to_string(),
            },
            OverrideRule {
                topic: Topic::PaymentPrompt,
                condition: OverrideCondition::AllOf(vec![
                    "name".to_string(),
                    "email".to_string(),
                    "phone".to_string(),
                ]),
                reply: PAYMENT_PROMPT_REPLY.to_string(),
            },
        ];

        Self::new(rules, overrides, DEFAULT_REPLY)
    }

    pub fn detect_topic(&self, text: &str) -> Topic {
        self.resolve(text).topic
    }

    pub fn resolve(&self, text: &str) -> FallbackMatch<'_> {
        let lowered = text.to_lowercase();

        let mut selected = self
            .rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| FallbackMatch {
                topic: rule.topic,
                reply: rule.reply.as_str(),
            })
            .unwrap_or(FallbackMatch {
                topic: Topic::Default,
                reply: self.default_reply.as_str(),
            });

        for rule in &self.overrides {
            if rule.condition.matches(&lowered) {
                selected = FallbackMatch {
                    topic: rule.topic,
                    reply: rule.reply.as_str(),
                };
            }
        }

        selected
    }
}

/// Content of the most recent user message, or "" when there is none.
pub fn last_user_text(history: &[Message]) -> &str {
    history
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}
