//! Canned farming advisor.
//!
//! Replies are chosen by keyword; the first matching topic wins.

use std::time::Duration;

use tokio::time::sleep;

use crate::models::{MessageType, NewChatMessage};

/// Greeting shown at the start of a conversation.
pub const WELCOME_MESSAGE: &str = "Hello! I'm your AI farming assistant. I can help you with crop advice, weather guidance, pest control, market insights, and more. How can I assist you today?";

/// Shown when a reply could not be produced or stored.
pub const UNAVAILABLE_MESSAGE: &str =
    "Sorry, I'm having trouble connecting right now. Please try again in a moment.";

/// What a question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Weather,
    Crops,
    Pests,
    Market,
    Fertilizer,
    Irrigation,
    General,
}

impl Topic {
    const KEYWORDS: [(Topic, &'static [&'static str]); 6] = [
        (Topic::Weather, &["weather"]),
        (Topic::Crops, &["crop", "plant"]),
        (Topic::Pests, &["pest", "disease"]),
        (Topic::Market, &["market", "price"]),
        (Topic::Fertilizer, &["fertilizer", "nutrition"]),
        (Topic::Irrigation, &["irrigation", "water"]),
    ];

    /// Classify a question.
    pub fn detect(message: &str) -> Topic {
        let lower = message.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(topic, _)| *topic)
            .unwrap_or(Topic::General)
    }

    pub fn reply(&self) -> &'static str {
        match self {
            Topic::Weather => "Based on current weather conditions, I recommend:\n\n• Avoid irrigation today due to expected rainfall\n• Consider applying fungicide before the rain\n• Harvest ready crops within the next 2 days\n• Prepare drainage systems for excess water",
            Topic::Crops => "For this season, I suggest:\n\n• Wheat: Excellent choice given current soil conditions\n• Mustard: Good market prices expected\n• Barley: Suitable for your climate zone\n• Consider crop rotation to maintain soil health",
            Topic::Pests => "For pest and disease management:\n\n• Use integrated pest management (IPM) approach\n• Apply neem-based organic pesticides\n• Maintain proper field hygiene\n• Monitor crops weekly for early detection\n• Consider beneficial insects for biological control",
            Topic::Market => "Current market insights:\n\n• Wheat prices are up 4.88% this week - good time to sell\n• Rice prices declining - consider holding if possible\n• Sugarcane demand is stable with steady prices\n• Export opportunities available for quality produce",
            Topic::Fertilizer => "Fertilizer recommendations:\n\n• Conduct soil testing first\n• Apply nitrogen in split doses\n• Use organic compost to improve soil structure\n• Consider micronutrient supplements\n• Time application with crop growth stages",
            Topic::Irrigation => "Water management tips:\n\n• Use drip irrigation for water efficiency\n• Monitor soil moisture levels\n• Irrigate early morning or evening\n• Implement rainwater harvesting\n• Adjust frequency based on crop stage and weather",
            Topic::General => "I understand you're asking about farming practices. Based on your query, I recommend:\n\n• Consult with local agricultural extension officers\n• Consider soil and water testing\n• Follow integrated farming approaches\n• Keep detailed records of your farming activities\n\nCould you provide more specific details about your situation so I can give more targeted advice?",
        }
    }
}

/// A suggested question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    pub label: &'static str,
    pub query: &'static str,
}

pub const QUICK_ACTIONS: [QuickAction; 4] = [
    QuickAction {
        label: "Weather advice",
        query: "What should I do based on today's weather?",
    },
    QuickAction {
        label: "Crop recommendations",
        query: "What crops should I plant this season?",
    },
    QuickAction {
        label: "Pest control",
        query: "How do I deal with pest problems in my wheat field?",
    },
    QuickAction {
        label: "Market prices",
        query: "What are the current market prices for my crops?",
    },
];

/// Produces advisor replies, optionally after a simulated thinking delay.
#[derive(Debug, Clone, Default)]
pub struct Advisor {
    delay: Option<Duration>,
}

impl Advisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }

    /// Reply to `message`.
    pub async fn respond(&self, message: &str) -> NewChatMessage {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        NewChatMessage::from_ai(Topic::detect(message).reply(), MessageType::Text)
    }

    pub fn welcome() -> NewChatMessage {
        NewChatMessage::from_ai(WELCOME_MESSAGE, MessageType::Info)
    }

    pub fn unavailable() -> NewChatMessage {
        NewChatMessage::from_ai(UNAVAILABLE_MESSAGE, MessageType::Warning)
    }
}
