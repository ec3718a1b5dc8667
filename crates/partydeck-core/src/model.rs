// Data model: colors, cards, drawn cards, and game sessions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum number of colors a session or a draw must be given.
pub const MIN_COLORS: usize = 2;

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// A team color as configured by the players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub id: String,
    /// Display name substituted into card templates (e.g. "Red").
    pub name: String,
    /// 6-digit RGB string, usually with a leading `#`. Not validated.
    pub hex: String,
}

impl Color {
    pub fn new(id: impl Into<String>, name: impl Into<String>, hex: impl Into<String>) -> Self {
        Color {
            id: id.into(),
            name: name.into(),
            hex: hex.into(),
        }
    }
}

/// Reject palettes with fewer than [`MIN_COLORS`] entries.
pub fn validate_colors(colors: &[Color]) -> Result<()> {
    if colors.len() < MIN_COLORS {
        return Err(Error::invalid_input(format!(
            "at least {MIN_COLORS} colors are required, got {}",
            colors.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// The closed set of card categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Drinking,
    Communication,
    Physical,
    Social,
    Roleplay,
    Competition,
    Flirty,
    Creative,
    Chaotic,
    Punishment,
}

/// Display metadata for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub id: Category,
    pub name: &'static str,
    pub emoji: &'static str,
    /// Accent color used by the frontend, as `#rrggbb`.
    pub color: &'static str,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Drinking,
        Category::Communication,
        Category::Physical,
        Category::Social,
        Category::Roleplay,
        Category::Competition,
        Category::Flirty,
        Category::Creative,
        Category::Chaotic,
        Category::Punishment,
    ];

    /// Parse the wire tag (e.g. `"drinking"`). Case-sensitive, like the JSON
    /// representation.
    pub fn from_tag(s: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Drinking => "drinking",
            Category::Communication => "communication",
            Category::Physical => "physical",
            Category::Social => "social",
            Category::Roleplay => "roleplay",
            Category::Competition => "competition",
            Category::Flirty => "flirty",
            Category::Creative => "creative",
            Category::Chaotic => "chaotic",
            Category::Punishment => "punishment",
        }
    }

    pub fn info(&self) -> CategoryInfo {
        let (name, emoji, color) = match self {
            Category::Drinking => ("Drinking", "🍺", "#ff6b35"),
            Category::Communication => ("Communication", "🗣️", "#00d4ff"),
            Category::Physical => ("Physical", "🏃", "#39ff14"),
            Category::Social => ("Social", "👥", "#bf00ff"),
            Category::Roleplay => ("Roleplay", "🎭", "#ff2d95"),
            Category::Competition => ("Competition", "⚔️", "#fff01f"),
            Category::Flirty => ("Flirty", "💕", "#ff69b4"),
            Category::Creative => ("Creative", "🎨", "#00ff88"),
            Category::Chaotic => ("Chaotic", "🌪️", "#ff3366"),
            Category::Punishment => ("Punishment", "⚠️", "#ffcc00"),
        };
        CategoryInfo {
            id: *self,
            name,
            emoji,
            color,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A static card definition from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub category: Category,
    /// Free text with positional placeholders `{0}`, `{1}`, ...
    pub template: String,
    /// How many distinct colors the template refers to.
    pub color_count: u32,
    /// Suggested duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

impl Card {
    /// Number of colors bound on every draw of this card. A card that names
    /// no color still gets one.
    pub fn required_colors(&self) -> usize {
        (self.color_count as usize).max(1)
    }
}

/// A card resolved against a set of colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawnCard {
    pub id: String,
    pub card: Card,
    /// `assigned_colors[i]` fills placeholder `{i}`.
    pub assigned_colors: Vec<Color>,
    pub drawn_at: DateTime<Utc>,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// One game's color set and draw history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: String,
    pub colors: Vec<Color>,
    /// Oldest first.
    pub drawn_cards: Vec<DrawnCard>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}
