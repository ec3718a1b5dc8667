// Card catalog and draw engine.
//
// The catalog is loaded once at start-up and never mutated. Every query runs
// over the full card list; there is no index since the deck is small.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{validate_colors, Card, Category, CategoryInfo, Color, Difficulty, DrawnCard};
use crate::template;

/// The deck shipped with the crate.
const EMBEDDED_CARDS: &str = include_str!("../data/cards.json");

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read card file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid card data in {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },

    #[error("card data in {origin} contains no cards")]
    Empty { origin: String },

    #[error("duplicate card id `{id}`")]
    DuplicateId { id: String },
}

/// On-disk shape of a card dataset.
#[derive(Debug, Deserialize)]
struct CardFile {
    cards: Vec<Card>,
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Conjunctive filter for [`Catalog::pick_random`]. Unset fields match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub category: Option<Category>,
    /// Only cards with `color_count <= max_color_count`.
    pub max_color_count: Option<u32>,
    pub exclude_ids: HashSet<String>,
}

/// Filter for [`Catalog::draw`]. The color bound comes from the palette
/// being drawn with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawFilter {
    pub category: Option<Category>,
    pub exclude_ids: HashSet<String>,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DifficultyCounts {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

/// Aggregate counts over the catalog. Categories and color counts with no
/// cards are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total: usize,
    pub by_category: BTreeMap<Category, usize>,
    /// Cards without a difficulty are not counted here.
    pub by_difficulty: DifficultyCounts,
    pub by_color_count: BTreeMap<u32, usize>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The immutable card deck.
#[derive(Debug, Clone)]
pub struct Catalog {
    cards: Vec<Card>,
}

impl Catalog {
    /// Build a catalog from an explicit card list.
    ///
    /// Fails on an empty list or duplicate ids. Templates that reference
    /// more colors than the card binds are accepted with a warning; those
    /// placeholders will never be resolved.
    pub fn new(cards: Vec<Card>) -> std::result::Result<Self, CatalogError> {
        Self::from_cards(cards, "<inline>")
    }

    /// The deck embedded in the crate.
    pub fn embedded() -> std::result::Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_CARDS, "embedded cards.json")
    }

    /// Load a `{"cards": [...]}` JSON file.
    pub fn load(path: &Path) -> std::result::Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&text, &path.display().to_string())
    }

    /// Parse a `{"cards": [...]}` JSON document. `origin` names the source in
    /// error messages.
    pub fn from_json(text: &str, origin: &str) -> std::result::Result<Self, CatalogError> {
        let file: CardFile = serde_json::from_str(text).map_err(|e| CatalogError::Parse {
            origin: origin.to_string(),
            source: e,
        })?;
        Self::from_cards(file.cards, origin)
    }

    fn from_cards(cards: Vec<Card>, origin: &str) -> std::result::Result<Self, CatalogError> {
        if cards.is_empty() {
            return Err(CatalogError::Empty {
                origin: origin.to_string(),
            });
        }

        let mut seen = HashSet::with_capacity(cards.len());
        for card in &cards {
            if !seen.insert(card.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    id: card.id.clone(),
                });
            }
            if let Some(max) = template::placeholder_indices(&card.template).into_iter().max() {
                if max >= card.required_colors() {
                    warn!(
                        "Card {} references placeholder {{{max}}} but binds only {} color(s)",
                        card.id,
                        card.required_colors()
                    );
                }
            }
        }

        Ok(Catalog { cards })
    }

    /// Every card, in dataset order.
    pub fn list_all(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Display metadata for all ten categories.
    pub fn list_categories() -> BTreeMap<Category, CategoryInfo> {
        Category::ALL.into_iter().map(|c| (c, c.info())).collect()
    }

    /// Pick a card uniformly at random among those matching `filter`.
    pub fn pick_random(&self, filter: &CardFilter) -> Result<&Card> {
        self.pick_random_with_rng(filter, &mut rand::thread_rng())
    }

    pub fn pick_random_with_rng<R: Rng + ?Sized>(
        &self,
        filter: &CardFilter,
        rng: &mut R,
    ) -> Result<&Card> {
        let candidates = self.candidates(filter.category, filter.max_color_count, &filter.exclude_ids);
        candidates
            .choose(rng)
            .copied()
            .ok_or_else(|| Error::not_found("no card matches the given filters"))
    }

    /// Pick a card playable with `colors` and bind a random subset of the
    /// colors to its placeholders.
    pub fn draw(&self, colors: &[Color], filter: &DrawFilter) -> Result<DrawnCard> {
        self.draw_with_rng(colors, filter, &mut rand::thread_rng())
    }

    pub fn draw_with_rng<R: Rng + ?Sized>(
        &self,
        colors: &[Color],
        filter: &DrawFilter,
        rng: &mut R,
    ) -> Result<DrawnCard> {
        validate_colors(colors)?;

        let max_color_count = u32::try_from(colors.len()).unwrap_or(u32::MAX);
        let candidates = self.candidates(filter.category, Some(max_color_count), &filter.exclude_ids);
        let card = candidates
            .choose(rng)
            .copied()
            .ok_or_else(|| Error::not_found("no card is available for these colors and filters"))?;

        bind_with_rng(card, colors, rng)
    }

    /// Aggregate counts, recomputed on every call.
    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats {
            total: self.cards.len(),
            by_category: BTreeMap::new(),
            by_difficulty: DifficultyCounts::default(),
            by_color_count: BTreeMap::new(),
        };

        for card in &self.cards {
            *stats.by_category.entry(card.category).or_insert(0) += 1;
            match card.difficulty {
                Some(Difficulty::Easy) => stats.by_difficulty.easy += 1,
                Some(Difficulty::Medium) => stats.by_difficulty.medium += 1,
                Some(Difficulty::Hard) => stats.by_difficulty.hard += 1,
                None => {}
            }
            *stats.by_color_count.entry(card.color_count).or_insert(0) += 1;
        }

        stats
    }

    fn candidates(
        &self,
        category: Option<Category>,
        max_color_count: Option<u32>,
        exclude_ids: &HashSet<String>,
    ) -> Vec<&Card> {
        self.cards
            .iter()
            .filter(|c| category.map_or(true, |cat| c.category == cat))
            .filter(|c| max_color_count.map_or(true, |max| c.color_count <= max))
            .filter(|c| !exclude_ids.contains(&c.id))
            .collect()
    }
}

/// Resolve `card` against a random subset of `colors`.
///
/// Binds `card.required_colors()` distinct entries of `colors` (shuffled, so
/// each ordering is equally likely) and fails with `InvalidInput` when there
/// are not enough colors.
pub fn bind(card: &Card, colors: &[Color]) -> Result<DrawnCard> {
    bind_with_rng(card, colors, &mut rand::thread_rng())
}

pub fn bind_with_rng<R: Rng + ?Sized>(card: &Card, colors: &[Color], rng: &mut R) -> Result<DrawnCard> {
    let needed = card.required_colors();
    if colors.len() < needed {
        return Err(Error::invalid_input(format!(
            "card {} needs {needed} colors, got {}",
            card.id,
            colors.len()
        )));
    }

    let mut assigned = colors.to_vec();
    assigned.shuffle(rng);
    assigned.truncate(needed);

    let content = template::resolve(&card.template, &assigned);

    Ok(DrawnCard {
        id: Uuid::new_v4().to_string(),
        card: card.clone(),
        assigned_colors: assigned,
        drawn_at: Utc::now(),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn card(id: &str, category: Category, template: &str, color_count: u32) -> Card {
        Card {
            id: id.to_string(),
            category,
            template: template.to_string(),
            color_count,
            duration: None,
            difficulty: None,
        }
    }

    fn colors(names: &[&str]) -> Vec<Color> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Color::new(format!("c{i}"), *name, "#123456"))
            .collect()
    }

    fn small_catalog() -> Catalog {
        Catalog::new(vec![
            card("a", Category::Drinking, "{0} drinks", 1),
            card("b", Category::Drinking, "{0} toasts {1}", 2),
            card("c", Category::Physical, "{0}, {1}, {2} race", 3),
            card("d", Category::Social, "Everyone cheers", 0),
        ])
        .unwrap()
    }

    fn ids(set: &[&str]) -> HashSet<String> {
        set.iter().map(|s| s.to_string()).collect()
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    #[test]
    fn embedded_catalog_loads() {
        let catalog = Catalog::embedded().expect("embedded deck should be valid");
        assert_eq!(catalog.len(), 40);
        assert_eq!(catalog.list_all()[0].id, "drink-001");
    }

    #[test]
    fn embedded_catalog_covers_every_category() {
        let catalog = Catalog::embedded().unwrap();
        let stats = catalog.stats();
        for category in Category::ALL {
            assert!(
                stats.by_category.contains_key(&category),
                "no card in category {category}"
            );
        }
    }

    #[test]
    fn rejects_empty_card_list() {
        let err = Catalog::from_json(r#"{"cards": []}"#, "test").unwrap_err();
        assert!(matches!(err, CatalogError::Empty { .. }));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Catalog::new(vec![
            card("x", Category::Social, "a", 0),
            card("x", Category::Social, "b", 0),
        ])
        .unwrap_err();
        match err {
            CatalogError::DuplicateId { id } => assert_eq!(id, "x"),
            other => panic!("expected DuplicateId, got: {other}"),
        }
    }

    #[test]
    fn rejects_unknown_category() {
        let json = r#"{"cards": [{"id":"x","category":"karaoke","template":"t","colorCount":0}]}"#;
        let err = Catalog::from_json(json, "test").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn placeholder_beyond_color_budget_loads_and_stays_literal() {
        let catalog = Catalog::new(vec![card("over", Category::Chaotic, "{0} swaps with {1}", 1)])
            .expect("overflowing placeholder is a warning, not an error");
        assert_eq!(catalog.len(), 1);

        let palette = colors(&["Red", "Blue", "Green"]);
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..20 {
            let drawn = catalog
                .draw_with_rng(&palette, &DrawFilter::default(), &mut rng)
                .unwrap();
            assert_eq!(drawn.assigned_colors.len(), 1);
            assert_eq!(
                drawn.content,
                format!("{} swaps with {{1}}", drawn.assigned_colors[0].name)
            );
        }
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/partydeck/cards.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn load_reads_json_file() {
        let dir = std::env::temp_dir().join("partydeck_catalog_load");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cards.json");
        std::fs::write(
            &path,
            r#"{"cards": [{"id":"only","category":"creative","template":"{0} sings","colorCount":1}]}"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.list_all()[0].category, Category::Creative);

        let _ = std::fs::remove_dir_all(&dir);
    }

    // ------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------

    #[test]
    fn list_all_preserves_order() {
        let catalog = small_catalog();
        let ids: Vec<&str> = catalog.list_all().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn list_categories_has_ten_entries() {
        let categories = Catalog::list_categories();
        assert_eq!(categories.len(), 10);
        assert_eq!(categories[&Category::Flirty].name, "Flirty");
    }

    // ------------------------------------------------------------------
    // pick_random
    // ------------------------------------------------------------------

    #[test]
    fn pick_random_honours_category() {
        let catalog = small_catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let filter = CardFilter {
            category: Some(Category::Drinking),
            ..Default::default()
        };
        for _ in 0..50 {
            let card = catalog.pick_random_with_rng(&filter, &mut rng).unwrap();
            assert_eq!(card.category, Category::Drinking);
        }
    }

    #[test]
    fn pick_random_honours_max_color_count() {
        let catalog = small_catalog();
        let mut rng = StdRng::seed_from_u64(11);
        let filter = CardFilter {
            max_color_count: Some(1),
            ..Default::default()
        };
        for _ in 0..50 {
            let card = catalog.pick_random_with_rng(&filter, &mut rng).unwrap();
            assert!(card.color_count <= 1);
        }
    }

    #[test]
    fn pick_random_combines_filters() {
        let catalog = small_catalog();
        let filter = CardFilter {
            category: Some(Category::Drinking),
            max_color_count: Some(2),
            exclude_ids: ids(&["a"]),
        };
        let card = catalog.pick_random(&filter).unwrap();
        assert_eq!(card.id, "b");
    }

    #[test]
    fn pick_random_excluding_everything_is_not_found() {
        let catalog = small_catalog();
        let filter = CardFilter {
            exclude_ids: ids(&["a", "b", "c", "d"]),
            ..Default::default()
        };
        assert!(matches!(
            catalog.pick_random(&filter),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn pick_random_reaches_every_candidate() {
        let catalog = small_catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen: HashMap<String, usize> = HashMap::new();
        for _ in 0..400 {
            let card = catalog
                .pick_random_with_rng(&CardFilter::default(), &mut rng)
                .unwrap();
            *seen.entry(card.id.clone()).or_default() += 1;
        }
        assert_eq!(seen.len(), 4);
        for count in seen.values() {
            assert!(*count > 50, "skewed distribution: {seen:?}");
        }
    }

    // ------------------------------------------------------------------
    // draw
    // ------------------------------------------------------------------

    #[test]
    fn draw_requires_two_colors() {
        let catalog = small_catalog();
        let err = catalog
            .draw(&colors(&["Red"]), &DrawFilter::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn draw_fails_when_every_card_needs_more_colors() {
        let catalog = Catalog::new(vec![card("three", Category::Physical, "{0}{1}{2}", 3)]).unwrap();
        let err = catalog
            .draw(&colors(&["Red", "Blue"]), &DrawFilter::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn draw_only_picks_playable_cards() {
        let catalog = small_catalog();
        let mut rng = StdRng::seed_from_u64(5);
        let palette = colors(&["Red", "Blue"]);
        for _ in 0..100 {
            let drawn = catalog
                .draw_with_rng(&palette, &DrawFilter::default(), &mut rng)
                .unwrap();
            assert_ne!(drawn.card.id, "c");
        }
    }

    #[test]
    fn draw_assigns_distinct_colors_from_palette() {
        let catalog = small_catalog();
        let mut rng = StdRng::seed_from_u64(17);
        let palette = colors(&["Red", "Blue", "Green", "Yellow"]);
        for _ in 0..200 {
            let drawn = catalog
                .draw_with_rng(&palette, &DrawFilter::default(), &mut rng)
                .unwrap();
            assert_eq!(drawn.assigned_colors.len(), drawn.card.required_colors());
            let unique: HashSet<&str> = drawn.assigned_colors.iter().map(|c| c.id.as_str()).collect();
            assert_eq!(unique.len(), drawn.assigned_colors.len());
            for color in &drawn.assigned_colors {
                assert!(palette.contains(color));
            }
        }
    }

    #[test]
    fn draw_honours_category_and_exclusions() {
        let catalog = small_catalog();
        let filter = DrawFilter {
            category: Some(Category::Drinking),
            exclude_ids: ids(&["b"]),
        };
        let drawn = catalog.draw(&colors(&["Red", "Blue"]), &filter).unwrap();
        assert_eq!(drawn.card.id, "a");
        assert_eq!(drawn.card.category, Category::Drinking);
    }

    #[test]
    fn draw_resolves_content_from_assigned_colors() {
        let catalog = Catalog::new(vec![card("b", Category::Drinking, "{0} toasts {1}", 2)]).unwrap();
        let drawn = catalog
            .draw(&colors(&["Red", "Blue", "Green"]), &DrawFilter::default())
            .unwrap();
        let expected = format!(
            "{} toasts {}",
            drawn.assigned_colors[0].name, drawn.assigned_colors[1].name
        );
        assert_eq!(drawn.content, expected);
    }

    #[test]
    fn zero_color_card_still_binds_one_color() {
        let catalog = Catalog::new(vec![card("d", Category::Social, "Everyone cheers", 0)]).unwrap();
        let drawn = catalog
            .draw(&colors(&["Red", "Blue"]), &DrawFilter::default())
            .unwrap();
        assert_eq!(drawn.assigned_colors.len(), 1);
        assert_eq!(drawn.content, "Everyone cheers");
    }

    #[test]
    fn draw_produces_unique_ids() {
        let catalog = small_catalog();
        let palette = colors(&["Red", "Blue", "Green"]);
        let first = catalog.draw(&palette, &DrawFilter::default()).unwrap();
        let second = catalog.draw(&palette, &DrawFilter::default()).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn shuffle_gives_every_color_the_first_slot() {
        let card = card("a", Category::Drinking, "{0} drinks", 1);
        let palette = colors(&["Red", "Blue", "Green"]);
        let mut rng = StdRng::seed_from_u64(99);
        let mut firsts: HashMap<String, usize> = HashMap::new();
        for _ in 0..3000 {
            let drawn = bind_with_rng(&card, &palette, &mut rng).unwrap();
            *firsts.entry(drawn.assigned_colors[0].name.clone()).or_default() += 1;
        }
        assert_eq!(firsts.len(), 3);
        for count in firsts.values() {
            // Expected 1000 each; a biased comparator shuffle drifts well past this.
            assert!((850..=1150).contains(count), "non-uniform shuffle: {firsts:?}");
        }
    }

    // ------------------------------------------------------------------
    // bind
    // ------------------------------------------------------------------

    #[test]
    fn bind_rejects_undersupplied_colors() {
        let card = card("c", Category::Physical, "{0}, {1}, {2} race", 3);
        let err = bind(&card, &colors(&["Red", "Blue"])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn bind_accepts_a_single_color_for_single_color_cards() {
        let card = card("a", Category::Drinking, "{0} drinks", 1);
        let drawn = bind(&card, &colors(&["Red"])).unwrap();
        assert_eq!(drawn.content, "Red drinks");
    }

    // ------------------------------------------------------------------
    // stats
    // ------------------------------------------------------------------

    #[test]
    fn stats_counts_small_catalog() {
        let mut cards = small_catalog().list_all().to_vec();
        cards[0].difficulty = Some(Difficulty::Easy);
        cards[1].difficulty = Some(Difficulty::Hard);
        cards[2].difficulty = Some(Difficulty::Hard);
        let stats = Catalog::new(cards).unwrap().stats();

        assert_eq!(stats.total, 4);
        assert_eq!(stats.by_category[&Category::Drinking], 2);
        assert_eq!(stats.by_category[&Category::Physical], 1);
        assert!(!stats.by_category.contains_key(&Category::Flirty));
        assert_eq!(
            stats.by_difficulty,
            DifficultyCounts {
                easy: 1,
                medium: 0,
                hard: 2
            }
        );
        assert_eq!(stats.by_color_count[&0], 1);
        assert_eq!(stats.by_color_count[&3], 1);
    }

    #[test]
    fn stats_for_embedded_deck() {
        let stats = Catalog::embedded().unwrap().stats();
        assert_eq!(stats.total, 40);
        assert_eq!(stats.by_difficulty.easy, 16);
        assert_eq!(stats.by_difficulty.medium, 14);
        assert_eq!(stats.by_difficulty.hard, 9);
        assert_eq!(stats.by_color_count[&2], 19);
        assert_eq!(stats.by_category[&Category::Flirty], 3);
    }

    #[test]
    fn stats_serializes_with_string_keys() {
        let stats = small_catalog().stats();
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["byCategory"]["drinking"], 2);
        assert_eq!(value["byColorCount"]["2"], 1);
        assert_eq!(value["byDifficulty"]["easy"], 0);
    }
}
