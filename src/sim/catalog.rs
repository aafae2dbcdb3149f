//! Vocabulary catalog
//!
//! Categories and their items are immutable and shared by every session.
//! Per-session progress through a sequence category lives in
//! [`super::state::SessionContext`], never here.

use serde::Serialize;

/// A single thing the child can be asked to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VocabularyItem {
    pub emoji: &'static str,
    pub name: &'static str,
}

impl VocabularyItem {
    pub const fn new(emoji: &'static str, name: &'static str) -> Self {
        Self { emoji, name }
    }
}

/// A themed set of items; sequence categories must be found in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: &'static str,
    pub items: &'static [VocabularyItem],
    pub requires_sequence: bool,
}

impl Category {
    /// Check whether an item belongs to this category
    pub fn contains(&self, item: &VocabularyItem) -> bool {
        self.items.iter().any(|i| i == item)
    }

    /// Expected item for a sequence cursor. The cursor only grows; passes
    /// through the sequence repeat in catalog order.
    pub fn sequence_item(&self, cursor: usize) -> Option<VocabularyItem> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items[cursor % self.items.len()])
    }
}

/// Ordered list of categories (one per level)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Built-in vocabulary
    pub fn builtin() -> Self {
        Self::new(BUILTIN_CATEGORIES.to_vec())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

const FRUITS: &[VocabularyItem] = &[
    VocabularyItem::new("🍎", "apple"),
    VocabularyItem::new("🍌", "banana"),
    VocabularyItem::new("🍇", "grapes"),
    VocabularyItem::new("🍓", "strawberry"),
    VocabularyItem::new("🥕", "carrot"),
    VocabularyItem::new("🥦", "broccoli"),
    VocabularyItem::new("🍊", "orange"),
    VocabularyItem::new("🍉", "watermelon"),
    VocabularyItem::new("🍍", "pineapple"),
    VocabularyItem::new("🌽", "corn"),
];

const COUNTING: &[VocabularyItem] = &[
    VocabularyItem::new("1️⃣", "one"),
    VocabularyItem::new("2️⃣", "two"),
    VocabularyItem::new("3️⃣", "three"),
    VocabularyItem::new("4️⃣", "four"),
    VocabularyItem::new("5️⃣", "five"),
    VocabularyItem::new("6️⃣", "six"),
    VocabularyItem::new("7️⃣", "seven"),
    VocabularyItem::new("8️⃣", "eight"),
    VocabularyItem::new("9️⃣", "nine"),
    VocabularyItem::new("🔟", "ten"),
];

const SHAPES: &[VocabularyItem] = &[
    VocabularyItem::new("🔴", "red circle"),
    VocabularyItem::new("🟦", "blue square"),
    VocabularyItem::new("🔺", "red triangle"),
    VocabularyItem::new("⭐", "star"),
    VocabularyItem::new("🟢", "green circle"),
    VocabularyItem::new("🟨", "yellow square"),
    VocabularyItem::new("💜", "purple heart"),
    VocabularyItem::new("🔷", "blue diamond"),
];

const ANIMALS: &[VocabularyItem] = &[
    VocabularyItem::new("🐶", "dog"),
    VocabularyItem::new("🐱", "cat"),
    VocabularyItem::new("🐰", "rabbit"),
    VocabularyItem::new("🐻", "bear"),
    VocabularyItem::new("🐸", "frog"),
    VocabularyItem::new("🐵", "monkey"),
    VocabularyItem::new("🐘", "elephant"),
    VocabularyItem::new("🦁", "lion"),
    VocabularyItem::new("🐧", "penguin"),
    VocabularyItem::new("🦒", "giraffe"),
];

const ALPHABET: &[VocabularyItem] = &[
    VocabularyItem::new("🅰️", "A"),
    VocabularyItem::new("🅱️", "B"),
    VocabularyItem::new("©️", "C"),
    VocabularyItem::new("🇩", "D"),
    VocabularyItem::new("📧", "E"),
];

const VEHICLES: &[VocabularyItem] = &[
    VocabularyItem::new("🚗", "car"),
    VocabularyItem::new("🚌", "bus"),
    VocabularyItem::new("🚒", "fire truck"),
    VocabularyItem::new("🚂", "train"),
    VocabularyItem::new("✈️", "airplane"),
    VocabularyItem::new("🚁", "helicopter"),
    VocabularyItem::new("🚲", "bicycle"),
    VocabularyItem::new("⛵", "sailboat"),
];

const WEATHER: &[VocabularyItem] = &[
    VocabularyItem::new("☀️", "sun"),
    VocabularyItem::new("🌧️", "rain"),
    VocabularyItem::new("❄️", "snow"),
    VocabularyItem::new("🌈", "rainbow"),
    VocabularyItem::new("⛅", "cloud"),
    VocabularyItem::new("⚡", "lightning"),
    VocabularyItem::new("🌙", "moon"),
];

const BUILTIN_CATEGORIES: &[Category] = &[
    Category {
        name: "Fruits & Vegetables",
        items: FRUITS,
        requires_sequence: false,
    },
    Category {
        name: "Counting Fun",
        items: COUNTING,
        requires_sequence: true,
    },
    Category {
        name: "Shapes & Colors",
        items: SHAPES,
        requires_sequence: false,
    },
    Category {
        name: "Animals & Nature",
        items: ANIMALS,
        requires_sequence: false,
    },
    Category {
        name: "Alphabet Challenge",
        items: ALPHABET,
        requires_sequence: true,
    },
    Category {
        name: "Things That Go",
        items: VEHICLES,
        requires_sequence: false,
    },
    Category {
        name: "Weather Wonders",
        items: WEATHER,
        requires_sequence: false,
    },
];
