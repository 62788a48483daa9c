use serde::{Deserialize, Serialize};

use crate::record::ImageRecord;

/// Clinical view category. The first four are taxonomy codes 1-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FrontWithTeeth,
    FrontNoTeeth,
    SideView,
    IntraOral,
    Unknown,
}

impl Category {
    /// Taxonomy codes in code order (index + 1 = code).
    pub const TAXONOMY: [Category; 4] = [
        Category::FrontWithTeeth,
        Category::FrontNoTeeth,
        Category::SideView,
        Category::IntraOral,
    ];

    /// Order in which categories appear in the deck.
    pub const DISPLAY_ORDER: [Category; 5] = [
        Category::IntraOral,
        Category::FrontWithTeeth,
        Category::FrontNoTeeth,
        Category::SideView,
        Category::Unknown,
    ];

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1..=4 => Some(Self::TAXONOMY[code as usize - 1]),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Category::FrontWithTeeth => "front_with_teeth",
            Category::FrontNoTeeth => "front_no_teeth",
            Category::SideView => "side_view",
            Category::IntraOral => "intra_oral",
            Category::Unknown => "unknown",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::FrontWithTeeth => "Front view with teeth visible",
            Category::FrontNoTeeth => "Front view without teeth visible",
            Category::SideView => "Side view of jaw",
            Category::IntraOral => "Intra-oral view",
            Category::Unknown => "Unknown",
        }
    }

    fn index(self) -> usize {
        match self {
            Category::FrontWithTeeth => 0,
            Category::FrontNoTeeth => 1,
            Category::SideView => 2,
            Category::IntraOral => 3,
            Category::Unknown => 4,
        }
    }
}

/// "front_no_teeth" -> "Front No Teeth"
pub fn fallback_label(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Classified records grouped by category.
#[derive(Debug, Clone, Default)]
pub struct CategoryBucket {
    groups: [Vec<ImageRecord>; 5],
}

impl CategoryBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files the record under its assigned category (`Unknown` if unassigned).
    pub fn push(&mut self, record: ImageRecord) {
        let category = record.category.unwrap_or(Category::Unknown);
        self.groups[category.index()].push(record);
    }

    pub fn get(&self, category: Category) -> &[ImageRecord] {
        &self.groups[category.index()]
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts {
            front_with_teeth: self.get(Category::FrontWithTeeth).len(),
            front_no_teeth: self.get(Category::FrontNoTeeth).len(),
            side_view: self.get(Category::SideView).len(),
            intra_oral: self.get(Category::IntraOral).len(),
            unknown: self.get(Category::Unknown).len(),
        }
    }
}

/// Per-category image counts reported to the invoking process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub front_with_teeth: usize,
    pub front_no_teeth: usize,
    pub side_view: usize,
    pub intra_oral: usize,
    pub unknown: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::FrontWithTeeth => self.front_with_teeth,
            Category::FrontNoTeeth => self.front_no_teeth,
            Category::SideView => self.side_view,
            Category::IntraOral => self.intra_oral,
            Category::Unknown => self.unknown,
        }
    }
}
