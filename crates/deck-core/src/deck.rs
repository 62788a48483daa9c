use chrono::NaiveDateTime;

use crate::category::{fallback_label, Category, CategoryBucket};
use crate::record::ImageRecord;

pub const TITLE: &str = "Patient Treatment Report";
pub const IMAGES_PER_SLIDE: usize = 4;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Slide geometry in inches. Images are stretched to the cell, not fitted.
pub mod layout {
    pub const SLIDE_WIDTH: f64 = 13.333;
    pub const SLIDE_HEIGHT: f64 = 7.5;
    pub const MARGIN: f64 = 0.5;
    pub const HEADER_HEIGHT: f64 = 0.6;
    pub const SPACING: f64 = 0.25;
    pub const CAPTION_GAP: f64 = 0.05;
    pub const CAPTION_HEIGHT: f64 = 0.3;

    pub const GRID_LEFT: f64 = MARGIN;
    pub const GRID_TOP: f64 = MARGIN + HEADER_HEIGHT;
    pub const GRID_WIDTH: f64 = SLIDE_WIDTH - 2.0 * MARGIN;
    pub const GRID_HEIGHT: f64 = SLIDE_HEIGHT - GRID_TOP - MARGIN;
    pub const CELL_WIDTH: f64 = (GRID_WIDTH - SPACING) / 2.0;
    pub const CELL_HEIGHT: f64 = (GRID_HEIGHT - SPACING) / 2.0;
    pub const IMAGE_HEIGHT: f64 = CELL_HEIGHT - CAPTION_GAP - CAPTION_HEIGHT;
}

pub const EMU_PER_INCH: f64 = 914_400.0;

/// Axis-aligned box in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// (x, y, cx, cy) in English Metric Units
    pub fn to_emu(self) -> (i64, i64, i64, i64) {
        let emu = |inches: f64| (inches * EMU_PER_INCH).round() as i64;
        (emu(self.left), emu(self.top), emu(self.width), emu(self.height))
    }
}

pub fn header_frame() -> Rect {
    Rect {
        left: layout::MARGIN,
        top: layout::MARGIN,
        width: layout::GRID_WIDTH,
        height: layout::HEADER_HEIGHT,
    }
}

/// Image and caption boxes for grid position `index` (0..4, row-major).
pub fn cell_frames(index: usize) -> (Rect, Rect) {
    let row = (index / 2) as f64;
    let col = (index % 2) as f64;
    let left = layout::GRID_LEFT + col * (layout::CELL_WIDTH + layout::SPACING);
    let top = layout::GRID_TOP + row * (layout::CELL_HEIGHT + layout::SPACING);
    let image = Rect { left, top, width: layout::CELL_WIDTH, height: layout::IMAGE_HEIGHT };
    let caption = Rect {
        left,
        top: top + layout::IMAGE_HEIGHT + layout::CAPTION_GAP,
        width: layout::CELL_WIDTH,
        height: layout::CAPTION_HEIGHT,
    };
    (image, caption)
}

#[derive(Debug, Clone)]
pub struct GridCell {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub image: ImageRecord,
    pub frame: Rect,
    pub caption: String,
    pub caption_frame: Rect,
}

#[derive(Debug, Clone)]
pub enum Slide {
    Title { title: String, subtitle: String },
    Grid { category: Category, header: String, cells: Vec<GridCell> },
}

#[derive(Debug, Clone, Default)]
pub struct Deck {
    pub slides: Vec<Slide>,
}

/// Lay out the title slide and one grid slide per group of four images.
pub fn build_deck(bucket: &CategoryBucket, generated_at: NaiveDateTime) -> Deck {
    let mut slides = vec![Slide::Title {
        title: TITLE.to_string(),
        subtitle: format!("Generated on {}", generated_at.format(TIMESTAMP_FORMAT)),
    }];

    for category in Category::DISPLAY_ORDER {
        let records = bucket.get(category);
        if records.is_empty() {
            continue;
        }

        let header = records
            .first()
            .and_then(|r| r.category_label.clone())
            .unwrap_or_else(|| fallback_label(category.key()));

        // Stable: equal timestamps keep input order
        let mut sorted = records.to_vec();
        sorted.sort_by_key(|r| r.creation_timestamp);

        for chunk in sorted.chunks(IMAGES_PER_SLIDE) {
            slides.push(Slide::Grid {
                category,
                header: header.clone(),
                cells: chunk.iter().enumerate().map(|(i, r)| grid_cell(i, r)).collect(),
            });
        }
    }

    Deck { slides }
}

fn grid_cell(index: usize, record: &ImageRecord) -> GridCell {
    let (frame, caption_frame) = cell_frames(index);
    GridCell {
        index,
        row: index / 2,
        col: index % 2,
        image: record.clone(),
        frame,
        caption: format!("{} - {}", record.filename, record.creation_timestamp.format(TIMESTAMP_FORMAT)),
        caption_frame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TimestampSource;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    impl Deck {
        /// Grid slides for one category, in deck order.
        fn grid_slides(&self, category: Category) -> impl Iterator<Item = &[GridCell]> + '_ {
            self.slides.iter().filter_map(move |slide| match slide {
                Slide::Grid { category: c, cells, .. } if *c == category => Some(cells.as_slice()),
                _ => None,
            })
        }

        /// Category of each grid slide, in deck order.
        fn category_sequence(&self) -> Vec<Category> {
            self.slides
                .iter()
                .filter_map(|slide| match slide {
                    Slide::Grid { category, .. } => Some(*category),
                    Slide::Title { .. } => None,
                })
                .collect()
        }
    }

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(9, minute, 0).unwrap()
    }

    fn record(name: &str, minute: u32, category: Category) -> ImageRecord {
        let mut r = ImageRecord {
            path: PathBuf::from(format!("/photos/{}", name)),
            filename: name.to_string(),
            width: 640,
            height: 480,
            format: "JPEG".to_string(),
            color_mode: "RGB".to_string(),
            creation_timestamp: at(minute),
            timestamp_source: TimestampSource::Exif,
            category: None,
            category_label: None,
        };
        r.assign(category);
        r
    }

    fn bucket(records: Vec<ImageRecord>) -> CategoryBucket {
        let mut b = CategoryBucket::new();
        for r in records {
            b.push(r);
        }
        b
    }

    fn names(cells: &[GridCell]) -> Vec<&str> {
        cells.iter().map(|c| c.image.filename.as_str()).collect()
    }

    #[test]
    fn test_title_slide_only_for_empty_bucket() {
        let deck = build_deck(&CategoryBucket::new(), at(30));
        assert_eq!(deck.slides.len(), 1);
        match &deck.slides[0] {
            Slide::Title { title, subtitle } => {
                assert_eq!(title, TITLE);
                assert_eq!(subtitle, "Generated on 2024-06-01 09:30:00");
            }
            other => panic!("expected title slide, got {:?}", other),
        }
    }

    #[test]
    fn test_chunks_of_four() {
        let five = (0..5).map(|i| record(&format!("s{}.jpg", i), i, Category::SideView)).collect();
        let deck = build_deck(&bucket(five), at(0));
        let sizes: Vec<usize> = deck.grid_slides(Category::SideView).map(<[GridCell]>::len).collect();
        assert_eq!(sizes, vec![4, 1]);

        let four = (0..4).map(|i| record(&format!("s{}.jpg", i), i, Category::SideView)).collect();
        let deck = build_deck(&bucket(four), at(0));
        assert_eq!(deck.grid_slides(Category::SideView).count(), 1);
        assert_eq!(deck.grid_slides(Category::IntraOral).count(), 0);
    }

    #[test]
    fn test_chronological_across_slides() {
        let minutes = [40, 5, 22, 5, 59, 1, 33];
        let records = minutes
            .iter()
            .enumerate()
            .map(|(i, &m)| record(&format!("io{}.jpg", i), m, Category::IntraOral))
            .collect();
        let deck = build_deck(&bucket(records), at(0));

        let ordered: Vec<&str> = deck.grid_slides(Category::IntraOral).flat_map(names).collect();
        // io1 and io3 tie at :05 and keep input order
        assert_eq!(ordered, vec!["io5.jpg", "io1.jpg", "io3.jpg", "io2.jpg", "io6.jpg", "io0.jpg", "io4.jpg"]);
    }

    #[test]
    fn test_fixed_display_order() {
        let records = vec![
            record("u.jpg", 0, Category::Unknown),
            record("side.jpg", 1, Category::SideView),
            record("front.jpg", 2, Category::FrontWithTeeth),
            record("intra.jpg", 3, Category::IntraOral),
        ];
        let deck = build_deck(&bucket(records), at(0));
        assert_eq!(
            deck.category_sequence(),
            vec![Category::IntraOral, Category::FrontWithTeeth, Category::SideView, Category::Unknown]
        );
    }

    #[test]
    fn test_grid_positions_row_major() {
        let records = (0..4).map(|i| record(&format!("f{}.jpg", i), i, Category::FrontNoTeeth)).collect();
        let deck = build_deck(&bucket(records), at(0));
        let cells = deck.grid_slides(Category::FrontNoTeeth).next().unwrap();

        let positions: Vec<(usize, usize)> = cells.iter().map(|c| (c.row, c.col)).collect();
        assert_eq!(positions, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);

        assert_eq!(cells[0].frame.left, layout::GRID_LEFT);
        assert_eq!(cells[0].frame.top, layout::GRID_TOP);
        assert_eq!(cells[1].frame.top, cells[0].frame.top);
        assert!(cells[1].frame.left > cells[0].frame.left + cells[0].frame.width);
        assert!(cells[2].frame.top > cells[0].caption_frame.top + cells[0].caption_frame.height);
        assert_eq!(cells[2].frame.width, cells[3].frame.width);
    }

    #[test]
    fn test_grid_fits_on_canvas() {
        let (image, caption) = cell_frames(3);
        assert!(image.left + image.width <= layout::SLIDE_WIDTH - layout::MARGIN + 1e-9);
        assert!(caption.top + caption.height <= layout::SLIDE_HEIGHT - layout::MARGIN + 1e-9);
    }

    #[test]
    fn test_header_and_caption() {
        let mut unlabeled = record("x.jpg", 7, Category::FrontNoTeeth);
        unlabeled.category_label = None;
        let deck = build_deck(&bucket(vec![unlabeled, record("y.jpg", 8, Category::SideView)]), at(0));

        match &deck.slides[1] {
            Slide::Grid { header, cells, .. } => {
                assert_eq!(header, "Front No Teeth");
                assert_eq!(cells[0].caption, "x.jpg - 2024-06-01 09:07:00");
            }
            other => panic!("expected grid slide, got {:?}", other),
        }
        match &deck.slides[2] {
            Slide::Grid { header, .. } => assert_eq!(header, "Side view of jaw"),
            other => panic!("expected grid slide, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_batch_layout() {
        let records = vec![
            record("t3.jpg", 3, Category::FrontWithTeeth),
            record("t5.jpg", 5, Category::Unknown),
            record("t1.jpg", 1, Category::FrontWithTeeth),
            record("t4.jpg", 4, Category::Unknown),
            record("t2.jpg", 2, Category::FrontWithTeeth),
        ];
        let deck = build_deck(&bucket(records), at(0));

        assert_eq!(deck.slides.len(), 3);
        assert!(matches!(deck.slides[0], Slide::Title { .. }));
        let front: Vec<&[GridCell]> = deck.grid_slides(Category::FrontWithTeeth).collect();
        assert_eq!(front.len(), 1);
        assert_eq!(names(front[0]), vec!["t1.jpg", "t2.jpg", "t3.jpg"]);
        assert_eq!(front[0].iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        let unknown: Vec<&[GridCell]> = deck.grid_slides(Category::Unknown).collect();
        assert_eq!(names(unknown[0]), vec!["t4.jpg", "t5.jpg"]);
    }

    #[test]
    fn test_rect_to_emu() {
        let r = Rect { left: 1.0, top: 0.5, width: 2.25, height: 0.1 };
        assert_eq!(r.to_emu(), (914_400, 457_200, 2_057_400, 91_440));
    }
}
