//! Gallery page model: the fixed image list, its masonry layout and the
//! lightbox state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GalleryImage {
    pub src: &'static str,
    pub caption: &'static str,
    pub width: u32,
    pub height: u32,
}

impl GalleryImage {
    /// Rendered height when the image is laid out `column_width` wide.
    pub fn scaled_height(&self, column_width: f32) -> f32 {
        if self.width == 0 {
            return 0.0;
        }
        column_width * self.height as f32 / self.width as f32
    }
}

pub static GALLERY: [GalleryImage; 6] = [
    GalleryImage {
        src: "/content/p1.jpg",
        caption: "Innovative Design Solutions",
        width: 800,
        height: 1200,
    },
    GalleryImage {
        src: "/content/p2.jpg",
        caption: "Creative Development Process",
        width: 1200,
        height: 800,
    },
    GalleryImage {
        src: "/content/p3.jpg",
        caption: "Dynamic Team Collaboration",
        width: 800,
        height: 1000,
    },
    GalleryImage {
        src: "/content/p4.jpg",
        caption: "Future-Forward Thinking",
        width: 1000,
        height: 800,
    },
    GalleryImage {
        src: "/content/p5.jpg",
        caption: "Cutting-edge Technology",
        width: 900,
        height: 1200,
    },
    GalleryImage {
        src: "/content/p6.jpg",
        caption: "Seamless Integration",
        width: 1200,
        height: 900,
    },
];

/// Column count for a viewport width: 1, then 2 from 640px, 3 from 768px
/// and 4 from 1024px.
pub fn column_count(viewport_width: u32) -> usize {
    match viewport_width {
        w if w >= 1024 => 4,
        w if w >= 768 => 3,
        w if w >= 640 => 2,
        _ => 1,
    }
}

/// Placement of one image in the masonry grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MasonryCell {
    pub index: usize,
    pub column: usize,
    pub top: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasonryLayout {
    pub columns: usize,
    pub column_width: f32,
    pub cells: Vec<MasonryCell>,
}

impl MasonryLayout {
    /// Indices of the images in `column`, top to bottom.
    pub fn column(&self, column: usize) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .filter(move |cell| cell.column == column)
            .map(|cell| cell.index)
    }

    pub fn height(&self) -> f32 {
        self.cells
            .iter()
            .map(|cell| cell.top + cell.height)
            .fold(0.0, f32::max)
    }
}

/// Puts each image, in order, at the bottom of the currently shortest
/// column (leftmost on ties).
pub fn masonry_layout(
    images: &[GalleryImage],
    container_width: f32,
    columns: usize,
    gap: f32,
) -> MasonryLayout {
    let columns = columns.max(1);
    let column_width =
        ((container_width - gap * (columns - 1) as f32) / columns as f32).max(0.0);
    let mut heights = vec![0.0_f32; columns];
    let mut cells = Vec::with_capacity(images.len());

    for (index, image) in images.iter().enumerate() {
        let column = heights
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(column, _)| column)
            .unwrap_or(0);
        let height = image.scaled_height(column_width);
        let top = heights[column];
        heights[column] += height + gap;
        cells.push(MasonryCell {
            index,
            column,
            top,
            height,
        });
    }

    MasonryLayout {
        columns,
        column_width,
        cells,
    }
}

/// User input the lightbox reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryEvent {
    ItemClicked(usize),
    /// Click on the dimmed area around the modal.
    BackdropClicked,
    /// Click inside the modal panel; never reaches the backdrop.
    BodyClicked,
    CloseClicked,
}

/// Lightbox state: at most one image is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GalleryViewer {
    selected: Option<usize>,
}

impl GalleryViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_image(&self) -> Option<&'static GalleryImage> {
        self.selected.and_then(|index| GALLERY.get(index))
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    /// Applies an event; returns `true` when the selection changed.
    pub fn handle(&mut self, event: GalleryEvent) -> bool {
        let next = match event {
            GalleryEvent::ItemClicked(index) if index < GALLERY.len() => Some(index),
            GalleryEvent::ItemClicked(index) => {
                log::warn!("ignoring click on unknown gallery item {index}");
                self.selected
            }
            GalleryEvent::BackdropClicked | GalleryEvent::CloseClicked => None,
            GalleryEvent::BodyClicked => self.selected,
        };
        let changed = next != self.selected;
        self.selected = next;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_pick_column_counts() {
        assert_eq!(column_count(375), 1);
        assert_eq!(column_count(639), 1);
        assert_eq!(column_count(640), 2);
        assert_eq!(column_count(768), 3);
        assert_eq!(column_count(1023), 3);
        assert_eq!(column_count(1024), 4);
        assert_eq!(column_count(2560), 4);
    }

    #[test]
    fn items_fill_the_shortest_column() {
        let layout = masonry_layout(&GALLERY, 632.0, 2, 16.0);
        assert_eq!(layout.column_width, 308.0);
        // p1 is tall, so p2 and p3 stack in the right column.
        assert_eq!(layout.column(0).collect::<Vec<_>>(), vec![0, 3, 5]);
        assert_eq!(layout.column(1).collect::<Vec<_>>(), vec![1, 2, 4]);
        let p3 = layout.cells[2];
        assert_eq!(p3.top, layout.cells[1].height + 16.0);
    }

    #[test]
    fn single_column_keeps_order() {
        let layout = masonry_layout(&GALLERY, 360.0, 1, 16.0);
        assert_eq!(layout.column(0).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);
        let expected: f32 = GALLERY
            .iter()
            .map(|image| image.scaled_height(360.0))
            .sum::<f32>()
            + 16.0 * 5.0;
        assert!((layout.height() - expected).abs() < 1e-3);
    }

    #[test]
    fn item_click_opens_with_caption() {
        let mut viewer = GalleryViewer::new();
        assert!(viewer.handle(GalleryEvent::ItemClicked(2)));
        let image = viewer.selected_image().unwrap();
        assert_eq!(image.caption, "Dynamic Team Collaboration");
        assert_eq!(image.src, "/content/p3.jpg");
    }

    #[test]
    fn backdrop_and_close_dismiss_but_body_does_not() {
        let mut viewer = GalleryViewer::new();
        viewer.handle(GalleryEvent::ItemClicked(0));
        assert!(!viewer.handle(GalleryEvent::BodyClicked));
        assert!(viewer.is_open());
        assert!(viewer.handle(GalleryEvent::BackdropClicked));
        assert!(!viewer.is_open());

        viewer.handle(GalleryEvent::ItemClicked(5));
        assert!(viewer.handle(GalleryEvent::CloseClicked));
        assert_eq!(viewer.selected(), None);
    }

    #[test]
    fn unknown_items_are_ignored() {
        let mut viewer = GalleryViewer::new();
        assert!(!viewer.handle(GalleryEvent::ItemClicked(6)));
        assert!(!viewer.is_open());
    }
}
