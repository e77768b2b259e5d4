//! Row-based shelf packer for glyph bitmaps
//!
//! The atlas is split into horizontal shelves. A bitmap goes into the first
//! shelf tall enough with room left on the right, otherwise a new shelf is
//! opened below the last one. Coordinates are pixels, top-left origin.

/// Where a bitmap was placed (excluding padding)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRect {
    /// Left edge of the bitmap
    pub x: u32,
    /// Top edge of the bitmap
    pub y: u32,
    /// Bitmap width
    pub width: u32,
    /// Bitmap height
    pub height: u32,
}

#[derive(Debug, Clone, Copy)]
struct Shelf {
    y: u32,
    height: u32,
    x_cursor: u32,
}

/// Allocator for rectangles inside a fixed-size atlas
#[derive(Debug, Clone)]
pub struct ShelfPacker {
    width: u32,
    height: u32,
    padding: u32,
    shelves: Vec<Shelf>,
    next_shelf_y: u32,
}

impl ShelfPacker {
    /// Packer for a `width` x `height` atlas reserving `padding` pixels around every bitmap
    pub const fn new(width: u32, height: u32, padding: u32) -> Self {
        Self {
            width,
            height,
            padding,
            shelves: Vec::new(),
            next_shelf_y: 0,
        }
    }

    /// Atlas width
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Atlas height
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reserve space for a `width` x `height` bitmap
    ///
    /// Zero-area bitmaps get a zero-area rect at the origin. Returns `None`
    /// when the atlas is full.
    pub fn place(&mut self, width: u32, height: u32) -> Option<PackedRect> {
        if width == 0 || height == 0 {
            return Some(PackedRect { x: 0, y: 0, width: 0, height: 0 });
        }

        let reserved_w = width.saturating_add(self.padding.saturating_mul(2));
        let reserved_h = height.saturating_add(self.padding.saturating_mul(2));
        if reserved_w > self.width || reserved_h > self.height {
            return None;
        }

        let atlas_width = self.width;
        let slot = self
            .shelves
            .iter_mut()
            .find(|shelf| reserved_h <= shelf.height && shelf.x_cursor + reserved_w <= atlas_width);

        let (x, y) = if let Some(shelf) = slot {
            let x = shelf.x_cursor;
            shelf.x_cursor += reserved_w;
            (x, shelf.y)
        } else {
            if self.next_shelf_y.saturating_add(reserved_h) > self.height {
                return None;
            }
            let y = self.next_shelf_y;
            self.shelves.push(Shelf { y, height: reserved_h, x_cursor: reserved_w });
            self.next_shelf_y += reserved_h;
            (0, y)
        };

        Some(PackedRect {
            x: x + self.padding,
            y: y + self.padding,
            width,
            height,
        })
    }
}
