/// Current page of a deck, 1-based and always within `[1, total]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    current: usize,
    total: usize,
}

impl Navigator {
    /// `total` must be at least 1; `initial` is clamped.
    pub fn new(total: usize, initial: usize) -> Self {
        let total = total.max(1);
        Self {
            current: initial.clamp(1, total),
            total,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Moves to `page`. Out-of-range targets are ignored. Returns whether the page changed.
    pub fn go_to(&mut self, page: usize) -> bool {
        if page < 1 || page > self.total || page == self.current {
            return false;
        }
        self.current = page;
        true
    }
}

pub fn progress_percent(page: usize, total: usize) -> f32 {
    page as f32 / total.max(1) as f32 * 100.0
}

/// Page under a horizontal fraction of the progress bar: `ceil(f * total)`, clamped.
pub fn page_at_fraction(fraction: f32, total: usize) -> usize {
    let total = total.max(1);
    let raw = (fraction * total as f32).ceil();
    if raw.is_nan() || raw < 1.0 {
        1
    } else {
        (raw as usize).min(total)
    }
}

/// Parse a `page` query value, defaulting to 1 and clamping into range.
pub fn parse_page(value: Option<&str>, total: usize) -> usize {
    let total = total.max(1);
    match value.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(p) if p < 1 => 1,
        Some(p) => usize::try_from(p).unwrap_or(total).min(total),
        None => 1,
    }
}

/// Page whose rendered vertical center is closest to the viewport center.
pub fn nearest_page(centers: &[(usize, f32)], viewport_center: f32) -> Option<usize> {
    centers
        .iter()
        .min_by(|a, b| {
            let da = (a.1 - viewport_center).abs();
            let db = (b.1 - viewport_center).abs();
            da.total_cmp(&db)
        })
        .map(|(page, _)| *page)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    Previous,
    Current,
    Next,
}

/// One instruction for an image slot after a page change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotUpdate {
    pub slot: usize,
    pub role: SlotRole,
    pub page: Option<usize>,
    /// The slot's page changed, so its image must be (re)loaded.
    pub changed: bool,
}

/// Three image slots rotated on every page change.
///
/// Stepping by one page reuses the already-loaded neighbour as the new current
/// slot and only reloads the slot that fell off the far end.
#[derive(Debug, Clone, Default)]
pub struct SlotRing {
    pages: [Option<usize>; 3],
    current: usize,
}

impl SlotRing {
    pub fn current_slot(&self) -> usize {
        self.current
    }

    /// Forget all assignments so the next `show` reloads every slot.
    pub fn reset(&mut self) {
        self.pages = [None; 3];
        self.current = 0;
    }

    pub fn show(&mut self, page: usize, total: usize) -> [SlotUpdate; 3] {
        let next_slot = (self.current + 1) % 3;
        let prev_slot = (self.current + 2) % 3;
        if self.pages[self.current] != Some(page) {
            if self.pages[next_slot] == Some(page) {
                self.current = next_slot;
            } else if self.pages[prev_slot] == Some(page) {
                self.current = prev_slot;
            }
        }

        let wanted = [
            (SlotRole::Current, Some(page)),
            (SlotRole::Next, Some(page + 1).filter(|p| *p <= total)),
            (SlotRole::Previous, page.checked_sub(1).filter(|p| *p >= 1)),
        ];
        let mut updates = [SlotUpdate {
            slot: 0,
            role: SlotRole::Current,
            page: None,
            changed: false,
        }; 3];
        for (offset, (role, wanted_page)) in wanted.into_iter().enumerate() {
            let slot = (self.current + offset) % 3;
            let changed = self.pages[slot] != wanted_page;
            self.pages[slot] = wanted_page;
            updates[offset] = SlotUpdate {
                slot,
                role,
                page: wanted_page,
                changed,
            };
        }
        updates
    }
}
