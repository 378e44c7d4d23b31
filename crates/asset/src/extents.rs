//! Bounding-box extents over one or many geometries.

use corelib::{Bounds, Vec3};

use crate::mesh::Geometry;

/// Combined bounds of a set of positions. `Empty` means there was nothing to
/// measure and must not be read as a zero-sized box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Extents {
    #[default]
    Empty,
    Bounded(Bounds),
}

impl Extents {
    pub fn from_positions(positions: &[[f32; 3]]) -> Self {
        Bounds::from_points(positions.iter().copied().map(Vec3::from)).into()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Extents::Empty)
    }

    #[inline]
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Extents::Empty => None,
            Extents::Bounded(b) => Some(*b),
        }
    }

    pub fn union(self, other: Self) -> Self {
        match (self, other) {
            (Extents::Empty, e) | (e, Extents::Empty) => e,
            (Extents::Bounded(a), Extents::Bounded(b)) => Extents::Bounded(a.union(b)),
        }
    }
}

impl From<Option<Bounds>> for Extents {
    fn from(bounds: Option<Bounds>) -> Self {
        bounds.map_or(Extents::Empty, Extents::Bounded)
    }
}

/// Anything that can report the extents of its positions.
pub trait HasExtents {
    fn extents(&self) -> Extents;
}

impl HasExtents for Extents {
    fn extents(&self) -> Extents {
        *self
    }
}

impl HasExtents for Bounds {
    fn extents(&self) -> Extents {
        Extents::Bounded(*self)
    }
}

impl HasExtents for Geometry {
    fn extents(&self) -> Extents {
        Extents::from_positions(&self.positions)
    }
}

/// Reduce the extents of every item with a component-wise min/max.
pub fn compute_extents<'a, T, I>(items: I) -> Extents
where
    T: HasExtents + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .map(|item| item.extents())
        .fold(Extents::Empty, Extents::union)
}
