use crate::BoundaryMode;
use crate::tile::Side;

/// A dense 2D grid stored row-major (`index = y * width + x`).
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    pub(crate) data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Creates a new grid with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T: Clone + Default> Grid<T> {
    /// Creates a new grid with the given dimensions, initialized with default values.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T> Grid<T> {
    pub const fn len(&self) -> usize {
        self.width * self.height
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an immutable reference to the element at the given coordinates,
    /// or None if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.index(x, y).and_then(|idx| self.data.get(idx))
    }

    /// Returns a mutable reference to the element at the given coordinates,
    /// or None if the coordinates are out of bounds.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        self.index(x, y).and_then(move |idx| self.data.get_mut(idx))
    }

    /// Calculates the row-major index for the given coordinates.
    /// Returns None if the coordinates are out of bounds.
    pub const fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    pub const fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Index of the neighbour across `side` of the cell at `index`.
    ///
    /// Clamped grids have no neighbour past their edges; periodic grids wrap.
    pub fn neighbour(&self, index: usize, side: Side, boundary: BoundaryMode) -> Option<usize> {
        let (x, y) = self.coords(index);
        let (dx, dy) = side.offset();
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        match boundary {
            BoundaryMode::Clamped => {
                if nx >= 0 && ny >= 0 && (nx as usize) < self.width && (ny as usize) < self.height {
                    Some(ny as usize * self.width + nx as usize)
                } else {
                    None
                }
            }
            BoundaryMode::Periodic => {
                let nx = nx.rem_euclid(self.width as isize) as usize;
                let ny = ny.rem_euclid(self.height as isize) as usize;
                Some(ny * self.width + nx)
            }
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}
