/// Page box in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Builds a size from adapter-declared dimensions. Missing, zero,
    /// negative or non-finite dimensions make the size unusable.
    pub fn from_declared(width: Option<f64>, height: Option<f64>) -> Option<Self> {
        match (width, height) {
            (Some(w), Some(h)) if is_usable(w) && is_usable(h) => Some(Self::new(w, h)),
            _ => None,
        }
    }
}

fn is_usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("page has no usable size and no previous page to inherit one from")]
pub struct GeometryError;

/// Carries the last resolved page size across pages of one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeCarry {
    previous: Option<PageSize>,
}

impl SizeCarry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<PageSize> {
        self.previous
    }

    /// Resolves a declared size, falling back to the previous page's size.
    pub fn resolve(
        &mut self,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<PageSize, GeometryError> {
        let size = PageSize::from_declared(width, height)
            .or(self.previous)
            .ok_or(GeometryError)?;
        self.previous = Some(size);
        Ok(size)
    }
}
