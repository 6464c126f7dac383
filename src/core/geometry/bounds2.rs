use super::vector2::*;

/// Half-open integer rectangle `[min, max)`.
#[derive(Debug, PartialEq, Eq, Default, Copy, Clone)]
pub struct Bounds2i {
    pub min: Vector2i,
    pub max: Vector2i,
}

impl Bounds2i {
    pub fn new(min: &Vector2i, max: &Vector2i) -> Self {
        Bounds2i {
            min: *min,
            max: *max,
        }
    }

    /// Rectangle from an origin and a size.
    pub fn from_xywh(x: i32, y: i32, w: i32, h: i32) -> Self {
        Bounds2i {
            min: Vector2i::new(x, y),
            max: Vector2i::new(x + w, y + h),
        }
    }

    pub fn area(&self) -> i32 {
        let d = self.diagonal();
        if d.x <= 0 || d.y <= 0 {
            return 0;
        }
        return d.x * d.y;
    }

    pub fn diagonal(&self) -> Vector2i {
        return self.max - self.min;
    }

    pub fn is_empty(&self) -> bool {
        return self.min.x >= self.max.x || self.min.y >= self.max.y;
    }

    pub fn inside_exclusive(&self, p: &Vector2i) -> bool {
        return p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y;
    }

    pub fn clamp_point(&self, p: &Vector2i) -> Vector2i {
        Vector2i::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
        )
    }
}

impl From<((i32, i32), (i32, i32))> for Bounds2i {
    fn from(v: ((i32, i32), (i32, i32))) -> Self {
        Bounds2i::new(&Vector2i::from(v.0), &Vector2i::from(v.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        let b = Bounds2i::from_xywh(4, 8, 16, 2);
        assert_eq!(b.area(), 32);
        assert!(b.inside_exclusive(&Vector2i::new(4, 8)));
        assert!(!b.inside_exclusive(&Vector2i::new(20, 8)));
        assert_eq!(b.clamp_point(&Vector2i::new(-3, 40)), Vector2i::new(4, 10));
        assert!(Bounds2i::from(((2, 2), (2, 5))).is_empty());
    }
}
