use serde::{Deserialize, Serialize};
use std::ops;

#[derive(Debug, PartialEq, Eq, Default, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct Vector2i {
    pub x: i32,
    pub y: i32,
}

impl Vector2i {
    pub fn new(x: i32, y: i32) -> Self {
        Vector2i { x, y }
    }
}

impl From<(i32, i32)> for Vector2i {
    fn from(v: (i32, i32)) -> Self {
        Vector2i::new(v.0, v.1)
    }
}

impl ops::Add for Vector2i {
    type Output = Vector2i;
    fn add(self, rhs: Vector2i) -> Vector2i {
        Vector2i::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl ops::Sub for Vector2i {
    type Output = Vector2i;
    fn sub(self, rhs: Vector2i) -> Vector2i {
        Vector2i::new(self.x - rhs.x, self.y - rhs.y)
    }
}
