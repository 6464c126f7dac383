use super::tile::*;
use crate::core::rng::*;

use serde::{Deserialize, Serialize};

/// Visiting order of the tiles within one pass.
///
/// Image rows grow downwards: y = 0 is the top row, so `BottomToTop` visits
/// tiles with non-increasing y. Ties are broken by tile index.
#[derive(Debug, PartialEq, Eq, Default, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileOrder {
    #[default]
    Center,
    RightToLeft,
    LeftToRight,
    TopToBottom,
    BottomToTop,
    Shuffle,
}

impl TileOrder {
    /// Returns tile indices in visiting order; `seed` drives `Shuffle`.
    pub fn sort(&self, tiles: &[Tile], image_width: i32, image_height: i32, seed: u64) -> Vec<usize> {
        let mut order: Vec<usize> = (0..tiles.len()).collect();
        match self {
            TileOrder::Center => {
                let cx = image_width as i64;
                let cy = image_height as i64;
                order.sort_by_key(|i| {
                    let c = tiles[*i].center2();
                    let dx = c.x as i64 - cx;
                    let dy = c.y as i64 - cy;
                    (dx * dx + dy * dy, *i)
                });
            }
            TileOrder::RightToLeft => {
                order.sort_by_key(|i| (-tiles[*i].x, *i));
            }
            TileOrder::LeftToRight => {
                order.sort_by_key(|i| (tiles[*i].x, *i));
            }
            TileOrder::TopToBottom => {
                order.sort_by_key(|i| (tiles[*i].y, *i));
            }
            TileOrder::BottomToTop => {
                order.sort_by_key(|i| (-tiles[*i].y, *i));
            }
            TileOrder::Shuffle => {
                let mut rng = RNG::new_sequence(seed);
                rng.shuffle(&mut order);
            }
        }
        return order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(nx: i32, ny: i32, size: i32) -> Vec<Tile> {
        let mut tiles = Vec::new();
        for y in 0..ny {
            for x in 0..nx {
                let index = (y * nx + x) as usize;
                tiles.push(Tile::new(index, x * size, y * size, size, size));
            }
        }
        tiles
    }

    #[test]
    fn test_001() {
        let tiles = grid(3, 3, 8);
        let order = TileOrder::Center.sort(&tiles, 24, 24, 0);
        assert_eq!(order[0], 4);
        // corners last, in index order
        assert_eq!(&order[5..], &[0, 2, 6, 8]);
    }

    #[test]
    fn test_002() {
        let tiles = grid(2, 2, 8);
        assert_eq!(TileOrder::LeftToRight.sort(&tiles, 16, 16, 0), vec![0, 2, 1, 3]);
        assert_eq!(TileOrder::RightToLeft.sort(&tiles, 16, 16, 0), vec![1, 3, 0, 2]);
        assert_eq!(TileOrder::TopToBottom.sort(&tiles, 16, 16, 0), vec![0, 1, 2, 3]);
        assert_eq!(TileOrder::BottomToTop.sort(&tiles, 16, 16, 0), vec![2, 3, 0, 1]);
    }

    #[test]
    fn test_003() {
        let tiles = grid(4, 4, 8);
        let a = TileOrder::Shuffle.sort(&tiles, 32, 32, 11);
        let b = TileOrder::Shuffle.sort(&tiles, 32, 32, 11);
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, (0..16).collect::<Vec<usize>>());
    }
}
