use tilesession::core::prelude::*;

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

fn manager(params: TileManagerParams, width: i32, height: i32) -> TileManager {
    let samples = params.samples;
    let mut manager = TileManager::new(&params);
    manager.reset(&BufferParams::new(width, height), samples);
    manager
}

fn claim_all(manager: &mut TileManager, device: usize) -> Vec<Tile> {
    let mut tiles = Vec::new();
    while let Some(tile) = manager.next_tile(device) {
        tiles.push(tile.clone());
    }
    tiles
}

#[test]
fn partition_covers_frame() {
    let mut m = manager(
        TileManagerParams {
            samples: 4,
            tile_size: Vector2i::new(16, 16),
            ..Default::default()
        },
        40,
        20,
    );
    assert!(m.next());
    assert_eq!(m.state.num_tiles, 6);
    assert_eq!(m.state.tile_stride, 3);
    assert_eq!(m.state.sample, 0);
    assert_eq!(m.state.num_samples, 4);

    let tiles = claim_all(&mut m, 0);
    assert_eq!(tiles.len(), 6);
    let area: i32 = tiles.iter().map(|t| t.bounds().area()).sum();
    assert_eq!(area, 40 * 20);
    let edge = tiles.iter().find(|t| t.index == 5).unwrap();
    assert_eq!((edge.x, edge.y, edge.w, edge.h), (32, 16, 8, 4));

    for tile in tiles.iter() {
        let ret = m.return_tile(tile.index);
        assert!(ret.finished);
        assert!(!ret.delete_buffer);
    }
    assert!(m.done());
    assert!(!m.next());
}

#[test]
fn empty_frame_has_no_work() {
    let mut m = TileManager::new(&TileManagerParams::default());
    assert!(!m.next());
    assert!(m.next_tile(0).is_none());
}

#[test]
fn bottom_to_top_order() {
    let mut m = manager(
        TileManagerParams {
            samples: 1,
            tile_size: Vector2i::new(16, 16),
            tile_order: TileOrder::BottomToTop,
            ..Default::default()
        },
        64,
        64,
    );
    assert!(m.next());
    let tiles = claim_all(&mut m, 0);
    assert_eq!(tiles.len(), 16);
    for pair in tiles.windows(2) {
        assert!(pair[0].y >= pair[1].y);
    }
    assert_eq!(tiles[0].y, 48);
}

#[test]
fn shuffle_is_deterministic() {
    let params = TileManagerParams {
        samples: 1,
        tile_size: Vector2i::new(8, 8),
        tile_order: TileOrder::Shuffle,
        seed: 17,
        ..Default::default()
    };
    let mut a = manager(params.clone(), 64, 64);
    let mut b = manager(params, 64, 64);
    assert!(a.next());
    assert!(b.next());
    let a: Vec<usize> = claim_all(&mut a, 0).iter().map(|t| t.index).collect();
    let b: Vec<usize> = claim_all(&mut b, 0).iter().map(|t| t.index).collect();
    assert_eq!(a, b);
    assert_ne!(a, (0..64).collect::<Vec<usize>>());
}

#[test]
fn progressive_sample_window() {
    let mut m = manager(
        TileManagerParams {
            progressive: true,
            samples: 3,
            tile_size: Vector2i::new(8, 8),
            ..Default::default()
        },
        16,
        8,
    );

    let mut last_sample = -1;
    for pass in 0..3 {
        assert!(m.next());
        assert_eq!(m.state.num_samples, 1);
        assert!(m.state.sample > last_sample);
        last_sample = m.state.sample;

        let tiles = claim_all(&mut m, 0);
        assert_eq!(tiles.len(), 2);
        for tile in tiles.iter() {
            assert_eq!(m.return_tile(tile.index).finished, pass == 2);
        }
    }
    assert_eq!(m.state.num_rendered_tiles, 6);
    assert!(!m.next());

    m.reset(&BufferParams::new(16, 8), 3);
    assert_eq!(m.state.num_rendered_tiles, 0);
    assert_eq!(m.state.sample, -1);
}

#[test]
fn preview_resolution_halves() {
    let mut m = manager(
        TileManagerParams {
            progressive: true,
            samples: 2,
            tile_size: Vector2i::new(8, 8),
            start_resolution: 16,
            background: false,
            ..Default::default()
        },
        64,
        64,
    );
    assert_eq!(TileManager::get_divider(64, 64, 16), 4);

    let mut dividers = Vec::new();
    while m.next() {
        dividers.push((m.state.resolution_divider, m.state.buffer.width, m.state.sample));
        for tile in claim_all(&mut m, 0) {
            let ret = m.return_tile(tile.index);
            assert_eq!(ret.finished, m.state.resolution_divider == 1 && m.state.sample == 1);
        }
    }
    assert_eq!(dividers, vec![(4, 16, 0), (2, 32, 0), (1, 64, 0), (1, 64, 1)]);
}

#[test]
fn tiles_stay_on_their_device() {
    let mut m = manager(
        TileManagerParams {
            progressive: true,
            samples: 3,
            tile_size: Vector2i::new(8, 8),
            num_devices: 2,
            ..Default::default()
        },
        32,
        32,
    );

    let mut owner: HashMap<usize, usize> = HashMap::new();
    for _ in 0..3 {
        assert!(m.next());
        let mut device = 0;
        let mut idle = 0;
        while idle < 2 {
            match m.next_tile(device).cloned() {
                Some(tile) => {
                    idle = 0;
                    assert_eq!(tile.device, Some(device));
                    let pinned = *owner.entry(tile.index).or_insert(device);
                    assert_eq!(pinned, device);
                    m.return_tile(tile.index);
                }
                None => idle += 1,
            }
            device = 1 - device;
        }
    }
    assert_eq!(owner.len(), 16);
    assert!(owner.values().any(|d| *d == 0));
    assert!(owner.values().any(|d| *d == 1));
}

#[test]
fn preserved_devices_split_bands() {
    let mut m = manager(
        TileManagerParams {
            samples: 1,
            tile_size: Vector2i::new(16, 16),
            preserve_tile_device: true,
            num_devices: 2,
            ..Default::default()
        },
        64,
        64,
    );
    assert!(m.next());
    let top = claim_all(&mut m, 0);
    let bottom = claim_all(&mut m, 1);
    assert_eq!(top.len(), 8);
    assert_eq!(bottom.len(), 8);
    assert!(top.iter().all(|t| t.y < 32));
    assert!(bottom.iter().all(|t| t.y >= 32));
}

#[test]
fn finished_tiles_release_own_buffers() {
    for keep_buffers in [false, true] {
        let mut m = manager(
            TileManagerParams {
                samples: 1,
                tile_size: Vector2i::new(8, 8),
                keep_buffers,
                ..Default::default()
            },
            8,
            8,
        );
        assert!(m.next());
        m.state.tiles[0].buffers = Some(RenderBuffers::new_shared(0, &BufferParams::new(8, 8)));
        let tile = m.next_tile(0).unwrap().index;
        let ret = m.return_tile(tile);
        assert!(ret.finished);
        assert_eq!(ret.delete_buffer, !keep_buffers);
    }

    // the frame buffer is never released by a tile
    let mut m = manager(
        TileManagerParams {
            samples: 1,
            tile_size: Vector2i::new(8, 8),
            ..Default::default()
        },
        8,
        8,
    );
    assert!(m.next());
    let global = RenderBuffers::new_shared(0, &BufferParams::new(8, 8));
    m.state.global_buffers = Some(global.clone());
    m.state.tiles[0].buffers = Some(global);
    let tile = m.next_tile(0).unwrap().index;
    assert!(!m.return_tile(tile).delete_buffer);
}

#[test]
fn concurrent_claims_are_exclusive() {
    let m = manager(
        TileManagerParams {
            progressive: true,
            samples: 4,
            tile_size: Vector2i::new(4, 4),
            num_devices: 4,
            ..Default::default()
        },
        64,
        64,
    );
    let m = Arc::new(Mutex::new(m));
    let in_flight = Arc::new(Mutex::new(HashSet::new()));

    for _ in 0..4 {
        assert!(m.lock().unwrap().next());
        let workers: Vec<_> = (0..4)
            .map(|device| {
                let m = m.clone();
                let in_flight = in_flight.clone();
                thread::spawn(move || loop {
                    let index = match m.lock().unwrap().next_tile(device) {
                        Some(tile) => tile.index,
                        None => break,
                    };
                    assert!(in_flight.lock().unwrap().insert(index));
                    thread::yield_now();
                    assert!(in_flight.lock().unwrap().remove(&index));
                    m.lock().unwrap().return_tile(index);
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
    }

    let m = m.lock().unwrap();
    assert_eq!(m.state.num_rendered_tiles, 4 * 256);
    assert!(m.done());
}
