pub mod classify;
pub mod config;
pub mod error;
pub mod geometry;
pub mod scan;
pub mod tileset;
pub mod tsj;
pub mod tsx;
pub mod validate;

pub use error::{Error, Result};
pub use tileset::{Tile, TileImage, Tileset};

/// The robotropolis tileset exactly as the editor saved it, embedded at compile time.
pub const ROBOTROPOLIS_TSX: &str = include_str!("../assets/robotropolis.tsx");

/// Width and height in pixels of one robotropolis grid cell.
pub const GRID_CELL_SIZE: u32 = 16;

/// Parse the embedded robotropolis tileset.
pub fn robotropolis() -> Result<Tileset> {
    tsx::from_str(ROBOTROPOLIS_TSX)
}
