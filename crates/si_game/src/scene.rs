//! Scene lifecycle contract.
//!
//! A scene is a capability object the driver walks through a fixed order:
//! `initialize` -> `load` -> (driver fetches declared assets) -> `build` ->
//! `update` once per fixed tick, forever. The first three run exactly once;
//! the driver never re-enters them.

use crate::assets::AssetManifest;
use crate::stage::Stage;

pub trait Scene {
    /// One-time state setup. Runs before any content is declared.
    fn initialize(&mut self);

    /// Declare the named images and sprite sheets the scene needs. Pure
    /// declaration; the driver performs the actual file I/O afterwards.
    fn load(&mut self, manifest: &mut AssetManifest) -> Result<(), String>;

    /// Register animations and place sprites. Runs after the declared assets
    /// have been fetched. Content-shape errors (duplicate ids, unknown
    /// clips) are fatal at startup.
    fn build(&mut self, stage: &mut Stage) -> Result<(), String>;

    /// Advance one fixed tick. The terminal state of the lifecycle: runs
    /// forever and must not fail.
    fn update(&mut self, stage: &mut Stage);
}
