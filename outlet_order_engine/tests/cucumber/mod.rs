mod outlet_world;
mod setups;

pub use outlet_world::OutletWorld;
