pub mod lock;
pub mod migration;
pub mod paths;
pub mod regularly;
pub mod room;
