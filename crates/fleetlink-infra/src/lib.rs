//! Infrastructure layer - store-backed directories and roster import

pub mod persistence;
pub mod roster_csv;
