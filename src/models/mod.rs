pub mod product;
pub mod vulnerability;
